mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod store;
mod sync;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{Document, GeminiClient};
use crate::store::postgres::PgStore;
use crate::sync::{run_sync, SyncSettings};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume-sync v{}", env!("CARGO_PKG_VERSION"));

    let document = load_document(&config.resume_pdf_path).await?;

    let llm = GeminiClient::new(config.gemini_api_key.clone())?;
    info!("LLM client initialized (model: {})", config.model);

    let mut store = PgStore::new(db::connect(&config.database_url).await?);

    let settings = SyncSettings {
        model: config.model.clone(),
        profile_id: config.profile_id,
    };
    let outcome = run_sync(&mut store, &llm, &document, &settings).await;

    if let Err(e) = store.close().await {
        warn!("Failed to close database connection: {e}");
    }

    match outcome {
        Ok(report) => {
            if !report.degraded_tables.is_empty() {
                warn!(
                    "Context was missing tables: {:?}",
                    report.degraded_tables
                );
            }
            info!("Success! Database updated: {:?}", report.reconciled);
            Ok(())
        }
        Err(e) => {
            error!(code = e.code(), "An error occurred: {e}");
            Err(e.into())
        }
    }
}

/// Reads the source document into memory.
async fn load_document(path: &Path) -> Result<Document> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read document {}", path.display()))?;

    let display_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resume.pdf".to_string());

    let mime_type = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        _ => "application/octet-stream",
    };

    info!("Loaded {display_name} ({} bytes)", bytes.len());
    Ok(Document {
        display_name,
        mime_type: mime_type.to_string(),
        bytes,
    })
}
