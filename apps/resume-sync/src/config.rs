use std::path::PathBuf;

use anyhow::{Context, Result};

const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_PROFILE_ID: i32 = 1;

/// Run configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub database_url: String,
    pub resume_pdf_path: PathBuf,
    pub model: String,
    pub profile_id: i32,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("Required environment variable '{key}' is not set"))
        };

        Ok(Config {
            gemini_api_key: require("GEMINI_API_KEY")?,
            database_url: require("DATABASE_URL")?,
            resume_pdf_path: PathBuf::from(require("RESUME_PDF_PATH")?),
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            profile_id: lookup("PROFILE_ID")
                .map(|v| v.parse::<i32>())
                .transpose()
                .context("PROFILE_ID must be an integer")?
                .unwrap_or(DEFAULT_PROFILE_ID),
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}
