// Resume sync job.
// Flow: read_snapshot → extract (upload + generate) → reconcile (one transaction).
// All LLM calls go through llm_client — no direct Gemini calls here.

pub mod extraction;
pub mod prompts;
pub mod reconcile;
pub mod snapshot;

use tracing::{debug, info};

use crate::errors::SyncError;
use crate::llm_client::{Document, LlmProvider};
use crate::models::portfolio::RowId;
use crate::store::{PortfolioStore, Table};
use crate::sync::extraction::ExtractionClient;
use crate::sync::reconcile::{reconcile, ReconcileReport};
use crate::sync::snapshot::read_snapshot;

/// Static inputs for a run.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub model: String,
    pub profile_id: RowId,
}

#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Tables whose snapshot read failed and were sent to the model as empty.
    pub degraded_tables: Vec<Table>,
    pub reconciled: ReconcileReport,
}

/// Runs read → extract → write once against `store`.
///
/// The store is left untouched unless every write succeeds.
pub async fn run_sync<S, P>(
    store: &mut S,
    llm: &P,
    document: &Document,
    settings: &SyncSettings,
) -> Result<SyncReport, SyncError>
where
    S: PortfolioStore + ?Sized,
    P: LlmProvider + ?Sized,
{
    info!("Fetching current database state...");
    let snapshot = read_snapshot(store, &Table::ALL).await;
    debug!("Current state: {snapshot:?}");

    info!("Analyzing document with {}...", settings.model);
    let extracted = ExtractionClient::new(llm, &settings.model)
        .extract(document, &snapshot)
        .await?;
    debug!("Extracted: {extracted}");

    info!("Updating database...");
    let reconciled = reconcile(store, &extracted, settings.profile_id).await?;

    Ok(SyncReport {
        degraded_tables: snapshot.degraded(),
        reconciled,
    })
}
