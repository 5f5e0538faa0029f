use thiserror::Error;

use crate::sync::extraction::ExtractionError;
use crate::sync::reconcile::ReconcileError;

/// Fatal outcome of a sync run.
///
/// Snapshot read failures are not represented here: they degrade the affected
/// table and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Reconciliation failed, all changes rolled back: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl SyncError {
    /// Short machine-readable code for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            SyncError::Extraction(ExtractionError::Upload(_)) => "UPLOAD_ERROR",
            SyncError::Extraction(ExtractionError::Context(_)) => "CONTEXT_ERROR",
            SyncError::Extraction(ExtractionError::Generation(_)) => "LLM_ERROR",
            SyncError::Extraction(ExtractionError::Parse(_)) => "PARSE_ERROR",
            SyncError::Reconcile(ReconcileError::Invalid(_)) => "VALIDATION_ERROR",
            SyncError::Reconcile(_) => "DATABASE_ERROR",
        }
    }
}
