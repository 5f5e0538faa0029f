//! Extraction Client — asks the model for a JSON proposal shaped like the
//! five portfolio tables, using the current snapshot as context.
//!
//! The response is only checked for JSON syntax here. Shape checks happen when
//! the reconciler decodes it.

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::llm_client::{strip_json_fences, Document, LlmError, LlmProvider, Part};
use crate::sync::prompts::build_extraction_prompt;
use crate::sync::snapshot::Snapshot;

/// Separator placed between the document and the instruction text.
const PART_SEPARATOR: &str = "\n\n";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Document upload failed: {0}")]
    Upload(#[source] LlmError),

    #[error("Snapshot could not be serialized: {0}")]
    Context(#[source] serde_json::Error),

    #[error("Generation failed: {0}")]
    Generation(#[source] LlmError),

    #[error("Model response is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),
}

pub struct ExtractionClient<'a, P: ?Sized> {
    provider: &'a P,
    model: &'a str,
}

impl<'a, P> ExtractionClient<'a, P>
where
    P: LlmProvider + ?Sized,
{
    pub fn new(provider: &'a P, model: &'a str) -> Self {
        Self { provider, model }
    }

    /// Uploads `document`, then requests a JSON extraction that reuses ids
    /// from `snapshot` where records match.
    pub async fn extract(
        &self,
        document: &Document,
        snapshot: &Snapshot,
    ) -> Result<Value, ExtractionError> {
        info!("Uploading file: {}...", document.display_name);
        let handle = self
            .provider
            .upload_document(document)
            .await
            .map_err(ExtractionError::Upload)?;
        info!("File uploaded successfully: {}", handle.name);

        let current_state = snapshot.to_context_json().map_err(ExtractionError::Context)?;
        let parts = vec![
            Part::File(handle),
            Part::Text(PART_SEPARATOR.to_string()),
            Part::Text(build_extraction_prompt(&current_state)),
        ];

        info!("Generating content using {}...", self.model);
        let raw = self
            .provider
            .generate(self.model, &parts, true)
            .await
            .map_err(ExtractionError::Generation)?;

        parse_response(&raw)
    }
}

/// Parses model output as JSON after removing any code fences.
pub fn parse_response(raw: &str) -> Result<Value, ExtractionError> {
    serde_json::from_str(strip_json_fences(raw)).map_err(ExtractionError::Parse)
}
