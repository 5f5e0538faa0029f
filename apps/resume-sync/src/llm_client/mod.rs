/// LLM Client — the single point of entry for all Gemini API calls.
///
/// ARCHITECTURAL RULE: No other module may call the Gemini API directly.
/// Callers depend on the `LlmProvider` trait so tests can script responses.
///
/// Two operations: upload a document to the Files API, then generate content
/// that references the uploaded file. No retries — a failed call is fatal.
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const JSON_MIME_TYPE: &str = "application/json";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Upload session did not return an upload URL")]
    MissingUploadUrl,

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// A document to hand to the model.
#[derive(Debug, Clone)]
pub struct Document {
    pub display_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Opaque reference to an uploaded document, usable in a later generate call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    pub name: String,
    pub uri: String,
    pub mime_type: String,
}

/// One element of the ordered content sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    File(FileHandle),
    Text(String),
}

/// Document-understanding model: upload bytes, then generate from a handle.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn upload_document(&self, document: &Document) -> Result<FileHandle, LlmError>;

    /// Returns the raw response text. With `json_output` set, the provider is
    /// asked to constrain the response to JSON.
    async fn generate(
        &self,
        model: &str,
        parts: &[Part],
        json_output: bool,
    ) -> Result<String, LlmError>;
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum RequestPart<'a> {
    Text(&'a str),
    FileData(FileData<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: FileHandle,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

fn build_request<'a>(parts: &'a [Part], json_output: bool) -> GenerateRequest<'a> {
    GenerateRequest {
        contents: vec![RequestContent {
            role: "user",
            parts: parts
                .iter()
                .map(|part| match part {
                    Part::Text(text) => RequestPart::Text(text),
                    Part::File(handle) => RequestPart::FileData(FileData {
                        mime_type: &handle.mime_type,
                        file_uri: &handle.uri,
                    }),
                })
                .collect(),
        }],
        generation_config: json_output.then_some(GenerationConfig {
            response_mime_type: JSON_MIME_TYPE,
        }),
    }
}

/// Turns a non-success response into `LlmError::Api`, preferring the API's own message.
async fn check_status(response: Response) -> Result<Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(LlmError::Api {
        status: status.as_u16(),
        message: api_error_message(body),
    })
}

fn api_error_message(body: String) -> String {
    serde_json::from_str::<GeminiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    /// Resumable upload: open a session, then send the bytes and finalize.
    async fn upload_document(&self, document: &Document) -> Result<FileHandle, LlmError> {
        let start = self
            .client
            .post(format!("{GEMINI_API_BASE}/upload/v1beta/files"))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header(
                "X-Goog-Upload-Header-Content-Length",
                document.bytes.len().to_string(),
            )
            .header("X-Goog-Upload-Header-Content-Type", &document.mime_type)
            .json(&json!({ "file": { "display_name": document.display_name } }))
            .send()
            .await?;
        let start = check_status(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .ok_or(LlmError::MissingUploadUrl)?
            .to_string();

        let finished = self
            .client
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(document.bytes.clone())
            .send()
            .await?;
        let uploaded: UploadResponse = check_status(finished).await?.json().await?;

        debug!("Uploaded {} as {}", document.display_name, uploaded.file.name);
        Ok(uploaded.file)
    }

    async fn generate(
        &self,
        model: &str,
        parts: &[Part],
        json_output: bool,
    ) -> Result<String, LlmError> {
        let request = build_request(parts, json_output);

        let response = self
            .client
            .post(format!(
                "{GEMINI_API_BASE}/v1beta/models/{model}:generateContent"
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        let response: GenerateResponse = check_status(response).await?.json().await?;

        if let Some(usage) = &response.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        response.text().ok_or(LlmError::EmptyContent)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
/// Either fence may be missing.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let text = match text.strip_prefix("```") {
        Some(rest) => match rest.get(..4) {
            Some(tag) if tag.eq_ignore_ascii_case("json") => &rest[4..],
            _ => rest,
        },
        None => text,
    };
    let text = text.trim_start();
    text.strip_suffix("```").map(str::trim).unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> FileHandle {
        FileHandle {
            name: "files/abc123".into(),
            uri: "https://generativelanguage.googleapis.com/v1beta/files/abc123".into(),
            mime_type: "application/pdf".into(),
        }
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_uppercase_tag() {
        let input = "```JSON\n{\"key\": 1}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": 1}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"}\n";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_unterminated() {
        let input = "```json\n{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_closing_only() {
        let input = "{\"a\": 1}\n```";
        assert_eq!(strip_json_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn test_request_shape() {
        let parts = vec![
            Part::File(handle()),
            Part::Text("\n\n".into()),
            Part::Text("extract".into()),
        ];
        let body = serde_json::to_value(build_request(&parts, true)).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"fileData": {
                            "mimeType": "application/pdf",
                            "fileUri": "https://generativelanguage.googleapis.com/v1beta/files/abc123"
                        }},
                        {"text": "\n\n"},
                        {"text": "extract"}
                    ]
                }],
                "generationConfig": {"responseMimeType": "application/json"}
            })
        );
    }

    #[test]
    fn test_request_without_json_mode() {
        let parts = vec![Part::Text("hi".into())];
        let body = serde_json::to_value(build_request(&parts, false)).unwrap();
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}],
            "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_response_without_candidates() {
        let response: GenerateResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_upload_response_handle() {
        let uploaded: UploadResponse = serde_json::from_value(json!({
            "file": {
                "name": "files/abc123",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/abc123",
                "mimeType": "application/pdf",
                "state": "ACTIVE"
            }
        }))
        .unwrap();
        assert_eq!(uploaded.file, handle());
    }

    #[test]
    fn test_api_error_message_extracted() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body.to_string()), "API key not valid");
        assert_eq!(api_error_message("gateway timeout".into()), "gateway timeout");
    }
}
