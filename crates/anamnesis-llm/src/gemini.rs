//! Gemini Provider Implementation
//!
//! Talks to the Google Generative Language `generateContent` endpoint.
//!
//! # Wire format
//!
//! Request: `{"contents":[{"parts":[{"text": <prompt>}]}]}` with the API key
//! as the `key` query parameter. A reply carries either
//! `candidates[0].content.parts[*].text` or an `error` object with a numeric
//! `code`; code 503 means the model is overloaded.
//!
//! # Examples
//!
//! ```no_run
//! use anamnesis_llm::GeminiProvider;
//!
//! let provider = GeminiProvider::new("api-key", "gemini-1.5-flash").unwrap();
//! ```

use crate::LlmError;
use anamnesis_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Generative Language API base URL
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default timeout for one request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Gemini API provider
pub struct GeminiProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

/// Request body for `generateContent`
#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// Response body from `generateContent`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ReplyPart>,
}

#[derive(Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiProvider {
    /// Create a provider against the public endpoint
    ///
    /// # Parameters
    ///
    /// - `api_key`: Generative Language API key
    /// - `model`: Model to use (e.g., "gemini-1.5-flash")
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_options(api_key, model, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a provider with an explicit base URL and request timeout
    pub fn with_options(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client,
            timeout_secs,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

impl LlmProviderTrait for GeminiProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(e.without_url(), self.timeout_secs))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::from_transport(e.without_url(), self.timeout_secs))?;

        debug!(status, body_len = text.len(), model = %self.model, "Gemini reply received");
        interpret_reply(status, &text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Turn a raw HTTP reply into candidate text or a classified error
fn interpret_reply(status: u16, body: &str) -> Result<String, LlmError> {
    let success = (200..300).contains(&status);

    let parsed: GenerateContentResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) if success => {
            return Err(LlmError::InvalidResponse(format!(
                "Failed to parse response: {}",
                e
            )))
        }
        Err(_) => return Err(LlmError::from_code(status, snippet(body))),
    };

    if let Some(error) = parsed.error {
        return Err(LlmError::from_code(error.code.unwrap_or(status), error.message));
    }
    if !success {
        return Err(LlmError::from_code(status, format!("HTTP {}", status)));
    }

    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().map(|part| part.text).collect())
        .unwrap_or_default();

    if !text.trim().is_empty() {
        return Ok(text);
    }

    match parsed.prompt_feedback.and_then(|feedback| feedback.block_reason) {
        Some(reason) => Err(LlmError::Provider {
            code: status,
            message: format!("Prompt blocked: {}", reason),
        }),
        None => Err(LlmError::InvalidResponse("No candidate text in reply".to_string())),
    }
}

pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_provider_creation() {
        let provider = GeminiProvider::new("key", "gemini-1.5-flash").unwrap();
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.model_name(), "gemini-1.5-flash");
        assert_eq!(provider.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider =
            GeminiProvider::with_options("key", "gemini-pro", "http://localhost:9000/v1/", 5).unwrap();
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9000/v1/models/gemini-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: [Content {
                parts: [Part { text: "olá" }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"contents": [{"parts": [{"text": "olá"}]}]}));
    }

    #[test]
    fn test_interpret_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"data\":"},{"text":"{}}"}]}}]}"#;
        assert_eq!(interpret_reply(200, body).unwrap(), r#"{"data":{}}"#);
    }

    #[test]
    fn test_interpret_overloaded_error() {
        let body = r#"{"error":{"code":503,"message":"The model is overloaded.","status":"UNAVAILABLE"}}"#;
        let error = interpret_reply(503, body).unwrap_err();
        assert!(matches!(error, LlmError::Overloaded { code: 503, .. }));
    }

    #[test]
    fn test_interpret_terminal_error() {
        let body = r#"{"error":{"code":400,"message":"API key not valid."}}"#;
        let error = interpret_reply(400, body).unwrap_err();
        assert_eq!(
            error,
            LlmError::Provider {
                code: 400,
                message: "API key not valid.".to_string()
            }
        );
    }

    #[test]
    fn test_interpret_non_json_error_page() {
        let error = interpret_reply(503, "<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(error, LlmError::Overloaded { .. }));

        let error = interpret_reply(200, "<html>ok?</html>").unwrap_err();
        assert!(matches!(error, LlmError::InvalidResponse(_)));
    }

    #[test]
    fn test_interpret_blocked_prompt() {
        let body = r#"{"candidates":[],"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let error = interpret_reply(200, body).unwrap_err();
        assert!(matches!(error, LlmError::Provider { ref message, .. } if message.contains("SAFETY")));
    }

    #[test]
    fn test_interpret_empty_candidates() {
        let error = interpret_reply(200, r#"{"candidates":[]}"#).unwrap_err();
        assert!(matches!(error, LlmError::InvalidResponse(_)));
    }
}
