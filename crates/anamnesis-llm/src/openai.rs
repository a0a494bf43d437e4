//! OpenAI-compatible chat-completions provider
//!
//! Sends the prompt as the user message of a two-message conversation and
//! returns `choices[0].message.content`. Works against any server exposing
//! `POST {base}/chat/completions`.

use crate::gemini::snippet;
use crate::LlmError;
use anamnesis_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default timeout for one request (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

const SYSTEM_MESSAGE: &str =
    "Você é um extrator de informações médicas. Responda somente com JSON válido.";

/// Chat-completions API provider
pub struct OpenAiProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Value,
}

impl OpenAiProvider {
    /// Create a provider against the public endpoint
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
}

impl LlmProviderTrait for OpenAiProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::from_transport(e, self.timeout_secs))?;

        debug!(status, body_len = text.len(), model = %self.model, "Chat completion received");
        interpret_reply(status, &text)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn interpret_reply(status: u16, body: &str) -> Result<String, LlmError> {
    let success = (200..300).contains(&status);

    let parsed: ChatResponse = match serde_json::from_str(body) {
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
        // `code` is a string slug on OpenAI and a number on some compatible servers
        let code = error
            .code
            .as_u64()
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(status);
        return Err(LlmError::from_code(code, error.message));
    }
    if !success {
        return Err(LlmError::from_code(status, format!("HTTP {}", status)));
    }

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| LlmError::InvalidResponse("No message content in reply".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_provider_creation() {
        let provider = OpenAiProvider::new("sk-test", DEFAULT_MODEL).unwrap();
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(provider.model_name(), DEFAULT_MODEL);
    }

    #[test]
    fn test_request_body_shape() {
        let body = ChatRequest {
            model: "gpt-test",
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_MESSAGE,
                },
                ChatMessage {
                    role: "user",
                    content: "texto",
                },
            ],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-test");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "texto");
    }

    #[test]
    fn test_interpret_message_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"data\":{}}"}}]}"#;
        assert_eq!(interpret_reply(200, body).unwrap(), r#"{"data":{}}"#);
    }

    #[test]
    fn test_interpret_string_code_uses_status() {
        let body = r#"{"error":{"message":"Invalid API key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        let error = interpret_reply(401, body).unwrap_err();
        assert!(matches!(error, LlmError::Provider { code: 401, .. }));
    }

    #[test]
    fn test_interpret_numeric_overloaded_code() {
        let body = r#"{"error":{"message":"busy","code":503}}"#;
        let error = interpret_reply(200, body).unwrap_err();
        assert!(matches!(error, LlmError::Overloaded { code: 503, .. }));
    }

    #[test]
    fn test_interpret_empty_content() {
        let body = r#"{"choices":[{"message":{"content":null}}]}"#;
        assert!(matches!(
            interpret_reply(200, body).unwrap_err(),
            LlmError::InvalidResponse(_)
        ));
    }
}
