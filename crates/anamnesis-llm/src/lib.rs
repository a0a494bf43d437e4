//! Anamnesis LLM Provider Layer
//!
//! Text-generation provider implementations behind the `LlmProvider` trait
//! from `anamnesis-domain`.
//!
//! # Providers
//!
//! - `GeminiProvider`: Google Generative Language `generateContent` API
//! - `OpenAiProvider`: OpenAI-compatible chat-completions API
//! - `ConfiguredProvider`: one of the above, chosen from configuration
//! - `MockProvider`: Scripted replies for testing
//!
//! # Examples
//!
//! ```
//! use anamnesis_llm::MockProvider;
//! use anamnesis_domain::LlmProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let provider = MockProvider::new(r#"{"data": {}}"#);
//! let reply = provider.generate("any prompt").await.unwrap();
//! assert_eq!(reply, r#"{"data": {}}"#);
//! # }
//! ```

#![warn(missing_docs)]

pub mod gemini;
pub mod openai;
pub mod provider;

use anamnesis_domain::traits::{LlmProvider as LlmProviderTrait, ProviderFailure};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use provider::{ConfiguredProvider, ProviderConfig, ProviderKind};

/// Provider error code meaning "service overloaded, try again later"
pub const OVERLOADED_CODE: u16 = 503;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or transport failure
    #[error("Communication error: {0}")]
    Communication(String),

    /// The request did not complete in time
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    /// Reply arrived but had no usable text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider is temporarily overloaded
    #[error("Provider overloaded (code {code}): {message}")]
    Overloaded {
        /// Numeric error code reported by the provider
        code: u16,
        /// Provider message
        message: String,
    },

    /// Any other explicit provider error
    #[error("Provider error (code {code}): {message}")]
    Provider {
        /// Numeric error code reported by the provider
        code: u16,
        /// Provider message
        message: String,
    },

    /// Provider could not be built from its configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Classify an explicit provider error by its numeric code
    pub fn from_code(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if code == OVERLOADED_CODE {
            LlmError::Overloaded { code, message }
        } else {
            LlmError::Provider { code, message }
        }
    }

    pub(crate) fn from_transport(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            LlmError::Timeout(timeout_secs)
        } else {
            LlmError::Communication(format!("Request failed: {}", error))
        }
    }
}

impl ProviderFailure for LlmError {
    fn is_overloaded(&self) -> bool {
        matches!(self, LlmError::Overloaded { .. })
    }

    fn is_malformed_reply(&self) -> bool {
        matches!(self, LlmError::InvalidResponse(_))
    }
}

/// Mock LLM provider for deterministic testing
///
/// Replies are taken from a script in order; once the script runs out every
/// call gets the fallback reply. No network calls are made. Clones share the
/// script and the prompt log.
///
/// # Examples
///
/// ```
/// use anamnesis_llm::{LlmError, MockProvider};
/// use anamnesis_domain::LlmProvider;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let provider = MockProvider::new("fallback")
///     .then_fail(LlmError::from_code(503, "overloaded"))
///     .then_reply("first");
///
/// assert!(provider.generate("a").await.is_err());
/// assert_eq!(provider.generate("b").await.unwrap(), "first");
/// assert_eq!(provider.generate("c").await.unwrap(), "fallback");
/// assert_eq!(provider.call_count(), 3);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    model: String,
    fallback: Result<String, LlmError>,
    script: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Create a MockProvider with a fixed reply for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_fallback(Ok(response.into()))
    }

    /// Create a MockProvider that fails every call with `error`
    pub fn failing(error: LlmError) -> Self {
        Self::with_fallback(Err(error))
    }

    fn with_fallback(fallback: Result<String, LlmError>) -> Self {
        Self {
            model: "mock".to_string(),
            fallback,
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a successful reply
    pub fn then_reply(self, response: impl Into<String>) -> Self {
        self.push(Ok(response.into()));
        self
    }

    /// Queue a failure
    pub fn then_fail(self, error: LlmError) -> Self {
        self.push(Err(error));
        self
    }

    /// Set the reported model name
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn push(&self, reply: Result<String, LlmError>) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reply);
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Prompts received so far, in order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"data": {}}"#)
    }
}

impl LlmProviderTrait for MockProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());

        let scripted = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        scripted.unwrap_or_else(|| self.fallback.clone())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
