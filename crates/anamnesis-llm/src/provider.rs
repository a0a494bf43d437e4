//! Provider selection from configuration
//!
//! The backend is a constructor-time choice: build a [`ConfiguredProvider`]
//! once from a [`ProviderConfig`] and hand it to the extractor.

use crate::{gemini, openai, GeminiProvider, LlmError, OpenAiProvider};
use anamnesis_domain::traits::LlmProvider as LlmProviderTrait;
use serde::{Deserialize, Serialize};

/// Which provider family to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini `generateContent`
    #[default]
    Gemini,
    /// OpenAI-compatible chat completions
    OpenAi,
}

impl ProviderKind {
    /// Get the provider name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }

    fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => gemini::DEFAULT_MODEL,
            ProviderKind::OpenAi => openai::DEFAULT_MODEL,
        }
    }

    fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => gemini::DEFAULT_BASE_URL,
            ProviderKind::OpenAi => openai::DEFAULT_BASE_URL,
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAi),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Provider section of the configuration file
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider family
    pub kind: ProviderKind,

    /// Model identifier; the family default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API base URL; the family default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Credential
    pub api_key: String,

    /// Timeout for one HTTP request (seconds)
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Effective model identifier
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.kind.default_model())
    }

    /// Effective API base URL
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.kind == ProviderKind::Gemini && self.api_key.trim().is_empty() {
            return Err("provider.api_key is required for gemini".to_string());
        }
        if self.model().trim().is_empty() {
            return Err("provider.model must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("provider.timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            model: None,
            base_url: None,
            api_key: String::new(),
            timeout_secs: gemini::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("model", &self.model())
            .field("base_url", &self.base_url())
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<redacted>" })
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// A provider chosen from configuration
pub enum ConfiguredProvider {
    /// Gemini backend
    Gemini(GeminiProvider),
    /// Chat-completions backend
    OpenAi(OpenAiProvider),
}

impl ConfiguredProvider {
    /// Build the configured backend
    pub fn from_config(config: &ProviderConfig) -> Result<Self, LlmError> {
        config.validate().map_err(LlmError::Config)?;

        let provider = match config.kind {
            ProviderKind::Gemini => ConfiguredProvider::Gemini(GeminiProvider::with_options(
                config.api_key.clone(),
                config.model(),
                config.base_url(),
                config.timeout_secs,
            )?),
            ProviderKind::OpenAi => ConfiguredProvider::OpenAi(OpenAiProvider::with_options(
                config.api_key.clone(),
                config.model(),
                config.base_url(),
                config.timeout_secs,
            )?),
        };
        Ok(provider)
    }

    /// Which backend this is
    pub fn kind(&self) -> ProviderKind {
        match self {
            ConfiguredProvider::Gemini(_) => ProviderKind::Gemini,
            ConfiguredProvider::OpenAi(_) => ProviderKind::OpenAi,
        }
    }
}

impl LlmProviderTrait for ConfiguredProvider {
    type Error = LlmError;

    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        match self {
            ConfiguredProvider::Gemini(provider) => provider.generate(prompt).await,
            ConfiguredProvider::OpenAi(provider) => provider.generate(prompt).await,
        }
    }

    fn model_name(&self) -> &str {
        match self {
            ConfiguredProvider::Gemini(provider) => provider.model_name(),
            ConfiguredProvider::OpenAi(provider) => provider.model_name(),
        }
    }
}
