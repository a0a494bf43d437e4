//! Configuration for the Extractor

use crate::retry::RetryPolicy;
use anamnesis_domain::ModePrecedence;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum provider calls per pass (extraction or rewrite)
    pub max_attempts: u32,

    /// Fixed pause before retrying an overloaded or malformed reply (milliseconds)
    pub retry_delay_ms: u64,

    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Set empty personal-history sub-fields to "nega" after decoding
    pub fill_history_sentinel: bool,

    /// Maximum time for a single provider call (seconds)
    pub extraction_timeout_secs: u64,

    /// Mode that runs when both questionnaire and mixed are on
    /// ("mixed" or "questionnaire"); a single toggle always selects its own mode
    pub mode_precedence: ModePrecedence,
}

impl ExtractorConfig {
    /// Get the per-call timeout as a Duration
    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }

    /// Retry policy shared by the extraction and rewrite passes
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.extraction_timeout_secs == 0 {
            return Err("extraction_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 3_000,
            max_text_length: 50_000,
            fill_history_sentinel: true,
            extraction_timeout_secs: 120,
            mode_precedence: ModePrecedence::Mixed,
        }
    }
}
