//! Configuration for the webhook client

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default request timeout (10 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Delivery section of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Endpoint receiving finished records
    pub webhook_url: String,

    /// Request timeout (seconds)
    pub timeout_secs: u64,

    /// Where the generated slides end up, shown after a successful delivery
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_url: Option<String>,
}

impl DeliveryConfig {
    /// Create a configuration for the given webhook
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            ..Default::default()
        }
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let url = self.webhook_url.trim();
        if url.is_empty() {
            return Err("delivery.webhook_url is not set".to_string());
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!(
                "delivery.webhook_url must be an http(s) URL, got '{}'",
                url
            ));
        }
        if self.timeout_secs == 0 {
            return Err("delivery.timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            folder_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_needs_url() {
        let config = DeliveryConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_webhook() {
        let config = DeliveryConfig::new("https://script.example.com/exec");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_non_http_url() {
        let config = DeliveryConfig::new("ftp://example.com");
        assert!(config.validate().unwrap_err().contains("http(s)"));
    }

    #[test]
    fn test_from_toml() {
        let config = DeliveryConfig::from_toml(
            "webhook_url = \"http://localhost:9000/hook\"\nfolder_url = \"https://drive.example.com/f\"\n",
        )
        .unwrap();
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.folder_url.as_deref(), Some("https://drive.example.com/f"));
    }
}
