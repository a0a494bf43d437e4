//! Configuration management for the CLI.
//!
//! One TOML file (default `~/.anamnesis/config.toml`) with a section per
//! component. Secrets may come from the environment instead:
//!
//! | Variable                | Overrides               |
//! |-------------------------|-------------------------|
//! | `ANAMNESIS_API_KEY`     | `provider.api_key`      |
//! | `ANAMNESIS_WEBHOOK_URL` | `delivery.webhook_url`  |
//! | `ANAMNESIS_FOLDER_URL`  | `delivery.folder_url`   |

use crate::error::{CliError, Result};
use anamnesis_delivery::DeliveryConfig;
use anamnesis_extractor::ExtractorConfig;
use anamnesis_llm::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the provider credential
pub const ENV_API_KEY: &str = "ANAMNESIS_API_KEY";

/// Environment variable holding the webhook URL
pub const ENV_WEBHOOK_URL: &str = "ANAMNESIS_WEBHOOK_URL";

/// Environment variable holding the slides folder URL
pub const ENV_FOLDER_URL: &str = "ANAMNESIS_FOLDER_URL";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Pipeline settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Webhook settings
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Command history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format (the record in its template shape)
    Json,
}

impl Config {
    /// Directory holding the configuration file and REPL history.
    pub fn home_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".anamnesis"))
    }

    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Load configuration from `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Vec<&'static str> {
        self.apply_env_with(|name| std::env::var(name).ok())
    }

    /// Apply overrides using `lookup` for variable values.
    ///
    /// Empty values are ignored. Returns the names of variables applied.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = Vec::new();
        let mut get = |name: &'static str| {
            let value = lookup(name).filter(|v| !v.trim().is_empty())?;
            applied.push(name);
            Some(value)
        };

        if let Some(key) = get(ENV_API_KEY) {
            self.provider.api_key = key;
        }
        if let Some(url) = get(ENV_WEBHOOK_URL) {
            self.delivery.webhook_url = url;
        }
        if let Some(url) = get(ENV_FOLDER_URL) {
            self.delivery.folder_url = Some(url);
        }
        applied
    }

    /// Validate the settings the pipeline needs before any provider call.
    ///
    /// Delivery settings are checked when a delivery is attempted.
    pub fn validate(&self) -> Result<()> {
        self.provider.validate().map_err(CliError::Config)?;
        self.extractor
            .validate()
            .map_err(|e| CliError::Config(format!("extractor.{}", e)))?;
        Ok(())
    }

    /// A copy safe to print: the credential is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.provider.api_key.is_empty() {
            copy.provider.api_key = "********".to_string();
        }
        copy
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: 1000,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use anamnesis_llm::ProviderKind;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.provider.kind, ProviderKind::Gemini);
        assert_eq!(config.extractor.max_attempts, 3);
        assert_eq!(config.delivery.timeout_secs, 10);
        assert!(config.settings.color);
    }

    #[test]
    fn test_parse_sections() {
        let config = Config::from_toml(
            r#"
[provider]
kind = "openai"
model = "gpt-4o"
api_key = "sk-test"

[extractor]
max_attempts = 5
retry_delay_ms = 500

[delivery]
webhook_url = "https://script.example.com/exec"
folder_url = "https://drive.example.com/folder"

[settings]
format = "json"
"#,
        )
        .unwrap();

        assert_eq!(config.provider.kind, ProviderKind::OpenAi);
        assert_eq!(config.provider.model(), "gpt-4o");
        assert_eq!(config.extractor.max_attempts, 5);
        assert_eq!(config.extractor.max_text_length, 50_000);
        assert_eq!(config.delivery.webhook_url, "https://script.example.com/exec");
        assert_eq!(config.settings.format, OutputFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let result = Config::from_toml("[provider]\nkind = \"claude\"\n");
        assert!(matches!(result, Err(CliError::Toml(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "from-env"),
            (ENV_WEBHOOK_URL, "http://localhost:9000/hook"),
            (ENV_FOLDER_URL, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.provider.api_key = "from-file".to_string();
        let applied = config.apply_env_with(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(applied, vec![ENV_API_KEY, ENV_WEBHOOK_URL]);
        assert_eq!(config.provider.api_key, "from-env");
        assert_eq!(config.delivery.webhook_url, "http://localhost:9000/hook");
        assert_eq!(config.delivery.folder_url, None);
    }

    #[test]
    fn test_validate_requires_key_for_gemini() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_redacted_hides_key() {
        let mut config = Config::default();
        config.provider.api_key = "AIza-secret".to_string();
        let shown = config.redacted().to_toml().unwrap();
        assert!(!shown.contains("AIza-secret"));
        assert!(shown.contains("********"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.provider.api_key = "key".to_string();
        config.delivery.webhook_url = "http://localhost/hook".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.provider.api_key, "key");
        assert_eq!(loaded.delivery, config.delivery);
        assert_eq!(loaded.extractor, config.extractor);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.extractor, ExtractorConfig::default());
    }
}
