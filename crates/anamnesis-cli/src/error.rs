//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider setup error
    #[error("{0}")]
    Llm(#[from] anamnesis_llm::LlmError),

    /// Extraction failed
    #[error("Extraction failed: {0}")]
    Extractor(#[from] anamnesis_extractor::ExtractorError),

    /// Delivery failed
    #[error("Delivery failed: {0}")]
    Delivery(#[from] anamnesis_delivery::DeliveryError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Nothing extracted yet in this session
    #[error("No record yet. Use 'extract' first.")]
    NoRecord,
}
