//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractorError {
    /// Input text is empty or whitespace
    #[error("Input text is empty")]
    EmptyInput,

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// Provider reported a temporary overload
    #[error("Provider overloaded: {0}")]
    Overloaded(String),

    /// Any other provider or transport failure
    #[error("LLM error: {0}")]
    Provider(String),

    /// Reply could not be decoded into a record
    #[error("Malformed reply: {0}")]
    MalformedReply(String),

    /// Every attempt failed with a retryable error
    #[error("Gave up after {attempts} attempts; last error: {last}")]
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
        /// The final failure
        last: Box<ExtractorError>,
    },

    /// A single provider call took too long
    #[error("Extraction timeout")]
    Timeout,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExtractorError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractorError::Overloaded(_) | ExtractorError::MalformedReply(_)
        )
    }
}

impl From<serde_json::Error> for ExtractorError {
    fn from(e: serde_json::Error) -> Self {
        ExtractorError::MalformedReply(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        assert!(ExtractorError::Overloaded("503".into()).is_retryable());
        assert!(ExtractorError::MalformedReply("eof".into()).is_retryable());
        assert!(!ExtractorError::Provider("400".into()).is_retryable());
        assert!(!ExtractorError::Timeout.is_retryable());
        assert!(!ExtractorError::EmptyInput.is_retryable());
    }

    #[test]
    fn test_exhaustion_message_names_attempts() {
        let error = ExtractorError::RetriesExhausted {
            attempts: 3,
            last: Box::new(ExtractorError::Overloaded("model busy".into())),
        };
        let message = error.to_string();
        assert!(message.contains("3 attempts"));
        assert!(message.contains("model busy"));
    }
}
