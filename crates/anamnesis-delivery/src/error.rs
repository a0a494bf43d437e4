//! Error types for delivery

use thiserror::Error;

/// Delivery failures; none are retried automatically
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeliveryError {
    /// The webhook answered with a non-2xx status
    #[error("Webhook returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Start of the response body
        body: String,
    },

    /// Connection, DNS or protocol failure
    #[error("Connection error: {0}")]
    Communication(String),

    /// No response within the timeout
    #[error("Webhook did not answer within {0}s")]
    Timeout(u64),

    /// Missing or invalid webhook settings
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DeliveryError {
    pub(crate) fn from_transport(error: reqwest::Error, timeout_secs: u64) -> Self {
        if error.is_timeout() {
            DeliveryError::Timeout(timeout_secs)
        } else {
            DeliveryError::Communication(error.without_url().to_string())
        }
    }
}
