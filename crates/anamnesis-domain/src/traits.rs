//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and the network.
//! Implementations live in other crates.

use crate::RecordPayload;
use serde_json::Value;
use std::future::Future;

/// Classification of a provider failure for the retry policy
pub trait ProviderFailure {
    /// Whether the provider reported a temporary overload (worth retrying)
    fn is_overloaded(&self) -> bool;

    /// Whether a reply arrived but carried no usable text
    fn is_malformed_reply(&self) -> bool {
        false
    }
}

/// Trait for text-generation providers
///
/// Implemented by the infrastructure layer (anamnesis-llm)
pub trait LlmProvider {
    /// Error type for provider operations
    type Error: ProviderFailure + std::error::Error + Send + Sync + 'static;

    /// Send one prompt and return the raw reply text
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Model identifier, for logs and outcome metadata
    fn model_name(&self) -> &str;
}

/// Acknowledgment from a successful delivery
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReceipt {
    /// HTTP status code (always 2xx)
    pub status: u16,

    /// Response body, when it was JSON
    pub acknowledgment: Option<Value>,

    /// Raw response body
    pub body: String,
}

/// Trait for the destination of finished records
///
/// Implemented by the infrastructure layer (anamnesis-delivery)
pub trait RecordSink {
    /// Error type for delivery operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Deliver one record; never retried by the caller
    fn deliver(
        &self,
        payload: &RecordPayload,
    ) -> impl Future<Output = Result<DeliveryReceipt, Self::Error>> + Send;
}
