//! Webhook client
//!
//! One `POST` of the record in its template shape (`{"data": {...}}`). A 2xx
//! answer is success; a JSON body is kept as the acknowledgment.

use crate::config::DeliveryConfig;
use crate::error::DeliveryError;
use anamnesis_domain::traits::{DeliveryReceipt, RecordSink};
use anamnesis_domain::RecordPayload;
use serde_json::Value;
use tracing::{debug, info, warn};

const BODY_SNIPPET_CHARS: usize = 300;

/// Posts finished records to the slide-generation webhook
pub struct WebhookClient {
    client: reqwest::Client,
    config: DeliveryConfig,
}

impl WebhookClient {
    /// Create a client; fails if the configuration is invalid
    pub fn new(config: DeliveryConfig) -> Result<Self, DeliveryError> {
        config.validate().map_err(DeliveryError::Config)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DeliveryError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// The active configuration
    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }
}

impl RecordSink for WebhookClient {
    type Error = DeliveryError;

    async fn deliver(&self, payload: &RecordPayload) -> Result<DeliveryReceipt, DeliveryError> {
        debug!(timeout_secs = self.config.timeout_secs, "Posting record to webhook");

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::from_transport(e, self.config.timeout_secs))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DeliveryError::from_transport(e, self.config.timeout_secs))?;

        if !(200..300).contains(&status) {
            warn!(status, "Webhook rejected the record");
            return Err(DeliveryError::Status {
                status,
                body: body.chars().take(BODY_SNIPPET_CHARS).collect(),
            });
        }

        let acknowledgment = serde_json::from_str::<Value>(&body).ok();
        info!(status, json_ack = acknowledgment.is_some(), "Record delivered");

        Ok(DeliveryReceipt {
            status,
            acknowledgment,
            body,
        })
    }
}
