//! Anamnesis Delivery
//!
//! Forwards a finished [`RecordPayload`](anamnesis_domain::RecordPayload) to
//! the slide-generation webhook. Delivery is attempted once; a failure is
//! reported to the caller, who still holds the record and may try again.
//!
//! # Examples
//!
//! ```no_run
//! use anamnesis_delivery::{DeliveryConfig, WebhookClient};
//! use anamnesis_domain::{RecordPayload, RecordSink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WebhookClient::new(DeliveryConfig::new("https://example.com/hook"))?;
//! let receipt = client.deliver(&RecordPayload::default()).await?;
//! println!("HTTP {}", receipt.status);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod webhook;

pub use config::{DeliveryConfig, DEFAULT_TIMEOUT_SECS};
pub use error::DeliveryError;
pub use webhook::WebhookClient;
