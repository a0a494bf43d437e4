//! Anamnesis Domain Layer
//!
//! Core data model for turning free-text patient histories into structured
//! records. It defines the fixed extraction template, the typed patient
//! record that fills it, the per-request pipeline mode, and the trait
//! interfaces the infrastructure crates implement.
//!
//! ## Key Concepts
//!
//! - **Extraction Template**: the immutable JSON shape every record must match
//! - **Patient Record**: a filled copy of the template, one per extraction
//! - **Pipeline Mode**: standard, questionnaire (two-pass) or mixed input
//! - **Personal-history sentinel**: `"nega"` ("denies") for unmentioned history
//!
//! ## Architecture
//!
//! - Only `serde`/`serde_json` as external dependencies
//! - No I/O; providers and delivery live in other crates
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod record;
pub mod request;
pub mod template;
pub mod traits;

// Re-exports for convenience
pub use record::{
    ComplementaryExam, FollowUp, NeurologicalExam, PatientRecord, PersonalHistory, PhysicalExam,
    RecordPayload, DENIES,
};
pub use request::{ExtractionRequest, ModePrecedence, PipelineMode};
pub use traits::{DeliveryReceipt, LlmProvider, ProviderFailure, RecordSink};
