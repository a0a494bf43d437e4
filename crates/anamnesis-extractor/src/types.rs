//! Result types for extraction

use anamnesis_domain::{PatientRecord, PipelineMode};
use serde::Serialize;
use uuid::Uuid;

/// A filled record plus how it was produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    /// The extracted record, complete in the template shape
    pub record: PatientRecord,

    /// Metadata about the extraction
    pub metadata: ExtractionMetadata,
}

/// Metadata about one extraction run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionMetadata {
    /// Identifier of this run, also present in log lines
    pub run_id: Uuid,

    /// Mode the request resolved to
    pub mode: PipelineMode,

    /// Model that produced the record
    pub model_name: String,

    /// Provider calls made by the extraction pass
    pub attempts: u32,

    /// What happened to the HDA rewrite pass
    pub rewrite: RewriteStatus,

    /// Template key paths the reply omitted
    pub missing_keys: Vec<String>,

    /// Personal-history sub-fields set to "nega" after decoding
    pub sentinel_fields_filled: usize,

    /// Wall-clock time for the whole run (milliseconds)
    pub processing_time_ms: u64,
}

/// Outcome of the second pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RewriteStatus {
    /// The mode has no second pass
    NotRequested,

    /// The first pass produced no HDA to rewrite
    Skipped,

    /// The HDA was replaced by the rewrite
    Applied {
        /// Provider calls made by the rewrite pass
        attempts: u32,
    },

    /// The rewrite failed; the first-pass HDA was kept
    Failed {
        /// Why the rewrite failed
        reason: String,
    },
}

impl RewriteStatus {
    /// Short label for display
    pub fn label(&self) -> &'static str {
        match self {
            RewriteStatus::NotRequested => "not requested",
            RewriteStatus::Skipped => "skipped (empty HDA)",
            RewriteStatus::Applied { .. } => "applied",
            RewriteStatus::Failed { .. } => "failed (first pass kept)",
        }
    }
}
