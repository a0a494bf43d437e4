//! Anamnesis Extractor
//!
//! Turns a free-text patient history into a [`PatientRecord`] with one LLM
//! round-trip, a bounded retry, and an optional second pass.
//!
//! # Architecture
//!
//! ```text
//! Text → PromptBuilder → retry(LlmProvider) → parser → [rewrite pass] → PatientRecord
//! ```
//!
//! # Modes
//!
//! - **Standard**: one extraction call
//! - **Questionnaire**: extraction, then a rewrite of a non-empty HDA; a failed
//!   rewrite keeps the first-pass text
//! - **Mixed**: one call with the narrative-plus-questionnaire prompt
//!
//! When both toggles are set, mixed wins.
//!
//! # Retry
//!
//! Overloaded providers and malformed replies are retried after a fixed delay,
//! up to `max_attempts` calls per pass. Every other failure is terminal.
//!
//! # Example Usage
//!
//! ```
//! use anamnesis_extractor::{Extractor, ExtractorConfig};
//! use anamnesis_domain::ExtractionRequest;
//! use anamnesis_llm::MockProvider;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(r#"{"data": {"nome do paciente": "Ana", "sexo": "Feminino"}}"#);
//! let extractor = Extractor::new(llm, ExtractorConfig::default());
//!
//! let outcome = extractor
//!     .extract(&ExtractionRequest::new("Paciente Ana, 30 anos."))
//!     .await?;
//!
//! assert_eq!(outcome.record.name, "Ana");
//! assert_eq!(outcome.record.personal_history.allergies, vec!["nega"]);
//! # Ok(())
//! # }
//! ```
//!
//! [`PatientRecord`]: anamnesis_domain::PatientRecord

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod retry;
mod types;


pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::Extractor;
pub use parser::{parse_record, parse_rewrite, strip_code_fences};
pub use prompt::PromptBuilder;
pub use retry::{retry, RetryFailure, RetryPolicy};
pub use types::{ExtractionMetadata, ExtractionOutcome, RewriteStatus};
