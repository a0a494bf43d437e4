//! Core Extractor implementation

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::{parse_record, parse_rewrite};
use crate::prompt::PromptBuilder;
use crate::retry::{retry, RetryFailure};
use crate::types::{ExtractionMetadata, ExtractionOutcome, RewriteStatus};
use anamnesis_domain::traits::{LlmProvider, ProviderFailure};
use anamnesis_domain::{ExtractionRequest, PatientRecord};
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Decoder applied to every reply of one pass
type Decode<T> = fn(&str) -> Result<T, ExtractorError>;

/// The Extractor turns free-text patient histories into records
pub struct Extractor<L>
where
    L: LlmProvider,
{
    llm_provider: L,
    config: ExtractorConfig,
}

impl<L> Extractor<L>
where
    L: LlmProvider,
{
    /// Create a new Extractor
    pub fn new(llm_provider: L, config: ExtractorConfig) -> Self {
        Self {
            llm_provider,
            config,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The provider in use
    pub fn provider(&self) -> &L {
        &self.llm_provider
    }

    /// Run the pipeline for one request.
    ///
    /// Exactly one mode runs. The extraction pass is retried under the
    /// configured policy; in questionnaire mode a non-empty HDA then goes
    /// through a rewrite pass whose failure keeps the first-pass text.
    pub async fn extract(
        &self,
        request: &ExtractionRequest,
    ) -> Result<ExtractionOutcome, ExtractorError> {
        let start_time = Instant::now();
        self.validate_input(&request.text)?;

        let mode = request.mode_with(self.config.mode_precedence);
        let run_id = Uuid::now_v7();
        info!(
            %run_id,
            %mode,
            text_len = request.text.len(),
            model = self.llm_provider.model_name(),
            "Starting extraction"
        );

        let prompts = PromptBuilder::new(mode);
        let prompt = prompts.extraction(&request.text);
        debug!(%run_id, prompt_len = prompt.len(), "Extraction prompt built");

        let ((mut record, missing_keys), attempts) = self
            .call_with_retry(&prompt, parse_record)
            .await
            .inspect_err(|e| warn!(%run_id, "Extraction failed: {}", e))?;

        let rewrite = if mode.rewrites_history() {
            self.rewrite_history(run_id, &prompts, &mut record).await
        } else {
            RewriteStatus::NotRequested
        };

        let sentinel_fields_filled = if self.config.fill_history_sentinel {
            record.personal_history.fill_denied()
        } else {
            0
        };

        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            %run_id,
            attempts,
            rewrite = rewrite.label(),
            missing = missing_keys.len(),
            processing_time_ms,
            "Extraction complete"
        );

        Ok(ExtractionOutcome {
            record,
            metadata: ExtractionMetadata {
                run_id,
                mode,
                model_name: self.llm_provider.model_name().to_string(),
                attempts,
                rewrite,
                missing_keys,
                sentinel_fields_filled,
                processing_time_ms,
            },
        })
    }

    fn validate_input(&self, text: &str) -> Result<(), ExtractorError> {
        if text.trim().is_empty() {
            return Err(ExtractorError::EmptyInput);
        }
        let length = text.chars().count();
        if length > self.config.max_text_length {
            return Err(ExtractorError::TextTooLong(
                length,
                self.config.max_text_length,
            ));
        }
        Ok(())
    }

    /// Second pass over the HDA; never fails the run
    async fn rewrite_history(
        &self,
        run_id: Uuid,
        prompts: &PromptBuilder,
        record: &mut PatientRecord,
    ) -> RewriteStatus {
        if record.present_illness.trim().is_empty() {
            debug!(%run_id, "HDA is empty; skipping rewrite");
            return RewriteStatus::Skipped;
        }

        let prompt = prompts.rewrite(&record.present_illness);
        match self.call_with_retry(&prompt, parse_rewrite).await {
            Ok((text, attempts)) => {
                debug!(%run_id, before = record.present_illness.len(), after = text.len(), "HDA rewritten");
                record.present_illness = text;
                RewriteStatus::Applied { attempts }
            }
            Err(error) => {
                warn!(%run_id, "HDA rewrite failed, keeping first pass: {}", error);
                RewriteStatus::Failed {
                    reason: error.to_string(),
                }
            }
        }
    }

    async fn call_with_retry<T>(
        &self,
        prompt: &str,
        decode: Decode<T>,
    ) -> Result<(T, u32), ExtractorError> {
        retry(
            self.config.retry_policy(),
            ExtractorError::is_retryable,
            |attempt| async move {
                debug!(attempt, "Calling provider");
                let reply = self.call_llm(prompt).await?;
                debug!(attempt, reply_len = reply.len(), "Provider replied");
                decode(&reply)
            },
        )
        .await
        .map_err(|failure| match failure {
            RetryFailure::Terminal { error, .. } => error,
            RetryFailure::Exhausted { attempts, last } => ExtractorError::RetriesExhausted {
                attempts,
                last: Box::new(last),
            },
        })
    }

    /// One provider call under the per-call timeout
    async fn call_llm(&self, prompt: &str) -> Result<String, ExtractorError> {
        timeout(
            self.config.extraction_timeout(),
            self.llm_provider.generate(prompt),
        )
        .await
        .map_err(|_| ExtractorError::Timeout)?
        .map_err(|e| classify(&e))
    }
}

fn classify<E>(error: &E) -> ExtractorError
where
    E: ProviderFailure + std::fmt::Display,
{
    if error.is_overloaded() {
        ExtractorError::Overloaded(error.to_string())
    } else if error.is_malformed_reply() {
        ExtractorError::MalformedReply(error.to_string())
    } else {
        ExtractorError::Provider(error.to_string())
    }
}
