//! The interactive session state.
//!
//! A session owns the extractor, the optional webhook client, the two mode
//! toggles, and the last extracted record. Delivery reads that record and
//! never clears it, so a failed delivery can be re-run without extracting
//! again.

use crate::config::Config;
use crate::error::{CliError, Result};
use anamnesis_delivery::{DeliveryError, WebhookClient};
use anamnesis_domain::traits::{DeliveryReceipt, LlmProvider, RecordSink};
use anamnesis_domain::{ExtractionRequest, PatientRecord, PipelineMode, RecordPayload};
use anamnesis_extractor::{ExtractionOutcome, Extractor};
use anamnesis_llm::ConfiguredProvider;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Session wired from configuration
pub type AppSession = Session<ConfiguredProvider, WebhookClient>;

/// Where the current record came from
#[derive(Debug, Clone, PartialEq)]
pub enum CurrentRecord {
    /// Produced by an extraction in this session
    Extracted(ExtractionOutcome),
    /// Loaded from a file
    Loaded(PatientRecord),
}

impl CurrentRecord {
    /// The record itself
    pub fn record(&self) -> &PatientRecord {
        match self {
            CurrentRecord::Extracted(outcome) => &outcome.record,
            CurrentRecord::Loaded(record) => record,
        }
    }
}

/// Session state shared by one-shot commands and the REPL
pub struct Session<L, S = WebhookClient>
where
    L: LlmProvider,
    S: RecordSink<Error = DeliveryError>,
{
    extractor: Extractor<L>,
    sink: Option<S>,
    folder_url: Option<String>,
    questionnaire: bool,
    mixed: bool,
    text: Option<String>,
    current: Option<CurrentRecord>,
}

impl AppSession {
    /// Build the provider and webhook client from configuration.
    ///
    /// A missing or invalid webhook only disables delivery.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let provider = ConfiguredProvider::from_config(&config.provider)?;
        info!(
            provider = provider.kind().as_str(),
            model = provider.model_name(),
            "Provider configured"
        );

        let sink = match WebhookClient::new(config.delivery.clone()) {
            Ok(client) => Some(client),
            Err(e) => {
                warn!("Delivery disabled: {}", e);
                None
            }
        };

        Ok(Session::new(
            Extractor::new(provider, config.extractor.clone()),
            sink,
        )
        .with_folder_url(config.delivery.folder_url.clone()))
    }
}

impl<L, S> Session<L, S>
where
    L: LlmProvider,
    S: RecordSink<Error = DeliveryError>,
{
    /// Create a session; `sink` is `None` when delivery is not configured
    pub fn new(extractor: Extractor<L>, sink: Option<S>) -> Self {
        Self {
            extractor,
            sink,
            folder_url: None,
            questionnaire: false,
            mixed: false,
            text: None,
            current: None,
        }
    }

    /// Set the slides folder shown after delivery
    pub fn with_folder_url(mut self, folder_url: Option<String>) -> Self {
        self.folder_url = folder_url;
        self
    }

    /// Slides folder, if configured
    pub fn folder_url(&self) -> Option<&str> {
        self.folder_url.as_deref()
    }

    /// Whether a webhook is configured
    pub fn can_deliver(&self) -> bool {
        self.sink.is_some()
    }

    /// Set the questionnaire toggle
    pub fn set_questionnaire(&mut self, on: bool) {
        self.questionnaire = on;
    }

    /// Set the mixed-input toggle
    pub fn set_mixed(&mut self, on: bool) {
        self.mixed = on;
    }

    /// The mode the next extraction will run in
    pub fn mode(&self) -> PipelineMode {
        self.extractor
            .config()
            .mode_precedence
            .resolve(self.questionnaire, self.mixed)
    }

    /// Replace the pending patient history.
    ///
    /// The previous record belongs to the previous text and is dropped.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
        self.current = None;
    }

    /// The pending patient history
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The current record, if any
    pub fn current(&self) -> Option<&CurrentRecord> {
        self.current.as_ref()
    }

    /// The current record, or [`CliError::NoRecord`]
    pub fn record(&self) -> Result<&PatientRecord> {
        self.current
            .as_ref()
            .map(CurrentRecord::record)
            .ok_or(CliError::NoRecord)
    }

    /// Use a record from elsewhere as the current one
    pub fn load_record(&mut self, record: PatientRecord) {
        self.current = Some(CurrentRecord::Loaded(record));
    }

    /// Extract from the pending text with the current toggles.
    ///
    /// On failure the previous record, if any, is left in place.
    pub async fn extract(&mut self) -> Result<ExtractionOutcome> {
        let text = self
            .text
            .clone()
            .ok_or_else(|| CliError::InvalidInput("No patient history yet. Use 'paste' first.".into()))?;
        let request = ExtractionRequest::new(text)
            .with_questionnaire(self.questionnaire)
            .with_mixed(self.mixed);

        let outcome = self.extractor.extract(&request).await?;
        self.current = Some(CurrentRecord::Extracted(outcome.clone()));
        Ok(outcome)
    }

    /// Set `text` as the pending history and extract it
    pub async fn extract_text(&mut self, text: impl Into<String>) -> Result<ExtractionOutcome> {
        self.set_text(text);
        self.extract().await
    }

    /// Deliver the current record once. The record is kept either way.
    pub async fn deliver(&self) -> Result<DeliveryReceipt> {
        let record = self.record()?;
        let sink = self.sink.as_ref().ok_or_else(|| {
            CliError::Config(
                "Delivery is not configured. Set delivery.webhook_url or ANAMNESIS_WEBHOOK_URL."
                    .into(),
            )
        })?;

        let payload = RecordPayload::new(record.clone());
        Ok(sink.deliver(&payload).await?)
    }

    /// Write the current record as template-shaped JSON
    pub fn save_record(&self, path: &Path) -> Result<()> {
        let payload = RecordPayload::new(self.record()?.clone());
        fs::write(path, serde_json::to_string_pretty(&payload)?)?;
        Ok(())
    }
}

/// Read a record file written by `save` or `extract --output`.
///
/// Accepts the template shape with or without the `data` wrapper.
pub fn read_record_file(path: &Path) -> Result<PatientRecord> {
    let contents = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&contents)?;
    Ok(PatientRecord::from_json_value(value)?)
}
