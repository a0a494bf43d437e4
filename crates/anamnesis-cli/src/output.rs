//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use anamnesis_domain::traits::DeliveryReceipt;
use anamnesis_domain::{PatientRecord, RecordPayload};
use anamnesis_extractor::{ExtractionMetadata, ExtractionOutcome, RewriteStatus};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style, Width},
};

const VALUE_WIDTH: usize = 80;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// The active output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format a record. JSON output is the template shape, ready for `deliver`.
    pub fn format_record(&self, record: &PatientRecord) -> Result<String> {
        match self.format {
            OutputFormat::Json => record_json(record),
            OutputFormat::Table => Ok(self.record_table(record)),
        }
    }

    /// Format an extraction outcome: the record, plus a summary line in table mode.
    pub fn format_outcome(&self, outcome: &ExtractionOutcome) -> Result<String> {
        match self.format {
            OutputFormat::Json => record_json(&outcome.record),
            OutputFormat::Table => Ok(format!(
                "{}\n{}",
                self.record_table(&outcome.record),
                self.outcome_summary(&outcome.metadata)
            )),
        }
    }

    /// Format the record as a two-column table of filled fields.
    fn record_table(&self, record: &PatientRecord) -> String {
        let rows = record_rows(record);
        if rows.is_empty() {
            return self.colorize("Record is empty.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Campo", "Valor"]);
        for (field, value) in rows {
            builder.push_record([field, value]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()))
            .with(Width::wrap(VALUE_WIDTH + 30));

        table.to_string()
    }

    /// One-line summary of how the record was produced.
    pub fn outcome_summary(&self, metadata: &ExtractionMetadata) -> String {
        let mut summary = format!(
            "mode: {} | model: {} | attempts: {} | {} ms",
            metadata.mode, metadata.model_name, metadata.attempts, metadata.processing_time_ms
        );
        if metadata.rewrite != RewriteStatus::NotRequested {
            summary.push_str(&format!(" | HDA rewrite: {}", metadata.rewrite.label()));
        }
        if !metadata.missing_keys.is_empty() {
            summary.push_str(&format!(
                " | {} field(s) absent in reply",
                metadata.missing_keys.len()
            ));
        }
        summary.push_str(&format!(" | run {}", metadata.run_id));

        match &metadata.rewrite {
            RewriteStatus::Failed { reason } => format!(
                "{}\n{}",
                self.info(&summary),
                self.warning(&format!("HDA rewrite failed, first pass kept: {}", reason))
            ),
            _ => self.info(&summary),
        }
    }

    /// Format a delivery acknowledgment.
    pub fn delivery_receipt(&self, receipt: &DeliveryReceipt, folder_url: Option<&str>) -> String {
        let mut lines = vec![self.success(&format!(
            "Slide generated (HTTP {})",
            receipt.status
        ))];

        let detail = match &receipt.acknowledgment {
            Some(json) => serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string()),
            None => receipt.body.trim().to_string(),
        };
        if !detail.is_empty() {
            lines.push(detail);
        }
        if let Some(url) = folder_url {
            lines.push(self.info(&format!("Slides are in {}", url)));
        }
        lines.join("\n")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn record_json(record: &PatientRecord) -> Result<String> {
    Ok(serde_json::to_string_pretty(&RecordPayload::new(
        record.clone(),
    ))?)
}

/// Filled fields as (label, value), in template order
fn record_rows(record: &PatientRecord) -> Vec<(String, String)> {
    let mut rows = Vec::new();
    let mut push = |label: &str, value: String| {
        if !value.trim().is_empty() {
            rows.push((label.to_string(), value));
        }
    };

    push("Nome", record.name.clone());
    push("Idade", record.age.clone());
    push("Sexo", record.sex.clone());
    push("Etnia", record.ethnicity.clone());
    push("Procedente", record.origin.clone());
    push("Nascimento", record.birth_date.clone());
    push("Prontuário", record.record_number.clone());
    push("Prec CP", record.prec_cp.clone());
    push("Contato", record.contact.clone());
    push("Posto/graduação", record.rank.clone());
    push("Queixa principal", record.chief_complaint.clone());
    push("HDA", record.present_illness.clone());

    for (idx, follow_up) in record.follow_ups().enumerate() {
        let value = [follow_up.date.as_str(), follow_up.info.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(": ");
        push(&format!("Retorno {}", idx + 1), value);
    }

    let history = &record.personal_history;
    push("Alergias", history.allergies.join(", "));
    push("Comorbidades", history.comorbidities.join(", "));
    push("Hábitos e vícios", history.habits.join(", "));
    push("Cirurgias prévias", history.prior_surgeries.clone());
    push("Medicamentos", history.chronic_medications.join(", "));

    let exam = &record.physical_exam;
    push("Peso (kg)", exam.weight.clone());
    push("Altura (m)", exam.height.clone());
    push(
        "IMC",
        record
            .body_mass_index()
            .map(|bmi| format!("{:.1}", bmi))
            .unwrap_or_default(),
    );
    push("Exame físico", exam.info1.clone());
    push("Exame físico (2)", exam.info2.clone());

    let neuro = &record.neurological_exam;
    for (idx, note) in [&neuro.info1, &neuro.info2, &neuro.info3].into_iter().enumerate() {
        push(&format!("Exame neurológico ({})", idx + 1), note.clone());
    }

    for exam in &record.complementary_exams {
        let label = if exam.kind.is_empty() {
            "Exame complementar".to_string()
        } else {
            exam.kind.clone()
        };
        let value = [exam.date.as_str(), exam.report.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(": ");
        push(&label, value);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use anamnesis_domain::ComplementaryExam;

    fn sample_record() -> PatientRecord {
        let mut record = PatientRecord {
            name: "João".to_string(),
            age: "45".to_string(),
            sex: "Masculino".to_string(),
            ..Default::default()
        };
        record.personal_history.prior_surgeries = "Artroplastia de quadril".to_string();
        record.personal_history.allergies = vec!["nega".to_string()];
        record.physical_exam.weight = "80".to_string();
        record.physical_exam.height = "1,78".to_string();
        record.complementary_exams = vec![ComplementaryExam {
            kind: "RM de coluna".to_string(),
            date: "12/03/2024".to_string(),
            report: "Protrusão L4-L5".to_string(),
        }];
        record
    }

    #[test]
    fn test_json_format_is_template_shape() {
        let formatter = Formatter::new(OutputFormat::Json, false);
        let output = formatter.format_record(&sample_record()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["data"]["nome do paciente"], "João");
        assert!(anamnesis_domain::template::missing_keys(&value).is_empty());
    }

    #[test]
    fn test_table_format() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let output = formatter.format_record(&sample_record()).unwrap();

        assert!(output.contains("João"));
        assert!(output.contains("Artroplastia de quadril"));
        assert!(output.contains("IMC"));
        assert!(output.contains("25.2"));
        assert!(output.contains("RM de coluna"));
        assert!(!output.contains("Etnia"));
    }

    #[test]
    fn test_empty_record_table() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let mut record = PatientRecord::default();
        record.complementary_exams.clear();
        assert_eq!(formatter.format_record(&record).unwrap(), "Record is empty.");
    }

    #[test]
    fn test_receipt_with_folder() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        let receipt = DeliveryReceipt {
            status: 200,
            acknowledgment: Some(serde_json::json!({"ok": true})),
            body: r#"{"ok":true}"#.to_string(),
        };
        let output = formatter.delivery_receipt(&receipt, Some("https://drive.example.com/f"));

        assert!(output.starts_with("✓ Slide generated (HTTP 200)"));
        assert!(output.contains("\"ok\": true"));
        assert!(output.contains("Slides are in https://drive.example.com/f"));
    }

    #[test]
    fn test_no_color_messages() {
        let formatter = Formatter::new(OutputFormat::Table, false);
        assert_eq!(formatter.success("done"), "✓ done");
        assert_eq!(formatter.error("failed"), "✗ failed");
        assert_eq!(formatter.warning("careful"), "⚠ careful");
    }
}
