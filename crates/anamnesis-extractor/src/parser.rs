//! Decode model replies into records

use crate::error::ExtractorError;
use anamnesis_domain::template::missing_keys;
use anamnesis_domain::PatientRecord;
use serde_json::Value;
use std::borrow::Cow;
use tracing::warn;

const FENCE: &str = "```";
const FENCE_JSON: &str = "```json";

/// Remove every Markdown code-fence marker ("```json" and "```") from a reply.
///
/// Only the markers go; text around them is kept, so prose before or after
/// a fenced object is left for the outermost-object fallback in decoding.
pub fn strip_code_fences(reply: &str) -> Cow<'_, str> {
    let trimmed = reply.trim();
    if !trimmed.contains(FENCE) {
        return Cow::Borrowed(trimmed);
    }

    let stripped = trimmed.replace(FENCE_JSON, "").replace(FENCE, "");
    Cow::Owned(stripped.trim().to_string())
}

/// Decode an extraction reply.
///
/// Returns the record plus the template key paths the reply left out (those
/// are filled from the template, so the record is always complete).
pub fn parse_record(reply: &str) -> Result<(PatientRecord, Vec<String>), ExtractorError> {
    let value = decode_json(reply)?;
    if !value.is_object() {
        return Err(ExtractorError::MalformedReply(
            "Expected a JSON object".to_string(),
        ));
    }

    let missing = missing_keys(&value);
    if !missing.is_empty() {
        warn!(count = missing.len(), "Reply omitted template keys; filled with empty values");
    }

    let record = PatientRecord::from_json_value(value)?;
    Ok((record, missing))
}

/// Decode a rewrite reply: `{"hda": "..."}`, `{"data": {"hda": "..."}}`, or
/// a bare JSON string.
pub fn parse_rewrite(reply: &str) -> Result<String, ExtractorError> {
    let value = decode_json(reply)?;

    let text = match &value {
        Value::String(text) => Some(text.as_str()),
        Value::Object(map) => map
            .get("hda")
            .or_else(|| map.get("data").and_then(|data| data.get("hda")))
            .and_then(Value::as_str),
        _ => None,
    };

    match text.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        Some(_) => Err(ExtractorError::MalformedReply(
            "Rewrite is empty".to_string(),
        )),
        None => Err(ExtractorError::MalformedReply(
            "Expected an object with an \"hda\" string".to_string(),
        )),
    }
}

fn decode_json(reply: &str) -> Result<Value, ExtractorError> {
    let stripped = strip_code_fences(reply);
    let body = stripped.as_ref();
    if body.is_empty() {
        return Err(ExtractorError::MalformedReply("Empty reply".to_string()));
    }

    match serde_json::from_str(body) {
        Ok(value) => Ok(value),
        Err(e) => {
            // Prose around an unfenced object
            if let Some(value) = outermost_object(body)
                .and_then(|inner| serde_json::from_str::<Value>(inner).ok())
            {
                warn!("Discarded text around the JSON object in reply");
                return Ok(value);
            }
            Err(ExtractorError::MalformedReply(format!(
                "JSON parse error: {}",
                e
            )))
        }
    }
}

fn outermost_object(body: &str) -> Option<&str> {
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use anamnesis_domain::DENIES;

    #[test]
    fn test_strip_fenced_json() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```\n{\"a\": 1}\n```\n"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("```json{\"a\": 1}```"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_keeps_text_around_markers() {
        let reply = "Aqui está o JSON:\n```json\n{\"a\": 1}\n```\nQualquer dúvida, avise.";
        assert_eq!(
            strip_code_fences(reply),
            "Aqui está o JSON:\n\n{\"a\": 1}\n\nQualquer dúvida, avise."
        );
    }

    #[test]
    fn test_parse_prose_around_fence() {
        let reply = "Aqui está o JSON:\n```json\n{\"data\": {\"idade\": \"30\"}}\n```\nQualquer dúvida, avise.";
        let (record, _) = parse_record(reply).unwrap();
        assert_eq!(record.age, "30");
    }

    #[test]
    fn test_parse_json_on_fence_line() {
        let reply = "```json {\n  \"data\": {\"sexo\": \"Masculino\"}\n}\n```";
        let (record, _) = parse_record(reply).unwrap();
        assert_eq!(record.sex, "Masculino");
    }

    #[test]
    fn test_parse_json_with_stray_closing_fence() {
        let reply = "{\"data\": {\"sexo\": \"Feminino\"}}\n```";
        assert_eq!(strip_code_fences(reply), "{\"data\": {\"sexo\": \"Feminino\"}}");
        let (record, _) = parse_record(reply).unwrap();
        assert_eq!(record.sex, "Feminino");
    }

    #[test]
    fn test_strip_unfenced() {
        assert_eq!(strip_code_fences("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_complete_reply() {
        let reply = r#"```json
{"data": {"nome do paciente": "João", "idade": 45, "sexo": "Masculino",
  "antecedentes pessoais": {"alergias": ["nega"], "comorbidades": "HAS",
    "habitos e vicios": [], "cirurgias previas": "Artroplastia de quadril",
    "medicamentos em uso continuo": null}}}
```"#;
        let (record, missing) = parse_record(reply).unwrap();

        assert_eq!(record.name, "João");
        assert_eq!(record.age, "45");
        assert_eq!(record.personal_history.allergies, vec![DENIES]);
        assert_eq!(record.personal_history.comorbidities, vec!["HAS"]);
        assert!(record.personal_history.chronic_medications.is_empty());
        assert!(missing.contains(&"data.hda".to_string()));
        assert!(!missing.contains(&"data.idade".to_string()));
    }

    #[test]
    fn test_parse_without_wrapper() {
        let (record, _) = parse_record(r#"{"hda": "Dor lombar há 3 meses"}"#).unwrap();
        assert_eq!(record.present_illness, "Dor lombar há 3 meses");
    }

    #[test]
    fn test_parse_with_surrounding_prose() {
        let (record, _) =
            parse_record("Segue: {\"data\": {\"sexo\": \"Feminino\"}} Obrigado.").unwrap();
        assert_eq!(record.sex, "Feminino");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            parse_record("Desculpe, não consigo ajudar."),
            Err(ExtractorError::MalformedReply(_))
        ));
        assert!(matches!(
            parse_record("```json\n```"),
            Err(ExtractorError::MalformedReply(_))
        ));
        assert!(matches!(
            parse_record("[1, 2]"),
            Err(ExtractorError::MalformedReply(_))
        ));
    }

    #[test]
    fn test_parse_rewrite_shapes() {
        assert_eq!(
            parse_rewrite(r#"{"hda": "Lombalgia há 3m."}"#).unwrap(),
            "Lombalgia há 3m."
        );
        assert_eq!(
            parse_rewrite("```json\n{\"data\": {\"hda\": \"Cefaleia.\"}}\n```").unwrap(),
            "Cefaleia."
        );
        assert_eq!(parse_rewrite(r#""Dispneia aos esforços.""#).unwrap(), "Dispneia aos esforços.");
    }

    #[test]
    fn test_parse_rewrite_rejects_empty() {
        assert!(parse_rewrite(r#"{"hda": "  "}"#).is_err());
        assert!(parse_rewrite(r#"{"resumo": "x"}"#).is_err());
        assert!(parse_rewrite("texto solto").is_err());
    }
}
