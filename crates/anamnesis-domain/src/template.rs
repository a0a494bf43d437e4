//! The extraction template
//!
//! A fixed JSON shape describing every field to be extracted. It is built
//! once, never mutated, and embedded verbatim in every extraction prompt.
//! [`PatientRecord::default`](crate::PatientRecord) serializes to exactly
//! this value.

use serde_json::{json, Value};
use std::sync::LazyLock;

static TEMPLATE: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "data": {
            "nome do paciente": "",
            "idade": "",
            "sexo": "",
            "etnia": "",
            "procedente": "",
            "data de nascimento": "",
            "prontuario": "",
            "prec cp": "",
            "contato": "",
            "posto e graduacao": "",
            "queixa principal": "",
            "hda": "",
            "retorno1": {"data": "", "info": ""},
            "retorno2": {"data": "", "info": ""},
            "retorno3": {"data": "", "info": ""},
            "antecedentes pessoais": {
                "alergias": [],
                "comorbidades": [],
                "habitos e vicios": [],
                "cirurgias previas": "",
                "medicamentos em uso continuo": []
            },
            "exame fisico geral": {"peso": "", "altura": "", "info1": "", "info2": ""},
            "exame neurologico": {"info1": "", "info2": "", "info3": ""},
            "exames complementares": [{"tipo": "", "data": "", "laudo": ""}]
        }
    })
});

/// The extraction template
pub fn extraction_template() -> &'static Value {
    &TEMPLATE
}

/// The template as indented JSON with non-ASCII characters kept as-is
pub fn template_json_pretty() -> String {
    // Serializing a `Value` cannot fail
    serde_json::to_string_pretty(extraction_template()).unwrap_or_default()
}

/// Key paths of the template that `candidate` lacks.
///
/// Paths are dot-separated (`data.antecedentes pessoais.alergias`). Sequences
/// are checked element by element against the template's entry shape, and a
/// candidate may omit the outer `data` wrapper.
pub fn missing_keys(candidate: &Value) -> Vec<String> {
    let mut missing = Vec::new();
    let template = extraction_template();

    match candidate.get("data") {
        Some(_) => collect_missing(template, candidate, "", &mut missing),
        None => {
            if let Some(inner_template) = template.get("data") {
                collect_missing(inner_template, candidate, "data", &mut missing);
            }
        }
    }
    missing
}

fn collect_missing(template: &Value, candidate: &Value, path: &str, missing: &mut Vec<String>) {
    match template {
        Value::Object(fields) => {
            let Some(candidate_fields) = candidate.as_object() else {
                return;
            };
            for (key, child) in fields {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                match candidate_fields.get(key) {
                    Some(value) => collect_missing(child, value, &child_path, missing),
                    None => missing.push(child_path),
                }
            }
        }
        Value::Array(entries) => {
            let (Some(entry), Some(items)) = (entries.first(), candidate.as_array()) else {
                return;
            };
            for (idx, item) in items.iter().enumerate() {
                collect_missing(entry, item, &format!("{}[{}]", path, idx), missing);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PatientRecord, RecordPayload};

    #[test]
    fn test_template_round_trip() {
        let text = template_json_pretty();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(&parsed, extraction_template());
    }

    #[test]
    fn test_template_keeps_unicode_and_indentation() {
        let text = template_json_pretty();
        assert!(text.contains("\n  \"data\": {"));
        assert!(!text.contains("\\u"));
    }

    #[test]
    fn test_default_record_matches_template() {
        let value = serde_json::to_value(RecordPayload::default()).unwrap();
        assert_eq!(&value, extraction_template());
    }

    #[test]
    fn test_template_decodes_to_default_record() {
        let record = PatientRecord::from_json_value(extraction_template().clone()).unwrap();
        assert_eq!(record, PatientRecord::default());
    }

    #[test]
    fn test_no_missing_keys_in_template() {
        assert!(missing_keys(extraction_template()).is_empty());
        assert!(missing_keys(&extraction_template()["data"]).is_empty());
    }

    #[test]
    fn test_missing_keys_reported_with_paths() {
        let mut candidate = extraction_template().clone();
        let data = candidate["data"].as_object_mut().unwrap();
        data.remove("hda");
        data["antecedentes pessoais"]
            .as_object_mut()
            .unwrap()
            .remove("alergias");
        data["exames complementares"] = json!([{"tipo": "RM", "data": ""}]);

        let missing = missing_keys(&candidate);
        assert_eq!(
            missing,
            vec![
                "data.hda",
                "data.antecedentes pessoais.alergias",
                "data.exames complementares[0].laudo",
            ]
        );
    }

    #[test]
    fn test_missing_keys_without_wrapper() {
        let candidate = json!({"nome do paciente": "Ana"});
        let missing = missing_keys(&candidate);
        assert!(missing.contains(&"data.idade".to_string()));
        assert!(!missing.contains(&"data.nome do paciente".to_string()));
    }
}
