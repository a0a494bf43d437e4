//! Patient record - the filled copy of the extraction template
//!
//! Field names on the wire are the Portuguese keys of the template; the Rust
//! names are their English equivalents. Decoding is lenient because model
//! replies drift from the template in predictable ways: numbers where strings
//! are expected, a bare string where a list is expected, `null`, or a missing
//! key. Every such reply decodes into the full template shape.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Personal-history sentinel ("denies") for sub-fields the text never mentions
pub const DENIES: &str = "nega";

/// Wire payload: the record wrapped the way the template wraps it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPayload {
    /// The patient record
    pub data: PatientRecord,
}

impl RecordPayload {
    /// Wrap a record for delivery
    pub fn new(data: PatientRecord) -> Self {
        Self { data }
    }
}

/// Structured patient record extracted from one history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientRecord {
    /// Patient name
    #[serde(rename = "nome do paciente", deserialize_with = "lenient_string")]
    pub name: String,

    /// Age
    #[serde(rename = "idade", deserialize_with = "lenient_string")]
    pub age: String,

    /// Sex, inferred from the name when not stated
    #[serde(rename = "sexo", deserialize_with = "lenient_string")]
    pub sex: String,

    /// Ethnicity
    #[serde(rename = "etnia", deserialize_with = "lenient_string")]
    pub ethnicity: String,

    /// Place of origin
    #[serde(rename = "procedente", deserialize_with = "lenient_string")]
    pub origin: String,

    /// Date of birth
    #[serde(rename = "data de nascimento", deserialize_with = "lenient_string")]
    pub birth_date: String,

    /// Hospital record number
    #[serde(rename = "prontuario", deserialize_with = "lenient_string")]
    pub record_number: String,

    /// Military health-plan identifier
    #[serde(rename = "prec cp", deserialize_with = "lenient_string")]
    pub prec_cp: String,

    /// Contact (phone or e-mail)
    #[serde(rename = "contato", deserialize_with = "lenient_string")]
    pub contact: String,

    /// Military rank
    #[serde(rename = "posto e graduacao", deserialize_with = "lenient_string")]
    pub rank: String,

    /// Chief complaint
    #[serde(rename = "queixa principal", deserialize_with = "lenient_string")]
    pub chief_complaint: String,

    /// History of present illness (HDA)
    #[serde(rename = "hda", deserialize_with = "lenient_string")]
    pub present_illness: String,

    /// First follow-up visit
    #[serde(rename = "retorno1", deserialize_with = "lenient_object")]
    pub follow_up_1: FollowUp,

    /// Second follow-up visit
    #[serde(rename = "retorno2", deserialize_with = "lenient_object")]
    pub follow_up_2: FollowUp,

    /// Third follow-up visit
    #[serde(rename = "retorno3", deserialize_with = "lenient_object")]
    pub follow_up_3: FollowUp,

    /// Personal history block
    #[serde(rename = "antecedentes pessoais", deserialize_with = "lenient_object")]
    pub personal_history: PersonalHistory,

    /// General physical exam
    #[serde(rename = "exame fisico geral", deserialize_with = "lenient_object")]
    pub physical_exam: PhysicalExam,

    /// Neurological exam
    #[serde(rename = "exame neurologico", deserialize_with = "lenient_object")]
    pub neurological_exam: NeurologicalExam,

    /// Complementary exams (imaging, labs)
    #[serde(rename = "exames complementares", deserialize_with = "lenient_exams")]
    pub complementary_exams: Vec<ComplementaryExam>,
}

/// A follow-up visit entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUp {
    /// Visit date
    #[serde(rename = "data", deserialize_with = "lenient_string")]
    pub date: String,

    /// Free-text note
    #[serde(rename = "info", deserialize_with = "lenient_string")]
    pub info: String,
}

/// Personal history ("antecedentes pessoais")
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalHistory {
    /// Allergies
    #[serde(rename = "alergias", deserialize_with = "lenient_list")]
    pub allergies: Vec<String>,

    /// Comorbidities
    #[serde(rename = "comorbidades", deserialize_with = "lenient_list")]
    pub comorbidities: Vec<String>,

    /// Habits and addictions
    #[serde(rename = "habitos e vicios", deserialize_with = "lenient_list")]
    pub habits: Vec<String>,

    /// Prior surgeries, free text
    #[serde(rename = "cirurgias previas", deserialize_with = "lenient_string")]
    pub prior_surgeries: String,

    /// Chronic medications
    #[serde(rename = "medicamentos em uso continuo", deserialize_with = "lenient_list")]
    pub chronic_medications: Vec<String>,
}

impl PersonalHistory {
    /// Set every empty sub-field to the [`DENIES`] sentinel.
    ///
    /// Returns how many sub-fields were filled.
    pub fn fill_denied(&mut self) -> usize {
        let mut filled = 0;
        for list in [
            &mut self.allergies,
            &mut self.comorbidities,
            &mut self.habits,
            &mut self.chronic_medications,
        ] {
            if list.is_empty() {
                list.push(DENIES.to_string());
                filled += 1;
            }
        }
        if self.prior_surgeries.is_empty() {
            self.prior_surgeries = DENIES.to_string();
            filled += 1;
        }
        filled
    }
}

/// General physical exam ("exame fisico geral")
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalExam {
    /// Weight in kilograms, numeric only
    #[serde(rename = "peso", deserialize_with = "lenient_string")]
    pub weight: String,

    /// Height in meters, numeric only
    #[serde(rename = "altura", deserialize_with = "lenient_string")]
    pub height: String,

    /// First free-text note
    #[serde(rename = "info1", deserialize_with = "lenient_string")]
    pub info1: String,

    /// Second free-text note
    #[serde(rename = "info2", deserialize_with = "lenient_string")]
    pub info2: String,
}

/// Neurological exam ("exame neurologico")
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NeurologicalExam {
    /// First note
    #[serde(rename = "info1", deserialize_with = "lenient_string")]
    pub info1: String,

    /// Second note
    #[serde(rename = "info2", deserialize_with = "lenient_string")]
    pub info2: String,

    /// Third note
    #[serde(rename = "info3", deserialize_with = "lenient_string")]
    pub info3: String,
}

/// A complementary exam entry
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplementaryExam {
    /// Exam type
    #[serde(rename = "tipo", deserialize_with = "lenient_string")]
    pub kind: String,

    /// Exam date
    #[serde(rename = "data", deserialize_with = "lenient_string")]
    pub date: String,

    /// Report text
    #[serde(rename = "laudo", deserialize_with = "lenient_string")]
    pub report: String,
}

impl Default for PatientRecord {
    /// The empty record, shaped exactly like the extraction template
    fn default() -> Self {
        Self {
            name: String::new(),
            age: String::new(),
            sex: String::new(),
            ethnicity: String::new(),
            origin: String::new(),
            birth_date: String::new(),
            record_number: String::new(),
            prec_cp: String::new(),
            contact: String::new(),
            rank: String::new(),
            chief_complaint: String::new(),
            present_illness: String::new(),
            follow_up_1: FollowUp::default(),
            follow_up_2: FollowUp::default(),
            follow_up_3: FollowUp::default(),
            personal_history: PersonalHistory::default(),
            physical_exam: PhysicalExam::default(),
            neurological_exam: NeurologicalExam::default(),
            complementary_exams: vec![ComplementaryExam::default()],
        }
    }
}

impl PatientRecord {
    /// Decode a model reply into a record.
    ///
    /// Accepts the reply with or without the outer `"data"` wrapper. Anything
    /// other than a JSON object is rejected.
    pub fn from_json_value(value: Value) -> Result<Self, serde_json::Error> {
        let inner = match value {
            Value::Object(mut map) => match map.remove("data") {
                Some(data @ Value::Object(_)) => data,
                Some(other) => {
                    map.insert("data".to_string(), other);
                    Value::Object(map)
                }
                None => Value::Object(map),
            },
            other => {
                return Err(serde_json::Error::custom(format!(
                    "expected a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };
        serde_json::from_value(inner)
    }

    /// Whether nothing at all was filled in
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }

    /// Body mass index (weight / height²), when both measures are numeric.
    ///
    /// Heights above 3 are read as centimeters.
    pub fn body_mass_index(&self) -> Option<f64> {
        let weight = parse_measure(&self.physical_exam.weight)?;
        let mut height = parse_measure(&self.physical_exam.height)?;
        if height > 3.0 {
            height /= 100.0;
        }
        if weight <= 0.0 || height <= 0.0 {
            return None;
        }
        Some(weight / (height * height))
    }

    /// Non-empty follow-up visits, in order
    pub fn follow_ups(&self) -> impl Iterator<Item = &FollowUp> {
        [&self.follow_up_1, &self.follow_up_2, &self.follow_up_3]
            .into_iter()
            .filter(|f| !f.date.is_empty() || !f.info.is_empty())
    }
}

/// Leading number of a measure such as `"82,5 kg"` or `"1.75m"`
fn parse_measure(raw: &str) -> Option<f64> {
    let numeric: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    numeric.replace(',', ".").parse().ok()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Flatten any JSON scalar (or list of scalars) into display text
fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" / "),
        Value::Object(_) => value.to_string(),
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_to_text(&Value::deserialize(deserializer)?))
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect(),
        other => {
            let text = value_to_text(&other);
            if text.is_empty() {
                Vec::new()
            } else {
                vec![text]
            }
        }
    };
    Ok(list)
}

fn lenient_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).map_err(D::Error::custom),
        _ => Ok(T::default()),
    }
}

fn lenient_exams<'de, D>(deserializer: D) -> Result<Vec<ComplementaryExam>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        value @ Value::Object(_) => vec![value],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter(Value::is_object)
        .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_record_has_one_blank_exam() {
        let record = PatientRecord::default();
        assert_eq!(record.complementary_exams.len(), 1);
        assert!(record.is_blank());
    }

    #[test]
    fn test_decode_with_data_wrapper() {
        let value = json!({"data": {"nome do paciente": "João", "idade": "45"}});
        let record = PatientRecord::from_json_value(value).unwrap();
        assert_eq!(record.name, "João");
        assert_eq!(record.age, "45");
    }

    #[test]
    fn test_decode_without_data_wrapper() {
        let value = json!({"nome do paciente": "Maria", "sexo": "feminino"});
        let record = PatientRecord::from_json_value(value).unwrap();
        assert_eq!(record.name, "Maria");
        assert_eq!(record.sex, "feminino");
    }

    #[test]
    fn test_decode_numbers_as_strings() {
        let value = json!({
            "idade": 45,
            "exame fisico geral": {"peso": 82.5, "altura": 1.75}
        });
        let record = PatientRecord::from_json_value(value).unwrap();
        assert_eq!(record.age, "45");
        assert_eq!(record.physical_exam.weight, "82.5");
        assert_eq!(record.physical_exam.height, "1.75");
    }

    #[test]
    fn test_decode_bare_string_as_list() {
        let value = json!({
            "antecedentes pessoais": {
                "alergias": "nega",
                "comorbidades": ["HAS", "", null, "DM2"],
                "habitos e vicios": null,
                "cirurgias previas": ["artroplastia de quadril", "apendicectomia"]
            }
        });
        let record = PatientRecord::from_json_value(value).unwrap();
        let history = &record.personal_history;
        assert_eq!(history.allergies, vec!["nega"]);
        assert_eq!(history.comorbidities, vec!["HAS", "DM2"]);
        assert!(history.habits.is_empty());
        assert_eq!(history.prior_surgeries, "artroplastia de quadril / apendicectomia");
    }

    #[test]
    fn test_decode_null_nested_object() {
        let value = json!({"retorno1": null, "exame neurologico": "normal"});
        let record = PatientRecord::from_json_value(value).unwrap();
        assert_eq!(record.follow_up_1, FollowUp::default());
        assert_eq!(record.neurological_exam, NeurologicalExam::default());
    }

    #[test]
    fn test_decode_exams_variants() {
        let single = json!({"exames complementares": {"tipo": "RM", "data": "01/02/2024", "laudo": "hérnia L4-L5"}});
        let record = PatientRecord::from_json_value(single).unwrap();
        assert_eq!(record.complementary_exams.len(), 1);
        assert_eq!(record.complementary_exams[0].kind, "RM");

        let mixed = json!({"exames complementares": [{"tipo": "TC"}, "lixo", {"tipo": "RX"}]});
        let record = PatientRecord::from_json_value(mixed).unwrap();
        assert_eq!(record.complementary_exams.len(), 2);
        assert_eq!(record.complementary_exams[1].kind, "RX");
    }

    #[test]
    fn test_decode_rejects_non_object() {
        assert!(PatientRecord::from_json_value(json!(["a", "b"])).is_err());
        assert!(PatientRecord::from_json_value(json!("texto")).is_err());
    }

    #[test]
    fn test_fill_denied() {
        let mut history = PersonalHistory {
            comorbidities: vec!["HAS".to_string()],
            ..Default::default()
        };
        let filled = history.fill_denied();
        assert_eq!(filled, 4);
        assert_eq!(history.allergies, vec![DENIES]);
        assert_eq!(history.comorbidities, vec!["HAS"]);
        assert_eq!(history.prior_surgeries, DENIES);
        assert_eq!(history.fill_denied(), 0);
    }

    #[test]
    fn test_body_mass_index() {
        let mut record = PatientRecord::default();
        assert!(record.body_mass_index().is_none());

        record.physical_exam.weight = "80".to_string();
        record.physical_exam.height = "2".to_string();
        assert_eq!(record.body_mass_index(), Some(20.0));

        record.physical_exam.weight = "81 kg".to_string();
        record.physical_exam.height = "180 cm".to_string();
        let bmi = record.body_mass_index().unwrap();
        assert!((bmi - 25.0).abs() < 0.01);

        record.physical_exam.height = "1,80m".to_string();
        let bmi = record.body_mass_index().unwrap();
        assert!((bmi - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_follow_ups_skip_empty() {
        let mut record = PatientRecord::default();
        record.follow_up_2.date = "10/03/2025".to_string();
        let visits: Vec<_> = record.follow_ups().collect();
        assert_eq!(visits.len(), 1);
        assert_eq!(visits[0].date, "10/03/2025");
    }
}
