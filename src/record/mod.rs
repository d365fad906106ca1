pub mod encoder;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::error::{CkdError, CkdResult};
use log::warn;

pub use encoder::{encode, FeatureVector};

/// Number of features the scaler and classifier were trained on.
pub const N_FEATURES: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Continuous,
    /// Two-value vocabulary, each value mapped to its 0/1 indicator.
    Categorical([(&'static str, u8); 2]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const NORMAL_ABNORMAL: FieldKind = FieldKind::Categorical([("normal", 0), ("abnormal", 1)]);
const PRESENCE: FieldKind = FieldKind::Categorical([("not present", 0), ("present", 1)]);
const NO_YES: FieldKind = FieldKind::Categorical([("no", 0), ("yes", 1)]);
const APPETITE: FieldKind = FieldKind::Categorical([("poor", 0), ("good", 1)]);

const fn continuous(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Continuous }
}

const fn categorical(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

/// Input fields in the column order used at training time.
pub const FIELDS: [FieldSpec; N_FEATURES] = [
    continuous("age"),
    continuous("bp"),
    continuous("sg"),
    continuous("al"),
    continuous("su"),
    categorical("rbc", NORMAL_ABNORMAL),
    categorical("pc", NORMAL_ABNORMAL),
    categorical("pcc", PRESENCE),
    categorical("ba", PRESENCE),
    continuous("bgr"),
    continuous("bu"),
    continuous("sc"),
    continuous("sod"),
    continuous("pot"),
    continuous("hemo"),
    continuous("pcv"),
    continuous("wc"),
    continuous("rc"),
    categorical("htn", NO_YES),
    categorical("dm", NO_YES),
    categorical("cad", NO_YES),
    categorical("appet", APPETITE),
    categorical("pe", NO_YES),
    categorical("ane", NO_YES),
];

pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|spec| spec.name == name)
}

/// A raw submitted value before encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    /// JSON `null`
    Missing,
    /// Any other JSON value (booleans, arrays, objects); rejected by the encoder.
    Other(serde_json::Value),
}

impl FieldValue {
    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Missing => true,
            FieldValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Number(value) => write!(f, "{}", value),
            FieldValue::Text(text) => write!(f, "{}", text),
            FieldValue::Missing => write!(f, "null"),
            FieldValue::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl PatientRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns the value for `name`, treating blank text as absent.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name).filter(|value| !value.is_blank())
    }

    pub fn from_json_str(content: &str) -> CkdResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Builds a record from `name=value` pairs, as submitted by a form.
    pub fn from_pairs<I, S>(pairs: I) -> CkdResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut record = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (name, value) = pair.split_once('=').ok_or_else(|| {
                CkdError::MalformedInput(format!("Expected name=value, got '{}'", pair))
            })?;
            let name = name.trim();
            if name == "id" {
                record.id = Some(value.trim().to_string());
            } else {
                if field_spec(name).is_none() {
                    warn!("Ignoring unknown field '{}'", name);
                }
                record.set(name, FieldValue::Text(value.to_string()));
            }
        }
        Ok(record)
    }

    /// Builds a record from a CSV row. An `id` column, if present, becomes the record id.
    pub fn from_csv_row(headers: &csv::StringRecord, row: &csv::StringRecord) -> Self {
        let mut record = Self::new();
        for (name, cell) in headers.iter().zip(row.iter()) {
            let name = name.trim();
            if name == "id" {
                if !cell.trim().is_empty() {
                    record.id = Some(cell.trim().to_string());
                }
            } else {
                record.set(name, FieldValue::Text(cell.to_string()));
            }
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_table_matches_training_order() {
        let names: Vec<&str> = FIELDS.iter().map(|f| f.name).collect();
        assert_eq!(
            names,
            vec![
                "age", "bp", "sg", "al", "su", "rbc", "pc", "pcc", "ba", "bgr",
                "bu", "sc", "sod", "pot", "hemo", "pcv", "wc", "rc",
                "htn", "dm", "cad", "appet", "pe", "ane",
            ]
        );
        let categorical = FIELDS
            .iter()
            .filter(|f| matches!(f.kind, FieldKind::Categorical(_)))
            .count();
        assert_eq!(categorical, 10);
    }

    #[test]
    fn test_record_from_json_mixes_numbers_and_text() {
        let record = PatientRecord::from_json_str(
            r#"{"id": "p-1", "age": 40, "rbc": "normal", "sc": "1.2"}"#,
        )
        .unwrap();
        assert_eq!(record.id.as_deref(), Some("p-1"));
        assert_eq!(record.get("age"), Some(&FieldValue::Number(40.0)));
        assert_eq!(record.get("rbc"), Some(&FieldValue::Text("normal".to_string())));
        assert_eq!(record.get("sc"), Some(&FieldValue::Text("1.2".to_string())));
        assert!(record.get("id").is_none());
    }

    fn low_sample_json() -> serde_json::Value {
        serde_json::to_value(crate::samples::Sample::Low.record()).unwrap()
    }

    #[test]
    fn test_null_json_field_reads_as_missing() {
        let mut value = low_sample_json();
        value["bp"] = serde_json::Value::Null;

        let record = PatientRecord::from_json_str(&value.to_string()).unwrap();
        assert!(record.get("bp").is_none());

        let err = encode(&record).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(err, CkdError::MissingField { .. }));
        assert_eq!(err.field(), Some("bp"));
    }

    #[test]
    fn test_boolean_json_fields_name_their_field() {
        let mut value = low_sample_json();
        value["htn"] = serde_json::Value::Bool(true);
        let record = PatientRecord::from_json_str(&value.to_string()).unwrap();
        let err = encode(&record).unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(err, CkdError::UnknownCategory { .. }));
        assert_eq!(err.field(), Some("htn"));

        let mut value = low_sample_json();
        value["age"] = serde_json::json!([40]);
        let record = PatientRecord::from_json_str(&value.to_string()).unwrap();
        let err = encode(&record).unwrap_err();
        assert!(matches!(err, CkdError::NonNumeric { .. }));
        assert_eq!(err.field(), Some("age"));
    }

    #[test]
    fn test_record_from_pairs() {
        let record = PatientRecord::from_pairs(["id=42", "pcc=not present", "age=57"]).unwrap();
        assert_eq!(record.id.as_deref(), Some("42"));
        assert_eq!(record.get("pcc"), Some(&FieldValue::from("not present")));

        let err = PatientRecord::from_pairs(["age"]).unwrap_err();
        assert!(err.to_string().contains("name=value"));
    }

    #[test]
    fn test_blank_values_read_as_absent() {
        let headers = csv::StringRecord::from(vec!["id", "age", "bp"]);
        let row = csv::StringRecord::from(vec!["", "40", "  "]);
        let record = PatientRecord::from_csv_row(&headers, &row);
        assert!(record.id.is_none());
        assert!(record.get("age").is_some());
        assert!(record.get("bp").is_none());
    }
}
