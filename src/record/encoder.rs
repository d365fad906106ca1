use super::{FieldKind, FieldSpec, FieldValue, PatientRecord, FIELDS, N_FEATURES};
use crate::error::{CkdError, CkdResult};
use serde::Serialize;

/// Numeric encoding of a patient record, in training column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<f64> {
        FIELDS
            .iter()
            .position(|spec| spec.name == name)
            .and_then(|idx| self.0.get(idx).copied())
    }
}

/// Encode a record into a feature vector.
///
/// Fields are checked in column order and the first offending field is
/// reported. Keys that are not model inputs are ignored.
pub fn encode(record: &PatientRecord) -> CkdResult<FeatureVector> {
    let mut values = Vec::with_capacity(N_FEATURES);

    for spec in &FIELDS {
        let raw = record.get(spec.name).ok_or_else(|| CkdError::MissingField {
            field: spec.name.to_string(),
        })?;

        let value = match spec.kind {
            FieldKind::Continuous => encode_continuous(spec, raw)?,
            FieldKind::Categorical(vocabulary) => encode_categorical(spec, &vocabulary, raw)?,
        };
        values.push(value);
    }

    Ok(FeatureVector(values))
}

fn encode_continuous(spec: &FieldSpec, raw: &FieldValue) -> CkdResult<f64> {
    let value = match raw {
        FieldValue::Number(value) => Some(*value),
        FieldValue::Text(text) => text.trim().parse::<f64>().ok(),
        FieldValue::Missing | FieldValue::Other(_) => None,
    };

    match value {
        Some(value) if value.is_finite() => Ok(value),
        _ => Err(CkdError::NonNumeric {
            field: spec.name.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn encode_categorical(
    spec: &FieldSpec,
    vocabulary: &[(&'static str, u8); 2],
    raw: &FieldValue,
) -> CkdResult<f64> {
    let indicator = match raw {
        FieldValue::Text(text) => {
            let text = text.trim();
            vocabulary
                .iter()
                .find(|(key, _)| *key == text)
                .map(|(_, indicator)| *indicator)
        }
        FieldValue::Number(_) | FieldValue::Missing | FieldValue::Other(_) => None,
    };

    indicator
        .map(f64::from)
        .ok_or_else(|| CkdError::UnknownCategory {
            field: spec.name.to_string(),
            value: raw.to_string(),
            expected: vocabulary.iter().map(|(key, _)| key.to_string()).collect(),
        })
}
