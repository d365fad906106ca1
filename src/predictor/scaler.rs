use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::error::{CkdError, CkdResult};
use crate::record::{FeatureVector, FIELDS, N_FEATURES};

/// Fitted per-feature standardisation: `(x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
    /// Column names recorded at fit time, checked against the input order when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_names: Option<Vec<String>>,
}

impl Scaler {
    pub fn from_file<P: AsRef<Path>>(path: P) -> CkdResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let scaler: Scaler = serde_json::from_str(&content)?;
        scaler.validate()?;
        Ok(scaler)
    }

    pub fn validate(&self) -> CkdResult<()> {
        if self.mean.len() != N_FEATURES || self.scale.len() != N_FEATURES {
            return Err(CkdError::Artifact(format!(
                "Scaler must have {} means and scales, got {} and {}",
                N_FEATURES,
                self.mean.len(),
                self.scale.len()
            )));
        }

        for (idx, (&mean, &scale)) in self.mean.iter().zip(&self.scale).enumerate() {
            if !mean.is_finite() || !scale.is_finite() || scale == 0.0 {
                return Err(CkdError::Artifact(format!(
                    "Scaler parameters for '{}' are invalid (mean {}, scale {})",
                    FIELDS[idx].name, mean, scale
                )));
            }
        }

        if let Some(names) = &self.feature_names {
            let expected = FIELDS.iter().map(|spec| spec.name);
            if names.len() != N_FEATURES || !names.iter().map(String::as_str).eq(expected) {
                return Err(CkdError::Artifact(
                    "Scaler feature names do not match the input column order".to_string()
                ));
            }
        }

        Ok(())
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, features: &FeatureVector) -> CkdResult<Vec<f64>> {
        if features.len() != self.n_features() {
            return Err(CkdError::FeatureCount {
                expected: self.n_features(),
                actual: features.len(),
            });
        }

        Ok(features
            .as_slice()
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect())
    }
}
