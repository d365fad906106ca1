pub mod scaler;
pub mod logistic;
pub mod forest;

use crate::config::Config;
use crate::error::{CkdError, CkdResult};
use crate::record::{encode, FeatureVector, PatientRecord, N_FEATURES};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use forest::RandomForest;
pub use logistic::LogisticRegression;
pub use scaler::Scaler;

/// Tolerance for the two class probabilities summing to one.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

pub trait Classifier: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;
    fn n_features(&self) -> usize;
    /// Returns `[p0, p1]` for a scaled feature vector.
    fn class_probabilities(&self, features: &[f64]) -> CkdResult<[f64; 2]>;

    fn classify(&self, features: &[f64], threshold: f64) -> CkdResult<u8> {
        let [_, p1] = self.class_probabilities(features)?;
        Ok(decide(p1, threshold))
    }
}

/// Label 1 when the at-risk probability reaches the threshold.
pub fn decide(p1: f64, threshold: f64) -> u8 {
    if p1 >= threshold { 1 } else { 0 }
}

pub(crate) fn check_len(expected: usize, features: &[f64]) -> CkdResult<()> {
    if features.len() != expected {
        return Err(CkdError::FeatureCount {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

/// On-disk classifier, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
}

impl ClassifierArtifact {
    pub fn from_file<P: AsRef<Path>>(path: P) -> CkdResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn into_classifier(self) -> CkdResult<Box<dyn Classifier>> {
        match self {
            ClassifierArtifact::LogisticRegression(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
            ClassifierArtifact::RandomForest(model) => {
                model.validate()?;
                Ok(Box::new(model))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// 0 = not at risk, 1 = at risk
    pub label: u8,
    pub p0: f64,
    pub p1: f64,
    pub ckd_probability: f64,
    pub non_ckd_probability: f64,
    pub confidence: f64,
}

impl PredictionResult {
    /// Derives the display percentages from checked class probabilities and a label.
    pub fn new(probabilities: [f64; 2], label: u8) -> CkdResult<Self> {
        let [p0, p1] = probabilities;
        if !p0.is_finite() || !p1.is_finite() {
            return Err(CkdError::Numerical(format!(
                "Classifier returned non-finite probabilities ({}, {})", p0, p1
            )));
        }
        if ((p0 + p1) - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(CkdError::Numerical(format!(
                "Class probabilities sum to {} instead of 1", p0 + p1
            )));
        }

        let ckd_probability = p1 * 100.0;
        let non_ckd_probability = p0 * 100.0;
        let confidence = if label == 1 { ckd_probability } else { non_ckd_probability };

        Ok(Self {
            label,
            p0,
            p1,
            ckd_probability,
            non_ckd_probability,
            confidence,
        })
    }

    pub fn is_at_risk(&self) -> bool {
        self.label == 1
    }

    pub fn headline(&self) -> &'static str {
        if self.is_at_risk() {
            "High Risk of Chronic Kidney Disease"
        } else {
            "Low Risk of Chronic Kidney Disease"
        }
    }
}

/// Fitted scaler and classifier, loaded once and shared read-only.
#[derive(Debug)]
pub struct RiskPredictor {
    scaler: Scaler,
    classifier: Box<dyn Classifier>,
    threshold: f64,
}

impl RiskPredictor {
    pub fn new(scaler: Scaler, classifier: Box<dyn Classifier>, threshold: f64) -> CkdResult<Self> {
        scaler.validate()?;
        if classifier.n_features() != N_FEATURES {
            return Err(CkdError::Artifact(format!(
                "Classifier expects {} features, inputs have {}",
                classifier.n_features(),
                N_FEATURES
            )));
        }
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(CkdError::InvalidConfig(format!(
                "Decision threshold must be strictly between 0 and 1, got {}", threshold
            )));
        }
        Ok(Self { scaler, classifier, threshold })
    }

    /// Loads both artifacts named by `config`. Any failure is an artifact error naming the file.
    pub fn load(config: &Config) -> CkdResult<Self> {
        let scaler_path = &config.artifacts.scaler;
        let scaler = Scaler::from_file(scaler_path)
            .map_err(|e| load_error("scaler", scaler_path, e))?;

        let classifier_path = &config.artifacts.classifier;
        let classifier = ClassifierArtifact::from_file(classifier_path)
            .and_then(ClassifierArtifact::into_classifier)
            .map_err(|e| load_error("classifier", classifier_path, e))?;

        info!(
            "Loaded {} classifier from {:?} (threshold {})",
            classifier.name(),
            classifier_path,
            config.decision.threshold
        );

        Self::new(scaler, classifier, config.decision.threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classifier_name(&self) -> &'static str {
        self.classifier.name()
    }

    pub fn predict(&self, features: &FeatureVector) -> CkdResult<PredictionResult> {
        let scaled = self.scaler.transform(features)?;
        let probabilities = self.classifier.class_probabilities(&scaled)?;
        let label = self.classifier.classify(&scaled, self.threshold)?;
        let result = PredictionResult::new(probabilities, label)?;
        debug!("Prediction: label {} (p1 = {:.4})", result.label, result.p1);
        Ok(result)
    }

    /// Encodes and predicts a single record.
    pub fn assess(&self, record: &PatientRecord) -> CkdResult<PredictionResult> {
        let features = encode(record)?;
        self.predict(&features)
    }
}

/// Names the artifact file, without repeating the artifact prefix of an inner error.
fn load_error(what: &str, path: &Path, err: CkdError) -> CkdError {
    let detail = match err {
        CkdError::Artifact(message) => message,
        other => other.to_string(),
    };
    CkdError::Artifact(format!("cannot load {} from {}: {}", what, path.display(), detail))
}
