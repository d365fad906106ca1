use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{CkdError, CkdResult};

pub const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub artifacts: ArtifactConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    pub scaler: PathBuf,
    pub classifier: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Minimum class-1 probability for an at-risk label
    pub threshold: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self { threshold: DEFAULT_THRESHOLD }
    }
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            scaler: PathBuf::from("artifacts/scaler.json"),
            classifier: PathBuf::from("artifacts/classifier.json"),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> CkdResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_json(&content, base_dir)
    }

    /// Parses a config, resolving relative artifact paths against `base_dir`.
    pub fn from_json(content: &str, base_dir: &Path) -> CkdResult<Self> {
        let mut config: Config = serde_json::from_str(content)?;
        config.artifacts.scaler = resolve(base_dir, &config.artifacts.scaler);
        config.artifacts.classifier = resolve(base_dir, &config.artifacts.classifier);
        config.validate()?;
        Ok(config)
    }

    pub fn with_threshold(mut self, threshold: f64) -> CkdResult<Self> {
        self.decision.threshold = threshold;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> CkdResult<()> {
        let threshold = self.decision.threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            return Err(CkdError::InvalidConfig(format!(
                "Decision threshold must be strictly between 0 and 1, got {}",
                threshold
            )));
        }

        if self.artifacts.scaler.as_os_str().is_empty() {
            return Err(CkdError::InvalidConfig(
                "Scaler artifact path must not be empty".to_string()
            ));
        }

        if self.artifacts.classifier.as_os_str().is_empty() {
            return Err(CkdError::InvalidConfig(
                "Classifier artifact path must not be empty".to_string()
            ));
        }

        Ok(())
    }
}

fn resolve(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || path.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
