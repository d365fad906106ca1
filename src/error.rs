use thiserror::Error;

#[derive(Error, Debug)]
pub enum CkdError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required field '{field}'")]
    MissingField { field: String },

    #[error("Field '{field}' must be numeric, got '{value}'")]
    NonNumeric { field: String, value: String },

    #[error("Field '{field}' has unknown value '{value}' (expected one of: {})", .expected.join(", "))]
    UnknownCategory {
        field: String,
        value: String,
        expected: Vec<String>,
    },

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Invalid model artifact: {0}")]
    Artifact(String),

    #[error("Feature count mismatch: expected {expected}, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CkdError {
    /// True for errors caused by the caller's input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CkdError::MissingField { .. }
                | CkdError::NonNumeric { .. }
                | CkdError::UnknownCategory { .. }
        )
    }

    /// Name of the offending input field, for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            CkdError::MissingField { field }
            | CkdError::NonNumeric { field, .. }
            | CkdError::UnknownCategory { field, .. } => Some(field),
            _ => None,
        }
    }
}

pub type CkdResult<T> = Result<T, CkdError>;
