use super::{check_len, Classifier};
use crate::error::{CkdError, CkdResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LogisticRegression {
    #[cfg(test)]
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> CkdResult<Self> {
        let model = Self { coefficients, intercept };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> CkdResult<()> {
        if self.coefficients.is_empty() {
            return Err(CkdError::Artifact(
                "Logistic regression has no coefficients".to_string()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(CkdError::Artifact(
                "Logistic regression parameters must be finite".to_string()
            ));
        }
        Ok(())
    }

    pub fn decision_function(&self, features: &[f64]) -> CkdResult<f64> {
        check_len(self.n_features(), features)?;
        Ok(self.intercept
            + self.coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn class_probabilities(&self, features: &[f64]) -> CkdResult<[f64; 2]> {
        let p1 = sigmoid(self.decision_function(features)?);
        Ok([1.0 - p1, p1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_probabilities() {
        let model = LogisticRegression::new(vec![2.0, -1.0], 0.5).unwrap();

        let [p0, p1] = model.class_probabilities(&[0.0, 0.5]).unwrap();
        assert_relative_eq!(p1, 0.5, epsilon = 1e-12);
        assert_relative_eq!(p0 + p1, 1.0, epsilon = 1e-12);

        let [_, p1] = model.class_probabilities(&[1.0, 0.0]).unwrap();
        assert_relative_eq!(p1, 1.0 / (1.0 + (-2.5f64).exp()), epsilon = 1e-12);
    }

    #[test]
    fn test_extreme_margins_stay_finite() {
        let model = LogisticRegression::new(vec![1.0], 0.0).unwrap();
        let [p0, p1] = model.class_probabilities(&[-1000.0]).unwrap();
        assert!(p0.is_finite() && p1.is_finite());
        assert_relative_eq!(p0, 1.0, epsilon = 1e-12);

        let [p0, p1] = model.class_probabilities(&[1000.0]).unwrap();
        assert_relative_eq!(p1, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p0, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_classify_uses_threshold() {
        let model = LogisticRegression::new(vec![1.0], 0.0).unwrap();
        // p1 = sigmoid(0.5) ~ 0.62
        assert_eq!(model.classify(&[0.5], 0.5).unwrap(), 1);
        assert_eq!(model.classify(&[0.5], 0.7).unwrap(), 0);
        // ties go to the at-risk class
        assert_eq!(model.classify(&[0.0], 0.5).unwrap(), 1);
    }

    #[test]
    fn test_wrong_feature_count() {
        let model = LogisticRegression::new(vec![1.0, 1.0], 0.0).unwrap();
        let err = model.class_probabilities(&[1.0]).unwrap_err();
        assert!(matches!(err, CkdError::FeatureCount { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_non_finite_parameters_rejected() {
        assert!(LogisticRegression::new(vec![f64::NAN], 0.0).is_err());
        assert!(LogisticRegression::new(vec![], 0.0).is_err());
    }
}
