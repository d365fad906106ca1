use super::BatchOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchSummary {
    pub n_records: usize,
    pub n_assessed: usize,
    pub n_rejected: usize,
    pub n_at_risk: usize,
    pub threshold: f64,
    pub ckd_probability: ProbabilitySummary,
    pub generated_at: DateTime<Utc>,
}

/// CKD probability statistics, in percent, over assessed records.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProbabilitySummary {
    pub mean: f64,
    pub sd: f64,
    pub min: f64,
    pub max: f64,
}

impl BatchSummary {
    pub fn from_outcome(outcome: &BatchOutcome) -> Self {
        let probabilities: Vec<f64> = outcome.assessments.iter()
            .map(|a| a.result.ckd_probability)
            .collect();

        Self {
            n_records: outcome.total(),
            n_assessed: outcome.assessments.len(),
            n_rejected: outcome.rejections.len(),
            n_at_risk: outcome.assessments.iter().filter(|a| a.result.is_at_risk()).count(),
            threshold: outcome.threshold,
            ckd_probability: ProbabilitySummary {
                mean: mean(&probabilities),
                sd: std_dev(&probabilities),
                min: probabilities.iter().copied().reduce(f64::min).unwrap_or(0.0),
                max: probabilities.iter().copied().reduce(f64::max).unwrap_or(0.0),
            },
            generated_at: Utc::now(),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        0.0
    } else {
        let mean_val = mean(values);
        let variance = values.iter()
            .map(|v| (v - mean_val).powi(2))
            .sum::<f64>() / (values.len() - 1) as f64;
        variance.sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::tests::mixed_outcome;
    use approx::assert_relative_eq;

    #[test]
    fn test_summary_counts() {
        let outcome = mixed_outcome();
        let summary = BatchSummary::from_outcome(&outcome);

        assert_eq!(summary.n_records, 3);
        assert_eq!(summary.n_assessed, 2);
        assert_eq!(summary.n_rejected, 1);
        assert_eq!(summary.n_at_risk, 1);
        assert_eq!(summary.threshold, 0.5);
        assert!(summary.ckd_probability.min < 50.0);
        assert!(summary.ckd_probability.max > 50.0);
    }

    #[test]
    fn test_empty_outcome() {
        let outcome = BatchOutcome {
            threshold: 0.5,
            assessments: vec![],
            rejections: vec![],
        };
        let summary = BatchSummary::from_outcome(&outcome);
        assert_eq!(summary.n_records, 0);
        assert_eq!(summary.ckd_probability.mean, 0.0);
        assert_eq!(summary.ckd_probability.max, 0.0);
    }

    #[test]
    fn test_mean_and_sd() {
        assert_relative_eq!(mean(&[10.0, 20.0, 30.0]), 20.0);
        assert_relative_eq!(std_dev(&[10.0, 20.0, 30.0]), 10.0);
        assert_eq!(std_dev(&[5.0]), 0.0);
    }
}
