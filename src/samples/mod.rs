use crate::record::PatientRecord;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Preset patients matching the quick-fill profiles of the assessment form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sample {
    Low,
    Medium,
    High,
}

impl Sample {
    pub const ALL: [Sample; 3] = [Sample::Low, Sample::Medium, Sample::High];

    pub fn name(&self) -> &'static str {
        match self {
            Sample::Low => "low",
            Sample::Medium => "medium",
            Sample::High => "high",
        }
    }

    pub fn record(&self) -> PatientRecord {
        let (measurements, categories): (&[(&str, f64)], &[(&str, &str)]) = match self {
            // Healthy profile
            Sample::Low => (
                &[
                    ("age", 40.0), ("bp", 80.0), ("sg", 1.025), ("al", 0.0), ("su", 0.0),
                    ("bgr", 140.0), ("bu", 10.0), ("sc", 1.2), ("sod", 150.0), ("pot", 4.6),
                    ("hemo", 17.0), ("pcv", 48.0), ("wc", 10400.0), ("rc", 4.5),
                ],
                &[
                    ("rbc", "normal"), ("pc", "normal"), ("pcc", "not present"),
                    ("ba", "not present"), ("htn", "no"), ("dm", "no"), ("cad", "no"),
                    ("appet", "good"), ("pe", "no"), ("ane", "no"),
                ],
            ),
            // Fewer risk factors than the high profile
            Sample::Medium => (
                &[
                    ("age", 48.0), ("bp", 70.0), ("sg", 1.020), ("al", 1.0), ("su", 0.0),
                    ("bgr", 150.0), ("bu", 36.0), ("sc", 1.8), ("sod", 137.0), ("pot", 4.3),
                    ("hemo", 13.8), ("pcv", 44.0), ("wc", 8000.0), ("rc", 4.5),
                ],
                &[
                    ("rbc", "normal"), ("pc", "normal"), ("pcc", "not present"),
                    ("ba", "not present"), ("htn", "yes"), ("dm", "no"), ("cad", "no"),
                    ("appet", "good"), ("pe", "no"), ("ane", "no"),
                ],
            ),
            Sample::High => (
                &[
                    ("age", 57.0), ("bp", 90.0), ("sg", 1.015), ("al", 5.0), ("su", 0.0),
                    ("bgr", 121.0), ("bu", 322.0), ("sc", 13.0), ("sod", 126.0), ("pot", 4.8),
                    ("hemo", 8.0), ("pcv", 24.0), ("wc", 4200.0), ("rc", 3.3),
                ],
                &[
                    ("rbc", "abnormal"), ("pc", "abnormal"), ("pcc", "not present"),
                    ("ba", "present"), ("htn", "yes"), ("dm", "yes"), ("cad", "yes"),
                    ("appet", "poor"), ("pe", "yes"), ("ane", "yes"),
                ],
            ),
        };

        let mut record = PatientRecord::new().with_id(format!("sample-{}", self.name()));
        for &(name, value) in measurements {
            record.set(name, value);
        }
        for &(name, value) in categories {
            record.set(name, value);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{FIELDS, N_FEATURES};

    #[test]
    fn test_samples_cover_every_field() {
        for sample in Sample::ALL {
            let record = sample.record();
            assert_eq!(record.fields.len(), N_FEATURES);
            for spec in &FIELDS {
                assert!(record.get(spec.name).is_some(), "{} missing {}", sample.name(), spec.name);
            }
        }
    }

    #[test]
    fn test_sample_ids() {
        assert_eq!(Sample::Medium.record().id.as_deref(), Some("sample-medium"));
    }
}
