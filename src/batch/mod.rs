pub mod summary;

use crate::error::{CkdError, CkdResult};
use crate::predictor::{PredictionResult, RiskPredictor};
use crate::record::PatientRecord;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use summary::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assessment {
    /// 1-based input row
    pub row: usize,
    pub id: Option<String>,
    pub result: PredictionResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rejection {
    pub row: usize,
    pub id: Option<String>,
    pub field: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub threshold: f64,
    pub assessments: Vec<Assessment>,
    pub rejections: Vec<Rejection>,
}

impl BatchOutcome {
    pub fn total(&self) -> usize {
        self.assessments.len() + self.rejections.len()
    }
}

/// Reads one patient record per CSV row, using the header row for field names.
///
/// Only an unreadable file fails as a whole. A row that cannot be decoded, or
/// that has more cells than the header, is returned as an error in its slot.
/// Short rows leave the trailing fields missing.
pub fn read_records<P: AsRef<Path>>(path: P) -> CkdResult<Vec<CkdResult<PatientRecord>>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let entry = match row {
            Ok(row) if row.len() > headers.len() => Err(CkdError::MalformedInput(format!(
                "row has {} cells but the header has {}",
                row.len(),
                headers.len()
            ))),
            Ok(row) => Ok(PatientRecord::from_csv_row(&headers, &row)),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => Err(e.into()),
        };
        records.push(entry);
    }
    Ok(records)
}

/// Assesses every record independently; failures are collected, not fatal.
pub fn assess_batch<I>(predictor: &RiskPredictor, records: I) -> BatchOutcome
where
    I: IntoIterator<Item = CkdResult<PatientRecord>>,
{
    let mut assessments = Vec::new();
    let mut rejections = Vec::new();

    for (idx, entry) in records.into_iter().enumerate() {
        let row = idx + 1;
        let (id, outcome) = match entry {
            Ok(record) => {
                let outcome = predictor.assess(&record);
                (record.id, outcome)
            }
            Err(e) => (None, Err(e)),
        };

        match outcome {
            Ok(result) => {
                debug!("Row {}: label {} (CKD {:.1}%)", row, result.label, result.ckd_probability);
                assessments.push(Assessment { row, id, result });
            }
            Err(e) => {
                if e.is_validation() {
                    warn!("Row {} rejected: {}", row, e);
                } else {
                    error!("Row {} failed: {}", row, e);
                }
                rejections.push(Rejection {
                    row,
                    id,
                    field: e.field().map(str::to_string),
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "Assessed {} records ({} rejected)",
        assessments.len() + rejections.len(),
        rejections.len()
    );

    BatchOutcome {
        threshold: predictor.threshold(),
        assessments,
        rejections,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use crate::samples::Sample;
    use std::path::PathBuf;

    pub(crate) fn reference_predictor() -> RiskPredictor {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        let mut config = Config::default();
        config.artifacts.scaler = root.join("artifacts/scaler.json");
        config.artifacts.classifier = root.join("artifacts/classifier.json");
        RiskPredictor::load(&config).unwrap()
    }

    pub(crate) fn mixed_outcome() -> BatchOutcome {
        let mut bad = Sample::Low.record().with_id("bad-1");
        bad.set("rbc", "unknown");
        let records = vec![Sample::Low.record(), bad, Sample::High.record()];
        assess_batch(&reference_predictor(), records.into_iter().map(Ok))
    }

    #[test]
    fn test_batch_keeps_going_after_rejection() {
        let outcome = mixed_outcome();
        assert_eq!(outcome.total(), 3);
        assert_eq!(outcome.assessments.len(), 2);
        assert_eq!(outcome.rejections.len(), 1);

        let rejection = &outcome.rejections[0];
        assert_eq!(rejection.row, 2);
        assert_eq!(rejection.id.as_deref(), Some("bad-1"));
        assert_eq!(rejection.field.as_deref(), Some("rbc"));

        assert_eq!(outcome.assessments[0].result.label, 0);
        assert_eq!(outcome.assessments[1].row, 3);
        assert_eq!(outcome.assessments[1].result.label, 1);
    }

    #[test]
    fn test_read_records_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        let header = "id,age,bp,sg,al,su,rbc,pc,pcc,ba,bgr,bu,sc,sod,pot,hemo,pcv,wc,rc,htn,dm,cad,appet,pe,ane";
        let rows = [
            "p1,40,80,1.025,0,0,normal,normal,not present,not present,140,10,1.2,150,4.6,17.0,48,10400,4.5,no,no,no,good,no,no",
            "p2,57,90,1.015,5,0,abnormal,abnormal,not present,present,121,322,13.0,126,4.8,8.0,24,4200,3.3,yes,yes,yes,poor,yes,yes",
            "p3,57,,1.015,5,0,abnormal,abnormal,not present,present,121,322,13.0,126,4.8,8.0,24,4200,3.3,yes,yes,yes,poor,yes,yes",
        ];
        std::fs::write(&path, format!("{}\n{}\n", header, rows.join("\n"))).unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].as_ref().unwrap().id.as_deref(), Some("p1"));

        let outcome = assess_batch(&reference_predictor(), records);
        assert_eq!(outcome.assessments.len(), 2);
        assert_eq!(outcome.rejections[0].field.as_deref(), Some("bp"));
        assert_eq!(outcome.rejections[0].id.as_deref(), Some("p3"));
    }

    #[test]
    fn test_ragged_rows_are_rejected_individually() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.csv");
        let header = "id,age,bp,sg,al,su,rbc,pc,pcc,ba,bgr,bu,sc,sod,pot,hemo,pcv,wc,rc,htn,dm,cad,appet,pe,ane";
        let low = "40,80,1.025,0,0,normal,normal,not present,not present,140,10,1.2,150,4.6,17.0,48,10400,4.5,no,no,no,good,no,no";
        let rows = [
            format!("ok-1,{}", low),
            "short,57,90".to_string(),
            format!("long,{},extra", low),
            format!("ok-2,{}", low),
        ];
        std::fs::write(&path, format!("{}\n{}\n", header, rows.join("\n"))).unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 4);

        let outcome = assess_batch(&reference_predictor(), records);
        assert_eq!(outcome.total(), 4);
        assert_eq!(outcome.assessments.len(), 2);
        assert_eq!(outcome.assessments[1].id.as_deref(), Some("ok-2"));

        let short = &outcome.rejections[0];
        assert_eq!(short.row, 2);
        assert_eq!(short.id.as_deref(), Some("short"));
        assert_eq!(short.field.as_deref(), Some("sg"));

        let long = &outcome.rejections[1];
        assert_eq!(long.row, 3);
        assert!(long.field.is_none());
        assert!(long.message.contains("26 cells"));
    }
}
