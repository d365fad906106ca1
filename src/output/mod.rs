use crate::batch::{BatchOutcome, BatchSummary};
use crate::error::CkdResult;
use crate::predictor::PredictionResult;
use std::fs::File;
use std::path::Path;
use log::info;

pub fn save_results<P: AsRef<Path>>(outcome: &BatchOutcome, output_dir: P) -> CkdResult<BatchSummary> {
    let output_path = output_dir.as_ref();

    save_predictions(outcome, &output_path.join("predictions.csv"))?;
    save_rejections(outcome, &output_path.join("rejected.csv"))?;

    let summary = BatchSummary::from_outcome(outcome);
    save_summary(&summary, &output_path.join("summary.json"))?;
    std::fs::write(output_path.join("report.md"), batch_report(&summary))?;

    info!("All results saved to {:?}", output_path);
    Ok(summary)
}

fn save_predictions<P: AsRef<Path>>(outcome: &BatchOutcome, path: P) -> CkdResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record([
        "ROW", "ID", "LABEL", "P0", "P1", "CKD_PROBABILITY", "NON_CKD_PROBABILITY", "CONFIDENCE",
    ])?;

    for assessment in &outcome.assessments {
        let result = &assessment.result;
        writer.write_record(&[
            assessment.row.to_string(),
            assessment.id.clone().unwrap_or_default(),
            result.label.to_string(),
            result.p0.to_string(),
            result.p1.to_string(),
            format!("{:.2}", result.ckd_probability),
            format!("{:.2}", result.non_ckd_probability),
            format!("{:.2}", result.confidence),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_rejections<P: AsRef<Path>>(outcome: &BatchOutcome, path: P) -> CkdResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    writer.write_record(["ROW", "ID", "FIELD", "ERROR"])?;

    for rejection in &outcome.rejections {
        writer.write_record(&[
            rejection.row.to_string(),
            rejection.id.clone().unwrap_or_default(),
            rejection.field.clone().unwrap_or_default(),
            rejection.message.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_summary<P: AsRef<Path>>(summary: &BatchSummary, path: P) -> CkdResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

/// Plain-text rendering of a single prediction.
pub fn prediction_report(id: Option<&str>, result: &PredictionResult) -> String {
    let patient = id.map(|id| format!("Patient: {}\n", id)).unwrap_or_default();
    format!(
        "{}{}\nCKD Risk: {:.1}%\nNo CKD: {:.1}%\nConfidence: {:.1}%",
        patient,
        result.headline(),
        result.ckd_probability,
        result.non_ckd_probability,
        result.confidence
    )
}

pub fn batch_report(summary: &BatchSummary) -> String {
    let at_risk_share = if summary.n_assessed > 0 {
        summary.n_at_risk as f64 / summary.n_assessed as f64 * 100.0
    } else {
        0.0
    };

    format!(
        r#"# Chronic Kidney Disease Risk Report

Generated: {}

## Overview
- **Records read**: {}
- **Assessed**: {}
- **Rejected**: {}
- **Decision threshold**: {:.2}

## Risk
- **At risk**: {} ({:.1}% of assessed)
- **CKD probability mean**: {:.1}%
- **CKD probability SD**: {:.1}%
- **CKD probability range**: {:.1}% to {:.1}%

## Files Generated
- `predictions.csv`: label and class probabilities per assessed record
- `rejected.csv`: records that failed validation, with the offending field
- `summary.json`: batch statistics
"#,
        summary.generated_at.to_rfc3339(),
        summary.n_records,
        summary.n_assessed,
        summary.n_rejected,
        summary.threshold,
        summary.n_at_risk,
        at_risk_share,
        summary.ckd_probability.mean,
        summary.ckd_probability.sd,
        summary.ckd_probability.min,
        summary.ckd_probability.max,
    )
}
