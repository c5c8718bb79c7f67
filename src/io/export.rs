//! Export the training report as JSON.
//!
//! The file records which model won, its test R² and every model's score
//! in evaluation order:
//!
//! ```json
//! {
//!   "tool": "student-score",
//!   "generated_at": "2026-10-18T12:00:00+02:00",
//!   "best": "linear_regression",
//!   "r2": 0.88,
//!   "scores": [{ "model": "linear_regression", "r2": 0.88 }, ...]
//! }
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::domain::{ModelKind, ModelScore, TrainingOutcome};
use crate::error::{AppError, ErrorKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFile {
    pub tool: String,
    pub generated_at: DateTime<Local>,
    pub best: ModelKind,
    pub r2: f64,
    pub model_path: PathBuf,
    pub scores: Vec<ModelScore>,
}

impl ReportFile {
    pub fn from_outcome(outcome: &TrainingOutcome, generated_at: DateTime<Local>) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            generated_at,
            best: outcome.best,
            r2: outcome.r2,
            model_path: outcome.model_path.clone(),
            scores: outcome.report.scores.clone(),
        }
    }
}

/// Write the report for `outcome` to `path`, replacing any existing file.
pub fn write_report_json(path: &Path, outcome: &TrainingOutcome) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::wrap(
            ErrorKind::Persistence,
            format!("Failed to create report JSON '{}'", path.display()),
            e,
        )
    })?;

    let report = ReportFile::from_outcome(outcome, Local::now());
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report)
        .map_err(|e| AppError::wrap(ErrorKind::Persistence, "Failed to write report JSON", e))?;
    writer.flush().map_err(|e| {
        AppError::wrap(
            ErrorKind::Persistence,
            format!("Failed to flush report JSON '{}'", path.display()),
            e,
        )
    })?;

    tracing::info!("Wrote model report to {}", path.display());
    Ok(())
}

pub fn read_report_json(path: &Path) -> Result<ReportFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::wrap(
            ErrorKind::Persistence,
            format!("Failed to open report JSON '{}'", path.display()),
            e,
        )
    })?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::wrap(ErrorKind::Persistence, "Invalid report JSON", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelReport;

    #[test]
    fn report_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");

        let mut report = ModelReport::default();
        report.push(ModelKind::LinearRegression, 0.88);
        report.push(ModelKind::KNeighbors, 0.71);
        let outcome = TrainingOutcome {
            best: ModelKind::LinearRegression,
            r2: 0.88,
            report,
            model_path: dir.path().join("model.pkl"),
        };

        write_report_json(&path, &outcome).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"best\": \"linear_regression\""));

        let back = read_report_json(&path).unwrap();
        assert_eq!(back.best, ModelKind::LinearRegression);
        assert_eq!(back.scores, outcome.report.scores);
        assert_eq!(back.tool, "student-score");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn buffered_write_failure_is_reported() {
        // The report fits in the buffer, so the failure only shows at flush.
        let outcome = TrainingOutcome {
            best: ModelKind::KNeighbors,
            r2: 0.7,
            report: ModelReport::default(),
            model_path: PathBuf::from("model.pkl"),
        };
        let err = write_report_json(Path::new("/dev/full"), &outcome).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
    }
}
