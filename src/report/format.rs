//! Formatted terminal output for the offline commands.
//!
//! Formatting lives here so the pipeline stages only return data.

use std::path::Path;

use crate::domain::{ModelReport, TrainingOutcome};
use crate::io::IngestedData;

/// Paths and row counts of an ingestion run.
pub fn format_ingestion_summary(ingest: &IngestedData) -> String {
    let mut out = String::new();

    out.push_str("=== student-score - data ingestion ===\n");
    out.push_str(&format!(
        "Rows: {} | train={} | test={}\n",
        ingest.stats.rows_read, ingest.stats.train_rows, ingest.stats.test_rows
    ));
    out.push_str(&format!("Train: {}\n", ingest.train_path.display()));
    out.push_str(&format!("Test : {}\n", ingest.test_path.display()));

    out
}

/// One line per evaluated model, in evaluation order. The winner is starred.
pub fn format_model_report(report: &ModelReport) -> String {
    let best = report.best().map(|s| s.model);
    let mut out = String::new();

    out.push_str(format!("  {:<30} {:>10}", "model", "test r2").trim_end());
    out.push('\n');
    out.push_str(format!("  {:-<30} {:-<10}", "", "").trim_end());
    out.push('\n');

    for score in &report.scores {
        let chosen = if Some(score.model) == best { "*" } else { " " };
        out.push_str(&format!("{chosen} {:<30} {:>10.4}\n", score.model.display_name(), score.r2));
    }

    out
}

/// Full summary of a successful training run.
pub fn format_training_summary(outcome: &TrainingOutcome, preprocessor_path: &Path) -> String {
    let mut out = String::new();

    out.push_str("=== student-score - model training ===\n");
    out.push_str("\nModel report:\n");
    out.push_str(&format_model_report(&outcome.report));

    out.push_str("\nChosen model:\n");
    out.push_str(&format!("- {} (r2={:.4})\n", outcome.best, outcome.r2));
    out.push_str(&format!("- model       : {}\n", outcome.model_path.display()));
    out.push_str(&format!("- preprocessor: {}\n", preprocessor_path.display()));

    out
}
