//! The offline training workflow, shared by the `ingest` and `train`
//! commands:
//!
//! ingestion -> transformation -> model trainer
//!
//! Each stage is one-shot and fails fast; the commands only add printing.

use std::path::PathBuf;

use crate::domain::{IngestionConfig, TrainConfig, TrainingOutcome};
use crate::error::AppError;
use crate::fit::ModelTrainer;
use crate::io::{DataIngestion, IngestedData, write_report_json};
use crate::transform::DataTransformation;

/// All outputs of a `score train` run.
#[derive(Debug, Clone)]
pub struct TrainRun {
    pub ingest: IngestedData,
    pub preprocessor_path: PathBuf,
    pub outcome: TrainingOutcome,
}

pub fn run_ingestion(config: &IngestionConfig) -> Result<IngestedData, AppError> {
    DataIngestion::new(config.clone()).ingest()
}

/// Run every stage end to end; writes the JSON report when configured.
pub fn run_training(config: &TrainConfig) -> Result<TrainRun, AppError> {
    let ingest = run_ingestion(&config.ingestion)?;

    let transformed = DataTransformation::new(&config.ingestion.artifacts.preprocessor)
        .initiate_data_transformation(&ingest.train_path, &ingest.test_path)?;

    let outcome =
        ModelTrainer::new(config.trainer.clone()).initiate_model_trainer(&transformed.train, &transformed.test)?;

    if let Some(path) = &config.export_report {
        write_report_json(path, &outcome)?;
    }

    Ok(TrainRun {
        ingest,
        preprocessor_path: transformed.preprocessor_path,
        outcome,
    })
}
