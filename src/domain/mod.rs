//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the dataset schema and artifact locations (`ArtifactPaths`)
//! - stage configuration (`IngestionConfig`, `TrainerConfig`, `TrainConfig`)
//! - the regressor list (`ModelKind`) and training results (`ModelReport`,
//!   `TrainingOutcome`)

pub mod types;

pub use types::*;
