//! Shared domain types.
//!
//! This module defines:
//!
//! - the dataset schema (feature/target column names)
//! - artifact locations shared by the offline pipeline and the server
//! - per-stage configuration structs
//! - the fixed list of regressor configurations (`ModelKind`)
//! - the in-memory model report produced during training

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Column holding the regression target.
pub const TARGET_COLUMN: &str = "math score";

/// Numeric feature columns, in preprocessor output order.
pub const NUMERIC_COLUMNS: [&str; 2] = ["writing score", "reading score"];

/// Categorical feature columns, in preprocessor output order.
pub const CATEGORICAL_COLUMNS: [&str; 5] = [
    "gender",
    "race/ethnicity",
    "parental level of education",
    "lunch",
    "test preparation course",
];

/// Column order of a prediction request (and of the web form).
pub const REQUEST_COLUMNS: [&str; 7] = [
    "gender",
    "race/ethnicity",
    "parental level of education",
    "lunch",
    "test preparation course",
    "reading score",
    "writing score",
];

/// Default location of the raw dataset.
pub const DEFAULT_SOURCE_PATH: &str = "notebook/data/stud.csv";

/// Default artifacts directory.
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// Minimum test R² a model must reach to be persisted.
pub const MIN_ACCEPTABLE_R2: f64 = 0.6;

/// Fixed artifact file locations under one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
    pub raw_data: PathBuf,
    pub train_data: PathBuf,
    pub test_data: PathBuf,
    pub model: PathBuf,
    pub preprocessor: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        Self {
            raw_data: dir.join("data.csv"),
            train_data: dir.join("train.csv"),
            test_data: dir.join("test.csv"),
            model: dir.join("model.pkl"),
            preprocessor: dir.join("preprocessor.pkl"),
            dir,
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::new(DEFAULT_ARTIFACTS_DIR)
    }
}

/// Ingestion settings.
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub source_path: PathBuf,
    pub artifacts: ArtifactPaths,
    /// Fraction of rows held out for testing, in `(0, 1)`.
    pub test_size: f64,
    pub seed: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            artifacts: ArtifactPaths::default(),
            test_size: 0.2,
            seed: 42,
        }
    }
}

/// Trainer settings.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub model_path: PathBuf,
    pub min_score: f64,
    /// Seed for every randomized regressor.
    pub seed: u64,
    /// Regressors to evaluate, in tie-break order.
    pub models: Vec<ModelKind>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            model_path: ArtifactPaths::default().model,
            min_score: MIN_ACCEPTABLE_R2,
            seed: 42,
            models: ModelKind::ALL.to_vec(),
        }
    }
}

/// A full offline run's configuration, derived from CLI flags.
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub ingestion: IngestionConfig,
    pub trainer: TrainerConfig,
    pub export_report: Option<PathBuf>,
}

/// The regressor configurations evaluated by the trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LinearRegression,
    DecisionTree,
    RandomForest,
    GradientBoosting,
    AdaBoost,
    RegularizedBoosting,
    ObliviousBoosting,
    KNeighbors,
}

impl ModelKind {
    /// Declaration order; earlier entries win score ties.
    pub const ALL: [ModelKind; 8] = [
        ModelKind::LinearRegression,
        ModelKind::DecisionTree,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
        ModelKind::AdaBoost,
        ModelKind::RegularizedBoosting,
        ModelKind::ObliviousBoosting,
        ModelKind::KNeighbors,
    ];

    /// Human-readable label for terminal output and logs.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::LinearRegression => "Linear Regression",
            ModelKind::DecisionTree => "Decision Tree",
            ModelKind::RandomForest => "Random Forest",
            ModelKind::GradientBoosting => "Gradient Boosting",
            ModelKind::AdaBoost => "AdaBoost Regressor",
            ModelKind::RegularizedBoosting => "Regularized Gradient Boosting",
            ModelKind::ObliviousBoosting => "Oblivious Tree Boosting",
            ModelKind::KNeighbors => "K-Neighbors Regressor",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One evaluated model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub model: ModelKind,
    pub r2: f64,
}

/// Test-set R² per model, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelReport {
    pub scores: Vec<ModelScore>,
}

impl ModelReport {
    pub fn push(&mut self, model: ModelKind, r2: f64) {
        self.scores.push(ModelScore { model, r2 });
    }

    /// Index of the highest score; the first entry wins ties. NaN scores
    /// never win.
    pub fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, score) in self.scores.iter().enumerate() {
            if score.r2.is_nan() {
                continue;
            }
            if best.is_none_or(|b| score.r2 > self.scores[b].r2) {
                best = Some(i);
            }
        }
        best
    }

    pub fn best(&self) -> Option<ModelScore> {
        self.best_index().map(|i| self.scores[i])
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

/// Outcome of a successful training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub best: ModelKind,
    /// Test R² of the persisted model.
    pub r2: f64,
    pub report: ModelReport,
    pub model_path: PathBuf,
}
