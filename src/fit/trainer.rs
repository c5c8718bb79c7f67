//! Model trainer stage: evaluate, apply the score guard, persist the winner.

use nalgebra::DMatrix;

use crate::domain::{TrainerConfig, TrainingOutcome};
use crate::error::{AppError, ErrorKind};
use crate::fit::selection::{evaluate_models, split_features_target};
use crate::io::save_object;

pub struct ModelTrainer {
    config: TrainerConfig,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    /// Train on `train_array`, score on `test_array` (target = last column)
    /// and save the best model.
    ///
    /// Nothing is written when the best test R² is below the configured
    /// minimum; that case is a training error.
    pub fn initiate_model_trainer(
        &self,
        train_array: &DMatrix<f64>,
        test_array: &DMatrix<f64>,
    ) -> Result<TrainingOutcome, AppError> {
        tracing::info!("Split training and test input data");
        let (x_train, y_train) = split_features_target(train_array)?;
        let (x_test, y_test) = split_features_target(test_array)?;

        let eval = evaluate_models(
            &x_train,
            &y_train,
            &x_test,
            &y_test,
            &self.config.models,
            self.config.seed,
        )?;

        let Some((model, r2)) = eval.best else {
            let message = if eval.report.is_empty() {
                "No models were configured"
            } else {
                "No suitable model found: no model produced a finite test r2"
            };
            return Err(AppError::new(ErrorKind::Training, message));
        };
        if !(r2 >= self.config.min_score) {
            return Err(AppError::new(
                ErrorKind::Training,
                format!(
                    "No suitable model found: best was {} with r2 {r2:.4} (minimum {})",
                    model.kind(),
                    self.config.min_score
                ),
            ));
        }
        tracing::info!("Best found model on both training and testing dataset: {}", model.kind());

        save_object(&self.config.model_path, &model)?;

        Ok(TrainingOutcome {
            best: model.kind(),
            r2,
            report: eval.report,
            model_path: self.config.model_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;
    use crate::io::load_object;
    use crate::models::Regressor;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Three uniform features plus a target that is either an exact linear
    /// function of them or independent noise.
    fn array(rows: usize, seed: u64, linear: bool) -> DMatrix<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut m = DMatrix::zeros(rows, 4);
        for r in 0..rows {
            for c in 0..3 {
                m[(r, c)] = rng.gen_range(-1.0..1.0);
            }
            m[(r, 3)] = if linear {
                3.0 * m[(r, 0)] - 2.0 * m[(r, 1)] + 0.5 * m[(r, 2)] + 1.0
            } else {
                rng.gen_range(-1.0..1.0)
            };
        }
        m
    }

    fn config(dir: &std::path::Path) -> TrainerConfig {
        TrainerConfig {
            model_path: dir.join("model.pkl"),
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn linear_data_selects_linear_regression() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = ModelTrainer::new(config(dir.path()));

        let outcome = trainer
            .initiate_model_trainer(&array(120, 1, true), &array(30, 2, true))
            .unwrap();

        assert_eq!(outcome.best, ModelKind::LinearRegression);
        assert!(outcome.r2 >= 0.6);
        assert_eq!(outcome.report.len(), ModelKind::ALL.len());

        let saved: Regressor = load_object(&outcome.model_path).unwrap();
        assert_eq!(saved.kind(), ModelKind::LinearRegression);
    }

    #[test]
    fn noise_fails_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = ModelTrainer::new(config(dir.path()));

        let err = trainer
            .initiate_model_trainer(&array(120, 3, false), &array(30, 4, false))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Training);
        assert!(err.message().contains("No suitable model"));
        assert!(!dir.path().join("model.pkl").exists());
    }

    #[test]
    fn nan_scoring_first_model_does_not_block_a_later_winner() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = ModelTrainer::new(TrainerConfig {
            models: vec![ModelKind::LinearRegression, ModelKind::KNeighbors],
            ..config(dir.path())
        });

        let train = DMatrix::from_fn(60, 2, |r, c| if c == 0 { r as f64 } else { 2.0 * r as f64 });
        let mut test = train.clone();
        test[(59, 0)] = f64::NAN;

        let outcome = trainer.initiate_model_trainer(&train, &test).unwrap();
        assert!(outcome.report.scores[0].r2.is_nan());
        assert_eq!(outcome.best, ModelKind::KNeighbors);
        assert!(outcome.r2 >= 0.6, "{}", outcome.r2);
        assert!(outcome.model_path.exists());
    }
}
