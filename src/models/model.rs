//! A fitted regressor of any supported kind.
//!
//! The trainer only sees [`Regressor`]: `fit` dispatches on [`ModelKind`] with
//! that kind's fixed hyper-parameters, and the result is what gets persisted
//! as the model artifact.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::domain::ModelKind;
use crate::error::{AppError, ErrorKind};
use crate::models::adaboost::{AdaBoostParams, AdaBoostRegressor};
use crate::models::boosting::{BoostedTrees, BoostingParams};
use crate::models::forest::{ForestParams, RandomForestRegressor};
use crate::models::knn::{DEFAULT_NEIGHBORS, KNeighborsRegressor};
use crate::models::linear::LinearRegression;
use crate::models::oblivious::{ObliviousBoosting, ObliviousParams};
use crate::models::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Fitted {
    Linear(LinearRegression),
    Tree(RegressionTree),
    Forest(RandomForestRegressor),
    Gradient(BoostedTrees),
    AdaBoost(AdaBoostRegressor),
    Regularized(BoostedTrees),
    Oblivious(ObliviousBoosting),
    KNeighbors(KNeighborsRegressor),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regressor {
    n_features: usize,
    fitted: Fitted,
}

impl Regressor {
    /// Fit `kind` on `x` (rows = samples) and `y`.
    ///
    /// Fails with a training error on empty input, a row-count mismatch or
    /// non-finite values.
    pub fn fit(kind: ModelKind, x: &DMatrix<f64>, y: &[f64], seed: u64) -> Result<Self, AppError> {
        validate(x, y)?;

        let fitted = match kind {
            ModelKind::LinearRegression => Fitted::Linear(LinearRegression::fit(x, y)?),
            ModelKind::DecisionTree => {
                let mut rng = StdRng::seed_from_u64(seed);
                Fitted::Tree(RegressionTree::fit_all(x, y, &TreeParams::default(), &mut rng))
            }
            ModelKind::RandomForest => {
                Fitted::Forest(RandomForestRegressor::fit(x, y, &ForestParams::default(), seed))
            }
            ModelKind::GradientBoosting => {
                Fitted::Gradient(BoostedTrees::fit(x, y, &BoostingParams::gradient(), seed))
            }
            ModelKind::AdaBoost => Fitted::AdaBoost(AdaBoostRegressor::fit(x, y, &AdaBoostParams::default(), seed)?),
            ModelKind::RegularizedBoosting => {
                Fitted::Regularized(BoostedTrees::fit(x, y, &BoostingParams::regularized(), seed))
            }
            ModelKind::ObliviousBoosting => Fitted::Oblivious(ObliviousBoosting::fit(x, y, &ObliviousParams::default())),
            ModelKind::KNeighbors => Fitted::KNeighbors(KNeighborsRegressor::fit(x, y, DEFAULT_NEIGHBORS)?),
        };

        Ok(Self {
            n_features: x.ncols(),
            fitted,
        })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, AppError> {
        if x.ncols() != self.n_features {
            return Err(AppError::new(
                ErrorKind::Prediction,
                format!("expected {} features, got {}", self.n_features, x.ncols()),
            ));
        }

        Ok(match &self.fitted {
            Fitted::Linear(m) => m.predict(x),
            Fitted::Tree(m) => m.predict(x),
            Fitted::Forest(m) => m.predict(x),
            Fitted::Gradient(m) | Fitted::Regularized(m) => m.predict(x),
            Fitted::AdaBoost(m) => m.predict(x),
            Fitted::Oblivious(m) => m.predict(x),
            Fitted::KNeighbors(m) => m.predict(x),
        })
    }

    pub fn kind(&self) -> ModelKind {
        match self.fitted {
            Fitted::Linear(_) => ModelKind::LinearRegression,
            Fitted::Tree(_) => ModelKind::DecisionTree,
            Fitted::Forest(_) => ModelKind::RandomForest,
            Fitted::Gradient(_) => ModelKind::GradientBoosting,
            Fitted::AdaBoost(_) => ModelKind::AdaBoost,
            Fitted::Regularized(_) => ModelKind::RegularizedBoosting,
            Fitted::Oblivious(_) => ModelKind::ObliviousBoosting,
            Fitted::KNeighbors(_) => ModelKind::KNeighbors,
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

fn validate(x: &DMatrix<f64>, y: &[f64]) -> Result<(), AppError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(AppError::new(ErrorKind::Training, "training matrix is empty"));
    }
    if x.nrows() != y.len() {
        return Err(AppError::new(
            ErrorKind::Training,
            format!("{} feature rows but {} targets", x.nrows(), y.len()),
        ));
    }
    if !x.iter().chain(y).all(|v| v.is_finite()) {
        return Err(AppError::new(ErrorKind::Training, "training data contains non-finite values"));
    }
    Ok(())
}
