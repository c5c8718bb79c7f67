//! Regression models evaluated by the trainer.
//!
//! Every model is fitted on a dense `DMatrix<f64>` (rows = samples) and a
//! target slice; [`Regressor`] is the single persisted entry point.

pub mod adaboost;
pub mod boosting;
pub mod forest;
pub mod knn;
pub mod linear;
pub mod model;
pub mod oblivious;
pub mod tree;

pub use model::Regressor;
