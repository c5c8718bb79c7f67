//! Model training orchestration.
//!
//! Responsibilities:
//!
//! - fit every configured regressor and score it on the test split
//! - select the best model (first strict maximum)
//! - refuse to persist a model below the minimum score

pub mod selection;
pub mod trainer;

pub use selection::*;
pub use trainer::*;
