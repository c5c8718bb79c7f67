//! Seeded train/test split.
//!
//! The row indices are shuffled once with a seeded `StdRng`; the first
//! `ceil(test_size * n)` shuffled indices form the test set and the rest the
//! training set. Both keep the shuffled order.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{AppError, ErrorKind};

/// Row indices of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Partition `0..n` into disjoint train/test index sets.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<SplitIndices, AppError> {
    if !(test_size.is_finite() && test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::new(
            ErrorKind::Config,
            format!("Test size must be in (0, 1), got {test_size}."),
        ));
    }

    let n_test = (test_size * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(AppError::new(
            ErrorKind::Ingestion,
            format!("Cannot split {n} rows with test size {test_size}: one side would be empty."),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let train = order.split_off(n_test);
    tracing::debug!("Split {n} rows into {} train / {} test", train.len(), order.len());

    Ok(SplitIndices { train, test: order })
}
