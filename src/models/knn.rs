//! k-nearest-neighbours regression (uniform weights, Euclidean distance).

use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};

pub const DEFAULT_NEIGHBORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KNeighborsRegressor {
    k: usize,
    x: DMatrix<f64>,
    y: Vec<f64>,
}

impl KNeighborsRegressor {
    pub fn fit(x: &DMatrix<f64>, y: &[f64], k: usize) -> Result<Self, AppError> {
        if k == 0 || x.nrows() < k {
            return Err(AppError::new(
                ErrorKind::Training,
                format!("K-Neighbors needs at least {k} training rows, got {}", x.nrows()),
            ));
        }
        Ok(Self {
            k,
            x: x.clone(),
            y: y.to_vec(),
        })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows())
            .into_par_iter()
            .map(|r| {
                let mut dist: Vec<(f64, usize)> = (0..self.x.nrows())
                    .map(|t| {
                        let d: f64 = (0..self.x.ncols()).map(|c| (x[(r, c)] - self.x[(t, c)]).powi(2)).sum();
                        (d, t)
                    })
                    .collect();
                // Ties resolve towards the earlier training row.
                dist.select_nth_unstable_by(self.k - 1, |a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
                dist[..self.k].iter().map(|&(_, t)| self.y[t]).sum::<f64>() / self.k as f64
            })
            .collect()
    }
}
