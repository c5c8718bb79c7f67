//! Ordinary least squares with an intercept.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::math::{solve_least_squares, with_intercept};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearRegression {
    pub fn fit(x: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        let design = with_intercept(x);
        let target = DVector::from_row_slice(y);

        let beta = solve_least_squares(&design, &target).ok_or_else(|| {
            AppError::new(ErrorKind::Training, "Least squares solve produced no finite solution.")
        })?;

        Ok(Self {
            intercept: beta[0],
            coefficients: beta.iter().skip(1).copied().collect(),
        })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows())
            .map(|r| {
                self.coefficients
                    .iter()
                    .enumerate()
                    .fold(self.intercept, |acc, (c, b)| acc + b * x[(r, c)])
            })
            .collect()
    }
}
