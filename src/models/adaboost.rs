//! AdaBoost.R2 with linear loss.
//!
//! Each round draws a weighted bootstrap sample, fits a shallow tree on it,
//! and scores the tree on the full training set with normalized absolute
//! error `e_i = |ŷ_i - y_i| / max_j |ŷ_j - y_j|`. The round's error is
//! `ε = Σ w_i e_i`; with `β = ε / (1 - ε)` the tree gets weight
//! `lr * ln(1/β)` and row weights are multiplied by `β^((1 - e_i) * lr)`.
//!
//! Boosting stops early on a perfect round (`ε = 0`) or when a round is no
//! better than chance (`ε >= 0.5`; that round is discarded unless it is the
//! only one). Prediction is the weighted median of the trees' outputs.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};
use crate::models::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaBoostParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub tree: TreeParams,
}

impl Default for AdaBoostParams {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
            tree: TreeParams::default().with_max_depth(3),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaBoostRegressor {
    trees: Vec<RegressionTree>,
    weights: Vec<f64>,
}

impl AdaBoostRegressor {
    pub fn fit(x: &DMatrix<f64>, y: &[f64], params: &AdaBoostParams, seed: u64) -> Result<Self, AppError> {
        let n = y.len();
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sample_weight = vec![1.0 / n as f64; n];
        let mut trees = Vec::new();
        let mut weights = Vec::new();

        for round in 0..params.n_estimators.max(1) {
            let sampler = WeightedIndex::new(&sample_weight).map_err(|e| {
                AppError::wrap(ErrorKind::Training, "AdaBoost sample weights degenerated", e)
            })?;
            let rows: Vec<usize> = (0..n).map(|_| sampler.sample(&mut rng)).collect();
            let tree = RegressionTree::fit(x, y, None, &rows, &params.tree, &mut rng);

            let mut errors: Vec<f64> = (0..n).map(|r| (tree.predict_row(x, r) - y[r]).abs()).collect();
            let max_error = errors.iter().copied().fold(0.0, f64::max);
            if max_error > 0.0 {
                errors.iter_mut().for_each(|e| *e /= max_error);
            }
            let round_error: f64 = sample_weight.iter().zip(&errors).map(|(w, e)| w * e).sum();

            if round_error <= 0.0 {
                trees.push(tree);
                weights.push(1.0);
                break;
            }
            if round_error >= 0.5 {
                if trees.is_empty() {
                    trees.push(tree);
                    weights.push(1.0);
                }
                tracing::debug!("AdaBoost stopped at round {round}: error {round_error:.4} >= 0.5");
                break;
            }

            let beta = round_error / (1.0 - round_error);
            trees.push(tree);
            weights.push(params.learning_rate * (1.0 / beta).ln());

            for (w, e) in sample_weight.iter_mut().zip(&errors) {
                *w *= beta.powf((1.0 - e) * params.learning_rate);
            }
            let total: f64 = sample_weight.iter().sum();
            if !(total.is_finite() && total > 0.0) {
                break;
            }
            sample_weight.iter_mut().for_each(|w| *w /= total);
        }

        Ok(Self { trees, weights })
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows())
            .map(|r| {
                let preds: Vec<f64> = self.trees.iter().map(|t| t.predict_row(x, r)).collect();
                weighted_median(&preds, &self.weights)
            })
            .collect()
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

/// Smallest value whose cumulative weight reaches half the total.
fn weighted_median(values: &[f64], weights: &[f64]) -> f64 {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let total: f64 = weights.iter().sum();
    let mut acc = 0.0;
    for &i in &order {
        acc += weights[i];
        if acc >= 0.5 * total {
            return values[i];
        }
    }
    order.last().map_or(f64::NAN, |&i| values[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_median_respects_weights() {
        assert_eq!(weighted_median(&[1.0, 2.0, 3.0], &[1.0, 1.0, 1.0]), 2.0);
        assert_eq!(weighted_median(&[1.0, 2.0, 3.0], &[0.1, 0.1, 5.0]), 3.0);
        assert_eq!(weighted_median(&[3.0, 1.0], &[1.0, 4.0]), 1.0);
    }

    #[test]
    fn fits_a_monotone_signal() {
        let x = DMatrix::from_fn(100, 1, |r, _| r as f64);
        let y: Vec<f64> = (0..100).map(|r| (r as f64).sqrt()).collect();
        let model = AdaBoostRegressor::fit(&x, &y, &AdaBoostParams::default(), 3).unwrap();

        assert!(model.n_estimators() >= 1);
        let r2 = crate::math::r2_score(&y, &model.predict(&x));
        assert!(r2 > 0.9, "r2={r2}");
    }

    #[test]
    fn perfect_first_round_stops_early() {
        let x = DMatrix::from_fn(10, 1, |r, _| r as f64);
        let y = vec![2.0; 10];
        let model = AdaBoostRegressor::fit(&x, &y, &AdaBoostParams::default(), 0).unwrap();
        assert_eq!(model.n_estimators(), 1);
        assert_eq!(model.predict(&x), y);
    }
}
