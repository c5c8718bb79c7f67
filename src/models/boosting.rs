//! Additive tree ensembles for squared loss.
//!
//! Both boosted regressors start from the target mean and add one shrunken
//! tree per stage, each fitted to the current residuals `y - F(x)`:
//!
//! - classic gradient boosting: shallow CART trees, leaves are residual means
//! - regularized (second-order) boosting: deeper trees whose leaf values and
//!   split gains carry an L2 penalty. For squared loss the hessian is 1 per
//!   row, so the optimal leaf `-G / (H + λ)` is `Σr / (n + λ)`.

use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::math::mean;
use crate::models::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_stages: usize,
    pub learning_rate: f64,
    pub tree: TreeParams,
}

impl BoostingParams {
    /// 100 stages, rate 0.1, depth-3 trees.
    pub fn gradient() -> Self {
        Self {
            n_stages: 100,
            learning_rate: 0.1,
            tree: TreeParams::default().with_max_depth(3),
        }
    }

    /// 100 stages, rate 0.3, depth-6 trees, λ = 1.
    pub fn regularized() -> Self {
        Self {
            n_stages: 100,
            learning_rate: 0.3,
            tree: TreeParams::default().with_max_depth(6).with_l2(1.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTrees {
    base: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
}

impl BoostedTrees {
    pub fn fit(x: &DMatrix<f64>, y: &[f64], params: &BoostingParams, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let base = mean(y);
        let mut current = vec![base; y.len()];
        let mut residuals = vec![0.0; y.len()];
        let mut trees = Vec::with_capacity(params.n_stages);

        for stage in 0..params.n_stages {
            for (r, (yi, fi)) in residuals.iter_mut().zip(y.iter().zip(&current)) {
                *r = yi - fi;
            }

            let tree = RegressionTree::fit_all(x, &residuals, &params.tree, &mut rng);
            for (row, f) in current.iter_mut().enumerate() {
                *f += params.learning_rate * tree.predict_row(x, row);
            }
            trees.push(tree);

            if stage % 25 == 0 {
                tracing::trace!("boosting stage {stage}: mse={:.6}", mse(y, &current));
            }
        }

        Self {
            base,
            learning_rate: params.learning_rate,
            trees,
        }
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows())
            .map(|r| {
                self.trees
                    .iter()
                    .fold(self.base, |acc, t| acc + self.learning_rate * t.predict_row(x, r))
            })
            .collect()
    }

    pub fn n_stages(&self) -> usize {
        self.trees.len()
    }
}

fn mse(y: &[f64], pred: &[f64]) -> f64 {
    y.iter().zip(pred).map(|(a, b)| (a - b).powi(2)).sum::<f64>() / y.len().max(1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> (DMatrix<f64>, Vec<f64>) {
        let x = DMatrix::from_fn(80, 2, |r, c| if c == 0 { r as f64 / 8.0 } else { (r % 5) as f64 });
        let y = (0..80).map(|r| (x[(r, 0)]).sin() * 10.0 + x[(r, 1)]).collect();
        (x, y)
    }

    #[test]
    fn more_stages_fit_training_data_better() {
        let (x, y) = data();
        let mut params = BoostingParams::gradient();

        params.n_stages = 5;
        let short = BoostedTrees::fit(&x, &y, &params, 0);
        params.n_stages = 100;
        let long = BoostedTrees::fit(&x, &y, &params, 0);

        assert!(mse(&y, &long.predict(&x)) < mse(&y, &short.predict(&x)));
        assert_eq!(long.n_stages(), 100);
    }

    #[test]
    fn zero_stages_predicts_the_mean() {
        let (x, y) = data();
        let params = BoostingParams { n_stages: 0, ..BoostingParams::regularized() };
        let model = BoostedTrees::fit(&x, &y, &params, 0);
        let m = mean(&y);
        assert!(model.predict(&x).iter().all(|p| (p - m).abs() < 1e-12));
    }

    #[test]
    fn regularized_boosting_fits_well() {
        let (x, y) = data();
        let model = BoostedTrees::fit(&x, &y, &BoostingParams::regularized(), 0);
        let r2 = crate::math::r2_score(&y, &model.predict(&x));
        assert!(r2 > 0.95, "r2={r2}");
    }
}
