//! Random forest: bootstrap-aggregated regression trees.
//!
//! Each tree gets its own `StdRng` seeded from `(seed, tree index)`, so trees
//! can be built in parallel with `rayon` and the forest is identical for a
//! given seed regardless of thread scheduling.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::tree::{RegressionTree, TreeParams};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub bootstrap: bool,
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            bootstrap: true,
            tree: TreeParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<RegressionTree>,
}

impl RandomForestRegressor {
    pub fn fit(x: &DMatrix<f64>, y: &[f64], params: &ForestParams, seed: u64) -> Self {
        let n = x.nrows();
        let trees = (0..params.n_trees.max(1))
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(tree_seed(seed, i));
                let rows: Vec<usize> = if params.bootstrap {
                    (0..n).map(|_| rng.gen_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                RegressionTree::fit(x, y, None, &rows, &params.tree, &mut rng)
            })
            .collect();

        Self { trees }
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        let scale = 1.0 / self.trees.len() as f64;
        (0..x.nrows())
            .into_par_iter()
            .map(|r| self.trees.iter().map(|t| t.predict_row(x, r)).sum::<f64>() * scale)
            .collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

fn tree_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(index as u64)
}
