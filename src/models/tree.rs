//! Binary regression trees (CART, squared error).
//!
//! One builder serves every tree-based regressor:
//!
//! - plain decision trees and random-forest members (`l2 = 0`, leaves are
//!   weighted means)
//! - gradient-boosting stages fitted on residuals
//! - AdaBoost members fitted on weighted bootstrap samples
//! - second-order boosting stages (`l2 > 0`, leaves are `Σr / (n + λ)`
//!   and split gain uses the same regularized form)
//!
//! A split candidate on feature `f` at threshold `t` is scored by
//!
//! ```text
//! S_L² / (W_L + λ) + S_R² / (W_R + λ) - S² / (W + λ)
//! ```
//!
//! where `S` is the weighted target sum and `W` the weight sum of a node.
//! With `λ = 0` this is exactly the reduction in weighted squared error.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// Growth limits and regularization for one tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn per split; `None` considers all of them.
    pub max_features: Option<usize>,
    /// L2 penalty on leaf values.
    pub l2: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            l2: 0.0,
        }
    }
}

impl TreeParams {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted regression tree stored as a flat node arena (root at 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

impl RegressionTree {
    /// Fit on the given row multiset of `x`/`y`.
    ///
    /// `rows` may contain duplicates (bootstrap samples). `weights`, if
    /// given, is indexed by row like `y`.
    ///
    /// # Panics
    /// Panics if `rows` is empty or indexes out of bounds.
    pub fn fit(
        x: &DMatrix<f64>,
        y: &[f64],
        weights: Option<&[f64]>,
        rows: &[usize],
        params: &TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        assert!(!rows.is_empty(), "cannot fit a tree on zero rows");
        let mut builder = Builder {
            x,
            y,
            weights,
            params,
            rng,
            nodes: Vec::new(),
        };
        builder.grow(rows.to_vec());
        Self {
            nodes: builder.nodes,
        }
    }

    /// Fit on every row with unit weights.
    pub fn fit_all(x: &DMatrix<f64>, y: &[f64], params: &TreeParams, rng: &mut StdRng) -> Self {
        let rows: Vec<usize> = (0..x.nrows()).collect();
        Self::fit(x, y, None, &rows, params, rng)
    }

    /// Predict one row of `x`.
    pub fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[(row, feature)] <= threshold { left } else { right };
                }
            }
        }
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows()).map(|r| self.predict_row(x, r)).collect()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| matches!(n, Node::Leaf(_))).count()
    }

    /// Length of the longest root-to-leaf path (a single leaf has depth 0).
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            match self.nodes[idx] {
                Node::Leaf(_) => deepest = deepest.max(depth),
                Node::Split { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        deepest
    }
}

#[derive(Debug, Clone, Copy)]
struct SplitChoice {
    feature: usize,
    threshold: f64,
    gain: f64,
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
}

struct Pending {
    rows: Vec<usize>,
    depth: usize,
    parent: Option<(usize, Side)>,
}

struct Builder<'a> {
    x: &'a DMatrix<f64>,
    y: &'a [f64],
    weights: Option<&'a [f64]>,
    params: &'a TreeParams,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

impl Builder<'_> {
    fn weight(&self, row: usize) -> f64 {
        self.weights.map_or(1.0, |w| w[row])
    }

    /// Grow the tree depth-first with an explicit work stack, so unlimited
    /// depth never deepens the call stack. Nodes land in pre-order.
    fn grow(&mut self, rows: Vec<usize>) {
        let mut stack = vec![Pending {
            rows,
            depth: 0,
            parent: None,
        }];

        while let Some(Pending { rows, depth, parent }) = stack.pop() {
            let idx = self.nodes.len();
            if let Some((p, side)) = parent {
                if let Node::Split { left, right, .. } = &mut self.nodes[p] {
                    match side {
                        Side::Left => *left = idx,
                        Side::Right => *right = idx,
                    }
                }
            }

            let (sum, weight) = rows.iter().fold((0.0, 0.0), |(s, w), &r| {
                let wr = self.weight(r);
                (s + wr * self.y[r], w + wr)
            });
            let denom = weight + self.params.l2;
            let value = if denom > 0.0 { sum / denom } else { 0.0 };
            self.nodes.push(Node::Leaf(value));

            let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
            if depth_reached || rows.len() < self.params.min_samples_split.max(2) {
                continue;
            }

            let Some(split) = self.best_split(&rows, sum, weight) else {
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                .into_iter()
                .partition(|&r| self.x[(r, split.feature)] <= split.threshold);

            // Children are linked when they are popped.
            self.nodes[idx] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left: idx,
                right: idx,
            };
            // Right first so the left subtree is built first.
            stack.push(Pending {
                rows: right_rows,
                depth: depth + 1,
                parent: Some((idx, Side::Right)),
            });
            stack.push(Pending {
                rows: left_rows,
                depth: depth + 1,
                parent: Some((idx, Side::Left)),
            });
        }
    }

    fn candidate_features(&mut self) -> Vec<usize> {
        let n_features = self.x.ncols();
        match self.params.max_features {
            Some(k) if k < n_features => {
                let mut picked = rand::seq::index::sample(&mut *self.rng, n_features, k.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..n_features).collect(),
        }
    }

    fn best_split(&mut self, rows: &[usize], sum: f64, weight: f64) -> Option<SplitChoice> {
        let l2 = self.params.l2;
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_score = score(sum, weight, l2);
        // Gains below this are rounding noise (e.g. splitting a pure node).
        let min_gain = 1e-12 * parent_score.abs().max(1.0);
        let n = rows.len();

        let mut best: Option<SplitChoice> = None;
        let mut sorted: Vec<(f64, f64, f64)> = Vec::with_capacity(n);

        for feature in self.candidate_features() {
            sorted.clear();
            sorted.extend(rows.iter().map(|&r| {
                let w = self.weight(r);
                (self.x[(r, feature)], w * self.y[r], w)
            }));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            let mut left_weight = 0.0;
            for i in 0..n - 1 {
                left_sum += sorted[i].1;
                left_weight += sorted[i].2;

                let left_count = i + 1;
                if left_count < min_leaf || n - left_count < min_leaf {
                    continue;
                }
                let (lo, hi) = (sorted[i].0, sorted[i + 1].0);
                if lo >= hi {
                    continue;
                }

                let gain = score(left_sum, left_weight, l2)
                    + score(sum - left_sum, weight - left_weight, l2)
                    - parent_score;
                if gain > min_gain && best.is_none_or(|b| gain > b.gain) {
                    let mid = lo + (hi - lo) / 2.0;
                    let threshold = if mid < hi { mid } else { lo };
                    best = Some(SplitChoice {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

fn score(sum: f64, weight: f64, l2: f64) -> f64 {
    let denom = weight + l2;
    if denom > 0.0 { sum * sum / denom } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;

    fn step_data() -> (DMatrix<f64>, Vec<f64>) {
        // y = 10 for x0 < 5, 20 otherwise; x1 is noise-free but irrelevant.
        let n = 20;
        let x = DMatrix::from_fn(n, 2, |r, c| if c == 0 { r as f64 * 0.5 } else { (r % 3) as f64 });
        let y = (0..n).map(|r| if (r as f64) * 0.5 < 5.0 { 10.0 } else { 20.0 }).collect();
        (x, y)
    }

    #[test]
    fn finds_the_step() {
        let (x, y) = step_data();
        let mut rng = StdRng::seed_from_u64(0);
        let tree = RegressionTree::fit_all(&x, &y, &TreeParams::default(), &mut rng);

        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict(&x), y);
    }

    #[test]
    fn depth_limit_is_respected() {
        let x = DMatrix::from_fn(64, 1, |r, _| r as f64);
        let y: Vec<f64> = (0..64).map(|r| (r * r) as f64).collect();
        let mut rng = StdRng::seed_from_u64(0);

        let tree = RegressionTree::fit_all(&x, &y, &TreeParams::default().with_max_depth(3), &mut rng);
        assert!(tree.depth() <= 3);
        assert!(tree.leaf_count() <= 8);

        let full = RegressionTree::fit_all(&x, &y, &TreeParams::default(), &mut rng);
        assert_eq!(full.predict(&x), y, "unlimited depth memorises distinct rows");
    }

    #[test]
    fn constant_target_is_a_single_leaf() {
        let x = DMatrix::from_fn(10, 3, |r, c| (r + c) as f64);
        let y = vec![4.0; 10];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = RegressionTree::fit_all(&x, &y, &TreeParams::default(), &mut rng);
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.predict_row(&x, 3), 4.0);
    }

    #[test]
    fn l2_shrinks_leaf_values() {
        let x = DMatrix::from_fn(4, 1, |_, _| 1.0);
        let y = vec![2.0; 4];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = RegressionTree::fit_all(&x, &y, &TreeParams::default().with_l2(4.0), &mut rng);
        // Σr / (n + λ) = 8 / 8
        assert!((tree.predict_row(&x, 0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weights_pull_leaf_values() {
        let x = DMatrix::from_fn(2, 1, |_, _| 0.0);
        let y = vec![0.0, 10.0];
        let w = vec![1.0, 3.0];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = RegressionTree::fit(&x, &y, Some(&w), &[0, 1], &TreeParams::default(), &mut rng);
        assert!((tree.predict_row(&x, 0) - 7.5).abs() < 1e-12);
    }

    #[test]
    fn unlimited_depth_links_every_child() {
        let n = 2_000;
        let x = DMatrix::from_fn(n, 1, |r, _| r as f64);
        let y: Vec<f64> = (0..n).map(|r| ((r * 7919) % n) as f64).collect();
        let mut rng = StdRng::seed_from_u64(0);

        let tree = RegressionTree::fit_all(&x, &y, &TreeParams::default(), &mut rng);
        assert_eq!(tree.leaf_count(), n);
        assert!(tree.depth() >= 11);
        assert_eq!(tree.predict(&x), y);
    }
}
