//! Gradient boosting over oblivious (symmetric) trees.
//!
//! An oblivious tree applies the same `(feature, border)` test to every node
//! of a level, so a depth-`d` tree is just `d` tests and `2^d` leaf values;
//! a row's leaf index is the bit vector of its test outcomes.
//!
//! Features are quantized once up front: each feature gets at most
//! `max_borders` candidate borders (midpoints between distinct values,
//! thinned evenly when there are too many) and every row is mapped to a bin.
//! Level search then only needs per-(leaf, bin) histograms.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::math::mean;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObliviousParams {
    pub iterations: usize,
    pub learning_rate: f64,
    pub depth: usize,
    pub l2: f64,
    pub max_borders: usize,
}

impl Default for ObliviousParams {
    fn default() -> Self {
        Self {
            iterations: 500,
            learning_rate: 0.05,
            depth: 6,
            l2: 3.0,
            max_borders: 32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ObliviousTree {
    /// One `(feature, border)` test per level; bit `d` is set when
    /// `x[feature] > border` at level `d`.
    levels: Vec<(usize, f64)>,
    leaves: Vec<f64>,
}

impl ObliviousTree {
    fn leaf_index(&self, x: &DMatrix<f64>, row: usize) -> usize {
        self.levels
            .iter()
            .enumerate()
            .fold(0, |idx, (d, &(f, border))| idx | (usize::from(x[(row, f)] > border) << d))
    }

    fn predict_row(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        self.leaves[self.leaf_index(x, row)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObliviousBoosting {
    base: f64,
    trees: Vec<ObliviousTree>,
}

/// Quantized view of the training matrix.
struct Quantized {
    /// Sorted borders per feature.
    borders: Vec<Vec<f64>>,
    /// `bins[f][r]` = number of borders of feature `f` below `x[r][f]`.
    bins: Vec<Vec<u16>>,
}

impl Quantized {
    fn new(x: &DMatrix<f64>, max_borders: usize) -> Self {
        let mut borders = Vec::with_capacity(x.ncols());
        let mut bins = Vec::with_capacity(x.ncols());

        for f in 0..x.ncols() {
            let column: Vec<f64> = x.column(f).iter().copied().collect();
            let feature_borders = select_borders(&column, max_borders);
            let feature_bins = column
                .iter()
                .map(|v| feature_borders.partition_point(|b| b < v) as u16)
                .collect();
            borders.push(feature_borders);
            bins.push(feature_bins);
        }

        Self { borders, bins }
    }
}

fn select_borders(values: &[f64], max_borders: usize) -> Vec<f64> {
    let mut unique = values.to_vec();
    unique.sort_by(|a, b| a.total_cmp(b));
    unique.dedup();

    let mids: Vec<f64> = unique.windows(2).map(|w| w[0] + (w[1] - w[0]) / 2.0).collect();
    if mids.len() <= max_borders {
        return mids;
    }

    let mut picked: Vec<f64> = (0..max_borders)
        .map(|j| mids[(j * mids.len() + mids.len() / 2) / max_borders])
        .collect();
    picked.dedup();
    picked
}

impl ObliviousBoosting {
    pub fn fit(x: &DMatrix<f64>, y: &[f64], params: &ObliviousParams) -> Self {
        let n = y.len();
        let depth = params.depth.min(12);
        // Leaf bins are stored as u16.
        let max_borders = params.max_borders.clamp(1, u16::MAX as usize - 1);
        let quantized = Quantized::new(x, max_borders);

        let base = mean(y);
        let mut current = vec![base; n];
        let mut residuals = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.iterations);

        for _ in 0..params.iterations {
            for (r, (yi, fi)) in residuals.iter_mut().zip(y.iter().zip(&current)) {
                *r = yi - fi;
            }

            let tree = grow_tree(&quantized, &residuals, depth, params);
            for (row, f) in current.iter_mut().enumerate() {
                *f += tree.predict_row(x, row);
            }
            trees.push(tree);
        }

        Self { base, trees }
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Vec<f64> {
        (0..x.nrows())
            .map(|r| self.trees.iter().fold(self.base, |acc, t| acc + t.predict_row(x, r)))
            .collect()
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

fn grow_tree(q: &Quantized, residuals: &[f64], depth: usize, params: &ObliviousParams) -> ObliviousTree {
    let n = residuals.len();
    let mut leaf_of = vec![0usize; n];
    let mut levels = Vec::with_capacity(depth);

    for d in 0..depth {
        let n_leaves = 1usize << d;
        let mut best: Option<(f64, usize, usize)> = None;

        for (f, borders) in q.borders.iter().enumerate() {
            if borders.is_empty() {
                continue;
            }
            let n_bins = borders.len() + 1;
            let mut sums = vec![0.0; n_leaves * n_bins];
            let mut counts = vec![0.0; n_leaves * n_bins];
            for r in 0..n {
                let cell = leaf_of[r] * n_bins + q.bins[f][r] as usize;
                sums[cell] += residuals[r];
                counts[cell] += 1.0;
            }

            let totals: Vec<(f64, f64)> = (0..n_leaves)
                .map(|leaf| {
                    let cells = leaf * n_bins..(leaf + 1) * n_bins;
                    (sums[cells.clone()].iter().sum(), counts[cells].iter().sum())
                })
                .collect();

            // Border k sends bins 0..=k left.
            let mut left: Vec<(f64, f64)> = vec![(0.0, 0.0); n_leaves];
            for k in 0..borders.len() {
                let mut score = 0.0;
                for leaf in 0..n_leaves {
                    let cell = leaf * n_bins + k;
                    left[leaf].0 += sums[cell];
                    left[leaf].1 += counts[cell];
                    let (ls, lc) = left[leaf];
                    let (ts, tc) = totals[leaf];
                    score += gain_term(ls, lc, params.l2) + gain_term(ts - ls, tc - lc, params.l2);
                }
                if best.is_none_or(|(s, _, _)| score > s) {
                    best = Some((score, f, k));
                }
            }
        }

        let Some((_, f, k)) = best else {
            break;
        };
        for r in 0..n {
            if q.bins[f][r] as usize > k {
                leaf_of[r] |= 1 << d;
            }
        }
        levels.push((f, q.borders[f][k]));
    }

    let n_leaves = 1usize << levels.len();
    let mut sums = vec![0.0; n_leaves];
    let mut counts = vec![0.0; n_leaves];
    for r in 0..n {
        sums[leaf_of[r]] += residuals[r];
        counts[leaf_of[r]] += 1.0;
    }
    let leaves = sums
        .iter()
        .zip(&counts)
        .map(|(s, c)| params.learning_rate * s / (c + params.l2))
        .collect();

    ObliviousTree { levels, leaves }
}

fn gain_term(sum: f64, count: f64, l2: f64) -> f64 {
    if count > 0.0 { sum * sum / (count + l2) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borders_are_midpoints_and_thinned() {
        assert_eq!(select_borders(&[3.0, 1.0, 2.0, 2.0], 10), vec![1.5, 2.5]);
        assert!(select_borders(&[7.0, 7.0], 10).is_empty());

        let many: Vec<f64> = (0..1000).map(f64::from).collect();
        let borders = select_borders(&many, 32);
        assert_eq!(borders.len(), 32);
        assert!(borders.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn bins_agree_with_border_tests() {
        let x = DMatrix::from_column_slice(5, 1, &[0.0, 1.0, 2.0, 3.0, 4.0]);
        let q = Quantized::new(&x, 2);
        for r in 0..5 {
            for (k, border) in q.borders[0].iter().enumerate() {
                assert_eq!(q.bins[0][r] as usize > k, x[(r, 0)] > *border);
            }
        }
    }

    #[test]
    fn learns_an_interaction() {
        // y depends on the XOR of two binary features.
        let x = DMatrix::from_fn(64, 2, |r, c| ((r >> c) & 1) as f64);
        let y: Vec<f64> = (0..64)
            .map(|r| if (r & 1) ^ ((r >> 1) & 1) == 1 { 10.0 } else { -10.0 })
            .collect();

        let params = ObliviousParams { iterations: 200, learning_rate: 0.1, ..ObliviousParams::default() };
        let model = ObliviousBoosting::fit(&x, &y, &params);
        let r2 = crate::math::r2_score(&y, &model.predict(&x));
        assert!(r2 > 0.99, "r2={r2}");
        assert_eq!(model.n_trees(), 200);
    }
}
