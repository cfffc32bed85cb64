//! Random forest of CART trees for the binary duplicate label.
//!
//! Trees are grown on bootstrap samples with a random subset of candidate
//! features per node, split on Gini impurity, and vote by averaging the
//! duplicate probability stored in their leaves. Nodes live in a flat array
//! so neither growing nor walking a tree recurses.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// Anything that can turn a feature vector into a duplicate label.
pub trait Classifier {
    /// Probability in [0, 1] that the pair is a duplicate.
    fn predict_proba(&self, features: &[f64]) -> Result<f64>;

    /// 1 for duplicate, 0 otherwise.
    fn predict(&self, features: &[f64]) -> Result<u8> {
        Ok(u8::from(self.predict_proba(features)? > 0.5))
    }
}

/// Row-major training matrix stored as `f32`, the precision tree thresholds use.
#[derive(Debug, Clone)]
pub struct Matrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(AppError::DimensionMismatch {
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            data.extend(row.iter().map(|&v| v as f32));
        }
        Ok(Self {
            n_rows: rows.len(),
            n_cols,
            data,
        })
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows, self.n_cols)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.n_cols + col]
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.n_cols..(row + 1) * self.n_cols]
    }
}

/// How many candidate features each node draws.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    Sqrt,
    All,
    Count(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(n) => n.min(n_features),
        };
        n.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub random_state: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 60,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            random_state: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f32,
        left: usize,
        right: usize,
    },
    Leaf {
        p_duplicate: f64,
    },
}

const PENDING: TreeNode = TreeNode::Leaf { p_duplicate: 0.0 };

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f32,
    impurity: f64,
}

/// Gini impurity of a binary node with `positives` duplicates out of `n`.
fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

fn midpoint(lo: f32, hi: f32) -> f32 {
    let mid = lo / 2.0 + hi / 2.0;
    if mid >= hi || mid.is_nan() {
        lo
    } else {
        mid
    }
}

fn best_split(
    x: &Matrix,
    y: &[u8],
    samples: &[usize],
    max_features: usize,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let n = samples.len();
    let total_pos = samples.iter().filter(|&&i| y[i] == 1).count();

    let mut features: Vec<usize> = (0..x.n_cols).collect();
    features.shuffle(rng);

    let mut best: Option<SplitCandidate> = None;
    let mut visited = 0;
    let mut column: Vec<(f32, u8)> = Vec::with_capacity(n);

    for feature in features {
        if visited >= max_features {
            break;
        }

        column.clear();
        let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
        for &i in samples {
            let v = x.get(i, feature);
            lo = lo.min(v);
            hi = hi.max(v);
            column.push((v, y[i]));
        }
        if lo >= hi {
            continue;
        }
        visited += 1;

        column.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
        let (mut left_n, mut left_pos) = (0usize, 0usize);
        for k in 0..n - 1 {
            left_n += 1;
            left_pos += usize::from(column[k].1);
            if column[k].0 == column[k + 1].0 {
                continue;
            }
            let right_n = n - left_n;
            let impurity = (left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(total_pos - left_pos, right_n))
                / n as f64;
            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: midpoint(column[k].0, column[k + 1].0),
                    impurity,
                });
            }
        }
    }
    best
}

/// Moves samples satisfying `goes_left` to the front; returns how many did.
fn partition_in_place(samples: &mut [usize], goes_left: impl Fn(usize) -> bool) -> usize {
    let mut mid = 0;
    for k in 0..samples.len() {
        if goes_left(samples[k]) {
            samples.swap(mid, k);
            mid += 1;
        }
    }
    mid
}

impl DecisionTree {
    fn fit(
        x: &Matrix,
        y: &[u8],
        mut samples: Vec<usize>,
        params: &ForestParams,
        max_features: usize,
        rng: &mut StdRng,
    ) -> Self {
        struct Pending {
            node: usize,
            start: usize,
            end: usize,
            depth: usize,
        }

        let mut nodes = vec![PENDING];
        let mut stack = vec![Pending {
            node: 0,
            start: 0,
            end: samples.len(),
            depth: 0,
        }];

        while let Some(task) = stack.pop() {
            let slice = &mut samples[task.start..task.end];
            let n = slice.len();
            let positives = slice.iter().filter(|&&i| y[i] == 1).count();
            let leaf = TreeNode::Leaf {
                p_duplicate: if n > 0 { positives as f64 / n as f64 } else { 0.0 },
            };

            let pure = positives == 0 || positives == n;
            let too_deep = params.max_depth.is_some_and(|d| task.depth >= d);
            if pure || too_deep || n < params.min_samples_split.max(2) {
                nodes[task.node] = leaf;
                continue;
            }

            let Some(split) = best_split(x, y, slice, max_features, rng) else {
                nodes[task.node] = leaf;
                continue;
            };

            let mid = partition_in_place(slice, |i| x.get(i, split.feature) <= split.threshold);
            let left = nodes.len();
            let right = left + 1;
            nodes.push(PENDING);
            nodes.push(PENDING);
            nodes[task.node] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push(Pending {
                node: right,
                start: task.start + mid,
                end: task.end,
                depth: task.depth + 1,
            });
            stack.push(Pending {
                node: left,
                start: task.start,
                end: task.start + mid,
                depth: task.depth + 1,
            });
        }

        Self { nodes }
    }

    fn predict_proba(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if (features[*feature] as f32) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { p_duplicate } => return *p_duplicate,
            }
        }
    }

    fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let TreeNode::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        deepest
    }
}

fn bootstrap_sample(n_samples: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fits `params.n_estimators` trees in parallel.
    ///
    /// Tree `i` draws from `StdRng::seed_from_u64(random_state + i)`, so the
    /// result does not depend on thread scheduling.
    pub fn fit(x: &Matrix, y: &[u8], params: ForestParams) -> Result<Self> {
        let (n_rows, n_cols) = x.shape();
        if n_rows == 0 {
            return Err(AppError::EmptyDataset("no training rows".into()));
        }
        if y.len() != n_rows {
            return Err(AppError::DimensionMismatch {
                expected: n_rows,
                actual: y.len(),
            });
        }
        if let Some(bad) = y.iter().find(|&&label| label > 1) {
            return Err(AppError::InvalidInput(format!("label {bad} is not 0 or 1")));
        }
        if params.n_estimators == 0 {
            return Err(AppError::InvalidInput("n_estimators must be positive".into()));
        }

        let max_features = params.max_features.resolve(n_cols);
        info!(
            n_rows,
            n_cols,
            n_estimators = params.n_estimators,
            max_features,
            "fitting random forest"
        );

        let trees: Vec<DecisionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(params.random_state.wrapping_add(i as u64));
                let samples = bootstrap_sample(n_rows, &mut rng);
                let tree = DecisionTree::fit(x, y, samples, &params, max_features, &mut rng);
                debug!(tree = i, nodes = tree.nodes.len(), depth = tree.depth(), "tree grown");
                tree
            })
            .collect();

        Ok(Self {
            n_features: n_cols,
            params,
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Labels for every row of `x`.
    pub fn predict_matrix(&self, x: &Matrix) -> Result<Vec<u8>> {
        let (n_rows, n_cols) = x.shape();
        if n_cols != self.n_features {
            return Err(AppError::DimensionMismatch {
                expected: self.n_features,
                actual: n_cols,
            });
        }
        (0..n_rows)
            .into_par_iter()
            .map(|r| {
                let row: Vec<f64> = x.row(r).iter().map(|&v| f64::from(v)).collect();
                self.predict(&row)
            })
            .collect()
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(AppError::DimensionMismatch {
                expected: self.n_features,
                actual: features.len(),
            });
        }
        if self.trees.is_empty() {
            return Err(AppError::Prediction("forest has no trees".into()));
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(features)).sum();
        Ok(sum / self.trees.len() as f64)
    }
}
