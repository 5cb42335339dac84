//! Random-forest regression: bootstrap-sampled CART trees split on variance
//! reduction, predictions averaged.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use matplan_recon::config::PredictorConfig;

use crate::features::{FeatureRow, N_FEATURES};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl From<&PredictorConfig> for ForestParams {
    fn from(c: &PredictorConfig) -> Self {
        Self {
            n_trees: c.n_trees,
            max_depth: c.max_depth,
            min_samples_split: c.min_samples_split,
            min_samples_leaf: c.min_samples_leaf,
            seed: c.seed,
        }
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

struct Best {
    feature: usize,
    threshold: f64,
    gain: f64,
    /// Number of samples going left once sorted on `feature`.
    left_len: usize,
}

struct TreeBuilder<'a> {
    x: &'a [FeatureRow],
    y: &'a [f64],
    params: &'a ForestParams,
    nodes: Vec<Node>,
    importance: [f64; N_FEATURES],
}

fn sse(y: &[f64], idx: &[usize]) -> (f64, f64) {
    let n = idx.len() as f64;
    let sum: f64 = idx.iter().map(|&i| y[i]).sum();
    let sq: f64 = idx.iter().map(|&i| y[i] * y[i]).sum();
    (sum / n, (sq - sum * sum / n).max(0.0))
}

impl TreeBuilder<'_> {
    fn build(&mut self, idx: &mut [usize], depth: usize) -> usize {
        let (mean, parent_sse) = sse(self.y, idx);
        let slot = self.nodes.len();
        self.nodes.push(Node::Leaf { value: mean });

        if depth >= self.params.max_depth
            || idx.len() < self.params.min_samples_split.max(2)
            || parent_sse <= f64::EPSILON
        {
            return slot;
        }

        let Some(best) = self.best_split(idx, parent_sse) else {
            return slot;
        };

        idx.sort_by(|&a, &b| self.x[a][best.feature].total_cmp(&self.x[b][best.feature]));
        self.importance[best.feature] += best.gain;

        let (left_idx, right_idx) = idx.split_at_mut(best.left_len);
        let left = self.build(left_idx, depth + 1);
        let right = self.build(right_idx, depth + 1);
        self.nodes[slot] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        slot
    }

    fn best_split(&self, idx: &[usize], parent_sse: f64) -> Option<Best> {
        let n = idx.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let total_sum: f64 = idx.iter().map(|&i| self.y[i]).sum();
        let total_sq: f64 = idx.iter().map(|&i| self.y[i] * self.y[i]).sum();

        let mut best: Option<Best> = None;
        let mut order: Vec<usize> = idx.to_vec();

        for feature in 0..N_FEATURES {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let (mut left_sum, mut left_sq) = (0.0, 0.0);
            for k in 0..n - 1 {
                let yi = self.y[order[k]];
                left_sum += yi;
                left_sq += yi * yi;

                let left_n = k + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }
                let here = self.x[order[k]][feature];
                let next = self.x[order[k + 1]][feature];
                if here == next {
                    continue;
                }

                let right_sum = total_sum - left_sum;
                let right_sq = total_sq - left_sq;
                let left_sse = left_sq - left_sum * left_sum / left_n as f64;
                let right_sse = right_sq - right_sum * right_sum / right_n as f64;
                let gain = parent_sse - left_sse - right_sse;

                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(Best {
                        feature,
                        threshold: (here + next) / 2.0,
                        gain,
                        left_len: left_n,
                    });
                }
            }
        }
        best
    }
}

impl RegressionTree {
    fn fit(x: &[FeatureRow], y: &[f64], sample: &mut [usize], params: &ForestParams) -> (Self, [f64; N_FEATURES]) {
        let mut builder = TreeBuilder {
            x,
            y,
            params,
            nodes: Vec::new(),
            importance: [0.0; N_FEATURES],
        };
        builder.build(sample, 0);
        (Self { nodes: builder.nodes }, builder.importance)
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    at = if row[*feature] <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

// ---------------------------------------------------------------------------
// Forest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<RegressionTree>,
    feature_importances: Vec<f64>,
}

fn normalized(v: &[f64]) -> Vec<f64> {
    let total: f64 = v.iter().sum();
    if total > 0.0 {
        v.iter().map(|x| x / total).collect()
    } else {
        vec![0.0; v.len()]
    }
}

impl RandomForest {
    /// Deterministic for a given `params.seed`. With no samples the forest
    /// has no trees and predicts 0.
    pub fn fit(x: &[FeatureRow], y: &[f64], params: ForestParams) -> Self {
        let n = x.len().min(y.len());
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut trees = Vec::with_capacity(params.n_trees);
        let mut importance_sum = vec![0.0; N_FEATURES];

        if n > 0 {
            for _ in 0..params.n_trees {
                let mut sample: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let (tree, importance) = RegressionTree::fit(x, y, &mut sample, &params);
                for (acc, v) in importance_sum.iter_mut().zip(normalized(&importance)) {
                    *acc += v;
                }
                trees.push(tree);
            }
        }

        Self {
            params,
            feature_importances: normalized(&importance_sum),
            trees,
        }
    }

    pub fn tree_predictions(&self, row: &FeatureRow) -> Vec<f64> {
        self.trees.iter().map(|t| t.predict(row)).collect()
    }

    pub fn predict(&self, row: &FeatureRow) -> f64 {
        let preds = self.tree_predictions(row);
        if preds.is_empty() {
            return 0.0;
        }
        preds.iter().sum::<f64>() / preds.len() as f64
    }

    /// Impurity-based importances, summing to 1 (all zero if no split was made).
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

/// Coefficient of determination. A constant target scores 1 when predicted
/// exactly, else 0.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len() as f64;
    if n == 0.0 {
        return 0.0;
    }
    let mean = y_true.iter().sum::<f64>() / n;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n_trees: usize) -> ForestParams {
        ForestParams {
            n_trees,
            max_depth: 10,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }

    fn row(a: f64) -> FeatureRow {
        let mut r = [0.0; N_FEATURES];
        r[2] = a;
        r
    }

    #[test]
    fn single_tree_learns_step() {
        let x: Vec<FeatureRow> = (0..10).map(|i| row(i as f64)).collect();
        let y: Vec<f64> = (0..10).map(|i| if i < 5 { 10.0 } else { 50.0 }).collect();
        let mut sample: Vec<usize> = (0..10).collect();
        let (tree, importance) = RegressionTree::fit(&x, &y, &mut sample, &params(1));
        assert_eq!(tree.predict(&row(1.0)), 10.0);
        assert_eq!(tree.predict(&row(8.0)), 50.0);
        assert_eq!(tree.node_count(), 3);
        assert!(importance[2] > 0.0);
        assert_eq!(importance[0], 0.0);
    }

    #[test]
    fn leaf_size_respected() {
        let x: Vec<FeatureRow> = (0..4).map(|i| row(i as f64)).collect();
        let y = vec![0.0, 100.0, 100.0, 100.0];
        let mut sample: Vec<usize> = (0..4).collect();
        let p = ForestParams {
            min_samples_leaf: 2,
            ..params(1)
        };
        let (tree, _) = RegressionTree::fit(&x, &y, &mut sample, &p);
        // row 0 can never sit in a leaf of its own
        assert_eq!(tree.predict(&row(0.0)), 50.0);
    }

    #[test]
    fn forest_is_deterministic() {
        let x: Vec<FeatureRow> = (0..30).map(|i| row(i as f64)).collect();
        let y: Vec<f64> = (0..30).map(|i| (i * 2) as f64).collect();
        let a = RandomForest::fit(&x, &y, params(20));
        let b = RandomForest::fit(&x, &y, params(20));
        assert_eq!(a, b);
        assert_eq!(a.n_trees(), 20);

        let p = a.predict(&row(15.0));
        assert!((p - 30.0).abs() < 6.0, "prediction {p}");
        let imp: f64 = a.feature_importances().iter().sum();
        assert!((imp - 1.0).abs() < 1e-9);
        assert!(a.feature_importances()[2] > 0.99);
    }

    #[test]
    fn r2() {
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 1.0);
        assert_eq!(r2_score(&[1.0, 2.0, 3.0], &[2.0, 2.0, 2.0]), 0.0);
        assert_eq!(r2_score(&[4.0, 4.0], &[4.0, 4.0]), 1.0);
        assert_eq!(r2_score(&[4.0, 4.0], &[3.0, 4.0]), 0.0);
    }
}
