//! CART decision tree (Gini impurity, binary labels).
//!
//! Split search at each node:
//! - visit features in a random order until `max_features` non-constant ones
//!   have been evaluated
//! - for each, sort the node's samples and sweep thresholds at midpoints
//!   between distinct values
//! - keep the split with the lowest weighted child impurity that leaves at
//!   least `min_samples_leaf` samples on each side
//!
//! Leaves store the fraction of positive samples that reached them.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::models::Classifier;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        proba: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    n_features: usize,
    nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct Builder<'a> {
    x: &'a DMatrix<f64>,
    y: &'a [u8],
    params: TreeParams,
    rng: &'a mut StdRng,
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grow a tree on the rows listed in `samples` (duplicates allowed, as in a
    /// bootstrap draw).
    ///
    /// # Panics
    /// Panics if `samples` is empty or indexes outside `x` / `y`. Callers
    /// validate inputs before fitting.
    pub fn fit(
        x: &DMatrix<f64>,
        y: &[u8],
        samples: &[usize],
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let mut builder = Builder {
            x,
            y,
            params,
            rng,
            nodes: Vec::new(),
        };
        let mut samples = samples.to_vec();
        builder.grow(&mut samples, 0);
        Self {
            n_features: x.ncols(),
            nodes: builder.nodes,
        }
    }

    /// A single-leaf tree that always predicts `proba`.
    pub fn constant(proba: f64, n_features: usize) -> Self {
        Self {
            n_features,
            nodes: vec![Node::Leaf { proba }],
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// Positive-class probability for a single row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return *proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Structural sanity check for trees loaded from disk.
    ///
    /// Children must come after their parent, which rules out cycles.
    pub fn is_well_formed(&self) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(idx, node)| match node {
                Node::Leaf { proba } => (0.0..=1.0).contains(proba),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    *feature < self.n_features
                        && threshold.is_finite()
                        && (idx + 1..self.nodes.len()).contains(left)
                        && (idx + 1..self.nodes.len()).contains(right)
                }
            })
    }
}

impl Classifier for DecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_proba(&self, x: &DMatrix<f64>) -> Vec<f64> {
        x.row_iter()
            .map(|row| {
                let row: Vec<f64> = row.iter().copied().collect();
                self.predict_row(&row)
            })
            .collect()
    }
}

impl Builder<'_> {
    fn grow(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let n = samples.len();
        let positives = samples.iter().filter(|&&i| self.y[i] == 1).count();
        let proba = positives as f64 / n as f64;

        let depth_reached = self.params.max_depth.is_some_and(|d| depth >= d);
        let too_small = n < self.params.min_samples_split || n < 2 * self.params.min_samples_leaf;
        if positives == 0 || positives == n || depth_reached || too_small {
            return self.push(Node::Leaf { proba });
        }

        let Some(split) = self.best_split(samples) else {
            return self.push(Node::Leaf { proba });
        };

        let x = self.x;
        samples.sort_by(|&a, &b| x[(a, split.feature)].total_cmp(&x[(b, split.feature)]));
        let cut = samples.partition_point(|&i| x[(i, split.feature)] <= split.threshold);

        // Reserve the slot so children land after their parent.
        let idx = self.push(Node::Leaf { proba });
        let (left_samples, right_samples) = samples.split_at_mut(cut);
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn best_split(&mut self, samples: &[usize]) -> Option<SplitCandidate> {
        let n_features = self.x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        features.shuffle(&mut *self.rng);

        let min_leaf = self.params.min_samples_leaf.max(1);
        let total_pos = samples.iter().filter(|&&i| self.y[i] == 1).count();
        let n = samples.len();

        let mut best: Option<SplitCandidate> = None;
        let mut visited = 0;
        let mut column: Vec<(f64, u8)> = Vec::with_capacity(n);

        for feature in features {
            if visited >= self.params.max_features {
                break;
            }
            column.clear();
            column.extend(samples.iter().map(|&i| (self.x[(i, feature)], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            if column[0].0 == column[n - 1].0 {
                continue;
            }
            visited += 1;

            let mut left_pos = 0usize;
            for i in 0..n - 1 {
                left_pos += usize::from(column[i].1);
                if column[i].0 == column[i + 1].0 {
                    continue;
                }
                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let impurity = n_left as f64 * gini(left_pos, n_left)
                    + n_right as f64 * gini(total_pos - left_pos, n_right);
                if best.is_none_or(|b| impurity < b.impurity) {
                    let (lo, hi) = (column[i].0, column[i + 1].0);
                    let mut threshold = lo + (hi - lo) / 2.0;
                    if threshold >= hi {
                        threshold = lo;
                    }
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

fn gini(positives: usize, n: usize) -> f64 {
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn params(max_depth: Option<usize>) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn separable_data_is_fit_exactly() {
        // Label is 1 iff the first column exceeds 5.
        let x = DMatrix::from_row_slice(
            6,
            2,
            &[1.0, 9.0, 2.0, 3.0, 4.0, 7.0, 6.0, 1.0, 8.0, 5.0, 9.0, 2.0],
        );
        let y = [0, 0, 0, 1, 1, 1];
        let samples: Vec<usize> = (0..6).collect();
        let mut rng = StdRng::seed_from_u64(7);
        let tree = DecisionTree::fit(&x, &y, &samples, params(None), &mut rng);

        let proba = tree.predict_proba(&x);
        let expected = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        assert_eq!(proba, expected);
        assert!(tree.is_well_formed());
    }

    #[test]
    fn max_depth_limits_growth() {
        let x = DMatrix::from_row_slice(8, 1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let y = [0, 1, 0, 1, 0, 1, 0, 1];
        let samples: Vec<usize> = (0..8).collect();
        let mut rng = StdRng::seed_from_u64(1);
        let tree = DecisionTree::fit(&x, &y, &samples, params(Some(1)), &mut rng);
        assert!(tree.depth() <= 1);
    }

    #[test]
    fn min_samples_leaf_is_respected() {
        let x = DMatrix::from_row_slice(6, 1, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let y = [1, 0, 0, 0, 0, 0];
        let samples: Vec<usize> = (0..6).collect();
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = params(None);
        p.min_samples_leaf = 3;
        let tree = DecisionTree::fit(&x, &y, &samples, p, &mut rng);
        // The only legal cut is 3/3, which leaves the first leaf impure.
        assert!((tree.predict_row(&[1.0]) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn constant_features_produce_a_leaf() {
        let x = DMatrix::from_row_slice(4, 1, &[2.0, 2.0, 2.0, 2.0]);
        let y = [0, 1, 0, 1];
        let samples: Vec<usize> = (0..4).collect();
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTree::fit(&x, &y, &samples, params(None), &mut rng);
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.predict_row(&[2.0]), 0.5);
    }

    #[test]
    fn node_layout_round_trips_through_json() {
        let tree = DecisionTree::constant(0.25, 3);
        let json = serde_json::to_string(&tree).unwrap();
        assert!(json.contains("\"kind\":\"leaf\""));
        let back: DecisionTree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
    }
}
