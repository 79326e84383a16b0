//! Random forest: bootstrap-aggregated CART trees.
//!
//! Each tree is grown on its own bootstrap draw with `floor(sqrt(n_features))`
//! candidate features per split. Tree seeds are derived from the forest seed and
//! the tree index, so fitting is reproducible regardless of thread scheduling.

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::ForestParams;
use crate::error::AppError;
use crate::models::{Classifier, DecisionTree, TreeParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(
        x: &DMatrix<f64>,
        y: &[u8],
        params: ForestParams,
        seed: u64,
    ) -> Result<Self, AppError> {
        let n = x.nrows();
        if n == 0 {
            return Err(AppError::insufficient_data("Cannot fit a forest on zero rows."));
        }
        if y.len() != n {
            return Err(AppError::model(format!(
                "Label count ({}) != row count ({n}).",
                y.len()
            )));
        }
        if y.iter().any(|&label| label > 1) {
            return Err(AppError::model("Labels must be 0 or 1."));
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(AppError::model("Non-finite value in training matrix."));
        }
        if params.n_estimators == 0 || params.min_samples_split < 2 || params.min_samples_leaf == 0 {
            return Err(AppError::config(format!("Invalid forest parameters: {params}.")));
        }

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: ((x.ncols() as f64).sqrt().floor() as usize).max(1),
        };

        let trees: Vec<DecisionTree> = (0..params.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(tree_seed(seed, t));
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, y, &bootstrap, tree_params, &mut rng)
            })
            .collect();

        Ok(Self {
            params,
            n_features: x.ncols(),
            trees,
        })
    }

    /// Assemble a forest from already-built trees.
    pub fn from_trees(params: ForestParams, n_features: usize, trees: Vec<DecisionTree>) -> Self {
        Self {
            params,
            n_features,
            trees,
        }
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Mean of the per-tree leaf probabilities for one row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }
}

impl Classifier for RandomForest {
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

fn tree_seed(seed: u64, tree: usize) -> u64 {
    seed ^ (tree as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(n_estimators: usize) -> ForestParams {
        ForestParams {
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    fn toy_data() -> (DMatrix<f64>, Vec<u8>) {
        let mut data = Vec::new();
        let mut y = Vec::new();
        for i in 0..40 {
            let v = i as f64;
            data.extend([v, (i % 7) as f64, 1.0]);
            y.push(u8::from(i >= 20));
        }
        (DMatrix::from_row_slice(40, 3, &data), y)
    }

    #[test]
    fn probabilities_stay_in_unit_interval_and_rank_classes() {
        let (x, y) = toy_data();
        let forest = RandomForest::fit(&x, &y, params(25), 1).unwrap();
        let proba = forest.predict_proba(&x);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        assert!(proba[0] < 0.5);
        assert!(proba[39] > 0.5);
    }

    #[test]
    fn fitting_is_deterministic_for_a_seed() {
        let (x, y) = toy_data();
        let a = RandomForest::fit(&x, &y, params(10), 42).unwrap();
        let b = RandomForest::fit(&x, &y, params(10), 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_non_binary_labels() {
        let (x, mut y) = toy_data();
        y[0] = 2;
        let err = RandomForest::fit(&x, &y, params(5), 1).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn rejects_zero_estimators() {
        let (x, y) = toy_data();
        assert!(RandomForest::fit(&x, &y, params(0), 1).is_err());
    }

    #[test]
    fn averages_tree_probabilities() {
        let forest = RandomForest::from_trees(
            params(2),
            1,
            vec![DecisionTree::constant(0.2, 1), DecisionTree::constant(0.6, 1)],
        );
        assert!((forest.predict_row(&[0.0]) - 0.4).abs() < 1e-12);
    }
}
