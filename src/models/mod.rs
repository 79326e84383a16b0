//! Tree-ensemble classifier.
//!
//! Models are plain data (serde-serializable node arrays) so a fitted forest can
//! be stored in the bundle and evaluated without any training state.

use nalgebra::DMatrix;

pub mod forest;
pub mod tree;

pub use forest::*;
pub use tree::*;

/// A fitted binary classifier.
pub trait Classifier {
    /// Number of input columns the model was fitted on.
    fn n_features(&self) -> usize;

    /// Positive-class probability for each row of `x`.
    fn predict_proba(&self, x: &DMatrix<f64>) -> Vec<f64>;
}
