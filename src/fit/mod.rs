//! Hyperparameter search orchestration.
//!
//! Responsibilities:
//!
//! - enumerate forest parameter grids
//! - score each candidate with stratified k-fold CV (parallel)
//! - pick the best candidate by mean ROC-AUC and refit it on all training rows

pub mod grid;
pub mod search;

pub use grid::*;
pub use search::*;
