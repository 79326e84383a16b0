//! Evaluation metrics for binary classifiers.

pub mod metrics;

pub use metrics::*;
