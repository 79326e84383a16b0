//! Dataset acquisition and partitioning.

pub mod fetch;
pub mod split;

pub use fetch::ensure_dataset;
pub use split::*;
