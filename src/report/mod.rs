//! Terminal output for training runs.

pub mod format;

pub use format::*;
