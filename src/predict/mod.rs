//! Scoring: payload validation, feature encoding, inference, risk bucketing.

pub mod scorer;
pub mod service;

pub use scorer::*;
pub use service::*;
