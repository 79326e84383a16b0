//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - model bundle + metrics report read/write (`bundle`)

pub mod bundle;
pub mod ingest;

pub use bundle::*;
pub use ingest::*;
