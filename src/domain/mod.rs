//! Domain types used throughout the trainer and the service.
//!
//! This module defines:
//!
//! - the patient record schema (`PatientRecord`, `REQUIRED_FIELDS`)
//! - encoded feature values (`FieldValue`, `EncodedRecord`)
//! - scoring outputs (`PredictionResult`, `RiskLevel`)
//! - run configuration (`TrainConfig`, `ServeConfig`, `ForestParams`)

pub mod types;

pub use types::*;
