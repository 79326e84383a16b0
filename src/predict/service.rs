//! The prediction service context.
//!
//! `Predictor` owns the loaded bundle for the lifetime of the process. It is
//! built once at startup and only ever read afterwards, so request handlers can
//! share it behind an `Arc` without locking.

use std::path::Path;

use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::domain::{BinaryPolicy, PredictionResult};
use crate::error::AppError;
use crate::io::{ModelBundle, load_bundle};
use crate::predict::scorer::{ScoreError, parse_record, score};

pub const SERVICE_NAME: &str = "heart_disease_prediction";
pub const SERVICE_VERSION: &str = "1.0";

/// Constant health-check payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub model: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Clone)]
pub struct Predictor {
    bundle: ModelBundle,
    policy: BinaryPolicy,
}

impl Predictor {
    pub fn new(bundle: ModelBundle, policy: BinaryPolicy) -> Self {
        Self { bundle, policy }
    }

    /// Load and validate the bundle at `path`.
    pub fn load(path: &Path, policy: BinaryPolicy) -> Result<Self, AppError> {
        let bundle = load_bundle(path)?;
        info!(
            "loaded bundle {}: {} numeric + {} one-hot features, {} trees",
            path.display(),
            bundle.preprocessor.numerical.len(),
            bundle.preprocessor.encoder.width(),
            bundle.model.trees().len()
        );
        Ok(Self::new(bundle, policy))
    }

    pub fn bundle(&self) -> &ModelBundle {
        &self.bundle
    }

    pub fn policy(&self) -> BinaryPolicy {
        self.policy
    }

    /// Validate and score one JSON payload.
    pub fn predict(&self, payload: &Value) -> Result<PredictionResult, ScoreError> {
        let record = parse_record(payload)?;
        score(&record, &self.bundle, self.policy)
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy",
            model: SERVICE_NAME,
            version: SERVICE_VERSION,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::bundle::tests::constant_bundle;
    use serde_json::json;

    #[test]
    fn health_is_constant() {
        let predictor = Predictor::new(constant_bundle(0.2), BinaryPolicy::Strict);
        let first = predictor.health();
        assert_eq!(first, predictor.health());
        assert_eq!(first.status, "healthy");
        assert_eq!(first.model, "heart_disease_prediction");
        assert_eq!(first.version, "1.0");
    }

    #[test]
    fn predict_validates_before_scoring() {
        let predictor = Predictor::new(constant_bundle(0.2), BinaryPolicy::Strict);
        let err = predictor.predict(&json!({})).unwrap_err();
        let ScoreError::Validation(crate::domain::ValidationError::MissingFields(fields)) = err else {
            panic!("expected missing fields");
        };
        assert_eq!(fields.len(), 11);
    }
}
