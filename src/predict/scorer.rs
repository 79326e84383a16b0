//! Single-record scoring against a loaded bundle.
//!
//! Order of operations:
//! 1. every required key must be present (nothing else runs otherwise)
//! 2. the object must deserialize into a typed `PatientRecord`
//! 3. binary fields are encoded under the configured `BinaryPolicy`
//! 4. preprocessing + forest produce the positive-class probability
//! 5. the probability is mapped to a decision, a risk tier and a message

use nalgebra::DMatrix;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{BinaryPolicy, PatientRecord, PredictionResult, REQUIRED_FIELDS, ValidationError};
use crate::features::encode_record;
use crate::io::ModelBundle;
use crate::models::Classifier;

/// Scoring failure, split by who is at fault.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// The caller sent an unusable record.
    Validation(ValidationError),
    /// Encoding or inference failed; the detail is for server logs only.
    Internal(String),
}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::Validation(e) => write!(f, "{e}"),
            ScoreError::Internal(msg) => write!(f, "internal scoring error: {msg}"),
        }
    }
}

impl std::error::Error for ScoreError {}

impl From<ValidationError> for ScoreError {
    fn from(e: ValidationError) -> Self {
        ScoreError::Validation(e)
    }
}

/// Required keys absent from `object`, in schema order.
pub fn missing_fields(object: &Map<String, Value>) -> Vec<String> {
    REQUIRED_FIELDS
        .iter()
        .filter(|f| !object.contains_key(**f))
        .map(|f| f.to_string())
        .collect()
}

/// Turn an arbitrary JSON value into a typed record, or say why it can't be.
pub fn parse_record(payload: &Value) -> Result<PatientRecord, ValidationError> {
    let Value::Object(object) = payload else {
        return Err(ValidationError::InvalidRecord(
            "request body must be a JSON object".to_string(),
        ));
    };

    let missing = missing_fields(object);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields(missing));
    }

    PatientRecord::deserialize(payload).map_err(|e| ValidationError::InvalidRecord(e.to_string()))
}

/// Score a validated record.
pub fn score(
    record: &PatientRecord,
    bundle: &ModelBundle,
    policy: BinaryPolicy,
) -> Result<PredictionResult, ScoreError> {
    let encoded = encode_record(record, policy)?;

    let row = bundle
        .preprocessor
        .transform_row(&encoded)
        .map_err(ScoreError::Internal)?;
    if row.len() != bundle.model.n_features() {
        return Err(ScoreError::Internal(format!(
            "model expects {} features, got {}",
            bundle.model.n_features(),
            row.len()
        )));
    }

    let x = DMatrix::from_row_slice(1, row.len(), &row);
    let probability = bundle
        .model
        .predict_proba(&x)
        .first()
        .copied()
        .ok_or_else(|| ScoreError::Internal("model returned no probability".to_string()))?;
    if !(probability.is_finite() && (0.0..=1.0).contains(&probability)) {
        return Err(ScoreError::Internal(format!(
            "model returned probability {probability} outside [0, 1]"
        )));
    }

    Ok(PredictionResult::from_probability(probability))
}
