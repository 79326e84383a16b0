//! Read/write the model bundle.
//!
//! The bundle is the only artifact shared by the trainer and the service:
//! - fitted preprocessing (field lists, one-hot encoder, scaler)
//! - the fitted forest
//! - training metadata (when, which params, how well it scored)
//!
//! It is stored as JSON. The schema is internal to this crate and guarded by
//! `format_version`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ForestParams;
use crate::error::AppError;
use crate::features::{FieldKind, Preprocessor, field_kind};
use crate::math::ClassificationReport;
use crate::models::{Classifier, RandomForest};

pub const BUNDLE_FORMAT_VERSION: u32 = 1;

/// Headline metrics recorded for one evaluation partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalMetrics {
    pub accuracy: f64,
    pub f1: f64,
    pub roc_auc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    pub trained_at: DateTime<Utc>,
    pub seed: u64,
    pub best_params: ForestParams,
    pub cv_roc_auc: f64,
    pub validation: EvalMetrics,
    pub test: EvalMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub preprocessor: Preprocessor,
    pub model: RandomForest,
    pub metadata: Option<BundleMetadata>,
}

impl ModelBundle {
    pub fn new(preprocessor: Preprocessor, model: RandomForest, metadata: Option<BundleMetadata>) -> Self {
        Self {
            format_version: BUNDLE_FORMAT_VERSION,
            preprocessor,
            model,
            metadata,
        }
    }

    /// Check that preprocessing and model agree with each other and with the
    /// patient record schema.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.format_version != BUNDLE_FORMAT_VERSION {
            return Err(AppError::config(format!(
                "Unsupported bundle format version {} (expected {BUNDLE_FORMAT_VERSION}).",
                self.format_version
            )));
        }

        let pre = &self.preprocessor;
        for field in &pre.numerical {
            if field_kind(field) != Some(FieldKind::Numeric) {
                return Err(AppError::config(format!("Bundle lists '{field}' as numeric.")));
            }
        }
        for field in &pre.categorical {
            if field_kind(field) != Some(FieldKind::Categorical) {
                return Err(AppError::config(format!("Bundle lists '{field}' as categorical.")));
            }
        }
        if pre.scaler.width() != pre.numerical.len() {
            return Err(AppError::config(format!(
                "Scaler width ({}) != numeric field count ({}).",
                pre.scaler.width(),
                pre.numerical.len()
            )));
        }
        let onehot_ok = pre.encoder.feature_names().iter().all(|name| {
            name.split_once('=')
                .is_some_and(|(field, _)| pre.categorical.iter().any(|c| c == field))
        });
        if !onehot_ok {
            return Err(AppError::config("One-hot columns reference unknown categorical fields."));
        }
        if self.model.n_features() != pre.n_features() {
            return Err(AppError::config(format!(
                "Model expects {} features but preprocessing produces {}.",
                self.model.n_features(),
                pre.n_features()
            )));
        }
        if self.model.trees().is_empty() || !self.model.trees().iter().all(|t| t.is_well_formed()) {
            return Err(AppError::config("Bundle model has no trees or malformed trees."));
        }
        if let Some(t) = self.model.trees().iter().find(|t| t.n_features() != self.model.n_features()) {
            return Err(AppError::config(format!(
                "Bundle tree expects {} features but the model expects {}.",
                t.n_features(),
                self.model.n_features()
            )));
        }
        Ok(())
    }
}

/// Write the bundle as pretty JSON.
pub fn save_bundle(path: &Path, bundle: &ModelBundle) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create bundle '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, bundle)
        .map_err(|e| AppError::config(format!("Failed to write bundle: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::config(format!("Failed to write bundle: {e}")))?;
    Ok(())
}

/// Read and validate a bundle.
pub fn load_bundle(path: &Path) -> Result<ModelBundle, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open bundle '{}': {e}", path.display())))?;
    let bundle: ModelBundle = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::config(format!("Invalid bundle JSON: {e}")))?;
    bundle.validate()?;
    Ok(bundle)
}

/// Everything the optional JSON metrics report contains.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport<'a> {
    pub best_params: ForestParams,
    pub cv_roc_auc: f64,
    pub validation: EvalMetrics,
    pub test: EvalMetrics,
    pub test_report: &'a ClassificationReport,
    pub categorical: &'a [String],
    pub numerical: &'a [String],
}

pub fn write_metrics_json(path: &Path, report: &MetricsReport<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::config(format!("Failed to create report '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .map_err(|e| AppError::config(format!("Failed to write report JSON: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::config(format!("Failed to write report JSON: {e}")))?;
    Ok(())
}
