//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - deserialized from request bodies and CSV rows
//! - persisted inside the model bundle
//! - rendered into reports and HTTP responses

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The 11 fields every patient record must carry, in dataset column order.
pub const REQUIRED_FIELDS: [&str; 11] = [
    "Age",
    "Sex",
    "ChestPainType",
    "RestingBP",
    "Cholesterol",
    "FastingBS",
    "RestingECG",
    "MaxHR",
    "ExerciseAngina",
    "Oldpeak",
    "ST_Slope",
];

/// Label column in the training CSV (1 = disease present).
pub const TARGET_COLUMN: &str = "HeartDisease";

/// Probability at or above which the binary decision is "disease present".
pub const DECISION_THRESHOLD: f64 = 0.5;

/// One patient, as received on the wire or read from the dataset.
///
/// Field types are explicit: integer measurements reject fractional or string
/// input, and categorical fields must be strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Whole years. JSON `65.0` is rejected; send `65`.
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "ChestPainType")]
    pub chest_pain_type: String,
    /// `RestingBP`, `Cholesterol` and `MaxHR` are integers too; a fractional
    /// JSON number such as `140.0` fails validation.
    #[serde(rename = "RestingBP")]
    pub resting_bp: u32,
    #[serde(rename = "Cholesterol")]
    pub cholesterol: u32,
    #[serde(rename = "FastingBS")]
    pub fasting_bs: u8,
    #[serde(rename = "RestingECG")]
    pub resting_ecg: String,
    #[serde(rename = "MaxHR")]
    pub max_hr: u32,
    #[serde(rename = "ExerciseAngina")]
    pub exercise_angina: String,
    #[serde(rename = "Oldpeak")]
    pub oldpeak: f64,
    #[serde(rename = "ST_Slope")]
    pub st_slope: String,
}

/// A single feature value after binary encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => Some(s),
        }
    }
}

/// A patient record with `Sex` / `ExerciseAngina` already mapped to 0/1.
///
/// Values are stored in `REQUIRED_FIELDS` order.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedRecord {
    pub values: Vec<(&'static str, FieldValue)>,
}

impl EncodedRecord {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }
}

/// How the two binary fields are mapped to 0/1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryPolicy {
    /// `Sex` in {M, F} and `ExerciseAngina` in {N, Y} (case-insensitive);
    /// anything else is rejected.
    #[default]
    Strict,
    /// Legacy behavior: exact "M" / "N" map to 0, every other string maps to 1.
    Lenient,
}

/// Caller-side problem with a record. Never reaches the encoder or the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required keys absent from the input, in `REQUIRED_FIELDS` order.
    MissingFields(Vec<String>),
    /// Body is not an object or a field has the wrong JSON type.
    InvalidRecord(String),
    /// A field holds a value outside its allowed domain.
    InvalidValue { field: String, value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingFields(fields) => {
                let quoted: Vec<String> = fields.iter().map(|f| format!("'{f}'")).collect();
                write!(f, "Missing required fields: [{}]", quoted.join(", "))
            }
            ValidationError::InvalidRecord(msg) => write!(f, "Invalid patient record: {msg}"),
            ValidationError::InvalidValue { field, value } => {
                write!(f, "Invalid value for {field}: '{value}'")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Risk bucket derived from the predicted probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `< 0.3` is Low, `[0.3, 0.6)` is Medium, everything else High.
    pub fn from_probability(probability: f64) -> Self {
        if probability < 0.3 {
            RiskLevel::Low
        } else if probability < 0.6 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low risk of heart disease. Maintain healthy lifestyle.",
            RiskLevel::Medium => "Medium risk of heart disease. Consider medical consultation.",
            RiskLevel::High => "High risk of heart disease. Seek immediate medical attention.",
        }
    }
}

/// Outcome of scoring one record.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub probability: f64,
    pub heart_disease: bool,
    pub risk_level: RiskLevel,
    pub message: &'static str,
}

impl PredictionResult {
    pub fn from_probability(probability: f64) -> Self {
        let risk_level = RiskLevel::from_probability(probability);
        Self {
            probability,
            heart_disease: probability >= DECISION_THRESHOLD,
            risk_level,
            message: risk_level.message(),
        }
    }
}

/// Random forest hyperparameters (one grid point).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// `None` grows trees until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl fmt::Display for ForestParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self
            .max_depth
            .map(|d| d.to_string())
            .unwrap_or_else(|| "None".to_string());
        write!(
            f,
            "n_estimators={}, max_depth={depth}, min_samples_split={}, min_samples_leaf={}",
            self.n_estimators, self.min_samples_split, self.min_samples_leaf
        )
    }
}

/// Which hyperparameter grid the trainer searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridKind {
    Full,
    Quick,
}

/// Trainer configuration (resolved from CLI flags / environment).
#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub data_path: PathBuf,
    pub data_url: Option<String>,
    pub output_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub seed: u64,
    /// Fraction of all rows held out for the final test.
    pub test_size: f64,
    /// Fraction of the remaining rows used for validation.
    pub val_size: f64,
    pub folds: usize,
    pub grid: GridKind,
}

impl TrainConfig {
    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        for (name, value) in [("test size", self.test_size), ("validation size", self.val_size)] {
            if !(value.is_finite() && value > 0.0 && value < 1.0) {
                return Err(crate::error::AppError::config(format!(
                    "Invalid {name}: {value} (must be in (0, 1))."
                )));
            }
        }
        if self.folds < 2 {
            return Err(crate::error::AppError::config("Cross-validation folds must be >= 2."));
        }
        Ok(())
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    pub model_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub binary_policy: BinaryPolicy,
}

impl ServeConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Summary stats about the rows actually used for training.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_rows: usize,
    pub n_positive: usize,
    pub n_negative: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_tier_boundaries_are_exact() {
        assert_eq!(RiskLevel::from_probability(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.299_999_9), RiskLevel::Low);
        assert_eq!(RiskLevel::from_probability(0.3), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.599_999_9), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.6), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(1.0), RiskLevel::High);
    }

    #[test]
    fn decision_follows_threshold() {
        assert!(!PredictionResult::from_probability(0.499_99).heart_disease);
        assert!(PredictionResult::from_probability(0.5).heart_disease);
        let r = PredictionResult::from_probability(0.55);
        assert_eq!(r.risk_level, RiskLevel::Medium);
        assert_eq!(r.message, RiskLevel::Medium.message());
    }

    #[test]
    fn missing_fields_message_lists_names() {
        let err = ValidationError::MissingFields(vec!["Age".to_string(), "Sex".to_string()]);
        assert_eq!(err.to_string(), "Missing required fields: ['Age', 'Sex']");
    }

    #[test]
    fn record_uses_dataset_column_names() {
        let json = serde_json::json!({
            "Age": 52, "Sex": "M", "ChestPainType": "ASY", "RestingBP": 120,
            "Cholesterol": 280, "FastingBS": 0, "RestingECG": "Normal", "MaxHR": 150,
            "ExerciseAngina": "N", "Oldpeak": 2.5, "ST_Slope": "Flat"
        });
        let record: PatientRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.age, 52);
        assert_eq!(record.st_slope, "Flat");
    }

    #[test]
    fn train_config_rejects_bad_fractions() {
        let config = TrainConfig {
            data_path: PathBuf::from("heart.csv"),
            data_url: None,
            output_path: PathBuf::from("model.json"),
            report_path: None,
            seed: 1,
            test_size: 1.2,
            val_size: 0.25,
            folds: 5,
            grid: GridKind::Quick,
        };
        assert_eq!(config.validate().unwrap_err().exit_code(), 2);

        let config = TrainConfig {
            test_size: 0.2,
            folds: 1,
            ..config
        };
        assert!(config.validate().unwrap_err().message().contains("folds"));
    }
}
