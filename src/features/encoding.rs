//! Record-level encoding: validated `PatientRecord` -> `EncodedRecord`.
//!
//! `Sex` and `ExerciseAngina` become 0/1 numbers here; everything else is passed
//! through as either a number or a category string.

use crate::domain::{BinaryPolicy, EncodedRecord, FieldValue, PatientRecord, ValidationError};

/// Fields that stay strings after encoding (one-hot candidates).
pub const TEXT_FIELDS: [&str; 3] = ["ChestPainType", "RestingECG", "ST_Slope"];

/// Kind of value a field carries after binary encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Categorical,
}

/// Look up the post-encoding kind of a record field. `None` for unknown names.
pub fn field_kind(name: &str) -> Option<FieldKind> {
    if TEXT_FIELDS.iter().any(|f| *f == name) {
        Some(FieldKind::Categorical)
    } else if crate::domain::REQUIRED_FIELDS.iter().any(|f| *f == name) {
        Some(FieldKind::Numeric)
    } else {
        None
    }
}

/// Encode `Sex`: M -> 0, F -> 1.
pub fn encode_sex(value: &str, policy: BinaryPolicy) -> Result<f64, ValidationError> {
    encode_binary("Sex", value, ("M", "F"), policy)
}

/// Encode `ExerciseAngina`: N -> 0, Y -> 1.
pub fn encode_exercise_angina(value: &str, policy: BinaryPolicy) -> Result<f64, ValidationError> {
    encode_binary("ExerciseAngina", value, ("N", "Y"), policy)
}

fn encode_binary(
    field: &str,
    value: &str,
    (zero, one): (&str, &str),
    policy: BinaryPolicy,
) -> Result<f64, ValidationError> {
    match policy {
        BinaryPolicy::Lenient => Ok(if value == zero { 0.0 } else { 1.0 }),
        BinaryPolicy::Strict => {
            let v = value.trim();
            if v.eq_ignore_ascii_case(zero) {
                Ok(0.0)
            } else if v.eq_ignore_ascii_case(one) {
                Ok(1.0)
            } else {
                Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    value: value.to_string(),
                })
            }
        }
    }
}

/// Encode a full record, checking value domains according to `policy`.
pub fn encode_record(
    record: &PatientRecord,
    policy: BinaryPolicy,
) -> Result<EncodedRecord, ValidationError> {
    if !record.oldpeak.is_finite() {
        return Err(ValidationError::InvalidValue {
            field: "Oldpeak".to_string(),
            value: record.oldpeak.to_string(),
        });
    }
    if policy == BinaryPolicy::Strict && record.fasting_bs > 1 {
        return Err(ValidationError::InvalidValue {
            field: "FastingBS".to_string(),
            value: record.fasting_bs.to_string(),
        });
    }

    let sex = encode_sex(&record.sex, policy)?;
    let angina = encode_exercise_angina(&record.exercise_angina, policy)?;

    let values = vec![
        ("Age", FieldValue::Number(f64::from(record.age))),
        ("Sex", FieldValue::Number(sex)),
        ("ChestPainType", FieldValue::Text(record.chest_pain_type.clone())),
        ("RestingBP", FieldValue::Number(f64::from(record.resting_bp))),
        ("Cholesterol", FieldValue::Number(f64::from(record.cholesterol))),
        ("FastingBS", FieldValue::Number(f64::from(record.fasting_bs))),
        ("RestingECG", FieldValue::Text(record.resting_ecg.clone())),
        ("MaxHR", FieldValue::Number(f64::from(record.max_hr))),
        ("ExerciseAngina", FieldValue::Number(angina)),
        ("Oldpeak", FieldValue::Number(record.oldpeak)),
        ("ST_Slope", FieldValue::Text(record.st_slope.clone())),
    ];

    Ok(EncodedRecord { values })
}
