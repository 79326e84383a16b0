//! One-hot encoding of categorical fields.
//!
//! Columns are named `field=value` and sorted lexicographically, so the layout
//! depends only on the training vocabulary. A value not seen during fitting
//! encodes to all zeros.

use serde::{Deserialize, Serialize};

use crate::domain::EncodedRecord;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    /// Sorted `field=value` column names.
    feature_names: Vec<String>,
}

impl OneHotEncoder {
    /// Learn the vocabulary of `fields` from `records`.
    pub fn fit(records: &[EncodedRecord], fields: &[String]) -> Result<Self, AppError> {
        let mut names = Vec::new();
        for record in records {
            for field in fields {
                let value = record
                    .get(field)
                    .and_then(|v| v.as_text())
                    .ok_or_else(|| {
                        AppError::model(format!("Categorical field '{field}' missing or not text."))
                    })?;
                names.push(column_name(field, value));
            }
        }
        names.sort();
        names.dedup();
        Ok(Self {
            feature_names: names,
        })
    }

    pub fn width(&self) -> usize {
        self.feature_names.len()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Encode the categorical fields of one record.
    pub fn transform(&self, record: &EncodedRecord, fields: &[String]) -> Result<Vec<f64>, String> {
        let mut out = vec![0.0; self.width()];
        for field in fields {
            let value = record
                .get(field)
                .and_then(|v| v.as_text())
                .ok_or_else(|| format!("categorical field '{field}' missing or not text"))?;
            if let Ok(idx) = self.feature_names.binary_search(&column_name(field, value)) {
                out[idx] = 1.0;
            }
        }
        Ok(out)
    }
}

fn column_name(field: &str, value: &str) -> String {
    format!("{field}={value}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;

    fn record(pain: &str, slope: &str) -> EncodedRecord {
        EncodedRecord {
            values: vec![
                ("ChestPainType", FieldValue::Text(pain.to_string())),
                ("ST_Slope", FieldValue::Text(slope.to_string())),
            ],
        }
    }

    fn fields() -> Vec<String> {
        vec!["ChestPainType".to_string(), "ST_Slope".to_string()]
    }

    #[test]
    fn columns_are_sorted_and_deduplicated() {
        let records = vec![record("NAP", "Up"), record("ASY", "Flat"), record("ASY", "Up")];
        let enc = OneHotEncoder::fit(&records, &fields()).unwrap();
        assert_eq!(
            enc.feature_names(),
            &[
                "ChestPainType=ASY".to_string(),
                "ChestPainType=NAP".to_string(),
                "ST_Slope=Flat".to_string(),
                "ST_Slope=Up".to_string(),
            ]
        );
    }

    #[test]
    fn transform_sets_one_bit_per_field() {
        let records = vec![record("NAP", "Up"), record("ASY", "Flat")];
        let enc = OneHotEncoder::fit(&records, &fields()).unwrap();
        let row = enc.transform(&record("ASY", "Up"), &fields()).unwrap();
        assert_eq!(row, vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn unseen_category_encodes_to_zeros() {
        let records = vec![record("NAP", "Up"), record("ASY", "Flat")];
        let enc = OneHotEncoder::fit(&records, &fields()).unwrap();
        let row = enc.transform(&record("TA", "Down"), &fields()).unwrap();
        assert!(row.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn numeric_value_in_categorical_field_is_an_error() {
        let records = vec![EncodedRecord {
            values: vec![("ChestPainType", FieldValue::Number(1.0))],
        }];
        assert!(OneHotEncoder::fit(&records, &["ChestPainType".to_string()]).is_err());
    }
}
