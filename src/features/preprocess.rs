//! Fitted preprocessing: field lists + scaler + one-hot encoder.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::domain::EncodedRecord;
use crate::error::AppError;
use crate::features::{OneHotEncoder, StandardScaler};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    /// Categorical field names, one-hot encoded.
    pub categorical: Vec<String>,
    /// Numeric field names, in scaler column order.
    pub numerical: Vec<String>,
    pub encoder: OneHotEncoder,
    pub scaler: StandardScaler,
}

impl Preprocessor {
    /// Fit the encoder and scaler on training records only.
    pub fn fit(
        records: &[EncodedRecord],
        categorical: Vec<String>,
        numerical: Vec<String>,
    ) -> Result<Self, AppError> {
        if records.is_empty() {
            return Err(AppError::insufficient_data("No training records to fit preprocessing."));
        }
        let encoder = OneHotEncoder::fit(records, &categorical)?;

        let mut raw = Vec::with_capacity(records.len() * numerical.len());
        for record in records {
            raw.extend(numeric_row(record, &numerical).map_err(AppError::model)?);
        }
        let x_num = DMatrix::from_row_slice(records.len(), numerical.len(), &raw);
        let scaler = StandardScaler::fit(&x_num)?;

        Ok(Self {
            categorical,
            numerical,
            encoder,
            scaler,
        })
    }

    /// Total model input width.
    pub fn n_features(&self) -> usize {
        self.numerical.len() + self.encoder.width()
    }

    /// Column names of the model input, in order.
    pub fn feature_names(&self) -> Vec<String> {
        self.numerical
            .iter()
            .cloned()
            .chain(self.encoder.feature_names().iter().cloned())
            .collect()
    }

    /// Scaled numeric block followed by the one-hot block.
    pub fn transform_row(&self, record: &EncodedRecord) -> Result<Vec<f64>, String> {
        let scaled = self.scaler.transform_row(&numeric_row(record, &self.numerical)?)?;
        let onehot = self.encoder.transform(record, &self.categorical)?;
        let mut row = scaled;
        row.extend(onehot);
        Ok(row)
    }

    pub fn transform(&self, records: &[EncodedRecord]) -> Result<DMatrix<f64>, AppError> {
        let mut data = Vec::with_capacity(records.len() * self.n_features());
        for record in records {
            data.extend(self.transform_row(record).map_err(AppError::model)?);
        }
        Ok(DMatrix::from_row_slice(records.len(), self.n_features(), &data))
    }
}

fn numeric_row(record: &EncodedRecord, fields: &[String]) -> Result<Vec<f64>, String> {
    fields
        .iter()
        .map(|field| {
            record
                .get(field)
                .and_then(|v| v.as_number())
                .ok_or_else(|| format!("numeric field '{field}' missing or not a number"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;

    fn record(age: f64, slope: &str) -> EncodedRecord {
        EncodedRecord {
            values: vec![
                ("Age", FieldValue::Number(age)),
                ("ST_Slope", FieldValue::Text(slope.to_string())),
            ],
        }
    }

    #[test]
    fn numeric_block_precedes_onehot_block() {
        let records = vec![record(40.0, "Up"), record(60.0, "Flat")];
        let pre = Preprocessor::fit(&records, vec!["ST_Slope".into()], vec!["Age".into()]).unwrap();
        assert_eq!(pre.n_features(), 3);
        assert_eq!(
            pre.feature_names(),
            vec!["Age", "ST_Slope=Flat", "ST_Slope=Up"]
        );

        let row = pre.transform_row(&record(60.0, "Up")).unwrap();
        assert!((row[0] - 1.0).abs() < 1e-12);
        assert_eq!(&row[1..], &[0.0, 1.0]);
    }

    #[test]
    fn transform_builds_row_major_matrix() {
        let records = vec![record(40.0, "Up"), record(60.0, "Flat")];
        let pre = Preprocessor::fit(&records, vec!["ST_Slope".into()], vec!["Age".into()]).unwrap();
        let x = pre.transform(&records).unwrap();
        assert_eq!(x.shape(), (2, 3));
        assert!((x[(0, 0)] + 1.0).abs() < 1e-12);
        assert_eq!(x[(1, 1)], 1.0);
    }

    #[test]
    fn missing_numeric_field_is_an_error() {
        let records = vec![record(40.0, "Up")];
        let pre = Preprocessor::fit(&records, vec!["ST_Slope".into()], vec!["Age".into()]).unwrap();
        let bad = EncodedRecord {
            values: vec![("ST_Slope", FieldValue::Text("Up".into()))],
        };
        assert!(pre.transform_row(&bad).is_err());
    }
}
