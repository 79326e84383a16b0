//! Per-column standardization: `(x - mean) / std`.
//!
//! Statistics are population moments of the training columns. A constant column
//! keeps a scale of 1 so it maps to zero instead of dividing by zero.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: &DMatrix<f64>) -> Result<Self, AppError> {
        if x.nrows() == 0 {
            return Err(AppError::insufficient_data("Cannot fit scaler on zero rows."));
        }
        let mut mean = Vec::with_capacity(x.ncols());
        let mut scale = Vec::with_capacity(x.ncols());
        for col in x.column_iter() {
            let m = col.mean();
            let sd = col.variance().sqrt();
            if !(m.is_finite() && sd.is_finite()) {
                return Err(AppError::model("Non-finite value in numeric training column."));
            }
            mean.push(m);
            scale.push(if sd > 0.0 { sd } else { 1.0 });
        }
        Ok(Self { mean, scale })
    }

    pub fn width(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, String> {
        if row.len() != self.width() {
            return Err(format!(
                "scaler expects {} columns, got {}",
                self.width(),
                row.len()
            ));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_uses_population_moments() {
        let x = DMatrix::from_row_slice(4, 1, &[1.0, 2.0, 3.0, 4.0]);
        let scaler = StandardScaler::fit(&x).unwrap();
        assert!((scaler.mean()[0] - 2.5).abs() < 1e-12);
        assert!((scaler.scale()[0] - 1.25_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 7.0, 2.0, 7.0, 3.0, 7.0]);
        let scaler = StandardScaler::fit(&x).unwrap();
        let row = scaler.transform_row(&[2.0, 7.0]).unwrap();
        assert!(row[0].abs() < 1e-12);
        assert_eq!(row[1], 0.0);
    }

    #[test]
    fn width_mismatch_is_reported() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let scaler = StandardScaler::fit(&x).unwrap();
        assert!(scaler.transform_row(&[1.0]).is_err());
    }
}
