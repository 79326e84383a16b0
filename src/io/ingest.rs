//! CSV ingest and normalization.
//!
//! Turns the heart dataset CSV into encoded records + labels that are safe to
//! train on.
//!
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (rows keep file order)

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{
    BinaryPolicy, DatasetStats, EncodedRecord, FieldValue, PatientRecord, REQUIRED_FIELDS, TARGET_COLUMN,
};
use crate::error::AppError;
use crate::features::encode_record;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: encoded records, labels, and what was skipped.
#[derive(Debug, Clone)]
pub struct LabeledData {
    pub records: Vec<EncodedRecord>,
    pub labels: Vec<u8>,
    /// Feature columns in file order (target excluded, unknown columns dropped).
    pub columns: Vec<String>,
    pub stats: DatasetStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load the dataset CSV from disk.
pub fn load_dataset(path: &Path) -> Result<LabeledData, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::config(format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_dataset(file)
}

/// Parse the dataset CSV from any reader.
pub fn read_dataset<R: Read>(reader: R) -> Result<LabeledData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let raw_headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let headers: StringRecord = raw_headers.iter().map(normalize_header_name).collect();
    let header_map = build_header_map(&headers);

    ensure_required_columns_exist(&header_map)?;
    let target_idx = header_map[TARGET_COLUMN];

    let columns: Vec<String> = headers
        .iter()
        .filter(|name| REQUIRED_FIELDS.iter().any(|f| f == name))
        .map(str::to_string)
        .collect();

    let mut records = Vec::new();
    let mut labels = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let row = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&row, &headers, target_idx) {
            Ok((record, label)) => {
                records.push(record);
                labels.push(label);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    if records.is_empty() {
        return Err(AppError::insufficient_data("No valid rows remain after validation."));
    }

    let n_positive = labels.iter().filter(|&&y| y == 1).count();
    let stats = DatasetStats {
        n_rows: records.len(),
        n_positive,
        n_negative: records.len() - n_positive,
    };

    Ok(LabeledData {
        records,
        labels,
        columns,
        stats,
        row_errors,
        rows_read,
    })
}

/// Split feature columns by value type: text columns are categorical, columns
/// that are numeric in every record are numerical. File order is preserved.
pub fn partition_fields(columns: &[String], records: &[EncodedRecord]) -> (Vec<String>, Vec<String>) {
    let mut categorical = Vec::new();
    let mut numerical = Vec::new();
    for column in columns {
        let all_numeric = records
            .iter()
            .all(|r| matches!(r.get(column), Some(FieldValue::Number(_))));
        if all_numeric {
            numerical.push(column.clone());
        } else {
            categorical.push(column.clone());
        }
    }
    (categorical, numerical)
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.to_string(), idx))
        .collect()
}

fn ensure_required_columns_exist(header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing: Vec<&str> = REQUIRED_FIELDS
        .iter()
        .chain(std::iter::once(&TARGET_COLUMN))
        .filter(|name| !header_map.contains_key(**name))
        .copied()
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::config(format!(
            "Missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

fn parse_row(
    row: &StringRecord,
    headers: &StringRecord,
    target_idx: usize,
) -> Result<(EncodedRecord, u8), String> {
    let label = match row.get(target_idx) {
        Some("0") => 0,
        Some("1") => 1,
        Some(other) => return Err(format!("Invalid `{TARGET_COLUMN}` value '{other}' (expected 0 or 1).")),
        None => return Err(format!("Missing `{TARGET_COLUMN}` value.")),
    };

    let patient: PatientRecord = row
        .deserialize(Some(headers))
        .map_err(|e| format!("Invalid row: {e}"))?;
    let encoded = encode_record(&patient, BinaryPolicy::Strict).map_err(|e| e.to_string())?;

    Ok((encoded, label))
}
