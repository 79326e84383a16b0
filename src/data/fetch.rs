//! Dataset download over HTTP.

use std::fs;
use std::path::Path;

use log::info;
use reqwest::blocking::Client;

use crate::error::AppError;

/// Download `url` to `path` unless `path` already exists.
///
/// Returns `true` when a download happened.
pub fn ensure_dataset(url: &str, path: &Path) -> Result<bool, AppError> {
    if path.exists() {
        return Ok(false);
    }

    info!("downloading dataset from {url}");
    let resp = Client::new()
        .get(url)
        .send()
        .map_err(|e| AppError::config(format!("Failed to fetch dataset '{url}': {e}")))?;
    if !resp.status().is_success() {
        return Err(AppError::config(format!(
            "Dataset download failed: HTTP {} for '{url}'.",
            resp.status()
        )));
    }
    let body = resp
        .bytes()
        .map_err(|e| AppError::config(format!("Failed to read dataset body: {e}")))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::config(format!("Failed to create '{}': {e}", parent.display())))?;
    }
    fs::write(path, &body)
        .map_err(|e| AppError::config(format!("Failed to write dataset '{}': {e}", path.display())))?;

    info!("saved {} bytes to {}", body.len(), path.display());
    Ok(true)
}
