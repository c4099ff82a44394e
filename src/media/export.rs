//! Download of the processed photo
//!
//! The result is turned into a self-contained `data:` locator, then written
//! wherever the user points the native save dialog.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

use crate::state::data::media_subtype;

/// Prefix of every downloaded file name
const FILE_PREFIX: &str = "focus-ai-depth-effect";

/// A result ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Directly renderable `data:<media type>;base64,<payload>` locator
    pub locator: String,
    /// Suggested file name, e.g. `focus-ai-depth-effect-1700000000000.png`
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("there is no generated image to download")]
    NoResult,
    #[error("invalid data locator: {0}")]
    InvalidLocator(String),
    #[error("failed to write {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },
}

/// Build the data locator for a base64 payload
pub fn data_uri(media_type: &str, payload: &str) -> String {
    format!("data:{};base64,{}", media_type, payload)
}

/// Timestamped file name with an extension taken from the media subtype
pub fn file_name(media_type: &str, timestamp_ms: i64) -> String {
    let extension = media_subtype(media_type).unwrap_or_else(|| "png".to_string());
    format!("{}-{}.{}", FILE_PREFIX, timestamp_ms, extension)
}

pub fn prepare(media_type: &str, payload: &str, timestamp_ms: i64) -> Export {
    Export {
        locator: data_uri(media_type, payload),
        file_name: file_name(media_type, timestamp_ms),
    }
}

/// Decode the bytes embedded in a base64 `data:` locator
pub fn decode_locator(locator: &str) -> Result<Vec<u8>, ExportError> {
    let rest = locator
        .strip_prefix("data:")
        .ok_or_else(|| ExportError::InvalidLocator("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| ExportError::InvalidLocator("missing payload separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(ExportError::InvalidLocator("payload is not base64".to_string()));
    }

    STANDARD
        .decode(payload)
        .map_err(|e| ExportError::InvalidLocator(e.to_string()))
}

/// Ask the user where to save the export and write it there
///
/// Returns `Ok(None)` when the dialog was cancelled.
pub async fn save_as(export: Export) -> Result<Option<PathBuf>, ExportError> {
    let bytes = decode_locator(&export.locator)?;

    let Some(handle) = rfd::AsyncFileDialog::new()
        .set_title("Save Depth Effect")
        .set_file_name(&export.file_name)
        .save_file()
        .await
    else {
        return Ok(None);
    };

    let path = handle.path().to_path_buf();
    write_export(&path, &bytes).await?;
    Ok(Some(path))
}

async fn write_export(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ExportError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    tracing::info!("💾 Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
