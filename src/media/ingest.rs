//! Photo ingestion
//!
//! Turns a picked or dropped file into a [`SourceImage`]. Everything that
//! can go wrong here is reported to the user directly and never reaches
//! the generation controller.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::task;

use crate::state::data::{DisplayImage, SourceImage};

/// Extensions offered by the file picker
pub const PICKER_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "gif", "bmp"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error("{} is not an image (media type: {media_type})", .path.display())]
    InvalidMediaType { path: PathBuf, media_type: String },
    #[error("failed to read {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },
    #[error("failed to decode {}: {reason}", .path.display())]
    Decode { path: PathBuf, reason: String },
}

impl IngestError {
    /// Text for the blocking alert shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            IngestError::InvalidMediaType { .. } => "Please upload a valid image file (JPEG, PNG, WEBP)",
            IngestError::Read { .. } | IngestError::Decode { .. } => "Failed to process image file.",
        }
    }
}

/// Guess the media type of a file from its extension
pub fn media_type_for(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Load a photo from disk
///
/// The media type is checked before any bytes are read.
pub async fn load_source_image(path: PathBuf) -> Result<SourceImage, IngestError> {
    let media_type = media_type_for(&path);
    if !media_type.starts_with("image/") {
        tracing::warn!("🚫 Rejected {} ({})", path.display(), media_type);
        return Err(IngestError::InvalidMediaType { path, media_type });
    }

    let bytes = tokio::fs::read(&path).await.map_err(|e| IngestError::Read {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    tracing::info!("📂 Read {} ({} bytes)", path.display(), bytes.len());

    // Header parsing is CPU work, keep it off the UI thread
    let join_path = path.clone();
    task::spawn_blocking(move || {
        let display = DisplayImage::probe(&bytes).map_err(|e| IngestError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(SourceImage::new(bytes, media_type, display))
    })
    .await
    .map_err(|e| IngestError::Read {
        path: join_path,
        reason: format!("Task join error: {}", e),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::tests::png_bytes;

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for(Path::new("photo.PNG")), "image/png");
        assert_eq!(media_type_for(Path::new("photo.jpg")), "image/jpeg");
        assert_eq!(media_type_for(Path::new("notes.txt")), "text/plain");
        assert_eq!(media_type_for(Path::new("no_extension")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_text_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let err = load_source_image(path).await.unwrap_err();

        assert!(matches!(err, IngestError::InvalidMediaType { .. }));
        assert_eq!(err.user_message(), "Please upload a valid image file (JPEG, PNG, WEBP)");
    }

    #[tokio::test]
    async fn test_png_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, png_bytes(6, 4)).unwrap();

        let source = load_source_image(path).await.unwrap();

        assert_eq!(source.media_type, "image/png");
        assert_eq!((source.display.width, source.display.height), (6, 4));
        assert!(!source.encoded.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let err = load_source_image(PathBuf::from("/nonexistent/photo.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Read { .. }));
        assert_eq!(err.user_message(), "Failed to process image file.");
    }

    #[tokio::test]
    async fn test_corrupt_image_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not really a png").unwrap();

        let err = load_source_image(path).await.unwrap_err();
        assert!(matches!(err, IngestError::Decode { .. }));
    }
}
