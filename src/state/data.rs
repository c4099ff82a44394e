//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the ingestion layer, the generation controller and the UI layer.

use std::io::Cursor;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use iced::widget::image::Handle;
use mime_guess::Mime;
use thiserror::Error;

/// A decoded, renderable image together with its pixel size
#[derive(Debug, Clone)]
pub struct DisplayImage {
    /// Handle used by iced to render the image
    pub handle: Handle,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl DisplayImage {
    /// Probe the image header for its dimensions and wrap the bytes in a handle.
    ///
    /// Only the header is parsed here; full decoding happens lazily in the renderer.
    pub fn probe(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let (width, height) = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()?
            .into_dimensions()?;

        Ok(Self {
            handle: Handle::from_bytes(bytes.to_vec()),
            width,
            height,
        })
    }
}

/// The photo picked by the user
///
/// Created once per selection by the ingestion layer and never mutated.
#[derive(Debug, Clone)]
pub struct SourceImage {
    /// Raw file contents
    pub bytes: Arc<[u8]>,
    /// Standard base64 encoding of `bytes`
    pub encoded: String,
    /// MIME type, always starting with "image/"
    pub media_type: String,
    /// Renderable version of the photo
    pub display: DisplayImage,
}

impl SourceImage {
    /// Build a source image from raw bytes that were already validated as an image.
    pub fn new(bytes: Vec<u8>, media_type: String, display: DisplayImage) -> Self {
        let encoded = STANDARD.encode(&bytes);
        Self {
            bytes: bytes.into(),
            encoded,
            media_type,
            display,
        }
    }
}

/// Why a service payload could not be turned into a result
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// The processed photo returned by the generation service
#[derive(Debug, Clone)]
pub struct GenerationResult {
    /// Base64 image payload exactly as the service returned it
    pub encoded: String,
    /// Renderable version of the payload
    pub display: DisplayImage,
}

impl GenerationResult {
    /// Decode a base64 payload and check that it holds an image
    pub fn decode(encoded: String) -> Result<Self, PayloadError> {
        let bytes = STANDARD.decode(encoded.as_bytes())?;
        let display = DisplayImage::probe(&bytes)?;
        Ok(Self { encoded, display })
    }
}

/// Return the subtype of a media type ("image/png" -> "png"), ignoring parameters.
pub fn media_subtype(media_type: &str) -> Option<String> {
    let mime: Mime = media_type.parse().ok()?;
    let subtype = mime.subtype().as_str();
    if subtype.is_empty() {
        None
    } else {
        Some(subtype.to_string())
    }
}
