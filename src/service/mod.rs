/// External depth effect service
///
/// The generation controller only knows the [`DepthEffectService`] trait:
/// an image payload goes in, a decoded processed image comes out.
/// - Gemini image editing client (gemini.rs)

pub mod gemini;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::state::data::GenerationResult;
use crate::state::generation::{GenerationRequest, Ticket};

pub use gemini::GeminiClient;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("no image data found in the response")]
    NoImage,
    #[error("response image is unusable: {0}")]
    InvalidImage(String),
}

/// Applies the depth-of-field effect to an encoded image
#[async_trait]
pub trait DepthEffectService: Send + Sync {
    /// Returns the processed image, already checked to be decodable
    async fn generate(&self, payload: &str, media_type: &str) -> Result<GenerationResult, ServiceError>;
}

/// Run one generation request to completion
///
/// The outcome is tagged with the request's ticket so the controller can
/// tell whether it is still wanted. Errors are flattened to text here; the
/// controller logs them and shows its own fixed message.
pub async fn dispatch(
    service: Arc<dyn DepthEffectService>,
    request: GenerationRequest,
) -> (Ticket, Result<GenerationResult, String>) {
    let outcome = service
        .generate(&request.payload, &request.media_type)
        .await
        .map_err(|e| e.to_string());
    (request.ticket, outcome)
}
