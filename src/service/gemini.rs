//! Gemini image editing client
//!
//! Sends the photo inline together with a fixed editing instruction to
//! `models/{model}:generateContent` and returns the first inline image of
//! the first candidate, decoded.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{DepthEffectService, ServiceError};
use crate::config::Settings;
use crate::state::data::GenerationResult;

/// Instruction sent alongside every photo
pub const DEPTH_EFFECT_PROMPT: &str = "Edit this image to apply a professional, cinematic \
depth-of-field (bokeh) effect. Keep the main foreground subject (person, animal, or object) \
perfectly sharp and in focus. Blur the background realistically to separate the subject from \
the surroundings. Do not change the subject's appearance, pose, or lighting significantly, \
just apply the focus effect.";

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Content<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart<'a> {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: Blob<'a> },
    Text { text: &'a str },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ResponsePart {
    inline_data: Option<ResponseBlob>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseBlob {
    data: String,
}

impl GenerateContentResponse {
    /// First non-empty inline image of the first candidate
    fn into_image(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|part| part.inline_data)
            .map(|blob| blob.data)
            .find(|data| !data.is_empty())
    }
}

/// Client for the Gemini `generateContent` API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(settings: &Settings) -> Self {
        Self {
            http: Client::new(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            endpoint: settings.endpoint.clone(),
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[async_trait]
impl DepthEffectService for GeminiClient {
    async fn generate(&self, payload: &str, media_type: &str) -> Result<GenerationResult, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or(ServiceError::MissingApiKey)?;

        let body = GenerateContentRequest {
            contents: Content {
                parts: vec![
                    RequestPart::InlineData {
                        inline_data: Blob {
                            mime_type: media_type,
                            data: payload,
                        },
                    },
                    RequestPart::Text {
                        text: DEPTH_EFFECT_PROMPT,
                    },
                ],
            },
        };

        tracing::debug!("🌐 POST {} ({} bytes encoded)", self.url(), payload.len());

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let image = parsed.into_image().ok_or(ServiceError::NoImage)?;

        GenerationResult::decode(image).map_err(|e| ServiceError::InvalidImage(e.to_string()))
    }
}
