//! Speech synthesis endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{info, warn};

use crate::core::tts::SynthesisRequest;
use crate::errors::AppError;
use crate::state::AppState;

/// Request body for `POST /api/tts/generate`.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Text to synthesize. Required and non-empty.
    pub text: Option<String>,
    /// Target provider id; defaults to service1.
    #[serde(default = "default_service")]
    pub service: String,
    /// Opaque per-provider parameters.
    #[serde(default)]
    pub voice_config: serde_json::Map<String, serde_json::Value>,
    /// Language tag; defaults to zh.
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_service() -> String {
    "service1".to_string()
}

fn default_language() -> String {
    "zh".to_string()
}

/// `POST /api/tts/generate` - synthesize and return binary WAV.
///
/// Metadata travels in response headers so the body stays raw audio:
/// `X-Service`, `X-Duration`, `X-Filename`, `X-Mode`, and `X-Audio-Path`
/// when persistence succeeded.
pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    let text = body
        .text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            crate::core::tts::TtsError::InvalidRequest("text is required".to_string())
        })?;

    info!(
        service = %body.service,
        language = %body.language,
        text_len = text.chars().count(),
        "tts generate request"
    );

    let mut request = SynthesisRequest::new(text, body.service);
    request.voice_config = body.voice_config;
    request.language = body.language;

    let outcome = state.registry.dispatch(request).await?;

    let mut response = (
        [
            (header::CONTENT_TYPE, "audio/wav".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", outcome.filename),
            ),
        ],
        outcome.result.audio,
    )
        .into_response();

    let headers = response.headers_mut();
    insert_metadata_header(headers, "x-service", outcome.result.provider_id.clone());
    insert_metadata_header(
        headers,
        "x-duration",
        format!("{:.3}", outcome.result.duration_seconds),
    );
    insert_metadata_header(headers, "x-filename", outcome.filename.clone());
    insert_metadata_header(headers, "x-mode", outcome.result.mode.as_str().to_string());
    if let Some(path) = &outcome.storage_path {
        insert_metadata_header(headers, "x-audio-path", path.clone());
    }

    Ok(response)
}

/// Attach one metadata header, skipping (with a log line) values that are
/// not valid header bytes, e.g. a storage path with non-ASCII characters.
fn insert_metadata_header(headers: &mut axum::http::HeaderMap, name: &'static str, value: String) {
    match value.parse() {
        Ok(value) => {
            headers.insert(name, value);
        }
        Err(_) => {
            warn!(header = name, value = %value, "metadata header value not encodable, skipping");
        }
    }
}
