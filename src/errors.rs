//! HTTP error mapping.
//!
//! Wraps the provider error taxonomy into axum responses. Caller faults map
//! to 400, vendor and transport trouble to 502, exhausted polling budgets to
//! 504, and storage failures to 500. Every response body is a JSON object
//! with a single `error` field.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::core::tts::TtsError;

/// Error type returned by all HTTP handlers.
#[derive(Debug)]
pub struct AppError(pub TtsError);

impl From<TtsError> for AppError {
    fn from(e: TtsError) -> Self {
        Self(e)
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            TtsError::UnknownProvider(_) | TtsError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            TtsError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            TtsError::Transport(_)
            | TtsError::Vendor(_)
            | TtsError::Decode(_)
            | TtsError::Download(_) => StatusCode::BAD_GATEWAY,
            TtsError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_faults_map_to_400() {
        assert_eq!(
            AppError(TtsError::UnknownProvider("x".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError(TtsError::InvalidRequest("empty".into())).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_vendor_trouble_maps_to_502() {
        assert_eq!(
            AppError(TtsError::Transport("refused".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError(TtsError::Vendor("rejected".into())).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_timeout_maps_to_504() {
        assert_eq!(
            AppError(TtsError::Timeout(std::time::Duration::from_secs(300))).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
