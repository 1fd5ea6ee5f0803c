//! Provider catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::core::tts::{ProviderDescriptor, TtsError};
use crate::state::AppState;

/// `GET /api/services` - descriptors for every registered provider, as a
/// bare array ordered by id.
pub async fn list_services(State(state): State<Arc<AppState>>) -> Json<Vec<ProviderDescriptor>> {
    Json(state.registry.list_providers().await)
}

/// `GET /api/tts/services/{id}/info` - vendor metadata for one provider.
pub async fn service_info(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<String>,
) -> Response {
    match state.registry.provider_info(&service_id) {
        Ok(info) => Json(serde_json::json!({
            "service": service_id,
            "info": info,
        }))
        .into_response(),
        Err(TtsError::UnknownProvider(id)) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown service '{id}'") })),
        )
            .into_response(),
        Err(e) => crate::errors::AppError(e).into_response(),
    }
}
