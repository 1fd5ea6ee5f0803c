//! Service banner and health endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;

use crate::state::AppState;

/// `GET /` - service banner.
pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "voicegate TTS gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "services": state.registry.provider_ids(),
        "status": "running",
    }))
}

/// `GET /health` - probes every provider.
///
/// The gateway reports `healthy` when each provider is healthy or
/// deliberately unconfigured, `degraded` otherwise. Always 200; callers
/// inspect the body.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let (all_ok, reports) = state.registry.health().await;

    let services: serde_json::Map<String, serde_json::Value> = reports
        .into_iter()
        .map(|(id, report)| {
            (
                id,
                serde_json::json!({
                    "status": report.status.as_str(),
                    "detail": report.detail,
                }),
            )
        })
        .collect();

    Json(serde_json::json!({
        "status": if all_ok { "healthy" } else { "degraded" },
        "services": services,
    }))
}
