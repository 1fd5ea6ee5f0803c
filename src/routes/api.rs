use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{health, services, tts};
use crate::state::AppState;

/// Create the full application router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .route("/api/services", get(services::list_services))
        .route("/api/tts/generate", post(tts::generate))
        .route("/api/tts/services/{service_id}/info", get(services::service_info))
        .layer(TraceLayer::new_for_http())
}
