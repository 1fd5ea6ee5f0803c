//! Shared application state.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::core::tts::{ProviderRegistry, build_registry};

/// State shared by all HTTP handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub registry: ProviderRegistry,
}

impl AppState {
    /// Build the state, registering and initializing all providers.
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let registry = build_registry(&config).await;
        Arc::new(Self { config, registry })
    }
}
