pub mod aten;
mod base;
pub mod edge;
pub mod eugenes;
pub mod fallback;
mod job;
pub mod minimax;
pub mod openai;
mod rate_limit;
mod registry;

use std::sync::Arc;

pub use aten::{ATEN_BASE_URL, AtenTts, VoiceModel};
pub use base::{
    AudioFormat, HealthReport, ProviderDescriptor, ProviderStatus, SynthesisMode,
    SynthesisRequest, SynthesisResult, TtsAdapter, TtsError, TtsResult, VendorSettings,
};
pub use edge::{EN_VOICES, EdgeTts, ZH_VOICES};
pub use eugenes::{EUGENES_TTS_URL, EugenesTts};
pub use fallback::{FallbackProfile, synthesize_fallback};
pub use job::{JobSnapshot, JobState, SynthesisJobPoller};
pub use minimax::{MINIMAX_TTS_URL, MinimaxTts};
pub use openai::{OPENAI_TTS_URL, OpenAiModel, OpenAiTts, OpenAiVoice};
pub use rate_limit::RateLimiter;
pub use registry::{DispatchOutcome, ProviderRegistry};

use crate::config::ServerConfig;

/// Build the registry with all five providers, initialized from config.
///
/// Providers without credentials still register; they report themselves as
/// unconfigured and serve fallback audio.
pub async fn build_registry(config: &ServerConfig) -> ProviderRegistry {
    let rate_limiter = Arc::new(RateLimiter::new(config.provider_min_interval));

    let mut registry = ProviderRegistry::new(config.audio_dir.clone());
    registry.register(Box::new(EdgeTts::new(&config.edge))).await;
    registry
        .register(Box::new(MinimaxTts::new(&config.minimax)))
        .await;
    registry
        .register(Box::new(AtenTts::new(&config.aten, rate_limiter.clone())))
        .await;
    registry
        .register(Box::new(OpenAiTts::new(&config.openai)))
        .await;
    registry
        .register(Box::new(EugenesTts::new(&config.eugenes)))
        .await;
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_build_registry_registers_all_providers() {
        let mut config = ServerConfig::default();
        let dir = tempfile::tempdir().unwrap();
        config.audio_dir = dir.path().to_path_buf();

        let registry = build_registry(&config).await;
        assert_eq!(
            registry.provider_ids(),
            vec!["service1", "service2", "service3", "service4", "service5"]
        );
    }

    #[tokio::test]
    async fn test_bare_registry_is_healthy() {
        let mut config = ServerConfig::default();
        let dir = tempfile::tempdir().unwrap();
        config.audio_dir = dir.path().to_path_buf();

        // No credentials at all: everything unconfigured, overall still ok.
        let registry = build_registry(&config).await;
        let (ok, reports) = registry.health().await;
        assert!(ok);
        assert!(
            reports
                .values()
                .all(|r| r.status == ProviderStatus::Unconfigured)
        );
    }
}
