//! Provider registry and synthesis dispatch.
//!
//! The registry owns all adapters for the lifetime of the process. Dispatch
//! validates the request, routes it to the adapter, and persists the audio
//! under the configured directory. Persistence failure is logged and leaves
//! the response without a stored path; the synthesis itself still succeeds.

use std::collections::HashMap;
use std::path::PathBuf;

use futures::future::join_all;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{error, info};
use uuid::Uuid;

use super::base::{
    AudioFormat, HealthReport, ProviderDescriptor, ProviderStatus, SynthesisRequest,
    SynthesisResult, TtsAdapter, TtsError, TtsResult,
};

/// A dispatched synthesis: the adapter's result plus persistence outcome.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub result: SynthesisResult,
    /// Download filename offered to the caller.
    pub filename: String,
    /// Where the audio was stored, if persistence succeeded.
    pub storage_path: Option<String>,
}

/// Owns the adapters and routes synthesis requests to them.
pub struct ProviderRegistry {
    adapters: HashMap<String, Box<dyn TtsAdapter>>,
    audio_dir: PathBuf,
}

impl ProviderRegistry {
    pub fn new(audio_dir: PathBuf) -> Self {
        Self {
            adapters: HashMap::new(),
            audio_dir,
        }
    }

    /// Register an adapter under its descriptor id, initializing it first.
    ///
    /// Initialization failure keeps the adapter registered; it will report
    /// its own degraded status and serve what it can.
    pub async fn register(&mut self, mut adapter: Box<dyn TtsAdapter>) {
        let id = adapter.describe().id;
        if let Err(e) = adapter.initialize().await {
            error!(provider = %id, error = %e, "provider initialization failed");
        } else {
            info!(provider = %id, "provider registered");
        }
        self.adapters.insert(id, adapter);
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn contains(&self, provider_id: &str) -> bool {
        self.adapters.contains_key(provider_id)
    }

    /// Vendor-specific metadata for one provider.
    pub fn provider_info(&self, provider_id: &str) -> TtsResult<serde_json::Value> {
        self.adapters
            .get(provider_id)
            .map(|a| a.info())
            .ok_or_else(|| TtsError::UnknownProvider(provider_id.to_string()))
    }

    /// Descriptors for every registered provider, status re-probed.
    pub async fn list_providers(&self) -> Vec<ProviderDescriptor> {
        let mut descriptors = join_all(self.adapters.values().map(|adapter| async {
            let mut descriptor = adapter.describe();
            descriptor.status = adapter.health_check().await.status;
            descriptor
        }))
        .await;
        descriptors.sort_by(|a, b| a.id.cmp(&b.id));
        descriptors
    }

    /// Probe every provider concurrently. The gateway is healthy when each
    /// provider is either healthy or deliberately unconfigured.
    pub async fn health(&self) -> (bool, HashMap<String, HealthReport>) {
        let probes = join_all(
            self.adapters
                .iter()
                .map(|(id, adapter)| async move { (id.clone(), adapter.health_check().await) }),
        )
        .await;

        let mut reports = HashMap::with_capacity(probes.len());
        let mut all_ok = true;
        for (id, report) in probes {
            all_ok &= matches!(
                report.status,
                ProviderStatus::Healthy | ProviderStatus::Unconfigured
            );
            reports.insert(id, report);
        }
        (all_ok, reports)
    }

    /// Validate, synthesize, persist.
    pub async fn dispatch(&self, mut request: SynthesisRequest) -> TtsResult<DispatchOutcome> {
        if request.text.trim().is_empty() {
            return Err(TtsError::InvalidRequest(
                "text must not be empty".to_string(),
            ));
        }

        // Unknown provider is rejected before any vendor traffic.
        let adapter = self
            .adapters
            .get(&request.provider_id)
            .ok_or_else(|| TtsError::UnknownProvider(request.provider_id.clone()))?;

        // One container format at the boundary, whatever the caller asked for.
        request.format = AudioFormat::Wav;

        let result = adapter.synthesize(&request).await?;
        info!(
            provider = %result.provider_id,
            mode = result.mode.as_str(),
            duration_s = result.duration_seconds,
            bytes = result.audio.len(),
            "synthesis complete"
        );

        let filename = Self::audio_filename(&result.provider_id);
        let storage_path = match self.persist(&filename, &result.audio).await {
            Ok(path) => Some(path),
            Err(e) => {
                // Storage trouble never fails a finished synthesis.
                error!(filename = %filename, error = %e, "failed to persist audio");
                None
            }
        };

        Ok(DispatchOutcome {
            result,
            filename,
            storage_path,
        })
    }

    /// `tts_{provider}_{timestamp}_{suffix}.wav`, unique per call.
    fn audio_filename(provider_id: &str) -> String {
        let format = format_description!("[year][month][day]_[hour][minute][second]");
        let timestamp = OffsetDateTime::now_utc()
            .format(&format)
            .unwrap_or_else(|_| "00000000_000000".to_string());
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        format!("tts_{provider_id}_{timestamp}_{suffix}.wav")
    }

    async fn persist(&self, filename: &str, audio: &[u8]) -> TtsResult<String> {
        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .map_err(|e| TtsError::Storage(e.to_string()))?;

        let path = self.audio_dir.join(filename);
        tokio::fs::write(&path, audio)
            .await
            .map_err(|e| TtsError::Storage(e.to_string()))?;

        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::core::tts::base::SynthesisMode;

    struct StubAdapter {
        id: &'static str,
        status: ProviderStatus,
        fail: bool,
    }

    #[async_trait]
    impl TtsAdapter for StubAdapter {
        async fn initialize(&mut self) -> TtsResult<()> {
            Ok(())
        }

        async fn health_check(&self) -> HealthReport {
            HealthReport {
                status: self.status,
                detail: serde_json::json!({}),
            }
        }

        fn describe(&self) -> ProviderDescriptor {
            ProviderDescriptor {
                id: self.id.to_string(),
                name: self.id.to_string(),
                description: String::new(),
                languages: vec![],
                features: vec![],
                status: self.status,
            }
        }

        fn info(&self) -> serde_json::Value {
            serde_json::json!({"id": self.id})
        }

        async fn synthesize(&self, request: &SynthesisRequest) -> TtsResult<SynthesisResult> {
            if self.fail {
                return Err(TtsError::Vendor("stub failure".to_string()));
            }
            Ok(SynthesisResult {
                audio: vec![0u8; 128],
                sample_rate_hz: 16000,
                duration_seconds: 1.0,
                provider_id: request.provider_id.clone(),
                mode: SynthesisMode::Simulation,
                echoed: serde_json::json!({}),
            })
        }
    }

    async fn registry_with(adapters: Vec<StubAdapter>) -> (ProviderRegistry, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = ProviderRegistry::new(dir.path().to_path_buf());
        for adapter in adapters {
            registry.register(Box::new(adapter)).await;
        }
        (registry, dir)
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let (registry, _dir) = registry_with(vec![StubAdapter {
            id: "service1",
            status: ProviderStatus::Healthy,
            fail: false,
        }])
        .await;

        let result = registry
            .dispatch(SynthesisRequest::new("   ", "service1"))
            .await;
        assert!(matches!(result, Err(TtsError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unknown_provider_rejected() {
        let (registry, _dir) = registry_with(vec![]).await;

        let result = registry
            .dispatch(SynthesisRequest::new("hello", "service9"))
            .await;
        match result {
            Err(TtsError::UnknownProvider(id)) => assert_eq!(id, "service9"),
            other => panic!("expected unknown provider, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_persists_audio() {
        let (registry, dir) = registry_with(vec![StubAdapter {
            id: "service1",
            status: ProviderStatus::Healthy,
            fail: false,
        }])
        .await;

        let outcome = registry
            .dispatch(SynthesisRequest::new("hello", "service1"))
            .await
            .unwrap();

        assert!(outcome.filename.starts_with("tts_service1_"));
        assert!(outcome.filename.ends_with(".wav"));
        let stored = outcome.storage_path.expect("audio should be stored");
        let bytes = std::fs::read(&stored).unwrap();
        assert_eq!(bytes.len(), 128);
        assert!(stored.starts_with(dir.path().to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_vendor_error_propagates() {
        let (registry, _dir) = registry_with(vec![StubAdapter {
            id: "service2",
            status: ProviderStatus::Healthy,
            fail: true,
        }])
        .await;

        let result = registry
            .dispatch(SynthesisRequest::new("hello", "service2"))
            .await;
        assert!(matches!(result, Err(TtsError::Vendor(_))));
    }

    #[tokio::test]
    async fn test_health_tolerates_unconfigured() {
        let (registry, _dir) = registry_with(vec![
            StubAdapter {
                id: "service1",
                status: ProviderStatus::Healthy,
                fail: false,
            },
            StubAdapter {
                id: "service2",
                status: ProviderStatus::Unconfigured,
                fail: false,
            },
        ])
        .await;

        let (ok, reports) = registry.health().await;
        assert!(ok);
        assert_eq!(reports.len(), 2);
    }

    #[tokio::test]
    async fn test_health_flags_degraded_provider() {
        let (registry, _dir) = registry_with(vec![StubAdapter {
            id: "service3",
            status: ProviderStatus::Degraded,
            fail: false,
        }])
        .await;

        let (ok, _) = registry.health().await;
        assert!(!ok);
    }

    #[tokio::test]
    async fn test_list_providers_sorted_by_id() {
        let (registry, _dir) = registry_with(vec![
            StubAdapter {
                id: "service2",
                status: ProviderStatus::Healthy,
                fail: false,
            },
            StubAdapter {
                id: "service1",
                status: ProviderStatus::Unconfigured,
                fail: false,
            },
        ])
        .await;

        let descriptors = registry.list_providers().await;
        assert_eq!(descriptors[0].id, "service1");
        assert_eq!(descriptors[1].id, "service2");
        assert_eq!(descriptors[0].status, ProviderStatus::Unconfigured);
    }
}
