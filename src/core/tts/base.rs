//! Core types for the TTS provider layer.
//!
//! This module defines the `TtsAdapter` trait that every backend provider
//! implements, together with the request/result envelope types and the
//! provider error taxonomy shared by the registry and the HTTP handlers.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Errors produced by adapters and the dispatcher.
///
/// A missing credential is deliberately *not* an error: an adapter without
/// credentials initializes into [`ProviderStatus::Unconfigured`] and serves
/// fallback audio instead of failing the caller.
#[derive(Debug, Error)]
pub enum TtsError {
    /// The requested provider id is not registered (caller fault).
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    /// The request itself is invalid, e.g. empty or oversized text (caller fault).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP failure while talking to a vendor.
    #[error("transport error: {0}")]
    Transport(String),

    /// The vendor returned a structured failure; the message is surfaced verbatim.
    #[error("provider rejected request: {0}")]
    Vendor(String),

    /// A polling budget was exhausted before the vendor reached a terminal state.
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The vendor returned a payload we could not interpret.
    #[error("malformed provider payload: {0}")]
    Decode(String),

    /// Synthesis succeeded but downloading the result artifact failed.
    #[error("result download failed: {0}")]
    Download(String),

    /// Persisting a successful synthesis failed. Logged, never flips success.
    #[error("failed to persist audio: {0}")]
    Storage(String),
}

impl TtsError {
    /// Whether this error was caused by the caller rather than the system.
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            TtsError::UnknownProvider(_) | TtsError::InvalidRequest(_)
        )
    }
}

pub type TtsResult<T> = Result<T, TtsError>;

// =============================================================================
// Provider metadata
// =============================================================================

/// Health state of a provider, re-evaluated on each probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderStatus {
    /// Required credentials are absent; the adapter serves fallback audio.
    Unconfigured,
    Healthy,
    Degraded,
    Unhealthy,
}

impl ProviderStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unconfigured => "unconfigured",
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
            Self::Unhealthy => "unhealthy",
        }
    }
}

impl std::fmt::Display for ProviderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of a provider plus its current health state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Provider id used by callers to select a backend (e.g. "service2").
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Short description of the backing vendor.
    pub description: String,
    /// Supported language tags.
    pub languages: Vec<String>,
    /// Capability tags, e.g. "text_to_speech", "multi_language".
    pub features: Vec<String>,
    /// Current health status.
    pub status: ProviderStatus,
}

/// Result of a health probe: status plus vendor-specific detail.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: ProviderStatus,
    /// Free-form diagnostic fields (configured flags, model counts, ...).
    pub detail: serde_json::Value,
}

// =============================================================================
// Synthesis request / result
// =============================================================================

/// Output container format. The gateway exposes exactly one at its boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Wav,
}

impl AudioFormat {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
        }
    }

    #[inline]
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
        }
    }
}

/// Whether a result came from a live vendor or the fallback synthesizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    Real,
    Simulation,
}

impl SynthesisMode {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Simulation => "simulation",
        }
    }
}

/// A single synthesis request, immutable once constructed.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// Text to synthesize. Must be non-empty; per-provider length caps apply.
    pub text: String,
    /// Target provider id.
    pub provider_id: String,
    /// Opaque per-provider parameters; keys are not validated by the core.
    pub voice_config: serde_json::Map<String, serde_json::Value>,
    /// Canonicalized to WAV by the dispatcher regardless of caller input.
    pub format: AudioFormat,
    /// Language tag, e.g. "zh" or "en".
    pub language: String,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, provider_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provider_id: provider_id.into(),
            voice_config: serde_json::Map::new(),
            format: AudioFormat::Wav,
            language: "zh".to_string(),
        }
    }

    /// Fetch a string parameter from the opaque voice config.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.voice_config.get(key).and_then(|v| v.as_str())
    }

    /// Fetch a numeric parameter from the opaque voice config.
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.voice_config.get(key).and_then(|v| v.as_f64())
    }
}

/// A successful synthesis. Ownership moves to the dispatcher, which persists
/// the audio and builds the response envelope.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    /// Encoded WAV bytes.
    pub audio: Vec<u8>,
    /// Sample rate of the PCM payload.
    pub sample_rate_hz: u32,
    /// Estimated duration in seconds. Derived from the byte count, not
    /// authoritative.
    pub duration_seconds: f64,
    /// Id of the provider that produced the audio.
    pub provider_id: String,
    /// Real vendor output or fallback simulation.
    pub mode: SynthesisMode,
    /// Parameters echoed back to the caller (voice, speed, ...).
    pub echoed: serde_json::Value,
}

impl SynthesisResult {
    /// Estimate duration from a WAV byte count assuming 16-bit mono PCM.
    pub fn estimate_duration(byte_len: usize, sample_rate_hz: u32) -> f64 {
        if sample_rate_hz == 0 {
            return 0.0;
        }
        let data_len = byte_len.saturating_sub(44); // RIFF header
        data_len as f64 / (sample_rate_hz as f64 * 2.0)
    }
}

// =============================================================================
// Vendor settings
// =============================================================================

/// Startup configuration handed to an adapter: credentials and endpoint
/// overrides read from the environment once at boot.
///
/// Absent credentials are a valid terminal state, not an error; the adapter
/// initializes as [`ProviderStatus::Unconfigured`].
#[derive(Debug, Clone, Default)]
pub struct VendorSettings {
    /// Primary credential (API key or token).
    pub api_key: Option<String>,
    /// Secondary credential where the vendor needs one (e.g. a group id).
    pub secondary_key: Option<String>,
    /// Override for the vendor base URL.
    pub base_url: Option<String>,
    /// Default model name.
    pub model: Option<String>,
}

// =============================================================================
// Adapter trait
// =============================================================================

/// Capability interface implemented by every backend provider.
///
/// `initialize` is idempotent and must succeed even when credentials are
/// absent — the adapter then reports [`ProviderStatus::Unconfigured`] and
/// `synthesize` falls through to the fallback synthesizer with
/// `mode = simulation` so the registry stays usable.
#[async_trait]
pub trait TtsAdapter: Send + Sync {
    /// Read credentials, probe the vendor where cheap, settle the adapter's
    /// configuration state. Never fails on missing credentials.
    async fn initialize(&mut self) -> TtsResult<()>;

    /// Probe current health. Must not panic or propagate vendor errors.
    async fn health_check(&self) -> HealthReport;

    /// Describe the provider and its current status.
    fn describe(&self) -> ProviderDescriptor;

    /// Vendor-specific metadata (voices, models, endpoint configuration).
    fn info(&self) -> serde_json::Value;

    /// Synthesize speech for the request. Vendor errors are returned as
    /// [`TtsError`] values, never panics.
    async fn synthesize(&self, request: &SynthesisRequest) -> TtsResult<SynthesisResult>;
}
