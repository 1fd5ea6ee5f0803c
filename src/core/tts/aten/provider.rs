//! ATEN AIVoice provider ("service3").
//!
//! ATEN synthesis is asynchronous: a POSTed SSML document yields a synthesis
//! id, which is polled until it resolves to a downloadable artifact. All
//! ATEN endpoints take the account token in the `Authorization` header, and
//! the account is metered at 120 requests per minute, so every outbound call
//! passes through the shared [`RateLimiter`] first. Without a token the
//! adapter serves fallback audio.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::core::tts::base::{
    HealthReport, ProviderDescriptor, ProviderStatus, SynthesisMode, SynthesisRequest,
    SynthesisResult, TtsAdapter, TtsError, TtsResult, VendorSettings,
};
use crate::core::tts::fallback::{self, FallbackProfile};
use crate::core::tts::job::{JobSnapshot, JobState, SynthesisJobPoller};
use crate::core::tts::rate_limit::RateLimiter;

/// Enterprise endpoint; ECPay accounts use `https://www.aivoice.com.tw/atzone`.
pub const ATEN_BASE_URL: &str = "https://www.aivoice.com.tw/business/enterprise";

/// Output sample rate of ATEN voice models.
const ATEN_SAMPLE_RATE: u32 = 22050;

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct SynthesisSubmission<'a> {
    ssml: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    silence_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    is_customized_poly_list_used: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SubmissionReceipt {
    synthesis_id: String,
}

#[derive(Debug, Deserialize)]
struct StatusPayload {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    synthesis_path: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VoiceModel {
    pub model_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

/// The models endpoint answers either a bare array or `{"data": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelsPayload {
    Wrapped { data: Vec<VoiceModel> },
    Bare(Vec<VoiceModel>),
}

impl ModelsPayload {
    fn into_models(self) -> Vec<VoiceModel> {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(models) => models,
        }
    }
}

// =============================================================================
// Provider
// =============================================================================

/// ATEN AIVoice adapter.
pub struct AtenTts {
    api_token: Option<String>,
    base_url: String,
    http: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    poller: SynthesisJobPoller,
    models: Vec<VoiceModel>,
    initialized: bool,
    degraded: bool,
    fallback: FallbackProfile,
}

impl AtenTts {
    pub fn new(settings: &VendorSettings, rate_limiter: Arc<RateLimiter>) -> Self {
        Self {
            api_token: settings.api_key.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| ATEN_BASE_URL.to_string()),
            http: reqwest::Client::new(),
            rate_limiter,
            poller: SynthesisJobPoller::default(),
            models: Vec::new(),
            initialized: false,
            degraded: false,
            fallback: FallbackProfile::new(ATEN_SAMPLE_RATE),
        }
    }

    fn configured(&self) -> bool {
        self.api_token.is_some()
    }

    fn status(&self) -> ProviderStatus {
        if !self.configured() {
            ProviderStatus::Unconfigured
        } else if self.degraded {
            ProviderStatus::Degraded
        } else {
            ProviderStatus::Healthy
        }
    }

    /// Escape the five characters SSML reserves. `&` first so it does not
    /// re-escape the entities produced by the other substitutions.
    fn escape_ssml(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('"', "&quot;")
            .replace('\'', "&apos;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    fn build_ssml(text: &str, voice_name: &str, request: &SynthesisRequest) -> String {
        let escaped = Self::escape_ssml(text);
        let pitch = request.param_f64("pitch").unwrap_or(0.0).clamp(-2.0, 2.0);
        let rate = request.param_f64("rate").unwrap_or(1.0).clamp(0.8, 1.2);
        let volume = request.param_f64("volume").unwrap_or(0.0).clamp(-6.0, 6.0);

        format!(
            concat!(
                r#"<speak xmlns="http://www.w3.org/2001/10/synthesis" version="1.5" xml:lang="{lang}">"#,
                r#"<voice name="{voice}">"#,
                r#"<prosody pitch="{pitch:+.1}st" volume="{volume:+.1}dB" rate="{rate:.1}">"#,
                "{text}",
                "</prosody></voice></speak>"
            ),
            lang = request.language,
            voice = voice_name,
            pitch = pitch,
            volume = volume,
            rate = rate,
            text = escaped,
        )
    }

    async fn load_models(&mut self, api_token: &str) -> TtsResult<()> {
        self.rate_limiter.acquire("service3").await;

        let url = format!("{}/api/v1/models/api_token", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("Authorization", api_token)
            .send()
            .await
            .map_err(|e| TtsError::Transport(format!("aten unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TtsError::Vendor(format!(
                "aten model listing failed {status}: {detail}"
            )));
        }

        let payload: ModelsPayload = response
            .json()
            .await
            .map_err(|e| TtsError::Decode(format!("invalid aten model listing: {e}")))?;

        self.models = payload.into_models();
        info!(count = self.models.len(), "loaded ATEN voice models");
        Ok(())
    }

    /// Submit SSML for synthesis, returning the synthesis id.
    async fn submit(
        &self,
        api_token: &str,
        ssml: &str,
        request: &SynthesisRequest,
    ) -> TtsResult<String> {
        self.rate_limiter.acquire("service3").await;

        let body = SynthesisSubmission {
            ssml,
            silence_scale: request
                .param_f64("silence_scale")
                .map(|s| s.clamp(0.8, 1.2)),
            is_customized_poly_list_used: match request.voice_config.get("use_custom_poly") {
                Some(serde_json::Value::Bool(true)) => Some(true),
                _ => None,
            },
        };

        let url = format!("{}/api/v1/syntheses/api_token", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Transport(format!("aten unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TtsError::Vendor(format!(
                "aten synthesis submission failed {status}: {detail}"
            )));
        }

        let receipt: SubmissionReceipt = response
            .json()
            .await
            .map_err(|e| TtsError::Decode(format!("invalid aten submission receipt: {e}")))?;
        Ok(receipt.synthesis_id)
    }

    /// One status query for a submitted synthesis.
    async fn fetch_status(&self, api_token: &str, synthesis_id: &str) -> TtsResult<JobSnapshot> {
        self.rate_limiter.acquire("service3").await;

        let url = format!("{}/api/v1/syntheses/{synthesis_id}/api_token", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("Authorization", api_token)
            .send()
            .await
            .map_err(|e| TtsError::Transport(format!("aten status query failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TtsError::Transport(format!(
                "aten status query returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let payload: StatusPayload = response
            .json()
            .await
            .map_err(|e| TtsError::Decode(format!("invalid aten status payload: {e}")))?;

        let state = match payload.status.as_deref() {
            Some("Success") => JobState::Success,
            Some("Error") => JobState::Error,
            Some("Waiting") => JobState::Waiting,
            Some("Processing") => JobState::Processing,
            other => {
                return Err(TtsError::Decode(format!(
                    "unknown aten synthesis status: {other:?}"
                )));
            }
        };

        Ok(JobSnapshot {
            state,
            result_locator: payload.synthesis_path,
            error_message: payload.message.or(payload.error),
        })
    }

    /// Download the finished artifact. Distinct from synthesis failure: the
    /// audio exists vendor-side, we just could not retrieve it.
    async fn download(&self, api_token: &str, audio_url: &str) -> TtsResult<Vec<u8>> {
        self.rate_limiter.acquire("service3").await;

        debug!(url = audio_url, "downloading aten audio");
        let response = self
            .http
            .get(audio_url)
            .header("Authorization", api_token)
            .send()
            .await
            .map_err(|e| TtsError::Download(format!("aten audio fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TtsError::Download(format!(
                "aten audio fetch returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::Download(format!("aten audio read failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    async fn call_vendor(
        &self,
        api_token: &str,
        voice_name: &str,
        request: &SynthesisRequest,
    ) -> TtsResult<Vec<u8>> {
        let ssml = Self::build_ssml(&request.text, voice_name, request);
        debug!(voice = voice_name, ssml_len = ssml.len(), "aten synthesis request");

        let synthesis_id = self.submit(api_token, &ssml, request).await?;
        info!(synthesis_id = %synthesis_id, "aten synthesis submitted");

        let audio_url = self
            .poller
            .wait(&synthesis_id, || self.fetch_status(api_token, &synthesis_id))
            .await?;

        self.download(api_token, &audio_url).await
    }

    fn pick_voice<'a>(&'a self, request: &'a SynthesisRequest) -> TtsResult<&'a str> {
        if let Some(name) = request.param_str("voice_name") {
            return Ok(name);
        }
        self.models
            .first()
            .map(|m| m.model_id.as_str())
            .ok_or_else(|| TtsError::Vendor("no aten voice models available".to_string()))
    }
}

#[async_trait]
impl TtsAdapter for AtenTts {
    async fn initialize(&mut self) -> TtsResult<()> {
        if self.initialized {
            return Ok(());
        }
        match self.api_token.clone() {
            Some(token) => {
                if let Err(e) = self.load_models(&token).await {
                    // Token present but the catalog is unreachable; keep the
                    // adapter registered and let later calls retry vendors.
                    error!(error = %e, "failed to load ATEN voice models");
                    self.degraded = true;
                }
            }
            None => info!("ATEN API token not set, using fallback synthesis"),
        }
        self.initialized = true;
        Ok(())
    }

    async fn health_check(&self) -> HealthReport {
        HealthReport {
            status: self.status(),
            detail: serde_json::json!({
                "name": "ATEN AIVoice TTS",
                "initialized": self.initialized,
                "api_token_configured": self.configured(),
                "available_models": self.models.len(),
                "rate_limit_interval_ms": self.rate_limiter.min_interval().as_millis() as u64,
            }),
        }
    }

    fn describe(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: "service3".to_string(),
            name: "ATEN AIVoice TTS".to_string(),
            description: "ATEN AIVoice synthesis with Mandarin, English and Taiwanese voices"
                .to_string(),
            languages: ["zh-TW", "en", "TL", "TB"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            features: ["text_to_speech", "ssml_support", "voice_models"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            status: self.status(),
        }
    }

    fn info(&self) -> serde_json::Value {
        serde_json::json!({
            "model_type": "ATEN AIVoice API",
            "version": "1.1.108",
            "sample_rate": ATEN_SAMPLE_RATE,
            "available_models": self.models,
            "api_status": if self.configured() { "configured" } else { "not_configured" },
        })
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> TtsResult<SynthesisResult> {
        let (audio, mode, voice_name) = match &self.api_token {
            Some(token) => {
                let voice = self.pick_voice(request)?;
                let audio = self.call_vendor(token, voice, request).await?;
                (audio, SynthesisMode::Real, voice.to_string())
            }
            None => {
                let emotion = request.param_str("emotion").unwrap_or("neutral");
                let volume = request.param_f64("volume").unwrap_or(1.0);
                let audio = fallback::synthesize_fallback(
                    &request.text,
                    &request.language,
                    emotion,
                    volume,
                    &self.fallback,
                )?;
                (audio, SynthesisMode::Simulation, "fallback".to_string())
            }
        };

        let duration = SynthesisResult::estimate_duration(audio.len(), ATEN_SAMPLE_RATE);
        Ok(SynthesisResult {
            audio,
            sample_rate_hz: ATEN_SAMPLE_RATE,
            duration_seconds: duration,
            provider_id: "service3".to_string(),
            mode,
            echoed: serde_json::json!({
                "voice_name": voice_name,
                "language": request.language,
                "text_length": request.text.chars().count(),
            }),
        })
    }
}
