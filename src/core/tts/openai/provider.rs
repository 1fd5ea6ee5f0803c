//! OpenAI TTS provider ("service4").
//!
//! Calls the audio speech endpoint, which answers synchronously with the
//! encoded audio body. Input length is capped per model and speed is clamped
//! to the API's accepted range. Without an API key the adapter serves
//! fallback audio.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use super::config::{OpenAiModel, OpenAiVoice};
use crate::core::tts::base::{
    HealthReport, ProviderDescriptor, ProviderStatus, SynthesisMode, SynthesisRequest,
    SynthesisResult, TtsAdapter, TtsError, TtsResult, VendorSettings,
};
use crate::core::tts::fallback::{self, FallbackProfile};

/// OpenAI audio speech endpoint.
pub const OPENAI_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

/// OpenAI TTS always outputs 24 kHz audio.
const OPENAI_SAMPLE_RATE: u32 = 24000;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
}

/// OpenAI TTS adapter.
pub struct OpenAiTts {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
    initialized: bool,
    fallback: FallbackProfile,
}

impl OpenAiTts {
    pub fn new(settings: &VendorSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| OPENAI_TTS_URL.to_string()),
            http: reqwest::Client::new(),
            initialized: false,
            fallback: FallbackProfile::new(OPENAI_SAMPLE_RATE),
        }
    }

    fn configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn status(&self) -> ProviderStatus {
        if self.configured() {
            ProviderStatus::Healthy
        } else {
            ProviderStatus::Unconfigured
        }
    }

    async fn call_vendor(
        &self,
        api_key: &str,
        text: &str,
        model: OpenAiModel,
        voice: OpenAiVoice,
        speed: f64,
    ) -> TtsResult<Vec<u8>> {
        let body = SpeechRequest {
            model: model.as_str(),
            input: text,
            voice: voice.as_str(),
            response_format: "wav",
            // The API default; only sent when the caller changed it.
            speed: (speed != 1.0).then_some(speed),
        };

        debug!(model = %model, voice = %voice, speed, "openai speech request");

        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Transport(format!("openai unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TtsError::Vendor(format!(
                "openai API error {status}: {detail}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TtsError::Transport(format!("openai audio read failed: {e}")))?;

        if audio.is_empty() {
            return Err(TtsError::Decode("openai returned empty audio".to_string()));
        }

        Ok(audio.to_vec())
    }
}

#[async_trait]
impl TtsAdapter for OpenAiTts {
    async fn initialize(&mut self) -> TtsResult<()> {
        if self.initialized {
            return Ok(());
        }
        if self.configured() {
            info!("OpenAI TTS configured");
        } else {
            info!("OpenAI API key not set, using fallback synthesis");
        }
        self.initialized = true;
        Ok(())
    }

    async fn health_check(&self) -> HealthReport {
        HealthReport {
            status: self.status(),
            detail: serde_json::json!({
                "name": "OpenAI TTS",
                "initialized": self.initialized,
                "api_key_configured": self.configured(),
                "mode": if self.configured() { "real" } else { "simulation" },
                "models": [OpenAiModel::Tts1.as_str(), OpenAiModel::Tts1Hd.as_str()],
            }),
        }
    }

    fn describe(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: "service4".to_string(),
            name: "OpenAI TTS".to_string(),
            description: "OpenAI speech synthesis with natural multi-lingual voices".to_string(),
            languages: ["zh", "en", "es", "fr", "de", "it", "pt", "ru", "ja", "ko"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            features: ["text_to_speech", "multi_language", "high_quality", "natural_voice"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            status: self.status(),
        }
    }

    fn info(&self) -> serde_json::Value {
        serde_json::json!({
            "model_type": "OpenAI TTS API",
            "sample_rate": OPENAI_SAMPLE_RATE,
            "voices": OpenAiVoice::all()
                .iter()
                .map(|v| serde_json::json!({
                    "id": v.as_str(),
                    "description": v.description(),
                }))
                .collect::<Vec<_>>(),
            "models": [
                {"id": OpenAiModel::Tts1.as_str(), "max_chars": OpenAiModel::Tts1.max_chars()},
                {"id": OpenAiModel::Tts1Hd.as_str(), "max_chars": OpenAiModel::Tts1Hd.max_chars()},
            ],
            "api_status": if self.configured() { "configured" } else { "not_configured" },
        })
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> TtsResult<SynthesisResult> {
        let voice = OpenAiVoice::from_str_or_default(request.param_str("voice").unwrap_or(""));
        let model = OpenAiModel::from_str_or_default(request.param_str("model").unwrap_or(""));
        let speed = request.param_f64("speed").unwrap_or(1.0).clamp(0.25, 4.0);

        let char_count = request.text.chars().count();
        if char_count > model.max_chars() {
            return Err(TtsError::InvalidRequest(format!(
                "text length {char_count} exceeds the {} character limit of {}",
                model.max_chars(),
                model
            )));
        }

        let (audio, mode) = match &self.api_key {
            Some(api_key) => {
                let audio = self
                    .call_vendor(api_key, &request.text, model, voice, speed)
                    .await?;
                (audio, SynthesisMode::Real)
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
                (audio, SynthesisMode::Simulation)
            }
        };

        let duration = SynthesisResult::estimate_duration(audio.len(), OPENAI_SAMPLE_RATE);
        Ok(SynthesisResult {
            audio,
            sample_rate_hz: OPENAI_SAMPLE_RATE,
            duration_seconds: duration,
            provider_id: "service4".to_string(),
            mode,
            echoed: serde_json::json!({
                "voice": voice.as_str(),
                "model": model.as_str(),
                "speed": speed,
                "language": request.language,
                "text_length": char_count,
            }),
        })
    }
}
