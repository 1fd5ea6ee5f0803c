//! Eugenes TTS provider ("service5").
//!
//! Chinese-optimized synthesis with a per-language voice catalog and an
//! explicit emotion vocabulary. The API takes one JSON request and answers
//! with WAV bytes. Without an API key the adapter serves fallback audio,
//! paced slightly slower than the other providers to match Mandarin speech.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::tts::base::{
    HealthReport, ProviderDescriptor, ProviderStatus, SynthesisMode, SynthesisRequest,
    SynthesisResult, TtsAdapter, TtsError, TtsResult, VendorSettings,
};
use crate::core::tts::fallback::{self, FallbackProfile};

/// Default Eugenes synthesis endpoint.
pub const EUGENES_TTS_URL: &str = "https://api.eugenes.ai/v1/tts";

/// Output sample rate of the Eugenes voices.
const EUGENES_SAMPLE_RATE: u32 = 22050;

/// One catalog voice.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct VoiceEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub gender: &'static str,
}

/// Mandarin voices.
pub const ZH_VOICES: &[VoiceEntry] = &[
    VoiceEntry { id: "zh-female-sweet", name: "甜美女聲", gender: "female" },
    VoiceEntry { id: "zh-male-warm", name: "溫暖男聲", gender: "male" },
    VoiceEntry { id: "zh-female-professional", name: "專業女聲", gender: "female" },
    VoiceEntry { id: "zh-male-deep", name: "低沉男聲", gender: "male" },
    VoiceEntry { id: "zh-child-cute", name: "可愛童聲", gender: "child" },
];

/// Taiwanese voices.
pub const ZH_TW_VOICES: &[VoiceEntry] = &[
    VoiceEntry { id: "tw-female-gentle", name: "溫柔台語", gender: "female" },
    VoiceEntry { id: "tw-male-friendly", name: "親切台語", gender: "male" },
];

/// English voices.
pub const EN_VOICES: &[VoiceEntry] = &[
    VoiceEntry { id: "en-female-clear", name: "清晰英文女聲", gender: "female" },
    VoiceEntry { id: "en-male-standard", name: "標準英文男聲", gender: "male" },
];

/// Emotion vocabulary the API accepts.
pub const EMOTIONS: &[&str] = &[
    "neutral", "happy", "sad", "angry", "excited", "calm", "gentle", "serious",
];

/// Catalog for a language tag; unknown languages get the Mandarin catalog.
pub fn voices_for(language: &str) -> &'static [VoiceEntry] {
    match language {
        "zh-tw" | "zh-TW" => ZH_TW_VOICES,
        "en" => EN_VOICES,
        _ => ZH_VOICES,
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    voice_id: &'a str,
    emotion: &'a str,
    speed: f64,
    pitch: f64,
    energy: f64,
    language: &'a str,
    format: &'static str,
    sample_rate: u32,
    enable_emotion_control: bool,
    enable_prosody_control: bool,
}

/// Eugenes TTS adapter.
pub struct EugenesTts {
    api_key: Option<String>,
    base_url: String,
    http: reqwest::Client,
    initialized: bool,
    fallback: FallbackProfile,
}

impl EugenesTts {
    pub fn new(settings: &VendorSettings) -> Self {
        // Mandarin pacing: longer per-character duration and floor than the
        // other providers' fallback profiles.
        let mut fallback = FallbackProfile::new(EUGENES_SAMPLE_RATE);
        fallback.seconds_per_char = 0.18;
        fallback.min_duration_seconds = 2.5;

        Self {
            api_key: settings.api_key.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| EUGENES_TTS_URL.to_string()),
            http: reqwest::Client::new(),
            initialized: false,
            fallback,
        }
    }

    fn status(&self) -> ProviderStatus {
        if self.api_key.is_some() {
            ProviderStatus::Healthy
        } else {
            ProviderStatus::Unconfigured
        }
    }

    async fn call_vendor(
        &self,
        api_key: &str,
        text: &str,
        voice_id: &str,
        emotion: &str,
        speed: f64,
        pitch: f64,
        energy: f64,
        language: &str,
    ) -> TtsResult<Vec<u8>> {
        let body = SpeechRequest {
            text,
            voice_id,
            emotion,
            speed,
            pitch,
            energy,
            language,
            format: "wav",
            sample_rate: EUGENES_SAMPLE_RATE,
            enable_emotion_control: true,
            enable_prosody_control: true,
        };

        debug!(voice = voice_id, emotion, language, "eugenes synthesis request");

        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Transport(format!("eugenes unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TtsError::Vendor(format!(
                "eugenes API error {status}: {detail}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TtsError::Transport(format!("eugenes audio read failed: {e}")))?;

        if audio.is_empty() {
            return Err(TtsError::Decode("eugenes returned empty audio".to_string()));
        }

        Ok(audio.to_vec())
    }
}

#[async_trait]
impl TtsAdapter for EugenesTts {
    async fn initialize(&mut self) -> TtsResult<()> {
        if self.initialized {
            return Ok(());
        }
        match &self.api_key {
            Some(_) => info!(base_url = %self.base_url, "Eugenes TTS configured"),
            None => info!("Eugenes API key not set, using fallback synthesis"),
        }
        self.initialized = true;
        Ok(())
    }

    async fn health_check(&self) -> HealthReport {
        HealthReport {
            status: self.status(),
            detail: serde_json::json!({
                "name": "Eugenes TTS",
                "initialized": self.initialized,
                "api_key_configured": self.api_key.is_some(),
                "mode": if self.api_key.is_some() { "real" } else { "simulation" },
                "specialization": "chinese_tts",
            }),
        }
    }

    fn describe(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: "service5".to_string(),
            name: "Eugenes TTS".to_string(),
            description: "Chinese-optimized synthesis with voice cloning and emotion control"
                .to_string(),
            languages: ["zh", "zh-tw", "en"].iter().map(|s| s.to_string()).collect(),
            features: [
                "text_to_speech",
                "voice_cloning",
                "emotion_control",
                "chinese_optimized",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            status: self.status(),
        }
    }

    fn info(&self) -> serde_json::Value {
        serde_json::json!({
            "model_type": "Eugenes TTS API",
            "sample_rate": EUGENES_SAMPLE_RATE,
            "voices": {
                "zh": ZH_VOICES,
                "zh-tw": ZH_TW_VOICES,
                "en": EN_VOICES,
            },
            "emotions": EMOTIONS,
            "specialization": "chinese_tts",
            "api_status": if self.api_key.is_some() { "configured" } else { "not_configured" },
        })
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> TtsResult<SynthesisResult> {
        let voice_id = request
            .param_str("voice_id")
            .unwrap_or_else(|| voices_for(&request.language)[0].id);
        let emotion = request.param_str("emotion").unwrap_or("neutral");
        let speed = request.param_f64("speed").unwrap_or(1.0).clamp(0.5, 2.0);
        let pitch = request.param_f64("pitch").unwrap_or(0.0).clamp(-1.0, 1.0);
        let energy = request.param_f64("energy").unwrap_or(1.0).clamp(0.5, 1.5);

        let (audio, mode) = match &self.api_key {
            Some(api_key) => {
                let audio = self
                    .call_vendor(
                        api_key,
                        &request.text,
                        voice_id,
                        emotion,
                        speed,
                        pitch,
                        energy,
                        &request.language,
                    )
                    .await?;
                (audio, SynthesisMode::Real)
            }
            None => {
                let audio = fallback::synthesize_fallback(
                    &request.text,
                    &request.language,
                    emotion,
                    energy,
                    &self.fallback,
                )?;
                (audio, SynthesisMode::Simulation)
            }
        };

        let duration = SynthesisResult::estimate_duration(audio.len(), EUGENES_SAMPLE_RATE);
        Ok(SynthesisResult {
            audio,
            sample_rate_hz: EUGENES_SAMPLE_RATE,
            duration_seconds: duration,
            provider_id: "service5".to_string(),
            mode,
            echoed: serde_json::json!({
                "voice_id": voice_id,
                "emotion": emotion,
                "speed": speed,
                "pitch": pitch,
                "energy": energy,
                "language": request.language,
                "text_length": request.text.chars().count(),
            }),
        })
    }
}
