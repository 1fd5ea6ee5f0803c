//! EdgeTTS relay provider ("service1").
//!
//! Synthesizes through a self-hosted relay in front of the free Microsoft
//! Edge neural voices. The relay accepts a plain JSON request and answers
//! with WAV bytes. Without a relay URL configured, the adapter serves
//! fallback audio.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::tts::base::{
    HealthReport, ProviderDescriptor, ProviderStatus, SynthesisMode, SynthesisRequest,
    SynthesisResult, TtsAdapter, TtsError, TtsResult, VendorSettings,
};
use crate::core::tts::fallback::{self, FallbackProfile};

/// Output sample rate of the Edge neural voices.
const EDGE_SAMPLE_RATE: u32 = 24000;

/// Chinese voices exposed by the relay.
pub const ZH_VOICES: &[&str] = &[
    "zh-CN-XiaoxiaoNeural",
    "zh-CN-YunxiNeural",
    "zh-CN-YunjianNeural",
    "zh-CN-XiaoyiNeural",
    "zh-CN-YunyangNeural",
    "zh-TW-HsiaoyuNeural",
    "zh-TW-YunjieNeural",
];

/// English voices exposed by the relay.
pub const EN_VOICES: &[&str] = &[
    "en-US-AriaNeural",
    "en-US-DavisNeural",
    "en-US-GuyNeural",
    "en-US-JennyNeural",
    "en-US-JasonNeural",
];

#[derive(Debug, Serialize)]
struct RelayRequest<'a> {
    text: &'a str,
    voice: &'a str,
    rate: &'a str,
    pitch: &'a str,
    format: &'a str,
}

/// EdgeTTS relay adapter.
pub struct EdgeTts {
    base_url: Option<String>,
    http: reqwest::Client,
    initialized: bool,
    fallback: FallbackProfile,
}

impl EdgeTts {
    pub fn new(settings: &VendorSettings) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            http: reqwest::Client::new(),
            initialized: false,
            fallback: FallbackProfile::new(EDGE_SAMPLE_RATE),
        }
    }

    fn status(&self) -> ProviderStatus {
        if self.base_url.is_some() {
            ProviderStatus::Healthy
        } else {
            ProviderStatus::Unconfigured
        }
    }

    fn default_voice(language: &str) -> &'static str {
        let primary = language.split('-').next().unwrap_or(language);
        match primary {
            "zh" => ZH_VOICES[0],
            _ => EN_VOICES[0],
        }
    }

    async fn call_relay(
        &self,
        base_url: &str,
        text: &str,
        voice: &str,
        rate: &str,
        pitch: &str,
    ) -> TtsResult<Vec<u8>> {
        let body = RelayRequest {
            text,
            voice,
            rate,
            pitch,
            format: "wav",
        };

        debug!(voice, rate, pitch, text_len = text.len(), "edge relay request");

        let response = self
            .http
            .post(format!("{base_url}/synthesize"))
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Transport(format!("edge relay unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TtsError::Vendor(format!(
                "edge relay error {status}: {detail}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TtsError::Transport(format!("edge relay read failed: {e}")))?;

        if audio.is_empty() {
            return Err(TtsError::Decode("edge relay returned empty audio".to_string()));
        }

        Ok(audio.to_vec())
    }
}

#[async_trait]
impl TtsAdapter for EdgeTts {
    async fn initialize(&mut self) -> TtsResult<()> {
        if self.initialized {
            return Ok(());
        }
        match &self.base_url {
            Some(url) => info!(url = %url, "EdgeTTS relay configured"),
            None => info!("EdgeTTS relay not configured, using fallback synthesis"),
        }
        self.initialized = true;
        Ok(())
    }

    async fn health_check(&self) -> HealthReport {
        HealthReport {
            status: self.status(),
            detail: serde_json::json!({
                "name": "EdgeTTS",
                "initialized": self.initialized,
                "relay_configured": self.base_url.is_some(),
                "supported_voices": ZH_VOICES.len() + EN_VOICES.len(),
            }),
        }
    }

    fn describe(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: "service1".to_string(),
            name: "EdgeTTS".to_string(),
            description: "Microsoft Edge neural voices via relay, free and multi-lingual"
                .to_string(),
            languages: ["zh", "en", "ja", "ko", "es", "fr", "de"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            features: ["text_to_speech", "multi_language", "multi_voice", "free"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            status: self.status(),
        }
    }

    fn info(&self) -> serde_json::Value {
        serde_json::json!({
            "model_type": "Microsoft Edge TTS",
            "sample_rate": EDGE_SAMPLE_RATE,
            "zh_voices": ZH_VOICES,
            "en_voices": EN_VOICES,
            "relay_configured": self.base_url.is_some(),
        })
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> TtsResult<SynthesisResult> {
        let voice = request
            .param_str("voice")
            .unwrap_or_else(|| Self::default_voice(&request.language));
        let rate = request.param_str("rate").unwrap_or("+0%");
        let pitch = request.param_str("pitch").unwrap_or("+0Hz");

        let (audio, mode) = match &self.base_url {
            Some(base_url) => {
                let audio = self
                    .call_relay(base_url, &request.text, voice, rate, pitch)
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

        let duration = SynthesisResult::estimate_duration(audio.len(), EDGE_SAMPLE_RATE);
        Ok(SynthesisResult {
            audio,
            sample_rate_hz: EDGE_SAMPLE_RATE,
            duration_seconds: duration,
            provider_id: "service1".to_string(),
            mode,
            echoed: serde_json::json!({
                "voice": voice,
                "rate": rate,
                "pitch": pitch,
                "language": request.language,
                "text_length": request.text.chars().count(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_synthesize_uses_fallback() {
        let mut tts = EdgeTts::new(&VendorSettings::default());
        tts.initialize().await.unwrap();

        let result = tts
            .synthesize(&SynthesisRequest::new("你好", "service1"))
            .await
            .unwrap();

        assert_eq!(result.mode, SynthesisMode::Simulation);
        assert_eq!(result.sample_rate_hz, EDGE_SAMPLE_RATE);
        assert!(!result.audio.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let mut tts = EdgeTts::new(&VendorSettings::default());
        tts.initialize().await.unwrap();
        tts.initialize().await.unwrap();
        assert_eq!(tts.describe().status, ProviderStatus::Unconfigured);
    }

    #[test]
    fn test_default_voice_by_language() {
        assert_eq!(EdgeTts::default_voice("zh"), "zh-CN-XiaoxiaoNeural");
        assert_eq!(EdgeTts::default_voice("zh-TW"), "zh-CN-XiaoxiaoNeural");
        assert_eq!(EdgeTts::default_voice("en"), "en-US-AriaNeural");
        assert_eq!(EdgeTts::default_voice("fr"), "en-US-AriaNeural");
    }

    #[test]
    fn test_configured_status_is_healthy() {
        let tts = EdgeTts::new(&VendorSettings {
            base_url: Some("http://edge-relay:7899".to_string()),
            ..Default::default()
        });
        assert_eq!(tts.describe().status, ProviderStatus::Healthy);
    }
}
