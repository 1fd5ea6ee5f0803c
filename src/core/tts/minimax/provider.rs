//! MiniMax TTS provider ("service2").
//!
//! Calls the MiniMax `t2a_v2` endpoint. The API answers with a JSON envelope
//! carrying a URL to the finished audio, which is downloaded in a second
//! step; a download failure is reported distinctly from a synthesis failure.
//! Without an API key the adapter serves fallback audio.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::tts::base::{
    HealthReport, ProviderDescriptor, ProviderStatus, SynthesisMode, SynthesisRequest,
    SynthesisResult, TtsAdapter, TtsError, TtsResult, VendorSettings,
};
use crate::core::tts::fallback::{self, FallbackProfile};

/// Default MiniMax t2a_v2 endpoint.
pub const MINIMAX_TTS_URL: &str = "https://api.minimaxi.chat/v1/t2a_v2";

/// Default synthesis model.
pub const DEFAULT_MODEL: &str = "speech-02-turbo";

/// Sample rate the adapter advertises and normalizes to.
const MINIMAX_SAMPLE_RATE: u32 = 24000;

/// Curated voice catalog (id, display name, gender).
pub const VOICES: &[(&str, &str, &str)] = &[
    (
        "moss_audio_069e7ef7-45ab-11f0-b24c-2e48b7cbf811",
        "Xiao An",
        "female",
    ),
    (
        "moss_audio_e2651ab2-50e2-11f0-8bff-3ee21232901d",
        "Xiao Lai",
        "male",
    ),
    (
        "moss_audio_9e3d9106-42a6-11f0-b6c4-9e15325fe584",
        "Hayley",
        "female",
    ),
];

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct VoiceSetting<'a> {
    voice_id: &'a str,
    speed: f64,
    vol: f64,
    pitch: i64,
    emotion: &'a str,
}

#[derive(Debug, Serialize)]
struct AudioSetting {
    sample_rate: u32,
    bitrate: u32,
    format: &'static str,
    channel: u8,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    text: &'a str,
    voice_setting: VoiceSetting<'a>,
    audio_setting: AudioSetting,
    stream: bool,
    output_format: &'static str,
    group_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct BaseResp {
    status_code: i64,
    #[serde(default)]
    status_msg: String,
}

#[derive(Debug, Deserialize)]
struct SpeechData {
    #[serde(default)]
    audio: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpeechResponse {
    base_resp: BaseResp,
    #[serde(default)]
    data: Option<SpeechData>,
}

// =============================================================================
// Provider
// =============================================================================

/// MiniMax TTS adapter.
pub struct MinimaxTts {
    api_key: Option<String>,
    group_id: Option<String>,
    base_url: String,
    model: String,
    http: reqwest::Client,
    initialized: bool,
    fallback: FallbackProfile,
}

impl MinimaxTts {
    pub fn new(settings: &VendorSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            group_id: settings.secondary_key.clone(),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| MINIMAX_TTS_URL.to_string()),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            http: reqwest::Client::new(),
            initialized: false,
            fallback: FallbackProfile::new(MINIMAX_SAMPLE_RATE),
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

    /// Call t2a_v2 and download the audio the envelope points at.
    async fn call_vendor(
        &self,
        api_key: &str,
        text: &str,
        voice_id: &str,
        speed: f64,
        pitch: i64,
        emotion: &str,
        volume: f64,
    ) -> TtsResult<Vec<u8>> {
        let body = SpeechRequest {
            model: &self.model,
            text,
            voice_setting: VoiceSetting {
                voice_id,
                speed,
                vol: volume,
                pitch,
                emotion,
            },
            audio_setting: AudioSetting {
                sample_rate: 16000,
                bitrate: 128000,
                format: "wav",
                channel: 1,
            },
            stream: false,
            output_format: "url",
            group_id: self.group_id.as_deref().unwrap_or(""),
        };

        debug!(model = %self.model, voice = voice_id, emotion, "minimax t2a_v2 request");

        let response = self
            .http
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Transport(format!("minimax unreachable: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(TtsError::Vendor(format!(
                "minimax API error {status}: {detail}"
            )));
        }

        let parsed: SpeechResponse = response
            .json()
            .await
            .map_err(|e| TtsError::Decode(format!("invalid minimax payload: {e}")))?;

        if parsed.base_resp.status_code != 0 {
            // Vendor diagnostic surfaced verbatim.
            return Err(TtsError::Vendor(parsed.base_resp.status_msg));
        }

        let audio_url = parsed
            .data
            .and_then(|d| d.audio)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| TtsError::Decode("minimax response carried no audio URL".to_string()))?;

        self.download(&audio_url).await
    }

    async fn download(&self, url: &str) -> TtsResult<Vec<u8>> {
        debug!(url, "downloading minimax audio");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| TtsError::Download(format!("minimax audio fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(TtsError::Download(format!(
                "minimax audio fetch returned HTTP {}",
                response.status().as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TtsError::Download(format!("minimax audio read failed: {e}")))?;
        Ok(bytes.to_vec())
    }

    fn default_voice() -> &'static str {
        VOICES[0].0
    }
}

#[async_trait]
impl TtsAdapter for MinimaxTts {
    async fn initialize(&mut self) -> TtsResult<()> {
        if self.initialized {
            return Ok(());
        }
        if self.configured() {
            info!(base_url = %self.base_url, model = %self.model, "MiniMax TTS configured");
            if self.group_id.is_none() {
                warn!("MINIMAX_GROUP_ID not set; requests will omit the group id");
            }
        } else {
            info!("MiniMax API key not set, using fallback synthesis");
        }
        self.initialized = true;
        Ok(())
    }

    async fn health_check(&self) -> HealthReport {
        HealthReport {
            status: self.status(),
            detail: serde_json::json!({
                "name": "MiniMax TTS",
                "initialized": self.initialized,
                "api_key_configured": self.configured(),
                "mode": if self.configured() { "real" } else { "simulation" },
            }),
        }
    }

    fn describe(&self) -> ProviderDescriptor {
        ProviderDescriptor {
            id: "service2".to_string(),
            name: "MiniMax TTS".to_string(),
            description: "MiniMax speech synthesis with high quality Chinese and English voices"
                .to_string(),
            languages: vec!["zh".to_string(), "en".to_string()],
            features: ["text_to_speech", "high_quality", "commercial"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            status: self.status(),
        }
    }

    fn info(&self) -> serde_json::Value {
        serde_json::json!({
            "model_type": "MiniMax TTS API",
            "model": self.model,
            "sample_rate": MINIMAX_SAMPLE_RATE,
            "voices": VOICES
                .iter()
                .map(|(id, name, gender)| serde_json::json!({
                    "id": id, "name": name, "gender": gender,
                }))
                .collect::<Vec<_>>(),
            "api_status": if self.configured() { "configured" } else { "not_configured" },
        })
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> TtsResult<SynthesisResult> {
        let voice_id = request.param_str("voice_id").unwrap_or(Self::default_voice());
        let speed = request.param_f64("speed").unwrap_or(1.0).clamp(0.5, 2.0);
        let pitch = request
            .param_f64("pitch")
            .unwrap_or(0.0)
            .clamp(-12.0, 12.0)
            .round() as i64;
        let emotion = request.param_str("emotion").unwrap_or("neutral");
        let volume = request.param_f64("volume").unwrap_or(1.0).clamp(0.1, 2.0);

        let (audio, mode) = match &self.api_key {
            Some(api_key) => {
                let audio = self
                    .call_vendor(api_key, &request.text, voice_id, speed, pitch, emotion, volume)
                    .await?;
                (audio, SynthesisMode::Real)
            }
            None => {
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

        let duration = SynthesisResult::estimate_duration(audio.len(), MINIMAX_SAMPLE_RATE);
        Ok(SynthesisResult {
            audio,
            sample_rate_hz: MINIMAX_SAMPLE_RATE,
            duration_seconds: duration,
            provider_id: "service2".to_string(),
            mode,
            echoed: serde_json::json!({
                "voice_id": voice_id,
                "speed": speed,
                "pitch": pitch,
                "emotion": emotion,
                "volume": volume,
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
    async fn test_unconfigured_synthesize_is_simulation() {
        let mut tts = MinimaxTts::new(&VendorSettings::default());
        tts.initialize().await.unwrap();

        let result = tts
            .synthesize(&SynthesisRequest::new("語音測試", "service2"))
            .await
            .unwrap();

        assert_eq!(result.mode, SynthesisMode::Simulation);
        assert!(result.duration_seconds > 0.0);
        // No voice_id in the request: the catalog default is echoed back.
        assert_eq!(result.echoed["voice_id"], VOICES[0].0);
    }

    #[tokio::test]
    async fn test_unconfigured_health_reports_simulation_mode() {
        let tts = MinimaxTts::new(&VendorSettings::default());
        let report = tts.health_check().await;
        assert_eq!(report.status, ProviderStatus::Unconfigured);
        assert_eq!(report.detail["mode"], "simulation");
    }

    #[test]
    fn test_settings_override_endpoint_and_model() {
        let tts = MinimaxTts::new(&VendorSettings {
            api_key: Some("key".to_string()),
            secondary_key: Some("group".to_string()),
            base_url: Some("http://localhost:9000/t2a".to_string()),
            model: Some("speech-01".to_string()),
        });
        assert_eq!(tts.base_url, "http://localhost:9000/t2a");
        assert_eq!(tts.model, "speech-01");
        assert_eq!(tts.describe().status, ProviderStatus::Healthy);
    }

    #[test]
    fn test_request_serialization_matches_api_shape() {
        let body = SpeechRequest {
            model: "speech-02-turbo",
            text: "hello",
            voice_setting: VoiceSetting {
                voice_id: "v1",
                speed: 1.0,
                vol: 1.0,
                pitch: 0,
                emotion: "happy",
            },
            audio_setting: AudioSetting {
                sample_rate: 16000,
                bitrate: 128000,
                format: "wav",
                channel: 1,
            },
            stream: false,
            output_format: "url",
            group_id: "g1",
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["voice_setting"]["voice_id"], "v1");
        assert_eq!(json["voice_setting"]["emotion"], "happy");
        assert_eq!(json["audio_setting"]["sample_rate"], 16000);
        assert_eq!(json["output_format"], "url");
    }

    #[test]
    fn test_error_envelope_parsing() {
        let raw = r#"{"base_resp":{"status_code":1004,"status_msg":"quota exceeded"}}"#;
        let parsed: SpeechResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.base_resp.status_code, 1004);
        assert_eq!(parsed.base_resp.status_msg, "quota exceeded");
        assert!(parsed.data.is_none());
    }
}
