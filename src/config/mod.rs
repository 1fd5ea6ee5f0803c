//! Server configuration.
//!
//! All configuration comes from environment variables, with a `.env` file
//! loaded first by `main`. Every credential is optional: a provider without
//! its key registers as unconfigured and serves fallback audio, so a bare
//! environment still yields a fully working gateway.

use std::path::PathBuf;
use std::time::Duration;

use crate::core::tts::VendorSettings;
use crate::core::video::RemoteTaskConfig;

/// Errors raised while reading the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}

/// Top-level gateway configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Directory where synthesized audio is persisted.
    pub audio_dir: PathBuf,
    /// Minimum spacing between outbound calls to one provider.
    pub provider_min_interval: Duration,

    /// EdgeTTS relay ("service1").
    pub edge: VendorSettings,
    /// MiniMax ("service2").
    pub minimax: VendorSettings,
    /// ATEN AIVoice ("service3").
    pub aten: VendorSettings,
    /// OpenAI ("service4").
    pub openai: VendorSettings,
    /// Eugenes TTS ("service5").
    pub eugenes: VendorSettings,

    /// Video generation service poller.
    pub remote_task: RemoteTaskConfig,
}

impl ServerConfig {
    /// Build the configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = env_or("HOST", "0.0.0.0");
        let port = parse_env("PORT", 8000u16)?;
        let audio_dir = PathBuf::from(env_or("AUDIO_DIR", "./data/audios"));
        let provider_min_interval =
            Duration::from_millis(parse_env("PROVIDER_MIN_INTERVAL_MS", 500u64)?);

        let edge = VendorSettings {
            base_url: env_opt("EDGE_TTS_BASE_URL"),
            ..Default::default()
        };

        let minimax = VendorSettings {
            api_key: env_opt("MINIMAX_API_KEY"),
            secondary_key: env_opt("MINIMAX_GROUP_ID"),
            base_url: env_opt("MINIMAX_BASE_URL"),
            model: env_opt("MINIMAX_MODEL"),
        };

        let aten = VendorSettings {
            api_key: env_opt("ATEN_API_TOKEN"),
            base_url: env_opt("ATEN_BASE_URL"),
            ..Default::default()
        };

        let openai = VendorSettings {
            api_key: env_opt("OPENAI_API_KEY"),
            base_url: env_opt("OPENAI_TTS_BASE_URL"),
            ..Default::default()
        };

        let eugenes = VendorSettings {
            api_key: env_opt("EUGENES_API_KEY"),
            base_url: env_opt("EUGENES_BASE_URL"),
            ..Default::default()
        };

        let remote_task = RemoteTaskConfig {
            base_url: env_or("FACE2FACE_BASE_URL", "http://127.0.0.1:8383/easy"),
            result_base_url: env_or("FACE2FACE_RESULT_BASE_URL", "http://127.0.0.1:8383"),
            timeout_seconds: parse_env("TASK_TIMEOUT_SECONDS", 1200u64)?,
            poll_interval_seconds: parse_env("TASK_POLL_INTERVAL_SECONDS", 2u64)?,
        };

        Ok(Self {
            host,
            port,
            audio_dir,
            provider_min_interval,
            edge,
            minimax,
            aten,
            openai,
            eugenes,
            remote_task,
        })
    }

    /// `host:port` for the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            audio_dir: PathBuf::from("./data/audios"),
            provider_min_interval: Duration::from_millis(500),
            edge: VendorSettings::default(),
            minimax: VendorSettings::default(),
            aten: VendorSettings::default(),
            openai: VendorSettings::default(),
            eugenes: VendorSettings::default(),
            remote_task: RemoteTaskConfig::default(),
        }
    }
}

/// An env var, treating empty values as unset.
fn env_opt(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(var: &str, default: &str) -> String {
    env_opt(var).unwrap_or_else(|| default.to_string())
}

fn parse_env<T: std::str::FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env_opt(var) {
        Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
