//! OpenAI TTS provider ("service4").

mod config;
mod provider;

pub use config::{OpenAiModel, OpenAiVoice};
pub use provider::{OPENAI_TTS_URL, OpenAiTts};
