//! MiniMax TTS provider ("service2").

mod provider;

pub use provider::{DEFAULT_MODEL, MINIMAX_TTS_URL, MinimaxTts, VOICES};
