//! Eugenes TTS provider ("service5").

mod provider;

pub use provider::{EMOTIONS, EUGENES_TTS_URL, EugenesTts, VoiceEntry, voices_for};
