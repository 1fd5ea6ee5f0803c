//! ATEN AIVoice provider ("service3").

mod provider;

pub use provider::{ATEN_BASE_URL, AtenTts, VoiceModel};
