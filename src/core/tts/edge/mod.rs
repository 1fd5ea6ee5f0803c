//! EdgeTTS relay provider ("service1").

mod provider;

pub use provider::{EN_VOICES, EdgeTts, ZH_VOICES};
