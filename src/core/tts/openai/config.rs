//! Configuration types for the OpenAI speech endpoint.
//!
//! Model and voice selection, with per-model input length caps.

use serde::{Deserialize, Serialize};

// =============================================================================
// Models
// =============================================================================

/// Supported OpenAI speech models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpenAiModel {
    /// Standard quality, lower latency.
    #[default]
    #[serde(rename = "tts-1")]
    Tts1,
    /// High definition quality, higher latency.
    #[serde(rename = "tts-1-hd")]
    Tts1Hd,
}

impl OpenAiModel {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tts1 => "tts-1",
            Self::Tts1Hd => "tts-1-hd",
        }
    }

    /// Maximum accepted input length in characters.
    #[inline]
    pub fn max_chars(&self) -> usize {
        match self {
            Self::Tts1 | Self::Tts1Hd => 4096,
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "tts-1" | "tts1" => Self::Tts1,
            "tts-1-hd" | "tts1-hd" | "tts1hd" => Self::Tts1Hd,
            _ => Self::default(),
        }
    }
}

impl std::fmt::Display for OpenAiModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Voices
// =============================================================================

/// Available voices for the speech endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenAiVoice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl OpenAiVoice {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alloy => "alloy",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Shimmer => "shimmer",
        }
    }

    /// Short display description for the catalog endpoint.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Alloy => "Neutral, general purpose",
            Self::Echo => "Male, clear and steady",
            Self::Fable => "British male, expressive",
            Self::Onyx => "Deep male, authoritative",
            Self::Nova => "Female, warm",
            Self::Shimmer => "Female, soft",
        }
    }

    /// Parse from string, with fallback to default.
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "alloy" => Self::Alloy,
            "echo" => Self::Echo,
            "fable" => Self::Fable,
            "onyx" => Self::Onyx,
            "nova" => Self::Nova,
            "shimmer" => Self::Shimmer,
            _ => Self::default(),
        }
    }

    /// Get all available voices.
    pub fn all() -> &'static [OpenAiVoice] {
        &[
            Self::Alloy,
            Self::Echo,
            Self::Fable,
            Self::Onyx,
            Self::Nova,
            Self::Shimmer,
        ]
    }
}

impl std::fmt::Display for OpenAiVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
