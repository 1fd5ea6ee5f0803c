//! Deterministic fallback synthesizer.
//!
//! When a provider has no live backend configured, the gateway still returns
//! plausible audio so the rest of the pipeline (persistence, playback,
//! lip-sync downstream) keeps functioning. The waveform is a small sum of
//! sinusoids at a language-dependent base frequency, shaped by emotion
//! lookup tables, with low-amplitude structured noise and fade envelopes.
//!
//! The one hard requirement is determinism: identical inputs must produce
//! bit-identical WAV output, so the noise source is a seeded LCG rather than
//! a thread RNG.

use std::f64::consts::PI;
use std::io::Cursor;

use xxhash_rust::xxh3::xxh3_64;

use super::base::{TtsError, TtsResult};

/// Per-provider tuning for the fallback synthesizer.
///
/// The sample rate must match what the provider's `describe()` advertises.
#[derive(Debug, Clone)]
pub struct FallbackProfile {
    pub sample_rate_hz: u32,
    /// Seconds of audio per input character.
    pub seconds_per_char: f64,
    /// Lower bound on output duration, in seconds.
    pub min_duration_seconds: f64,
}

impl FallbackProfile {
    pub fn new(sample_rate_hz: u32) -> Self {
        Self {
            sample_rate_hz,
            seconds_per_char: 0.15,
            min_duration_seconds: 2.0,
        }
    }

    /// Output duration for a text of `char_count` characters: monotone in
    /// length, clamped below by the profile floor.
    pub fn duration_seconds(&self, char_count: usize) -> f64 {
        (char_count as f64 * self.seconds_per_char).max(self.min_duration_seconds)
    }
}

/// Frequency/amplitude/noise shaping per emotion.
#[derive(Debug, Clone, Copy)]
struct EmotionShape {
    freq_mod: f64,
    amp_mod: f64,
    noise_level: f64,
}

fn emotion_shape(emotion: &str) -> EmotionShape {
    match emotion {
        "happy" => EmotionShape { freq_mod: 1.2, amp_mod: 1.1, noise_level: 0.015 },
        "sad" => EmotionShape { freq_mod: 0.8, amp_mod: 0.9, noise_level: 0.025 },
        "angry" => EmotionShape { freq_mod: 1.3, amp_mod: 1.2, noise_level: 0.03 },
        "surprised" => EmotionShape { freq_mod: 1.4, amp_mod: 1.15, noise_level: 0.02 },
        "calm" => EmotionShape { freq_mod: 0.9, amp_mod: 0.95, noise_level: 0.01 },
        _ => EmotionShape { freq_mod: 1.0, amp_mod: 1.0, noise_level: 0.02 },
    }
}

fn language_base_freq(language: &str) -> f64 {
    let primary = language.split('-').next().unwrap_or(language);
    match primary {
        "zh" => 220.0,
        _ => 200.0,
    }
}

/// Deterministic pseudo-noise source seeded from the synthesis inputs.
struct NoiseLcg {
    state: u64,
}

impl NoiseLcg {
    fn new(seed: u64) -> Self {
        Self { state: seed | 1 }
    }

    /// Next sample in [-1.0, 1.0).
    fn next(&mut self) -> f64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) as f64 / (1u64 << 31) as f64) * 2.0 - 1.0
    }
}

/// Generate fallback speech as encoded WAV bytes (mono, 16-bit PCM).
///
/// Identical `(text, language, emotion, volume, profile)` inputs produce
/// bit-identical output.
pub fn synthesize_fallback(
    text: &str,
    language: &str,
    emotion: &str,
    volume: f64,
    profile: &FallbackProfile,
) -> TtsResult<Vec<u8>> {
    let samples = render_samples(text, language, emotion, volume, profile);
    encode_wav(&samples, profile.sample_rate_hz)
}

fn render_samples(
    text: &str,
    language: &str,
    emotion: &str,
    volume: f64,
    profile: &FallbackProfile,
) -> Vec<i16> {
    let duration = profile.duration_seconds(text.chars().count());
    let sample_rate = profile.sample_rate_hz as f64;
    let num_samples = (duration * sample_rate) as usize;

    let shape = emotion_shape(emotion);
    let freq = language_base_freq(language) * shape.freq_mod;
    let modulation_freq = if emotion == "sad" { 2.0 } else { 3.0 };
    let volume = volume.clamp(0.1, 2.0);

    let seed = xxh3_64(format!("{text}|{language}|{emotion}").as_bytes());
    let mut noise = NoiseLcg::new(seed);

    let mut audio = Vec::with_capacity(num_samples);
    for i in 0..num_samples {
        let t = i as f64 / sample_rate;

        // Fundamental plus two harmonics.
        let mut s = (2.0 * PI * freq * t).sin() * 0.3 * shape.amp_mod
            + (2.0 * PI * freq * 2.0 * t).sin() * 0.15 * shape.amp_mod
            + (2.0 * PI * freq * 3.0 * t).sin() * 0.08 * shape.amp_mod;

        // Slow amplitude modulation approximating syllable rhythm.
        s *= 1.0 + (2.0 * PI * modulation_freq * t).sin() * 0.2;

        // Low-amplitude structured noise marks the output as synthetic.
        s += noise.next() * shape.noise_level;

        audio.push(s * volume);
    }

    // Clip guard.
    let peak = audio.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
    if peak > 0.95 {
        let scale = 0.95 / peak;
        for s in &mut audio {
            *s *= scale;
        }
    }

    // 100 ms linear fades avoid audible clicks at the edges.
    let fade = ((0.1 * sample_rate) as usize).min(audio.len() / 2);
    for i in 0..fade {
        let g = i as f64 / fade as f64;
        audio[i] *= g;
        let j = audio.len() - 1 - i;
        audio[j] *= g;
    }

    audio
        .into_iter()
        .map(|s| (s.clamp(-1.0, 1.0) * i16::MAX as f64) as i16)
        .collect()
}

/// Encode PCM samples as a WAV container with explicit rate/channels/depth.
pub fn encode_wav(samples: &[i16], sample_rate_hz: u32) -> TtsResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| TtsError::Decode(format!("wav encode failed: {e}")))?;
        for &s in samples {
            writer
                .write_sample(s)
                .map_err(|e| TtsError::Decode(format!("wav encode failed: {e}")))?;
        }
        writer
            .finalize()
            .map_err(|e| TtsError::Decode(format!("wav encode failed: {e}")))?;
    }
    Ok(cursor.into_inner())
}
