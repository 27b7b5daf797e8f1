//! Speech domain types.
//!
//! These types represent voices and playback settings independent of any
//! synthesis engine or audio backend.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Voices
// ─────────────────────────────────────────────────────────────────────────────

/// A synthetic voice offered by the synthesis engine.
///
/// Voices are immutable catalog entries; sessions select them by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    /// Stable identifier used to select the voice.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Language/accent tag (e.g. `"en-US"`).
    pub language: String,
}

impl VoiceInfo {
    /// Create a new voice catalog entry.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            language: language.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Playback settings
// ─────────────────────────────────────────────────────────────────────────────

/// Inclusive range for pitch and rate sliders.
pub const PITCH_RANGE: (f32, f32) = (0.1, 2.0);
/// Inclusive range for the rate slider.
pub const RATE_RANGE: (f32, f32) = (0.1, 2.0);
/// Inclusive range for the volume slider.
pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

/// Prosody settings applied when an utterance starts.
///
/// All three default to `1.0`. The documented ranges are
/// [`PITCH_RANGE`], [`RATE_RANGE`] and [`VOLUME_RANGE`]; setters trust
/// the input boundary (slider widgets) to stay inside them, and engine
/// adapters clamp when mapping to engine-native units.
///
/// Changing a setting never affects an utterance already in flight: the
/// session snapshots settings into the synthesis request at speak time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// Voice pitch multiplier (1.0 = engine default).
    pub pitch: f32,
    /// Speaking rate multiplier (1.0 = engine default).
    pub rate: f32,
    /// Output volume (0.0 = silent, 1.0 = full).
    pub volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            pitch: 1.0,
            rate: 1.0,
            volume: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_unity() {
        let s = PlaybackSettings::default();
        assert!((s.pitch - 1.0).abs() < f32::EPSILON);
        assert!((s.rate - 1.0).abs() < f32::EPSILON);
        assert!((s.volume - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn defaults_sit_inside_documented_ranges() {
        let s = PlaybackSettings::default();
        assert!(s.pitch >= PITCH_RANGE.0 && s.pitch <= PITCH_RANGE.1);
        assert!(s.rate >= RATE_RANGE.0 && s.rate <= RATE_RANGE.1);
        assert!(s.volume >= VOLUME_RANGE.0 && s.volume <= VOLUME_RANGE.1);
    }

    #[test]
    fn settings_serialize_camel_case() {
        let json = serde_json::to_string(&PlaybackSettings::default()).unwrap();
        assert!(json.contains("\"pitch\":1.0"));
        assert!(json.contains("\"volume\":1.0"));
    }
}
