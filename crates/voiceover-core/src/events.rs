//! Canonical event union for all cross-adapter events.
//!
//! This module is the single source of truth for events consumed by frontend
//! listeners and emitted by backend services.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag for TypeScript compatibility:
//!
//! ```json
//! { "type": "speech_started", "voiceId": "en-US-1", "recording": false }
//! ```

use serde::{Deserialize, Serialize};

/// Canonical event types for all adapters.
///
/// Each variant includes all necessary context for the event to be
/// self-describing on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// An utterance has started playing.
    SpeechStarted {
        /// ID of the voice speaking.
        #[serde(rename = "voiceId")]
        voice_id: String,
        /// Whether the played output is being recorded to an artifact.
        recording: bool,
    },

    /// An utterance finished draining naturally or was stopped.
    SpeechFinished,

    /// Synthesis or playback failed.
    SpeechError {
        /// Error description.
        error: String,
    },

    /// A recording was finalized into an audio artifact on disk.
    ArtifactSaved {
        /// Absolute path of the saved file.
        path: String,
    },

    /// The engine's voice catalog changed.
    VoicesChanged {
        /// Number of voices now available.
        count: usize,
    },
}

impl AppEvent {
    /// Create a speech started event.
    pub const fn speech_started(voice_id: String, recording: bool) -> Self {
        Self::SpeechStarted {
            voice_id,
            recording,
        }
    }

    /// Create a speech finished event.
    pub const fn speech_finished() -> Self {
        Self::SpeechFinished
    }

    /// Create a speech error event.
    pub fn speech_error(error: impl Into<String>) -> Self {
        Self::SpeechError {
            error: error.into(),
        }
    }

    /// Create an artifact saved event.
    pub fn artifact_saved(path: impl Into<String>) -> Self {
        Self::ArtifactSaved { path: path.into() }
    }

    /// Create a voices changed event.
    pub const fn voices_changed(count: usize) -> Self {
        Self::VoicesChanged { count }
    }

    /// Get the event name for listener subscription routing.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::SpeechStarted { .. } => "speech:started",
            Self::SpeechFinished => "speech:finished",
            Self::SpeechError { .. } => "speech:error",
            Self::ArtifactSaved { .. } => "speech:artifact_saved",
            Self::VoicesChanged { .. } => "speech:voices_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = AppEvent::speech_started("en-US-1".to_string(), true);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"speech_started\""));
        assert!(json.contains("\"voiceId\":\"en-US-1\""));
        assert!(json.contains("\"recording\":true"));
    }

    /// Lock down event names to prevent frontend subscription mismatches.
    #[test]
    fn event_names_are_stable() {
        let cases = vec![
            (
                AppEvent::speech_started("v".to_string(), false),
                "speech:started",
            ),
            (AppEvent::speech_finished(), "speech:finished"),
            (AppEvent::speech_error("boom"), "speech:error"),
            (
                AppEvent::artifact_saved("/tmp/speech-0.wav"),
                "speech:artifact_saved",
            ),
            (AppEvent::voices_changed(3), "speech:voices_changed"),
        ];
        for (event, expected) in cases {
            assert_eq!(event.event_name(), expected);
        }
    }

    #[test]
    fn test_event_round_trip() {
        let event = AppEvent::artifact_saved("/home/me/Downloads/speech-1700000000000.wav");
        let json = serde_json::to_string(&event).unwrap();
        let back: AppEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.event_name(), "speech:artifact_saved");
    }
}
