//! Speech session port — trait abstraction for speech session operations.
//!
//! # Design Rules
//!
//! - DTOs here are transport-agnostic wire shapes (no `voiceover-speech`
//!   types beyond the shared domain structs).
//! - Conversion from `voiceover-speech` native types happens inside
//!   `voiceover-speech`, never here. This keeps `voiceover-core` free of
//!   any dependency on the adapter crate.
//! - `SpeechSessionPort` is the only surface a GUI or HTTP adapter needs
//!   in order to drive the full type/speak/record workflow.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::PlaybackSettings;

// ── DTOs ─────────────────────────────────────────────────────────────────────

/// Current state of the speech session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechStatusDto {
    /// Whether an utterance is currently playing.
    pub is_speaking: bool,
    /// Whether the played output is being captured to an artifact.
    pub is_recording: bool,
    /// State machine label (`"idle"` or `"speaking"`).
    pub state: String,
    /// ID of the currently selected voice, if any.
    pub voice_id: Option<String>,
    /// Current prosody settings.
    pub settings: PlaybackSettings,
    /// Whether the session holds non-empty text.
    ///
    /// UIs derive button enabled-state from this: Play/Download are
    /// enabled iff `!is_speaking && has_text`, Stop iff `is_speaking`.
    pub has_text: bool,
}

/// Information about a single synthetic voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceInfoDto {
    /// Voice identifier used in API calls.
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// Language/accent tag.
    pub language: String,
}

/// Information about an audio input device visible to the OS.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDeviceDto {
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the system default input device.
    pub is_default: bool,
}

// ── Error ─────────────────────────────────────────────────────────────────────

/// Errors returned by `SpeechSessionPort` operations.
#[derive(Debug, Error)]
pub enum SpeechPortError {
    /// The synthesis engine is not available on this system.
    #[error("Synthesis engine unavailable: {0}")]
    EngineUnavailable(String),

    /// An utterance is already in flight; concurrent sessions are rejected.
    #[error("An utterance is already playing")]
    AlreadySpeaking,

    /// A requested resource (voice, device) was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An audio input or output device could not be acquired.
    #[error("Audio device error: {0}")]
    DeviceError(String),

    /// Synthesis failed mid-utterance.
    #[error("Synthesis error: {0}")]
    SynthesisError(String),

    /// Unexpected internal error.
    #[error("Internal speech error: {0}")]
    Internal(String),
}

// ── Port trait ────────────────────────────────────────────────────────────────

/// Port trait for speech session operations.
///
/// Implemented by `SpeechService` in `voiceover-speech`. Consumed by GUI
/// and HTTP adapters, which never see engine or audio hardware types.
#[async_trait]
pub trait SpeechSessionPort: Send + Sync {
    /// Return the current session status.
    async fn status(&self) -> Result<SpeechStatusDto, SpeechPortError>;

    /// Query the engine's voice catalog and default the selection to the
    /// first entry when none exists yet. Idempotent.
    async fn load_voices(&self) -> Result<Vec<VoiceInfoDto>, SpeechPortError>;

    /// List the voices currently known to the session.
    async fn list_voices(&self) -> Result<Vec<VoiceInfoDto>, SpeechPortError>;

    /// List available audio input devices.
    async fn list_devices(&self) -> Result<Vec<AudioDeviceDto>, SpeechPortError>;

    /// Replace the session text.
    async fn set_text(&self, text: &str) -> Result<(), SpeechPortError>;

    /// Select a voice from the catalog by ID.
    async fn select_voice(&self, voice_id: &str) -> Result<(), SpeechPortError>;

    /// Set the voice pitch multiplier (1.0 = engine default).
    async fn set_pitch(&self, pitch: f32) -> Result<(), SpeechPortError>;

    /// Set the speaking rate multiplier (1.0 = engine default).
    async fn set_rate(&self, rate: f32) -> Result<(), SpeechPortError>;

    /// Set the output volume (0.0 – 1.0).
    async fn set_volume(&self, volume: f32) -> Result<(), SpeechPortError>;

    /// Speak the current text with the current voice and settings.
    ///
    /// With `with_download` set, the played output is additionally captured
    /// from the input device and finalized into a WAV artifact when the
    /// utterance ends (naturally, on error, or via [`stop`](Self::stop)).
    ///
    /// A no-op when the text is empty or no voice is selected.
    async fn speak(&self, with_download: bool) -> Result<(), SpeechPortError>;

    /// Cancel playback immediately and finalize any active recording.
    /// Idempotent; a no-op when idle.
    async fn stop(&self) -> Result<(), SpeechPortError>;
}
