//! Synthesis engine backend trait — engine-agnostic interface for speech synthesis.
//!
//! This module defines the [`SynthBackend`] trait that abstracts over concrete
//! synthesis engines. The [`SpeechSession`](crate::session::SpeechSession)
//! operates on a trait object (`Box<dyn SynthBackend>`) so that engines can be
//! swapped without touching the session logic.
//!
//! ## Backend implementations
//!
//! | Feature  | Module     | Engine |
//! |----------|------------|--------|
//! | `espeak` | [`espeak`] | espeak-ng CLI |

#[cfg(feature = "espeak")]
pub mod espeak;

use std::time::Duration;

use tokio::sync::watch;

use voiceover_core::domain::VoiceInfo;

use crate::error::SpeechError;

// ── Shared types ───────────────────────────────────────────────────

/// Audio produced by speech synthesis.
#[derive(Debug, Clone)]
pub struct SynthAudio {
    /// PCM f32 samples, mono.
    pub samples: Vec<f32>,

    /// Sample rate of the audio (e.g. 22 050 Hz for espeak-ng).
    pub sample_rate: u32,

    /// Duration of the audio.
    pub duration: Duration,
}

/// An immutable snapshot of everything one utterance needs.
///
/// Built by the session at speak time from the current text, voice
/// selection, and settings. Later settings changes never affect an
/// in-flight request.
#[derive(Debug, Clone)]
pub struct SynthRequest {
    /// Text to synthesize.
    pub text: String,
    /// ID of the voice to speak with.
    pub voice_id: String,
    /// Voice pitch multiplier (1.0 = engine default).
    pub pitch: f32,
    /// Speaking rate multiplier (1.0 = engine default).
    pub rate: f32,
    /// Output volume (0.0 – 1.0).
    pub volume: f32,
}

impl SynthRequest {
    /// Build a request, naming every field explicitly.
    pub fn new(
        text: impl Into<String>,
        voice_id: impl Into<String>,
        pitch: f32,
        rate: f32,
        volume: f32,
    ) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            pitch,
            rate,
            volume,
        }
    }
}

// ── Backend trait ──────────────────────────────────────────────────

/// Backend-agnostic speech synthesis engine.
///
/// Implementations must be `Send + Sync` so the session can hold them
/// across `.await` points behind a `tokio::sync::RwLock`.
///
/// Both `synthesize` and `voices` are async (via [`async_trait`]) because
/// process-based backends do blocking work under `spawn_blocking`.
#[async_trait::async_trait]
pub trait SynthBackend: Send + Sync {
    /// Synthesize an utterance to audio.
    ///
    /// The request carries the full prosody snapshot; backends map pitch,
    /// rate, and volume to engine-native units, clamping where the engine's
    /// accepted range is narrower.
    async fn synthesize(&self, request: &SynthRequest) -> Result<SynthAudio, SpeechError>;

    /// List the voices this engine currently offers.
    async fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;

    /// Subscribe to voice catalog changes.
    ///
    /// The returned receiver is notified whenever the engine's voice list
    /// changes, prompting the session to re-query [`voices`](Self::voices).
    /// Engines with a static catalog return a receiver that never fires.
    fn subscribe_voices_changed(&self) -> watch::Receiver<()>;
}
