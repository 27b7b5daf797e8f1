//! `AudioSource` and `AudioSink` trait abstractions for session audio I/O.
//!
//! These traits decouple the [`SpeechSession`](crate::session::SpeechSession)
//! from any specific audio backend. The production implementations are
//! [`LocalAudioSource`](crate::audio_local::LocalAudioSource) and
//! [`LocalAudioSink`](crate::audio_local::LocalAudioSink) (cpal capture +
//! rodio playback on the local machine); tests inject in-memory fakes.
//!
//! Both traits are **object-safe** (`Arc<dyn AudioSource>` /
//! `Arc<dyn AudioSink>`). All methods take `&self`; interior mutability
//! (channels, atomic flags) handles state changes inside each implementation.

use crate::capture::{AudioDeviceInfo, CapturedAudio};
use crate::error::SpeechError;

// ── AudioSource ────────────────────────────────────────────────────

/// Abstraction over an audio input source (recording device).
pub trait AudioSource: Send + Sync {
    /// Begin capturing audio from the source.
    fn start_capture(&self) -> Result<(), SpeechError>;

    /// Stop capturing and return all samples accumulated since the most
    /// recent [`start_capture`](AudioSource::start_capture), as mono f32
    /// PCM at the device's native rate.
    fn stop_capture(&self) -> Result<CapturedAudio, SpeechError>;

    /// Whether audio is currently being captured.
    fn is_capturing(&self) -> bool;

    /// List available audio input devices.
    fn list_devices(&self) -> Result<Vec<AudioDeviceInfo>, SpeechError>;
}

// ── AudioSink ──────────────────────────────────────────────────────

/// Abstraction over an audio output sink (speech playback).
pub trait AudioSink: Send + Sync {
    /// Prepare the sink for streaming playback.
    fn start_streaming(&self) -> Result<(), SpeechError>;

    /// Append audio samples to the playback buffer.
    fn append(&self, samples: Vec<f32>, sample_rate: u32) -> Result<(), SpeechError>;

    /// Set the output volume (0.0 – 1.0).
    fn set_volume(&self, volume: f32);

    /// Stop playback immediately.
    ///
    /// Suppresses any pending completion callback — the caller owns the
    /// cleanup on this path.
    fn stop(&self) -> Result<(), SpeechError>;

    /// Whether audio is currently playing.
    fn is_playing(&self) -> bool;

    /// Register a one-shot callback that fires when all queued audio drains.
    ///
    /// `callback` must be `Send + 'static` because it is dispatched from a
    /// background watcher thread.
    fn on_playback_complete(&self, callback: Box<dyn FnOnce() + Send + 'static>);
}
