//! Local (cpal/rodio) adapters for the [`AudioSource`] and [`AudioSink`] traits.
//!
//! [`LocalAudioSource`] and [`LocalAudioSink`] are thin wrappers around
//! [`AudioThreadHandle`]. They share a **single** `Arc<AudioThreadHandle>` —
//! the audio OS thread owns both the cpal capture stream and the rodio
//! playback sink, so one handle is all that is needed.
//!
//! [`Arc`] without a `Mutex` is correct here because every method on
//! [`AudioThreadHandle`] takes `&self`; internal state transitions happen on
//! the dedicated OS thread via `std::sync::mpsc` channels.

use std::sync::Arc;

use crate::audio_io::{AudioSink, AudioSource};
use crate::audio_thread::AudioThreadHandle;
use crate::capture::{AudioDeviceInfo, CapturedAudio, RecorderCapture};
use crate::error::SpeechError;

// ── LocalAudioSource ───────────────────────────────────────────────

/// Local audio input adapter — delegates to cpal via [`AudioThreadHandle`].
///
/// Created by [`new_pair`]. Shares the underlying handle with the paired
/// [`LocalAudioSink`] — both operate on the same audio OS thread.
pub struct LocalAudioSource {
    handle: Arc<AudioThreadHandle>,
}

impl AudioSource for LocalAudioSource {
    fn start_capture(&self) -> Result<(), SpeechError> {
        self.handle.start_capture()
    }

    fn stop_capture(&self) -> Result<CapturedAudio, SpeechError> {
        self.handle.stop_capture()
    }

    fn is_capturing(&self) -> bool {
        self.handle.is_recording()
    }

    /// List available audio input devices.
    ///
    /// Delegates to the static [`RecorderCapture::list_devices`] from within
    /// this `&self` method, which keeps the trait object-safe.
    fn list_devices(&self) -> Result<Vec<AudioDeviceInfo>, SpeechError> {
        RecorderCapture::list_devices()
    }
}

// ── LocalAudioSink ─────────────────────────────────────────────────

/// Local audio output adapter — delegates to rodio via [`AudioThreadHandle`].
///
/// Created by [`new_pair`]. Shares the underlying handle with the paired
/// [`LocalAudioSource`] — both operate on the same audio OS thread.
pub struct LocalAudioSink {
    handle: Arc<AudioThreadHandle>,
}

impl AudioSink for LocalAudioSink {
    fn start_streaming(&self) -> Result<(), SpeechError> {
        self.handle.start_streaming()
    }

    fn append(&self, samples: Vec<f32>, sample_rate: u32) -> Result<(), SpeechError> {
        self.handle.append(samples, sample_rate)
    }

    fn set_volume(&self, volume: f32) {
        self.handle.set_volume(volume);
    }

    /// Stop playback immediately.
    ///
    /// [`AudioThreadHandle::stop_playback`] is fire-and-forget (returns `()`);
    /// we wrap it in `Ok(())` to satisfy the `Result`-returning trait signature.
    fn stop(&self) -> Result<(), SpeechError> {
        self.handle.stop_playback();
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.handle.is_playing()
    }

    fn on_playback_complete(&self, callback: Box<dyn FnOnce() + Send + 'static>) {
        self.handle.spawn_completion_watcher(Some(callback));
    }
}

// ── Constructor ────────────────────────────────────────────────────

/// Spawn one [`AudioThreadHandle`] and return a matched source/sink adapter
/// pair that share it.
///
/// Exactly one OS thread is created for the combined capture + playback
/// session.
///
/// # Errors
///
/// Returns [`SpeechError`] if the audio thread fails to start (e.g. no audio
/// device present).
pub fn new_pair() -> Result<(LocalAudioSource, LocalAudioSink), SpeechError> {
    let handle = Arc::new(AudioThreadHandle::spawn()?);
    let source = LocalAudioSource {
        handle: Arc::clone(&handle),
    };
    let sink = LocalAudioSink { handle };
    Ok((source, sink))
}
