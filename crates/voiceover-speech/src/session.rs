//! Speech session orchestrator — coordinates synthesis, playback, and recording.
//!
//! The session is a small state machine:
//!
//! ```text
//!   Idle → Speaking → Idle
//! ```
//!
//! `Speaking` is optionally tagged with an active recording (the
//! download-variant of speak). Exactly one of natural drain, synthesis
//! error, or an explicit [`stop`](SpeechSession::stop) ends an utterance;
//! whichever fires finalizes the recording into one WAV artifact and
//! releases the input device.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

use voiceover_core::domain::{PlaybackSettings, VoiceInfo};

use crate::audio_io::{AudioSink, AudioSource};
use crate::catalog::VoiceCatalog;
use crate::engine::{SynthBackend, SynthRequest};
use crate::error::SpeechError;
use crate::recorder::{self, RecordingSession};

// ── Session state machine ──────────────────────────────────────────

/// Current state of the speech session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// No utterance in flight.
    Idle,

    /// An utterance is playing (optionally being recorded).
    Speaking,
}

// ── Events emitted by the session ──────────────────────────────────

/// Events emitted by the speech session to the application layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Session state changed.
    StateChanged(SessionState),

    /// Playback of an utterance started.
    SpeakingStarted {
        /// ID of the voice speaking.
        voice_id: String,
        /// Whether the output is being captured to an artifact.
        recording: bool,
    },

    /// Playback finished (natural drain or explicit stop).
    SpeakingFinished,

    /// Synthesis or recording failed.
    Error(String),

    /// A recording was finalized into an artifact on disk.
    ArtifactSaved(PathBuf),

    /// The voice catalog was (re)loaded.
    VoicesChanged {
        /// Number of voices now available.
        count: usize,
    },
}

// ── Session configuration ──────────────────────────────────────────

/// Configuration for the speech session.
#[derive(Debug, Clone)]
pub struct SpeechSessionConfig {
    /// Directory recording artifacts are written to.
    pub artifact_dir: PathBuf,
}

impl Default for SpeechSessionConfig {
    fn default() -> Self {
        Self {
            artifact_dir: recorder::default_artifact_dir(),
        }
    }
}

// ── Speech session ─────────────────────────────────────────────────

/// The speech session orchestrator.
///
/// Holds the voice catalog and selection, the current text, and the
/// prosody settings; drives the synthesis backend and audio adapters.
/// Emits [`SessionEvent`]s via a channel for the application layer.
///
/// Mutation methods (`set_text`, `select_voice`, setters) take `&mut self`;
/// `speak` and `stop` take `&self` so a stop can interrupt an utterance
/// while `speak` still holds a shared lock.
pub struct SpeechSession {
    /// Synthesis engine.
    backend: Box<dyn SynthBackend>,

    /// Audio input (shared with completion callbacks for finalization).
    source: Arc<dyn AudioSource>,

    /// Audio output.
    sink: Arc<dyn AudioSink>,

    /// Voice list + selection.
    catalog: VoiceCatalog,

    /// Text the next utterance will speak.
    text: String,

    /// Prosody settings, snapshotted into each utterance at speak time.
    settings: PlaybackSettings,

    /// Guards the whole utterance, synthesis included. Set at `speak`
    /// entry, cleared by whichever path ends the utterance.
    busy: Arc<AtomicBool>,

    /// True from first audio until drain/stop.
    is_speaking: Arc<AtomicBool>,

    /// At most one active recording; `take()` guarantees exactly-once
    /// finalization across the drain, error, and stop paths.
    recording: Arc<Mutex<Option<RecordingSession>>>,

    /// Where finalized artifacts land.
    artifact_dir: PathBuf,

    /// Event sender channel.
    event_tx: mpsc::UnboundedSender<SessionEvent>,
}

impl SpeechSession {
    /// Create a new session around a synthesis backend and audio adapters.
    ///
    /// Returns the session and a receiver for [`SessionEvent`]s.
    #[must_use]
    pub fn new(
        backend: Box<dyn SynthBackend>,
        source: Arc<dyn AudioSource>,
        sink: Arc<dyn AudioSink>,
        config: SpeechSessionConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let session = Self {
            backend,
            source,
            sink,
            catalog: VoiceCatalog::new(),
            text: String::new(),
            settings: PlaybackSettings::default(),
            busy: Arc::new(AtomicBool::new(false)),
            is_speaking: Arc::new(AtomicBool::new(false)),
            recording: Arc::new(Mutex::new(None)),
            artifact_dir: config.artifact_dir,
            event_tx,
        };

        (session, event_rx)
    }

    // ── Catalog ────────────────────────────────────────────────────

    /// Query the engine's voice list and refresh the catalog.
    ///
    /// Defaults the selection to the first entry when none exists yet;
    /// never clears an existing selection. Idempotent on re-delivery.
    pub async fn load_voices(&mut self) -> Result<&[VoiceInfo], SpeechError> {
        let voices = self.backend.voices().await?;
        tracing::debug!(count = voices.len(), "Voice catalog loaded");
        self.catalog.replace(voices);
        self.emit(SessionEvent::VoicesChanged {
            count: self.catalog.len(),
        });
        Ok(self.catalog.voices())
    }

    /// All voices currently known to the session.
    pub fn voices(&self) -> &[VoiceInfo] {
        self.catalog.voices()
    }

    /// Select a voice from the catalog by ID.
    pub fn select_voice(&mut self, voice_id: &str) -> Result<(), SpeechError> {
        self.catalog.select(voice_id)
    }

    /// ID of the selected voice, if any.
    pub fn selected_voice_id(&self) -> Option<&str> {
        self.catalog.selected_id()
    }

    /// Subscribe to the engine's voices-changed notifications.
    pub fn subscribe_voices_changed(&self) -> watch::Receiver<()> {
        self.backend.subscribe_voices_changed()
    }

    // ── Text & settings ────────────────────────────────────────────

    /// Replace the session text.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Whether the session holds non-empty (non-whitespace) text.
    #[must_use]
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Set the voice pitch multiplier. No effect on in-flight utterances.
    pub fn set_pitch(&mut self, pitch: f32) {
        self.settings.pitch = pitch;
    }

    /// Set the speaking rate multiplier. No effect on in-flight utterances.
    pub fn set_rate(&mut self, rate: f32) {
        self.settings.rate = rate;
    }

    /// Set the output volume. No effect on in-flight utterances.
    pub fn set_volume(&mut self, volume: f32) {
        self.settings.volume = volume;
    }

    /// Current prosody settings.
    #[must_use]
    pub const fn settings(&self) -> PlaybackSettings {
        self.settings
    }

    // ── Status ─────────────────────────────────────────────────────

    /// Current state of the session.
    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.is_speaking() {
            SessionState::Speaking
        } else {
            SessionState::Idle
        }
    }

    /// Whether an utterance is currently playing.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        self.is_speaking.load(Ordering::SeqCst)
    }

    /// Whether the played output is being captured to an artifact.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.recording
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// List available audio input devices.
    pub fn list_devices(&self) -> Result<Vec<crate::capture::AudioDeviceInfo>, SpeechError> {
        self.source.list_devices()
    }

    // ── Speaking ───────────────────────────────────────────────────

    /// Speak the current text with the selected voice and a snapshot of
    /// the current settings.
    ///
    /// A silent no-op when the text is empty or no voice is selected.
    /// A concurrent utterance is rejected with
    /// [`SpeechError::AlreadySpeaking`].
    ///
    /// With `with_download`, the input device is acquired and capture
    /// starts **before** any audio is produced; acquisition failure aborts
    /// the operation before synthesis.
    pub async fn speak(&self, with_download: bool) -> Result<(), SpeechError> {
        if !self.has_text() {
            tracing::debug!("Speak requested with empty text — ignoring");
            return Ok(());
        }
        let Some(voice_id) = self.catalog.selected_id() else {
            tracing::debug!("Speak requested with no voice selected — ignoring");
            return Ok(());
        };

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SpeechError::AlreadySpeaking);
        }

        // Snapshot everything the utterance needs — later setting changes
        // must not affect it.
        let request = SynthRequest::new(
            self.text.clone(),
            voice_id,
            self.settings.pitch,
            self.settings.rate,
            self.settings.volume,
        );

        // Capture must be live before the first audio sample plays so the
        // artifact contains the whole utterance.
        if with_download {
            if let Err(e) = self.source.start_capture() {
                tracing::warn!(error = %e, "Input device unavailable — aborting recorded speak");
                self.busy.store(false, Ordering::SeqCst);
                return Err(e);
            }
            *self
                .recording
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(RecordingSession::begin());
        }

        if let Err(e) = self.sink.start_streaming() {
            self.abort_utterance(&e);
            return Err(e);
        }
        self.sink.set_volume(request.volume);

        tracing::info!(
            voice_id = %request.voice_id,
            text_len = request.text.len(),
            recording = with_download,
            "Synthesizing utterance"
        );

        let audio = match self.backend.synthesize(&request).await {
            Ok(audio) => audio,
            Err(e) => {
                self.abort_utterance(&e);
                return Err(e);
            }
        };

        // stop() may have arrived while synthesis was in flight; the late
        // audio is simply discarded. A stop that raced ahead of the
        // recording-slot assignment finds nothing to finalize, so release
        // the device here too — take() keeps finalization exactly-once.
        if !self.busy.load(Ordering::SeqCst) {
            tracing::debug!("Utterance cancelled during synthesis");
            finalize_recording(
                &self.recording,
                self.source.as_ref(),
                &self.artifact_dir,
                &self.event_tx,
            );
            return Ok(());
        }

        if audio.samples.is_empty() {
            tracing::debug!("Engine produced no audio");
            let _ = self.sink.stop();
            finalize_recording(
                &self.recording,
                self.source.as_ref(),
                &self.artifact_dir,
                &self.event_tx,
            );
            self.busy.store(false, Ordering::SeqCst);
            return Ok(());
        }

        if let Err(e) = self.sink.append(audio.samples, audio.sample_rate) {
            self.abort_utterance(&e);
            return Err(e);
        }

        self.is_speaking.store(true, Ordering::SeqCst);
        self.emit(SessionEvent::StateChanged(SessionState::Speaking));
        self.emit(SessionEvent::SpeakingStarted {
            voice_id: request.voice_id.clone(),
            recording: with_download,
        });

        // Fires on natural drain only — an explicit stop() suppresses the
        // callback and performs this cleanup itself.
        let event_tx = self.event_tx.clone();
        let busy = Arc::clone(&self.busy);
        let is_speaking = Arc::clone(&self.is_speaking);
        let recording = Arc::clone(&self.recording);
        let source = Arc::clone(&self.source);
        let artifact_dir = self.artifact_dir.clone();
        self.sink.on_playback_complete(Box::new(move || {
            is_speaking.store(false, Ordering::SeqCst);
            busy.store(false, Ordering::SeqCst);
            finalize_recording(&recording, source.as_ref(), &artifact_dir, &event_tx);
            let _ = event_tx.send(SessionEvent::SpeakingFinished);
            let _ = event_tx.send(SessionEvent::StateChanged(SessionState::Idle));
        }));

        Ok(())
    }

    /// Cancel playback immediately and finalize any active recording.
    ///
    /// Idempotent; a no-op when idle.
    pub fn stop(&self) {
        let was_busy = self.busy.swap(false, Ordering::SeqCst);
        let no_recording = self
            .recording
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none();
        if !was_busy && no_recording {
            return;
        }

        tracing::info!("Stopping utterance");

        // Stopping the sink suppresses the completion watcher's callback,
        // so this path owns the cleanup.
        let _ = self.sink.stop();
        let was_speaking = self.is_speaking.swap(false, Ordering::SeqCst);

        finalize_recording(
            &self.recording,
            self.source.as_ref(),
            &self.artifact_dir,
            &self.event_tx,
        );

        if was_speaking {
            self.emit(SessionEvent::SpeakingFinished);
            self.emit(SessionEvent::StateChanged(SessionState::Idle));
        }
    }

    // ── Internal helpers ───────────────────────────────────────────

    /// Clean up after a failure before or during synthesis: tear down the
    /// sink, finalize any recording, reset flags, and report the error.
    fn abort_utterance(&self, error: &SpeechError) {
        let _ = self.sink.stop();
        finalize_recording(
            &self.recording,
            self.source.as_ref(),
            &self.artifact_dir,
            &self.event_tx,
        );
        self.is_speaking.store(false, Ordering::SeqCst);
        self.busy.store(false, Ordering::SeqCst);
        self.emit(SessionEvent::Error(error.to_string()));
    }

    /// Emit a session event (best-effort — if the receiver is dropped, we log and move on).
    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("Session event receiver dropped");
        }
    }
}

impl Drop for SpeechSession {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Finalize an active recording, if any, emitting `ArtifactSaved` on
/// success and `Error` on failure.
///
/// `take()` on the shared slot makes this safe to call from every
/// utterance-ending path — only the first caller finds the session.
fn finalize_recording(
    recording: &Mutex<Option<RecordingSession>>,
    source: &dyn AudioSource,
    dir: &Path,
    event_tx: &mpsc::UnboundedSender<SessionEvent>,
) {
    // Poison tolerance: a panic elsewhere while the slot was held must not
    // wedge stop() out of releasing the input device.
    let Some(active) = recording
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take()
    else {
        return;
    };

    match active.finalize(source, dir) {
        Ok(path) => {
            let _ = event_tx.send(SessionEvent::ArtifactSaved(path));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to finalize recording");
            let _ = event_tx.send(SessionEvent::Error(format!(
                "Failed to save recording: {e}"
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{AudioDeviceInfo, CapturedAudio};
    use crate::engine::SynthAudio;
    use std::time::Duration;

    struct NullBackend {
        voices_tx: watch::Sender<()>,
    }

    impl NullBackend {
        fn new() -> Self {
            let (voices_tx, _) = watch::channel(());
            Self { voices_tx }
        }
    }

    #[async_trait::async_trait]
    impl SynthBackend for NullBackend {
        async fn synthesize(&self, _request: &SynthRequest) -> Result<SynthAudio, SpeechError> {
            Ok(SynthAudio {
                samples: vec![0.0; 160],
                sample_rate: 16_000,
                duration: Duration::from_millis(10),
            })
        }

        async fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
            Ok(vec![VoiceInfo::new("v1", "Test", "en")])
        }

        fn subscribe_voices_changed(&self) -> watch::Receiver<()> {
            self.voices_tx.subscribe()
        }
    }

    struct NullAudio;

    impl AudioSource for NullAudio {
        fn start_capture(&self) -> Result<(), SpeechError> {
            Ok(())
        }
        fn stop_capture(&self) -> Result<CapturedAudio, SpeechError> {
            Ok(CapturedAudio {
                samples: Vec::new(),
                sample_rate: 48_000,
            })
        }
        fn is_capturing(&self) -> bool {
            false
        }
        fn list_devices(&self) -> Result<Vec<AudioDeviceInfo>, SpeechError> {
            Ok(Vec::new())
        }
    }

    impl AudioSink for NullAudio {
        fn start_streaming(&self) -> Result<(), SpeechError> {
            Ok(())
        }
        fn append(&self, _samples: Vec<f32>, _sample_rate: u32) -> Result<(), SpeechError> {
            Ok(())
        }
        fn set_volume(&self, _volume: f32) {}
        fn stop(&self) -> Result<(), SpeechError> {
            Ok(())
        }
        fn is_playing(&self) -> bool {
            false
        }
        fn on_playback_complete(&self, _callback: Box<dyn FnOnce() + Send + 'static>) {}
    }

    fn null_session() -> (SpeechSession, mpsc::UnboundedReceiver<SessionEvent>) {
        SpeechSession::new(
            Box::new(NullBackend::new()),
            Arc::new(NullAudio),
            Arc::new(NullAudio),
            SpeechSessionConfig {
                artifact_dir: std::env::temp_dir(),
            },
        )
    }

    #[test]
    fn session_starts_idle_with_defaults() {
        let (session, _rx) = null_session();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(!session.is_speaking());
        assert!(!session.is_recording());
        assert!(!session.has_text());
        assert_eq!(session.selected_voice_id(), None);
    }

    #[tokio::test]
    async fn speak_without_text_is_a_no_op() {
        let (session, mut rx) = null_session();
        session.speak(false).await.unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn speak_without_voice_is_a_no_op() {
        let (mut session, mut rx) = null_session();
        session.set_text("hello");
        session.speak(false).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn stop_when_idle_is_a_no_op() {
        let (session, mut rx) = null_session();
        session.stop();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn finalization_recovers_a_poisoned_recording_slot() {
        let recording = Arc::new(Mutex::new(Some(RecordingSession::begin())));
        let slot = Arc::clone(&recording);
        let _ = std::thread::spawn(move || {
            let _guard = slot.lock().unwrap();
            panic!("poison the slot");
        })
        .join();
        assert!(recording.is_poisoned());

        let dir = tempfile::tempdir().unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();
        finalize_recording(&recording, &NullAudio, dir.path(), &tx);

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::ArtifactSaved(_))));
        assert!(recording
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none());
    }
}
