//! Speech service — the [`SpeechSessionPort`] implementation.
//!
//! Wraps a [`SpeechSession`] in an `Arc<RwLock<_>>` so adapters can drive
//! it concurrently, bridges [`SessionEvent`]s to [`AppEvent`]s on the
//! application emitter, and keeps the voice catalog fresh by watching the
//! engine's voices-changed notifications.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use voiceover_core::events::AppEvent;
use voiceover_core::ports::{
    AppEventEmitter, AudioDeviceDto, SpeechPortError, SpeechSessionPort, SpeechStatusDto,
    VoiceInfoDto,
};

use crate::engine::SynthBackend;
use crate::error::SpeechError;
use crate::session::{SessionEvent, SessionState, SpeechSession, SpeechSessionConfig};

/// Speech service implementing [`SpeechSessionPort`].
pub struct SpeechService {
    session: Arc<RwLock<SpeechSession>>,
    event_bridge: JoinHandle<()>,
    voices_watcher: JoinHandle<()>,
}

impl SpeechService {
    /// Create a service around a synthesis backend and audio adapters.
    ///
    /// Session events are forwarded to `emitter` as [`AppEvent`]s. The
    /// initial voice catalog load happens lazily on the first
    /// [`load_voices`](SpeechSessionPort::load_voices) call; subsequent
    /// engine-side voice changes refresh it automatically.
    pub fn new(
        backend: Box<dyn SynthBackend>,
        source: Arc<dyn crate::audio_io::AudioSource>,
        sink: Arc<dyn crate::audio_io::AudioSink>,
        config: SpeechSessionConfig,
        emitter: Box<dyn AppEventEmitter>,
    ) -> Self {
        let (session, event_rx) = SpeechSession::new(backend, source, sink, config);
        let voices_rx = session.subscribe_voices_changed();
        let session = Arc::new(RwLock::new(session));

        let event_bridge = spawn_event_bridge(event_rx, emitter);
        let voices_watcher = spawn_voices_watcher(voices_rx, Arc::clone(&session));

        Self {
            session,
            event_bridge,
            voices_watcher,
        }
    }

    /// Create a service backed by the local espeak engine and the default
    /// audio devices.
    #[cfg(feature = "espeak")]
    pub fn new_local(emitter: Box<dyn AppEventEmitter>) -> Result<Self, SpeechError> {
        let backend = crate::engine::espeak::EspeakBackend::new()?;
        let (source, sink) = crate::audio_local::new_pair()?;
        Ok(Self::new(
            Box::new(backend),
            Arc::new(source),
            Arc::new(sink),
            SpeechSessionConfig::default(),
            emitter,
        ))
    }
}

impl Drop for SpeechService {
    fn drop(&mut self) {
        self.event_bridge.abort();
        self.voices_watcher.abort();
    }
}

/// Forward session events to the application emitter.
///
/// `StateChanged` stays internal — listeners derive state from the
/// started/finished pair.
fn spawn_event_bridge(
    mut event_rx: tokio::sync::mpsc::UnboundedReceiver<SessionEvent>,
    emitter: Box<dyn AppEventEmitter>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            let app_event = match event {
                SessionEvent::SpeakingStarted {
                    voice_id,
                    recording,
                } => AppEvent::speech_started(voice_id, recording),
                SessionEvent::SpeakingFinished => AppEvent::speech_finished(),
                SessionEvent::Error(error) => AppEvent::speech_error(error),
                SessionEvent::ArtifactSaved(path) => {
                    AppEvent::artifact_saved(path.to_string_lossy().into_owned())
                }
                SessionEvent::VoicesChanged { count } => AppEvent::voices_changed(count),
                SessionEvent::StateChanged(_) => continue,
            };
            emitter.emit(app_event);
        }
    })
}

/// Reload the voice catalog whenever the engine reports a change.
fn spawn_voices_watcher(
    mut voices_rx: tokio::sync::watch::Receiver<()>,
    session: Arc<RwLock<SpeechSession>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while voices_rx.changed().await.is_ok() {
            if let Err(e) = session.write().await.load_voices().await {
                tracing::warn!(error = %e, "Voice catalog refresh failed");
            }
        }
    })
}

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "idle",
        SessionState::Speaking => "speaking",
    }
}

fn to_port_err(e: SpeechError) -> SpeechPortError {
    match e {
        SpeechError::EngineUnavailable(msg) => SpeechPortError::EngineUnavailable(msg),
        SpeechError::AlreadySpeaking => SpeechPortError::AlreadySpeaking,
        SpeechError::UnknownVoice(id) => SpeechPortError::NotFound(format!("voice '{id}'")),
        SpeechError::NoInputDevice
        | SpeechError::InputStreamError(_)
        | SpeechError::OutputStreamError(_)
        | SpeechError::AudioThreadDied => SpeechPortError::DeviceError(e.to_string()),
        SpeechError::SynthesisError(msg) => SpeechPortError::SynthesisError(msg),
        SpeechError::ArtifactError(_) | SpeechError::Io(_) => {
            SpeechPortError::Internal(e.to_string())
        }
    }
}

fn to_voice_dto(voice: &voiceover_core::domain::VoiceInfo) -> VoiceInfoDto {
    VoiceInfoDto {
        id: voice.id.clone(),
        name: voice.name.clone(),
        language: voice.language.clone(),
    }
}

#[async_trait]
impl SpeechSessionPort for SpeechService {
    async fn status(&self) -> Result<SpeechStatusDto, SpeechPortError> {
        let session = self.session.read().await;
        Ok(SpeechStatusDto {
            is_speaking: session.is_speaking(),
            is_recording: session.is_recording(),
            state: state_label(session.state()).to_string(),
            voice_id: session.selected_voice_id().map(str::to_string),
            settings: session.settings(),
            has_text: session.has_text(),
        })
    }

    async fn load_voices(&self) -> Result<Vec<VoiceInfoDto>, SpeechPortError> {
        let mut session = self.session.write().await;
        let voices = session.load_voices().await.map_err(to_port_err)?;
        Ok(voices.iter().map(to_voice_dto).collect())
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfoDto>, SpeechPortError> {
        let session = self.session.read().await;
        Ok(session.voices().iter().map(to_voice_dto).collect())
    }

    async fn list_devices(&self) -> Result<Vec<AudioDeviceDto>, SpeechPortError> {
        let session = self.session.read().await;
        let devices = session.list_devices().map_err(to_port_err)?;
        Ok(devices
            .into_iter()
            .map(|d| AudioDeviceDto {
                name: d.name,
                is_default: d.is_default,
            })
            .collect())
    }

    async fn set_text(&self, text: &str) -> Result<(), SpeechPortError> {
        self.session.write().await.set_text(text);
        Ok(())
    }

    async fn select_voice(&self, voice_id: &str) -> Result<(), SpeechPortError> {
        self.session
            .write()
            .await
            .select_voice(voice_id)
            .map_err(to_port_err)
    }

    async fn set_pitch(&self, pitch: f32) -> Result<(), SpeechPortError> {
        self.session.write().await.set_pitch(pitch);
        Ok(())
    }

    async fn set_rate(&self, rate: f32) -> Result<(), SpeechPortError> {
        self.session.write().await.set_rate(rate);
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> Result<(), SpeechPortError> {
        self.session.write().await.set_volume(volume);
        Ok(())
    }

    async fn speak(&self, with_download: bool) -> Result<(), SpeechPortError> {
        // Read lock on purpose: stop() must stay callable while an
        // utterance is being set up or synthesized.
        let session = self.session.read().await;
        session.speak(with_download).await.map_err(to_port_err)
    }

    async fn stop(&self) -> Result<(), SpeechPortError> {
        self.session.read().await.stop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_labels_are_lowercase() {
        assert_eq!(state_label(SessionState::Idle), "idle");
        assert_eq!(state_label(SessionState::Speaking), "speaking");
    }

    #[test]
    fn unknown_voice_maps_to_not_found() {
        let err = to_port_err(SpeechError::UnknownVoice("klingon".into()));
        assert!(matches!(err, SpeechPortError::NotFound(msg) if msg.contains("klingon")));
    }

    #[test]
    fn device_failures_map_to_device_error() {
        assert!(matches!(
            to_port_err(SpeechError::NoInputDevice),
            SpeechPortError::DeviceError(_)
        ));
        assert!(matches!(
            to_port_err(SpeechError::AudioThreadDied),
            SpeechPortError::DeviceError(_)
        ));
    }
}
