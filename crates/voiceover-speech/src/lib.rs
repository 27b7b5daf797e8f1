#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod audio_io;
pub mod audio_local;
pub mod audio_thread;
pub mod capture;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod playback;
pub mod recorder;
pub mod service;
pub mod session;

pub use audio_io::{AudioSink, AudioSource};
pub use audio_local::{new_pair, LocalAudioSink, LocalAudioSource};
pub use capture::{AudioDeviceInfo, CapturedAudio};
pub use catalog::VoiceCatalog;
pub use engine::{SynthAudio, SynthBackend, SynthRequest};
pub use error::SpeechError;
pub use recorder::RecordingSession;
pub use service::SpeechService;
pub use session::{SessionEvent, SessionState, SpeechSession, SpeechSessionConfig};
