//! Port traits: the boundaries between the core and its adapters.

mod event_emitter;
mod speech;

pub use event_emitter::{AppEventEmitter, NoopEmitter};
pub use speech::{
    AudioDeviceDto, SpeechPortError, SpeechSessionPort, SpeechStatusDto, VoiceInfoDto,
};
