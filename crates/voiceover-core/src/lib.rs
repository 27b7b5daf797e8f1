#![doc = include_str!(concat!(env!("OUT_DIR"), "/README_GENERATED.md"))]
#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod events;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{PITCH_RANGE, PlaybackSettings, RATE_RANGE, VOLUME_RANGE, VoiceInfo};
pub use events::AppEvent;
pub use ports::{
    AppEventEmitter, AudioDeviceDto, NoopEmitter, SpeechPortError, SpeechSessionPort,
    SpeechStatusDto, VoiceInfoDto,
};
