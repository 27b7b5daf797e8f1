//! Audio capture module — input device recording via `cpal`.
//!
//! Captures audio from the default input device and accumulates PCM samples
//! at the device's native rate. Multi-channel input is mixed down to mono;
//! no resampling is applied, so the recording artifact preserves the
//! device rate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};

use crate::error::SpeechError;

/// Mono PCM captured from the input device, tagged with its sample rate.
#[derive(Debug, Clone)]
pub struct CapturedAudio {
    /// Mono f32 samples at `sample_rate`.
    pub samples: Vec<f32>,
    /// The device's native sample rate.
    pub sample_rate: u32,
}

/// Information about an available audio input device.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDeviceInfo {
    /// Human-readable device name.
    pub name: String,
    /// Whether this is the system default input device.
    pub is_default: bool,
}

/// Audio capture handle.
///
/// Wraps a `cpal` input stream and accumulates PCM samples until
/// [`stop_recording`](RecorderCapture::stop_recording) is called.
pub struct RecorderCapture {
    /// The active cpal input stream (None when not recording).
    _stream: Option<Stream>,

    /// Shared buffer of captured samples (interleaved, device rate).
    buffer: Arc<Mutex<Vec<f32>>>,

    /// Whether we are currently recording.
    is_recording: Arc<AtomicBool>,

    /// The device sample rate (tags the captured audio).
    device_sample_rate: u32,

    /// Number of input channels from the device.
    device_channels: u16,
}

impl RecorderCapture {
    /// Create a new capture instance using the default input device.
    pub fn new() -> Result<Self, SpeechError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(SpeechError::NoInputDevice)?;

        let config = device
            .default_input_config()
            .map_err(|e| SpeechError::InputStreamError(e.to_string()))?;

        let device_sample_rate = config.sample_rate().0;
        let device_channels = config.channels();

        tracing::info!(
            device = %device.name().unwrap_or_default(),
            sample_rate = device_sample_rate,
            channels = device_channels,
            "Audio capture initialized"
        );

        Ok(Self {
            _stream: None,
            buffer: Arc::new(Mutex::new(Vec::new())),
            is_recording: Arc::new(AtomicBool::new(false)),
            device_sample_rate,
            device_channels,
        })
    }

    /// Start recording from the input device.
    ///
    /// Audio accumulates in an internal buffer. Call
    /// [`stop_recording`](Self::stop_recording) to retrieve it.
    pub fn start_recording(&mut self) -> Result<(), SpeechError> {
        if self.is_recording.load(Ordering::SeqCst) {
            return Ok(()); // Already recording
        }

        // Clear the buffer for a fresh recording
        if let Ok(mut buf) = self.buffer.lock() {
            buf.clear();
        }

        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(SpeechError::NoInputDevice)?;

        let config = device
            .default_input_config()
            .map_err(|e| SpeechError::InputStreamError(e.to_string()))?;

        // The default device can change between construction and start;
        // refresh the format we tag the captured audio with.
        self.device_sample_rate = config.sample_rate().0;
        self.device_channels = config.channels();

        let stream = self.build_input_stream(&device, &config)?;
        stream
            .play()
            .map_err(|e| SpeechError::InputStreamError(e.to_string()))?;

        self._stream = Some(stream);
        self.is_recording.store(true, Ordering::SeqCst);
        tracing::debug!("Audio recording started");

        Ok(())
    }

    /// Stop recording and return the captured audio as mono f32 PCM at the
    /// device's native rate.
    pub fn stop_recording(&mut self) -> Result<CapturedAudio, SpeechError> {
        self.is_recording.store(false, Ordering::SeqCst);

        // Drop the stream to stop capturing
        self._stream = None;

        let raw_samples = {
            let mut buf = self
                .buffer
                .lock()
                .map_err(|e| SpeechError::InputStreamError(e.to_string()))?;
            std::mem::take(&mut *buf)
        };

        tracing::debug!(
            raw_samples = raw_samples.len(),
            device_rate = self.device_sample_rate,
            "Audio recording stopped"
        );

        let samples = if self.device_channels > 1 {
            mix_to_mono(&raw_samples, self.device_channels)
        } else {
            raw_samples
        };

        Ok(CapturedAudio {
            samples,
            sample_rate: self.device_sample_rate,
        })
    }

    /// Check if currently recording.
    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    /// List available audio input devices.
    pub fn list_devices() -> Result<Vec<AudioDeviceInfo>, SpeechError> {
        let host = cpal::default_host();
        let default_name = host
            .default_input_device()
            .and_then(|d| d.name().ok())
            .unwrap_or_default();

        let devices = host
            .input_devices()
            .map_err(|e| SpeechError::InputStreamError(e.to_string()))?;

        let mut result = Vec::new();
        for device in devices {
            if let Ok(name) = device.name() {
                result.push(AudioDeviceInfo {
                    is_default: name == default_name,
                    name,
                });
            }
        }

        Ok(result)
    }

    /// Build a cpal input stream that writes samples into the shared buffer.
    fn build_input_stream(
        &self,
        device: &Device,
        config: &cpal::SupportedStreamConfig,
    ) -> Result<Stream, SpeechError> {
        let buffer = Arc::clone(&self.buffer);
        let is_recording = Arc::clone(&self.is_recording);

        let stream_config: StreamConfig = config.clone().into();
        let sample_format = config.sample_format();

        let err_fn = |err: cpal::StreamError| {
            tracing::error!(%err, "Audio input stream error");
        };

        let stream = match sample_format {
            SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !is_recording.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(data);
                    }
                },
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    if !is_recording.load(Ordering::Relaxed) {
                        return;
                    }
                    // Convert i16 → f32
                    let float_data: Vec<f32> =
                        data.iter().map(|&s| f32::from(s) / 32768.0).collect();
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(&float_data);
                    }
                },
                err_fn,
                None,
            ),
            SampleFormat::I32 => device.build_input_stream(
                &stream_config,
                move |data: &[i32], _: &cpal::InputCallbackInfo| {
                    if !is_recording.load(Ordering::Relaxed) {
                        return;
                    }
                    #[allow(clippy::cast_precision_loss)]
                    let float_data: Vec<f32> =
                        data.iter().map(|&s| s as f32 / 2_147_483_648.0).collect();
                    if let Ok(mut buf) = buffer.lock() {
                        buf.extend_from_slice(&float_data);
                    }
                },
                err_fn,
                None,
            ),
            _ => {
                return Err(SpeechError::InputStreamError(format!(
                    "Unsupported sample format: {sample_format:?}"
                )));
            }
        };

        stream.map_err(|e| SpeechError::InputStreamError(e.to_string()))
    }
}

/// Convert interleaved multi-channel audio to mono by averaging channels.
fn mix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_mixdown_averages_channels() {
        let interleaved = [0.0, 1.0, 0.5, 0.5, -1.0, 1.0];
        let mono = mix_to_mono(&interleaved, 2);
        assert_eq!(mono, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn mixdown_drops_trailing_partial_frame() {
        let interleaved = [0.2, 0.4, 0.6];
        let mono = mix_to_mono(&interleaved, 2);
        assert_eq!(mono.len(), 1);
    }
}
