//! Recording finalization — assembling captured audio into one WAV artifact.
//!
//! A [`RecordingSession`] exists only while a download-variant utterance is
//! in flight. Finalizing it stops the capture stream, writes everything
//! captured into a single `speech-<unix-epoch-millis>.wav` file, and
//! releases the input device. Finalization happens exactly once, on
//! whichever path ends the utterance (natural drain, synthesis error, or
//! an explicit stop).

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::audio_io::AudioSource;
use crate::error::SpeechError;

/// Marker for an in-flight recording.
///
/// Created when capture starts; consumed by [`finalize`](Self::finalize).
#[derive(Debug)]
pub struct RecordingSession {
    started_at: DateTime<Utc>,
}

impl RecordingSession {
    /// Mark the start of a recording.
    pub fn begin() -> Self {
        Self {
            started_at: Utc::now(),
        }
    }

    /// When capture started.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Stop capture and write everything recorded into one WAV artifact
    /// under `dir`. Consumes the session — a recording is finalized at
    /// most once.
    ///
    /// The artifact name carries the finalize-time timestamp, matching
    /// the moment the file becomes visible to the user.
    pub fn finalize(
        self,
        source: &dyn AudioSource,
        dir: &Path,
    ) -> Result<PathBuf, SpeechError> {
        let captured = source.stop_capture()?;

        debug!(
            samples = captured.samples.len(),
            sample_rate = captured.sample_rate,
            "Recording stopped, writing artifact"
        );

        std::fs::create_dir_all(dir)?;
        let path = dir.join(artifact_file_name(Utc::now()));
        write_wav_artifact(&path, &captured.samples, captured.sample_rate)?;

        info!(path = %path.display(), "Recording artifact saved");
        Ok(path)
    }
}

/// Default directory for recording artifacts: the user's download
/// directory, falling back to the system temp directory.
pub fn default_artifact_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(std::env::temp_dir)
}

/// Artifact file name for a recording finalized at `now`:
/// `speech-<unix-epoch-millis>.wav`.
fn artifact_file_name(now: DateTime<Utc>) -> String {
    format!("speech-{}.wav", now.timestamp_millis())
}

/// Write mono f32 PCM to a 16-bit WAV file.
fn write_wav_artifact(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), SpeechError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| SpeechError::ArtifactError(e.to_string()))?;
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        writer
            .write_sample(value)
            .map_err(|e| SpeechError::ArtifactError(e.to_string()))?;
    }
    writer
        .finalize()
        .map_err(|e| SpeechError::ArtifactError(e.to_string()))?;

    Ok(())
}
