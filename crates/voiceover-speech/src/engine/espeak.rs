//! espeak-ng synthesis backend — drives the `espeak-ng` CLI.
//!
//! The engine is discovered at construction time via the `ESPEAK_BIN`
//! environment variable or `$PATH` (`espeak-ng`, then plain `espeak`).
//! Each synthesis call writes a temporary WAV file with `espeak-ng -w`,
//! reads it back into PCM samples, and deletes it. All process and file
//! work runs under `spawn_blocking`.
//!
//! espeak-ng's voice catalog is baked into its data files, so the
//! voices-changed subscription never fires for this backend.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

use voiceover_core::domain::VoiceInfo;

use crate::engine::{SynthAudio, SynthBackend, SynthRequest};
use crate::error::SpeechError;

/// Counter for unique temp file names within one process.
static SYNTH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Synthesis backend backed by the `espeak-ng` command-line engine.
pub struct EspeakBackend {
    bin: PathBuf,
    temp_dir: PathBuf,
    voices_tx: watch::Sender<()>,
}

impl EspeakBackend {
    /// Locate the espeak-ng binary and build the backend.
    ///
    /// Checks `ESPEAK_BIN` first, then searches `$PATH` for `espeak-ng`
    /// and `espeak`.
    pub fn new() -> Result<Self, SpeechError> {
        let bin = get_from_env_or_path("ESPEAK_BIN", "espeak-ng")
            .or_else(|| get_from_path("espeak"))
            .ok_or_else(|| {
                SpeechError::EngineUnavailable(
                    "espeak-ng not found (set ESPEAK_BIN or install espeak-ng)".to_owned(),
                )
            })?;

        info!(bin = %bin.display(), "Detected espeak-ng binary");

        let (voices_tx, _) = watch::channel(());

        Ok(Self {
            bin,
            temp_dir: std::env::temp_dir(),
            voices_tx,
        })
    }
}

#[async_trait::async_trait]
impl SynthBackend for EspeakBackend {
    async fn synthesize(&self, request: &SynthRequest) -> Result<SynthAudio, SpeechError> {
        let bin = self.bin.clone();
        let out_wav = self.temp_dir.join(format!(
            "voiceover_synth_{}_{}.wav",
            std::process::id(),
            SYNTH_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let request = request.clone();

        tokio::task::spawn_blocking(move || {
            let result = synth_to_wav(&bin, &request, &out_wav).and_then(|()| read_wav(&out_wav));
            // Best-effort cleanup — the temp file has served its purpose.
            let _ = std::fs::remove_file(&out_wav);
            result
        })
        .await
        .map_err(|e| SpeechError::SynthesisError(format!("synthesis task failed: {e}")))?
    }

    async fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        let bin = self.bin.clone();
        tokio::task::spawn_blocking(move || {
            let output = Command::new(&bin)
                .arg("--voices")
                .output()
                .map_err(|e| SpeechError::EngineUnavailable(e.to_string()))?;
            if !output.status.success() {
                return Err(SpeechError::EngineUnavailable(format!(
                    "espeak-ng --voices failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                )));
            }
            Ok(parse_voice_listing(&String::from_utf8_lossy(
                &output.stdout,
            )))
        })
        .await
        .map_err(|e| SpeechError::EngineUnavailable(format!("voice listing task failed: {e}")))?
    }

    fn subscribe_voices_changed(&self) -> watch::Receiver<()> {
        self.voices_tx.subscribe()
    }
}

// ── Binary discovery ───────────────────────────────────────────────

fn get_from_env_or_path(env_key: &str, default_bin: &str) -> Option<PathBuf> {
    if let Ok(p) = std::env::var(env_key) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Some(pb);
        }
    }
    get_from_path(default_bin)
}

fn get_from_path(bin: &str) -> Option<PathBuf> {
    if bin.contains(std::path::MAIN_SEPARATOR) {
        let p = PathBuf::from(bin);
        return if p.exists() { Some(p) } else { None };
    }
    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(bin);
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }
    None
}

// ── Synthesis ──────────────────────────────────────────────────────

/// Map the request's unit-multiplier prosody onto espeak-ng's native units.
///
/// Returns `(words_per_minute, amplitude, pitch)`:
/// - rate 1.0 → 175 wpm (espeak's default), clamped to its 80–450 range
/// - volume 1.0 → amplitude 100, clamped to 0–200
/// - pitch 1.0 → 50, clamped to espeak's 0–99 scale
fn engine_units(request: &SynthRequest) -> (i32, i32, i32) {
    #[allow(clippy::cast_possible_truncation)]
    let wpm = (175.0 * request.rate).round().clamp(80.0, 450.0) as i32;
    #[allow(clippy::cast_possible_truncation)]
    let amp = (100.0 * request.volume).round().clamp(0.0, 200.0) as i32;
    #[allow(clippy::cast_possible_truncation)]
    let pitch = (50.0 * request.pitch).round().clamp(0.0, 99.0) as i32;
    (wpm, amp, pitch)
}

fn synth_to_wav(bin: &Path, request: &SynthRequest, out_wav: &Path) -> Result<(), SpeechError> {
    let (wpm, amp, pitch) = engine_units(request);

    let mut cmd = Command::new(bin);
    cmd.arg("-v").arg(&request.voice_id);
    cmd.arg("-s").arg(wpm.to_string());
    cmd.arg("-a").arg(amp.to_string());
    cmd.arg("-p").arg(pitch.to_string());
    cmd.arg("-w").arg(out_wav);
    cmd.arg(&request.text);

    debug!(command = ?cmd, "Running espeak-ng");
    let output = cmd
        .output()
        .map_err(|e| SpeechError::SynthesisError(e.to_string()))?;
    if !output.status.success() {
        return Err(SpeechError::SynthesisError(format!(
            "espeak-ng failed: {}",
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    Ok(())
}

/// Read a WAV file into mono f32 samples.
fn read_wav(path: &Path) -> Result<SynthAudio, SpeechError> {
    let mut reader =
        hound::WavReader::open(path).map_err(|e| SpeechError::SynthesisError(e.to_string()))?;
    let spec = reader.spec();

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| SpeechError::SynthesisError(e.to_string()))?,
        hound::SampleFormat::Int => {
            #[allow(clippy::cast_precision_loss)]
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| {
                    #[allow(clippy::cast_precision_loss)]
                    s.map(|v| v as f32 / scale)
                })
                .collect::<Result<_, _>>()
                .map_err(|e| SpeechError::SynthesisError(e.to_string()))?
        }
    };

    // espeak-ng writes mono, but mix down defensively if not.
    let samples = if spec.channels > 1 {
        raw.chunks_exact(spec.channels as usize)
            .map(|frame| frame.iter().sum::<f32>() / f32::from(spec.channels))
            .collect()
    } else {
        raw
    };

    #[allow(clippy::cast_precision_loss)]
    let duration = Duration::from_secs_f64(samples.len() as f64 / f64::from(spec.sample_rate));

    Ok(SynthAudio {
        samples,
        sample_rate: spec.sample_rate,
        duration,
    })
}

// ── Voice listing ──────────────────────────────────────────────────

/// Parse `espeak-ng --voices` output into catalog entries.
///
/// The listing is a header line followed by one voice per line:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
/// ```
///
/// The `File` column becomes the voice ID (unique, accepted by `-v`);
/// underscores in `VoiceName` are display spacing.
fn parse_voice_listing(listing: &str) -> Vec<VoiceInfo> {
    listing
        .lines()
        .skip(1) // header
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 5 {
                return None;
            }
            Some(VoiceInfo::new(
                parts[4],
                parts[3].replace('_', " "),
                parts[1],
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_map_to_engine_defaults() {
        let request = SynthRequest::new("hi", "gmw/en-US", 1.0, 1.0, 1.0);
        assert_eq!(engine_units(&request), (175, 100, 50));
    }

    #[test]
    fn extreme_settings_are_clamped_to_engine_ranges() {
        let slow_quiet = SynthRequest::new("hi", "v", 0.1, 0.1, 0.0);
        assert_eq!(engine_units(&slow_quiet), (80, 0, 5));

        let fast_loud = SynthRequest::new("hi", "v", 2.0, 2.0, 1.0);
        assert_eq!(engine_units(&fast_loud), (350, 100, 99));
    }

    #[test]
    fn voice_listing_parses_standard_output() {
        let listing = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 5  en-us           --/M      English_(America)  gmw/en-US            (en 10)
 5  en-gb           --/M      English_(Great_Britain) gmw/en          (en 2)";

        let voices = parse_voice_listing(listing);
        assert_eq!(voices.len(), 3);
        assert_eq!(voices[0].id, "gmw/af");
        assert_eq!(voices[0].name, "Afrikaans");
        assert_eq!(voices[0].language, "af");
        assert_eq!(voices[1].id, "gmw/en-US");
        assert_eq!(voices[1].name, "English (America)");
        assert_eq!(voices[2].name, "English (Great Britain)");
    }

    #[test]
    fn voice_listing_skips_malformed_lines() {
        let listing = "header\n\n 5  en\ngarbage";
        assert!(parse_voice_listing(listing).is_empty());
    }

    #[test]
    fn wav_round_trip_preserves_rate_and_length() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..2_205 {
            #[allow(clippy::cast_precision_loss)]
            let s = (f32::from(i16::MAX) * 0.5 * (i as f32 * 0.05).sin()) as i16;
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let audio = read_wav(&path).unwrap();
        assert_eq!(audio.sample_rate, 22_050);
        assert_eq!(audio.samples.len(), 2_205);
        assert!(audio.samples.iter().all(|s| s.abs() <= 1.0));
        assert_eq!(audio.duration.as_millis(), 100);
    }
}
