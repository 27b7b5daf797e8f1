//! Audio playback module — synthesized speech output via `rodio`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rodio::{OutputStream, OutputStreamHandle, Sink};

use crate::error::SpeechError;

/// Callback invoked when playback finishes naturally (all queued audio drained).
pub type PlaybackDoneCallback = Box<dyn FnOnce() + Send + 'static>;

/// Audio playback handle for synthesized speech.
///
/// Wraps `rodio` for audio output. Audio is queued onto a streaming sink;
/// a completion watcher thread fires a one-shot callback when the sink
/// drains naturally. An explicit [`stop`](AudioPlayback::stop) suppresses
/// the callback.
pub struct AudioPlayback {
    /// rodio output stream (must be kept alive).
    _stream: OutputStream,

    /// Handle used to create sinks.
    stream_handle: OutputStreamHandle,

    /// Current playback sink (if any).
    sink: Option<Arc<Sink>>,

    /// Whether playback is in progress.
    is_playing: Arc<AtomicBool>,
}

impl AudioPlayback {
    /// Create a new audio playback instance using the default output device.
    pub fn new() -> Result<Self, SpeechError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| SpeechError::OutputStreamError(e.to_string()))?;

        tracing::info!("Audio playback initialized on default output device");

        Ok(Self {
            _stream: stream,
            stream_handle,
            sink: None,
            is_playing: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Prepare a fresh sink for streaming playback.
    ///
    /// Subsequent audio chunks are queued via [`append`](Self::append).
    /// Call [`spawn_completion_watcher`](Self::spawn_completion_watcher)
    /// after the last chunk so the `on_done` callback fires when audio
    /// drains.
    pub fn start_streaming(&mut self) -> Result<(), SpeechError> {
        // Stop any existing playback
        self.stop();

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| SpeechError::OutputStreamError(e.to_string()))?;
        self.sink = Some(Arc::new(sink));
        self.is_playing.store(true, Ordering::SeqCst);

        tracing::debug!("Streaming playback sink created");
        Ok(())
    }

    /// Queue additional audio samples onto the current playback sink.
    ///
    /// If no sink is active, a new one is created.
    pub fn append(&mut self, samples: Vec<f32>, sample_rate: u32) -> Result<(), SpeechError> {
        let sink = match &self.sink {
            Some(sink) if !sink.empty() || self.is_playing.load(Ordering::SeqCst) => sink,
            _ => {
                let new_sink = Sink::try_new(&self.stream_handle)
                    .map_err(|e| SpeechError::OutputStreamError(e.to_string()))?;
                self.sink = Some(Arc::new(new_sink));
                self.is_playing.store(true, Ordering::SeqCst);
                self.sink.as_ref().expect("just created")
            }
        };

        let source = rodio::buffer::SamplesBuffer::new(1, sample_rate, samples);
        sink.append(source);

        Ok(())
    }

    /// Spawn a background thread that blocks until the sink drains or
    /// playback is stopped externally. On natural completion, invokes
    /// `on_done`; after an explicit [`stop`](Self::stop), the callback is
    /// suppressed.
    pub fn spawn_completion_watcher(&self, on_done: Option<PlaybackDoneCallback>) {
        let Some(sink) = self.sink.clone() else {
            return;
        };
        if sink.empty() {
            // The queue can drain before the watcher is registered; that
            // still counts as natural completion and must fire the callback.
            complete_if_playing(&self.is_playing, on_done);
            return;
        }

        let is_playing = Arc::clone(&self.is_playing);

        // `Sink` is Send in rodio 0.20+, so we can move it into a
        // blocking thread. `sleep_until_end()` blocks until the queue
        // drains or `stop()` is called (which drops the internal
        // sources, causing sleep_until_end to return immediately).
        std::thread::spawn(move || {
            sink.sleep_until_end();
            complete_if_playing(&is_playing, on_done);
        });
    }

    /// Stop any active playback immediately.
    pub fn stop(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.is_playing.store(false, Ordering::SeqCst);
        tracing::debug!("Audio playback stopped");
    }

    /// Check whether audio is currently playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.sink.as_ref().is_some_and(|sink| !sink.empty())
    }

    /// Set playback volume (0.0 = muted, 1.0 = full).
    pub fn set_volume(&self, volume: f32) {
        if let Some(sink) = &self.sink {
            sink.set_volume(volume.clamp(0.0, 1.0));
        }
    }
}

/// Fire `on_done` if playback was still marked live. After an explicit
/// [`AudioPlayback::stop`] the flag is already false and the callback is
/// suppressed — that path owns its own cleanup.
fn complete_if_playing(is_playing: &AtomicBool, on_done: Option<PlaybackDoneCallback>) {
    if !is_playing.swap(false, Ordering::SeqCst) {
        return;
    }

    tracing::debug!("Playback finished naturally");
    if let Some(cb) = on_done {
        cb();
    }
}
