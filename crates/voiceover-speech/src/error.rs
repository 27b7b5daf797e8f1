//! Speech session error types.

/// Errors that can occur in the speech session.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// No audio input device found.
    #[error("No audio input device found")]
    NoInputDevice,

    /// Failed to open audio input stream.
    #[error("Failed to open audio input stream: {0}")]
    InputStreamError(String),

    /// Failed to open audio output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// The synthesis engine could not be found or started.
    #[error("Synthesis engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Failed to synthesize speech.
    #[error("Speech synthesis failed: {0}")]
    SynthesisError(String),

    /// The requested voice is not in the catalog.
    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    /// An utterance is already playing.
    #[error("An utterance is already playing")]
    AlreadySpeaking,

    /// Failed to write the recording artifact to disk.
    #[error("Failed to write audio artifact: {0}")]
    ArtifactError(String),

    /// IO error (temp files, artifact directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The dedicated audio thread is no longer running.
    #[error("Audio thread died")]
    AudioThreadDied,
}
