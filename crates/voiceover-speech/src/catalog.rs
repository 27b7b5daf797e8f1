//! Voice catalog — the engine's voice list plus the session's selection.
//!
//! Selection rules:
//! - When a delivery makes voices available and nothing is selected yet,
//!   the first entry becomes the selection.
//! - Re-delivery of the same list is a no-op.
//! - An existing selection is never cleared by a delivery, even if the
//!   selected ID is no longer in the list.

use voiceover_core::domain::VoiceInfo;

use crate::error::SpeechError;

/// The session's view of available voices and which one is selected.
#[derive(Debug, Default)]
pub struct VoiceCatalog {
    voices: Vec<VoiceInfo>,
    selected: Option<String>,
}

impl VoiceCatalog {
    /// Create an empty catalog with no selection.
    pub const fn new() -> Self {
        Self {
            voices: Vec::new(),
            selected: None,
        }
    }

    /// Replace the voice list with a fresh engine delivery.
    ///
    /// Defaults the selection to the first entry when none exists yet.
    /// Never clears an existing selection.
    pub fn replace(&mut self, voices: Vec<VoiceInfo>) {
        self.voices = voices;
        if self.selected.is_none() {
            if let Some(first) = self.voices.first() {
                tracing::debug!(voice_id = %first.id, "Defaulting voice selection to first entry");
                self.selected = Some(first.id.clone());
            }
        }
    }

    /// Select a voice by ID.
    pub fn select(&mut self, voice_id: &str) -> Result<(), SpeechError> {
        if self.voices.iter().any(|v| v.id == voice_id) {
            self.selected = Some(voice_id.to_owned());
            Ok(())
        } else {
            Err(SpeechError::UnknownVoice(voice_id.to_owned()))
        }
    }

    /// ID of the selected voice, if any.
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// All voices in the catalog.
    pub fn voices(&self) -> &[VoiceInfo] {
        &self.voices
    }

    /// Number of voices in the catalog.
    pub fn len(&self) -> usize {
        self.voices.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_voices() -> Vec<VoiceInfo> {
        vec![
            VoiceInfo::new("v1", "Alpha", "en-US"),
            VoiceInfo::new("v2", "Beta", "en-GB"),
        ]
    }

    #[test]
    fn first_delivery_selects_first_voice() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(sample_voices());
        assert_eq!(catalog.selected_id(), Some("v1"));
    }

    #[test]
    fn empty_delivery_leaves_no_selection() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(Vec::new());
        assert_eq!(catalog.selected_id(), None);
    }

    #[test]
    fn redelivery_keeps_existing_selection() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(sample_voices());
        catalog.select("v2").unwrap();
        catalog.replace(sample_voices());
        assert_eq!(catalog.selected_id(), Some("v2"));
    }

    #[test]
    fn delivery_never_clears_selection() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(sample_voices());
        catalog.select("v2").unwrap();
        // v2 disappears from the next delivery; selection stays.
        catalog.replace(vec![VoiceInfo::new("v1", "Alpha", "en-US")]);
        assert_eq!(catalog.selected_id(), Some("v2"));
    }

    #[test]
    fn select_unknown_voice_is_an_error() {
        let mut catalog = VoiceCatalog::new();
        catalog.replace(sample_voices());
        let err = catalog.select("nope").unwrap_err();
        assert!(matches!(err, SpeechError::UnknownVoice(id) if id == "nope"));
        // Failed select leaves the previous selection intact.
        assert_eq!(catalog.selected_id(), Some("v1"));
    }
}
