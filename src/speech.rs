//! Pronunciation playback state
//!
//! The platform fetches and plays the audio; this only tracks what the UI
//! should show. Any failure drops back to idle without sound.

use crate::error::SpeechError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpeechStatus {
    #[default]
    Idle,
    /// Audio requested, not yet playing
    Pending { word: String },
    Playing { word: String },
}

#[derive(Debug, Clone, Default)]
pub struct SpeechState {
    status: SpeechStatus,
    enabled: bool,
}

impl SpeechState {
    pub fn new(enabled: bool) -> Self {
        Self {
            status: SpeechStatus::Idle,
            enabled,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn status(&self) -> &SpeechStatus {
        &self.status
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.status, SpeechStatus::Playing { .. })
    }

    /// Ask to pronounce `word`. Returns the word to fetch, or `None` when
    /// speech is disabled. A newer word replaces whatever was pending.
    pub fn request(&mut self, word: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        self.status = SpeechStatus::Pending {
            word: word.to_string(),
        };
        Some(word.to_string())
    }

    /// Playback of `word` started. Ignored if a newer word took over.
    pub fn started(&mut self, word: &str) {
        if matches!(&self.status, SpeechStatus::Pending { word: w } if w == word) {
            self.status = SpeechStatus::Playing {
                word: word.to_string(),
            };
        }
    }

    /// Playback of `word` ended
    pub fn finished(&mut self, word: &str) {
        let current = match &self.status {
            SpeechStatus::Pending { word } | SpeechStatus::Playing { word } => Some(word.as_str()),
            SpeechStatus::Idle => None,
        };
        if current == Some(word) {
            self.status = SpeechStatus::Idle;
        }
    }

    /// Fetch, decode or playback of `word` failed; skip silently
    pub fn failed(&mut self, word: &str, err: &SpeechError) {
        log::warn!("Pronunciation of {} skipped: {}", word, err);
        self.finished(word);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut s = SpeechState::new(true);
        assert_eq!(s.request("Apple").as_deref(), Some("Apple"));
        assert!(!s.is_playing());
        s.started("Apple");
        assert!(s.is_playing());
        s.finished("Apple");
        assert_eq!(s.status(), &SpeechStatus::Idle);
    }

    #[test]
    fn test_disabled_never_requests() {
        let mut s = SpeechState::new(false);
        assert!(s.request("Apple").is_none());
        assert_eq!(s.status(), &SpeechStatus::Idle);
    }

    #[test]
    fn test_stale_completion_ignored() {
        let mut s = SpeechState::new(true);
        s.request("Apple");
        s.request("Banana");
        s.started("Apple");
        assert!(!s.is_playing());
        s.failed("Apple", &SpeechError::Empty);
        assert_eq!(
            s.status(),
            &SpeechStatus::Pending {
                word: "Banana".into()
            }
        );
    }
}
