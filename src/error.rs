//! Error types
//!
//! Only initialization failures are fatal. Advice and pronunciation failures
//! are recovered locally (fallback message, silent skip). A detection miss and
//! a double consumption are not errors at all.

use thiserror::Error;

/// Fatal session start failures
#[derive(Error, Debug)]
pub enum InitError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Face landmark detector unavailable: {0}")]
    DetectorUnavailable(String),

    #[error("Missing page element #{0}")]
    MissingElement(&'static str),

    #[error("Could not acquire a 2D canvas context")]
    CanvasContext,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Advice service failures (never fatal)
#[derive(Error, Debug)]
pub enum AdviceError {
    #[error("Advice request failed: {0}")]
    Transport(String),

    #[error("Advice service returned HTTP {0}")]
    Status(u16),

    #[error("Could not parse advice response: {0}")]
    Parse(String),
}

/// Pronunciation service failures (playback is silently skipped)
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Pronunciation request failed: {0}")]
    Transport(String),

    #[error("Could not decode pronunciation audio: {0}")]
    Decode(String),

    #[error("Pronunciation service returned no audio")]
    Empty,
}

/// Game configuration problems
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
