//! Error types for salah-player
//!
//! `Error` covers rejected commands and setup problems. `AudioError` is the
//! step failure taxonomy reported by audio resources; it never aborts the
//! player, it is surfaced to observers and leaves the session on the step.

use salah_common::events::FailureKind;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for salah-player
#[derive(Error, Debug)]
pub enum Error {
    /// Shared catalog/config errors
    #[error(transparent)]
    Common(#[from] salah_common::Error),

    /// Player configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Step audio errors
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// `start()` on a prayer without steps
    #[error("Prayer '{0}' has no steps to play")]
    EmptySequence(String),

    /// Language or prayer not chosen yet
    #[error("Nothing selected: {0}")]
    NoSelection(String),

    /// Command not valid in the current player state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Unknown prayer or out-of-range step
    #[error("Not found: {0}")]
    NotFound(String),

    /// Player task is gone
    #[error("Player service stopped")]
    ChannelClosed,
}

/// Convenience Result type using salah-player Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failure of one step's audio
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AudioError {
    /// Resolved file does not exist
    #[error("Audio file not found: {}", path.display())]
    AssetNotFound { path: PathBuf },

    /// File exists but could not be read
    #[error("Failed to load {}: {message}", path.display())]
    LoadError { path: PathBuf, message: String },

    /// Output refused to start playback
    #[error("Playback rejected: {reason}")]
    PlaybackRejected { reason: String },

    /// File exists but cannot be decoded
    #[error("Unsupported audio format for {}: {detail}", path.display())]
    UnsupportedFormat { path: PathBuf, detail: String },
}

impl AudioError {
    /// Category reported in `StepFailed` events
    pub fn kind(&self) -> FailureKind {
        match self {
            AudioError::AssetNotFound { .. } => FailureKind::AssetNotFound,
            AudioError::LoadError { .. } => FailureKind::LoadError,
            AudioError::PlaybackRejected { .. } => FailureKind::PlaybackRejected,
            AudioError::UnsupportedFormat { .. } => FailureKind::UnsupportedFormat,
        }
    }

    /// User-facing hint for recovering from the failure
    pub fn guidance(&self) -> &'static str {
        match self {
            AudioError::AssetNotFound { .. } => {
                "Check that the file exists under the asset root and that its name matches the catalog audio id"
            }
            AudioError::LoadError { .. } => "Check file permissions, then select the step again",
            AudioError::PlaybackRejected { .. } => {
                "Playback was blocked by the audio output; check the output device, then retry the step"
            }
            AudioError::UnsupportedFormat { .. } => "Re-encode the clip as MP3 and select the step again",
        }
    }
}
