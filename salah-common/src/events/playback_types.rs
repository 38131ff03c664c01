//! Playback-related type definitions
//!
//! Supporting types for player status and step failures.

use serde::{Deserialize, Serialize};

/// Sequence player status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// No session
    Idle,
    /// Session running (a step playing or an advance pending)
    Playing,
    /// Session paused by the user
    Paused,
    /// Last step finished
    Completed,
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerStatus::Idle => write!(f, "idle"),
            PlayerStatus::Playing => write!(f, "playing"),
            PlayerStatus::Paused => write!(f, "paused"),
            PlayerStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Category of a step audio failure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum FailureKind {
    /// Resolved audio path does not exist
    AssetNotFound,
    /// Asset exists but could not be read or opened
    LoadError,
    /// Output refused to start playback
    PlaybackRejected,
    /// Asset exists but cannot be decoded
    UnsupportedFormat,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::AssetNotFound => write!(f, "AssetNotFound"),
            FailureKind::LoadError => write!(f, "LoadError"),
            FailureKind::PlaybackRejected => write!(f, "PlaybackRejected"),
            FailureKind::UnsupportedFormat => write!(f, "UnsupportedFormat"),
        }
    }
}
