//! # Salah Sequence Player Library (salah-player)
//!
//! Guided playback of the steps of a prayer, one audio clip per step, with
//! pause/resume, step navigation and a short delay between steps.
//!
//! **Architecture:** `SequencePlayer` state machine owned by a single tokio
//! task (`spawn_player`), driving clips through the `AudioBackend` trait.
//! The native backend decodes with symphonia, resamples with rubato and
//! plays through cpal.

pub mod assets;
pub mod audio;
pub mod config;
pub mod error;
pub mod playback;
pub mod selection;
pub mod state;

pub use error::{Error, Result};
pub use playback::{spawn_player, PlayerHandle};
pub use state::{PlayerSnapshot, SharedState};
