//! Guided playback of a prayer's step sequence
//!
//! - `session`: position and play/pause flags of one run through a sequence
//! - `timer`: the delayed auto-advance between steps
//! - `player`: the state machine tying session, audio and timer together
//! - `service`: the tokio task that owns the player, plus its handle

pub mod player;
pub mod service;
pub mod session;
pub mod timer;

pub use player::{Command, SequencePlayer};
pub use service::{spawn_player, PlayerHandle};
pub use session::PlaybackSession;
pub use timer::AdvanceTimer;
