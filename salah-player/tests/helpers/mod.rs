//! Test helper modules for salah-player integration tests
//!
//! Provides reusable test infrastructure components:
//! - MockBackend: scripted audio backend recording every clip it loads
//! - TestPlayer: player task wired to a MockBackend and a small catalog

#![allow(dead_code)]

pub mod mock_backend;
pub mod test_player;

pub use mock_backend::MockBackend;
pub use test_player::{drain_events, settle, TestPlayer, ADVANCE_DELAY};
