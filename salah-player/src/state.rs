//! Shared player state
//!
//! The player task is the only writer. Presentation code reads the latest
//! `PlayerSnapshot` and subscribes to the event bus.

use salah_common::events::{EventBus, FailureKind, PlayerStatus, SalahEvent};
use salah_common::Language;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

/// Failure of the current step, as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepFailure {
    pub index: usize,
    pub step_name: String,
    pub kind: FailureKind,
    pub message: String,
    pub guidance: String,
}

/// Read-only view of the player for rendering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub status: PlayerStatus,
    pub language: Option<Language>,
    pub prayer: Option<String>,
    pub current_index: Option<usize>,
    pub total_steps: usize,
    pub current_step: Option<String>,
    pub is_playing: bool,
    pub is_paused: bool,
    /// Auto-advance to the next step is scheduled
    pub advance_pending: bool,
    pub last_failure: Option<StepFailure>,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self {
            status: PlayerStatus::Idle,
            language: None,
            prayer: None,
            current_index: None,
            total_steps: 0,
            current_step: None,
            is_playing: false,
            is_paused: false,
            advance_pending: false,
            last_failure: None,
        }
    }
}

/// State shared between the player task and its handles
pub struct SharedState {
    snapshot: RwLock<PlayerSnapshot>,
    events: EventBus,
}

impl SharedState {
    pub fn new(events: EventBus) -> Self {
        Self {
            snapshot: RwLock::new(PlayerSnapshot::default()),
            events,
        }
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn publish(&self, snapshot: PlayerSnapshot) {
        *self.snapshot.write().await = snapshot;
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to player events
    pub fn subscribe_events(&self) -> broadcast::Receiver<SalahEvent> {
        self.events.subscribe()
    }
}
