//! Event types for the salah event system
//!
//! Provides the shared event definitions and the EventBus the player
//! publishes on. Presentation layers subscribe to render progress and to
//! surface step failures to the user.

mod playback_types;

pub use playback_types::{FailureKind, PlayerStatus};

use crate::Language;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Salah player event types
///
/// Events are broadcast via EventBus and can be serialized for transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SalahEvent {
    /// Language or prayer selection changed
    SelectionChanged {
        language: Option<Language>,
        prayer: Option<String>,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A playback session was created by `start()`
    SessionStarted {
        session_id: Uuid,
        prayer: String,
        language: Language,
        total_steps: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A step's audio was loaded (and started, unless the session is paused)
    StepStarted {
        session_id: Uuid,
        index: usize,
        step_name: String,
        /// Resolved asset path
        audio_path: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Player status changed
    ///
    /// Triggers:
    /// - UI: Update transport controls
    PlaybackStateChanged {
        old_state: PlayerStatus,
        new_state: PlayerStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Step finished and the advance to the next one is pending
    AdvanceScheduled {
        session_id: Uuid,
        from_index: usize,
        delay_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Step audio failed to load or play
    ///
    /// Emitted once per failed attempt. The session stays on the step.
    StepFailed {
        session_id: Uuid,
        index: usize,
        step_name: String,
        kind: FailureKind,
        message: String,
        /// What the user can do about it
        guidance: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Final step finished; nothing left to advance to
    SequenceCompleted {
        session_id: Uuid,
        prayer: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session destroyed (stop, back to prayer list, selection change)
    SessionEnded {
        session_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SalahEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            SalahEvent::SelectionChanged { .. } => "SelectionChanged",
            SalahEvent::SessionStarted { .. } => "SessionStarted",
            SalahEvent::StepStarted { .. } => "StepStarted",
            SalahEvent::PlaybackStateChanged { .. } => "PlaybackStateChanged",
            SalahEvent::AdvanceScheduled { .. } => "AdvanceScheduled",
            SalahEvent::StepFailed { .. } => "StepFailed",
            SalahEvent::SequenceCompleted { .. } => "SequenceCompleted",
            SalahEvent::SessionEnded { .. } => "SessionEnded",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block the player)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use salah_common::events::{EventBus, PlayerStatus, SalahEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(SalahEvent::PlaybackStateChanged {
///     old_state: PlayerStatus::Idle,
///     new_state: PlayerStatus::Playing,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "PlaybackStateChanged");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SalahEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<SalahEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: SalahEvent) -> Result<usize, broadcast::error::SendError<SalahEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SalahEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers_fails_but_lossy_does_not() {
        let bus = EventBus::new(10);
        let event = SalahEvent::SessionEnded {
            session_id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
        };
        assert!(bus.emit(event.clone()).is_err());
        bus.emit_lossy(event);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_subscribers_receive_events_in_order() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        bus.emit_lossy(SalahEvent::SelectionChanged {
            language: Some(Language::English),
            prayer: None,
            timestamp: chrono::Utc::now(),
        });
        bus.emit_lossy(SalahEvent::SelectionChanged {
            language: Some(Language::English),
            prayer: Some("Fajr".to_string()),
            timestamp: chrono::Utc::now(),
        });

        match rx.try_recv().unwrap() {
            SalahEvent::SelectionChanged { prayer, .. } => assert_eq!(prayer, None),
            other => panic!("unexpected event {:?}", other),
        }
        match rx.try_recv().unwrap() {
            SalahEvent::SelectionChanged { prayer, .. } => assert_eq!(prayer.as_deref(), Some("Fajr")),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_step_failed_serializes_with_type_tag() {
        let event = SalahEvent::StepFailed {
            session_id: Uuid::new_v4(),
            index: 1,
            step_name: "Takbir".to_string(),
            kind: FailureKind::AssetNotFound,
            message: "missing".to_string(),
            guidance: "check the file".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "StepFailed");
        assert_eq!(json["kind"], "AssetNotFound");
        assert_eq!(event.event_type(), "StepFailed");
    }

    #[test]
    fn test_status_display() {
        assert_eq!(PlayerStatus::Completed.to_string(), "completed");
        assert_eq!(FailureKind::PlaybackRejected.to_string(), "PlaybackRejected");
    }
}
