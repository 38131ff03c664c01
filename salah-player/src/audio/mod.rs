//! Audio resource abstraction
//!
//! The sequence player treats audio playback as an opaque capability: a
//! backend loads a clip into an `AudioResource`, the player drives it with
//! play/pause/stop, and completion or failure arrives later through the
//! `ResourceNotifier` handed to `load`. Load never fails synchronously;
//! missing or undecodable files are reported as `ResourceEvent`s.
//!
//! `CpalBackend` is the native implementation (symphonia decode, rubato
//! resample, cpal output).

pub mod decode;
pub mod output;
pub mod resampler;

pub use output::CpalBackend;

use crate::error::AudioError;
use std::path::Path;
use tokio::sync::mpsc;
use tracing::trace;

/// Identity of one loaded clip instance
///
/// Assigned by the player, unique for the lifetime of the player. Used to
/// drop notifications from instances that have since been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "res-{}", self.0)
    }
}

/// Asynchronous outcome reported by a resource
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceEventKind {
    /// Clip played to the end
    Ended,
    /// Clip failed to load or play
    Failed(AudioError),
}

/// Notification tagged with the resource that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEvent {
    pub id: ResourceId,
    pub kind: ResourceEventKind,
}

/// Sending half given to a resource for its notifications
#[derive(Debug, Clone)]
pub struct ResourceNotifier {
    id: ResourceId,
    tx: mpsc::UnboundedSender<ResourceEvent>,
}

impl ResourceNotifier {
    pub fn new(id: ResourceId, tx: mpsc::UnboundedSender<ResourceEvent>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Report that the clip finished
    pub fn ended(&self) {
        self.send(ResourceEventKind::Ended);
    }

    /// Report a load or playback failure
    pub fn failed(&self, error: AudioError) {
        self.send(ResourceEventKind::Failed(error));
    }

    fn send(&self, kind: ResourceEventKind) {
        // Player gone means nobody cares about this clip any more
        if self.tx.send(ResourceEvent { id: self.id, kind }).is_err() {
            trace!("Dropped notification from {}: player stopped", self.id);
        }
    }
}

/// Why `play()` did not start the clip
#[derive(Debug, Clone, PartialEq)]
pub enum PlayError {
    /// The output refused to start playback
    Rejected(AudioError),
    /// The clip already failed to load; its `Failed` notification is queued
    Failed,
}

/// One loaded clip
///
/// Dropping a resource must release it; `stop` does so explicitly.
pub trait AudioResource: Send {
    fn id(&self) -> ResourceId;

    /// Start or resume playback from the current position
    ///
    /// Success only means the request was accepted; a later failure still
    /// arrives as a notification.
    fn play(&mut self) -> Result<(), PlayError>;

    /// Pause, keeping the position
    fn pause(&mut self);

    /// Stop and release the clip; no notifications follow
    fn stop(&mut self);
}

/// Factory for audio resources
pub trait AudioBackend: Send + 'static {
    /// Begin loading `path`; outcome arrives through `notifier`
    fn load(&self, id: ResourceId, path: &Path, notifier: ResourceNotifier) -> Box<dyn AudioResource>;
}
