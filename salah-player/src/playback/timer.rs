//! Delayed auto-advance timer
//!
//! At most one advance is pending at a time. A pending advance is a spawned
//! tokio task that sleeps, then sends its generation to the player. Cancel
//! aborts the task; a message that was already in flight is recognised as
//! stale by `take_fired` because nothing is pending for its generation.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

struct PendingAdvance {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct AdvanceTimer {
    delay: Duration,
    tx: mpsc::UnboundedSender<u64>,
    pending: Option<PendingAdvance>,
}

impl AdvanceTimer {
    pub fn new(delay: Duration, tx: mpsc::UnboundedSender<u64>) -> Self {
        Self {
            delay,
            tx,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule an advance for `generation`, replacing any pending one
    pub fn schedule(&mut self, generation: u64) {
        self.cancel();

        let tx = self.tx.clone();
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(generation);
        });

        trace!("Advance scheduled for generation {} in {:?}", generation, delay);
        self.pending = Some(PendingAdvance { generation, handle });
    }

    /// Abort the pending advance; true if one was pending
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.handle.abort();
                trace!("Advance for generation {} cancelled", pending.generation);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Claim a fired advance; false when `generation` is not the pending one
    pub fn take_fired(&mut self, generation: u64) -> bool {
        match &self.pending {
            Some(pending) if pending.generation == generation => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}

impl Drop for AdvanceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
