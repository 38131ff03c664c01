//! Sequence player state machine
//!
//! States: Idle → Playing (`start`), Playing ↔ Paused (`pause`/`resume`),
//! Playing → Playing on navigation or auto-advance, Playing → Completed when
//! the last step ends, any → Idle on `stop`.
//!
//! Ownership rules:
//! - at most one `AudioResource` is held; every step change stops and
//!   releases it before the next clip is loaded
//! - notifications are accepted only from the resource currently held
//! - `generation` is bumped whenever a pending advance must die (pause,
//!   stop, navigation); an advance carrying an old generation is ignored

use crate::assets::AssetResolver;
use crate::audio::{
    AudioBackend, AudioResource, PlayError, ResourceEvent, ResourceEventKind, ResourceId, ResourceNotifier,
};
use crate::error::{AudioError, Error, Result};
use crate::playback::session::PlaybackSession;
use crate::playback::timer::AdvanceTimer;
use crate::selection::Selection;
use crate::state::{PlayerSnapshot, StepFailure};
use salah_common::events::{EventBus, PlayerStatus, SalahEvent};
use salah_common::{Catalog, Language};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Commands accepted by the player
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SelectLanguage(Language),
    SelectPrayer(String),
    BackToPrayers,
    Start,
    Pause,
    Resume,
    Previous,
    Next,
    JumpTo(usize),
    Stop,
}

#[derive(Debug, Clone, Copy)]
enum Navigation {
    Previous,
    Next,
    JumpTo(usize),
}

pub struct SequencePlayer {
    catalog: Arc<Catalog>,
    backend: Box<dyn AudioBackend>,
    resolver: Arc<dyn AssetResolver>,
    events: EventBus,
    selection: Selection,
    session: Option<PlaybackSession>,
    active: Option<Box<dyn AudioResource>>,
    timer: AdvanceTimer,
    generation: u64,
    next_resource_id: u64,
    resource_tx: mpsc::UnboundedSender<ResourceEvent>,
    last_failure: Option<StepFailure>,
}

impl SequencePlayer {
    /// Resource notifications go to `resource_tx`, fired advances to `timer_tx`
    pub fn new(
        catalog: Arc<Catalog>,
        backend: Box<dyn AudioBackend>,
        resolver: Arc<dyn AssetResolver>,
        events: EventBus,
        advance_delay: Duration,
        resource_tx: mpsc::UnboundedSender<ResourceEvent>,
        timer_tx: mpsc::UnboundedSender<u64>,
    ) -> Self {
        Self {
            catalog,
            backend,
            resolver,
            events,
            selection: Selection::default(),
            session: None,
            active: None,
            timer: AdvanceTimer::new(advance_delay, timer_tx),
            generation: 0,
            next_resource_id: 1,
            resource_tx,
            last_failure: None,
        }
    }

    pub fn status(&self) -> PlayerStatus {
        self.session
            .as_ref()
            .map(PlaybackSession::status)
            .unwrap_or(PlayerStatus::Idle)
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        let session = self.session.as_ref();
        PlayerSnapshot {
            status: self.status(),
            language: self.selection.language(),
            prayer: self.selection.prayer().map(|p| p.name.clone()),
            current_index: session.map(PlaybackSession::current_index),
            total_steps: session
                .map(PlaybackSession::len)
                .or_else(|| self.selection.prayer().map(|p| p.len()))
                .unwrap_or(0),
            current_step: session.map(|s| s.current_step().name.clone()),
            is_playing: session.map(PlaybackSession::is_playing).unwrap_or(false),
            is_paused: session.map(PlaybackSession::is_paused).unwrap_or(false),
            advance_pending: self.timer.is_pending(),
            last_failure: self.last_failure.clone(),
        }
    }

    /// Apply a command, emitting a state change event if the status moved
    pub fn execute(&mut self, command: Command) -> Result<()> {
        let before = self.status();
        let result = match command {
            Command::SelectLanguage(language) => self.select_language(language),
            Command::SelectPrayer(name) => self.select_prayer(&name),
            Command::BackToPrayers => self.back_to_prayers(),
            Command::Start => self.start(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Previous => self.navigate(Navigation::Previous),
            Command::Next => self.navigate(Navigation::Next),
            Command::JumpTo(index) => self.navigate(Navigation::JumpTo(index)),
            Command::Stop => self.stop(),
        };
        self.emit_status_change(before);
        result
    }

    /// Handle a notification from an audio resource
    pub fn on_resource_event(&mut self, event: ResourceEvent) {
        let before = self.status();

        if self.active.as_ref().map(|r| r.id()) != Some(event.id) {
            debug!("Ignoring {:?} from released {}", event.kind, event.id);
            return;
        }

        match event.kind {
            ResourceEventKind::Ended => {
                self.release_active();
                if let Some(session) = self.session.as_mut() {
                    session.mark_step_finished();
                    debug!("Step {} '{}' finished", session.current_index(), session.current_step().name);
                    if session.is_playing() && !session.is_paused() {
                        self.after_step_finished();
                    }
                }
            }
            ResourceEventKind::Failed(error) => {
                self.release_active();
                self.invalidate_advance();
                self.report_failure(error);
            }
        }

        self.emit_status_change(before);
    }

    /// Handle a fired auto-advance
    pub fn on_advance_due(&mut self, generation: u64) {
        if !self.timer.take_fired(generation) || generation != self.generation {
            debug!("Ignoring stale advance (generation {}, current {})", generation, self.generation);
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.is_playing() || session.is_paused() {
            return;
        }

        if session.step_forward() {
            info!("Auto-advancing to step {}", session.current_index());
            self.load_current(true);
        }
    }

    // ========================================
    // Selection
    // ========================================

    fn select_language(&mut self, language: Language) -> Result<()> {
        self.stop()?;
        self.selection.set_language(language);
        info!("Language selected: {}", language);
        self.emit_selection();
        Ok(())
    }

    fn select_prayer(&mut self, name: &str) -> Result<()> {
        let prayer = self
            .catalog
            .find(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Prayer '{}'", name)))?;

        self.stop()?;
        info!("Prayer selected: {} ({} steps)", prayer.name, prayer.len());
        self.selection.set_prayer(Arc::new(prayer));
        self.emit_selection();
        Ok(())
    }

    fn back_to_prayers(&mut self) -> Result<()> {
        self.stop()?;
        self.selection.clear_prayer();
        self.emit_selection();
        Ok(())
    }

    // ========================================
    // Transport
    // ========================================

    fn start(&mut self) -> Result<()> {
        if matches!(self.status(), PlayerStatus::Playing | PlayerStatus::Paused) {
            return Err(Error::InvalidState("A session is already active".to_string()));
        }

        let prayer = self
            .selection
            .prayer()
            .cloned()
            .ok_or_else(|| Error::NoSelection("no prayer selected".to_string()))?;

        if prayer.is_empty() {
            warn!("Refusing to start '{}': no steps", prayer.name);
            return Err(Error::EmptySequence(prayer.name.clone()));
        }

        let language = self
            .selection
            .language()
            .ok_or_else(|| Error::NoSelection("no language selected".to_string()))?;

        // Replaces a completed session, if any
        self.stop()?;

        let session = PlaybackSession::new(prayer, language)
            .ok_or_else(|| Error::EmptySequence(String::new()))?;

        info!(
            "Starting {} in {} ({} steps, session {})",
            session.prayer().name,
            language,
            session.len(),
            session.id()
        );
        self.events.emit_lossy(SalahEvent::SessionStarted {
            session_id: session.id(),
            prayer: session.prayer().name.clone(),
            language,
            total_steps: session.len(),
            timestamp: chrono::Utc::now(),
        });

        self.session = Some(session);
        self.load_current(true);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let session = self.require_session()?;
        match session.status() {
            PlayerStatus::Completed => {
                return Err(Error::InvalidState("Sequence already completed".to_string()));
            }
            PlayerStatus::Paused | PlayerStatus::Idle => return Ok(()),
            PlayerStatus::Playing => {}
        }

        session.pause();
        self.invalidate_advance();
        if let Some(resource) = self.active.as_mut() {
            resource.pause();
        }
        info!("Paused");
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        let session = self.require_session()?;
        if !session.resume() {
            return Ok(());
        }
        let step_finished = session.step_finished();

        match self.active.as_mut() {
            Some(resource) => match resource.play() {
                Ok(()) => {}
                // Reported when its queued notification arrives
                Err(PlayError::Failed) => debug!("{} already failed", resource.id()),
                Err(PlayError::Rejected(error)) => {
                    // Back to the pre-attempt state; the clip stays loaded for another try
                    if let Some(session) = self.session.as_mut() {
                        session.pause();
                    }
                    self.report_failure(error);
                    return Ok(());
                }
            },
            // The clip ended while paused: continue with the advance
            None if step_finished => self.after_step_finished(),
            // The clip failed earlier: resuming retries it
            None => self.load_current(true),
        }

        info!("Resumed");
        Ok(())
    }

    fn navigate(&mut self, navigation: Navigation) -> Result<()> {
        let session = self.require_session()?;
        if session.status() == PlayerStatus::Completed {
            return Err(Error::InvalidState("Sequence already completed; start it again".to_string()));
        }

        let moved = match navigation {
            Navigation::Previous => session.step_back(),
            Navigation::Next => session.step_forward(),
            Navigation::JumpTo(index) => {
                if !session.set_index(index) {
                    return Err(Error::NotFound(format!(
                        "Step {} (sequence has {} steps)",
                        index,
                        session.len()
                    )));
                }
                true
            }
        };

        if !moved {
            debug!("{:?} ignored at step {}", navigation, session.current_index());
            return Ok(());
        }

        // jump_to keeps a paused session paused; previous/next resume it
        let autoplay = match navigation {
            Navigation::JumpTo(_) => !session.is_paused(),
            Navigation::Previous | Navigation::Next => {
                session.resume();
                true
            }
        };

        debug!("{:?} to step {}", navigation, session.current_index());
        self.load_current(autoplay);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.invalidate_advance();
        self.release_active();
        self.last_failure = None;

        if let Some(session) = self.session.take() {
            info!("Session {} ended at step {}", session.id(), session.current_index());
            self.events.emit_lossy(SalahEvent::SessionEnded {
                session_id: session.id(),
                timestamp: chrono::Utc::now(),
            });
        }
        Ok(())
    }

    // ========================================
    // Internals
    // ========================================

    fn require_session(&mut self) -> Result<&mut PlaybackSession> {
        self.session
            .as_mut()
            .ok_or_else(|| Error::InvalidState("No active session".to_string()))
    }

    /// Release the current clip and load (optionally play) the session's current step
    fn load_current(&mut self, autoplay: bool) {
        self.invalidate_advance();
        self.release_active();
        self.last_failure = None;

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.mark_step_loaded();

        let index = session.current_index();
        let step = session.current_step().clone();
        let path = self.resolver.resolve(session.language(), &step.audio_id);

        let id = ResourceId(self.next_resource_id);
        self.next_resource_id += 1;

        info!("Loading step {} '{}' from {} ({})", index, step.name, path.display(), id);
        let notifier = ResourceNotifier::new(id, self.resource_tx.clone());
        let mut resource = self.backend.load(id, &path, notifier);

        self.events.emit_lossy(SalahEvent::StepStarted {
            session_id: session.id(),
            index,
            step_name: step.name.clone(),
            audio_path: path.display().to_string(),
            timestamp: chrono::Utc::now(),
        });

        if autoplay {
            match resource.play() {
                Ok(()) => {}
                // Held until its queued failure notification arrives
                Err(PlayError::Failed) => debug!("{} failed before play", id),
                Err(PlayError::Rejected(error)) => {
                    resource.stop();
                    self.report_failure(error);
                    return;
                }
            }
        }

        self.active = Some(resource);
    }

    /// Current clip ended while playing: schedule the advance or complete
    fn after_step_finished(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if session.has_next() {
            self.timer.schedule(self.generation);
            self.events.emit_lossy(SalahEvent::AdvanceScheduled {
                session_id: session.id(),
                from_index: session.current_index(),
                delay_ms: self.timer.delay().as_millis() as u64,
                timestamp: chrono::Utc::now(),
            });
        } else {
            session.complete();
            info!("Sequence '{}' completed", session.prayer().name);
            self.events.emit_lossy(SalahEvent::SequenceCompleted {
                session_id: session.id(),
                prayer: session.prayer().name.clone(),
                timestamp: chrono::Utc::now(),
            });
        }
    }

    fn invalidate_advance(&mut self) {
        self.timer.cancel();
        self.generation += 1;
    }

    fn release_active(&mut self) {
        if let Some(mut resource) = self.active.take() {
            debug!("Releasing {}", resource.id());
            resource.stop();
        }
    }

    fn report_failure(&mut self, error: AudioError) {
        let Some(session) = self.session.as_ref() else {
            return;
        };

        let failure = StepFailure {
            index: session.current_index(),
            step_name: session.current_step().name.clone(),
            kind: error.kind(),
            message: error.to_string(),
            guidance: error.guidance().to_string(),
        };
        warn!("Step {} '{}' failed: {}", failure.index, failure.step_name, failure.message);

        self.events.emit_lossy(SalahEvent::StepFailed {
            session_id: session.id(),
            index: failure.index,
            step_name: failure.step_name.clone(),
            kind: failure.kind,
            message: failure.message.clone(),
            guidance: failure.guidance.clone(),
            timestamp: chrono::Utc::now(),
        });
        self.last_failure = Some(failure);
    }

    fn emit_selection(&self) {
        self.events.emit_lossy(SalahEvent::SelectionChanged {
            language: self.selection.language(),
            prayer: self.selection.prayer().map(|p| p.name.clone()),
            timestamp: chrono::Utc::now(),
        });
    }

    fn emit_status_change(&self, before: PlayerStatus) {
        let after = self.status();
        if before != after {
            debug!("Player status {} -> {}", before, after);
            self.events.emit_lossy(SalahEvent::PlaybackStateChanged {
                old_state: before,
                new_state: after,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}

impl Drop for SequencePlayer {
    fn drop(&mut self) {
        self.invalidate_advance();
        self.release_active();
    }
}
