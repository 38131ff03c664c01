//! Player service task
//!
//! `SequencePlayer` lives inside one tokio task. Commands arrive over an
//! mpsc channel with a oneshot reply; resource notifications and fired
//! advances arrive on their own channels. Everything is applied in order by
//! the single task, so no handler ever races another.
//!
//! After each input the task publishes a fresh `PlayerSnapshot` to the
//! `SharedState`. A command's reply is sent only after its snapshot is
//! visible.

use crate::assets::AssetResolver;
use crate::audio::{AudioBackend, ResourceEvent};
use crate::error::{Error, Result};
use crate::playback::player::{Command, SequencePlayer};
use crate::state::{PlayerSnapshot, SharedState};
use salah_common::events::{EventBus, SalahEvent};
use salah_common::{Catalog, Language};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Command queue depth
const COMMAND_CAPACITY: usize = 32;

struct Request {
    command: Command,
    reply: oneshot::Sender<Result<()>>,
}

/// Cloneable handle for controlling the player task
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Request>,
    state: Arc<SharedState>,
}

/// Start the player task
///
/// The task ends when every `PlayerHandle` has been dropped; it stops any
/// active session on the way out.
pub fn spawn_player(
    catalog: Arc<Catalog>,
    backend: Box<dyn AudioBackend>,
    resolver: Arc<dyn AssetResolver>,
    advance_delay: Duration,
    events: EventBus,
) -> (PlayerHandle, JoinHandle<()>) {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (resource_tx, resource_rx) = mpsc::unbounded_channel();
    let (timer_tx, timer_rx) = mpsc::unbounded_channel();

    let state = Arc::new(SharedState::new(events.clone()));
    let player = SequencePlayer::new(
        catalog,
        backend,
        resolver,
        events,
        advance_delay,
        resource_tx,
        timer_tx,
    );

    let task = tokio::spawn(run(player, Arc::clone(&state), command_rx, resource_rx, timer_rx));

    let handle = PlayerHandle {
        commands: command_tx,
        state,
    };
    (handle, task)
}

async fn run(
    mut player: SequencePlayer,
    state: Arc<SharedState>,
    mut commands: mpsc::Receiver<Request>,
    mut resources: mpsc::UnboundedReceiver<ResourceEvent>,
    mut timers: mpsc::UnboundedReceiver<u64>,
) {
    info!("Player task started");

    loop {
        tokio::select! {
            // Completions first, so a command issued after a clip ended sees the ended step
            biased;

            Some(event) = resources.recv() => {
                player.on_resource_event(event);
                state.publish(player.snapshot()).await;
            }

            Some(generation) = timers.recv() => {
                player.on_advance_due(generation);
                state.publish(player.snapshot()).await;
            }

            request = commands.recv() => {
                let Some(Request { command, reply }) = request else {
                    break;
                };
                debug!("Command: {:?}", command);
                let result = player.execute(command);
                state.publish(player.snapshot()).await;
                let _ = reply.send(result);
            }
        }
    }

    let _ = player.execute(Command::Stop);
    state.publish(player.snapshot()).await;
    info!("Player task stopped");
}

impl PlayerHandle {
    async fn send(&self, command: Command) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Request { command, reply })
            .await
            .map_err(|_| Error::ChannelClosed)?;
        response.await.map_err(|_| Error::ChannelClosed)?
    }

    /// Choose the language; clears the prayer selection and ends any session
    pub async fn select_language(&self, language: Language) -> Result<()> {
        self.send(Command::SelectLanguage(language)).await
    }

    /// Choose a prayer by name; ends any session
    pub async fn select_prayer(&self, name: impl Into<String>) -> Result<()> {
        self.send(Command::SelectPrayer(name.into())).await
    }

    /// Return to the prayer list; ends any session
    pub async fn back_to_prayers(&self) -> Result<()> {
        self.send(Command::BackToPrayers).await
    }

    /// Start the selected prayer from its first step
    pub async fn start(&self) -> Result<()> {
        self.send(Command::Start).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(Command::Resume).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.send(Command::Previous).await
    }

    pub async fn next(&self) -> Result<()> {
        self.send(Command::Next).await
    }

    /// Go to step `index` (0-based)
    pub async fn jump_to(&self, index: usize) -> Result<()> {
        self.send(Command::JumpTo(index)).await
    }

    /// End the session and release its audio
    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    /// Latest published player state
    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.state.snapshot().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SalahEvent> {
        self.state.subscribe_events()
    }
}
