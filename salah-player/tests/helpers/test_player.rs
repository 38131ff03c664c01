//! Player task wired to a `MockBackend`
//!
//! All tests using this run under `#[tokio::test(start_paused = true)]`, so
//! the advance delay elapses only when a test sleeps past it.

use super::MockBackend;
use salah_common::events::{EventBus, SalahEvent};
use salah_common::{Catalog, Language, Prayer, Step};
use salah_player::{spawn_player, PlayerHandle, PlayerSnapshot};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

pub const ADVANCE_DELAY: Duration = Duration::from_millis(2000);

pub struct TestPlayer {
    pub handle: PlayerHandle,
    pub backend: MockBackend,
    pub events: broadcast::Receiver<SalahEvent>,
    task: JoinHandle<()>,
}

impl TestPlayer {
    pub fn new() -> Self {
        Self::with_catalog(test_catalog())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        let backend = MockBackend::new();
        let resolver = |language: Language, audio_id: &str| {
            PathBuf::from(format!("/assets/mp3/{}/{}.mp3", language, audio_id))
        };
        let (handle, task) = spawn_player(
            Arc::new(catalog),
            Box::new(backend.clone()),
            Arc::new(resolver),
            ADVANCE_DELAY,
            EventBus::new(256),
        );
        let events = handle.subscribe();

        Self {
            handle,
            backend,
            events,
            task,
        }
    }

    /// Select language and prayer, then start
    pub async fn start(&self, language: Language, prayer: &str) {
        self.handle.select_language(language).await.unwrap();
        self.handle.select_prayer(prayer).await.unwrap();
        self.handle.start().await.unwrap();
    }

    pub async fn snapshot(&self) -> PlayerSnapshot {
        self.handle.snapshot().await
    }

    /// Finish the current clip and let the player react
    pub async fn finish_current(&self) {
        self.backend.finish_current();
        settle().await;
    }

    pub fn drain_events(&mut self) -> Vec<SalahEvent> {
        drain_events(&mut self.events)
    }

    /// Drop the handle and wait for the player task to stop
    pub async fn shutdown(self) {
        drop(self.handle);
        self.task.await.unwrap();
    }
}

/// Let the player task process pending notifications
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn drain_events(rx: &mut broadcast::Receiver<SalahEvent>) -> Vec<SalahEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn step(name: &str, audio: &str) -> Step {
    Step {
        name: name.to_string(),
        audio_id: audio.to_string(),
    }
}

/// Fajr with three steps, Maghrib with five, and an empty prayer
pub fn test_catalog() -> Catalog {
    Catalog::new(vec![
        Prayer {
            name: "Fajr".to_string(),
            audio_id: "fajr".to_string(),
            description: Some("Two rakat before sunrise".to_string()),
            rakat: Some(2),
            sequence: vec![
                step("Niyyah", "niyyah_fajr"),
                step("Takbir", "takbir"),
                step("Qiyam", "qiyam_fatiha"),
            ],
        },
        Prayer {
            name: "Maghrib".to_string(),
            audio_id: "maghrib".to_string(),
            description: None,
            rakat: Some(3),
            sequence: vec![
                step("Niyyah", "niyyah_maghrib"),
                step("Takbir", "takbir"),
                step("Qiyam", "qiyam_fatiha"),
                step("Ruku", "ruku"),
                step("Sujud", "sujud"),
            ],
        },
        Prayer {
            name: "Empty".to_string(),
            audio_id: "empty".to_string(),
            description: None,
            rakat: None,
            sequence: vec![],
        },
    ])
    .unwrap()
}
