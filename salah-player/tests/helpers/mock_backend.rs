//! Scripted audio backend
//!
//! Clips never produce sound. Tests decide when a clip ends or fails by
//! calling `finish_current` / `fail_current`, which deliver notifications
//! through the same channel a real resource would use.

use salah_player::audio::{AudioBackend, AudioResource, PlayError, ResourceId, ResourceNotifier};
use salah_player::error::AudioError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipState {
    Loaded,
    Playing,
    Paused,
    Stopped,
}

struct Clip {
    id: ResourceId,
    path: PathBuf,
    state: ClipState,
    play_calls: usize,
    notifier: ResourceNotifier,
}

#[derive(Default)]
struct Inner {
    clips: Vec<Clip>,
    reject_play: bool,
    missing: HashSet<String>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<Inner>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `play()` fail with `PlaybackRejected`
    pub fn set_reject_play(&self, reject: bool) {
        self.inner.lock().unwrap().reject_play = reject;
    }

    /// Report `AssetNotFound` for clips whose file stem is `audio_id`
    pub fn set_missing(&self, audio_id: &str) {
        self.inner.lock().unwrap().missing.insert(audio_id.to_string());
    }

    /// File stems of all loaded clips, in load order
    pub fn loads(&self) -> Vec<String> {
        self.inner
            .lock()
            .unwrap()
            .clips
            .iter()
            .map(|c| stem(&c.path))
            .collect()
    }

    pub fn load_count(&self) -> usize {
        self.inner.lock().unwrap().clips.len()
    }

    /// Clips loaded and not yet stopped
    pub fn active_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .clips
            .iter()
            .filter(|c| c.state != ClipState::Stopped)
            .count()
    }

    /// Id of the most recently loaded clip
    pub fn last_id(&self) -> ResourceId {
        self.inner.lock().unwrap().clips.last().expect("no clip loaded").id
    }

    pub fn state_of(&self, id: ResourceId) -> ClipState {
        self.with_clip(id, |c| c.state)
    }

    pub fn play_calls(&self, id: ResourceId) -> usize {
        self.with_clip(id, |c| c.play_calls)
    }

    /// Path the player resolved for the most recent clip
    pub fn last_path(&self) -> PathBuf {
        self.inner.lock().unwrap().clips.last().expect("no clip loaded").path.clone()
    }

    /// Report the end of the most recent clip
    pub fn finish_current(&self) -> ResourceId {
        let id = self.last_id();
        self.notify_ended(id);
        id
    }

    /// Report a failure of the most recent clip
    pub fn fail_current(&self, error: AudioError) -> ResourceId {
        let id = self.last_id();
        self.notify_failed(id, error);
        id
    }

    /// Report the end of any clip, including released ones
    pub fn notify_ended(&self, id: ResourceId) {
        self.with_clip(id, |c| c.notifier.ended());
    }

    pub fn notify_failed(&self, id: ResourceId, error: AudioError) {
        self.with_clip(id, |c| c.notifier.failed(error));
    }

    fn with_clip<T>(&self, id: ResourceId, f: impl FnOnce(&mut Clip) -> T) -> T {
        let mut inner = self.inner.lock().unwrap();
        let clip = inner
            .clips
            .iter_mut()
            .find(|c| c.id == id)
            .unwrap_or_else(|| panic!("unknown clip {}", id));
        f(clip)
    }
}

impl AudioBackend for MockBackend {
    fn load(&self, id: ResourceId, path: &Path, notifier: ResourceNotifier) -> Box<dyn AudioResource> {
        let mut inner = self.inner.lock().unwrap();
        if missing(&inner.missing, path) {
            notifier.failed(AudioError::AssetNotFound {
                path: path.to_path_buf(),
            });
        }
        inner.clips.push(Clip {
            id,
            path: path.to_path_buf(),
            state: ClipState::Loaded,
            play_calls: 0,
            notifier,
        });

        Box::new(MockResource {
            id,
            inner: Arc::clone(&self.inner),
        })
    }
}

struct MockResource {
    id: ResourceId,
    inner: Arc<Mutex<Inner>>,
}

impl MockResource {
    fn set_state(&self, state: ClipState) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(clip) = inner.clips.iter_mut().find(|c| c.id == self.id) {
            if clip.state != ClipState::Stopped {
                clip.state = state;
            }
        }
    }
}

impl AudioResource for MockResource {
    fn id(&self) -> ResourceId {
        self.id
    }

    fn play(&mut self) -> Result<(), PlayError> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        let reject = inner.reject_play;
        let Some(clip) = inner.clips.iter_mut().find(|c| c.id == self.id) else {
            return Err(PlayError::Failed);
        };
        clip.play_calls += 1;

        // A clip that failed to load has no worker left to start
        if missing(&inner.missing, &clip.path) {
            return Err(PlayError::Failed);
        }
        if reject {
            return Err(PlayError::Rejected(AudioError::PlaybackRejected {
                reason: "NotAllowedError".to_string(),
            }));
        }
        clip.state = ClipState::Playing;
        Ok(())
    }

    fn pause(&mut self) {
        self.set_state(ClipState::Paused);
    }

    fn stop(&mut self) {
        self.set_state(ClipState::Stopped);
    }
}

fn missing(missing: &HashSet<String>, path: &Path) -> bool {
    missing.contains(&stem(path))
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}
