//! Playback session state
//!
//! A session is the mutable position within one prayer's sequence. It owns
//! no audio and no timers; those stay with the `SequencePlayer`. Every index
//! mutation is clamped so `current_index < len` always holds.

use salah_common::events::PlayerStatus;
use salah_common::{Language, Prayer, Step};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PlaybackSession {
    id: Uuid,
    prayer: Arc<Prayer>,
    language: Language,
    current_index: usize,
    is_playing: bool,
    is_paused: bool,
    /// Current step's clip played to the end
    step_finished: bool,
}

impl PlaybackSession {
    /// New session at step 0, playing. `None` for an empty sequence.
    pub fn new(prayer: Arc<Prayer>, language: Language) -> Option<Self> {
        if prayer.is_empty() {
            return None;
        }
        Some(Self {
            id: Uuid::new_v4(),
            prayer,
            language,
            current_index: 0,
            is_playing: true,
            is_paused: false,
            step_finished: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn prayer(&self) -> &Prayer {
        &self.prayer
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn len(&self) -> usize {
        self.prayer.len()
    }

    pub fn current_step(&self) -> &Step {
        &self.prayer.sequence[self.current_index]
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn step_finished(&self) -> bool {
        self.step_finished
    }

    pub fn has_next(&self) -> bool {
        self.current_index + 1 < self.len()
    }

    pub fn status(&self) -> PlayerStatus {
        match (self.is_playing, self.is_paused) {
            (true, true) => PlayerStatus::Paused,
            (true, false) => PlayerStatus::Playing,
            (false, _) => PlayerStatus::Completed,
        }
    }

    /// Move back one step; false at index 0
    pub fn step_back(&mut self) -> bool {
        if self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    /// Move forward one step; false at the last index
    pub fn step_forward(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Set the index directly; false (unchanged) when out of range
    pub fn set_index(&mut self, index: usize) -> bool {
        if index >= self.len() {
            return false;
        }
        self.current_index = index;
        true
    }

    /// Playing → Paused; false in any other state
    pub fn pause(&mut self) -> bool {
        if !self.is_playing || self.is_paused {
            return false;
        }
        self.is_paused = true;
        true
    }

    /// Paused → Playing; false when not paused
    pub fn resume(&mut self) -> bool {
        if !self.is_paused {
            return false;
        }
        self.is_paused = false;
        true
    }

    /// Last step done: not playing, not paused
    pub fn complete(&mut self) {
        self.is_playing = false;
        self.is_paused = false;
    }

    pub fn mark_step_loaded(&mut self) {
        self.step_finished = false;
    }

    pub fn mark_step_finished(&mut self) {
        self.step_finished = true;
    }
}
