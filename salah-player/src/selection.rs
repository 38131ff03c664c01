//! Selection state
//!
//! The language and prayer the user picked. Plain data; the player decides
//! what a change means for a running session.

use salah_common::{Language, Prayer};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Selection {
    language: Option<Language>,
    prayer: Option<Arc<Prayer>>,
}

impl Selection {
    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn prayer(&self) -> Option<&Arc<Prayer>> {
        self.prayer.as_ref()
    }

    /// Choose a language; the prayer list is shown again, so the prayer is cleared
    pub fn set_language(&mut self, language: Language) {
        self.language = Some(language);
        self.prayer = None;
    }

    pub fn set_prayer(&mut self, prayer: Arc<Prayer>) {
        self.prayer = Some(prayer);
    }

    pub fn clear_prayer(&mut self) {
        self.prayer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fajr() -> Arc<Prayer> {
        Arc::new(Prayer {
            name: "Fajr".to_string(),
            audio_id: "fajr".to_string(),
            description: None,
            rakat: None,
            sequence: Vec::new(),
        })
    }

    #[test]
    fn test_language_change_clears_prayer() {
        let mut selection = Selection::default();
        selection.set_language(Language::English);
        selection.set_prayer(fajr());
        assert_eq!(selection.prayer().unwrap().name, "Fajr");

        selection.set_language(Language::Malayalam);
        assert_eq!(selection.language(), Some(Language::Malayalam));
        assert!(selection.prayer().is_none());
    }

    #[test]
    fn test_clear_prayer_keeps_language() {
        let mut selection = Selection::default();
        selection.set_language(Language::English);
        selection.set_prayer(fajr());
        selection.clear_prayer();
        assert!(selection.prayer().is_none());
        assert_eq!(selection.language(), Some(Language::English));
    }
}
