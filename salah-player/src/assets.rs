//! Audio asset resolution
//!
//! Maps a catalog audio id plus the selected language to a playable file.
//! The player only sees the `AssetResolver` trait, so tests and alternative
//! layouts can inject their own mapping (any `Fn(Language, &str) -> PathBuf`
//! works).

use salah_common::Language;
use std::path::{Path, PathBuf};

/// Resolves `(language, audio_id)` to an asset path
pub trait AssetResolver: Send + Sync {
    fn resolve(&self, language: Language, audio_id: &str) -> PathBuf;
}

impl<F> AssetResolver for F
where
    F: Fn(Language, &str) -> PathBuf + Send + Sync,
{
    fn resolve(&self, language: Language, audio_id: &str) -> PathBuf {
        self(language, audio_id)
    }
}

/// Default layout: `{root}/{format}/{language}/{audio_id}.{format}`
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    root: PathBuf,
    format: String,
}

impl TemplateResolver {
    /// MP3 assets under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_format(root, "mp3")
    }

    /// Assets of another container format (`ogg`, `flac`, ...)
    pub fn with_format(root: impl Into<PathBuf>, format: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            format: format.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetResolver for TemplateResolver {
    fn resolve(&self, language: Language, audio_id: &str) -> PathBuf {
        self.root
            .join(&self.format)
            .join(language.code())
            .join(format!("{}.{}", audio_id, self.format))
    }
}
