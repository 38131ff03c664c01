//! salah-player specific configuration
//!
//! Read from the TOML file found by `salah_common::config::locate_config_file`.
//! Every key is optional; command-line arguments override what is set here.

use crate::error::{Error, Result};
use salah_common::config::{locate_config_file, resolve_asset_root, ASSET_ROOT_ENV, CONFIG_FILE_ENV};
use salah_common::Language;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Pause between the end of one step and the start of the next
pub const DEFAULT_ADVANCE_DELAY_MS: u64 = 2000;

/// Sequence player configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Root of the audio assets (`{root}/mp3/{language}/{audio}.mp3`)
    pub asset_root: Option<PathBuf>,
    /// Catalog JSON replacing the bundled one
    pub catalog_path: Option<PathBuf>,
    pub advance_delay_ms: u64,
    /// Output device name; default device when unset
    pub audio_device: Option<String>,
    /// Language preselected at startup
    pub language: Option<Language>,
    pub volume: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            asset_root: None,
            catalog_path: None,
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
            audio_device: None,
            language: None,
            volume: 1.0,
        }
    }
}

impl PlayerConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = salah_common::config::load_toml(path)?;
        config.validate()?;
        debug!("Loaded player config from {}", path.display());
        Ok(config)
    }

    /// Config from the standard locations, or defaults when there is no file
    ///
    /// Returns the file used, if any, alongside the config. A file that
    /// exists but does not parse is an error.
    pub fn load_or_default() -> Result<(Self, Option<PathBuf>)> {
        let explicit = std::env::var_os(CONFIG_FILE_ENV).is_some();
        match locate_config_file() {
            Ok(path) => Ok((Self::load(&path)?, Some(path))),
            // An explicitly named file must exist
            Err(e) if explicit => Err(e.into()),
            Err(e) => {
                info!("{}; using defaults", e);
                Ok((Self::default(), None))
            }
        }
    }

    /// Asset root: `cli_arg`, then `SALAH_ASSET_ROOT`, then `asset_root`, then the default
    pub fn resolve_asset_root(&self, cli_arg: Option<&Path>) -> PathBuf {
        resolve_asset_root(cli_arg, ASSET_ROOT_ENV, self.asset_root.as_deref())
    }

    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(Error::Config(format!(
                "volume must be between 0.0 and 1.0, got {}",
                self.volume
            )));
        }
        if self.audio_device.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(Error::Config("audio_device must not be empty".to_string()));
        }
        Ok(())
    }
}
