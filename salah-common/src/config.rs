//! Configuration file location and asset root resolution

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the audio asset root
pub const ASSET_ROOT_ENV: &str = "SALAH_ASSET_ROOT";

/// Environment variable naming an explicit config file
pub const CONFIG_FILE_ENV: &str = "SALAH_CONFIG";

/// Asset root resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. `asset_root` from the already loaded config file
/// 4. OS-dependent compiled default
pub fn resolve_asset_root(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    configured: Option<&Path>,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = configured {
        return path.to_path_buf();
    }

    default_asset_root()
}

/// Locate the TOML config file
///
/// `SALAH_CONFIG` wins when set; otherwise the user config dir
/// (`~/.config/salah/config.toml` on Linux) and then `/etc/salah/config.toml`.
pub fn locate_config_file() -> Result<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_FILE_ENV) {
        let path = PathBuf::from(explicit);
        return if path.exists() {
            Ok(path)
        } else {
            Err(Error::Config(format!("Config file not found: {}", path.display())))
        };
    }

    let user_config = dirs::config_dir().map(|d| d.join("salah").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            debug!("Using user config file {}", path.display());
            return Ok(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/salah/config.toml");
        if system_config.exists() {
            debug!("Using system config file {}", system_config.display());
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Read and parse a TOML config file into `T`
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// OS-dependent default location of the audio assets
fn default_asset_root() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("salah").join("assets").join("audio"))
        .unwrap_or_else(|| PathBuf::from("./assets/audio"))
}
