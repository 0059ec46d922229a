mod config;
mod store;

pub use config::{Config, DurationsConfig, NotificationsConfig};
pub use store::{MemoryStore, PreferencesStore, TomlFileStore};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/pomobar[-dev]/`.
///
/// `POMOBAR_CONFIG_DIR` overrides the location outright. Otherwise
/// `POMOBAR_ENV=dev` selects the development directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOBAR_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMOBAR_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomobar-dev")
            } else {
                base_dir.join("pomobar")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::NoDataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
