//! Where preferences live between runs.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use super::{data_dir, Config};
use crate::error::ConfigError;

/// Load/save boundary for [`Config`].
///
/// `load` never fails: absent or unreadable preferences fall back to the
/// documented defaults.
pub trait PreferencesStore: Send {
    fn load(&self) -> Config;

    /// # Errors
    /// Returns an error if the configuration cannot be written.
    fn save(&self, config: &Config) -> Result<(), ConfigError>;
}

/// Preferences persisted as TOML on disk.
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
}

impl TomlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn open_default() -> Result<Self, ConfigError> {
        Ok(Self::new(data_dir()?.join("config.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferencesStore for TomlFileStore {
    fn load(&self) -> Config {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), "no preferences on disk ({e}), using defaults");
                return Config::default();
            }
        };

        match toml::from_str::<Config>(&content) {
            Ok(mut cfg) => {
                cfg.sanitize();
                cfg
            }
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring corrupt preferences: {e}");
                Config::default()
            }
        }
    }

    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let failed = |message: String| ConfigError::SaveFailed {
            path: self.path.clone(),
            message,
        };
        let content = toml::to_string_pretty(config).map_err(|e| failed(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| failed(e.to_string()))?;
        }
        std::fs::write(&self.path, content).map_err(|e| failed(e.to_string()))?;
        debug!(path = %self.path.display(), "preferences saved");
        Ok(())
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: Mutex<Option<Config>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(config: Config) -> Self {
        Self {
            saved: Mutex::new(Some(config)),
            saves: Mutex::new(0),
        }
    }

    /// How many times `save` has been called.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or(0)
    }

    /// Last saved configuration, if any.
    pub fn saved(&self) -> Option<Config> {
        self.saved.lock().ok().and_then(|c| c.clone())
    }
}

impl PreferencesStore for MemoryStore {
    fn load(&self) -> Config {
        self.saved().unwrap_or_default()
    }

    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        if let Ok(mut saved) = self.saved.lock() {
            *saved = Some(config.clone());
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

impl<S: PreferencesStore + Sync> PreferencesStore for std::sync::Arc<S> {
    fn load(&self) -> Config {
        (**self).load()
    }

    fn save(&self, config: &Config) -> Result<(), ConfigError> {
        (**self).save(config)
    }
}
