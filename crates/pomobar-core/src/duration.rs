//! Resolves a session kind to its configured length.
//!
//! [`Settings`] is the production provider: it owns the committed
//! [`Config`] and persists every mutation through an injected
//! [`PreferencesStore`]. Reads always see the latest committed value.

use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::session::SessionKind;
use crate::storage::{Config, PreferencesStore};

/// Length of a session, in seconds.
pub trait DurationProvider {
    fn duration_of(&self, kind: SessionKind) -> f64;
}

/// Config-backed durations with a load/save lifecycle.
pub struct Settings {
    config: Config,
    store: Box<dyn PreferencesStore>,
}

impl Settings {
    /// Load preferences from `store`. Missing or corrupt data yields defaults.
    pub fn load(store: impl PreferencesStore + 'static) -> Self {
        let mut config = store.load();
        config.sanitize();
        Self {
            config,
            store: Box::new(store),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn minutes(&self, kind: SessionKind) -> u32 {
        self.config.minutes(kind)
    }

    /// Add one minute to `kind`. No-op at the upper bound.
    pub fn increment(&mut self, kind: SessionKind) -> bool {
        let changed = self.config.increment(kind);
        if changed {
            self.persist();
        }
        changed
    }

    /// Remove one minute from `kind`. No-op at the lower bound.
    pub fn decrement(&mut self, kind: SessionKind) -> bool {
        let changed = self.config.decrement(kind);
        if changed {
            self.persist();
        }
        changed
    }

    /// Set `kind` to `minutes`, clamped into its bounds. Returns the stored value.
    pub fn set_minutes(&mut self, kind: SessionKind, minutes: u32) -> u32 {
        let stored = self.config.set_minutes(kind, minutes);
        self.persist();
        stored
    }

    pub fn set_auto_chain(&mut self, enabled: bool) {
        if self.config.auto_chain != enabled {
            self.config.auto_chain = enabled;
            self.persist();
        }
    }

    /// Restore the default durations.
    pub fn reset_to_defaults(&mut self) {
        self.config.reset_durations();
        self.persist();
    }

    /// Set any preference by dot-separated key.
    ///
    /// # Errors
    /// Returns an error if the key is unknown or the value does not parse.
    /// Nothing is changed or persisted in that case.
    pub fn apply_key(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.config.set(key, value)?;
        self.persist();
        Ok(())
    }

    /// Write the current config to the store, failing loudly.
    ///
    /// # Errors
    /// Returns the store's error.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.store.save(&self.config)
    }

    fn persist(&self) {
        match self.store.save(&self.config) {
            Ok(()) => debug!(durations = ?self.config.durations, "preferences persisted"),
            // The in-memory value stays committed; an unsaved preference must not
            // stall the timer.
            Err(e) => warn!("failed to persist preferences: {e}"),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings").field("config", &self.config).finish_non_exhaustive()
    }
}

impl DurationProvider for Settings {
    fn duration_of(&self, kind: SessionKind) -> f64 {
        f64::from(self.config.minutes(kind)) * 60.0
    }
}

/// Fixed per-kind durations in seconds, handy for tests and demos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedDurations {
    pub work: f64,
    pub short_break: f64,
    pub long_break: f64,
}

impl FixedDurations {
    pub fn new(work: f64, short_break: f64, long_break: f64) -> Self {
        Self {
            work,
            short_break,
            long_break,
        }
    }
}

impl Default for FixedDurations {
    fn default() -> Self {
        Self::new(25.0 * 60.0, 5.0 * 60.0, 15.0 * 60.0)
    }
}

impl DurationProvider for FixedDurations {
    fn duration_of(&self, kind: SessionKind) -> f64 {
        match kind {
            SessionKind::Work => self.work,
            SessionKind::ShortBreak => self.short_break,
            SessionKind::LongBreak => self.long_break,
        }
    }
}
