//! TOML-based user preferences.
//!
//! Stores:
//! - Session durations (minutes, one per [`SessionKind`])
//! - The auto-chain preference
//! - Notification preferences
//!
//! Every duration is kept inside [`SessionKind::bounds`]. Out-of-range
//! adjustments are clamped, and files edited by hand are sanitized on load.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::session::SessionKind;

/// Session durations in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationsConfig {
    #[serde(default = "default_work")]
    pub work: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ring the terminal bell alongside the completion message.
    #[serde(default = "default_true")]
    pub bell: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomobar/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub durations: DurationsConfig,
    /// Start the next session automatically when one completes.
    #[serde(default)]
    pub auto_chain: bool,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_work() -> u32 {
    SessionKind::Work.default_minutes()
}
fn default_short_break() -> u32 {
    SessionKind::ShortBreak.default_minutes()
}
fn default_long_break() -> u32 {
    SessionKind::LongBreak.default_minutes()
}
fn default_true() -> bool {
    true
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            work: default_work(),
            short_break: default_short_break(),
            long_break: default_long_break(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bell: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            durations: DurationsConfig::default(),
            auto_chain: false,
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    /// Configured duration for `kind`, in minutes.
    pub fn minutes(&self, kind: SessionKind) -> u32 {
        match kind {
            SessionKind::Work => self.durations.work,
            SessionKind::ShortBreak => self.durations.short_break,
            SessionKind::LongBreak => self.durations.long_break,
        }
    }

    fn minutes_mut(&mut self, kind: SessionKind) -> &mut u32 {
        match kind {
            SessionKind::Work => &mut self.durations.work,
            SessionKind::ShortBreak => &mut self.durations.short_break,
            SessionKind::LongBreak => &mut self.durations.long_break,
        }
    }

    /// Store `value` clamped into the bounds of `kind`. Returns the stored value.
    pub fn set_minutes(&mut self, kind: SessionKind, value: u32) -> u32 {
        let bounds = kind.bounds();
        let clamped = value.clamp(*bounds.start(), *bounds.end());
        *self.minutes_mut(kind) = clamped;
        clamped
    }

    /// Add one minute. Returns `false` when already at the upper bound.
    pub fn increment(&mut self, kind: SessionKind) -> bool {
        let current = self.minutes(kind);
        if current >= *kind.bounds().end() {
            return false;
        }
        *self.minutes_mut(kind) = current + 1;
        true
    }

    /// Remove one minute. Returns `false` when already at the lower bound.
    pub fn decrement(&mut self, kind: SessionKind) -> bool {
        let current = self.minutes(kind);
        if current <= *kind.bounds().start() {
            return false;
        }
        *self.minutes_mut(kind) = current - 1;
        true
    }

    /// Restore the documented default durations. Other preferences are kept.
    pub fn reset_durations(&mut self) {
        self.durations = DurationsConfig::default();
    }

    /// Clamp every duration into its bounds.
    pub fn sanitize(&mut self) {
        for kind in SessionKind::ALL {
            let value = self.minutes(kind);
            self.set_minutes(kind, value);
        }
    }

    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => serde_json::Value::Number(
                        value
                            .parse::<u32>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as minutes")))?
                            .into(),
                    ),
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(invalid("cannot overwrite a whole section".into()));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key.
    ///
    /// Durations are clamped into their bounds after the update.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed
    /// as the key's type.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let mut updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.sanitize();
        *self = updated;
        Ok(())
    }

    /// Every leaf key with its current value, in dot-path form.
    pub fn entries(&self) -> Vec<(String, String)> {
        fn walk(prefix: &str, value: &serde_json::Value, out: &mut Vec<(String, String)>) {
            match value {
                serde_json::Value::Object(map) => {
                    for (k, v) in map {
                        let path = if prefix.is_empty() {
                            k.clone()
                        } else {
                            format!("{prefix}.{k}")
                        };
                        walk(&path, v, out);
                    }
                }
                other => out.push((prefix.to_string(), other.to_string())),
            }
        }

        let mut out = Vec::new();
        if let Ok(json) = serde_json::to_value(self) {
            walk("", &json, &mut out);
        }
        out
    }
}
