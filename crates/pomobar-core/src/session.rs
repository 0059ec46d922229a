//! Session kinds and their static display attributes.
//!
//! The actual length of a session is not stored here; it is resolved at
//! runtime through a [`DurationProvider`](crate::duration::DurationProvider)
//! because the user may override it. `default_minutes` and `bounds` only
//! describe the configuration contract.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    Work,
    ShortBreak,
    LongBreak,
}

/// Title and body of the alert raised when a session finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionMessage {
    pub title: &'static str,
    pub body: &'static str,
}

impl SessionKind {
    /// Every kind, in cycle order.
    pub const ALL: [SessionKind; 3] = [
        SessionKind::Work,
        SessionKind::ShortBreak,
        SessionKind::LongBreak,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Work => "Work Session",
            SessionKind::ShortBreak => "Short Break",
            SessionKind::LongBreak => "Long Break",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            SessionKind::Work => "🍅",
            SessionKind::ShortBreak => "☕️",
            SessionKind::LongBreak => "🌴",
        }
    }

    pub fn color_name(self) -> &'static str {
        match self {
            SessionKind::Work => "tomato",
            SessionKind::ShortBreak => "mint",
            SessionKind::LongBreak => "ocean",
        }
    }

    /// Stable key used in config files and on the command line.
    pub fn key(self) -> &'static str {
        match self {
            SessionKind::Work => "work",
            SessionKind::ShortBreak => "short_break",
            SessionKind::LongBreak => "long_break",
        }
    }

    /// Duration in minutes used when the user has not configured one.
    pub fn default_minutes(self) -> u32 {
        match self {
            SessionKind::Work => 25,
            SessionKind::ShortBreak => 5,
            SessionKind::LongBreak => 15,
        }
    }

    /// Allowed range for the configured duration, in minutes.
    pub fn bounds(self) -> RangeInclusive<u32> {
        match self {
            SessionKind::Work => 1..=60,
            SessionKind::ShortBreak => 1..=30,
            SessionKind::LongBreak => 1..=30,
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, SessionKind::Work)
    }

    pub fn completion_message(self) -> CompletionMessage {
        match self {
            SessionKind::Work => CompletionMessage {
                title: "Work Session Complete! 🍅",
                body: "Great job! Time for a break.",
            },
            SessionKind::ShortBreak => CompletionMessage {
                title: "Break's Over! ☕️",
                body: "Ready to focus again?",
            },
            SessionKind::LongBreak => CompletionMessage {
                title: "Long Break Complete! 🌴",
                body: "Feeling refreshed? Let's get back to work!",
            },
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "work" | "w" => Ok(SessionKind::Work),
            "short_break" | "short" | "s" => Ok(SessionKind::ShortBreak),
            "long_break" | "long" | "l" => Ok(SessionKind::LongBreak),
            _ => Err(ValidationError::UnknownSessionKind(s.to_string())),
        }
    }
}
