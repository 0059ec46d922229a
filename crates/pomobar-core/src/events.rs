use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionKind;
use crate::timer::TimerSnapshot;

/// Every state change of the timer produces an Event.
/// Presentation layers render them; the CLI prints them as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session: SessionKind,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        session: SessionKind,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    /// A session ran out naturally and the timer moved on.
    SessionCompleted {
        finished: SessionKind,
        next: SessionKind,
        completed_work_sessions: u32,
        /// The next session was started by auto-chain.
        auto_started: bool,
        at: DateTime<Utc>,
    },
    /// The user abandoned a session. Never counted as a completion.
    SessionSkipped {
        from: SessionKind,
        to: SessionKind,
        at: DateTime<Utc>,
    },
    SessionReset {
        session: SessionKind,
        remaining_secs: f64,
        at: DateTime<Utc>,
    },
    TimerResetAll {
        at: DateTime<Utc>,
    },
    AutoChainChanged {
        enabled: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot(TimerSnapshot),
}

impl Event {
    /// Short machine name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "TimerStarted",
            Event::TimerPaused { .. } => "TimerPaused",
            Event::SessionCompleted { .. } => "SessionCompleted",
            Event::SessionSkipped { .. } => "SessionSkipped",
            Event::SessionReset { .. } => "SessionReset",
            Event::TimerResetAll { .. } => "TimerResetAll",
            Event::AutoChainChanged { .. } => "AutoChainChanged",
            Event::StateSnapshot(_) => "StateSnapshot",
        }
    }
}
