//! Session timer state machine.
//!
//! The engine owns the current session, its remaining time and the clock
//! subscription that advances it. It does not spawn anything itself: the
//! owner routes clock ticks into [`TimerEngine::on_tick`] and control
//! commands into the operations below, one at a time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle <-> Active            (start / pause / toggle)
//! Active -> Idle -> next     (natural completion, then auto-chain may start)
//! any -> Idle                (reset / skip / reset_all)
//! ```
//!
//! Session order: `Work -> ShortBreak -> Work ...`, with every
//! [`LONG_BREAK_EVERY`]th completed work session followed by a `LongBreak`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(settings, Box::new(clock), Box::new(LogNotifier));
//! engine.start();
//! // For each tick delivered by the clock:
//! engine.on_tick(subscription); // Returns Some(Event) when the session ends
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::clock::{ClockSource, Subscription};
use crate::duration::DurationProvider;
use crate::events::Event;
use crate::notify::Notifier;
use crate::session::SessionKind;

/// Completed work sessions between long breaks.
pub const LONG_BREAK_EVERY: u32 = 4;

/// The overlay countdown shows during the last this-many seconds.
pub const OVERLAY_WINDOW_SECS: f64 = 5.0;

/// Compact status shown while nothing is running.
pub const IDLE_GLYPH: &str = "🍅";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Idle,
    Active,
}

/// The timer's mutable state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerState {
    pub session: SessionKind,
    /// Seconds left in the current session.
    pub remaining_secs: f64,
    pub running: bool,
    /// Work sessions finished since the last full reset.
    pub completed_work_sessions: u32,
    pub auto_chain: bool,
}

/// Everything a presentation layer needs, computed at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub session: SessionKind,
    pub session_label: String,
    pub remaining_secs: f64,
    pub total_secs: f64,
    pub running: bool,
    pub completed_work_sessions: u32,
    pub cycle_position: u32,
    pub auto_chain: bool,
    pub progress: f64,
    pub display_text: String,
    pub compact_status: String,
    pub overlay_active: bool,
    pub overlay_countdown: Option<u32>,
}

/// Core session timer.
pub struct TimerEngine<D> {
    state: TimerState,
    durations: D,
    clock: Box<dyn ClockSource>,
    subscription: Option<Subscription>,
    notifier: Box<dyn Notifier>,
}

impl<D: DurationProvider> TimerEngine<D> {
    /// Create an idle engine positioned at the start of a work session.
    pub fn new(durations: D, clock: Box<dyn ClockSource>, notifier: Box<dyn Notifier>) -> Self {
        let remaining_secs = durations.duration_of(SessionKind::Work);
        Self {
            state: TimerState {
                session: SessionKind::Work,
                remaining_secs,
                running: false,
                completed_work_sessions: 0,
                auto_chain: false,
            },
            durations,
            clock,
            subscription: None,
            notifier,
        }
    }

    /// Start with auto-chain set, e.g. from a persisted preference.
    pub fn with_auto_chain(mut self, enabled: bool) -> Self {
        self.state.auto_chain = enabled;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn run_state(&self) -> RunState {
        if self.state.running {
            RunState::Active
        } else {
            RunState::Idle
        }
    }

    pub fn session(&self) -> SessionKind {
        self.state.session
    }

    pub fn remaining_secs(&self) -> f64 {
        self.state.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn completed_work_sessions(&self) -> u32 {
        self.state.completed_work_sessions
    }

    pub fn auto_chain(&self) -> bool {
        self.state.auto_chain
    }

    /// The clock subscription currently feeding this engine.
    pub fn subscription(&self) -> Option<Subscription> {
        self.subscription
    }

    pub fn durations(&self) -> &D {
        &self.durations
    }

    /// Mutable access to the duration provider, for configuration edits.
    /// Call [`TimerEngine::refresh_duration`] afterwards to pick them up.
    pub fn durations_mut(&mut self) -> &mut D {
        &mut self.durations
    }

    pub fn total_secs(&self) -> f64 {
        self.durations.duration_of(self.state.session)
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total <= 0.0 {
            return 0.0;
        }
        ((total - self.state.remaining_secs) / total).clamp(0.0, 1.0)
    }

    /// Remaining time as zero-padded `MM:SS`.
    pub fn display_text(&self) -> String {
        let secs = self.state.remaining_secs.max(0.0).floor() as u64;
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }

    /// True during the last five seconds of a running session.
    pub fn overlay_active(&self) -> bool {
        let remaining = self.state.remaining_secs;
        self.state.running && remaining > 0.0 && remaining <= OVERLAY_WINDOW_SECS
    }

    /// 5, 4, 3, 2, 1 while the overlay is active.
    pub fn overlay_countdown(&self) -> Option<u32> {
        self.overlay_active()
            .then(|| self.state.remaining_secs.ceil() as u32)
    }

    /// Session icon and time while running, the idle glyph otherwise.
    pub fn compact_status(&self) -> String {
        if self.state.running {
            format!("{} {}", self.state.session.icon(), self.display_text())
        } else {
            IDLE_GLYPH.to_string()
        }
    }

    /// Filled slots of the current long-break cycle, 0..=4. A just-finished
    /// cycle shows as full until the next work session completes.
    pub fn cycle_position(&self) -> u32 {
        let done = self.state.completed_work_sessions;
        match done % LONG_BREAK_EVERY {
            0 if done > 0 => LONG_BREAK_EVERY,
            n => n,
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            session: self.state.session,
            session_label: self.state.session.label().to_string(),
            remaining_secs: self.state.remaining_secs,
            total_secs: self.total_secs(),
            running: self.state.running,
            completed_work_sessions: self.state.completed_work_sessions,
            cycle_position: self.cycle_position(),
            auto_chain: self.state.auto_chain,
            progress: self.progress(),
            display_text: self.display_text(),
            compact_status: self.compact_status(),
            overlay_active: self.overlay_active(),
            overlay_countdown: self.overlay_countdown(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        if self.state.running {
            return None;
        }
        self.cancel_subscription();
        self.state.running = true;
        self.subscription = Some(self.clock.subscribe());
        debug!(session = self.state.session.key(), remaining = self.state.remaining_secs, "timer started");
        Some(Event::TimerStarted {
            session: self.state.session,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        let was_running = self.state.running;
        self.state.running = false;
        self.cancel_subscription();
        if !was_running {
            return None;
        }
        debug!(session = self.state.session.key(), remaining = self.state.remaining_secs, "timer paused");
        Some(Event::TimerPaused {
            session: self.state.session,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    pub fn toggle(&mut self) -> Option<Event> {
        if self.state.running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Rewind the current session. The session and completion count stay.
    pub fn reset(&mut self) -> Option<Event> {
        self.pause();
        self.state.remaining_secs = self.total_secs();
        Some(Event::SessionReset {
            session: self.state.session,
            remaining_secs: self.state.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Move to the next session without counting or announcing this one.
    pub fn skip(&mut self) -> Option<Event> {
        self.pause();
        let from = self.state.session;
        self.move_to_next_session();
        debug!(from = from.key(), to = self.state.session.key(), "session skipped");
        Some(Event::SessionSkipped {
            from,
            to: self.state.session,
            at: Utc::now(),
        })
    }

    /// Back to an idle first work session with no completions.
    pub fn reset_all(&mut self) -> Option<Event> {
        self.pause();
        self.state.completed_work_sessions = 0;
        self.state.session = SessionKind::Work;
        self.state.remaining_secs = self.total_secs();
        Some(Event::TimerResetAll { at: Utc::now() })
    }

    pub fn set_auto_chain(&mut self, enabled: bool) -> Option<Event> {
        if self.state.auto_chain == enabled {
            return None;
        }
        self.state.auto_chain = enabled;
        Some(Event::AutoChainChanged {
            enabled,
            at: Utc::now(),
        })
    }

    /// Re-read the current session's length after a configuration change.
    /// Has no effect while running. Returns whether `remaining` changed.
    pub fn refresh_duration(&mut self) -> bool {
        if self.state.running {
            return false;
        }
        let total = self.total_secs();
        let changed = self.state.remaining_secs != total;
        self.state.remaining_secs = total;
        changed
    }

    /// Clock entry point. Ticks from any subscription other than the active
    /// one are stale and ignored.
    pub fn on_tick(&mut self, subscription: Subscription) -> Option<Event> {
        if self.subscription != Some(subscription) {
            trace!(subscription = subscription.id(), "dropping stale tick");
            return None;
        }
        self.advance(1.0)
    }

    /// Move time forward by `delta_secs`. Returns `Some(Event::SessionCompleted)`
    /// when the session ends. Ignored while idle.
    pub fn advance(&mut self, delta_secs: f64) -> Option<Event> {
        if !self.state.running || !delta_secs.is_finite() || delta_secs <= 0.0 {
            return None;
        }
        if self.state.remaining_secs > delta_secs {
            self.state.remaining_secs -= delta_secs;
            return None;
        }
        Some(self.complete_session())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_session(&mut self) -> Event {
        self.state.remaining_secs = 0.0;
        self.pause();

        let finished = self.state.session;
        self.notifier.notify_completed(finished);
        if finished == SessionKind::Work {
            self.state.completed_work_sessions += 1;
        }

        self.move_to_next_session();
        let auto_started = self.state.auto_chain && self.start().is_some();

        info!(
            finished = finished.key(),
            next = self.state.session.key(),
            completed = self.state.completed_work_sessions,
            auto_started,
            "session completed"
        );
        Event::SessionCompleted {
            finished,
            next: self.state.session,
            completed_work_sessions: self.state.completed_work_sessions,
            auto_started,
            at: Utc::now(),
        }
    }

    fn move_to_next_session(&mut self) {
        self.state.session = next_session(self.state.session, self.state.completed_work_sessions);
        self.state.remaining_secs = self.total_secs();
    }

    fn cancel_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.clock.cancel(subscription);
        }
    }
}

/// The session that follows `current`, given the completed-work count at the
/// moment of the transition.
pub fn next_session(current: SessionKind, completed_work_sessions: u32) -> SessionKind {
    match current {
        SessionKind::Work => {
            if completed_work_sessions > 0 && completed_work_sessions % LONG_BREAK_EVERY == 0 {
                SessionKind::LongBreak
            } else {
                SessionKind::ShortBreak
            }
        }
        SessionKind::ShortBreak | SessionKind::LongBreak => SessionKind::Work,
    }
}

impl<D> Drop for TimerEngine<D> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            self.clock.cancel(subscription);
        }
    }
}

impl<D: std::fmt::Debug> std::fmt::Debug for TimerEngine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .field("durations", &self.durations)
            .field("subscription", &self.subscription)
            .finish_non_exhaustive()
    }
}
