//! # pomobar Core Library
//!
//! Session timer for a menu-bar style Pomodoro app. Presentation (status
//! line, overlay countdown, alerts) lives in the CLI; this crate owns the
//! state machine and the seams it talks through.
//!
//! ## Architecture
//!
//! - **Timer Engine**: tick-driven state machine over `Work`, `ShortBreak`
//!   and `LongBreak` sessions with the every-fourth long-break rule
//! - **Durations**: user-adjustable, bounded session lengths backed by a
//!   TOML preferences file
//! - **Clock / Notifier**: narrow traits the engine drives, so the engine
//!   can be exercised without real time or a desktop
//! - **Service**: single-writer tokio task that owns the engine and
//!   publishes snapshots
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Settings`]: Configured durations with load/save lifecycle
//! - [`TimerService`]: Runs an engine against a real one-second clock

pub mod clock;
pub mod duration;
pub mod error;
pub mod events;
pub mod notify;
pub mod service;
pub mod session;
pub mod storage;
pub mod timer;

pub use clock::{ClockSource, IntervalClock, ManualClock, Subscription};
pub use duration::{DurationProvider, FixedDurations, Settings};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use notify::{LogNotifier, NoopNotifier, Notifier, RecordingNotifier};
pub use service::{Command, TimerHandle, TimerService};
pub use session::{CompletionMessage, SessionKind};
pub use storage::{Config, MemoryStore, PreferencesStore, TomlFileStore};
pub use timer::{RunState, TimerEngine, TimerSnapshot, TimerState};
