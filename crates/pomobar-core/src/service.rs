//! Single-writer driver for the timer engine.
//!
//! [`TimerService`] owns the engine on one tokio task and is the only thing
//! that mutates it. Control commands and clock ticks are funnelled through
//! one `select!` loop, so they are applied strictly one after another.
//! Observers get a [`TimerSnapshot`] over a `watch` channel after every
//! change, plus the raw [`Event`] stream over a broadcast channel.

use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::{IntervalClock, Subscription};
use crate::duration::Settings;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::notify::Notifier;
use crate::session::SessionKind;
use crate::timer::{TimerEngine, TimerSnapshot};

const EVENT_BUFFER: usize = 64;

/// Requests accepted by a running [`TimerService`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Pause,
    Toggle,
    Reset,
    Skip,
    ResetAll,
    SetAutoChain(bool),
    ToggleAutoChain,
    /// Nudge a duration by whole minutes; clamped to the kind's bounds.
    AdjustDuration { kind: SessionKind, delta: i32 },
    SetDuration { kind: SessionKind, minutes: u32 },
    ResetDurations,
    Shutdown,
}

/// Cloneable front door to a running service.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<TimerSnapshot>,
    events: broadcast::Sender<Event>,
}

impl TimerHandle {
    /// # Errors
    /// Returns [`CoreError::ServiceStopped`] once the service task has exited.
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CoreError::ServiceStopped)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Change notifications, one wake-up per published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.snapshots.clone()
    }

    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

pub struct TimerService {
    engine: TimerEngine<Settings>,
    ticks: mpsc::UnboundedReceiver<Subscription>,
    commands: mpsc::UnboundedReceiver<Command>,
    snapshots: watch::Sender<TimerSnapshot>,
    events: broadcast::Sender<Event>,
}

impl TimerService {
    /// Spawn the service on the current tokio runtime, ticking once a second.
    ///
    /// The engine starts with the auto-chain preference stored in `settings`.
    pub fn spawn(settings: Settings, notifier: impl Notifier + 'static) -> (TimerHandle, JoinHandle<()>) {
        let (clock, ticks) = IntervalClock::every_second();
        let auto_chain = settings.config().auto_chain;
        let engine = TimerEngine::new(settings, Box::new(clock), Box::new(notifier))
            .with_auto_chain(auto_chain);

        let (command_tx, commands) = mpsc::unbounded_channel();
        let (snapshots, snapshot_rx) = watch::channel(engine.snapshot());
        let (events, _) = broadcast::channel(EVENT_BUFFER);

        let handle = TimerHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: events.clone(),
        };
        let service = Self {
            engine,
            ticks,
            commands,
            snapshots,
            events,
        };
        (handle, tokio::spawn(service.run()))
    }

    async fn run(mut self) {
        info!("timer service started");
        loop {
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    None | Some(Command::Shutdown) => break,
                    Some(command) => self.apply(command),
                },
                Some(subscription) = self.ticks.recv() => {
                    if let Some(event) = self.engine.on_tick(subscription) {
                        self.emit(event);
                    }
                }
            }
            self.publish();
        }
        self.engine.pause();
        self.publish();
        info!("timer service stopped");
    }

    fn apply(&mut self, command: Command) {
        debug!(?command, "applying command");
        let event = match command {
            Command::Start => self.engine.start(),
            Command::Pause => self.engine.pause(),
            Command::Toggle => self.engine.toggle(),
            Command::Reset => self.engine.reset(),
            Command::Skip => self.engine.skip(),
            Command::ResetAll => self.engine.reset_all(),
            Command::SetAutoChain(enabled) => self.set_auto_chain(enabled),
            Command::ToggleAutoChain => {
                let enabled = !self.engine.auto_chain();
                self.set_auto_chain(enabled)
            }
            Command::AdjustDuration { kind, delta } => {
                let settings = self.engine.durations_mut();
                for _ in 0..delta.unsigned_abs() {
                    let changed = if delta > 0 {
                        settings.increment(kind)
                    } else {
                        settings.decrement(kind)
                    };
                    if !changed {
                        break;
                    }
                }
                self.engine.refresh_duration();
                None
            }
            Command::SetDuration { kind, minutes } => {
                self.engine.durations_mut().set_minutes(kind, minutes);
                self.engine.refresh_duration();
                None
            }
            Command::ResetDurations => {
                self.engine.durations_mut().reset_to_defaults();
                self.engine.refresh_duration();
                None
            }
            Command::Shutdown => None,
        };
        if let Some(event) = event {
            self.emit(event);
        }
    }

    fn set_auto_chain(&mut self, enabled: bool) -> Option<Event> {
        self.engine.durations_mut().set_auto_chain(enabled);
        self.engine.set_auto_chain(enabled)
    }

    fn emit(&self, event: Event) {
        debug!(event = event.name(), "timer event");
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn publish(&self) {
        let snapshot = self.engine.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
