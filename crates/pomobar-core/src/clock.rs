//! Tick sources that drive the session timer.
//!
//! A clock hands out one [`Subscription`] per `subscribe` call and delivers
//! ticks tagged with it. The timer only honours ticks tagged with its current
//! subscription, so a tick that was already in flight when `cancel` returned
//! is dropped rather than applied.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::trace;

/// Opaque handle for one tick subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

impl Subscription {
    pub fn id(self) -> u64 {
        self.0
    }
}

pub trait ClockSource: Send {
    /// Begin delivering ticks for a new subscription.
    fn subscribe(&mut self) -> Subscription;

    /// Stop delivering ticks for `subscription`. Unknown handles are ignored.
    fn cancel(&mut self, subscription: Subscription);
}

/// Wall-clock ticks from a tokio interval, one task per subscription.
///
/// Ticks are sent on the channel returned by [`IntervalClock::new`].
/// `subscribe` must be called from inside a tokio runtime.
#[derive(Debug)]
pub struct IntervalClock {
    period: Duration,
    next_id: u64,
    ticks: mpsc::UnboundedSender<Subscription>,
    tasks: HashMap<Subscription, JoinHandle<()>>,
}

impl IntervalClock {
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<Subscription>) {
        let (ticks, rx) = mpsc::unbounded_channel();
        let clock = Self {
            period,
            next_id: 0,
            ticks,
            tasks: HashMap::new(),
        };
        (clock, rx)
    }

    /// One tick per second.
    pub fn every_second() -> (Self, mpsc::UnboundedReceiver<Subscription>) {
        Self::new(Duration::from_secs(1))
    }

    /// Number of subscriptions with a live tick task.
    pub fn active(&self) -> usize {
        self.tasks.len()
    }
}

impl ClockSource for IntervalClock {
    fn subscribe(&mut self) -> Subscription {
        self.next_id += 1;
        let subscription = Subscription(self.next_id);
        let ticks = self.ticks.clone();
        let period = self.period;

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if ticks.send(subscription).is_err() {
                    break;
                }
            }
        });

        trace!(subscription = subscription.0, "clock subscribed");
        self.tasks.insert(subscription, task);
        subscription
    }

    fn cancel(&mut self, subscription: Subscription) {
        if let Some(task) = self.tasks.remove(&subscription) {
            task.abort();
            trace!(subscription = subscription.0, "clock cancelled");
        }
    }
}

impl Drop for IntervalClock {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

#[derive(Debug, Default)]
struct ManualClockInner {
    next_id: u64,
    active: Vec<Subscription>,
    subscribes: usize,
    cancels: usize,
}

/// Clock that never ticks on its own. Clones share the same bookkeeping, so a
/// test can keep one clone while the timer owns the other.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualClockInner>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscriptions that have not been cancelled, oldest first.
    pub fn active(&self) -> Vec<Subscription> {
        self.inner.lock().map(|i| i.active.clone()).unwrap_or_default()
    }

    /// The newest live subscription.
    pub fn current(&self) -> Option<Subscription> {
        self.active().last().copied()
    }

    pub fn subscribe_count(&self) -> usize {
        self.inner.lock().map(|i| i.subscribes).unwrap_or(0)
    }

    pub fn cancel_count(&self) -> usize {
        self.inner.lock().map(|i| i.cancels).unwrap_or(0)
    }
}

impl ClockSource for ManualClock {
    fn subscribe(&mut self) -> Subscription {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.next_id += 1;
        inner.subscribes += 1;
        let subscription = Subscription(inner.next_id);
        inner.active.push(subscription);
        subscription
    }

    fn cancel(&mut self, subscription: Subscription) {
        let mut inner = match self.inner.lock() {
            Ok(inner) => inner,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.cancels += 1;
        inner.active.retain(|s| *s != subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_tracks_subscriptions() {
        let mut clock = ManualClock::new();
        let observer = clock.clone();
        let a = clock.subscribe();
        let b = clock.subscribe();
        assert_ne!(a, b);
        clock.cancel(a);
        assert_eq!(observer.active(), vec![b]);
        assert_eq!(observer.current(), Some(b));
        assert_eq!(observer.subscribe_count(), 2);
        assert_eq!(observer.cancel_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_clock_ticks_once_per_period() {
        let (mut clock, mut ticks) = IntervalClock::every_second();
        let sub = clock.subscribe();

        let start = Instant::now();
        assert_eq!(ticks.recv().await, Some(sub));
        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(ticks.recv().await, Some(sub));
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_subscription_stops_ticking() {
        let (mut clock, mut ticks) = IntervalClock::every_second();
        let first = clock.subscribe();
        clock.cancel(first);
        assert_eq!(clock.active(), 0);

        let second = clock.subscribe();
        assert_eq!(ticks.recv().await, Some(second));
        assert_eq!(ticks.recv().await, Some(second));
    }
}
