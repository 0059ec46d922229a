//! Completion alerts.
//!
//! Delivery is fire-and-forget. A notifier that cannot reach the user logs
//! the failure itself; nothing flows back into the timer.

use std::sync::{Arc, Mutex};

use tracing::info;

use crate::session::SessionKind;

pub trait Notifier: Send {
    /// A session of `kind` just ran to completion.
    fn notify_completed(&self, kind: SessionKind);
}

/// Writes completions to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_completed(&self, kind: SessionKind) {
        let message = kind.completion_message();
        info!(session = kind.key(), "{} {}", message.title, message.body);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify_completed(&self, _kind: SessionKind) {}
}

/// Remembers every completion it was told about. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    seen: Arc<Mutex<Vec<SessionKind>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn completions(&self) -> Vec<SessionKind> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_completed(&self, kind: SessionKind) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(kind);
        }
    }
}
