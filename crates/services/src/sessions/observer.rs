use std::sync::Mutex;

use quiz_core::model::ResultSummary;

use crate::error::SessionErrorKind;

/// Callbacks a UI registers on a session.
///
/// Methods run on the task that drives the session, except a
/// `Persistence` error, which arrives from the background save task.
/// Implementations must not assume any particular widget exists.
pub trait SessionObserver: Send + Sync {
    /// Once per clock tick, before expiry is acted on.
    fn on_tick(&self, _remaining_secs: i64) {}

    /// Exactly once, when the countdown reaches zero.
    fn on_expire(&self) {}

    /// When the final summary is ready, before the save is requested.
    fn on_scored(&self, _summary: &ResultSummary) {}

    fn on_error(&self, _kind: SessionErrorKind, _message: &str) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}

/// One recorded callback.
#[derive(Debug, Clone, PartialEq)]
pub enum ObserverEvent {
    Tick(i64),
    Expire,
    Scored(ResultSummary),
    Error(SessionErrorKind, String),
}

/// Observer that keeps every callback in order, for headless runs and tests.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: ObserverEvent) {
        // A poisoned lock only means another callback panicked; keep recording.
        let mut guard = self
            .events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.push(event);
    }

    #[must_use]
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Remaining-time values from every tick so far.
    #[must_use]
    pub fn ticks(&self) -> Vec<i64> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ObserverEvent::Tick(remaining) => Some(remaining),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn expire_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ObserverEvent::Expire))
            .count()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_tick(&self, remaining_secs: i64) {
        self.push(ObserverEvent::Tick(remaining_secs));
    }

    fn on_expire(&self) {
        self.push(ObserverEvent::Expire);
    }

    fn on_scored(&self, summary: &ResultSummary) {
        self.push(ObserverEvent::Scored(*summary));
    }

    fn on_error(&self, kind: SessionErrorKind, message: &str) {
        self.push(ObserverEvent::Error(kind, message.to_owned()));
    }
}
