//! Debounced search input

use std::time::{Duration, Instant};

/// Holds back a search query until typing has paused for `delay`.
///
/// Time is passed in by the caller, so the gate can be driven from any event
/// loop. A query released earlier is not cancelled by a later one; responses
/// can still arrive out of order.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Record a keystroke; restarts the quiet period
    pub fn input(&mut self, query: impl Into<String>, now: Instant) {
        self.pending = Some((query.into(), now));
    }

    /// The latest query, once `delay` has passed since it was typed
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, typed_at)) if now.duration_since(*typed_at) >= self.delay => {
                self.pending.take().map(|(query, _)| query)
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
