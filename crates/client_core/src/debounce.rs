use std::time::Duration;

use tokio::time::Instant;

/// Trailing-edge debounce over a value.
///
/// `set` records the latest input and (re)arms the deadline; the settled
/// value only changes once a `poll` observes the deadline with no newer input.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    delay: Duration,
    settled: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debounced<T> {
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            settled: initial,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Settles the pending value if its quiet interval has elapsed. Returns
    /// true when the settled value changed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => {}
            _ => return false,
        }
        let Some((value, _)) = self.pending.take() else {
            return false;
        };
        let changed = value != self.settled;
        self.settled = value;
        changed
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn settled(&self) -> &T {
        &self.settled
    }

    /// Drops any pending input and settles on `value` immediately.
    pub fn reset(&mut self, value: T) {
        self.pending = None;
        self.settled = value;
    }
}
