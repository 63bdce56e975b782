use std::time::{Duration, Instant};

/// Tracks dispatch history for a single domain
///
/// Only the most recent dispatch matters for politeness; the count is kept
/// for statistics.
#[derive(Debug, Clone, Default)]
pub struct DomainState {
    /// Number of tasks dispatched to this domain
    pub request_count: u32,

    /// Timestamp of the last dispatch to this domain
    pub last_dispatch: Option<Instant>,
}

impl DomainState {
    /// Creates a new DomainState with no recorded dispatches
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if a task can be dispatched to this domain at `now`
    ///
    /// A domain that has never been dispatched to is always ready. Otherwise
    /// at least `delay` must have elapsed since the last dispatch; hitting the
    /// boundary exactly counts as ready.
    pub fn can_dispatch(&self, delay: Duration, now: Instant) -> bool {
        match self.last_dispatch {
            Some(last) => now.saturating_duration_since(last) >= delay,
            None => true,
        }
    }

    /// Records a dispatch, overwriting the previous timestamp
    pub fn record_dispatch(&mut self, now: Instant) {
        self.request_count = self.request_count.saturating_add(1);
        self.last_dispatch = Some(now);
    }

    /// Calculates the time until the next dispatch can be made
    ///
    /// Returns None if a dispatch can be made now.
    pub fn time_until_next_dispatch(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_dispatch?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }
}
