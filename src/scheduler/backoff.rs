//! Retry delays

use std::time::Duration;

/// Fixed escalating retry schedule
///
/// The n-th retry waits `schedule[n - 1]`; retries past the end of the
/// schedule reuse its last entry.
#[derive(Debug, Clone)]
pub struct RetryBackoff {
    schedule: Vec<Duration>,
}

impl RetryBackoff {
    pub fn new(schedule: Vec<Duration>) -> Self {
        Self { schedule }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let index = (attempt.max(1) - 1) as usize;
        self.schedule
            .get(index)
            .or_else(|| self.schedule.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for RetryBackoff {
    fn default() -> Self {
        Self::new(vec![
            Duration::from_secs(1),
            Duration::from_secs(5),
            Duration::from_secs(15),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let backoff = RetryBackoff::default();
        assert_eq!(backoff.delay_for(1), Duration::from_secs(1));
        assert_eq!(backoff.delay_for(2), Duration::from_secs(5));
        assert_eq!(backoff.delay_for(3), Duration::from_secs(15));
    }

    #[test]
    fn test_capped_at_last_value() {
        let backoff = RetryBackoff::default();
        assert_eq!(backoff.delay_for(4), Duration::from_secs(15));
        assert_eq!(backoff.delay_for(40), Duration::from_secs(15));
    }

    #[test]
    fn test_attempt_zero_uses_first_entry() {
        let backoff = RetryBackoff::new(vec![Duration::from_millis(250)]);
        assert_eq!(backoff.delay_for(0), Duration::from_millis(250));
    }

    #[test]
    fn test_empty_schedule_means_no_delay() {
        let backoff = RetryBackoff::new(vec![]);
        assert_eq!(backoff.delay_for(1), Duration::ZERO);
    }
}
