//! Per-domain politeness delays
//!
//! The rate limiter answers one question: may a task for this domain be
//! dispatched now? It never blocks; the scheduler decides what to do with a
//! domain that is not ready.

use crate::state::DomainState;
use crate::url::matches_wildcard;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks the last dispatch per domain and the minimum delay between dispatches
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Delay applied to domains without an override
    default_delay: Duration,

    /// Overrides keyed by domain pattern, most specific first
    overrides: Vec<(String, Duration)>,

    /// Per-domain dispatch tracking
    domain_states: HashMap<String, DomainState>,
}

impl RateLimiter {
    /// Creates a new rate limiter
    ///
    /// # Arguments
    ///
    /// * `default_delay` - Minimum delay for domains without an override
    /// * `overrides` - Per-domain delays; keys are exact domains or `*.domain` wildcards
    pub fn new(default_delay: Duration, overrides: HashMap<String, Duration>) -> Self {
        let mut overrides: Vec<(String, Duration)> = overrides
            .into_iter()
            .map(|(pattern, delay)| (pattern.to_lowercase(), delay))
            .collect();

        // Exact patterns win over wildcards; longer wildcards win over shorter ones
        overrides.sort_by(|(a, _), (b, _)| {
            a.starts_with("*.")
                .cmp(&b.starts_with("*."))
                .then_with(|| b.len().cmp(&a.len()))
                .then_with(|| a.cmp(b))
        });

        Self {
            default_delay,
            overrides,
            domain_states: HashMap::new(),
        }
    }

    /// Resolves the minimum inter-dispatch delay for a domain
    pub fn delay_for(&self, domain: &str) -> Duration {
        self.overrides
            .iter()
            .find(|(pattern, _)| matches_wildcard(pattern, domain))
            .map(|(_, delay)| *delay)
            .unwrap_or(self.default_delay)
    }

    /// Checks whether a task for `domain` may be dispatched at `now`
    pub fn can_dispatch(&self, domain: &str, now: Instant) -> bool {
        let can = match self.domain_states.get(domain) {
            Some(state) => state.can_dispatch(self.delay_for(domain), now),
            None => true,
        };
        tracing::trace!("Checking domain {}: can_dispatch={}", domain, can);
        can
    }

    /// Records a dispatch to `domain`, replacing any earlier record
    pub fn record_dispatch(&mut self, domain: &str, now: Instant) {
        self.domain_states
            .entry(domain.to_string())
            .or_insert_with(DomainState::new)
            .record_dispatch(now);
    }

    /// Time until `domain` may be dispatched again, or None if it may be now
    pub fn time_until_ready(&self, domain: &str, now: Instant) -> Option<Duration> {
        self.domain_states
            .get(domain)
            .and_then(|state| state.time_until_next_dispatch(self.delay_for(domain), now))
    }

    /// Gets the dispatch state for a specific domain
    pub fn domain_state(&self, domain: &str) -> Option<&DomainState> {
        self.domain_states.get(domain)
    }

    /// Number of domains with at least one recorded dispatch
    pub fn tracked_domains(&self) -> usize {
        self.domain_states.len()
    }

    /// Forgets every recorded dispatch
    pub fn clear(&mut self) {
        self.domain_states.clear();
    }
}
