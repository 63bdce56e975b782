use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Main configuration structure for Ripple-Frontier
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed URLs admitted at depth 0 when the scheduler starts
    pub seeds: Vec<String>,

    pub scheduler: SchedulerConfig,

    pub filters: FilterConfig,
}

/// Scheduler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ceiling on the number of RUNNING tasks
    #[serde(rename = "max-concurrent-tasks")]
    pub max_concurrent_tasks: usize,

    /// Admission cutoff; tasks deeper than this are rejected
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Minimum time between dispatches to the same domain (milliseconds)
    #[serde(rename = "default-domain-delay")]
    pub default_domain_delay: u64,

    /// Per-domain delay overrides (milliseconds), keyed by domain pattern
    #[serde(rename = "domain-delay-overrides")]
    pub domain_delay_overrides: HashMap<String, u64>,

    /// Escalating retry delays (milliseconds); the last value repeats
    #[serde(rename = "retry-backoff-schedule")]
    pub retry_backoff_schedule: Vec<u64>,

    /// Retries allowed before a task is terminally failed
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Pending task count above which health reports queue overload
    #[serde(rename = "queue-overload-threshold")]
    pub queue_overload_threshold: usize,

    /// Fraction of the concurrency ceiling that counts as high load
    #[serde(rename = "high-load-ratio")]
    pub high_load_ratio: f64,

    /// Number of terminal tasks kept for lookup before the oldest are evicted
    #[serde(rename = "completed-retention")]
    pub completed_retention: usize,

    /// Longest a worker sleeps when no task is available (milliseconds)
    #[serde(rename = "idle-poll-interval")]
    pub idle_poll_interval: u64,
}

impl SchedulerConfig {
    pub fn default_delay(&self) -> Duration {
        Duration::from_millis(self.default_domain_delay)
    }

    pub fn backoff_schedule(&self) -> Vec<Duration> {
        self.retry_backoff_schedule
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_interval)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 10,
            max_depth: 5,
            default_domain_delay: 1000,
            domain_delay_overrides: HashMap::new(),
            retry_backoff_schedule: vec![1000, 5000, 15000],
            max_retries: 3,
            queue_overload_threshold: 10_000,
            high_load_ratio: 0.9,
            completed_retention: 100_000,
            idle_poll_interval: 100,
        }
    }
}

/// Data-driven URL filters, turned into filter predicates at startup
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Domain patterns (e.g., "example.com" or "*.example.com"); empty allows any
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Domain patterns that are never admitted
    #[serde(rename = "denied-domains")]
    pub denied_domains: Vec<String>,

    /// Regular expressions; a matching URL is rejected
    #[serde(rename = "deny-patterns")]
    pub deny_patterns: Vec<String>,

    /// Regular expressions; when non-empty a URL must match at least one
    #[serde(rename = "include-patterns")]
    pub include_patterns: Vec<String>,

    /// Maximum number of path segments; 0 disables the check
    #[serde(rename = "max-path-segments")]
    pub max_path_segments: usize,
}
