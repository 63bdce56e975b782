//! Health classification
//!
//! Health is advisory: it is derived from the live counters on demand and
//! never changes what the scheduler does.

use serde::Serialize;
use std::fmt;

/// Advisory health classification of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,

    /// Active tasks are at or above the high-load share of the concurrency ceiling
    HighLoad,

    /// Pending tasks exceed the configured overload threshold
    QueueOverload,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Healthy => "healthy",
            Self::HighLoad => "high_load",
            Self::QueueOverload => "queue_overload",
        };
        f.write_str(name)
    }
}

/// Health status together with the figures it was derived from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub active_tasks: usize,
    pub max_concurrent_tasks: usize,
    pub pending_tasks: usize,
    pub queue_overload_threshold: usize,

    /// `active_tasks / max_concurrent_tasks`
    pub load: f64,
}

/// Classifies scheduler health
///
/// Queue overload takes precedence over high load.
pub fn classify_health(
    active: usize,
    max_concurrent: usize,
    pending: usize,
    overload_threshold: usize,
    high_load_ratio: f64,
) -> HealthReport {
    let load = if max_concurrent == 0 {
        1.0
    } else {
        active as f64 / max_concurrent as f64
    };

    let status = if pending > overload_threshold {
        HealthStatus::QueueOverload
    } else if load >= high_load_ratio {
        HealthStatus::HighLoad
    } else {
        HealthStatus::Healthy
    };

    HealthReport {
        status,
        active_tasks: active,
        max_concurrent_tasks: max_concurrent,
        pending_tasks: pending,
        queue_overload_threshold: overload_threshold,
        load,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy() {
        let report = classify_health(3, 10, 100, 1000, 0.9);
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.load, 0.3);
    }

    #[test]
    fn test_high_load_at_ninety_percent() {
        assert_eq!(
            classify_health(8, 10, 0, 1000, 0.9).status,
            HealthStatus::Healthy
        );
        assert_eq!(
            classify_health(9, 10, 0, 1000, 0.9).status,
            HealthStatus::HighLoad
        );
        assert_eq!(
            classify_health(10, 10, 0, 1000, 0.9).status,
            HealthStatus::HighLoad
        );
    }

    #[test]
    fn test_queue_overload_beyond_threshold() {
        assert_eq!(
            classify_health(0, 10, 1000, 1000, 0.9).status,
            HealthStatus::Healthy
        );
        assert_eq!(
            classify_health(0, 10, 1001, 1000, 0.9).status,
            HealthStatus::QueueOverload
        );
    }

    #[test]
    fn test_overload_takes_precedence() {
        let report = classify_health(10, 10, 5000, 1000, 0.9);
        assert_eq!(report.status, HealthStatus::QueueOverload);
    }

    #[test]
    fn test_display() {
        assert_eq!(HealthStatus::HighLoad.to_string(), "high_load");
    }
}
