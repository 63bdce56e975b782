//! Statistics and health reporting
//!
//! Counters are maintained incrementally by the scheduler on every mutation,
//! so taking a snapshot never scans the task store.

mod health;
mod stats;

pub use health::{classify_health, HealthReport, HealthStatus};
pub(crate) use stats::StatsCollector;
pub use stats::{print_statistics, StatsSnapshot};
