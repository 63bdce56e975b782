//! Task records
//!
//! A [`Task`] is one URL travelling through the frontier: its identity,
//! depth and priority, where it came from, and the status, timing and retry
//! bookkeeping the scheduler updates as it moves between states.

use crate::state::TaskStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Opaque unique task identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Generates a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Dispatch priority of a task
///
/// Ordering follows urgency: `Low < Normal < High`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        f.write_str(name)
    }
}

/// Caller context attached to a task
///
/// The scheduler reads only the typed fields. `extra` is carried untouched
/// for the caller.
#[derive(Debug, Clone, Default)]
pub struct TaskMetadata {
    /// URL of the page this task was discovered on
    pub discovered_from: Option<String>,

    /// Earliest instant a retried task may be dispatched again
    pub retry_eligible_at: Option<Instant>,

    /// Caller-opaque values
    pub extra: HashMap<String, Value>,
}

impl TaskMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a caller-opaque value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Returns true if retry backoff no longer holds the task back at `now`
    pub fn is_eligible_at(&self, now: Instant) -> bool {
        self.retry_eligible_at.map_or(true, |at| now >= at)
    }
}

/// One schedulable unit of crawl work
#[derive(Debug, Clone)]
pub struct Task {
    pub id: TaskId,

    /// Normalized absolute URL
    pub url: String,

    /// Lowercase host of `url`, the politeness key
    pub domain: String,

    /// Distance from a seed URL; seeds are 0
    pub depth: u32,

    pub priority: Priority,

    /// Task that discovered this URL (lookup only)
    pub parent_task_id: Option<TaskId>,

    pub metadata: TaskMetadata,

    pub status: TaskStatus,

    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    pub retry_count: u32,
    pub max_retries: u32,

    /// Set only when the task reaches FAILED
    pub error_message: Option<String>,

    /// Result reported by the worker on completion
    pub result: Option<Value>,

    /// Creation order, used as the FIFO tie-break within a priority
    pub(crate) seq: u64,
}

impl Task {
    /// Wall-clock time between dispatch and completion
    pub fn execution_time(&self) -> Option<Duration> {
        let started = self.started_at?;
        let completed = self.completed_at?;
        (completed - started).to_std().ok()
    }
}
