//! Task status definitions for the scheduler state machine
//!
//! ```text
//! PENDING --dispatch--> RUNNING --complete--> COMPLETED
//! RUNNING --fail, retries left--> PENDING
//! RUNNING --fail, retries exhausted--> FAILED
//! PENDING/RUNNING --cancel--> CANCELLED
//! ```

use serde::Serialize;
use std::fmt;

/// Represents the current state of a task in the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    // ===== Active States =====
    /// Task is waiting in a queue (possibly in retry backoff)
    Pending,

    /// Task has been handed to a worker
    Running,

    // ===== Terminal States =====
    /// Worker reported success
    Completed,

    /// Retries exhausted or retry not allowed
    Failed,

    /// Cancelled by the caller
    Cancelled,
}

impl TaskStatus {
    /// Returns true if this is a terminal state (no further transitions)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if the task is part of the frontier
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    /// Returns true if the state machine permits moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Pending, Self::Cancelled)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Pending)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }

    /// Returns the lowercase name used in logs and serialized snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
