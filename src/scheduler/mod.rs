//! Crawl task scheduling
//!
//! This module contains the frontier and its dispatch policy:
//! - Task records, identifiers and priorities
//! - A dual queue (FIFO for NORMAL work, a heap for HIGH and LOW)
//! - Per-domain politeness delays
//! - Retry backoff after transient failures
//! - The [`Scheduler`] facade tying them together behind one lock

mod backoff;
mod coordinator;
mod queue;
mod rate_limiter;
mod store;
mod task;

pub use backoff::RetryBackoff;
pub use coordinator::{Completion, FailureOutcome, Rejection, Scheduler};
pub use rate_limiter::RateLimiter;
pub use task::{Priority, Task, TaskId, TaskMetadata};
