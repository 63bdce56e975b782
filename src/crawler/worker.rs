//! Worker loop: pull tasks from the scheduler, fetch them, report back.
//!
//! Fetching is supplied by the caller through the [`Fetcher`] trait. The loop
//! never holds the scheduler lock across an await.

use crate::scheduler::{Scheduler, Task};
use crate::state::TaskStatus;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Error recorded on a task whose fetcher panicked
pub const FETCHER_PANICKED: &str = "fetcher panicked";

/// What a successful fetch produced
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    /// Stored on the task record
    pub result: Option<Value>,

    /// Links found on the page, fed back into the frontier
    pub discovered: Vec<String>,
}

/// A failed fetch
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,

    /// Whether the scheduler may retry the task
    pub retryable: bool,
}

impl FetchError {
    /// A transient failure (timeout, 5xx, connection reset)
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: true,
        }
    }

    /// A failure retrying will not fix (404, unsupported content)
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retryable: false,
        }
    }
}

/// Performs the actual fetch of a dispatched task
///
/// Each call runs on its own tokio task. A panic inside `fetch` fails the
/// task permanently with [`FETCHER_PANICKED`] and leaves the worker running.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, task: &Task) -> Result<FetchOutcome, FetchError>;
}

/// Per-worker tally, summed by [`WorkerPool::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub fetched: u64,
    pub errors: u64,

    /// Fetches whose task was cancelled or reset while in flight
    pub discarded: u64,
}

impl WorkerSummary {
    fn merge(&mut self, other: WorkerSummary) {
        self.fetched += other.fetched;
        self.errors += other.errors;
        self.discarded += other.discarded;
    }
}

/// A fixed number of async workers sharing one scheduler
pub struct WorkerPool {
    scheduler: Arc<Scheduler>,
    fetcher: Arc<dyn Fetcher>,
    workers: usize,
}

impl WorkerPool {
    /// Creates a pool; `workers` is clamped to at least one
    pub fn new(scheduler: Arc<Scheduler>, fetcher: Arc<dyn Fetcher>, workers: usize) -> Self {
        Self {
            scheduler,
            fetcher,
            workers: workers.max(1),
        }
    }

    /// Spawns the workers onto the current tokio runtime
    ///
    /// Each worker stops when `shutdown` turns true (or its sender is
    /// dropped), when the scheduler is shut down, or when the frontier holds
    /// no pending and no running task.
    pub fn spawn(&self, shutdown: watch::Receiver<bool>) -> Vec<JoinHandle<WorkerSummary>> {
        (0..self.workers)
            .map(|worker_id| {
                let scheduler = Arc::clone(&self.scheduler);
                let fetcher = Arc::clone(&self.fetcher);
                let shutdown = shutdown.clone();
                tokio::spawn(async move {
                    worker_loop(worker_id, &scheduler, fetcher, shutdown).await
                })
            })
            .collect()
    }

    /// Runs the workers to completion and sums their tallies
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> WorkerSummary {
        let mut total = WorkerSummary::default();
        for handle in self.spawn(shutdown) {
            match handle.await {
                Ok(summary) => total.merge(summary),
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }
        }
        total
    }
}

async fn worker_loop(
    worker_id: usize,
    scheduler: &Scheduler,
    fetcher: Arc<dyn Fetcher>,
    mut shutdown: watch::Receiver<bool>,
) -> WorkerSummary {
    let mut summary = WorkerSummary::default();
    let idle = scheduler.config().idle_poll();
    tracing::debug!("Worker {} started", worker_id);

    loop {
        if *shutdown.borrow() {
            tracing::debug!("Worker {}: shutdown signal received", worker_id);
            break;
        }

        let Some(task) = scheduler.next_task() else {
            if scheduler.is_shut_down() || scheduler.frontier_is_empty() {
                break;
            }

            let wait = match scheduler.time_until_next_dispatch(Instant::now()) {
                Some(hint) if !hint.is_zero() => hint.min(idle),
                _ => idle,
            };
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Worker {}: shutdown sender dropped", worker_id);
                        break;
                    }
                }
                () = tokio::time::sleep(wait) => {}
            }
            continue;
        };

        let outcome = fetch_isolated(&fetcher, &task).await.unwrap_or_else(|e| {
            tracing::error!(
                "Worker {}: fetch of {} panicked: {}",
                worker_id,
                task.url,
                e
            );
            Err(FetchError::permanent(FETCHER_PANICKED))
        });
        summary.fetched += 1;

        // Cancelled (or discarded by a reset) while the fetch was in flight
        if scheduler
            .task_status(&task.id)
            .map_or(true, |status| status.is_terminal())
        {
            tracing::debug!(
                "Worker {}: task {} is no longer running, discarding result",
                worker_id,
                task.id
            );
            summary.discarded += 1;
            continue;
        }

        match outcome {
            Ok(fetched) => {
                scheduler.mark_completed(&task.id, fetched.result, &fetched.discovered);
            }
            Err(e) => {
                summary.errors += 1;
                tracing::debug!("Worker {}: fetch of {} failed: {}", worker_id, task.url, e);
                scheduler.mark_failed(&task.id, &e.message, e.retryable);
            }
        }
    }

    tracing::debug!(
        "Worker {} stopped after {} fetches",
        worker_id,
        summary.fetched
    );
    summary
}

/// Runs one fetch on its own tokio task so a panic surfaces as a `JoinError`
async fn fetch_isolated(
    fetcher: &Arc<dyn Fetcher>,
    task: &Task,
) -> Result<Result<FetchOutcome, FetchError>, tokio::task::JoinError> {
    let fetcher = Arc::clone(fetcher);
    let task = task.clone();
    tokio::spawn(async move { fetcher.fetch(&task).await }).await
}
