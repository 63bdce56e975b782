//! Scheduler facade
//!
//! Composes the task store, dual queue, rate limiter, filter chain and
//! statistics behind one coarse lock. Every public operation takes the lock
//! once, never blocks while holding it, and returns promptly, so it appears
//! atomic to concurrent producers and workers.

use super::backoff::RetryBackoff;
use super::queue::{DualQueue, Eligibility, QueueEntry};
use super::rate_limiter::RateLimiter;
use super::store::TaskStore;
use super::task::{Priority, Task, TaskId, TaskMetadata};
use crate::config::{Config, SchedulerConfig};
use crate::filter::{Candidate, FilterChain, UrlFilter};
use crate::output::{classify_health, HealthReport, StatsCollector, StatsSnapshot};
use crate::state::TaskStatus;
use crate::url::{extract_domain, normalize_url};
use crate::{FrontierError, UrlError};
use chrono::Utc;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why `add_url` refused a URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("malformed URL: {0}")]
    Malformed(UrlError),

    #[error("URL already in the frontier: {url}")]
    Duplicate { url: String },

    #[error("depth {depth} exceeds max depth {max_depth}")]
    DepthExceeded { depth: u32, max_depth: u32 },

    #[error("rejected by filter '{filter}'")]
    Filtered { filter: String },

    #[error("scheduler has been shut down")]
    ShutDown,
}

/// Result of a successful `mark_completed`
#[derive(Debug, Clone)]
pub struct Completion {
    /// Time between dispatch and completion
    pub execution_time: Duration,

    /// Tasks admitted from the discovered URLs
    pub spawned: Vec<TaskId>,

    /// Discovered URLs that were not admitted
    pub rejected: usize,
}

/// Result of a successful `mark_failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// Task is PENDING again and may be dispatched after `backoff`
    Retrying { retry_count: u32, backoff: Duration },

    /// Task reached FAILED
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

/// Mutable scheduler state, guarded by a single lock
struct Inner {
    lifecycle: Lifecycle,
    store: TaskStore,
    queue: DualQueue,
    rate_limiter: RateLimiter,
    filters: FilterChain,
    stats: StatsCollector,
}

/// The crawl task scheduler
///
/// Construct one per process and share it (`Arc<Scheduler>`) between the
/// producers calling [`Scheduler::add_url`] and the workers calling
/// [`Scheduler::next_task`], [`Scheduler::mark_completed`] and
/// [`Scheduler::mark_failed`].
///
/// ```
/// use ripple_frontier::{Priority, Scheduler, SchedulerConfig, TaskMetadata};
///
/// let scheduler = Scheduler::new(SchedulerConfig::default());
/// scheduler.start();
///
/// let id = scheduler
///     .add_url("https://a.example/", 0, Priority::Normal, TaskMetadata::new(), None)
///     .unwrap();
/// let task = scheduler.next_task().unwrap();
/// assert_eq!(task.id, id);
///
/// scheduler.mark_completed(&task.id, None, &["https://a.example/about".to_string()]);
/// assert_eq!(scheduler.stats().discovered, 2);
/// ```
pub struct Scheduler {
    config: SchedulerConfig,
    backoff: RetryBackoff,
    inner: Mutex<Inner>,
}

impl Scheduler {
    /// Creates an idle scheduler with no filters
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_filters(config, FilterChain::new())
    }

    /// Creates an idle scheduler with the given filter chain
    pub fn with_filters(config: SchedulerConfig, filters: FilterChain) -> Self {
        let overrides = config
            .domain_delay_overrides
            .iter()
            .map(|(domain, ms)| (domain.clone(), Duration::from_millis(*ms)))
            .collect();
        let rate_limiter = RateLimiter::new(config.default_delay(), overrides);
        let backoff = RetryBackoff::new(config.backoff_schedule());
        let store = TaskStore::new(config.completed_retention);

        Self {
            config,
            backoff,
            inner: Mutex::new(Inner {
                lifecycle: Lifecycle::Idle,
                store,
                queue: DualQueue::new(),
                rate_limiter,
                filters,
                stats: StatsCollector::new(),
            }),
        }
    }

    /// Creates an idle scheduler from a full configuration, building the
    /// configured filters
    pub fn from_config(config: &Config) -> Result<Self, FrontierError> {
        let filters = FilterChain::from_config(&config.filters)?;
        Ok(Self::with_filters(config.scheduler.clone(), filters))
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Lifecycle =====

    /// Enables dispatching
    pub fn start(&self) {
        let mut inner = self.lock();
        if inner.lifecycle != Lifecycle::Running {
            inner.lifecycle = Lifecycle::Running;
            tracing::info!(
                "Scheduler started: {} pending tasks, max {} concurrent",
                inner.stats.queued(),
                self.config.max_concurrent_tasks
            );
        }
    }

    /// Stops dispatching and admission
    ///
    /// Tasks already RUNNING can still be completed, failed or cancelled.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        if inner.lifecycle != Lifecycle::Stopped {
            inner.lifecycle = Lifecycle::Stopped;
            tracing::info!(
                "Scheduler shut down: {} running, {} pending",
                inner.stats.active(),
                inner.stats.queued()
            );
        }
    }

    /// Returns true between `start` and `shutdown`
    pub fn is_running(&self) -> bool {
        self.lock().lifecycle == Lifecycle::Running
    }

    /// Returns true once `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.lock().lifecycle == Lifecycle::Stopped
    }

    /// Discards every task, queue entry, dispatch record and counter
    ///
    /// Registered filters and the lifecycle state are kept.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.store.clear();
        inner.queue.clear();
        inner.rate_limiter.clear();
        inner.stats.reset();
        tracing::info!("Scheduler reset");
    }

    /// Appends a filter to the admission chain
    ///
    /// Filters are evaluated while the scheduler lock is held. A filter must
    /// not call back into this `Scheduler` (not even `stats()`); the lock is
    /// not reentrant and the call would deadlock.
    pub fn register_filter<F>(&self, filter: F)
    where
        F: UrlFilter + 'static,
    {
        self.lock().filters.register(filter);
    }

    // ===== Admission =====

    /// Admits a URL into the frontier
    ///
    /// Checks run in order: lifecycle, normalization, de-duplication against
    /// the frontier, the depth cutoff, then the filter chain. A rejection has
    /// no side effect besides the statistics counters.
    pub fn add_url(
        &self,
        url: &str,
        depth: u32,
        priority: Priority,
        metadata: TaskMetadata,
        parent_task_id: Option<&TaskId>,
    ) -> Result<TaskId, Rejection> {
        let mut inner = self.lock();
        self.admit(
            &mut inner,
            url,
            depth,
            priority,
            metadata,
            parent_task_id.cloned(),
        )
    }

    /// Admits a seed URL at depth 0 with NORMAL priority
    pub fn add_seed(&self, url: &str) -> Result<TaskId, Rejection> {
        self.add_url(url, 0, Priority::Normal, TaskMetadata::new(), None)
    }

    fn admit(
        &self,
        inner: &mut Inner,
        url: &str,
        depth: u32,
        priority: Priority,
        metadata: TaskMetadata,
        parent_task_id: Option<TaskId>,
    ) -> Result<TaskId, Rejection> {
        match self.check_admission(inner, url, depth) {
            Ok((normalized, domain)) => {
                let seq = inner.store.next_seq();
                let task = Task {
                    id: TaskId::generate(),
                    url: normalized,
                    domain,
                    depth,
                    priority,
                    parent_task_id,
                    metadata,
                    status: TaskStatus::Pending,
                    created_at: Utc::now(),
                    started_at: None,
                    completed_at: None,
                    retry_count: 0,
                    max_retries: self.config.max_retries,
                    error_message: None,
                    result: None,
                    seq,
                };
                let id = task.id.clone();

                tracing::debug!(
                    "Admitted {} as task {} (depth {}, priority {})",
                    task.url,
                    id,
                    depth,
                    priority
                );
                inner.queue.push(QueueEntry::for_task(&task));
                inner.store.insert(task);
                inner.stats.on_admitted(depth);
                Ok(id)
            }
            Err(rejection) => {
                tracing::debug!("Rejected {}: {}", url, rejection);
                inner.stats.on_rejected(&rejection);
                Err(rejection)
            }
        }
    }

    /// Returns the normalized URL and its domain if the URL may be admitted
    fn check_admission(
        &self,
        inner: &Inner,
        url: &str,
        depth: u32,
    ) -> Result<(String, String), Rejection> {
        if inner.lifecycle == Lifecycle::Stopped {
            return Err(Rejection::ShutDown);
        }

        let normalized = normalize_url(url).map_err(Rejection::Malformed)?;
        let domain = extract_domain(&normalized)
            .ok_or(Rejection::Malformed(UrlError::MissingDomain))?;

        if inner.store.frontier_task(normalized.as_str()).is_some() {
            return Err(Rejection::Duplicate {
                url: normalized.to_string(),
            });
        }

        if depth > self.config.max_depth {
            return Err(Rejection::DepthExceeded {
                depth,
                max_depth: self.config.max_depth,
            });
        }

        let candidate = Candidate {
            url: &normalized,
            domain: &domain,
            depth,
        };
        inner
            .filters
            .evaluate(&candidate)
            .map_err(|filter| Rejection::Filtered { filter })?;

        Ok((normalized.to_string(), domain))
    }

    // ===== Dispatch =====

    /// Hands out the next dispatchable task, if any
    pub fn next_task(&self) -> Option<Task> {
        self.next_task_at(Instant::now())
    }

    /// Hands out the next task dispatchable at `now`
    ///
    /// Returns None when the scheduler is not running, when the concurrency
    /// ceiling is reached, or when every pending task is held back by its
    /// domain's politeness delay or its retry backoff.
    pub fn next_task_at(&self, now: Instant) -> Option<Task> {
        let mut inner = self.lock();

        if inner.lifecycle != Lifecycle::Running {
            return None;
        }

        if inner.stats.active() >= self.config.max_concurrent_tasks {
            tracing::trace!(
                "Concurrency ceiling reached ({} running)",
                inner.stats.active()
            );
            return None;
        }

        let Inner {
            queue,
            store,
            rate_limiter,
            stats,
            ..
        } = &mut *inner;

        let entry = queue.select(|entry| match store.get(&entry.id) {
            Some(task) if task.status == TaskStatus::Pending => {
                if task.metadata.is_eligible_at(now) && rate_limiter.can_dispatch(&entry.domain, now)
                {
                    Eligibility::Ready
                } else {
                    Eligibility::NotYet
                }
            }
            _ => Eligibility::Stale,
        })?;

        let task = store.get_mut(&entry.id)?;
        task.status = TaskStatus::Running;
        task.started_at = Some(Utc::now());
        task.metadata.retry_eligible_at = None;
        rate_limiter.record_dispatch(&entry.domain, now);
        stats.on_dispatched();

        tracing::debug!(
            "Dispatching task {} ({}), attempt {}",
            task.id,
            task.url,
            task.retry_count + 1
        );
        Some(task.clone())
    }

    /// Shortest wait until some pending task could be dispatched
    ///
    /// Considers politeness delays and retry backoff, not the concurrency
    /// ceiling. Returns None when nothing is pending.
    pub fn time_until_next_dispatch(&self, now: Instant) -> Option<Duration> {
        let inner = self.lock();
        inner
            .queue
            .iter()
            .filter_map(|entry| {
                let task = inner.store.get(&entry.id)?;
                if task.status != TaskStatus::Pending {
                    return None;
                }
                let backoff = task
                    .metadata
                    .retry_eligible_at
                    .map(|at| at.saturating_duration_since(now))
                    .unwrap_or(Duration::ZERO);
                let politeness = inner
                    .rate_limiter
                    .time_until_ready(&entry.domain, now)
                    .unwrap_or(Duration::ZERO);
                Some(backoff.max(politeness))
            })
            .min()
    }

    // ===== Completion =====

    /// Records a successful fetch and admits the URLs it discovered
    ///
    /// Discovered URLs are admitted at the parent's depth + 1 with the
    /// parent's priority and `discovered_from` set to the parent's URL. A
    /// link back to the parent's own URL is skipped.
    ///
    /// Returns None (and logs a warning) if the task is unknown or not RUNNING.
    pub fn mark_completed(
        &self,
        task_id: &TaskId,
        result: Option<Value>,
        discovered_urls: &[String],
    ) -> Option<Completion> {
        let mut inner = self.lock();

        let (parent_url, domain, depth, priority, execution_time) = {
            let task = match inner.store.get_mut(task_id) {
                Some(task) if task.status.can_transition_to(TaskStatus::Completed) => task,
                Some(task) => {
                    tracing::warn!(
                        "Ignoring completion of task {} in state {}",
                        task_id,
                        task.status
                    );
                    return None;
                }
                None => {
                    tracing::warn!("Ignoring completion of unknown task {}", task_id);
                    return None;
                }
            };

            task.status = TaskStatus::Completed;
            task.completed_at = Some(Utc::now());
            task.result = result;
            let execution_time = task.execution_time().unwrap_or_default();

            (
                task.url.clone(),
                task.domain.clone(),
                task.depth,
                task.priority,
                execution_time,
            )
        };

        inner.stats.on_completed(&domain);
        inner.store.retire(task_id);

        tracing::debug!(
            "Completed task {} ({}) in {:?}, {} links discovered",
            task_id,
            parent_url,
            execution_time,
            discovered_urls.len()
        );

        let mut spawned = Vec::new();
        let mut rejected = 0;
        for url in discovered_urls {
            let metadata = TaskMetadata {
                discovered_from: Some(parent_url.clone()),
                ..TaskMetadata::default()
            };
            match self.admit(
                &mut inner,
                url,
                depth + 1,
                priority,
                metadata,
                Some(task_id.clone()),
            ) {
                Ok(id) => spawned.push(id),
                Err(_) => rejected += 1,
            }
        }

        Some(Completion {
            execution_time,
            spawned,
            rejected,
        })
    }

    /// Records a failed fetch
    pub fn mark_failed(
        &self,
        task_id: &TaskId,
        error: &str,
        retry_allowed: bool,
    ) -> Option<FailureOutcome> {
        self.mark_failed_at(task_id, error, retry_allowed, Instant::now())
    }

    /// Records a failed fetch observed at `now`
    ///
    /// With retries left (and `retry_allowed`), the task goes back to PENDING
    /// in its original queue and becomes eligible after the backoff for its
    /// retry number. Otherwise it reaches FAILED with `error` as its message.
    ///
    /// Returns None (and logs a warning) if the task is unknown or not RUNNING.
    pub fn mark_failed_at(
        &self,
        task_id: &TaskId,
        error: &str,
        retry_allowed: bool,
        now: Instant,
    ) -> Option<FailureOutcome> {
        let mut inner = self.lock();

        let task = match inner.store.get_mut(task_id) {
            Some(task) if task.status.can_transition_to(TaskStatus::Failed) => task,
            Some(task) => {
                tracing::warn!(
                    "Ignoring failure of task {} in state {}",
                    task_id,
                    task.status
                );
                return None;
            }
            None => {
                tracing::warn!("Ignoring failure of unknown task {}", task_id);
                return None;
            }
        };

        if retry_allowed && task.retry_count < task.max_retries {
            task.retry_count += 1;
            task.status = TaskStatus::Pending;
            task.started_at = None;
            let backoff = self.backoff.delay_for(task.retry_count);
            task.metadata.retry_eligible_at = Some(now + backoff);

            let retry_count = task.retry_count;
            tracing::debug!(
                "Task {} ({}) failed: {}; retry {}/{} in {:?}",
                task_id,
                task.url,
                error,
                retry_count,
                task.max_retries,
                backoff
            );

            let entry = QueueEntry::for_task(task);
            inner.queue.push(entry);
            inner.stats.on_retried();

            Some(FailureOutcome::Retrying {
                retry_count,
                backoff,
            })
        } else {
            task.status = TaskStatus::Failed;
            task.completed_at = Some(Utc::now());
            task.error_message = Some(error.to_string());

            tracing::warn!(
                "Task {} ({}) failed after {} retries: {}",
                task_id,
                task.url,
                task.retry_count,
                error
            );

            inner.stats.on_failed();
            inner.store.retire(task_id);
            Some(FailureOutcome::Failed)
        }
    }

    /// Cancels a PENDING or RUNNING task
    ///
    /// Cancelling a running task only updates bookkeeping; the worker holding
    /// it is expected to notice via [`Scheduler::task_status`]. Cancelling an
    /// already-cancelled task is a no-op that returns true.
    pub fn cancel_task(&self, task_id: &TaskId) -> bool {
        let mut inner = self.lock();

        if inner.store.was_cancelled(task_id) {
            return true;
        }
        let task = match inner.store.get_mut(task_id) {
            Some(task) => task,
            None => {
                tracing::warn!("Ignoring cancellation of unknown task {}", task_id);
                return false;
            }
        };

        let was_running = match task.status {
            TaskStatus::Cancelled => return true,
            status if !status.can_transition_to(TaskStatus::Cancelled) => {
                tracing::warn!(
                    "Ignoring cancellation of task {} in state {}",
                    task_id,
                    status
                );
                return false;
            }
            status => status == TaskStatus::Running,
        };

        task.status = TaskStatus::Cancelled;
        task.completed_at = Some(Utc::now());
        tracing::debug!("Cancelled task {} ({})", task_id, task.url);

        inner.stats.on_cancelled(was_running);
        inner.store.retire(task_id);
        true
    }

    // ===== Lookup and reporting =====

    /// Returns a copy of the task record, including retained terminal tasks
    pub fn get_task(&self, task_id: &TaskId) -> Option<Task> {
        self.lock().store.get(task_id).cloned()
    }

    pub fn task_status(&self, task_id: &TaskId) -> Option<TaskStatus> {
        self.lock().store.get(task_id).map(|t| t.status)
    }

    /// Returns true when no task is PENDING or RUNNING
    pub fn frontier_is_empty(&self) -> bool {
        let inner = self.lock();
        inner.stats.active() == 0 && inner.stats.queued() == 0
    }

    /// Number of task records held, including retained terminal tasks
    pub fn tracked_tasks(&self) -> usize {
        self.lock().store.len()
    }

    /// Number of queue entries, including stale entries awaiting removal
    pub fn queue_len(&self) -> usize {
        self.lock().queue.len()
    }

    /// Names of the registered filters in evaluation order
    pub fn filter_names(&self) -> Vec<String> {
        self.lock().filters.names()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.lock().stats.snapshot()
    }

    /// Classifies current load; never mutates state
    pub fn health_check(&self) -> HealthReport {
        let inner = self.lock();
        classify_health(
            inner.stats.active(),
            self.config.max_concurrent_tasks,
            inner.stats.queued(),
            self.config.queue_overload_threshold,
            self.config.high_load_ratio,
        )
    }
}
