//! Task records and the frontier index
//!
//! Terminal tasks are retained for lookup up to a configured limit. Ids of
//! cancelled tasks outlive their records for a while longer so that repeated
//! cancellation keeps answering true.

use super::task::{Task, TaskId};
use crate::state::TaskStatus;
use std::collections::{HashMap, HashSet, VecDeque};

/// Authoritative owner of every task record
///
/// Besides the records keyed by id, the store keeps an index from normalized
/// URL to the task currently holding that URL in the frontier. A URL leaves
/// the index as soon as its task reaches a terminal state, which is what lets
/// the same URL be admitted again later.
#[derive(Debug)]
pub(crate) struct TaskStore {
    tasks: HashMap<TaskId, Task>,

    /// Normalized URL -> non-terminal task
    frontier_index: HashMap<String, TaskId>,

    /// Terminal tasks in the order they finished, for retention eviction
    finished: VecDeque<TaskId>,

    /// Maximum number of terminal tasks kept
    retention: usize,

    /// Ids of cancelled tasks whose records were evicted, oldest first
    cancelled_evicted: VecDeque<TaskId>,
    cancelled_lookup: HashSet<TaskId>,

    next_seq: u64,
}

impl TaskStore {
    pub(crate) fn new(retention: usize) -> Self {
        Self {
            tasks: HashMap::new(),
            frontier_index: HashMap::new(),
            finished: VecDeque::new(),
            retention,
            cancelled_evicted: VecDeque::new(),
            cancelled_lookup: HashSet::new(),
            next_seq: 0,
        }
    }

    /// Hands out the next creation sequence number
    pub(crate) fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Returns the task holding `url` in the frontier, if any
    pub(crate) fn frontier_task(&self, url: &str) -> Option<&TaskId> {
        self.frontier_index.get(url)
    }

    /// Inserts a freshly admitted task
    pub(crate) fn insert(&mut self, task: Task) {
        self.frontier_index.insert(task.url.clone(), task.id.clone());
        self.tasks.insert(task.id.clone(), task);
    }

    pub(crate) fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.get_mut(id)
    }

    /// Moves a task that just reached a terminal state out of the frontier
    ///
    /// Evicts the oldest terminal tasks beyond the retention limit.
    pub(crate) fn retire(&mut self, id: &TaskId) {
        if let Some(task) = self.tasks.get(id) {
            if self.frontier_index.get(&task.url) == Some(id) {
                self.frontier_index.remove(&task.url);
            }
        }
        self.finished.push_back(id.clone());

        while self.finished.len() > self.retention {
            let Some(evicted) = self.finished.pop_front() else {
                break;
            };
            if let Some(task) = self.tasks.remove(&evicted) {
                if task.status == TaskStatus::Cancelled {
                    self.remember_cancelled(evicted);
                }
            }
        }
    }

    /// Keeps at most `retention` (and at least one) evicted cancelled ids
    fn remember_cancelled(&mut self, id: TaskId) {
        if self.cancelled_lookup.insert(id.clone()) {
            self.cancelled_evicted.push_back(id);
        }
        while self.cancelled_evicted.len() > self.retention.max(1) {
            if let Some(forgotten) = self.cancelled_evicted.pop_front() {
                self.cancelled_lookup.remove(&forgotten);
            }
        }
    }

    /// Returns true if `id` was cancelled and its record has since been evicted
    pub(crate) fn was_cancelled(&self, id: &TaskId) -> bool {
        self.cancelled_lookup.contains(id)
    }

    /// Number of task records currently held
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn clear(&mut self) {
        self.tasks.clear();
        self.frontier_index.clear();
        self.finished.clear();
        self.cancelled_evicted.clear();
        self.cancelled_lookup.clear();
        self.next_seq = 0;
    }
}
