//! Dual queue over pending tasks
//!
//! NORMAL tasks live in a FIFO (breadth-first) queue. HIGH and LOW tasks live
//! in a binary heap ordered by priority, then creation order. Entries are
//! lightweight references; the task store stays authoritative and stale
//! entries are dropped when they are met during a scan.

use super::task::{Priority, Task, TaskId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// A queued reference to a pending task
#[derive(Debug, Clone)]
pub(crate) struct QueueEntry {
    pub(crate) id: TaskId,

    /// Politeness key of the task
    pub(crate) domain: String,

    pub(crate) priority: Priority,

    /// Creation sequence of the task
    pub(crate) seq: u64,
}

impl QueueEntry {
    pub(crate) fn for_task(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            domain: task.domain.clone(),
            priority: task.priority,
            seq: task.seq,
        }
    }
}

// Higher priority pops first; within a priority the older task pops first
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.seq == other.seq
    }
}

impl Eq for QueueEntry {}

/// Verdict on a queue entry during a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Eligibility {
    /// Dispatch this entry now
    Ready,

    /// Keep the entry queued (rate limited or in retry backoff)
    NotYet,

    /// The task is no longer pending; drop the entry
    Stale,
}

/// FIFO queue for NORMAL work plus a priority heap for everything else
#[derive(Debug, Default)]
pub(crate) struct DualQueue {
    priority: BinaryHeap<QueueEntry>,
    fifo: VecDeque<QueueEntry>,
}

impl DualQueue {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Routes an entry by priority
    pub(crate) fn push(&mut self, entry: QueueEntry) {
        if entry.priority == Priority::Normal {
            self.fifo.push_back(entry);
        } else {
            self.priority.push(entry);
        }
    }

    /// Removes and returns the first entry the predicate calls `Ready`
    ///
    /// Scan order:
    /// 1. HIGH entries from the heap, in heap order
    /// 2. One full pass over the FIFO; entries that are not ready rotate to the back
    /// 3. The remaining (LOW) heap entries, in heap order
    ///
    /// Every entry is inspected at most once per call, so a call that finds
    /// nothing terminates after one pass over both structures.
    pub(crate) fn select<F>(&mut self, mut check: F) -> Option<QueueEntry>
    where
        F: FnMut(&QueueEntry) -> Eligibility,
    {
        let mut deferred = Vec::new();
        let mut found = None;

        while self
            .priority
            .peek()
            .is_some_and(|top| top.priority > Priority::Normal)
        {
            let Some(entry) = self.priority.pop() else {
                break;
            };
            match check(&entry) {
                Eligibility::Ready => {
                    found = Some(entry);
                    break;
                }
                Eligibility::NotYet => deferred.push(entry),
                Eligibility::Stale => {}
            }
        }

        if found.is_none() {
            found = self.select_fifo(&mut check);
        }

        if found.is_none() {
            while let Some(entry) = self.priority.pop() {
                match check(&entry) {
                    Eligibility::Ready => {
                        found = Some(entry);
                        break;
                    }
                    Eligibility::NotYet => deferred.push(entry),
                    Eligibility::Stale => {}
                }
            }
        }

        self.priority.extend(deferred);
        found
    }

    /// One bounded pass over the FIFO queue
    fn select_fifo<F>(&mut self, check: &mut F) -> Option<QueueEntry>
    where
        F: FnMut(&QueueEntry) -> Eligibility,
    {
        let pass = self.fifo.len();
        for _ in 0..pass {
            let entry = self.fifo.pop_front()?;
            match check(&entry) {
                Eligibility::Ready => return Some(entry),
                Eligibility::NotYet => self.fifo.push_back(entry),
                Eligibility::Stale => {}
            }
        }
        None
    }

    /// Iterates every entry without removing anything
    pub(crate) fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.priority.iter().chain(self.fifo.iter())
    }

    /// Number of entries, including stale ones not yet dropped
    pub(crate) fn len(&self) -> usize {
        self.priority.len() + self.fifo.len()
    }

    pub(crate) fn clear(&mut self) {
        self.priority.clear();
        self.fifo.clear();
    }
}
