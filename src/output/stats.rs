//! Incremental scheduler statistics

use crate::scheduler::Rejection;
use serde::Serialize;
use std::collections::BTreeSet;

/// Point-in-time copy of the scheduler counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Tasks admitted into the frontier
    pub discovered: u64,

    /// Admission rejections of any kind
    pub filtered_out: u64,

    /// Rejections because the URL was already in the frontier
    pub rejected_duplicate: u64,

    /// Rejections because the depth exceeded the cutoff
    pub rejected_depth: u64,

    /// Rejections because the URL could not be normalized
    pub rejected_malformed: u64,

    /// Rejections by a registered filter
    pub rejected_by_filter: u64,

    pub completed: u64,
    pub failed: u64,
    pub cancelled: u64,

    /// Failures that were re-queued with backoff
    pub retried: u64,

    /// Tasks currently RUNNING
    pub active: usize,

    /// Tasks currently PENDING, including those in retry backoff
    pub queued: usize,

    /// Domains with at least one completed task
    pub crawled_domains: BTreeSet<String>,

    /// Mean depth of admitted tasks
    pub average_depth: f64,
}

/// Running counters updated on every scheduler mutation
#[derive(Debug, Default)]
pub(crate) struct StatsCollector {
    snapshot: StatsSnapshot,
    depth_sum: u64,
}

impl StatsCollector {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on_admitted(&mut self, depth: u32) {
        let s = &mut self.snapshot;
        s.discovered += 1;
        s.queued += 1;
        self.depth_sum += u64::from(depth);
        s.average_depth = self.depth_sum as f64 / s.discovered as f64;
    }

    pub(crate) fn on_rejected(&mut self, rejection: &Rejection) {
        let s = &mut self.snapshot;
        s.filtered_out += 1;
        match rejection {
            Rejection::Duplicate { .. } => s.rejected_duplicate += 1,
            Rejection::DepthExceeded { .. } => s.rejected_depth += 1,
            Rejection::Malformed(_) => s.rejected_malformed += 1,
            Rejection::Filtered { .. } => s.rejected_by_filter += 1,
            Rejection::ShutDown => {}
        }
    }

    pub(crate) fn on_dispatched(&mut self) {
        let s = &mut self.snapshot;
        s.queued = s.queued.saturating_sub(1);
        s.active += 1;
    }

    pub(crate) fn on_completed(&mut self, domain: &str) {
        let s = &mut self.snapshot;
        s.active = s.active.saturating_sub(1);
        s.completed += 1;
        if !s.crawled_domains.contains(domain) {
            s.crawled_domains.insert(domain.to_string());
        }
    }

    pub(crate) fn on_retried(&mut self) {
        let s = &mut self.snapshot;
        s.active = s.active.saturating_sub(1);
        s.queued += 1;
        s.retried += 1;
    }

    pub(crate) fn on_failed(&mut self) {
        let s = &mut self.snapshot;
        s.active = s.active.saturating_sub(1);
        s.failed += 1;
    }

    /// Records a cancellation; `was_running` says which gauge to decrement
    pub(crate) fn on_cancelled(&mut self, was_running: bool) {
        let s = &mut self.snapshot;
        if was_running {
            s.active = s.active.saturating_sub(1);
        } else {
            s.queued = s.queued.saturating_sub(1);
        }
        s.cancelled += 1;
    }

    pub(crate) fn active(&self) -> usize {
        self.snapshot.active
    }

    pub(crate) fn queued(&self) -> usize {
        self.snapshot.queued
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        self.snapshot.clone()
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StatsSnapshot) {
    println!("=== Scheduler Statistics ===\n");

    println!("Frontier:");
    println!("  Discovered: {}", stats.discovered);
    println!("  Queued: {}", stats.queued);
    println!("  Active: {}", stats.active);
    println!("  Average depth: {:.2}", stats.average_depth);
    println!();

    println!("Outcomes:");
    println!("  Completed: {}", stats.completed);
    println!("  Failed: {}", stats.failed);
    println!("  Cancelled: {}", stats.cancelled);
    println!("  Retried: {}", stats.retried);
    println!();

    if stats.filtered_out > 0 {
        println!("Rejected at admission: {}", stats.filtered_out);
        println!("  Duplicate: {}", stats.rejected_duplicate);
        println!("  Depth exceeded: {}", stats.rejected_depth);
        println!("  Malformed: {}", stats.rejected_malformed);
        println!("  Filtered: {}", stats.rejected_by_filter);
        println!();
    }

    if !stats.crawled_domains.is_empty() {
        println!("Crawled Domains ({}):", stats.crawled_domains.len());
        for domain in &stats.crawled_domains {
            println!("  - {}", domain);
        }
        println!();
    }
}
