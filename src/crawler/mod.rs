//! Worker side of the scheduler
//!
//! The scheduler never fetches anything itself. This module provides the
//! seam a fetch layer plugs into:
//! - The async [`Fetcher`] trait implemented by the caller
//! - A [`WorkerPool`] that polls the scheduler, runs fetches and reports
//!   completions and failures back

mod worker;

pub use worker::{FetchError, FetchOutcome, Fetcher, WorkerPool, WorkerSummary, FETCHER_PANICKED};
