//! State module for tracking scheduling progress
//!
//! # Components
//!
//! - `TaskStatus`: lifecycle state of a single task (pending, running, completed, ...)
//! - `DomainState`: per-domain dispatch bookkeeping used for politeness

mod domain_state;
mod task_status;

// Re-export main types
pub use domain_state::DomainState;
pub use task_status::TaskStatus;
