//! Configuration module for Ripple-Frontier
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file yields a usable scheduler.
//!
//! # Example
//!
//! ```no_run
//! use ripple_frontier::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("frontier.toml")).unwrap();
//! println!("Scheduler will use max depth: {}", config.scheduler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FilterConfig, SchedulerConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
