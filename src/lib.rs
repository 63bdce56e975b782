//! Ripple-Frontier: the crawl task scheduler
//!
//! This crate decides which discovered URL a crawl worker should fetch next.
//! It owns the crawl frontier, enforces per-domain politeness delays and a
//! global concurrency ceiling, and recovers from transient fetch failures with
//! an escalating retry backoff. Fetching itself is left to the caller.

pub mod config;
pub mod crawler;
pub mod filter;
pub mod output;
pub mod scheduler;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Ripple-Frontier operations
#[derive(Debug, Error)]
pub enum FrontierError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Invalid filter pattern: {0}")]
    Filter(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Ripple-Frontier operations
pub type Result<T> = std::result::Result<T, FrontierError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, SchedulerConfig};
pub use filter::{FilterChain, UrlFilter};
pub use output::{HealthReport, HealthStatus, StatsSnapshot};
pub use scheduler::{Priority, Rejection, Scheduler, Task, TaskId, TaskMetadata};
pub use state::TaskStatus;
pub use url::{extract_domain, normalize_url};
