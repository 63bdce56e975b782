use crate::config::types::{Config, FilterConfig, SchedulerConfig};
use crate::ConfigError;
use regex::Regex;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_filter_config(&config.filters)?;
    Ok(())
}

/// Validates scheduler configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_tasks < 1 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_tasks must be >= 1, got {}",
            config.max_concurrent_tasks
        )));
    }

    if config.retry_backoff_schedule.is_empty() {
        return Err(ConfigError::Validation(
            "retry_backoff_schedule must contain at least one delay".to_string(),
        ));
    }

    if !(config.high_load_ratio > 0.0 && config.high_load_ratio <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "high_load_ratio must be in (0, 1], got {}",
            config.high_load_ratio
        )));
    }

    if config.queue_overload_threshold < 1 {
        return Err(ConfigError::Validation(
            "queue_overload_threshold must be >= 1".to_string(),
        ));
    }

    if config.completed_retention < 1 {
        return Err(ConfigError::Validation(
            "completed_retention must be >= 1".to_string(),
        ));
    }

    for domain in config.domain_delay_overrides.keys() {
        validate_domain_pattern(domain)?;
    }

    Ok(())
}

/// Validates filter configuration
fn validate_filter_config(config: &FilterConfig) -> Result<(), ConfigError> {
    for pattern in config
        .allowed_domains
        .iter()
        .chain(config.denied_domains.iter())
    {
        validate_domain_pattern(pattern)?;
    }

    for pattern in config
        .deny_patterns
        .iter()
        .chain(config.include_patterns.iter())
    {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("Invalid regex '{}': {}", pattern, e))
        })?;
    }

    Ok(())
}

/// Validates a domain pattern (supports wildcards)
fn validate_domain_pattern(pattern: &str) -> Result<(), ConfigError> {
    if pattern.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain pattern cannot be empty".to_string(),
        ));
    }

    match pattern.strip_prefix("*.") {
        Some(domain) => validate_domain_string(domain),
        None => validate_domain_string(pattern),
    }
}

/// Validates a domain string (without wildcard prefix)
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
