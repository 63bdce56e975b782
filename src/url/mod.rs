//! URL handling module for Ripple-Frontier
//!
//! This module provides URL normalization (the de-duplication key for tasks),
//! domain extraction (the politeness key for the rate limiter), and wildcard
//! domain matching used by filters and delay overrides.

mod domain;
mod matcher;
mod normalize;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;
