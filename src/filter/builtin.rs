use super::{Candidate, UrlFilter};
use crate::url::matches_wildcard;
use regex::Regex;

/// Admits only URLs whose domain matches one of the patterns
#[derive(Debug, Clone)]
pub struct AllowedDomains {
    patterns: Vec<String>,
}

impl AllowedDomains {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

impl UrlFilter for AllowedDomains {
    fn name(&self) -> &str {
        "allowed-domains"
    }

    fn allows(&self, candidate: &Candidate<'_>) -> bool {
        self.patterns
            .iter()
            .any(|pattern| matches_wildcard(pattern, candidate.domain))
    }
}

/// Rejects URLs whose domain matches any of the patterns
#[derive(Debug, Clone)]
pub struct DeniedDomains {
    patterns: Vec<String>,
}

impl DeniedDomains {
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

impl UrlFilter for DeniedDomains {
    fn name(&self) -> &str {
        "denied-domains"
    }

    fn allows(&self, candidate: &Candidate<'_>) -> bool {
        !self
            .patterns
            .iter()
            .any(|pattern| matches_wildcard(pattern, candidate.domain))
    }
}

/// Rejects URLs matching any of the regular expressions
#[derive(Debug, Clone)]
pub struct DenyPatterns {
    patterns: Vec<Regex>,
}

impl DenyPatterns {
    pub fn new(patterns: &[String]) -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: compile(patterns)?,
        })
    }
}

impl UrlFilter for DenyPatterns {
    fn name(&self) -> &str {
        "deny-patterns"
    }

    fn allows(&self, candidate: &Candidate<'_>) -> bool {
        let url = candidate.url.as_str();
        !self.patterns.iter().any(|p| p.is_match(url))
    }
}

/// Admits only URLs matching at least one of the regular expressions
#[derive(Debug, Clone)]
pub struct IncludePatterns {
    patterns: Vec<Regex>,
}

impl IncludePatterns {
    pub fn new(patterns: &[String]) -> Result<Self, regex::Error> {
        Ok(Self {
            patterns: compile(patterns)?,
        })
    }
}

impl UrlFilter for IncludePatterns {
    fn name(&self) -> &str {
        "include-patterns"
    }

    fn allows(&self, candidate: &Candidate<'_>) -> bool {
        let url = candidate.url.as_str();
        self.patterns.iter().any(|p| p.is_match(url))
    }
}

/// Rejects URLs with more path segments than the limit
///
/// Deep paths are a common crawl trap (calendars, recursive symlinks).
#[derive(Debug, Clone, Copy)]
pub struct MaxPathSegments {
    limit: usize,
}

impl MaxPathSegments {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl UrlFilter for MaxPathSegments {
    fn name(&self) -> &str {
        "max-path-segments"
    }

    fn allows(&self, candidate: &Candidate<'_>) -> bool {
        let segments = candidate
            .url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).count())
            .unwrap_or(0);
        segments <= self.limit
    }
}

/// Rejects candidates deeper than the limit
///
/// The scheduler already enforces its global `max-depth`; this filter lets a
/// caller apply a tighter cutoff to part of the frontier.
#[derive(Debug, Clone, Copy)]
pub struct DepthLimit {
    max_depth: u32,
}

impl DepthLimit {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }
}

impl UrlFilter for DepthLimit {
    fn name(&self) -> &str {
        "depth-limit"
    }

    fn allows(&self, candidate: &Candidate<'_>) -> bool {
        candidate.depth <= self.max_depth
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, regex::Error> {
    patterns.iter().map(|p| Regex::new(p)).collect()
}
