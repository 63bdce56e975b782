//! URL filter chain applied during admission
//!
//! Filters are ordered predicates evaluated after normalization, de-duplication
//! and the depth cutoff. The first filter that returns `false` vetoes the URL.
//! Built-in filters are created from the `[filters]` configuration table;
//! callers add their own behavior by registering any [`UrlFilter`], including
//! plain closures.

mod builtin;
mod chain;

pub use builtin::{
    AllowedDomains, DeniedDomains, DenyPatterns, DepthLimit, IncludePatterns, MaxPathSegments,
};
pub use chain::FilterChain;

use url::Url;

/// A URL under consideration for admission
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    /// Normalized URL
    pub url: &'a Url,

    /// Lowercase host of `url`
    pub domain: &'a str,

    /// Depth the task would be created at
    pub depth: u32,
}

/// A predicate that can veto a candidate URL
///
/// `allows` runs under the scheduler lock, so it must be quick and must not
/// call the scheduler it is registered with.
pub trait UrlFilter: Send + Sync {
    /// Name reported when this filter rejects a URL
    fn name(&self) -> &str {
        "custom"
    }

    /// Returns true if the candidate may enter the frontier
    fn allows(&self, candidate: &Candidate<'_>) -> bool;
}

/// A closure filter with a name for logs and rejection reports
pub struct NamedFilter<F> {
    name: String,
    predicate: F,
}

/// Wraps a closure as a named filter
///
/// ```
/// use ripple_frontier::filter::{from_fn, FilterChain};
///
/// let mut chain = FilterChain::new();
/// chain.register(from_fn("no-login", |c| !c.url.path().starts_with("/login")));
/// assert_eq!(chain.names(), vec!["no-login"]);
/// ```
pub fn from_fn<F>(name: impl Into<String>, predicate: F) -> NamedFilter<F>
where
    F: Fn(&Candidate<'_>) -> bool + Send + Sync,
{
    NamedFilter {
        name: name.into(),
        predicate,
    }
}

impl<F> UrlFilter for NamedFilter<F>
where
    F: Fn(&Candidate<'_>) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn allows(&self, candidate: &Candidate<'_>) -> bool {
        (self.predicate)(candidate)
    }
}

impl<F> UrlFilter for F
where
    F: Fn(&Candidate<'_>) -> bool + Send + Sync,
{
    fn allows(&self, candidate: &Candidate<'_>) -> bool {
        self(candidate)
    }
}
