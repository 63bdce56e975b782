use super::builtin::{AllowedDomains, DeniedDomains, DenyPatterns, IncludePatterns, MaxPathSegments};
use super::{Candidate, UrlFilter};
use crate::config::FilterConfig;
use crate::FrontierError;

/// Ordered list of URL filters
#[derive(Default)]
pub struct FilterChain {
    filters: Vec<Box<dyn UrlFilter>>,
}

impl FilterChain {
    /// Creates an empty chain that admits every URL
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the built-in filters described by the configuration
    ///
    /// Filters are added in a fixed order: domain deny list, domain allow
    /// list, regex deny patterns, regex include patterns, path segment limit.
    /// Empty settings add no filter.
    pub fn from_config(config: &FilterConfig) -> Result<Self, FrontierError> {
        let mut chain = Self::new();

        if !config.denied_domains.is_empty() {
            chain.register(DeniedDomains::new(config.denied_domains.clone()));
        }
        if !config.allowed_domains.is_empty() {
            chain.register(AllowedDomains::new(config.allowed_domains.clone()));
        }
        if !config.deny_patterns.is_empty() {
            chain.register(DenyPatterns::new(&config.deny_patterns)?);
        }
        if !config.include_patterns.is_empty() {
            chain.register(IncludePatterns::new(&config.include_patterns)?);
        }
        if config.max_path_segments > 0 {
            chain.register(MaxPathSegments::new(config.max_path_segments));
        }

        Ok(chain)
    }

    /// Appends a filter to the end of the chain
    pub fn register<F>(&mut self, filter: F)
    where
        F: UrlFilter + 'static,
    {
        self.filters.push(Box::new(filter));
    }

    /// Runs every filter in order
    ///
    /// Returns the name of the first filter that rejects the candidate.
    pub fn evaluate(&self, candidate: &Candidate<'_>) -> Result<(), String> {
        for filter in &self.filters {
            if !filter.allows(candidate) {
                tracing::trace!(
                    "Filter '{}' rejected {} at depth {}",
                    filter.name(),
                    candidate.url,
                    candidate.depth
                );
                return Err(filter.name().to_string());
            }
        }
        Ok(())
    }

    /// Names of the registered filters, in evaluation order
    pub fn names(&self) -> Vec<String> {
        self.filters.iter().map(|f| f.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl std::fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::from_fn;
    use crate::url::normalize_url;

    fn check(chain: &FilterChain, url: &str, depth: u32) -> Result<(), String> {
        let url = normalize_url(url).unwrap();
        let domain = url.host_str().unwrap().to_string();
        chain.evaluate(&Candidate {
            url: &url,
            domain: &domain,
            depth,
        })
    }

    fn create_test_config() -> FilterConfig {
        FilterConfig {
            allowed_domains: vec!["*.a.example".to_string()],
            denied_domains: vec!["ads.a.example".to_string()],
            deny_patterns: vec![r"\.(jpg|png|css|js)$".to_string()],
            include_patterns: vec![],
            max_path_segments: 3,
        }
    }

    #[test]
    fn test_empty_chain_admits_everything() {
        let chain = FilterChain::new();
        assert!(chain.is_empty());
        assert!(check(&chain, "https://anything.example/x", 4).is_ok());
    }

    #[test]
    fn test_from_config_order() {
        let chain = FilterChain::from_config(&create_test_config()).unwrap();
        assert_eq!(
            chain.names(),
            vec![
                "denied-domains",
                "allowed-domains",
                "deny-patterns",
                "max-path-segments"
            ]
        );
    }

    #[test]
    fn test_from_config_rejections() {
        let chain = FilterChain::from_config(&create_test_config()).unwrap();

        assert!(check(&chain, "https://a.example/page", 0).is_ok());
        assert!(check(&chain, "https://www.a.example/page", 0).is_ok());

        assert_eq!(
            check(&chain, "https://ads.a.example/page", 0),
            Err("denied-domains".to_string())
        );
        assert_eq!(
            check(&chain, "https://b.example/page", 0),
            Err("allowed-domains".to_string())
        );
        assert_eq!(
            check(&chain, "https://a.example/logo.png", 0),
            Err("deny-patterns".to_string())
        );
        assert_eq!(
            check(&chain, "https://a.example/1/2/3/4", 0),
            Err("max-path-segments".to_string())
        );
    }

    #[test]
    fn test_invalid_regex_is_an_error() {
        let mut config = create_test_config();
        config.include_patterns.push("([".to_string());
        assert!(matches!(
            FilterChain::from_config(&config),
            Err(FrontierError::Filter(_))
        ));
    }

    #[test]
    fn test_closure_filter_and_first_rejection_wins() {
        let mut chain = FilterChain::new();
        chain.register(from_fn("no-private", |c| !c.url.path().starts_with("/private")));
        chain.register(from_fn("shallow", |c| c.depth < 2));

        assert_eq!(
            check(&chain, "https://a.example/private/x", 0),
            Err("no-private".to_string())
        );
        assert_eq!(
            check(&chain, "https://a.example/x", 2),
            Err("shallow".to_string())
        );
        assert!(check(&chain, "https://a.example/x", 1).is_ok());
        assert_eq!(chain.len(), 2);
    }
}
