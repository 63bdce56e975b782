//! Politeness keys

use url::Url;

/// Returns the key a task is rate limited under
///
/// The key is the lowercase host without port, so `a.example:8080` and
/// `A.example` share one per-domain delay. Subdomains get their own key;
/// `*.domain` overrides in the rate limiter cover them. `None` means the URL
/// has no host, and admission rejects it as malformed.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_frontier::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
