/// Checks if a domain matches a wildcard pattern
///
/// Patterns are either an exact domain (`example.com`) or a wildcard
/// (`*.example.com`). A wildcard covers the bare domain and every subdomain
/// below it, at any nesting depth. Both sides are expected in lowercase.
///
/// # Examples
///
/// ```
/// use ripple_frontier::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "blog.example.com"));
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
/// assert!(!matches_wildcard("*.example.com", "notexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}
