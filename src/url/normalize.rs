use crate::UrlError;
use url::Url;

/// Normalizes a URL into the form used as the task de-duplication key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https` schemes (the scheme is lowercased by parsing)
/// 3. Require a host and lowercase it
/// 4. Resolve dot segments and drop the scheme's default port (done by parsing)
/// 5. Remove the fragment
/// 6. Remove an empty query string (trailing `?`)
///
/// Path and query are otherwise kept byte-for-byte: two URLs differing only
/// in path case or parameter order are different tasks.
///
/// # Examples
///
/// ```
/// use ripple_frontier::url::normalize_url;
///
/// let url = normalize_url("HTTPS://A.Example:443/x#top").unwrap();
/// assert_eq!(url.as_str(), "https://a.example/x");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(UrlError::MissingDomain),
    };
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}
