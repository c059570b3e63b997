//! Host normalization shared by the router and the validator.

use url::Url;

/// Normalize a URL (or bare host) to a lowercase host without `www.`.
///
/// Accepts inputs with or without a scheme:
/// `https://www.iShares.com/us/` and `ishares.com/us` both give `ishares.com`.
pub fn normalize_host(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let url = Url::parse(&with_scheme).ok()?;
    let host = url.host_str()?.trim_end_matches('.').to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    if host.is_empty() {
        None
    } else {
        Some(host)
    }
}

/// Path of a URL without a trailing slash (`/` for the root).
pub fn normalize_path(input: &str) -> String {
    let trimmed = input.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    match Url::parse(&with_scheme) {
        Ok(url) => {
            let path = url.path().trim_end_matches('/').to_lowercase();
            if path.is_empty() {
                "/".to_string()
            } else {
                path
            }
        }
        Err(_) => "/".to_string(),
    }
}

/// Whether `host` is `pattern` or one of its subdomains.
pub fn host_matches(host: &str, pattern: &str) -> bool {
    host == pattern
        || host
            .strip_suffix(pattern)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
