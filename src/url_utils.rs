//! URL Utility Functions
//!
//! Helpers for page URLs (host lookup, scheme checks) and image sources
//! (resolution against the page URL, placeholder filenames).

use url::Url;

/// Check if a string is a valid absolute http(s) URL with a host.
///
/// # Returns
/// * `(is_absolute, parsed_url)` - Whether URL is absolute and the parsed URL if valid
#[must_use]
pub fn is_absolute_url(s: &str) -> (bool, Option<Url>) {
    let s = s.trim();

    if !s.starts_with("http://") && !s.starts_with("https://") {
        return (false, None);
    }

    match Url::parse(s) {
        Ok(url) if url.host().is_some() => (true, Some(url)),
        _ => (false, None),
    }
}

/// Extract the hostname from an http(s) URL.
#[must_use]
pub fn extract_hostname(url_str: &str) -> Option<String> {
    let (_, parsed) = is_absolute_url(url_str);
    parsed.and_then(|url| url.host_str().map(str::to_string))
}

/// Lowercase scheme of a URL (`"chrome"`, `"about"`, `"https"`...).
///
/// Returns `None` for empty or unparseable input.
#[must_use]
pub fn scheme(url_str: &str) -> Option<String> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return None;
    }
    Url::parse(trimmed).ok().map(|url| url.scheme().to_ascii_lowercase())
}

/// Resolve an image source against the page URL.
///
/// `data:` and other special URIs come back unchanged; relative paths are
/// joined onto `base` when it is a valid absolute URL.
///
/// # Examples
/// ```
/// use rs_chatscrape::url_utils::resolve_source;
///
/// assert_eq!(
///     resolve_source("/img/a.png", "https://chatgpt.com/c/1"),
///     "https://chatgpt.com/img/a.png"
/// );
/// assert_eq!(resolve_source("data:image/png;base64,AA==", "https://x.com"), "data:image/png;base64,AA==");
/// ```
#[must_use]
pub fn resolve_source(src: &str, base: &str) -> String {
    let src = src.trim();

    if src.is_empty() {
        return String::new();
    }

    if src.starts_with("data:") || src.starts_with("blob:") {
        return src.to_string();
    }

    if is_absolute_url(src).0 {
        return src.to_string();
    }

    match Url::parse(base.trim()) {
        Ok(base) => match base.join(src) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => src.to_string(),
        },
        Err(_) => src.to_string(),
    }
}

/// Extract filename from a URL, stripping query parameters and fragments.
///
/// # Examples
/// ```
/// use rs_chatscrape::url_utils::extract_filename;
///
/// assert_eq!(extract_filename("https://example.com/images/photo.jpg?v=123"), "photo.jpg");
/// assert_eq!(extract_filename("/path/to/image.png#section"), "image.png");
/// assert_eq!(extract_filename("https://example.com/"), "");
/// ```
#[must_use]
pub fn extract_filename(url: &str) -> String {
    let url = url.trim();

    let without_query = url.split('?').next().unwrap_or(url);
    let without_fragment = without_query.split('#').next().unwrap_or(without_query);

    let filename = without_fragment.rsplit('/').next().unwrap_or("").trim();

    if filename.is_empty() || filename == "." || filename == ".." {
        return String::new();
    }

    filename.to_string()
}
