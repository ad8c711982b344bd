use url::Url;

/// Builds the absolute form of a host-relative href by prefixing the host
///
/// No canonicalisation happens beyond the concatenation: two URLs are the same
/// frontier entry iff the resulting strings are equal.
///
/// # Examples
///
/// ```
/// use catalog_harvester::url::absolutize;
///
/// assert_eq!(
///     absolutize("https://example.com", "/html/a/1.html"),
///     "https://example.com/html/a/1.html"
/// );
/// ```
pub fn absolutize(host: &str, href: &str) -> String {
    format!("{}{}", host, href)
}

/// Returns true for `/path` style hrefs (but not protocol-relative `//host/path`)
pub fn is_host_relative(href: &str) -> bool {
    href.starts_with('/') && !href.starts_with("//")
}

/// Returns true for hrefs that already carry a scheme or authority
pub fn is_absolute(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Resolves a relative href against the directory of `page_url`
///
/// The directory is everything up to and including the last `/` of the page
/// URL, so `page2.html` seen on `https://h/html/a/index.html` becomes
/// `https://h/html/a/page2.html`. Returns `None` when the page URL has no `/`.
pub fn resolve_in_directory(page_url: &str, href: &str) -> Option<String> {
    let index = page_url.rfind('/')?;
    Some(format!("{}{}", &page_url[..=index], href))
}

/// Derives a human-readable label from the path of a category href
///
/// Takes the last non-empty path segment that does not look like a file
/// name (`index.html`, `list_1.htm`). Used when a category
/// anchor carries no text.
///
/// ```
/// use catalog_harvester::url::path_label;
///
/// assert_eq!(path_label("https://h.com", "/html/gndy/dyzz/index.html"), Some("dyzz".to_string()));
/// assert_eq!(path_label("https://h.com", "/html/tv/"), Some("tv".to_string()));
/// assert_eq!(path_label("https://h.com", "/index.html"), None);
/// ```
pub fn path_label(host: &str, href: &str) -> Option<String> {
    let url = Url::parse(host).ok()?.join(href).ok()?;

    url.path_segments()?
        .filter(|segment| !segment.is_empty() && !segment.contains('.'))
        .last()
        .map(str::to_string)
        .filter(|label| !label.is_empty())
}
