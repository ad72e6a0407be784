use url::Url;

/// Resolve a possibly-relative `href` against the page it was found on.
///
/// Malformed hrefs yield `None`; callers skip them. Absolute hrefs of any
/// scheme (including `magnet:`) come back unchanged apart from
/// normalisation.
pub fn resolve(href: &str, base: &Url) -> Option<Url> {
    base.join(href.trim()).ok()
}

pub fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Host as it appears in the authority, including an explicit port.
pub fn host_with_port(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}
