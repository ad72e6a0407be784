use serde::{Deserialize, Serialize};
use url::Url;

/// A page waiting to be fetched, with its hop count from the nearest seed
/// or magnet-bearing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: Url,
    pub distance: usize,
}

impl Target {
    pub fn new(url: Url, distance: usize) -> Self {
        Self { url, distance }
    }

    pub fn seed(url: Url) -> Self {
        Self::new(url, 0)
    }
}

/// One sighting of a target-scheme link, as emitted by a worker stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSighting {
    pub link: Url,
    pub origin: Url,
}

/// A distinct target-scheme link and how often the crawl referenced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredLink {
    pub title: String,
    pub link: String,
    pub origin: String,
    pub reference_count: usize,
}

impl DiscoveredLink {
    /// Host of the page the link was first found on, for display.
    pub fn origin_host(&self) -> String {
        Url::parse(&self.origin)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_else(|| self.origin.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_target_starts_at_zero() {
        let target = Target::seed(Url::parse("http://example.com/").unwrap());
        assert_eq!(target.distance, 0);
    }

    #[test]
    fn test_origin_host() {
        let link = DiscoveredLink {
            title: "x".to_string(),
            link: "magnet:?xt=urn:btih:abc".to_string(),
            origin: "https://tracker.example.org/list?page=2".to_string(),
            reference_count: 1,
        };
        assert_eq!(link.origin_host(), "tracker.example.org");
    }

    #[test]
    fn test_origin_host_unparsable_falls_back() {
        let link = DiscoveredLink {
            title: String::new(),
            link: String::new(),
            origin: "not a url".to_string(),
            reference_count: 1,
        };
        assert_eq!(link.origin_host(), "not a url");
    }
}
