use crate::result::{DiscoveredLink, LinkSighting};
use std::collections::HashMap;
use url::Url;

/// Deduplicating, reference-counting table of discovered links.
///
/// Owned by the orchestrator's aggregation loop only. Records keep the
/// order they were first seen in so ties in the ranking are stable.
#[derive(Debug)]
pub struct LinkTable {
    display_param: String,
    index: HashMap<String, usize>,
    links: Vec<DiscoveredLink>,
}

impl LinkTable {
    pub fn new(display_param: impl Into<String>) -> Self {
        Self {
            display_param: display_param.into(),
            index: HashMap::new(),
            links: Vec::new(),
        }
    }

    /// Count one sighting. New links take their title from the display-name
    /// parameter; known links only get their count bumped.
    pub fn record(&mut self, sighting: LinkSighting) {
        let key = self.identity(&sighting.link);
        if let Some(&slot) = self.index.get(&key) {
            self.links[slot].reference_count += 1;
            return;
        }

        let title = self.title_of(&sighting.link);
        self.index.insert(key, self.links.len());
        self.links.push(DiscoveredLink {
            title,
            link: sighting.link.to_string(),
            origin: sighting.origin.to_string(),
            reference_count: 1,
        });
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn get(&self, link: &str) -> Option<&DiscoveredLink> {
        let url = Url::parse(link).ok()?;
        self.index.get(&self.identity(&url)).map(|&slot| &self.links[slot])
    }

    /// Copy out the table ranked by descending reference count.
    pub fn snapshot(&self) -> Vec<DiscoveredLink> {
        rank(self.links.clone())
    }

    pub fn into_ranked(self) -> Vec<DiscoveredLink> {
        rank(self.links)
    }

    fn title_of(&self, link: &Url) -> String {
        link.query_pairs()
            .find(|(key, _)| key == self.display_param.as_str())
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    }

    // The display name is cosmetic; two links differing only by it are the
    // same link.
    fn identity(&self, link: &Url) -> String {
        let Some(query) = link.query() else {
            return link.to_string();
        };

        let kept: Vec<&str> = query
            .split('&')
            .filter(|pair| pair.split('=').next() != Some(self.display_param.as_str()))
            .collect();

        let mut identity = link.clone();
        if kept.is_empty() {
            identity.set_query(None);
        } else {
            identity.set_query(Some(&kept.join("&")));
        }
        identity.to_string()
    }
}

/// Stable sort by descending reference count.
pub fn rank(mut links: Vec<DiscoveredLink>) -> Vec<DiscoveredLink> {
    links.sort_by(|a, b| b.reference_count.cmp(&a.reference_count));
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(link: &str, origin: &str) -> LinkSighting {
        LinkSighting {
            link: Url::parse(link).unwrap(),
            origin: Url::parse(origin).unwrap(),
        }
    }

    #[test]
    fn test_new_link_starts_at_one_with_title() {
        let mut table = LinkTable::new("dn");
        table.record(sighting(
            "magnet:?xt=urn:btih:abc&dn=Some+Title",
            "http://a.com/",
        ));

        let links = table.snapshot();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].reference_count, 1);
        assert_eq!(links[0].title, "Some Title");
        assert_eq!(links[0].origin, "http://a.com/");
    }

    #[test]
    fn test_rediscovery_increments_and_keeps_first_title_and_origin() {
        let mut table = LinkTable::new("dn");
        table.record(sighting("magnet:?xt=urn:btih:abc&dn=First", "http://a.com/"));
        table.record(sighting("magnet:?xt=urn:btih:abc&dn=Second", "http://b.com/"));
        table.record(sighting("magnet:?xt=urn:btih:abc&dn=First", "http://c.com/"));

        assert_eq!(table.len(), 1);
        let link = table.get("magnet:?xt=urn:btih:abc").unwrap();
        assert_eq!(link.reference_count, 3);
        assert_eq!(link.title, "First");
        assert_eq!(link.link, "magnet:?xt=urn:btih:abc&dn=First");
        assert_eq!(link.origin, "http://a.com/");
    }

    #[test]
    fn test_missing_display_name_gives_empty_title() {
        let mut table = LinkTable::new("dn");
        table.record(sighting("magnet:?xt=urn:btih:abc", "http://a.com/"));
        assert_eq!(table.snapshot()[0].title, "");
    }

    #[test]
    fn test_identity_without_display_name_is_the_url() {
        let table = LinkTable::new("dn");
        let url = Url::parse("magnet:?xt=urn:btih:abc&tr=udp%3A%2F%2Ft.example%3A80").unwrap();
        assert_eq!(table.identity(&url), url.to_string());
    }

    #[test]
    fn test_distinct_hashes_are_distinct_links() {
        let mut table = LinkTable::new("dn");
        table.record(sighting("magnet:?xt=urn:btih:aaa&dn=X", "http://a.com/"));
        table.record(sighting("magnet:?xt=urn:btih:bbb&dn=X", "http://a.com/"));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_custom_display_param() {
        let mut table = LinkTable::new("name");
        table.record(sighting("magnet:?xt=urn:btih:abc&name=Custom&dn=Other", "http://a.com/"));
        table.record(sighting("magnet:?xt=urn:btih:abc&name=Changed&dn=Other", "http://a.com/"));
        let links = table.snapshot();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].title, "Custom");
        assert_eq!(links[0].reference_count, 2);
    }

    #[test]
    fn test_rank_orders_by_descending_count() {
        let make = |link: &str, count| DiscoveredLink {
            title: String::new(),
            link: link.to_string(),
            origin: "http://a.com/".to_string(),
            reference_count: count,
        };
        let ranked = rank(vec![make("a", 1), make("b", 5), make("c", 3)]);
        let counts: Vec<usize> = ranked.iter().map(|l| l.reference_count).collect();
        assert_eq!(counts, vec![5, 3, 1]);
    }

    #[test]
    fn test_rank_keeps_discovery_order_for_ties() {
        let mut table = LinkTable::new("dn");
        table.record(sighting("magnet:?xt=urn:btih:first", "http://a.com/"));
        table.record(sighting("magnet:?xt=urn:btih:second", "http://a.com/"));
        table.record(sighting("magnet:?xt=urn:btih:third", "http://a.com/"));
        table.record(sighting("magnet:?xt=urn:btih:third", "http://a.com/"));

        let ranked = table.into_ranked();
        let links: Vec<&str> = ranked.iter().map(|l| l.link.as_str()).collect();
        assert_eq!(
            links,
            vec![
                "magnet:?xt=urn:btih:third",
                "magnet:?xt=urn:btih:first",
                "magnet:?xt=urn:btih:second",
            ]
        );
    }
}
