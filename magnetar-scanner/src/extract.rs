use scraper::{Html, Selector};
use std::sync::LazyLock;

static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

/// Turns a response body into the raw href strings it contains.
pub trait LinkExtractor: Send + Sync {
    fn extract(&self, body: &str) -> Vec<String>;
}

/// Collects the `href` of every anchor element, in document order.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, body: &str) -> Vec<String> {
        let document = Html::parse_document(body);
        document
            .select(&ANCHOR_SELECTOR)
            .filter_map(|element| element.value().attr("href"))
            .map(|href| href.to_string())
            .collect()
    }
}
