// Tests for crawl options and orchestration helpers

use magnetar_core::crawl::{CrawlOptions, execute_crawl_until, scope_from_seeds, summarize};
use magnetar_scanner::{DiscoveredLink, ScanError};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

fn link(url: &str, count: usize) -> DiscoveredLink {
    DiscoveredLink {
        title: String::new(),
        link: url.to_string(),
        origin: "http://example.com/".to_string(),
        reference_count: count,
    }
}

// ============================================================================
// Option Defaults
// ============================================================================

#[test]
fn test_default_options() {
    let options = CrawlOptions::default();
    assert_eq!(options.max_distance, 3);
    assert_eq!(options.stages, 16);
    assert_eq!(options.channel_capacity, 1024 * 1024);
    assert_eq!(options.timeout_secs, 5);
    assert!(!options.verify_tls);
    assert_eq!(options.target_scheme, "magnet");
    assert_eq!(options.display_param, "dn");
    assert!(options.seeds.is_empty());
    assert!(options.domain_scope.is_empty());
}

// ============================================================================
// Scope Tests
// ============================================================================

#[test]
fn test_scope_from_seeds_uses_hosts() {
    let seeds = vec![
        "https://kat.example/".to_string(),
        "http://www.torrents.example/list".to_string(),
        "http://127.0.0.1:8080/".to_string(),
    ];
    assert_eq!(
        scope_from_seeds(&seeds),
        vec!["kat.example", "www.torrents.example", "127.0.0.1:8080"]
    );
}

#[test]
fn test_scope_from_seeds_dedups_and_skips_invalid() {
    let seeds = vec![
        "https://a.example/1".to_string(),
        "garbage".to_string(),
        "https://a.example/2".to_string(),
    ];
    assert_eq!(scope_from_seeds(&seeds), vec!["a.example"]);
}

// ============================================================================
// Summary Tests
// ============================================================================

#[test]
fn test_summarize() {
    let links = vec![link("magnet:?xt=a", 5), link("magnet:?xt=b", 3), link("magnet:?xt=c", 1)];
    let summary = summarize(&links);
    assert_eq!(summary.distinct_links, 3);
    assert_eq!(summary.total_references, 9);
}

#[test]
fn test_summarize_empty() {
    let summary = summarize(&[]);
    assert_eq!(summary.distinct_links, 0);
    assert_eq!(summary.total_references, 0);
}

// ============================================================================
// Execution Tests
// ============================================================================

#[tokio::test]
async fn test_execute_out_of_scope_crawl_finishes_empty() {
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = messages.clone();

    let options = CrawlOptions {
        seeds: vec!["http://example.org".to_string()],
        domain_scope: vec!["example.com".to_string()],
        channel_capacity: 64,
        ..CrawlOptions::default()
    };

    let links = execute_crawl_until(
        options,
        Some(Arc::new(move |msg: String| sink.lock().unwrap().push(msg))),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(links.is_empty());
    let messages = messages.lock().unwrap();
    assert!(messages.iter().any(|m| m.contains("Crawling 1 seed(s)")));
    assert!(messages.iter().any(|m| m.contains("Found 0 distinct links")));
}

#[tokio::test]
async fn test_execute_rejects_invalid_options() {
    let options = CrawlOptions {
        seeds: vec!["http://example.org".to_string()],
        stages: 0,
        ..CrawlOptions::default()
    };

    let result = execute_crawl_until(options, None, CancellationToken::new()).await;
    assert!(matches!(result, Err(ScanError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_execute_without_seeds_fails() {
    let result =
        execute_crawl_until(CrawlOptions::default(), None, CancellationToken::new()).await;
    assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
}
