use indicatif::{ProgressBar, ProgressStyle};
use magnetar_scanner::crawler::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_DISPLAY_PARAM, DEFAULT_MAX_DISTANCE, DEFAULT_STAGES,
    DEFAULT_TARGET_SCHEME, DEFAULT_TIMEOUT_SECS,
};
use magnetar_scanner::resolver::host_with_port;
use magnetar_scanner::{Crawler, DiscoveredLink, DiscoveryCallback, ProgressCallback, ScanError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;

/// Options for configuring a crawl operation
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    pub seeds: Vec<String>,
    /// Empty means unrestricted
    pub domain_scope: Vec<String>,
    pub max_distance: usize,
    pub stages: usize,
    pub channel_capacity: usize,
    pub timeout_secs: u64,
    pub verify_tls: bool,
    pub target_scheme: String,
    pub display_param: String,
    pub show_progress_bars: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            domain_scope: Vec::new(),
            max_distance: DEFAULT_MAX_DISTANCE,
            stages: DEFAULT_STAGES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_tls: false,
            target_scheme: DEFAULT_TARGET_SCHEME.to_string(),
            display_param: DEFAULT_DISPLAY_PARAM.to_string(),
            show_progress_bars: false,
        }
    }
}

impl CrawlOptions {
    pub fn crawler(&self) -> Crawler {
        Crawler::new()
            .with_max_distance(self.max_distance)
            .with_stages(self.stages)
            .with_channel_capacity(self.channel_capacity)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_insecure_tls(!self.verify_tls)
            .with_domain_scope(self.domain_scope.clone())
            .with_target_scheme(self.target_scheme.clone())
            .with_display_param(self.display_param.clone())
    }
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Totals across a ranked link list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSummary {
    pub distinct_links: usize,
    pub total_references: usize,
}

pub fn summarize(links: &[DiscoveredLink]) -> CrawlSummary {
    CrawlSummary {
        distinct_links: links.len(),
        total_references: links.iter().map(|l| l.reference_count).sum(),
    }
}

/// Hosts of the seeds, for scoping a crawl to the sites it started on.
pub fn scope_from_seeds(seeds: &[String]) -> Vec<String> {
    let mut hosts: Vec<String> = Vec::new();
    for url in seeds.iter().filter_map(|seed| Url::parse(seed.trim()).ok()) {
        let host = host_with_port(&url);
        if !host.is_empty() && !hosts.contains(&host) {
            hosts.push(host);
        }
    }
    hosts
}

/// Execute a crawl with the given options. Runs until the work is exhausted
/// or the process is asked to shut down; both return the links found.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<Vec<DiscoveredLink>, ScanError> {
    run(options, progress_callback, None).await
}

/// Like [`execute_crawl`], but stops when `shutdown` is cancelled instead of
/// listening for process signals.
pub async fn execute_crawl_until(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    shutdown: CancellationToken,
) -> Result<Vec<DiscoveredLink>, ScanError> {
    run(options, progress_callback, Some(shutdown)).await
}

async fn run(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    shutdown: Option<CancellationToken>,
) -> Result<Vec<DiscoveredLink>, ScanError> {
    let progress_bar = if options.show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let pages = Arc::new(AtomicUsize::new(0));
    let links = Arc::new(AtomicUsize::new(0));

    let page_progress: ProgressCallback = {
        let pb = progress_bar.clone();
        let pages = pages.clone();
        let links = links.clone();
        Arc::new(move |_stage: usize, _url: String| {
            let fetched = pages.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref pb) = pb {
                pb.set_message(format!(
                    "Crawling... {} pages fetched, {} magnet links",
                    fetched,
                    links.load(Ordering::Relaxed)
                ));
            }
        })
    };

    let link_progress: DiscoveryCallback = {
        let pb = progress_bar.clone();
        let pages = pages.clone();
        let links = links.clone();
        Arc::new(move |distinct: usize| {
            links.store(distinct, Ordering::Relaxed);
            if let Some(ref pb) = pb {
                pb.set_message(format!(
                    "Crawling... {} pages fetched, {} magnet links",
                    pages.load(Ordering::Relaxed),
                    distinct
                ));
            }
        })
    };

    info!(
        "Crawl options: max distance {}, stages {}, timeout {}s, scope {:?}",
        options.max_distance, options.stages, options.timeout_secs, options.domain_scope
    );

    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Crawling {} seed(s) across {} stages",
            options.seeds.len(),
            options.stages
        ));
    }

    let crawler = options
        .crawler()
        .with_progress_callback(page_progress)
        .with_discovery_callback(link_progress);

    let result = match shutdown {
        Some(token) => crawler.crawl_with_shutdown(&options.seeds, token).await,
        None => crawler.crawl(&options.seeds).await,
    };

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Crawl finished! {} pages fetched, {} magnet links",
            pages.load(Ordering::Relaxed),
            links.load(Ordering::Relaxed)
        ));
    }

    if let (Ok(found), Some(callback)) = (&result, &progress_callback) {
        let summary = summarize(found);
        callback(format!(
            "Found {} distinct links ({} references)",
            summary.distinct_links, summary.total_references
        ));
    }

    result
}
