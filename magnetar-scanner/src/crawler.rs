use crate::aggregate::LinkTable;
use crate::error::{Result, ScanError};
use crate::extract::{HtmlLinkExtractor, LinkExtractor};
use crate::result::{DiscoveredLink, LinkSighting, Target};
use crate::signal::cancel_on_signal;
use crate::stage::{Stage, StageContext, StagePolicy};
use crate::visited::VisitedSet;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_MAX_DISTANCE: usize = 3;
pub const DEFAULT_STAGES: usize = 16;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024 * 1024;
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_TARGET_SCHEME: &str = "magnet";
pub const DEFAULT_DISPLAY_PARAM: &str = "dn";

/// Called with (stage index, url) right before a stage fetches a page.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
/// Called with the number of distinct links after every sighting is counted.
pub type DiscoveryCallback = Arc<dyn Fn(usize) + Send + Sync>;

pub fn build_client(timeout: Duration, insecure_tls: bool) -> Result<Client> {
    let client = Client::builder()
        .user_agent(concat!("Magnetar/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .danger_accept_invalid_certs(insecure_tls)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()?;
    Ok(client)
}

/// Relay-chain crawler. Each call to [`Crawler::crawl`] builds a fresh
/// visited set, a chain of `stages` workers, and an aggregation loop.
pub struct Crawler {
    max_distance: usize,
    stages: usize,
    channel_capacity: usize,
    timeout: Duration,
    insecure_tls: bool,
    domain_scope: Vec<String>,
    target_scheme: String,
    display_param: String,
    extractor: Arc<dyn LinkExtractor>,
    progress_callback: Option<ProgressCallback>,
    discovery_callback: Option<DiscoveryCallback>,
}

impl Crawler {
    pub fn new() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            stages: DEFAULT_STAGES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            insecure_tls: true,
            domain_scope: Vec::new(),
            target_scheme: DEFAULT_TARGET_SCHEME.to_string(),
            display_param: DEFAULT_DISPLAY_PARAM.to_string(),
            extractor: Arc::new(HtmlLinkExtractor),
            progress_callback: None,
            discovery_callback: None,
        }
    }

    pub fn with_max_distance(mut self, distance: usize) -> Self {
        self.max_distance = distance;
        self
    }

    /// Number of stages in the relay chain. Independent of the max distance:
    /// a lineage is dropped by whichever stage holds it once its budget runs
    /// out, so stages past `max_distance` only see work below magnet pages.
    pub fn with_stages(mut self, stages: usize) -> Self {
        self.stages = stages;
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Certificate verification is off unless this is set to `false`.
    pub fn with_insecure_tls(mut self, insecure: bool) -> Self {
        self.insecure_tls = insecure;
        self
    }

    pub fn with_domain_scope(mut self, domains: Vec<String>) -> Self {
        self.domain_scope = domains;
        self
    }

    pub fn with_target_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.target_scheme = scheme.into().to_ascii_lowercase();
        self
    }

    pub fn with_display_param(mut self, param: impl Into<String>) -> Self {
        self.display_param = param.into();
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn LinkExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_discovery_callback(mut self, callback: DiscoveryCallback) -> Self {
        self.discovery_callback = Some(callback);
        self
    }

    /// Crawl until the work runs out or the process receives a shutdown
    /// signal, whichever comes first.
    pub async fn crawl(&self, seeds: &[String]) -> Result<Vec<DiscoveredLink>> {
        let shutdown = CancellationToken::new();
        let finished = CancellationToken::new();
        let listener = cancel_on_signal(shutdown.clone(), finished.clone());

        let result = self.crawl_with_shutdown(seeds, shutdown).await;

        finished.cancel();
        if let Err(e) = listener.await {
            warn!("Signal listener failed: {}", e);
        }
        result
    }

    /// Crawl until the work runs out or `shutdown` is cancelled. Either way
    /// the links aggregated so far are returned, ranked by reference count.
    pub async fn crawl_with_shutdown(
        &self,
        seeds: &[String],
        shutdown: CancellationToken,
    ) -> Result<Vec<DiscoveredLink>> {
        self.validate()?;
        let seeds = parse_seeds(seeds)?;
        let client = build_client(self.timeout, self.insecure_tls)?;

        info!(
            "Starting crawl of {} seed(s) with {} stages, max distance {}",
            seeds.len(),
            self.stages,
            self.max_distance
        );

        let visited = VisitedSet::new();
        let (head, mut inbound) = mpsc::channel(self.channel_capacity);
        let (results_tx, mut results) = mpsc::channel(self.stages);

        {
            let mut marks = visited.lock().await;
            for seed in seeds {
                if !marks.try_mark(seed.as_str(), 0) {
                    continue;
                }
                if head.try_send(Target::seed(seed)).is_err() {
                    warn!("Seed channel full, skipping remaining seeds");
                    break;
                }
            }
        }
        // Stage 1 only ever receives seeds; releasing the head lets the
        // chain wind down on its own once the work is exhausted.
        drop(head);

        let context = Arc::new(StageContext {
            client,
            policy: StagePolicy {
                domain_scope: self.domain_scope.clone(),
                max_distance: self.max_distance,
                target_scheme: self.target_scheme.clone(),
            },
            extractor: self.extractor.clone(),
            visited,
            results: results_tx,
            shutdown: shutdown.clone(),
            progress: self.progress_callback.clone(),
        });

        let mut handles = Vec::with_capacity(self.stages + 1);
        for index in 0..self.stages {
            let (outbound, next_inbound) = mpsc::channel(self.channel_capacity);
            let stage = Stage::new(index, context.clone(), inbound, outbound);
            handles.push(tokio::spawn(stage.run()));
            inbound = next_inbound;
        }
        drop(context);

        // The last stage has nobody downstream; discard what it forwards.
        let mut tail = inbound;
        handles.push(tokio::spawn(async move {
            while tail.recv().await.is_some() {}
            debug!("Drain sink finished");
        }));

        let mut table = LinkTable::new(self.display_param.as_str());
        loop {
            tokio::select! {
                sighting = results.recv() => match sighting {
                    Some(sighting) => self.record(&mut table, sighting),
                    None => {
                        info!("All stages finished");
                        break;
                    }
                },
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested, collecting partial results");
                    break;
                }
            }
        }

        // Refuse further sightings but keep whatever is already buffered.
        results.close();
        while let Some(sighting) = results.recv().await {
            self.record(&mut table, sighting);
        }

        for outcome in futures::future::join_all(handles).await {
            if let Err(e) = outcome {
                warn!("Stage task failed: {}", e);
            }
        }

        let links = table.into_ranked();
        info!("Crawl complete. Discovered {} distinct links", links.len());
        Ok(links)
    }

    fn record(&self, table: &mut LinkTable, sighting: LinkSighting) {
        table.record(sighting);
        if let Some(ref callback) = self.discovery_callback {
            callback(table.len());
        }
    }

    fn validate(&self) -> Result<()> {
        if self.stages == 0 {
            return Err(ScanError::InvalidConfig(
                "at least one stage is required".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ScanError::InvalidConfig(
                "channel capacity must be positive".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "request timeout must be positive".to_string(),
            ));
        }
        if self.target_scheme.is_empty() {
            return Err(ScanError::InvalidConfig(
                "target scheme must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Crawler {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_seeds(seeds: &[String]) -> Result<Vec<Url>> {
    let parsed: Vec<Url> = seeds
        .iter()
        .filter_map(|seed| match Url::parse(seed.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Skipping invalid seed '{}': {}", seed, e);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        return Err(ScanError::InvalidUrl("no valid seed URLs".to_string()));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seeds_skips_invalid() {
        let seeds = vec![
            "http://a.example/".to_string(),
            "not a url".to_string(),
            " https://b.example ".to_string(),
        ];
        let parsed = parse_seeds(&seeds).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].as_str(), "https://b.example/");
    }

    #[test]
    fn test_parse_seeds_all_invalid() {
        let result = parse_seeds(&["::".to_string()]);
        assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        assert!(matches!(
            Crawler::new().with_stages(0).validate(),
            Err(ScanError::InvalidConfig(_))
        ));
        assert!(matches!(
            Crawler::new().with_channel_capacity(0).validate(),
            Err(ScanError::InvalidConfig(_))
        ));
        assert!(matches!(
            Crawler::new().with_timeout(Duration::ZERO).validate(),
            Err(ScanError::InvalidConfig(_))
        ));
        assert!(matches!(
            Crawler::new().with_target_scheme("").validate(),
            Err(ScanError::InvalidConfig(_))
        ));
        assert!(Crawler::new().validate().is_ok());
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(Duration::from_secs(5), true).is_ok());
        assert!(build_client(Duration::from_secs(5), false).is_ok());
    }
}
