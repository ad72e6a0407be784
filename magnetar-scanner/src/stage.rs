use crate::crawler::ProgressCallback;
use crate::error::Result;
use crate::extract::LinkExtractor;
use crate::resolver::{host_with_port, is_http, resolve};
use crate::result::{LinkSighting, Target};
use crate::visited::VisitedSet;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

/// Read-only policy shared by every stage of a crawl.
#[derive(Debug, Clone)]
pub struct StagePolicy {
    /// Empty means unrestricted.
    pub domain_scope: Vec<String>,
    pub max_distance: usize,
    pub target_scheme: String,
}

impl StagePolicy {
    /// A host is in scope when some scope entry contains it as a substring.
    /// `sub.example.com` is therefore *not* in scope for `example.com`.
    pub fn in_scope(&self, url: &Url) -> bool {
        if self.domain_scope.is_empty() {
            return true;
        }
        let host = host_with_port(url);
        self.domain_scope.iter().any(|domain| domain.contains(&host))
    }

    /// Parsed schemes are always lowercase; the configured one may not be.
    pub fn is_target_link(&self, url: &Url) -> bool {
        url.scheme().eq_ignore_ascii_case(&self.target_scheme)
    }
}

/// Everything a stage shares with its siblings.
pub struct StageContext {
    pub client: Client,
    pub policy: StagePolicy,
    pub extractor: Arc<dyn LinkExtractor>,
    pub visited: VisitedSet,
    pub results: mpsc::Sender<LinkSighting>,
    pub shutdown: CancellationToken,
    pub progress: Option<ProgressCallback>,
}

/// One link of the relay chain: consumes targets from `inbound`, forwards
/// survivors to `outbound`, reports magnet sightings on the shared results
/// channel.
pub struct Stage {
    index: usize,
    context: Arc<StageContext>,
    inbound: mpsc::Receiver<Target>,
    outbound: mpsc::Sender<Target>,
}

impl Stage {
    pub fn new(
        index: usize,
        context: Arc<StageContext>,
        inbound: mpsc::Receiver<Target>,
        outbound: mpsc::Sender<Target>,
    ) -> Self {
        Self {
            index,
            context,
            inbound,
            outbound,
        }
    }

    /// Run until the inbound channel is closed and drained, or shutdown is
    /// requested. Dropping `self` closes the outbound channel, which is what
    /// stops the next stage.
    pub async fn run(mut self) {
        debug!("Stage {} started", self.index);

        loop {
            let target = tokio::select! {
                biased;
                _ = self.context.shutdown.cancelled() => break,
                next = self.inbound.recv() => match next {
                    Some(target) => target,
                    None => break,
                },
            };

            self.process(target).await;
        }

        debug!("Stage {} finished", self.index);
    }

    async fn process(&self, target: Target) {
        let policy = &self.context.policy;

        let next_distance = target.distance + 1;
        if next_distance > policy.max_distance {
            debug!(stage = self.index, url = %target.url, distance = target.distance, "distance exhausted");
            return;
        }

        if !policy.in_scope(&target.url) {
            debug!(stage = self.index, url = %target.url, "out of scope");
            return;
        }

        if !is_http(&target.url) {
            debug!(stage = self.index, url = %target.url, "not an http(s) target");
            return;
        }

        if let Some(ref callback) = self.context.progress {
            callback(self.index, target.url.to_string());
        }

        let body = match self.fetch(&target.url).await {
            Ok(body) => body,
            Err(e) => {
                debug!(stage = self.index, url = %target.url, "fetch failed: {}", e);
                return;
            }
        };

        let links: Vec<Url> = self
            .context
            .extractor
            .extract(&body)
            .iter()
            .filter_map(|href| resolve(href, &target.url))
            .collect();

        self.scan(&target.url, &links, next_distance).await;
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        debug!("Fetching {}", url);
        let response = self.context.client.get(url.clone()).send().await?;
        Ok(response.text().await?)
    }

    /// Classify one page's links under a single hold of the visited lock.
    async fn scan(&self, origin: &Url, links: &[Url], next_distance: usize) {
        let context = &self.context;
        let mut visited = context.visited.lock().await;

        // A page carrying a magnet link restarts the distance budget for
        // everything it links to.
        let mut forward_distance = next_distance;
        for link in links.iter().filter(|l| context.policy.is_target_link(l)) {
            let sighting = LinkSighting {
                link: link.clone(),
                origin: origin.clone(),
            };
            if context.results.send(sighting).await.is_err() {
                debug!(stage = self.index, "results channel closed");
            }
            forward_distance = 0;
        }

        for link in links.iter().filter(|l| is_http(l)) {
            if !visited.try_mark(link.as_str(), forward_distance) {
                continue;
            }

            match self
                .outbound
                .try_send(Target::new(link.clone(), forward_distance))
            {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    debug!(stage = self.index, url = %dropped.url, "outbound full, dropping");
                }
                Err(TrySendError::Closed(_)) => {}
            }
        }
    }
}
