use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Crawl-wide record of every URL handed to a stage, keyed by its
/// absolute string, with the distance it was first seen at.
///
/// Entries are never removed or updated. Cloning shares the same map.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    inner: Arc<Mutex<HashMap<String, usize>>>,
}

/// Exclusive access to the visited map for the duration of one page scan.
pub struct VisitedGuard<'a> {
    map: MutexGuard<'a, HashMap<String, usize>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> VisitedGuard<'_> {
        VisitedGuard {
            map: self.inner.lock().await,
        }
    }

    /// Lock, mark a single URL, unlock.
    pub async fn try_mark(&self, url: &str, distance: usize) -> bool {
        self.lock().await.try_mark(url, distance)
    }

    pub async fn distance_of(&self, url: &str) -> Option<usize> {
        self.inner.lock().await.get(url).copied()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl VisitedGuard<'_> {
    /// Insert `url` at `distance` unless already present; first writer wins.
    pub fn try_mark(&mut self, url: &str, distance: usize) -> bool {
        if self.map.contains_key(url) {
            return false;
        }
        self.map.insert(url.to_string(), distance);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.map.contains_key(url)
    }
}
