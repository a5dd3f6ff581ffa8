// src/crawl/visited.rs
// =============================================================================
// The set of URLs the crawl has claimed.
//
// It only ever grows. Every traversal branch holds a clone of the same handle,
// and the only way in is claim(), which checks and inserts under one lock, so
// two branches can never both decide to fetch the same page.
//
// Rust concepts:
// - Arc<Mutex<T>>: shared ownership + exclusive access from many futures
// - PoisonError::into_inner: a panic elsewhere must not lose the set
// =============================================================================

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    inner: Arc<Mutex<HashSet<Url>>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<Url>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts the URL and reports whether this call was the one that added it
    pub fn claim(&self, url: &Url) -> bool {
        let mut set = self.lock();
        if set.contains(url) {
            return false;
        }
        set.insert(url.clone())
    }

    pub fn contains(&self, url: &Url) -> bool {
        self.lock().contains(url)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Every claimed URL, sorted so callers get a stable order
    pub fn sorted(&self) -> Vec<Url> {
        let mut urls: Vec<Url> = self.lock().iter().cloned().collect();
        urls.sort();
        urls
    }
}

impl FromIterator<Url> for VisitedSet {
    fn from_iter<I: IntoIterator<Item = Url>>(iter: I) -> Self {
        let set = VisitedSet::new();
        for url in iter {
            set.claim(&url);
        }
        set
    }
}
