use crate::state::LinkRecord;
use crate::storage::DiscoveryStore;
use crate::url::normalize_key;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Index {
    visited: HashSet<String>,
    links: HashMap<String, LinkRecord>,
}

/// `DiscoveryStore` held entirely in memory behind one lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Index>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Index> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of distinct discovered links
    pub fn len(&self) -> usize {
        self.discovered_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiscoveryStore for MemoryStore {
    fn mark_visited_page(&self, url: &str) -> bool {
        self.lock().visited.insert(normalize_key(url))
    }

    fn visited_count(&self) -> usize {
        self.lock().visited.len()
    }

    fn record_discovered_link(&self, mut record: LinkRecord, source_page: &str) {
        let key = normalize_key(&record.url);
        record.url = key.clone();
        if !source_page.is_empty() {
            record.sources.insert(normalize_key(source_page));
        }

        let mut index = self.lock();
        match index.links.get_mut(&key) {
            Some(existing) => existing.merge(record),
            None => {
                index.links.insert(key, record);
            }
        }
    }

    fn discovered_count(&self) -> usize {
        self.lock().links.len()
    }

    fn all_discovered(&self) -> Vec<LinkRecord> {
        let mut links: Vec<LinkRecord> = self.lock().links.values().cloned().collect();
        links.sort_by(|a, b| a.url.cmp(&b.url));
        links
    }
}
