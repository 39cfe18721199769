//! Session-scoped in-memory caches
//!
//! Entries live for the whole session; there is no TTL and no eviction.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use sprout_core::types::{DownloadPoint, PackageRecord};

/// Package records keyed by name
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<String, PackageRecord>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Download series keyed by `"<name>|<days>"`
///
/// Series are copied on insert and on read so callers can never mutate
/// cached state through a returned vector.
#[derive(Debug, Default)]
pub struct DownloadHistoryCache {
    entries: RwLock<HashMap<String, Vec<DownloadPoint>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total number of entries
    pub total_entries: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
}

/// Both caches of one session, shared by the aggregators
#[derive(Debug, Default)]
pub struct SessionCache {
    pub metadata: MetadataCache,
    pub history: DownloadHistoryCache,
}

impl SessionCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Drop every entry of both caches
    pub fn clear(&self) {
        self.metadata.clear();
        self.history.clear();
    }
}

fn record_lookup<T>(found: Option<T>, hits: &AtomicU64, misses: &AtomicU64) -> Option<T> {
    match found {
        Some(value) => {
            hits.fetch_add(1, Ordering::Relaxed);
            Some(value)
        }
        None => {
            misses.fetch_add(1, Ordering::Relaxed);
            None
        }
    }
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the cached record
    pub fn get(&self, name: &str) -> Option<PackageRecord> {
        let found = self.entries.read().get(name).cloned();
        record_lookup(found, &self.hits, &self.misses)
    }

    /// Store a record, replacing any earlier one
    pub fn insert(&self, name: impl Into<String>, record: PackageRecord) {
        self.entries.write().insert(name.into(), record);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl DownloadHistoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key of a package and window length
    pub fn key(name: &str, days: i64) -> String {
        format!("{}|{}", name, days)
    }

    /// Get a copy of the cached series
    pub fn get(&self, key: &str) -> Option<Vec<DownloadPoint>> {
        let found = self.entries.read().get(key).map(|series| series.to_vec());
        record_lookup(found, &self.hits, &self.misses)
    }

    /// Store a copy of `series`
    pub fn insert(&self, key: impl Into<String>, series: &[DownloadPoint]) {
        self.entries.write().insert(key.into(), series.to_vec());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
