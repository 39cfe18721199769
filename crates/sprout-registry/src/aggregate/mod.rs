//! Bounded-concurrency enrichment of package names into full records
//!
//! Each name resolves to one [`PackageRecord`] built from the weekly
//! downloads and latest-version endpoints. Resolution goes through the
//! session's [`MetadataCache`](crate::cache::MetadataCache), so a name is
//! fetched at most once per session, even when the fetch failed.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use sprout_core::types::{PackageRecord, SearchResult};

use crate::api::LatestMetadata;
use crate::cache::SessionCache;
use crate::client::RegistryClient;
use crate::RegistryResult;

/// Default ceiling on in-flight enrichment tasks
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Resolves names into records, at most `concurrency` at a time
///
/// The ceiling is shared by every batch running on the same aggregator.
#[derive(Debug, Clone)]
pub struct Aggregator {
    client: Arc<RegistryClient>,
    cache: Arc<SessionCache>,
    permits: Arc<Semaphore>,
}

impl Aggregator {
    pub fn new(client: Arc<RegistryClient>, cache: Arc<SessionCache>, concurrency: usize) -> Self {
        Self {
            client,
            cache,
            permits: Arc::new(Semaphore::new(concurrency.clamp(1, Semaphore::MAX_PERMITS))),
        }
    }

    pub fn client(&self) -> &Arc<RegistryClient> {
        &self.client
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Resolve every name, keeping input order.
    ///
    /// Never fails: a name whose fetches fail yields a record with empty
    /// augmented fields and zero downloads.
    pub async fn enrich(&self, names: &[String]) -> Vec<PackageRecord> {
        let mut resolved: Vec<Option<PackageRecord>> = vec![None; names.len()];
        let mut tasks = JoinSet::new();

        for (index, name) in names.iter().enumerate() {
            if let Some(hit) = self.cache.metadata.get(name) {
                resolved[index] = Some(hit);
                continue;
            }

            let client = Arc::clone(&self.client);
            let cache = Arc::clone(&self.cache);
            let permits = Arc::clone(&self.permits);
            let name = name.clone();
            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                let record = fetch_record(&client, &name).await;
                cache.metadata.insert(name, record.clone());
                (index, record)
            });
        }

        let spawned = tasks.len();
        if spawned > 0 {
            debug!("enriching {} of {} packages", spawned, names.len());
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, record)) => resolved[index] = Some(record),
                Err(e) => warn!("enrichment task failed: {}", e),
            }
        }

        resolved
            .into_iter()
            .zip(names)
            .map(|(record, name)| record.unwrap_or_else(|| PackageRecord::named(name.as_str())))
            .collect()
    }

    /// Fill the augmented fields of a search result.
    ///
    /// Search records keep their own name, version, description and links;
    /// license, author and downloads come from the resolved record. An
    /// author that is still empty falls back to the publisher username.
    pub async fn augment(&self, mut result: SearchResult) -> SearchResult {
        let names = result.names();
        let resolved = self.enrich(&names).await;

        for (record, enriched) in result.packages.iter_mut().zip(&resolved) {
            record.absorb_augmentation(enriched);
            if record.author.is_empty() && !record.publisher.is_empty() {
                record.author = record.publisher.clone();
            }
        }
        result
    }

    /// Search the registry and augment the hits
    pub async fn search(&self, query: &str, page_size: u32) -> RegistryResult<SearchResult> {
        let result = self.client.search(query, page_size).await?;
        info!("search '{}' returned {} packages", query.trim(), result.len());
        Ok(self.augment(result).await)
    }

    /// Resolve a single name through the cache
    pub async fn resolve(&self, name: &str) -> PackageRecord {
        let names = [name.to_string()];
        self.enrich(&names).await.pop().unwrap_or_else(|| PackageRecord::named(name))
    }
}

/// Fetch downloads and latest metadata for one name, degrading each to empty
async fn fetch_record(client: &RegistryClient, name: &str) -> PackageRecord {
    let (downloads, latest) = tokio::join!(client.downloads_last_week(name), client.latest_metadata(name));

    let metadata = latest.unwrap_or_else(|e| {
        debug!("latest metadata for {} unavailable: {}", name, e);
        LatestMetadata::default()
    });
    metadata.into_record(name, downloads)
}

#[cfg(test)]
mod tests;
