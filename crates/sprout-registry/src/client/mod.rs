//! HTTP client for the npm search, registry and downloads endpoints

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use sprout_core::error::SproutError;
use sprout_core::types::{DayDownloads, PackageRecord, SearchResult};

use crate::api::{DownloadsPoint, DownloadsRange, LatestManifest, LatestMetadata, SearchResponse};
use crate::RegistryResult;

/// Configuration for exponential backoff retry logic
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
            multiplier: 2.0,
        }
    }
}

/// Base URLs of the services the client talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Full search URL, e.g. `https://registry.npmjs.org/-/v1/search`
    pub search: String,
    /// Registry base, e.g. `https://registry.npmjs.org`
    pub registry: String,
    /// Downloads API base, e.g. `https://api.npmjs.org`
    pub downloads: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search: "https://registry.npmjs.org/-/v1/search".to_string(),
            registry: "https://registry.npmjs.org".to_string(),
            downloads: "https://api.npmjs.org".to_string(),
        }
    }
}

impl Endpoints {
    /// Every endpoint on one base URL, used against mock servers
    pub fn all_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            search: format!("{}/-/v1/search", base),
            registry: base.to_string(),
            downloads: base.to_string(),
        }
    }
}

/// HTTP client for npm metadata
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    /// Underlying HTTP client with connection pooling
    client: Client,
    /// Retry configuration for primary queries
    retry_config: RetryConfig,
    endpoints: Endpoints,
}

fn network(message: String, source: reqwest::Error) -> SproutError {
    SproutError::network(message, source)
}

impl RegistryClient {
    /// Create a client for the public npm endpoints
    pub fn new() -> RegistryResult<Self> {
        Self::with_config(Endpoints::default(), Duration::from_secs(8), RetryConfig::default())
    }

    /// Create a client with custom endpoints, per-request timeout and retries
    pub fn with_config(endpoints: Endpoints, timeout: Duration, retry_config: RetryConfig) -> RegistryResult<Self> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(timeout)
            .gzip(true)
            .user_agent(concat!("sprout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| network(format!("Failed to create HTTP client: {}", e), e))?;

        Ok(Self {
            client,
            retry_config,
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Shared HTTP client, also used for README probes
    pub fn http(&self) -> &Client {
        &self.client
    }

    /// Execute a request with exponential backoff retry logic
    async fn with_retry<F, Fut, T>(&self, operation: F) -> RegistryResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = RegistryResult<T>>,
    {
        let mut delay = self.retry_config.initial_delay;
        let mut last_error = None;

        for attempt in 0..=self.retry_config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(error) => {
                    // Don't retry on final attempt or on a definite answer
                    let final_attempt = attempt == self.retry_config.max_retries;
                    let definite = matches!(error, SproutError::PackageNotFound { .. });
                    if final_attempt || definite {
                        last_error = Some(error);
                        break;
                    }

                    debug!("attempt {} failed, retrying in {:?}: {}", attempt + 1, delay, error);
                    last_error = Some(error);
                    tokio::time::sleep(delay).await;

                    delay = std::cmp::min(
                        Duration::from_millis((delay.as_millis() as f64 * self.retry_config.multiplier) as u64),
                        self.retry_config.max_delay,
                    );
                }
            }
        }

        Err(last_error.unwrap_or_else(|| SproutError::Network {
            message: "Retry operation failed without error".to_string(),
            source: None,
        }))
    }

    /// GET a JSON document, mapping 404 to `PackageNotFound`
    async fn get_json<T: DeserializeOwned>(&self, url: &str, name: &str) -> RegistryResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network(format!("Request to {} failed: {}", url, e), e))?;

        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|e| network(format!("Failed to decode response from {}: {}", url, e), e)),
            StatusCode::NOT_FOUND => Err(SproutError::PackageNotFound { name: name.to_string() }),
            status => Err(SproutError::Network {
                message: format!("{} returned status {}", url, status),
                source: None,
            }),
        }
    }

    /// Search the registry; a blank query returns an empty result without a request
    pub async fn search(&self, query: &str, page_size: u32) -> RegistryResult<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(SearchResult::default());
        }

        let size = page_size.to_string();
        let response: SearchResponse = self
            .with_retry(|| async {
                let response = self
                    .client
                    .get(&self.endpoints.search)
                    .query(&[("text", query), ("size", size.as_str())])
                    .send()
                    .await
                    .map_err(|e| network(format!("Search request failed: {}", e), e))?;

                if !response.status().is_success() {
                    return Err(SproutError::Network {
                        message: format!("Search returned status {}", response.status()),
                        source: None,
                    });
                }

                response
                    .json::<SearchResponse>()
                    .await
                    .map_err(|e| network(format!("Failed to decode search response: {}", e), e))
            })
            .await
            .map_err(|e| {
                warn!("search for '{}' failed: {}", query, e);
                e
            })?;

        let packages: Vec<PackageRecord> = response
            .objects
            .into_iter()
            .map(|object| object.package.into_record())
            .collect();

        Ok(SearchResult {
            packages,
            total: response.total,
            time: response.time,
        })
    }

    /// Weekly download count, zero on any failure
    pub async fn downloads_last_week(&self, name: &str) -> u64 {
        let url = format!(
            "{}/downloads/point/last-week/{}",
            self.endpoints.downloads,
            encode_package_name(name)
        );
        match self.get_json::<DownloadsPoint>(&url, name).await {
            Ok(point) => point.downloads,
            Err(e) => {
                debug!("weekly downloads for {} unavailable: {}", name, e);
                0
            }
        }
    }

    /// Metadata of the latest published version
    pub async fn latest_metadata(&self, name: &str) -> RegistryResult<LatestMetadata> {
        let url = format!("{}/{}/latest", self.endpoints.registry, encode_package_name(name));
        let raw: LatestManifest = self.get_json(&url, name).await?;
        Ok(LatestMetadata::from(raw))
    }

    /// Daily downloads for the inclusive window `start..=end`
    pub async fn downloads_range(
        &self,
        name: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RegistryResult<Vec<DayDownloads>> {
        let url = format!(
            "{}/downloads/range/{}:{}/{}",
            self.endpoints.downloads,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
            encode_package_name(name)
        );

        let range: DownloadsRange = self.with_retry(|| self.get_json(&url, name)).await?;
        Ok(range.downloads)
    }

    /// Body of a plain GET, `Some` only for a 200 with a non-empty body
    pub async fn fetch_text(&self, url: &str, timeout: Duration) -> RegistryResult<Option<String>> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| network(format!("Request to {} failed: {}", url, e), e))?;

        if response.status() != StatusCode::OK {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| network(format!("Failed to read body of {}: {}", url, e), e))?;

        Ok(if body.is_empty() { None } else { Some(body) })
    }
}

/// Encode a package name for a URL path (`@scope/name` -> `@scope%2fname`)
pub fn encode_package_name(name: &str) -> String {
    if name.starts_with('@') {
        name.replace('/', "%2f")
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests;
