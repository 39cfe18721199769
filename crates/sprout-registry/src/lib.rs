//! npm registry, downloads and README client for Sprout
//!
//! This crate fetches search results and package metadata from the npm
//! registry, enriches them with weekly downloads under a concurrency
//! ceiling, aggregates download history into weekly trends and resolves
//! READMEs from GitHub. Everything it fetches is cached for the session.

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod client;
pub mod history;
pub mod readme;

// Re-export main types
pub use aggregate::Aggregator;
pub use api::{LatestMetadata, Loose, SearchResponse};
pub use cache::{CacheStats, DownloadHistoryCache, MetadataCache, SessionCache};
pub use client::{Endpoints, RegistryClient, RetryConfig};
pub use history::{bucket_weekly, HistoryAggregator};
pub use readme::{parse_github_repo, GithubRepo, Readme, ReadmeResolver, RequestSequence};

use sprout_core::error::SproutError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, SproutError>;
