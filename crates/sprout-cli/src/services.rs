//! Long-lived components shared by every command and the interactive session

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use sprout_config::{find_package_json, scan_dependencies, Settings};
use sprout_core::error::SproutResult;
use sprout_core::types::{ManifestDependencySet, SearchResult};
use sprout_registry::{
    Aggregator, Endpoints, HistoryAggregator, ReadmeResolver, RegistryClient, RetryConfig, SessionCache,
};

use crate::installer::Installer;

/// The application root: one client, one session cache, one installer
pub struct Services {
    pub settings: Settings,
    pub aggregator: Aggregator,
    pub history: HistoryAggregator,
    pub readme: ReadmeResolver,
    pub installer: Installer,
}

/// Declared dependencies of the nearest manifest, enriched
#[derive(Debug, Clone)]
pub struct ProjectListing {
    pub manifest_path: PathBuf,
    pub dependencies: ManifestDependencySet,
    pub result: SearchResult,
}

impl Services {
    pub fn from_settings(settings: Settings) -> SproutResult<Arc<Self>> {
        let registry = &settings.registry;
        let endpoints = Endpoints {
            search: registry.search_url.clone(),
            registry: registry.registry_url.clone(),
            downloads: registry.downloads_url.clone(),
        };
        let client = Arc::new(RegistryClient::with_config(
            endpoints,
            registry.request_timeout(),
            RetryConfig::default(),
        )?);
        let cache = SessionCache::new();

        let aggregator = Aggregator::new(Arc::clone(&client), Arc::clone(&cache), registry.concurrency);
        let history = HistoryAggregator::new(Arc::clone(&client), Arc::clone(&cache));
        let readme = ReadmeResolver::new(Arc::clone(&client), registry.raw_content_url.clone())
            .with_timeouts(settings.readme.timeout(), settings.readme.probe_timeout());
        let installer = Installer::new(settings.command_table()?, settings.install.timeout());

        Ok(Arc::new(Self {
            settings,
            aggregator,
            history,
            readme,
            installer,
        }))
    }

    pub fn page_size(&self) -> u32 {
        self.settings.registry.page_size
    }

    pub fn window_days(&self) -> i64 {
        self.settings.history.window_days
    }

    /// Enrich the dependencies of the manifest nearest to `start`
    pub async fn project_listing(&self, start: &Path) -> SproutResult<Option<ProjectListing>> {
        let (path, dependencies) = scan_dependencies(start).await?;
        let Some(manifest_path) = path else {
            return Ok(None);
        };

        let names = dependencies.names();
        let packages = self.aggregator.enrich(&names).await;
        info!("loaded {} project dependencies", packages.len());

        Ok(Some(ProjectListing {
            manifest_path,
            dependencies,
            result: SearchResult::from_records(packages),
        }))
    }
}

/// Directory package managers run in: the manifest's, or `cwd` without one
pub fn project_dir(cwd: &Path) -> PathBuf {
    find_package_json(cwd)
        .and_then(|path| path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| cwd.to_path_buf())
}
