//! Client settings: defaults, config file, environment and CLI layering

use std::collections::HashMap;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use sprout_core::error::SproutError;
use tracing::debug;
use url::Url;

use crate::package_manager::{CommandOverride, CommandTable};
use crate::ConfigResult;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "SPROUT_";

/// Upper bound on concurrent enrichment tasks
pub const MAX_CONCURRENCY: usize = 64;

/// Longest trend window, the npm downloads range limit of 18 months
pub const MAX_WINDOW_DAYS: i64 = 548;

/// Complete settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub registry: RegistrySettings,
    pub readme: ReadmeSettings,
    pub history: HistorySettings,
    pub install: InstallSettings,

    /// Per-manager command overrides keyed by manager name
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub package_managers: HashMap<String, CommandOverride>,
}

/// Endpoints and request limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    pub search_url: String,
    pub registry_url: String,
    pub downloads_url: String,
    pub raw_content_url: String,
    pub request_timeout_secs: u64,
    pub page_size: u32,
    /// Ceiling on concurrent enrichment tasks
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadmeSettings {
    /// Overall deadline of one README resolution
    pub timeout_secs: u64,
    /// Timeout of a single probe
    pub probe_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    pub window_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallSettings {
    pub timeout_secs: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            search_url: "https://registry.npmjs.org/-/v1/search".to_string(),
            registry_url: "https://registry.npmjs.org".to_string(),
            downloads_url: "https://api.npmjs.org".to_string(),
            raw_content_url: "https://raw.githubusercontent.com".to_string(),
            request_timeout_secs: 8,
            page_size: 10,
            concurrency: 5,
        }
    }
}

impl Default for ReadmeSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            probe_timeout_secs: 3,
        }
    }
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { window_days: 90 }
    }
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

impl RegistrySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ReadmeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl InstallSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Parse settings from TOML
pub fn parse_settings(content: &str, file: &str) -> ConfigResult<Settings> {
    let settings: Settings = toml::from_str(content).map_err(|e| SproutError::TomlParse {
        file: file.to_string(),
        message: e.to_string(),
    })?;
    settings.validate()?;
    Ok(settings)
}

fn invalid(field: &str, reason: impl Into<String>) -> SproutError {
    SproutError::ConfigValidation {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn validate_url(field: &str, value: &str) -> ConfigResult<()> {
    let url = Url::parse(value).map_err(|e| invalid(field, format!("'{}' is not a URL: {}", value, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(field, format!("unsupported scheme '{}'", other))),
    }
}

fn parse_number<T: std::str::FromStr>(field: &str, value: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| invalid(field, format!("'{}' is not a number: {}", value, e)))
}

impl Settings {
    /// Check ranges and URLs
    pub fn validate(&self) -> ConfigResult<()> {
        let r = &self.registry;
        validate_url("registry.search_url", &r.search_url)?;
        validate_url("registry.registry_url", &r.registry_url)?;
        validate_url("registry.downloads_url", &r.downloads_url)?;
        validate_url("registry.raw_content_url", &r.raw_content_url)?;

        if r.request_timeout_secs == 0 {
            return Err(invalid("registry.request_timeout_secs", "must be at least 1"));
        }
        if r.page_size == 0 {
            return Err(invalid("registry.page_size", "must be at least 1"));
        }
        if !(1..=MAX_CONCURRENCY).contains(&r.concurrency) {
            return Err(invalid(
                "registry.concurrency",
                format!("must be between 1 and {}", MAX_CONCURRENCY),
            ));
        }
        if !(1..=MAX_WINDOW_DAYS).contains(&self.history.window_days) {
            return Err(invalid(
                "history.window_days",
                format!("must be between 1 and {}", MAX_WINDOW_DAYS),
            ));
        }
        if self.readme.timeout_secs == 0 || self.readme.probe_timeout_secs == 0 {
            return Err(invalid("readme", "timeouts must be at least 1 second"));
        }
        if self.install.timeout_secs == 0 {
            return Err(invalid("install.timeout_secs", "must be at least 1"));
        }

        // Surfaces unknown manager names
        self.command_table()?;
        Ok(())
    }

    /// Command table with this file's overrides applied
    pub fn command_table(&self) -> ConfigResult<CommandTable> {
        CommandTable::with_overrides(&self.package_managers)
    }

    /// Apply `SPROUT_*` environment overrides
    pub fn apply_env_overrides(&mut self, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "SEARCH_URL" => self.registry.search_url = value.clone(),
                "REGISTRY_URL" => self.registry.registry_url = value.clone(),
                "DOWNLOADS_URL" => self.registry.downloads_url = value.clone(),
                "RAW_CONTENT_URL" => self.registry.raw_content_url = value.clone(),
                "REQUEST_TIMEOUT" => self.registry.request_timeout_secs = parse_number(key, value)?,
                "PAGE_SIZE" => self.registry.page_size = parse_number(key, value)?,
                "CONCURRENCY" => self.registry.concurrency = parse_number(key, value)?,
                "README_TIMEOUT" => self.readme.timeout_secs = parse_number(key, value)?,
                "HISTORY_DAYS" => self.history.window_days = parse_number(key, value)?,
                "INSTALL_TIMEOUT" => self.install.timeout_secs = parse_number(key, value)?,
                _ => {
                    // Unknown variable, ignore
                }
            }
        }
        Ok(())
    }

    /// Apply CLI flag overrides (highest priority)
    pub fn apply_cli_overrides(&mut self, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "concurrency" => self.registry.concurrency = parse_number(key, value)?,
                "page_size" => self.registry.page_size = parse_number(key, value)?,
                "window_days" => self.history.window_days = parse_number(key, value)?,
                _ => {
                    debug!("ignoring unknown override '{}'", key);
                }
            }
        }
        Ok(())
    }
}

/// Builds [`Settings`] from defaults, the settings file, env and CLI flags
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    /// Explicit settings file, replaces the default location
    config_path: Option<Utf8PathBuf>,
    env_overrides: HashMap<String, String>,
    cli_overrides: HashMap<String, String>,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_path(mut self, path: Option<Utf8PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn with_env(mut self, overrides: HashMap<String, String>) -> Self {
        self.env_overrides = overrides;
        self
    }

    pub fn with_cli_override(mut self, key: &str, value: impl ToString) -> Self {
        self.cli_overrides.insert(key.to_string(), value.to_string());
        self
    }

    /// Default settings file location, `~/.sprout/config.toml`
    pub fn default_config_path() -> ConfigResult<Utf8PathBuf> {
        let home_dir = dirs::home_dir().ok_or_else(|| invalid("home_dir", "Could not determine home directory"))?;

        let home = Utf8PathBuf::try_from(home_dir)
            .map_err(|e| invalid("home_dir", format!("Invalid home directory path: {}", e)))?;
        Ok(home.join(".sprout").join("config.toml"))
    }

    /// Collect `SPROUT_*` variables from the process environment
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX)).collect()
    }

    /// Read the settings file, if there is one
    async fn load_file(&self) -> ConfigResult<Option<Settings>> {
        let (path, explicit) = match &self.config_path {
            Some(path) => (path.clone(), true),
            None => match Self::default_config_path() {
                Ok(path) => (path, false),
                Err(e) => {
                    debug!("no default settings location: {}", e);
                    return Ok(None);
                }
            },
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                debug!("loading settings from {}", path);
                parse_settings(&content, path.as_str()).map(Some)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !explicit => Ok(None),
            Err(e) => Err(SproutError::io(format!("Failed to read {}", path), e)),
        }
    }

    /// Merge all layers and validate the result
    pub async fn load(&self) -> ConfigResult<Settings> {
        let mut settings = self.load_file().await?.unwrap_or_default();
        settings.apply_env_overrides(&self.env_overrides)?;
        settings.apply_cli_overrides(&self.cli_overrides)?;
        settings.validate()?;
        Ok(settings)
    }
}
