//! npm registry and downloads API response types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sprout_core::types::{DayDownloads, PackageRecord};

/// Search response from `/-/v1/search`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub objects: Vec<SearchObject>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub time: String,
}

/// One hit of a search response
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchObject {
    pub package: SearchPackage,
    #[serde(default)]
    pub score: Option<SearchScore>,
    #[serde(default, rename = "searchScore")]
    pub search_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchPackage {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub links: SearchLinks,
    #[serde(default)]
    pub publisher: Publisher,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchLinks {
    #[serde(default)]
    pub npm: String,
    #[serde(default)]
    pub homepage: String,
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub bugs: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Publisher {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchScore {
    #[serde(default)]
    pub r#final: f64,
}

/// A field that is either a plain string or an object carrying the string
///
/// npm metadata is loose: `license` can be `"MIT"` or `{"type": "MIT"}`,
/// `author` a string or `{"name": ...}`, `repository` a string or
/// `{"url": ...}`. Anything else normalizes to an empty string.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Loose<T> {
    Plain(String),
    Structured(T),
    Other(serde_json::Value),
}

/// Types that carry the string value of a [`Loose`] field
pub trait LooseValue {
    fn value(&self) -> Option<&str>;
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LicenseObject {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PersonObject {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RepositoryObject {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl LooseValue for LicenseObject {
    fn value(&self) -> Option<&str> {
        self.kind.as_deref()
    }
}

impl LooseValue for PersonObject {
    fn value(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl LooseValue for RepositoryObject {
    fn value(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl<T: LooseValue> Loose<T> {
    pub fn normalize(&self) -> String {
        match self {
            Loose::Plain(s) => s.clone(),
            Loose::Structured(obj) => obj.value().unwrap_or_default().to_string(),
            Loose::Other(_) => String::new(),
        }
    }
}

fn normalize_opt<T: LooseValue>(field: &Option<Loose<T>>) -> String {
    field.as_ref().map(Loose::normalize).unwrap_or_default()
}

/// Response of `/<name>/latest`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LatestManifest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub license: Option<Loose<LicenseObject>>,
    #[serde(default)]
    pub author: Option<Loose<PersonObject>>,
    #[serde(default)]
    pub homepage: Option<String>,
    #[serde(default)]
    pub repository: Option<Loose<RepositoryObject>>,
}

/// Normalized latest-version metadata; every missing field is empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestMetadata {
    pub version: String,
    pub description: String,
    pub license: String,
    pub author: String,
    pub homepage: String,
    pub repository: String,
}

impl From<LatestManifest> for LatestMetadata {
    fn from(raw: LatestManifest) -> Self {
        Self {
            license: normalize_opt(&raw.license),
            author: normalize_opt(&raw.author),
            repository: normalize_opt(&raw.repository),
            version: raw.version.unwrap_or_default(),
            description: raw.description.unwrap_or_default(),
            homepage: raw.homepage.unwrap_or_default(),
        }
    }
}

/// Response of `/downloads/point/last-week/<name>`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DownloadsPoint {
    #[serde(default)]
    pub downloads: u64,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub package: String,
}

/// Response of `/downloads/range/<start>:<end>/<name>`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DownloadsRange {
    #[serde(default)]
    pub downloads: Vec<DayDownloads>,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub package: String,
}

impl SearchPackage {
    /// Convert to a record; augmented fields start out empty
    pub fn into_record(self) -> PackageRecord {
        let mut record = PackageRecord::named(self.name);
        if !self.links.npm.is_empty() {
            record.npm_url = self.links.npm;
        }
        record.version = self.version;
        record.description = self.description;
        record.homepage = self.links.homepage;
        record.repository = self.links.repository;
        record.publisher = self.publisher.username;
        record.keywords = self.keywords.into_iter().collect::<BTreeSet<_>>();
        record.date = self.date;
        record
    }
}

impl LatestMetadata {
    /// Build a record for `name` from this metadata and a download count
    pub fn into_record(self, name: &str, weekly_downloads: u64) -> PackageRecord {
        let mut record = PackageRecord::named(name);
        record.version = self.version;
        record.description = self.description;
        record.license = self.license;
        record.author = self.author;
        record.homepage = self.homepage;
        record.repository = self.repository;
        record.weekly_downloads = weekly_downloads;
        record
    }
}
