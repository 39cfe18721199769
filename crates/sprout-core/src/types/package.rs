//! Package record types.
//!
//! A [`PackageRecord`] is the display-relevant view of one npm package. The
//! weekly download count, license and author are augmented fields: they are
//! never part of a raw search payload and are filled in by the aggregator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Base URL of the public package pages on npmjs.com
pub const NPM_PACKAGE_PAGE: &str = "https://www.npmjs.com/package/";

/// One package's display-relevant metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    /// Version string as published, not necessarily normalized
    pub version: String,
    pub description: String,
    /// Empty when unknown
    pub license: String,
    /// Empty when unknown
    pub author: String,
    /// Publisher username from the search payload, empty for listings
    pub publisher: String,
    pub homepage: String,
    /// Raw repository URL, possibly an SSH or shorthand form
    pub repository: String,
    pub npm_url: String,
    /// Zero when the download count could not be fetched
    pub weekly_downloads: u64,
    pub keywords: BTreeSet<String>,
    /// Publication date reported by the search endpoint
    pub date: String,
}

/// Ordered search or listing result
///
/// The order of `packages` is significant: it is either the registry's
/// relevance ranking or the manifest declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub packages: Vec<PackageRecord>,
    pub total: u64,
    pub time: String,
}

impl PackageRecord {
    /// Create an empty record carrying only a name
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            npm_url: npm_page_url(&name),
            name,
            ..Self::default()
        }
    }

    /// Author to display, falling back to the publisher username
    pub fn display_author(&self) -> &str {
        if self.author.is_empty() {
            &self.publisher
        } else {
            &self.author
        }
    }

    /// Copy the augmented fields (downloads, license, author) from another record.
    ///
    /// Links are only taken when this record has none of its own.
    pub fn absorb_augmentation(&mut self, other: &PackageRecord) {
        self.weekly_downloads = other.weekly_downloads;
        self.license = other.license.clone();
        self.author = other.author.clone();
        if self.homepage.is_empty() {
            self.homepage = other.homepage.clone();
        }
        if self.repository.is_empty() {
            self.repository = other.repository.clone();
        }
        if self.npm_url.is_empty() {
            self.npm_url = other.npm_url.clone();
        }
    }

    /// Check if this package has a specific keyword
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.contains(keyword)
    }
}

impl SearchResult {
    /// Build a listing result from already ordered records
    pub fn from_records(packages: Vec<PackageRecord>) -> Self {
        Self {
            total: packages.len() as u64,
            packages,
            time: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Package names in result order
    pub fn names(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.name.clone()).collect()
    }
}

/// npmjs.com page for a package
pub fn npm_page_url(name: &str) -> String {
    format!("{}{}", NPM_PACKAGE_PAGE, name)
}
