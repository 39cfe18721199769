//! Core data types for Sprout.
//!
//! This module provides the fundamental types shared by every crate:
//! - Package records and ordered search results
//! - Download statistics
//! - Manifest dependency sets
//! - Version helpers for update recommendations

pub mod download;
pub mod manifest;
pub mod package;
pub mod version;

// Re-export all public types
pub use download::{series_values, DayDownloads, DownloadPoint};
pub use manifest::{DeclaredDependency, DependencySection, DependencyStatus, ManifestDependencySet};
pub use package::{npm_page_url, PackageRecord, SearchResult, NPM_PACKAGE_PAGE};
pub use version::{numeric_prefix, update_path, update_recommended};
