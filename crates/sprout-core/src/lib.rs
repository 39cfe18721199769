//! # sprout-core
//!
//! Core types and utilities shared across all Sprout crates.
//!
//! This crate provides:
//! - PackageRecord and SearchResult, the data handed to the terminal session
//! - DownloadPoint and DayDownloads for download trends
//! - ManifestDependencySet for installed/outdated marking
//! - SproutError enum for unified error handling
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `types`: Core data types
//! - `error`: Error types and result aliases
//! - `utils`: Filesystem helpers

pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use error::{SproutError, SproutResult};
pub use types::{DownloadPoint, ManifestDependencySet, PackageRecord, SearchResult};
