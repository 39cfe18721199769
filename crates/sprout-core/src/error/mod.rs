//! Error types and result aliases for Sprout operations.
//!
//! Provides a unified error type that covers every failure the client can
//! surface to a caller, with actionable messages. Failures of optional
//! enrichment (downloads, license, author) never reach this type; they are
//! degraded to default values where they happen.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for all Sprout operations
#[derive(Error, Debug)]
pub enum SproutError {
    // Config errors
    #[error("Failed to parse {file}: {message}")]
    TomlParse { file: String, message: String },

    #[error("Failed to parse package.json: {message}")]
    JsonParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    #[error("No package.json found in {start} or any parent directory")]
    ManifestNotFound { start: String },

    // Registry errors
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    // README errors
    #[error("Invalid repository '{url}': {reason}")]
    InvalidRepository { url: String, reason: String },

    #[error("README unavailable for {repo}: {reason}")]
    Readme { repo: String, reason: String },

    // Package manager errors
    #[error("{manager} not found on PATH")]
    PackageManagerNotFound { manager: String },

    #[error("{manager} failed ({status}):\n{output}")]
    PackageManager {
        manager: String,
        status: String,
        output: String,
    },

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Sprout operations
pub type SproutResult<T> = Result<T, SproutError>;

impl SproutError {
    /// Create a network error from any error type
    pub fn network<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SproutError::Network { .. } | SproutError::Io { .. } | SproutError::Timeout { .. }
        )
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            SproutError::PackageNotFound { .. } => {
                Some("Check the package name spelling or try 'sprout search'")
            },
            SproutError::Network { .. } => Some("Check your internet connection and try again"),
            SproutError::ManifestNotFound { .. } => {
                Some("Run sprout from inside a project that has a package.json")
            },
            SproutError::InvalidRepository { .. } => {
                Some("Only GitHub repositories can show a README")
            },
            SproutError::PackageManagerNotFound { .. } => {
                Some("Install the package manager matching the project's lockfile")
            },
            SproutError::TomlParse { .. } | SproutError::ConfigValidation { .. } => {
                Some("Fix ~/.sprout/config.toml or the SPROUT_* environment variables")
            },
            _ => None,
        }
    }
}
