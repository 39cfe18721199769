//! Configuration for the Sprout client
//!
//! Loads client settings (endpoints, limits, timeouts, package manager
//! commands), discovers the project's package.json and detects which
//! package manager the project uses.

pub mod manifest;
pub mod package_manager;
pub mod settings;

// Re-export main types
pub use manifest::{find_package_json, is_installed, scan_dependencies, LocatedManifest, ProjectManifest};
pub use package_manager::{CommandOverride, CommandSpec, CommandTable, InstallMode, Invocation, PackageManager};
pub use settings::{Settings, SettingsLoader};

use sprout_core::error::SproutError;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, SproutError>;
