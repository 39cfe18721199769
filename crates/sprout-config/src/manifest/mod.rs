//! package.json discovery and dependency scanning

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use sprout_core::error::SproutError;
use sprout_core::types::{DeclaredDependency, DependencySection, ManifestDependencySet};
use sprout_core::utils::find_upwards;
use tracing::debug;

use crate::ConfigResult;

/// Manifest file name
pub const MANIFEST_FILE: &str = "package.json";

/// Directory holding installed packages next to the manifest
pub const NODE_MODULES: &str = "node_modules";

/// The parts of package.json Sprout reads
///
/// Dependency maps keep declaration order so listings follow the file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectManifest {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,

    /// Package version
    #[serde(default)]
    pub version: Option<String>,

    /// Runtime dependencies
    #[serde(default)]
    pub dependencies: IndexMap<String, String>,

    /// Development dependencies
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: IndexMap<String, String>,

    /// Optional dependencies
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: IndexMap<String, String>,
}

/// A manifest together with the directory it was found in
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedManifest {
    pub path: PathBuf,
    pub manifest: ProjectManifest,
}

/// Parse JSON string to a ProjectManifest
pub fn parse_package_json(content: &str) -> ConfigResult<ProjectManifest> {
    serde_json::from_str(content).map_err(|e| SproutError::JsonParse {
        message: format!("JSON parsing error: {}", e),
    })
}

/// Load and parse package.json from file path
pub async fn load_from_file(path: &Path) -> ConfigResult<ProjectManifest> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SproutError::io(format!("Failed to read {}", path.display()), e))?;

    parse_package_json(&content).map_err(|e| match e {
        SproutError::JsonParse { message } => SproutError::JsonParse {
            message: format!("In file {}: {}", path.display(), message),
        },
        other => other,
    })
}

/// Search `start` and its parents for package.json
pub fn find_package_json(start: &Path) -> Option<PathBuf> {
    find_upwards(start, MANIFEST_FILE)
}

/// Locate and load the nearest manifest, `None` when there is none
pub async fn locate(start: &Path) -> ConfigResult<Option<LocatedManifest>> {
    let Some(path) = find_package_json(start) else {
        debug!("no {} above {}", MANIFEST_FILE, start.display());
        return Ok(None);
    };

    let manifest = load_from_file(&path).await?;
    Ok(Some(LocatedManifest { path, manifest }))
}

/// Check if `node_modules/<name>/package.json` exists below `project_dir`.
///
/// Scoped names (`@scope/name`) map onto nested directories.
pub fn is_installed(project_dir: &Path, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    project_dir
        .join(NODE_MODULES)
        .join(name)
        .join(MANIFEST_FILE)
        .is_file()
}

impl ProjectManifest {
    /// Load a manifest from an explicit path
    pub async fn load(path: &Path) -> ConfigResult<Self> {
        load_from_file(path).await
    }

    /// All declared dependencies with installed flags, in declaration order.
    ///
    /// `dependencies` come first, then `devDependencies`, then
    /// `optionalDependencies`; a name declared twice keeps its first entry.
    pub fn dependency_set(&self, project_dir: &Path) -> ManifestDependencySet {
        let sections = [
            (&self.dependencies, DependencySection::Normal),
            (&self.dev_dependencies, DependencySection::Dev),
            (&self.optional_dependencies, DependencySection::Optional),
        ];

        let mut set = ManifestDependencySet::new();
        for (deps, section) in sections {
            for (name, wanted) in deps {
                if set.contains(name) {
                    continue;
                }
                set.declare(
                    name.clone(),
                    DeclaredDependency {
                        wanted: wanted.clone(),
                        section,
                        installed: is_installed(project_dir, name),
                    },
                );
            }
        }
        set
    }
}

impl LocatedManifest {
    /// Directory containing the manifest
    pub fn project_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Declared dependencies with installed flags
    pub fn dependency_set(&self) -> ManifestDependencySet {
        self.manifest.dependency_set(self.project_dir())
    }
}

/// Scan the manifest nearest to `start` for declared dependencies.
///
/// Returns the manifest path (if any) and its dependency set; a missing
/// manifest yields an empty set.
pub async fn scan_dependencies(start: &Path) -> ConfigResult<(Option<PathBuf>, ManifestDependencySet)> {
    match locate(start).await? {
        Some(located) => {
            let set = located.dependency_set();
            debug!("scanned {} dependencies from {}", set.len(), located.path.display());
            Ok((Some(located.path), set))
        }
        None => Ok((None, ManifestDependencySet::new())),
    }
}
