//! Project manifest dependency types.
//!
//! Defines the declared-dependency view of a project's package.json, used
//! to mark package records as installed or outdated.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::package::PackageRecord;
use super::version::update_path;

/// Manifest section a dependency was declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencySection {
    /// `dependencies`
    Normal,
    /// `devDependencies`
    Dev,
    /// `optionalDependencies`
    Optional,
}

/// One declared dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredDependency {
    /// Declared version range, e.g. `^4.17.21`
    pub wanted: String,
    pub section: DependencySection,
    /// Whether `node_modules/<name>/package.json` exists
    pub installed: bool,
}

/// Dependencies declared in a manifest, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestDependencySet {
    entries: IndexMap<String, DeclaredDependency>,
}

/// How a package record relates to the project manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyStatus {
    NotDeclared,
    Declared { installed: bool },
    /// Declared, but the manifest does not point at the latest version
    Outdated {
        installed: bool,
        from: String,
        to: String,
    },
}

impl DependencySection {
    /// Key of this section in package.json
    pub fn manifest_key(&self) -> &'static str {
        match self {
            DependencySection::Normal => "dependencies",
            DependencySection::Dev => "devDependencies",
            DependencySection::Optional => "optionalDependencies",
        }
    }
}

impl ManifestDependencySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration; the first declaration of a name wins
    pub fn declare(&mut self, name: impl Into<String>, dependency: DeclaredDependency) -> bool {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, dependency);
        true
    }

    pub fn get(&self, name: &str) -> Option<&DeclaredDependency> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Flag a dependency as installed, e.g. after a successful install
    pub fn mark_installed(&mut self, name: &str) {
        if let Some(dep) = self.entries.get_mut(name) {
            dep.installed = true;
        }
    }

    /// Declared names in declaration order
    pub fn names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DeclaredDependency)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Status of a record relative to this manifest
    pub fn status_of(&self, record: &PackageRecord) -> DependencyStatus {
        let Some(dep) = self.entries.get(&record.name) else {
            return DependencyStatus::NotDeclared;
        };

        match update_path(&record.version, &dep.wanted) {
            Some((from, to)) => DependencyStatus::Outdated {
                installed: dep.installed,
                from,
                to,
            },
            None => DependencyStatus::Declared {
                installed: dep.installed,
            },
        }
    }
}
