//! Package manager detection and command tables

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sprout_core::error::SproutError;
use sprout_core::utils::find_upwards_any;
use tracing::debug;

/// Supported JavaScript package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    Npm,
    Pnpm,
    Yarn,
    Bun,
}

/// Lockfiles in detection priority order
const LOCKFILES: [(&str, PackageManager); 4] = [
    ("pnpm-lock.yaml", PackageManager::Pnpm),
    ("bun.lockb", PackageManager::Bun),
    ("yarn.lock", PackageManager::Yarn),
    ("package-lock.json", PackageManager::Npm),
];

impl PackageManager {
    pub const ALL: [PackageManager; 4] = [
        PackageManager::Npm,
        PackageManager::Pnpm,
        PackageManager::Yarn,
        PackageManager::Bun,
    ];

    /// Executable name
    pub fn binary(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
            PackageManager::Bun => "bun",
        }
    }

    /// Detect the manager from the nearest lockfile, falling back to npm
    pub fn detect(start: &Path) -> Self {
        let names: Vec<&str> = LOCKFILES.iter().map(|(file, _)| *file).collect();
        match find_upwards_any(start, &names) {
            Some((path, index)) => {
                let manager = LOCKFILES[index].1;
                debug!("detected {} from {}", manager, path.display());
                manager
            }
            None => PackageManager::Npm,
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

impl FromStr for PackageManager {
    type Err = SproutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "npm" => Ok(PackageManager::Npm),
            "pnpm" => Ok(PackageManager::Pnpm),
            "yarn" => Ok(PackageManager::Yarn),
            "bun" => Ok(PackageManager::Bun),
            other => Err(SproutError::ConfigValidation {
                field: "package_managers".to_string(),
                reason: format!("unknown package manager '{}'", other),
            }),
        }
    }
}

/// Whether a command adds a new dependency or updates an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    Add,
    Update,
}

/// Command verbs and flags of one package manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSpec {
    /// Arguments adding a dependency, e.g. `["add"]`
    pub add: Vec<String>,
    /// Arguments updating a dependency, e.g. `["upgrade", "--latest"]`
    pub update: Vec<String>,
    /// Flag marking a dev dependency; only used when adding
    pub dev_flag: String,
    /// Append `@latest` to the package name
    pub pin_latest: bool,
}

/// Partial override of a [`CommandSpec`] from the settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin_latest: Option<bool>,
}

/// A fully built package manager call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub manager: PackageManager,
    pub program: String,
    pub args: Vec<String>,
}

/// Command specs for every manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTable {
    specs: HashMap<PackageManager, CommandSpec>,
}

fn words(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for CommandSpec {
    fn default() -> Self {
        CommandSpec::for_manager(PackageManager::Npm)
    }
}

impl CommandSpec {
    /// Built-in commands of a manager
    pub fn for_manager(manager: PackageManager) -> Self {
        match manager {
            PackageManager::Npm => CommandSpec {
                add: words(&["install"]),
                update: words(&["install"]),
                dev_flag: "--save-dev".to_string(),
                pin_latest: true,
            },
            PackageManager::Pnpm => CommandSpec {
                add: words(&["add"]),
                update: words(&["up"]),
                dev_flag: "--save-dev".to_string(),
                pin_latest: false,
            },
            PackageManager::Yarn => CommandSpec {
                add: words(&["add"]),
                update: words(&["upgrade", "--latest"]),
                dev_flag: "-D".to_string(),
                pin_latest: false,
            },
            PackageManager::Bun => CommandSpec {
                add: words(&["add"]),
                update: words(&["update"]),
                dev_flag: "-d".to_string(),
                pin_latest: false,
            },
        }
    }

    fn apply(&mut self, over: &CommandOverride) {
        if let Some(add) = &over.add {
            self.add = add.clone();
        }
        if let Some(update) = &over.update {
            self.update = update.clone();
        }
        if let Some(dev_flag) = &over.dev_flag {
            self.dev_flag = dev_flag.clone();
        }
        if let Some(pin) = over.pin_latest {
            self.pin_latest = pin;
        }
    }

    /// Arguments for one call
    pub fn args(&self, package: &str, mode: InstallMode, dev: bool) -> Vec<String> {
        let mut args = match mode {
            InstallMode::Add => self.add.clone(),
            InstallMode::Update => self.update.clone(),
        };
        if mode == InstallMode::Add && dev && !self.dev_flag.is_empty() {
            args.push(self.dev_flag.clone());
        }
        if self.pin_latest {
            args.push(format!("{}@latest", package));
        } else {
            args.push(package.to_string());
        }
        args
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        let specs = PackageManager::ALL
            .iter()
            .map(|m| (*m, CommandSpec::for_manager(*m)))
            .collect();
        Self { specs }
    }
}

impl CommandTable {
    /// Built-in table with the given per-manager overrides applied
    pub fn with_overrides(overrides: &HashMap<String, CommandOverride>) -> Result<Self, SproutError> {
        let mut table = Self::default();
        for (name, over) in overrides {
            let manager: PackageManager = name.parse()?;
            if let Some(spec) = table.specs.get_mut(&manager) {
                spec.apply(over);
            }
        }
        Ok(table)
    }

    pub fn spec(&self, manager: PackageManager) -> CommandSpec {
        self.specs
            .get(&manager)
            .cloned()
            .unwrap_or_else(|| CommandSpec::for_manager(manager))
    }

    /// Build the call for `package`
    pub fn invocation(
        &self,
        manager: PackageManager,
        package: &str,
        mode: InstallMode,
        dev: bool,
    ) -> Invocation {
        Invocation {
            manager,
            program: manager.binary().to_string(),
            args: self.spec(manager).args(package, mode, dev),
        }
    }
}

impl Invocation {
    /// Command line for logs and error messages
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}
