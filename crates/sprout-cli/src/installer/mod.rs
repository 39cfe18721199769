//! Package-manager invocation for install and update requests
//!
//! Every call holds a process-wide gate for the lifetime of the child
//! process, so at most one package manager runs at a time and a second
//! request waits for the first to finish.

use std::future::Future;
use std::io::ErrorKind;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{info, warn};

use sprout_config::{is_installed, CommandTable, InstallMode, Invocation, PackageManager};
use sprout_core::error::{SproutError, SproutResult};

/// Runs a package-manager invocation and returns its combined output
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        invocation: &Invocation,
        cwd: &Path,
        timeout: Duration,
    ) -> impl Future<Output = SproutResult<String>> + Send;
}

/// Runs invocations as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation, cwd: &Path, timeout: Duration) -> SproutResult<String> {
        let manager = invocation.manager.to_string();
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => SproutError::PackageManagerNotFound { manager: manager.clone() },
                _ => SproutError::io(format!("Failed to start {}", invocation.display()), e),
            })?;

        // Dropping the future on timeout kills the child
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| SproutError::Timeout {
                operation: invocation.display(),
                after: timeout,
            })?
            .map_err(|e| SproutError::io(format!("Failed to wait for {}", invocation.display()), e))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Err(SproutError::PackageManager {
                manager,
                status: output.status.to_string(),
                output: combined,
            })
        }
    }
}

/// Result of a finished install or update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub package: String,
    pub dev: bool,
    pub manager: PackageManager,
    pub mode: InstallMode,
    pub output: String,
}

/// Serialized package-manager calls
pub struct Installer<R: CommandRunner = ProcessRunner> {
    runner: R,
    table: CommandTable,
    timeout: Duration,
    gate: Mutex<()>,
}

impl Installer<ProcessRunner> {
    pub fn new(table: CommandTable, timeout: Duration) -> Self {
        Self::with_runner(ProcessRunner, table, timeout)
    }
}

impl<R: CommandRunner> Installer<R> {
    pub fn with_runner(runner: R, table: CommandTable, timeout: Duration) -> Self {
        Self {
            runner,
            table,
            timeout,
            gate: Mutex::new(()),
        }
    }

    /// Add `name` to the project in `project_dir`, or update it when it is
    /// already present under `node_modules`. `None` for an empty name.
    pub async fn install(&self, project_dir: &Path, name: &str, dev: bool) -> SproutResult<Option<InstallOutcome>> {
        let mode = if is_installed(project_dir, name) {
            InstallMode::Update
        } else {
            InstallMode::Add
        };
        self.execute(project_dir, name, mode, dev).await
    }

    /// Update `name` to its latest version
    pub async fn update(&self, project_dir: &Path, name: &str) -> SproutResult<Option<InstallOutcome>> {
        self.execute(project_dir, name, InstallMode::Update, false).await
    }

    async fn execute(
        &self,
        project_dir: &Path,
        name: &str,
        mode: InstallMode,
        dev: bool,
    ) -> SproutResult<Option<InstallOutcome>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let _gate = self.gate.lock().await;

        let manager = PackageManager::detect(project_dir);
        let invocation = self.table.invocation(manager, name, mode, dev);
        info!("running {} in {}", invocation.display(), project_dir.display());

        match self.runner.run(&invocation, project_dir, self.timeout).await {
            Ok(output) => Ok(Some(InstallOutcome {
                package: name.to_string(),
                dev,
                manager,
                mode,
                output,
            })),
            Err(e) => {
                warn!("{} failed: {}", invocation.display(), e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Records invocations and tracks how many run at once
    #[derive(Default)]
    struct RecordingRunner {
        calls: std::sync::Mutex<Vec<String>>,
        active: AtomicUsize,
        max_active: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl RecordingRunner {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CommandRunner for RecordingRunner {
        async fn run(&self, invocation: &Invocation, _cwd: &Path, _timeout: Duration) -> SproutResult<String> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.calls.lock().unwrap().push(invocation.display());
            self.active.fetch_sub(1, Ordering::SeqCst);

            if self.fail {
                Err(SproutError::PackageManager {
                    manager: invocation.manager.to_string(),
                    status: "exit status: 1".to_string(),
                    output: "ERR! 404".to_string(),
                })
            } else {
                Ok(format!("ran {}", invocation.display()))
            }
        }
    }

    fn project(lockfile: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("package.json"), "{}").unwrap();
        fs::write(temp.path().join(lockfile), "").unwrap();
        temp
    }

    fn installer(runner: RecordingRunner) -> Installer<RecordingRunner> {
        Installer::with_runner(runner, CommandTable::default(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_install_adds_new_dependency() {
        let temp = project("yarn.lock");
        let installer = installer(RecordingRunner::default());

        let outcome = installer.install(temp.path(), "zod", true).await.unwrap().unwrap();
        assert_eq!(outcome.manager, PackageManager::Yarn);
        assert_eq!(outcome.mode, InstallMode::Add);
        assert!(outcome.dev);
        assert_eq!(outcome.output, "ran yarn add -D zod");
    }

    #[tokio::test]
    async fn test_install_updates_present_dependency() {
        let temp = project("pnpm-lock.yaml");
        let pkg = temp.path().join("node_modules/@scope/lib");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("package.json"), "{}").unwrap();

        let installer = installer(RecordingRunner::default());
        let outcome = installer.install(temp.path(), "@scope/lib", true).await.unwrap().unwrap();
        assert_eq!(outcome.mode, InstallMode::Update);
        assert_eq!(outcome.output, "ran pnpm up @scope/lib");
    }

    #[tokio::test]
    async fn test_update_uses_update_verb() {
        let temp = project("package-lock.json");
        let installer = installer(RecordingRunner::default());

        let outcome = installer.update(temp.path(), "react").await.unwrap().unwrap();
        assert_eq!(outcome.output, "ran npm install react@latest");
    }

    #[tokio::test]
    async fn test_empty_name_is_noop() {
        let temp = project("package-lock.json");
        let installer = installer(RecordingRunner::default());

        assert!(installer.install(temp.path(), "  ", false).await.unwrap().is_none());
        assert!(installer.runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_carries_output() {
        let temp = project("package-lock.json");
        let installer = installer(RecordingRunner {
            fail: true,
            ..Default::default()
        });

        match installer.install(temp.path(), "nope", false).await.unwrap_err() {
            SproutError::PackageManager { output, .. } => assert_eq!(output, "ERR! 404"),
            other => panic!("Expected PackageManager error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_installs_are_serialized() {
        let temp = project("bun.lockb");
        let installer = Arc::new(installer(RecordingRunner {
            delay: Duration::from_millis(50),
            ..Default::default()
        }));

        let mut handles = Vec::new();
        for name in ["a", "b", "c", "d"] {
            let installer = Arc::clone(&installer);
            let dir = temp.path().to_path_buf();
            handles.push(tokio::spawn(async move { installer.install(&dir, name, false).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(installer.runner.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(installer.runner.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_process_runner_missing_binary() {
        let temp = TempDir::new().unwrap();
        let invocation = Invocation {
            manager: PackageManager::Bun,
            program: "sprout-definitely-missing-binary".to_string(),
            args: vec!["add".to_string(), "zod".to_string()],
        };

        let err = ProcessRunner
            .run(&invocation, temp.path(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SproutError::PackageManagerNotFound { ref manager } if manager == "bun"));
    }
}
