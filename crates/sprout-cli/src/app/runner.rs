//! Executes session tasks in the background and reports completions

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use sprout_config::scan_dependencies;
use sprout_core::types::SearchResult;

use super::{AppEvent, Task};
use crate::services::{project_dir, Services};

/// Spawns one tokio task per [`Task`] and sends its completion event
#[derive(Clone)]
pub struct TaskRunner {
    services: Arc<Services>,
    cwd: PathBuf,
    events: UnboundedSender<AppEvent>,
}

impl TaskRunner {
    pub fn new(services: Arc<Services>, cwd: PathBuf, events: UnboundedSender<AppEvent>) -> Self {
        Self { services, cwd, events }
    }

    pub fn spawn_all(&self, tasks: Vec<Task>) {
        for task in tasks {
            self.spawn(task);
        }
    }

    pub fn spawn(&self, task: Task) {
        let runner = self.clone();
        tokio::spawn(async move {
            let event = runner.execute(task).await;
            // The session is gone when the receiver is dropped
            if runner.events.send(event).is_err() {
                debug!("session closed before task completion");
            }
        });
    }

    /// Run one task to completion
    pub async fn execute(&self, task: Task) -> AppEvent {
        debug!("running task {:?}", task);
        let services = &self.services;

        match task {
            Task::Search { query } => {
                let result = services.aggregator.search(&query, services.page_size()).await;
                AppEvent::SearchCompleted { query, result }
            }
            Task::LoadProject => {
                let result = services
                    .project_listing(&self.cwd)
                    .await
                    .map(|listing| listing.map(|l| l.result).unwrap_or_else(SearchResult::default));
                AppEvent::SearchCompleted {
                    query: String::new(),
                    result,
                }
            }
            Task::ScanManifest => match scan_dependencies(&self.cwd).await {
                Ok((manifest, set)) => AppEvent::ScanCompleted {
                    manifest,
                    result: Ok(set),
                },
                Err(e) => AppEvent::ScanCompleted {
                    manifest: None,
                    result: Err(e),
                },
            },
            Task::FetchReadme { seq, repository } => AppEvent::ReadmeCompleted {
                seq,
                result: services.readme.resolve(&repository).await,
            },
            Task::FetchHistory { package, days } => {
                let result = services.history.history(&package, days).await;
                AppEvent::DownloadsHistoryCompleted { package, result }
            }
            Task::Install { package, dev } => {
                let dir = project_dir(&self.cwd);
                let result = services.installer.install(&dir, &package, dev).await;
                AppEvent::InstallCompleted { package, dev, result }
            }
            Task::Update { package } => {
                let dir = project_dir(&self.cwd);
                let result = services.installer.update(&dir, &package).await;
                AppEvent::InstallCompleted {
                    package,
                    dev: false,
                    result,
                }
            }
        }
    }
}
