//! Interactive session state.
//!
//! The session is a single state value updated by one dispatcher,
//! [`App::update`], which consumes [`AppEvent`]s (user input and task
//! completions) and returns the [`Task`]s to start. The app itself never
//! touches the network or the filesystem; [`runner::TaskRunner`] executes
//! tasks and feeds their completions back as events.

pub mod runner;
pub mod view;

use std::collections::BTreeSet;
use std::path::PathBuf;

use tracing::debug;

use sprout_core::error::{SproutError, SproutResult};
use sprout_core::types::{DownloadPoint, ManifestDependencySet, PackageRecord, SearchResult};
use sprout_registry::{Readme, RequestSequence};

use crate::installer::InstallOutcome;

/// Everything the session reacts to
#[derive(Debug)]
pub enum AppEvent {
    /// One line typed by the user
    Input(String),
    /// Terminal width changed
    Resize { width: u16 },
    /// A search finished; an empty query marks the project listing
    SearchCompleted {
        query: String,
        result: SproutResult<SearchResult>,
    },
    /// The manifest was rescanned
    ScanCompleted {
        manifest: Option<PathBuf>,
        result: SproutResult<ManifestDependencySet>,
    },
    InstallCompleted {
        package: String,
        dev: bool,
        result: SproutResult<Option<InstallOutcome>>,
    },
    ReadmeCompleted { seq: u64, result: SproutResult<Readme> },
    DownloadsHistoryCompleted {
        package: String,
        result: SproutResult<Vec<DownloadPoint>>,
    },
}

/// Work requested by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    Search { query: String },
    /// Enrich the dependencies of the nearest manifest
    LoadProject,
    ScanManifest,
    FetchReadme { seq: u64, repository: String },
    FetchHistory { package: String, days: i64 },
    Install { package: String, dev: bool },
    Update { package: String },
}

/// README panel state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadmeState {
    Idle,
    Loading,
    Loaded { repo: String, content: String },
    Failed(String),
}

/// A parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Select(usize),
    ToggleDetails,
    Install { dev: bool },
    Update,
    Reload,
    Quit,
    Nothing,
}

/// Session state
#[derive(Debug)]
pub struct App {
    pub query: String,
    pub results: Vec<PackageRecord>,
    pub total: u64,
    /// Index into `results`
    pub selected: usize,
    pub details_open: bool,
    pub loading: bool,
    pub installing: BTreeSet<String>,
    /// Installed during this session
    pub installed: BTreeSet<String>,
    pub manifest: ManifestDependencySet,
    pub manifest_path: Option<PathBuf>,
    /// Weekly trend of `trend_package`
    pub trend: Vec<DownloadPoint>,
    pub trend_package: Option<String>,
    pub readme: ReadmeState,
    readme_requests: RequestSequence,
    pub width: u16,
    pub window_days: i64,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl Command {
    /// Parse one input line.
    ///
    /// Single letters and numbers are commands; anything else is a
    /// search. A leading `/` forces a search, e.g. `/i` searches for "i".
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some(query) = line.strip_prefix('/') {
            return Command::Search(query.trim().to_string());
        }

        match line {
            "" => Command::Nothing,
            "q" => Command::Quit,
            "o" => Command::ToggleDetails,
            "i" => Command::Install { dev: false },
            "I" => Command::Install { dev: true },
            "u" => Command::Update,
            "l" => Command::Reload,
            _ => match line.parse::<usize>() {
                Ok(n) => Command::Select(n),
                Err(_) => Command::Search(line.to_string()),
            },
        }
    }
}

impl App {
    pub fn new(width: u16, window_days: i64) -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            total: 0,
            selected: 0,
            details_open: false,
            loading: false,
            installing: BTreeSet::new(),
            installed: BTreeSet::new(),
            manifest: ManifestDependencySet::new(),
            manifest_path: None,
            trend: Vec::new(),
            trend_package: None,
            readme: ReadmeState::Idle,
            readme_requests: RequestSequence::new(),
            width,
            window_days,
            status: None,
            should_quit: false,
        }
    }

    /// Tasks issued when the session starts
    pub fn startup(&mut self) -> Vec<Task> {
        self.loading = true;
        vec![Task::LoadProject, Task::ScanManifest]
    }

    pub fn selected_package(&self) -> Option<&PackageRecord> {
        self.results.get(self.selected)
    }

    /// Apply one event and return the tasks it triggers
    pub fn update(&mut self, event: AppEvent) -> Vec<Task> {
        match event {
            AppEvent::Input(line) => self.handle_command(Command::parse(&line)),
            AppEvent::Resize { width } => {
                self.width = width;
                Vec::new()
            }
            AppEvent::SearchCompleted { query, result } => {
                self.on_search_completed(query, result);
                Vec::new()
            }
            AppEvent::ScanCompleted { manifest, result } => {
                match result {
                    Ok(set) => {
                        self.manifest = set;
                        self.manifest_path = manifest;
                    }
                    Err(e) => self.status = Some(format!("Could not read package.json: {}", e)),
                }
                Vec::new()
            }
            AppEvent::InstallCompleted { package, dev, result } => self.on_install_completed(package, dev, result),
            AppEvent::ReadmeCompleted { seq, result } => {
                self.on_readme_completed(seq, result);
                Vec::new()
            }
            AppEvent::DownloadsHistoryCompleted { package, result } => {
                if self.trend_package.as_deref() == Some(package.as_str()) {
                    match result {
                        Ok(points) => self.trend = points,
                        Err(e) => {
                            debug!("download history for {} unavailable: {}", package, e);
                            self.trend.clear();
                        }
                    }
                }
                Vec::new()
            }
        }
    }

    fn handle_command(&mut self, command: Command) -> Vec<Task> {
        match command {
            Command::Nothing => Vec::new(),
            Command::Quit => {
                self.should_quit = true;
                Vec::new()
            }
            Command::Search(query) => {
                self.query = query.clone();
                self.loading = true;
                self.status = None;
                vec![Task::Search { query }]
            }
            Command::Reload => {
                self.query.clear();
                self.loading = true;
                self.status = None;
                vec![Task::LoadProject, Task::ScanManifest]
            }
            Command::Select(n) => {
                if n == 0 || n > self.results.len() {
                    self.status = Some(format!("No result #{}", n));
                    return Vec::new();
                }
                self.selected = n - 1;
                if self.details_open {
                    self.open_details()
                } else {
                    Vec::new()
                }
            }
            Command::ToggleDetails => {
                if self.details_open {
                    self.details_open = false;
                    Vec::new()
                } else {
                    self.open_details()
                }
            }
            Command::Install { dev } => self.start_install(dev, false),
            Command::Update => self.start_install(false, true),
        }
    }

    /// Open the details panel for the selection and request its README and trend
    fn open_details(&mut self) -> Vec<Task> {
        let Some(record) = self.selected_package().cloned() else {
            self.status = Some("Nothing selected".to_string());
            return Vec::new();
        };

        self.details_open = true;
        self.trend.clear();
        self.trend_package = Some(record.name.clone());

        let seq = self.readme_requests.next();
        let mut tasks = vec![Task::FetchHistory {
            package: record.name.clone(),
            days: self.window_days,
        }];

        if record.repository.is_empty() {
            self.readme = ReadmeState::Failed("no repository URL".to_string());
        } else {
            self.readme = ReadmeState::Loading;
            tasks.push(Task::FetchReadme {
                seq,
                repository: record.repository,
            });
        }
        tasks
    }

    fn start_install(&mut self, dev: bool, update: bool) -> Vec<Task> {
        let Some(name) = self.selected_package().map(|r| r.name.clone()) else {
            self.status = Some("Nothing selected".to_string());
            return Vec::new();
        };
        if !self.installing.insert(name.clone()) {
            self.status = Some(format!("{} is already being installed", name));
            return Vec::new();
        }

        self.status = Some(format!("Installing {}…", name));
        if update {
            vec![Task::Update { package: name }]
        } else {
            vec![Task::Install { package: name, dev }]
        }
    }

    fn on_search_completed(&mut self, query: String, result: SproutResult<SearchResult>) {
        // A newer query was typed meanwhile
        if query != self.query {
            debug!("dropping stale results for '{}'", query);
            return;
        }

        self.loading = false;
        match result {
            Ok(result) => {
                self.total = result.total;
                self.results = result.packages;
                self.selected = 0;
                self.details_open = false;
                self.readme = ReadmeState::Idle;
                if self.results.is_empty() && !query.is_empty() {
                    self.status = Some(format!("No packages found for '{}'", query));
                }
            }
            Err(e) => self.status = Some(format!("Search failed: {}", e)),
        }
    }

    fn on_install_completed(
        &mut self,
        package: String,
        dev: bool,
        result: SproutResult<Option<InstallOutcome>>,
    ) -> Vec<Task> {
        self.installing.remove(&package);
        match result {
            Ok(Some(outcome)) => {
                self.manifest.mark_installed(&package);
                self.installed.insert(package.clone());
                let kind = if dev { " as dev dependency" } else { "" };
                self.status = Some(format!("Installed {}{} with {}", package, kind, outcome.manager));
                vec![Task::ScanManifest]
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                self.status = Some(install_failure(&package, &e));
                Vec::new()
            }
        }
    }

    fn on_readme_completed(&mut self, seq: u64, result: SproutResult<Readme>) {
        if !self.readme_requests.is_current(seq) {
            debug!("dropping stale README response #{}", seq);
            return;
        }
        self.readme = match result {
            Ok(readme) => ReadmeState::Loaded {
                repo: format!("{}/{}", readme.owner, readme.repo),
                content: readme.content,
            },
            Err(e) => ReadmeState::Failed(readme_failure(&e)),
        };
    }
}

fn install_failure(package: &str, error: &SproutError) -> String {
    match error {
        SproutError::PackageManager { manager, output, .. } => {
            let last = output.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
            format!("{} failed to install {}: {}", manager, package, last.trim())
        }
        other => format!("Install of {} failed: {}", package, other),
    }
}

fn readme_failure(error: &SproutError) -> String {
    match error {
        SproutError::InvalidRepository { reason, .. } => reason.clone(),
        SproutError::Readme { reason, .. } => reason.clone(),
        other => other.to_string(),
    }
}
