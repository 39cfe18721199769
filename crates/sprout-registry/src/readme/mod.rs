//! README lookup for GitHub-hosted packages
//!
//! The resolver turns a repository URL in any of the forms npm metadata
//! uses into `owner/repo` and probes raw.githubusercontent.com for the
//! usual README names on the `main` and `master` branches.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::debug;
use url::Url;

use sprout_core::error::SproutError;

use crate::client::RegistryClient;
use crate::RegistryResult;

/// Branches probed, in order
pub const BRANCHES: [&str; 2] = ["main", "master"];

/// README file names probed on each branch, in order
pub const README_FILES: [&str; 8] = [
    "README.md",
    "Readme.md",
    "readme.md",
    "README.MD",
    "README.markdown",
    "README.rst",
    "README.txt",
    "README",
];

/// A GitHub repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    pub owner: String,
    pub repo: String,
}

/// A fetched README
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readme {
    pub owner: String,
    pub repo: String,
    pub content: String,
}

/// Resolves READMEs with a bounding deadline and per-probe timeouts
#[derive(Debug, Clone)]
pub struct ReadmeResolver {
    client: Arc<RegistryClient>,
    raw_base: String,
    timeout: Duration,
    probe_timeout: Duration,
}

/// Monotonic request numbers for discarding stale README completions
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl GithubRepo {
    /// `owner/repo`
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Probe URLs under the raw content `base`, in probe order.
    ///
    /// Owner, repo and branch are each escaped as one path segment.
    pub fn probe_urls(&self, base: &Url) -> Vec<Url> {
        BRANCHES
            .iter()
            .flat_map(|branch| README_FILES.iter().map(move |file| (branch, file)))
            .filter_map(|(branch, file)| {
                let mut url = base.clone();
                url.path_segments_mut()
                    .ok()?
                    .pop_if_empty()
                    .extend([self.owner.as_str(), self.repo.as_str(), branch, file]);
                Some(url)
            })
            .collect()
    }
}

fn invalid(url: &str, reason: &str) -> SproutError {
    SproutError::InvalidRepository {
        url: url.to_string(),
        reason: reason.to_string(),
    }
}

/// Split `owner/repo[.git][/...]` into a [`GithubRepo`]
fn split_path(original: &str, path: &str) -> RegistryResult<GithubRepo> {
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/').filter(|p| !p.is_empty());

    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) => Ok(GithubRepo {
            owner: owner.to_string(),
            repo: repo.strip_suffix(".git").unwrap_or(repo).to_string(),
        }),
        _ => Err(invalid(original, "invalid GitHub repository path")),
    }
}

fn is_github_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "github.com" || host.ends_with(".github.com") || host.ends_with("githubusercontent.com")
}

/// Parse a repository URL into a GitHub owner and repo.
///
/// Accepts `https://github.com/o/r`, bare `github.com/o/r`,
/// `git+https://...`, `git+ssh://git@github.com/o/r.git`,
/// `git@github.com:o/r.git` and the `github:o/r` shorthand.
pub fn parse_github_repo(repository: &str) -> RegistryResult<GithubRepo> {
    let trimmed = repository.trim();
    if trimmed.is_empty() {
        return Err(invalid(repository, "no repository URL"));
    }

    let s = trimmed.strip_prefix("git+").unwrap_or(trimmed);

    if let Some(rest) = s.strip_prefix("github:") {
        return split_path(repository, rest);
    }
    if let Some(rest) = s.strip_prefix("git@github.com:") {
        return split_path(repository, rest);
    }

    let candidate = if s.contains("://") {
        s.to_string()
    } else {
        format!("https://{}", s)
    };
    let url = Url::parse(&candidate).map_err(|_| invalid(repository, "repository is not a valid URL"))?;

    match url.host_str() {
        Some(host) if is_github_host(host) => split_path(repository, url.path()),
        _ => Err(invalid(repository, "repository is not a GitHub URL")),
    }
}

impl ReadmeResolver {
    pub fn new(client: Arc<RegistryClient>, raw_base: impl Into<String>) -> Self {
        Self {
            client,
            raw_base: raw_base.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(3),
        }
    }

    /// Set the overall deadline and the per-probe timeout
    pub fn with_timeouts(mut self, timeout: Duration, probe_timeout: Duration) -> Self {
        self.timeout = timeout;
        self.probe_timeout = probe_timeout;
        self
    }

    /// Fetch the README of `repository`
    pub async fn resolve(&self, repository: &str) -> RegistryResult<Readme> {
        let repo = parse_github_repo(repository)?;
        let base = Url::parse(&self.raw_base).map_err(|e| SproutError::Readme {
            repo: repo.slug(),
            reason: format!("invalid raw content URL '{}': {}", self.raw_base, e),
        })?;
        let deadline = Instant::now() + self.timeout;

        for url in repo.probe_urls(&base) {
            if Instant::now() >= deadline {
                debug!("README deadline reached for {}", repo.slug());
                break;
            }

            match timeout_at(deadline, self.client.fetch_text(url.as_str(), self.probe_timeout)).await {
                Ok(Ok(Some(body))) => {
                    debug!("README for {} found at {}", repo.slug(), url);
                    return Ok(Readme {
                        owner: repo.owner,
                        repo: repo.repo,
                        content: clean_content(&body),
                    });
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => debug!("README probe {} failed: {}", url, e),
                Err(_) => {
                    debug!("README deadline reached for {}", repo.slug());
                    break;
                }
            }
        }

        Err(SproutError::Readme {
            repo: repo.slug(),
            reason: "could not fetch README".to_string(),
        })
    }
}

/// Strip a leading byte-order mark and leading whitespace
pub fn clean_content(body: &str) -> String {
    body.trim_start_matches(|c: char| c == '\u{feff}' || c.is_whitespace())
        .to_string()
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next request number; it becomes the latest
    pub fn next(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Number of the most recently issued request, zero before any
    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Whether a completion tagged `seq` is still wanted
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest()
    }
}
