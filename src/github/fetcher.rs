//! Raw file retrieval from GitHub.
//!
//! Files are fetched from the raw-content host without cloning. The
//! default branch is not looked up; the conventional names are tried in
//! order instead.

use crate::cache::ContentCache;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Branch names tried in order when fetching a file.
pub const DEFAULT_BRANCHES: [&str; 2] = ["main", "master"];

pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";

/// Outcome of a `fetch_github_file` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Fetched { file_path: String, size: usize },
    NotFound,
}

impl FetchOutcome {
    /// JSON shape sent back to the model.
    pub fn to_value(&self) -> Value {
        match self {
            FetchOutcome::Fetched { file_path, size } => json!({
                "success": true,
                "file_path": file_path,
                "size": size,
            }),
            FetchOutcome::NotFound => json!({
                "success": false,
                "error": "File not found",
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, FetchOutcome::NotFound)
    }
}

/// Options for the fetcher.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Base URL of the raw-content host, without trailing slash.
    pub raw_base_url: String,
    /// Branches to try, in order.
    pub branches: Vec<String>,
    /// Request timeout. None keeps the HTTP client default.
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            raw_base_url: DEFAULT_RAW_BASE_URL.to_string(),
            branches: DEFAULT_BRANCHES.iter().map(|b| b.to_string()).collect(),
            timeout: None,
        }
    }
}

impl From<&crate::config::Config> for FetchOptions {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            raw_base_url: config.github.raw_base_url.clone(),
            branches: config.github.branches.clone(),
            timeout: config.model.timeout_seconds.map(Duration::from_secs),
        }
    }
}

/// Fetches files over HTTP and stores them in a [`ContentCache`].
pub struct GithubFetcher {
    http_client: reqwest::Client,
    options: FetchOptions,
}

impl GithubFetcher {
    pub fn new(options: FetchOptions) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            options,
        })
    }

    /// Build the raw-content URL for one branch.
    pub fn raw_url(&self, owner: &str, repo: &str, branch: &str, file_path: &str) -> String {
        format!(
            "{}/{}/{}/{}/{}",
            self.options.raw_base_url.trim_end_matches('/'),
            owner,
            repo,
            branch,
            file_path.trim_start_matches('/')
        )
    }

    /// Fetch a file, trying each configured branch once.
    ///
    /// On success the body is cached under `file_path`. A non-200 status on
    /// every branch yields [`FetchOutcome::NotFound`] and leaves the cache
    /// untouched. Transport errors are returned as `Err`.
    pub async fn fetch(
        &self,
        cache: &mut ContentCache,
        owner: &str,
        repo: &str,
        file_path: &str,
    ) -> Result<FetchOutcome> {
        for branch in &self.options.branches {
            let url = self.raw_url(owner, repo, branch, file_path);
            debug!("GET {}", url);

            let response = self
                .http_client
                .get(&url)
                .send()
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;

            let status = response.status();
            if status != StatusCode::OK {
                debug!("{} returned {}", url, status);
                continue;
            }

            let body = response
                .text()
                .await
                .with_context(|| format!("Failed to read response body from {}", url))?;

            let size = cache.insert(file_path, body);
            info!(
                "Fetched {}/{}:{} from branch {} ({} chars)",
                owner, repo, file_path, branch, size
            );

            return Ok(FetchOutcome::Fetched {
                file_path: file_path.to_string(),
                size,
            });
        }

        info!("{}/{}:{} not found on any branch", owner, repo, file_path);
        Ok(FetchOutcome::NotFound)
    }
}
