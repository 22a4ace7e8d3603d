//! Hosted release creation
//!
//! Wraps the single outbound call that creates a release object on a
//! GitHub-compatible API:
//!
//! `POST {api}/repos/{owner}/{repo}/releases`
//!
//! On failure the raw error payload is written to a diagnostic file so the
//! run can be inspected afterwards.

use crate::config::GitHubConfig;
use crate::error::{CosmodromeError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// File the failure payload of a publish call is written to
pub const DIAGNOSTICS_FILE: &str = "cosmodrome.logs";

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("cosmodrome/", env!("CARGO_PKG_VERSION"));

/// Body of the release creation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteReleaseRequest {
    pub tag_name: String,
    #[serde(rename = "target_commitish")]
    pub target_branch: String,
    #[serde(rename = "name")]
    pub release_name: String,
    pub draft: bool,
    #[serde(rename = "prerelease")]
    pub pre_release: bool,
    #[serde(rename = "generate_release_notes")]
    pub generate_notes: bool,
}

/// The created release as reported by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublishedRelease {
    pub id: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Creates hosted release objects
#[async_trait]
pub trait ReleasePublisher: Send + Sync {
    /// Create the release described by `request`.
    ///
    /// Exactly one outbound creation call is made; no retry.
    async fn publish(
        &self,
        request: &RemoteReleaseRequest,
        credentials: &GitHubConfig,
    ) -> Result<PublishedRelease>;
}

/// Publisher for the GitHub REST API
pub struct GitHubPublisher {
    client: Client,
    diagnostics_path: PathBuf,
}

impl GitHubPublisher {
    /// Create a publisher writing failure payloads to `diagnostics_path`
    pub fn new(diagnostics_path: impl Into<PathBuf>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CosmodromeError::remote(None, e.to_string()))?;

        Ok(GitHubPublisher {
            client,
            diagnostics_path: diagnostics_path.into(),
        })
    }

    /// Publisher writing diagnostics to `<root>/cosmodrome.logs`
    pub fn for_root(root: &Path) -> Result<Self> {
        GitHubPublisher::new(root.join(DIAGNOSTICS_FILE))
    }

    pub fn diagnostics_path(&self) -> &Path {
        &self.diagnostics_path
    }

    fn persist_failure(&self, payload: &str) {
        match fs::write(&self.diagnostics_path, payload) {
            Ok(()) => debug!(path = %self.diagnostics_path.display(), "wrote publish diagnostics"),
            Err(e) => warn!(
                path = %self.diagnostics_path.display(),
                error = %e,
                "could not write publish diagnostics"
            ),
        }
    }
}

/// Release endpoint for the configured repository
pub fn releases_url(credentials: &GitHubConfig) -> String {
    format!(
        "{}/repos/{}/{}/releases",
        credentials.api_url.trim_end_matches('/'),
        credentials.owner,
        credentials.repo
    )
}

#[async_trait]
impl ReleasePublisher for GitHubPublisher {
    #[instrument(skip_all, fields(tag = %request.tag_name))]
    async fn publish(
        &self,
        request: &RemoteReleaseRequest,
        credentials: &GitHubConfig,
    ) -> Result<PublishedRelease> {
        let url = releases_url(credentials);

        let response = match self
            .client
            .post(&url)
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(AUTHORIZATION, format!("Bearer {}", credentials.token))
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let message = e.to_string();
                self.persist_failure(&message);
                return Err(CosmodromeError::remote(None, message));
            }
        };

        let status = response.status();
        if !status.is_success() {
            let error_text = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("failed to read error response: {}", e),
            };
            self.persist_failure(&error_text);
            return Err(CosmodromeError::remote(Some(status.as_u16()), error_text));
        }

        let release: PublishedRelease = response
            .json()
            .await
            .map_err(|e| CosmodromeError::remote(Some(status.as_u16()), e.to_string()))?;

        info!(id = release.id, "created hosted release");
        Ok(release)
    }
}
