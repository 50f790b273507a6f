//! GitHub Actions artifact provider.
//!
//! Artifacts are uploaded by the CI workflow (`actions/upload-artifact`) under
//! their canonical name; this provider finds them through the REST API and
//! downloads the zip archive GitHub serves for each one.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::artifact::{ArtifactName, LocalArtifact, RemoteArtifact};
use crate::consts::{APP_NAME, DEFAULT_GITHUB_API_URL, GITHUB_API_URL_ENV, GITHUB_TOKEN_ENV, STAGING_PREFIX};
use crate::store::LocalArtifactStore;

use super::archive::unpack_zip;
use super::repo::{self, RepositoryIdentity};
use super::retry::RetryPolicy;
use super::{ConfigurationError, PublishOutcome, RemoteBuildCache, RemoteCacheError};

const PROVIDER_NAME: &str = "github-actions";
const API_VERSION: &str = "2022-11-28";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const QUERY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Deserialize)]
struct ArtifactList {
  artifacts: Vec<ArtifactEntry>,
}

#[derive(Debug, Deserialize)]
struct ArtifactEntry {
  name: String,
  archive_download_url: String,
  #[serde(default)]
  expired: bool,
  size_in_bytes: Option<u64>,
}

pub struct GitHubActionsCache {
  client: reqwest::Client,
  api_url: String,
  repository: RepositoryIdentity,
  token: String,
  retry: RetryPolicy,
  download_timeout: Duration,
}

impl GitHubActionsCache {
  pub fn new(api_url: &str, repository: RepositoryIdentity, token: String) -> Result<Self, ConfigurationError> {
    let client = reqwest::Client::builder()
      .user_agent(format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION")))
      .connect_timeout(CONNECT_TIMEOUT)
      .build()
      .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

    Ok(Self {
      client,
      api_url: api_url.trim_end_matches('/').to_string(),
      repository,
      token,
      retry: RetryPolicy::default(),
      download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
    })
  }

  /// Build the provider from the process environment.
  ///
  /// Returns `Ok(None)` when `GITHUB_TOKEN` is unset or empty: the provider is
  /// unavailable, which is not an error.
  pub fn from_environment(project_root: &Path) -> Result<Option<Self>, ConfigurationError> {
    let token = match std::env::var(GITHUB_TOKEN_ENV) {
      Ok(token) if !token.trim().is_empty() => token,
      _ => return Ok(None),
    };

    let repository = repo::discover(project_root)?;
    let api_url = std::env::var(GITHUB_API_URL_ENV).unwrap_or_else(|_| DEFAULT_GITHUB_API_URL.to_string());

    Self::new(&api_url, repository, token).map(Some)
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
    self.download_timeout = timeout;
    self
  }

  pub fn repository(&self) -> &RepositoryIdentity {
    &self.repository
  }

  fn artifacts_url(&self) -> String {
    format!(
      "{}/repos/{}/{}/actions/artifacts",
      self.api_url, self.repository.owner, self.repository.repository
    )
  }

  fn get(&self, url: &str) -> reqwest::RequestBuilder {
    self
      .client
      .get(url)
      .bearer_auth(&self.token)
      .header(ACCEPT, "application/vnd.github+json")
      .header("X-GitHub-Api-Version", API_VERSION)
  }

  async fn query_once(&self, name: &ArtifactName) -> Result<Option<RemoteArtifact>, RemoteCacheError> {
    let response = self
      .get(&self.artifacts_url())
      .query(&[("per_page", "100"), ("page", "1"), ("name", name.as_str())])
      .timeout(QUERY_TIMEOUT)
      .send()
      .await
      .map_err(RemoteCacheError::from_reqwest)?;

    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let response = check_status(response).await?;

    let list: ArtifactList = response
      .json()
      .await
      .map_err(|e| RemoteCacheError::MalformedResponse(e.to_string()))?;

    // The API lists newest first.
    Ok(
      list
        .artifacts
        .into_iter()
        .find(|a| a.name == name.as_str() && !a.expired)
        .map(|a| RemoteArtifact {
          name: name.clone(),
          download_url: a.archive_download_url,
          size_in_bytes: a.size_in_bytes,
        }),
    )
  }

  /// Stream the archive to a temporary file inside the store root.
  async fn fetch_archive(
    &self,
    artifact: &RemoteArtifact,
    store: &LocalArtifactStore,
  ) -> Result<tempfile::NamedTempFile, RemoteCacheError> {
    tokio::fs::create_dir_all(store.root()).await?;
    let archive = tempfile::Builder::new()
      .prefix(&format!("{}{}-", STAGING_PREFIX, artifact.name))
      .suffix(".zip")
      .tempfile_in(store.root())?;

    let response = self
      .get(&artifact.download_url)
      .timeout(self.download_timeout)
      .send()
      .await
      .map_err(RemoteCacheError::from_reqwest)?;

    if response.status() == StatusCode::NOT_FOUND || response.status() == StatusCode::GONE {
      return Err(RemoteCacheError::Gone(artifact.name.clone()));
    }
    let mut response = check_status(response).await?;

    let mut file = tokio::fs::File::from_std(archive.reopen()?);
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await.map_err(RemoteCacheError::from_reqwest)? {
      file.write_all(&chunk).await?;
      written += chunk.len() as u64;
    }
    file.flush().await?;

    debug!(artifact = %artifact.name, bytes = written, "archive downloaded");
    Ok(archive)
  }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteCacheError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
    return Err(RemoteCacheError::Unauthorized { status: status.as_u16() });
  }
  let message = response.text().await.unwrap_or_default();
  Err(RemoteCacheError::Http {
    status: status.as_u16(),
    message,
  })
}

#[async_trait]
impl RemoteBuildCache for GitHubActionsCache {
  fn name(&self) -> &str {
    PROVIDER_NAME
  }

  async fn query(&self, name: &ArtifactName) -> Result<Option<RemoteArtifact>, RemoteCacheError> {
    debug!(artifact = %name, repository = %self.repository, "querying GitHub artifacts");
    self.retry.run("query", move || self.query_once(name)).await
  }

  async fn download(
    &self,
    artifact: &RemoteArtifact,
    store: &LocalArtifactStore,
  ) -> Result<LocalArtifact, RemoteCacheError> {
    info!(artifact = %artifact.name, size = ?artifact.size_in_bytes, "downloading artifact");
    let archive = self
      .retry
      .run("download", move || self.fetch_archive(artifact, store))
      .await?;

    let store = store.clone();
    let name = artifact.name.clone();
    tokio::task::spawn_blocking(move || unpack_zip(&store, &name, archive.path()))
      .await
      .map_err(|e| RemoteCacheError::Archive(e.to_string()))?
  }

  async fn publish(&self, artifact: &LocalArtifact) -> Result<PublishOutcome, RemoteCacheError> {
    if self.query(&artifact.name).await?.is_some() {
      return Ok(PublishOutcome::AlreadyPresent);
    }
    debug!(artifact = %artifact.name, "GitHub artifacts are uploaded by the workflow, not by this process");
    Ok(PublishOutcome::Unsupported)
  }
}
