//! Remote build cache providers.
//!
//! A provider locates previously published artifacts by name and downloads
//! them into the local store. At most one provider is active per
//! [`BuildCache`](crate::cache::BuildCache); having none is a valid state in
//! which caching is local-only.

mod archive;
pub mod ci;
pub mod github;
pub mod repo;
pub mod retry;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::artifact::{ArtifactName, LocalArtifact, RemoteArtifact};
use crate::store::{LocalArtifactStore, StoreError};

pub use ci::{CiProvider, detect_ci, select_provider};
pub use github::GitHubActionsCache;
pub use repo::RepositoryIdentity;
pub use retry::RetryPolicy;

/// Failures talking to a remote provider.
///
/// "Not found" is not an error: [`RemoteBuildCache::query`] returns `Ok(None)`.
#[derive(Debug, Error)]
pub enum RemoteCacheError {
  #[error("remote rejected credentials (HTTP {status})")]
  Unauthorized { status: u16 },

  #[error("remote returned HTTP {status}: {message}")]
  Http { status: u16, message: String },

  #[error("network error: {0}")]
  Network(String),

  #[error("request timed out")]
  Timeout,

  #[error("malformed response: {0}")]
  MalformedResponse(String),

  #[error("artifact '{0}' disappeared before it could be downloaded")]
  Gone(ArtifactName),

  #[error("failed to unpack artifact: {0}")]
  Archive(String),

  #[error("failed to store artifact: {0}")]
  Storage(#[from] StoreError),

  #[error("failed to write artifact: {0}")]
  Io(#[from] std::io::Error),
}

impl RemoteCacheError {
  /// Transient failures are worth retrying; everything else is final.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::Network(_) | Self::Timeout => true,
      Self::Http { status, .. } => *status >= 500 || *status == 429,
      _ => false,
    }
  }

  pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
    if err.is_timeout() {
      Self::Timeout
    } else if err.is_decode() {
      Self::MalformedResponse(err.to_string())
    } else {
      Self::Network(err.to_string())
    }
  }
}

/// Problems with the environment a provider is built from.
#[derive(Debug, Error)]
pub enum ConfigurationError {
  #[error("cannot derive owner/repository from remote URL '{0}'")]
  MalformedRemoteUrl(String),

  #[error("no repository identity: no git remote and {0} is not set")]
  MissingRepositoryIdentity(&'static str),

  #[error("failed to build HTTP client: {0}")]
  HttpClient(String),
}

/// Result of offering an artifact to a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublishOutcome {
  Published,
  AlreadyPresent,
  /// The provider does not accept uploads from this process.
  Unsupported,
}

/// A backend that stores built artifacts by name.
#[async_trait]
pub trait RemoteBuildCache: Send + Sync {
  /// Human-readable provider name for logs.
  fn name(&self) -> &str;

  /// Locate a published artifact.
  ///
  /// Returns `Ok(None)` if nothing is published under `name`.
  async fn query(&self, name: &ArtifactName) -> Result<Option<RemoteArtifact>, RemoteCacheError>;

  /// Fetch an artifact and materialize it in `store` at its resolved path.
  async fn download(
    &self,
    artifact: &RemoteArtifact,
    store: &LocalArtifactStore,
  ) -> Result<LocalArtifact, RemoteCacheError>;

  /// Offer a locally built artifact for publication.
  ///
  /// Must be idempotent per artifact name.
  async fn publish(&self, artifact: &LocalArtifact) -> Result<PublishOutcome, RemoteCacheError> {
    let _ = artifact;
    Ok(PublishOutcome::Unsupported)
  }
}
