//! Cache orchestrator.
//!
//! Composes fingerprinting, artifact naming, the local store, and the remote
//! provider into a single decision per build request:
//!
//! ```text
//! START -> FINGERPRINTED -> LOCAL_HIT
//!                        -> CHECKING_REMOTE -> REMOTE_HIT | MISS
//! ```
//!
//! Only fingerprinting failures are errors. Every remote or CI failure is
//! logged and folded into [`Outcome::Miss`]: caching is an optimization and
//! must never fail a build.

mod single_flight;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::artifact::{ArtifactName, LocalArtifact, ModeError, format_artifact_name, validate_mode};
use crate::config::{ProjectConfig, ProjectConfigError};
use crate::fingerprint::{Fingerprint, FingerprintError, FingerprintOptions, compute_fingerprint_async};
use crate::platform::Platform;
use crate::remote::{PublishOutcome, RemoteBuildCache, select_provider};
use crate::store::{LocalArtifactStore, StoreError};

pub use single_flight::SingleFlight;

/// What a build needs for one platform and mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
  platform: Platform,
  /// Build mode / variant / configuration, e.g. `debug` or `Release`.
  mode: String,
}

impl BuildRequest {
  /// # Errors
  ///
  /// [`ModeError`] if `mode` is empty or cannot be part of an artifact name.
  pub fn new(platform: Platform, mode: impl Into<String>) -> Result<Self, ModeError> {
    let mode = mode.into();
    validate_mode(&mode)?;
    Ok(Self { platform, mode })
  }

  pub fn platform(&self) -> Platform {
    self.platform
  }

  pub fn mode(&self) -> &str {
    &self.mode
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Outcome {
  LocalHit,
  RemoteHit,
  /// Nothing cached: the caller must build, then may [`BuildCache::publish`].
  Miss,
}

impl Outcome {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::LocalHit => "local-hit",
      Self::RemoteHit => "remote-hit",
      Self::Miss => "miss",
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
  pub outcome: Outcome,
  pub name: ArtifactName,
  /// Present for `LocalHit` and `RemoteHit`.
  pub artifact: Option<LocalArtifact>,
  pub fingerprint: Fingerprint,
}

/// What happened to a freshly built artifact on the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum RemotePublish {
  NoProvider,
  Published,
  AlreadyPresent,
  Unsupported,
  Failed { message: String },
}

impl From<PublishOutcome> for RemotePublish {
  fn from(outcome: PublishOutcome) -> Self {
    match outcome {
      PublishOutcome::Published => Self::Published,
      PublishOutcome::AlreadyPresent => Self::AlreadyPresent,
      PublishOutcome::Unsupported => Self::Unsupported,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
  pub local: LocalArtifact,
  pub remote: RemotePublish,
}

#[derive(Debug, Error)]
pub enum CacheError {
  #[error(transparent)]
  Fingerprint(#[from] FingerprintError),

  #[error(transparent)]
  Config(#[from] ProjectConfigError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Mode(#[from] ModeError),

  #[error("cache task failed: {0}")]
  Task(String),
}

/// Counters for work actually performed (not work joined via single-flight).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
  pub fingerprints_computed: usize,
  pub remote_queries: usize,
  pub downloads: usize,
}

#[derive(Debug, Default)]
struct Counters {
  fingerprints_computed: AtomicUsize,
  remote_queries: AtomicUsize,
  downloads: AtomicUsize,
}

type ResolvedArtifact = (Outcome, Option<LocalArtifact>);

/// Native build cache for one project.
///
/// The remote provider is chosen once, at construction. Share a `BuildCache`
/// (e.g. behind an `Arc`) between concurrent build requests so identical
/// requests are deduplicated.
pub struct BuildCache {
  project_root: PathBuf,
  config: ProjectConfig,
  store: LocalArtifactStore,
  provider: Option<Arc<dyn RemoteBuildCache>>,
  fingerprints: SingleFlight<Platform, Result<Fingerprint, FingerprintError>>,
  resolutions: SingleFlight<ArtifactName, ResolvedArtifact>,
  counters: Counters,
}

impl BuildCache {
  pub fn new(project_root: PathBuf, config: ProjectConfig, provider: Option<Arc<dyn RemoteBuildCache>>) -> Self {
    let store = LocalArtifactStore::for_project(&project_root);
    Self {
      project_root,
      config,
      store,
      provider,
      fingerprints: SingleFlight::new(),
      resolutions: SingleFlight::new(),
      counters: Counters::default(),
    }
  }

  /// Load the project's configuration and select its remote provider.
  pub fn from_project(project_root: &Path) -> Result<Self, CacheError> {
    let project_root = dunce::canonicalize(project_root).map_err(|e| FingerprintError::ProjectRootUnreadable {
      path: project_root.display().to_string(),
      message: e.to_string(),
    })?;
    let config = ProjectConfig::load(&project_root)?;
    let provider = select_provider(&project_root, &config);
    Ok(Self::new(project_root, config, provider))
  }

  pub fn project_root(&self) -> &Path {
    &self.project_root
  }

  pub fn store(&self) -> &LocalArtifactStore {
    &self.store
  }

  pub fn provider_name(&self) -> Option<&str> {
    self.provider.as_deref().map(|p| p.name())
  }

  pub fn stats(&self) -> CacheStats {
    CacheStats {
      fingerprints_computed: self.counters.fingerprints_computed.load(Ordering::Relaxed),
      remote_queries: self.counters.remote_queries.load(Ordering::Relaxed),
      downloads: self.counters.downloads.load(Ordering::Relaxed),
    }
  }

  /// Fingerprint `platform`, sharing the walk with concurrent callers.
  pub async fn fingerprint(&self, platform: Platform) -> Result<Fingerprint, FingerprintError> {
    self
      .fingerprints
      .run(platform, || async {
        self.counters.fingerprints_computed.fetch_add(1, Ordering::Relaxed);
        let options = FingerprintOptions::from_config(&self.config, platform);
        compute_fingerprint_async(self.project_root.clone(), platform, options).await
      })
      .await
  }

  /// Decide whether a build can be satisfied from cache.
  ///
  /// The local store is always consulted before any network call. On a remote
  /// hit the artifact is downloaded into the local store before returning.
  pub async fn resolve(&self, request: &BuildRequest) -> Result<Resolution, FingerprintError> {
    let fingerprint = self.fingerprint(request.platform).await?;
    let name = format_artifact_name(request.platform, &request.mode, &fingerprint.hash);
    debug!(artifact = %name, "fingerprinted");

    let (outcome, artifact) = self.resolutions.run(name.clone(), || self.resolve_name(&name)).await;

    Ok(Resolution {
      outcome,
      name,
      artifact,
      fingerprint,
    })
  }

  async fn resolve_name(&self, name: &ArtifactName) -> ResolvedArtifact {
    if let Some(local) = self.store.lookup(name) {
      info!(artifact = %name, path = ?local.path, "local cache hit");
      return (Outcome::LocalHit, Some(local));
    }

    let Some(provider) = self.provider.as_deref() else {
      info!(artifact = %name, "cache miss, no remote provider");
      return (Outcome::Miss, None);
    };

    debug!(artifact = %name, provider = provider.name(), "checking remote cache");
    self.counters.remote_queries.fetch_add(1, Ordering::Relaxed);
    let remote = match provider.query(name).await {
      Ok(Some(remote)) => remote,
      Ok(None) => {
        info!(artifact = %name, provider = provider.name(), "cache miss");
        return (Outcome::Miss, None);
      }
      Err(e) => {
        warn!(artifact = %name, provider = provider.name(), error = %e, "remote cache query failed, treating as miss");
        return (Outcome::Miss, None);
      }
    };

    self.counters.downloads.fetch_add(1, Ordering::Relaxed);
    match provider.download(&remote, &self.store).await {
      Ok(local) => {
        info!(artifact = %name, path = ?local.path, "remote cache hit");
        (Outcome::RemoteHit, Some(local))
      }
      Err(e) => {
        warn!(artifact = %name, provider = provider.name(), error = %e, "remote artifact download failed, treating as miss");
        (Outcome::Miss, None)
      }
    }
  }

  /// Record a freshly built output under the request's artifact name.
  ///
  /// The output is copied into the local store (an existing artifact with the
  /// same name is kept) and offered to the remote provider. Remote failures
  /// are reported in [`PublishReport::remote`], never as an error.
  pub async fn publish(&self, request: &BuildRequest, built_output: &Path) -> Result<PublishReport, CacheError> {
    let fingerprint = self.fingerprint(request.platform).await?;
    let name = format_artifact_name(request.platform, &request.mode, &fingerprint.hash);

    let store = self.store.clone();
    let import_name = name.clone();
    let source = built_output.to_path_buf();
    let local = tokio::task::spawn_blocking(move || store.import(&import_name, &source))
      .await
      .map_err(|e| CacheError::Task(e.to_string()))??;

    let remote = match self.provider.as_deref() {
      None => RemotePublish::NoProvider,
      Some(provider) => match provider.publish(&local).await {
        Ok(outcome) => {
          debug!(artifact = %name, provider = provider.name(), ?outcome, "publish finished");
          outcome.into()
        }
        Err(e) => {
          warn!(artifact = %name, provider = provider.name(), error = %e, "remote publish failed");
          RemotePublish::Failed { message: e.to_string() }
        }
      },
    };

    Ok(PublishReport { local, remote })
  }
}

/// One-shot resolution for a project: load config, select the provider, resolve.
pub async fn resolve_build_artifact(
  project_root: &Path,
  platform: Platform,
  mode: &str,
) -> Result<Resolution, CacheError> {
  let request = BuildRequest::new(platform, mode)?;
  let cache = BuildCache::from_project(project_root)?;
  Ok(cache.resolve(&request).await?)
}
