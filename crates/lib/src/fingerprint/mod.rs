//! Fingerprint engine.
//!
//! Walks the platform-relevant native sources and build configuration of a
//! project and produces a [`Fingerprint`]: a content hash plus the ordered
//! manifest of everything that contributed to it.
//!
//! Hashing is content-based and never writes to the project tree.

mod diff;
mod sources;
mod types;

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::ProjectConfig;
use crate::platform::Platform;

use sources::SourceCollector;

pub use diff::{SourceChange, diff_fingerprints};
pub use types::{Fingerprint, FingerprintError, FingerprintOptions, SourceEntry, SourceType};

impl FingerprintOptions {
  /// Options for `platform` as configured in the project's config file.
  pub fn from_config(config: &ProjectConfig, platform: Platform) -> Self {
    Self {
      extra_sources: config.fingerprint.extra_sources.clone(),
      ignore_paths: config.fingerprint.ignore_paths.clone(),
      build_settings: config.platform_settings(platform).cloned(),
    }
  }
}

/// Compute the fingerprint of a project's native inputs for `platform`.
///
/// # Errors
///
/// - [`FingerprintError::ProjectRootUnreadable`] if `project_root` is missing or
///   not a readable directory
/// - [`FingerprintError::ReadSource`] / [`FingerprintError::Manifest`] if a
///   contributing source cannot be read or parsed
/// - [`FingerprintError::InvalidIgnorePattern`] for a malformed ignore glob
pub fn compute_fingerprint(
  project_root: &Path,
  platform: Platform,
  options: &FingerprintOptions,
) -> Result<Fingerprint, FingerprintError> {
  check_project_root(project_root)?;

  debug!(root = %project_root.display(), %platform, "computing fingerprint");

  let collector = SourceCollector::new(project_root, platform, &options.ignore_paths)?;
  let sources = collector.collect(options)?;
  let fingerprint = Fingerprint::from_sources(sources);

  info!(%platform, hash = %fingerprint.hash, sources = fingerprint.sources.len(), "fingerprint computed");
  Ok(fingerprint)
}

/// [`compute_fingerprint`] on the blocking thread pool.
pub async fn compute_fingerprint_async(
  project_root: PathBuf,
  platform: Platform,
  options: FingerprintOptions,
) -> Result<Fingerprint, FingerprintError> {
  tokio::task::spawn_blocking(move || compute_fingerprint(&project_root, platform, &options))
    .await
    .map_err(|e| FingerprintError::Task(e.to_string()))?
}

fn check_project_root(project_root: &Path) -> Result<(), FingerprintError> {
  let unreadable = |message: String| FingerprintError::ProjectRootUnreadable {
    path: project_root.display().to_string(),
    message,
  };

  let metadata = fs::metadata(project_root).map_err(|e| unreadable(e.to_string()))?;
  if !metadata.is_dir() {
    return Err(unreadable("not a directory".to_string()));
  }
  fs::read_dir(project_root).map_err(|e| unreadable(e.to_string()))?;
  Ok(())
}
