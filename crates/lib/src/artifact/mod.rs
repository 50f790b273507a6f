//! Artifact naming and artifact handles.
//!
//! The name format `rnef-{platform}-{mode}-{hash}` is shared with every
//! machine and CI run that reads or writes the cache. Changing it orphans all
//! previously published artifacts.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::ARTIFACT_PREFIX;
use crate::platform::Platform;

/// Canonical identifier of a built artifact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactName(String);

impl ArtifactName {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ArtifactName {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl AsRef<str> for ArtifactName {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModeError {
  #[error("build mode must not be empty")]
  Empty,

  #[error("invalid build mode '{0}': only letters, digits, '.', '_', '+' and '-' are allowed")]
  InvalidCharacters(String),
}

/// Check that `mode` can be embedded in an artifact name.
///
/// The name doubles as a directory under the store root and as a GitHub
/// artifact name, so separators and anything GitHub rejects are refused.
pub fn validate_mode(mode: &str) -> Result<(), ModeError> {
  if mode.is_empty() {
    return Err(ModeError::Empty);
  }
  let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-');
  if !mode.chars().all(allowed) {
    return Err(ModeError::InvalidCharacters(mode.to_string()));
  }
  Ok(())
}

/// Derive the artifact name for a build.
///
/// Build-equivalent requests (same platform, mode, and fingerprint hash)
/// always produce the same name. `mode` must pass [`validate_mode`] and `hash`
/// must be non-empty; that is checked by callers, not here.
pub fn format_artifact_name(platform: Platform, mode: &str, hash: &str) -> ArtifactName {
  debug_assert!(!mode.is_empty() && !hash.is_empty(), "mode and hash must be non-empty");
  ArtifactName(format!("{}-{}-{}-{}", ARTIFACT_PREFIX, platform, mode, hash))
}

/// An artifact materialized in the local store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalArtifact {
  pub name: ArtifactName,
  pub path: PathBuf,
}

/// A published artifact located by a remote provider.
///
/// Only lives for one query/download cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArtifact {
  pub name: ArtifactName,
  pub download_url: String,
  pub size_in_bytes: Option<u64>,
}
