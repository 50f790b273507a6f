//! Fingerprint data model.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::util::hash::DirHashError;

/// Kind of input that contributed to a fingerprint.
///
/// The declaration order is the canonical sort order of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
  File,
  Dir,
  Contents,
  Config,
}

impl SourceType {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::File => "file",
      Self::Dir => "dir",
      Self::Contents => "contents",
      Self::Config => "config",
    }
  }
}

impl fmt::Display for SourceType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// One contributing input of a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceEntry {
  #[serde(rename = "type")]
  pub kind: SourceType,
  /// Stable identifier: a project-relative path for `file`/`dir`, a name otherwise.
  pub id: String,
  /// Project-relative path (portable `/` separators) for filesystem sources.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub file_path: Option<String>,
  pub hash: String,
}

impl SourceEntry {
  pub fn file(path: &str, hash: String) -> Self {
    Self {
      kind: SourceType::File,
      id: path.to_string(),
      file_path: Some(path.to_string()),
      hash,
    }
  }

  pub fn dir(path: &str, hash: String) -> Self {
    Self {
      kind: SourceType::Dir,
      id: path.to_string(),
      file_path: Some(path.to_string()),
      hash,
    }
  }

  pub fn contents(id: &str, hash: String) -> Self {
    Self {
      kind: SourceType::Contents,
      id: id.to_string(),
      file_path: None,
      hash,
    }
  }

  pub fn config(id: &str, hash: String) -> Self {
    Self {
      kind: SourceType::Config,
      id: id.to_string(),
      file_path: None,
      hash,
    }
  }

  /// Canonical manifest sort key.
  pub fn key(&self) -> (SourceType, &str) {
    (self.kind, &self.id)
  }
}

/// Deterministic summary of every build-affecting native input for a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fingerprint {
  pub hash: String,
  pub sources: Vec<SourceEntry>,
}

impl Fingerprint {
  /// Build a fingerprint from unordered sources.
  ///
  /// Sources are sorted by `(type, id)`; the hash is SHA-256 over one
  /// `type:id:hash` line per source.
  pub fn from_sources(mut sources: Vec<SourceEntry>) -> Self {
    sources.sort_by(|a, b| a.key().cmp(&b.key()));
    sources.dedup_by(|a, b| a.key() == b.key());

    let mut hasher = Sha256::new();
    for source in &sources {
      hasher.update(source.kind.as_str().as_bytes());
      hasher.update(b":");
      hasher.update(source.id.as_bytes());
      hasher.update(b":");
      hasher.update(source.hash.as_bytes());
      hasher.update(b"\n");
    }

    Self {
      hash: hex::encode(hasher.finalize()),
      sources,
    }
  }

  /// Pretty-printed manifest, byte-identical for identical fingerprints.
  pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}

/// Tuning for a single fingerprint computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FingerprintOptions {
  /// Project-relative files or directories that also contribute.
  pub extra_sources: Vec<String>,
  /// Glob patterns matched against project-relative paths; matches never contribute.
  pub ignore_paths: Vec<String>,
  /// Platform build settings (signing, flavors, flags), hashed as a `config` source.
  pub build_settings: Option<serde_json::Value>,
}

/// Errors that prevent a fingerprint (and therefore a cache key) from being formed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FingerprintError {
  #[error("project root '{path}' is not readable: {message}")]
  ProjectRootUnreadable { path: String, message: String },

  #[error("unsupported platform '{0}' (expected 'android' or 'ios')")]
  UnsupportedPlatform(String),

  #[error("failed to read source '{id}': {message}")]
  ReadSource { id: String, message: String },

  #[error("failed to parse '{path}': {message}")]
  Manifest { path: String, message: String },

  #[error("invalid ignore pattern '{pattern}': {message}")]
  InvalidIgnorePattern { pattern: String, message: String },

  #[error("fingerprint task failed: {0}")]
  Task(String),
}

impl FingerprintError {
  pub(crate) fn read_source(id: &str, err: DirHashError) -> Self {
    Self::ReadSource {
      id: id.to_string(),
      message: err.to_string(),
    }
  }
}
