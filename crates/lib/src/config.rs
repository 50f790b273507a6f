//! Project configuration (`rnef.config.json`).
//!
//! The file is optional; a missing file yields the defaults.
//!
//! # Format
//!
//! ```json
//! {
//!   "remoteCacheProvider": "auto",
//!   "fingerprint": {
//!     "extraSources": ["patches", "scripts/native-env.sh"],
//!     "ignorePaths": ["android/app/src/debug/**"]
//!   },
//!   "platforms": {
//!     "android": { "signingConfig": "release", "flavors": ["prod"] },
//!     "ios": { "codeSignIdentity": "Apple Distribution" }
//!   }
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::Platform;
use crate::platform::paths::config_file;

/// Which remote cache provider to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderSelection {
  /// Pick the provider matching the detected CI environment.
  #[default]
  Auto,
  /// Always use the GitHub Actions artifact provider.
  GithubActions,
  /// Never consult a remote provider.
  None,
}

impl ProviderSelection {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Auto => "auto",
      Self::GithubActions => "github-actions",
      Self::None => "none",
    }
  }
}

/// Fingerprint tuning shared by every platform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FingerprintConfig {
  /// Project-relative files or directories that contribute to every fingerprint.
  pub extra_sources: Vec<String>,
  /// Glob patterns (project-relative) removed from the contributing set.
  pub ignore_paths: Vec<String>,
}

/// Build-affecting settings per platform, hashed verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformsConfig {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub android: Option<serde_json::Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub ios: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectConfig {
  pub remote_cache_provider: ProviderSelection,
  pub fingerprint: FingerprintConfig,
  pub platforms: PlatformsConfig,
}

#[derive(Debug, Error)]
pub enum ProjectConfigError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

impl ProjectConfig {
  /// Load the configuration for a project.
  ///
  /// Returns the defaults if the file does not exist.
  pub fn load(project_root: &Path) -> Result<Self, ProjectConfigError> {
    let path = config_file(project_root);

    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => return Err(ProjectConfigError::Read { path, source }),
    };

    serde_json::from_str(&content).map_err(|source| ProjectConfigError::Parse { path, source })
  }

  /// Build settings for `platform`, if any were configured.
  pub fn platform_settings(&self, platform: Platform) -> Option<&serde_json::Value> {
    match platform {
      Platform::Android => self.platforms.android.as_ref(),
      Platform::Ios => self.platforms.ios.as_ref(),
    }
  }
}
