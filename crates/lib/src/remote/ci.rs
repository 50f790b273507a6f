//! CI environment detection and provider selection.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{ProjectConfig, ProviderSelection};
use crate::consts::GITHUB_CI_MARKER;

use super::RemoteBuildCache;
use super::github::GitHubActionsCache;

/// CI systems with a matching remote cache provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiProvider {
  GitHubActions,
}

impl CiProvider {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::GitHubActions => "github-actions",
    }
  }
}

/// Detect the CI system a project is set up for from its tree alone.
pub fn detect_ci(project_root: &Path) -> Option<CiProvider> {
  if project_root.join(GITHUB_CI_MARKER).is_dir() {
    return Some(CiProvider::GitHubActions);
  }
  None
}

/// Choose the remote provider for a project.
///
/// Returns `None` when no provider applies or the chosen one is unavailable
/// (no credentials, no repository identity); callers then cache locally only.
pub fn select_provider(project_root: &Path, config: &ProjectConfig) -> Option<Arc<dyn RemoteBuildCache>> {
  let ci = match config.remote_cache_provider {
    ProviderSelection::None => {
      debug!("remote cache disabled by configuration");
      return None;
    }
    ProviderSelection::GithubActions => CiProvider::GitHubActions,
    ProviderSelection::Auto => match detect_ci(project_root) {
      Some(ci) => ci,
      None => {
        debug!("no CI configuration detected, remote cache disabled");
        return None;
      }
    },
  };

  match ci {
    CiProvider::GitHubActions => match GitHubActionsCache::from_environment(project_root) {
      Ok(Some(provider)) => {
        info!(provider = ci.as_str(), repository = %provider.repository(), "remote cache enabled");
        Some(Arc::new(provider))
      }
      Ok(None) => {
        info!(provider = ci.as_str(), "no access token available, remote cache unavailable");
        None
      }
      Err(e) => {
        warn!(provider = ci.as_str(), error = %e, "remote cache misconfigured, continuing without it");
        None
      }
    },
  }
}
