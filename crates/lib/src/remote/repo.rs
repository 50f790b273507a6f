//! Repository identity used to scope remote artifact lookups.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use gix::remote::Direction;
use regex_lite::Regex;
use tracing::debug;

use crate::consts::GITHUB_REPOSITORY_ENV;

use super::ConfigurationError;

/// `git@host:owner/repo(.git)` or `https://host/owner/repo(.git)`.
///
/// The repository segment is non-greedy so a trailing `.git` is stripped.
static REMOTE_URL: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?:git@|https://|ssh://git@)[^:/]+[:/]([^/]+)/([^/]+?)(?:\.git)?$").expect("remote URL pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryIdentity {
  pub owner: String,
  pub repository: String,
}

impl fmt::Display for RepositoryIdentity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.owner, self.repository)
  }
}

impl RepositoryIdentity {
  /// Parse a VCS remote URL.
  pub fn parse(url: &str) -> Result<Self, ConfigurationError> {
    let captures = REMOTE_URL
      .captures(url.trim())
      .ok_or_else(|| ConfigurationError::MalformedRemoteUrl(url.to_string()))?;

    Ok(Self {
      owner: captures[1].to_string(),
      repository: captures[2].to_string(),
    })
  }

  /// Parse the `owner/repo` form used by `GITHUB_REPOSITORY`.
  pub fn parse_slug(slug: &str) -> Result<Self, ConfigurationError> {
    match slug.trim().split_once('/') {
      Some((owner, repository)) if !owner.is_empty() && !repository.is_empty() && !repository.contains('/') => {
        Ok(Self {
          owner: owner.to_string(),
          repository: repository.to_string(),
        })
      }
      _ => Err(ConfigurationError::MalformedRemoteUrl(slug.to_string())),
    }
  }
}

/// Identity of the repository checked out at `project_root`.
///
/// Reads the default fetch remote (usually `origin`); without one, falls back
/// to `GITHUB_REPOSITORY`.
pub fn discover(project_root: &Path) -> Result<RepositoryIdentity, ConfigurationError> {
  if let Some(url) = remote_url(project_root) {
    debug!(url = %url, "using git remote for repository identity");
    return RepositoryIdentity::parse(&url);
  }

  match std::env::var(GITHUB_REPOSITORY_ENV) {
    Ok(slug) if !slug.trim().is_empty() => RepositoryIdentity::parse_slug(&slug),
    _ => Err(ConfigurationError::MissingRepositoryIdentity(GITHUB_REPOSITORY_ENV)),
  }
}

fn remote_url(project_root: &Path) -> Option<String> {
  let repo = gix::discover(project_root).ok()?;
  let remote = repo.find_default_remote(Direction::Fetch)?.ok()?;
  let url = remote.url(Direction::Fetch)?;
  Some(url.to_bstring().to_string())
}
