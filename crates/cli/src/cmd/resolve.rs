//! Resolve command implementation.
//!
//! Every outcome, including a miss, exits successfully: the caller decides
//! whether to build.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use rnef_lib::cache::{BuildCache, BuildRequest, Outcome};
use rnef_lib::platform::Platform;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

pub fn cmd_resolve(platform: Platform, mode: &str, project_root: &Path, output: OutputFormat) -> Result<()> {
  let cache = BuildCache::from_project(project_root)?;
  let request = BuildRequest::new(platform, mode)?;
  debug!(root = %cache.project_root().display(), provider = ?cache.provider_name(), "resolving");

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let resolution = rt.block_on(cache.resolve(&request)).context("Resolve failed")?;

  if output.is_json() {
    print_json(&resolution)?;
    return Ok(());
  }

  match (&resolution.outcome, &resolution.artifact) {
    (Outcome::LocalHit | Outcome::RemoteHit, Some(artifact)) => {
      print_success(&format!("Cache {}: {}", resolution.outcome.as_str(), resolution.name));
      print_stat("Path", &artifact.path.display().to_string());
    }
    _ => {
      print_info(&format!("Cache miss: {}", resolution.name));
      print_stat("Store path", &cache.store().resolve_local_path(&resolution.name).display().to_string());
    }
  }
  print_stat("Fingerprint", &resolution.fingerprint.hash);
  if let Some(provider) = cache.provider_name() {
    print_stat("Remote", provider);
  }

  Ok(())
}
