//! Store command implementation.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use rnef_lib::cache::{BuildCache, BuildRequest, RemotePublish};
use rnef_lib::platform::Platform;

use crate::output::{OutputFormat, format_duration, print_json, print_stat, print_success, print_warning};

/// Copy `built_path` into the local store under the request's artifact name
/// and offer it to the remote provider.
pub fn cmd_store(
  platform: Platform,
  mode: &str,
  project_root: &Path,
  built_path: &Path,
  output: OutputFormat,
) -> Result<()> {
  let start = Instant::now();

  if !built_path.exists() {
    bail!("Built output not found: {}", built_path.display());
  }

  let cache = BuildCache::from_project(project_root)?;
  let request = BuildRequest::new(platform, mode)?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(cache.publish(&request, built_path))
    .context("Failed to store artifact")?;

  if output.is_json() {
    print_json(&report)?;
    return Ok(());
  }

  print_success(&format!("Stored {}", report.local.name));
  print_stat("Path", &report.local.path.display().to_string());
  match &report.remote {
    RemotePublish::NoProvider => print_stat("Remote", "none"),
    RemotePublish::Published => print_stat("Remote", "published"),
    RemotePublish::AlreadyPresent => print_stat("Remote", "already published"),
    RemotePublish::Unsupported => print_stat("Remote", "not accepted by provider"),
    RemotePublish::Failed { message } => print_warning(&format!("Remote publish failed: {}", message)),
  }
  print_stat("Duration", &format_duration(start.elapsed()));

  Ok(())
}
