use std::path::Path;

use anyhow::Result;

use rnef_lib::config::ProjectConfig;
use rnef_lib::consts::GITHUB_TOKEN_ENV;
use rnef_lib::platform::paths::{cache_root, remote_build_dir};
use rnef_lib::remote::detect_ci;
use rnef_lib::store::LocalArtifactStore;

use crate::output::{OutputFormat, dir_size, format_bytes, print_json, print_stat, symbols};

pub fn cmd_info(project_root: &Path, verbose: bool, output: OutputFormat) -> Result<()> {
  let project_root = &dunce::canonicalize(project_root).unwrap_or_else(|_| project_root.to_path_buf());
  let config = ProjectConfig::load(project_root)?;
  let store = LocalArtifactStore::for_project(project_root);
  let artifacts = store.list();
  let ci = detect_ci(project_root).map(|ci| ci.as_str());
  let token_present = std::env::var(GITHUB_TOKEN_ENV).is_ok_and(|t| !t.is_empty());
  let store_bytes = dir_size(store.root());

  if output.is_json() {
    print_json(&serde_json::json!({
      "cache_root": cache_root(project_root),
      "artifact_dir": remote_build_dir(project_root),
      "remote_cache_provider": config.remote_cache_provider,
      "ci": ci,
      "token_present": token_present,
      "artifacts": artifacts,
      "store_usage_bytes": store_bytes,
    }))?;
    return Ok(());
  }

  println!("Cache:");
  print_stat("Root", &cache_root(project_root).display().to_string());
  print_stat("Artifacts", &artifacts.len().to_string());
  print_stat("Usage", &format_bytes(store_bytes));
  println!();
  println!("Remote:");
  print_stat("Provider", config.remote_cache_provider.as_str());
  print_stat("Detected CI", ci.unwrap_or("none"));
  print_stat("Token", if token_present { "present" } else { "missing" });

  if verbose && !artifacts.is_empty() {
    println!();
    println!("Stored artifacts:");
    for name in &artifacts {
      println!("  {} {}", symbols::INFO, name);
    }
  }

  Ok(())
}
