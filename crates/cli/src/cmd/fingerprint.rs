//! Fingerprint command implementation.
//!
//! Prints the native fingerprint of a project and, given a saved manifest,
//! which sources changed since.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::{OwoColorize, Stream};

use rnef_lib::config::ProjectConfig;
use rnef_lib::fingerprint::{Fingerprint, FingerprintOptions, SourceChange, compute_fingerprint, diff_fingerprints};
use rnef_lib::platform::Platform;

use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success, symbols, truncate_hash};

pub fn cmd_fingerprint(platform: Platform, project_root: &Path, compare: Option<&Path>, output: OutputFormat) -> Result<()> {
  let config = ProjectConfig::load(project_root)?;
  let options = FingerprintOptions::from_config(&config, platform);
  let fingerprint = compute_fingerprint(project_root, platform, &options)
    .with_context(|| format!("Failed to fingerprint {}", project_root.display()))?;

  let changes = match compare {
    Some(path) => {
      let previous = load_manifest(path)?;
      Some(diff_fingerprints(&previous, &fingerprint))
    }
    None => None,
  };

  if output.is_json() {
    match changes {
      Some(changes) => print_json(&serde_json::json!({ "fingerprint": fingerprint, "changes": changes }))?,
      None => print_json(&fingerprint)?,
    }
    return Ok(());
  }

  print_success(&format!("{} fingerprint: {}", platform, fingerprint.hash));
  print_stat("Sources", &fingerprint.sources.len().to_string());
  for source in &fingerprint.sources {
    println!(
      "  {} {} {} {}",
      symbols::INFO,
      source.kind.as_str().if_supports_color(Stream::Stdout, |s| s.dimmed()),
      source.id,
      truncate_hash(&source.hash).if_supports_color(Stream::Stdout, |s| s.dimmed())
    );
  }

  if let Some(changes) = changes {
    println!();
    if changes.is_empty() {
      print_info("No changes since the saved manifest");
    } else {
      println!("Changes:");
      for change in &changes {
        print_change(change);
      }
    }
  }

  Ok(())
}

fn load_manifest(path: &Path) -> Result<Fingerprint> {
  let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
  serde_json::from_str(&content).with_context(|| format!("Failed to parse fingerprint manifest {}", path.display()))
}

fn print_change(change: &SourceChange) {
  match change {
    SourceChange::Added(entry) => println!(
      "  {} {} {}",
      symbols::ADD.if_supports_color(Stream::Stdout, |s| s.green()),
      entry.kind,
      entry.id
    ),
    SourceChange::Removed(entry) => println!(
      "  {} {} {}",
      symbols::REMOVE.if_supports_color(Stream::Stdout, |s| s.red()),
      entry.kind,
      entry.id
    ),
    SourceChange::Changed { before, after } => println!(
      "  {} {} {} ({} {} {})",
      symbols::MODIFY.if_supports_color(Stream::Stdout, |s| s.yellow()),
      after.kind,
      after.id,
      truncate_hash(&before.hash),
      symbols::ARROW,
      truncate_hash(&after.hash)
    ),
  }
}
