//! Terminal output for the CLI.
//!
//! Status lines go to stdout (errors and warnings to stderr) with a leading
//! symbol, colored only when the stream supports it.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
  pub const ARROW: &str = "→";
  pub const ADD: &str = "+";
  pub const MODIFY: &str = "~";
  pub const REMOVE: &str = "-";
}

/// First 12 characters of a hash, for display.
pub fn truncate_hash(hash: &str) -> &str {
  hash.get(..12).unwrap_or(hash)
}

pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];

  if bytes < 1024 {
    return format!("{} B", bytes);
  }
  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit + 1 < UNITS.len() {
    value /= 1024.0;
    unit += 1;
  }
  format!("{:.1} {}", value, UNITS[unit])
}

pub fn format_duration(duration: Duration) -> String {
  match duration.as_secs() {
    0 => format!("{}ms", duration.as_millis()),
    1..60 => format!("{:.2}s", duration.as_secs_f64()),
    secs => format!("{}m {}s", secs / 60, secs % 60),
  }
}

/// Total size of the regular files under `path`; 0 if it does not exist.
pub fn dir_size(path: &Path) -> u64 {
  let Ok(entries) = std::fs::read_dir(path) else {
    return 0;
  };

  entries
    .flatten()
    .map(|entry| match entry.file_type() {
      Ok(t) if t.is_file() => entry.metadata().map(|m| m.len()).unwrap_or(0),
      Ok(t) if t.is_dir() => dir_size(&entry.path()),
      _ => 0,
    })
    .sum()
}

pub fn print_success(message: &str) {
  println!("{} {}", symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()), message);
}

pub fn print_info(message: &str) {
  println!("{} {}", symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()), message);
}

pub fn print_warning(message: &str) {
  let line = format!("{} {}", symbols::WARNING, message);
  eprintln!("{}", line.if_supports_color(Stream::Stderr, |s| s.yellow()));
}

pub fn print_error(message: &str) {
  let line = format!("{} {}", symbols::ERROR, message);
  eprintln!("{}", line.if_supports_color(Stream::Stderr, |s| s.red()));
}

/// Indented `label: value` line.
pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
