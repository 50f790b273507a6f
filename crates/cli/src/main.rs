mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rnef_lib::{ModeError, Platform, validate_mode};

use crate::output::{OutputFormat, print_error};

/// rnef - native build cache for React Native projects
#[derive(Parser)]
#[command(name = "rnef")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  /// React Native project root
  #[arg(long, global = true, default_value = ".")]
  project_root: PathBuf,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compute the native fingerprint of a project
  Fingerprint {
    /// Target platform (android, ios)
    #[arg(short, long)]
    platform: Platform,

    /// Print the full source manifest as JSON
    #[arg(long)]
    json: bool,

    /// Explain differences against a previously saved manifest
    #[arg(long, value_name = "FILE")]
    compare: Option<PathBuf>,
  },

  /// Look up a cached build artifact, locally then remotely
  Resolve {
    /// Target platform (android, ios)
    #[arg(short, long)]
    platform: Platform,

    /// Build mode, variant, or configuration (e.g. debug, Release)
    #[arg(short, long, value_parser = parse_mode)]
    mode: String,
  },

  /// Store a freshly built output in the cache
  Store {
    /// Target platform (android, ios)
    #[arg(short, long)]
    platform: Platform,

    /// Build mode, variant, or configuration (e.g. debug, Release)
    #[arg(short, long, value_parser = parse_mode)]
    mode: String,

    /// Built file or directory to store
    built_path: PathBuf,
  },

  /// Show cache location, remote provider, and stored artifacts
  Info,
}

fn parse_mode(mode: &str) -> Result<String, ModeError> {
  validate_mode(mode)?;
  Ok(mode.to_string())
}

fn main() {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  if let Err(e) = run(cli) {
    print_error(&format!("{:#}", e));
    std::process::exit(1);
  }
}

fn run(cli: Cli) -> Result<()> {
  let output = cli.output;
  let project_root = cli.project_root;
  match cli.command {
    Commands::Fingerprint {
      platform,
      json,
      compare,
    } => {
      let output = if json { OutputFormat::Json } else { output };
      cmd::cmd_fingerprint(platform, &project_root, compare.as_deref(), output)
    }
    Commands::Resolve { platform, mode } => cmd::cmd_resolve(platform, &mode, &project_root, output),
    Commands::Store {
      platform,
      mode,
      built_path,
    } => cmd::cmd_store(platform, &mode, &project_root, &built_path, output),
    Commands::Info => cmd::cmd_info(&project_root, cli.verbose, output),
  }
}
