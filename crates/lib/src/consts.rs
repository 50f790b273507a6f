//! Well-known names shared across the crate.
//!
//! Several of these are part of an on-disk or remote contract: changing
//! `ARTIFACT_PREFIX`, `CACHE_DIR`, or `REMOTE_BUILD_DIR` invalidates every
//! cached artifact on every machine.

pub const APP_NAME: &str = "rnef";

/// Prefix of every artifact name (`rnef-{platform}-{mode}-{hash}`).
pub const ARTIFACT_PREFIX: &str = "rnef";

/// Project-relative directory holding all persistent cache state.
pub const CACHE_DIR: &str = ".rnef/cache";

/// Subdirectory of the cache root holding resolved build artifacts.
pub const REMOTE_BUILD_DIR: &str = "remote-build";

/// Optional project configuration file at the project root.
pub const CONFIG_FILENAME: &str = "rnef.config.json";

/// Directory whose presence at the project root marks a GitHub Actions project.
pub const GITHUB_CI_MARKER: &str = ".github";

/// Bearer token used for the GitHub artifact API.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// `owner/repo` fallback when no VCS remote can be read.
pub const GITHUB_REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";

/// Override for the GitHub API base URL (GitHub Enterprise, tests).
pub const GITHUB_API_URL_ENV: &str = "GITHUB_API_URL";

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Prefix of staging entries inside the store; never a valid artifact name.
pub const STAGING_PREFIX: &str = ".staging-";
