//! Project-local cache locations.
//!
//! The cache lives at a fixed path under the project root so every process and
//! CI runner operating on the same checkout agrees on it without coordination.
//! None of these functions touch the filesystem.

use std::path::{Path, PathBuf};

use crate::consts::{CACHE_DIR, CONFIG_FILENAME, REMOTE_BUILD_DIR};

/// Returns `<project>/.rnef/cache`.
pub fn cache_root(project_root: &Path) -> PathBuf {
  project_root.join(CACHE_DIR)
}

/// Returns `<project>/.rnef/cache/remote-build`, the artifact store root.
pub fn remote_build_dir(project_root: &Path) -> PathBuf {
  cache_root(project_root).join(REMOTE_BUILD_DIR)
}

/// Returns the path of the optional project configuration file.
pub fn config_file(project_root: &Path) -> PathBuf {
  project_root.join(CONFIG_FILENAME)
}
