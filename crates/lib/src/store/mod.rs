//! Local artifact store.
//!
//! Artifacts live at `<project>/.rnef/cache/remote-build/<artifact-name>/`.
//! The store root is shared by every process working on the same checkout, so
//! writes never touch a final path incrementally: content is assembled in a
//! staging directory inside the store root and renamed into place.
//!
//! # Storage Layout
//!
//! ```text
//! {project}/.rnef/cache/remote-build/
//! ├── rnef-android-debug-<hash>/     # committed artifact
//! └── .staging-<name>-XXXXXX/        # in-flight write, removed on drop
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::artifact::{ArtifactName, LocalArtifact};
use crate::consts::STAGING_PREFIX;
use crate::platform::paths::remote_build_dir;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to create store directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create staging area in '{path}': {source}")]
  Stage {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to move artifact into '{path}': {source}")]
  Commit {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to copy '{path}' into the store: {message}")]
  Copy { path: PathBuf, message: String },

  #[error("build output '{0}' does not exist")]
  SourceMissing(PathBuf),
}

/// An in-progress artifact write.
///
/// Dropping it without committing removes everything written so far.
#[derive(Debug)]
pub struct Staging {
  dir: TempDir,
}

impl Staging {
  /// Directory to populate with the artifact's contents.
  pub fn path(&self) -> &Path {
    self.dir.path()
  }
}

#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
  root: PathBuf,
}

impl LocalArtifactStore {
  pub fn new(root: PathBuf) -> Self {
    Self { root }
  }

  /// The store for a project: `<project>/.rnef/cache/remote-build`.
  pub fn for_project(project_root: &Path) -> Self {
    Self::new(remote_build_dir(project_root))
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Path an artifact occupies once materialized. Does not touch the filesystem.
  pub fn resolve_local_path(&self, name: &ArtifactName) -> PathBuf {
    self.root.join(name.as_str())
  }

  pub fn exists(&self, path: &Path) -> bool {
    path.exists()
  }

  /// The committed artifact for `name`, if one exists.
  pub fn lookup(&self, name: &ArtifactName) -> Option<LocalArtifact> {
    let path = self.resolve_local_path(name);
    self.exists(&path).then(|| LocalArtifact {
      name: name.clone(),
      path,
    })
  }

  /// Committed artifact directory names, sorted. Staging entries are skipped.
  pub fn list(&self) -> Vec<String> {
    let Ok(entries) = fs::read_dir(&self.root) else {
      return Vec::new();
    };
    let mut names: Vec<String> = entries
      .flatten()
      .map(|e| e.file_name().to_string_lossy().into_owned())
      .filter(|name| !name.starts_with(STAGING_PREFIX))
      .collect();
    names.sort();
    names
  }

  /// Start writing an artifact. Creates the store root if needed.
  pub fn stage(&self, name: &ArtifactName) -> Result<Staging, StoreError> {
    fs::create_dir_all(&self.root).map_err(|source| StoreError::CreateDir {
      path: self.root.clone(),
      source,
    })?;

    let dir = tempfile::Builder::new()
      .prefix(&format!("{}{}-", STAGING_PREFIX, name))
      .tempdir_in(&self.root)
      .map_err(|source| StoreError::Stage {
        path: self.root.clone(),
        source,
      })?;

    debug!(artifact = %name, staging = ?dir.path(), "staging artifact");
    Ok(Staging { dir })
  }

  /// Atomically publish a staged artifact under its final path.
  ///
  /// If another writer already committed `name`, the staged copy is discarded
  /// and the existing artifact is returned; artifacts with the same name are
  /// interchangeable by construction.
  pub fn commit(&self, staging: Staging, name: &ArtifactName) -> Result<LocalArtifact, StoreError> {
    let path = self.resolve_local_path(name);

    if let Some(existing) = self.lookup(name) {
      debug!(artifact = %name, "artifact already committed, discarding staged copy");
      return Ok(existing);
    }

    match fs::rename(staging.path(), &path) {
      Ok(()) => {
        info!(artifact = %name, path = ?path, "artifact stored");
        Ok(LocalArtifact {
          name: name.clone(),
          path,
        })
      }
      Err(_) if self.exists(&path) => {
        debug!(artifact = %name, "lost commit race, using existing artifact");
        Ok(LocalArtifact {
          name: name.clone(),
          path,
        })
      }
      Err(source) => Err(StoreError::Commit { path, source }),
    }
  }

  /// Copy a freshly built output (file or directory) into the store.
  ///
  /// A file lands at `<artifact>/<file-name>`; a directory's contents become
  /// the artifact's contents. An existing artifact of the same name is kept.
  pub fn import(&self, name: &ArtifactName, source: &Path) -> Result<LocalArtifact, StoreError> {
    if let Some(existing) = self.lookup(name) {
      return Ok(existing);
    }

    let metadata = fs::metadata(source).map_err(|_| StoreError::SourceMissing(source.to_path_buf()))?;
    let staging = self.stage(name)?;

    if metadata.is_dir() {
      copy_tree(source, staging.path())?;
    } else {
      let file_name = source
        .file_name()
        .ok_or_else(|| StoreError::SourceMissing(source.to_path_buf()))?;
      fs::copy(source, staging.path().join(file_name)).map_err(|e| StoreError::Copy {
        path: source.to_path_buf(),
        message: e.to_string(),
      })?;
    }

    self.commit(staging, name)
  }
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), StoreError> {
  let copy_err = |path: &Path, message: String| StoreError::Copy {
    path: path.to_path_buf(),
    message,
  };

  for entry in WalkDir::new(from) {
    let entry = entry.map_err(|e| copy_err(from, e.to_string()))?;
    let rel = entry.path().strip_prefix(from).unwrap_or(entry.path());
    if rel.as_os_str().is_empty() {
      continue;
    }
    let dest = to.join(rel);

    if entry.file_type().is_dir() {
      fs::create_dir_all(&dest).map_err(|e| copy_err(entry.path(), e.to_string()))?;
    } else if entry.file_type().is_symlink() {
      let target = fs::read_link(entry.path()).map_err(|e| copy_err(entry.path(), e.to_string()))?;
      symlink(&target, &dest).map_err(|e| copy_err(entry.path(), e.to_string()))?;
    } else {
      fs::copy(entry.path(), &dest).map_err(|e| copy_err(entry.path(), e.to_string()))?;
    }
  }
  Ok(())
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path) -> io::Result<()> {
  if target.is_dir() {
    std::os::windows::fs::symlink_dir(target, link)
  } else {
    std::os::windows::fs::symlink_file(target, link)
  }
}
