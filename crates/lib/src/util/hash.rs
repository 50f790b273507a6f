//! Content hashing used by the fingerprint engine.
//!
//! All hashes are content-based. Timestamps, permissions, and ownership never
//! contribute, so two checkouts of the same tree hash identically.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use walkdir::WalkDir;

/// Lowercase hex SHA-256 digest (64 characters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub String);

impl ContentHash {
  fn from_hasher(hasher: Sha256) -> Self {
    Self(hex::encode(hasher.finalize()))
  }
}

impl fmt::Display for ContentHash {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Debug, Clone, Error)]
pub enum DirHashError {
  #[error("failed to walk directory: {message}")]
  WalkDir { message: String },

  #[error("failed to read file {path}: {message}")]
  ReadFile { path: String, message: String },

  #[error("failed to read symlink {path}: {message}")]
  ReadSymlink { path: String, message: String },
}

/// Render a relative path with `/` separators regardless of host OS.
pub fn portable_path(path: &Path) -> String {
  let parts: Vec<_> = path
    .components()
    .filter_map(|c| match c {
      Component::Normal(part) => Some(part.to_string_lossy()),
      _ => None,
    })
    .collect();
  parts.join("/")
}

/// Hash a directory tree by content.
///
/// Each regular file contributes `F:<path>:<content hash>` and each symlink
/// `L:<path>:<target hash>`, with paths relative to `root` in portable form.
/// Lines are sorted before hashing. Directories contribute nothing on their
/// own, so an empty directory (absent from a fresh clone) never moves the hash.
///
/// `exclude` receives the same relative path; returning `true` prunes the
/// entry and everything below it.
pub fn hash_directory<F>(root: &Path, exclude: F) -> Result<ContentHash, DirHashError>
where
  F: Fn(&str) -> bool,
{
  let relative = |p: &Path| portable_path(p.strip_prefix(root).unwrap_or(p));

  let walker = WalkDir::new(root)
    .min_depth(1)
    .into_iter()
    .filter_entry(|e| !exclude(&relative(e.path())));

  let mut lines = Vec::new();
  for entry in walker {
    let entry = entry.map_err(|e| DirHashError::WalkDir { message: e.to_string() })?;
    let rel = relative(entry.path());
    let file_type = entry.file_type();

    if file_type.is_file() {
      lines.push(format!("F:{}:{}", rel, hash_file(entry.path())?));
    } else if file_type.is_symlink() {
      let target = fs::read_link(entry.path()).map_err(|e| DirHashError::ReadSymlink {
        path: entry.path().display().to_string(),
        message: e.to_string(),
      })?;
      lines.push(format!("L:{}:{}", rel, hash_bytes(portable_path(&target).as_bytes())));
    }
    // directories and special files: skipped
  }

  lines.sort();

  let mut hasher = Sha256::new();
  for line in &lines {
    hasher.update(line.as_bytes());
    hasher.update(b"\n");
  }
  Ok(ContentHash::from_hasher(hasher))
}

/// Hash a file's contents, streaming.
pub fn hash_file(path: &Path) -> Result<ContentHash, DirHashError> {
  let read_err = |e: io::Error| DirHashError::ReadFile {
    path: path.display().to_string(),
    message: e.to_string(),
  };

  let mut file = fs::File::open(path).map_err(read_err)?;
  let mut hasher = Sha256::new();
  io::copy(&mut file, &mut hasher).map_err(read_err)?;
  Ok(ContentHash::from_hasher(hasher))
}

pub fn hash_bytes(data: &[u8]) -> ContentHash {
  ContentHash(hex::encode(Sha256::digest(data)))
}

/// Hash a serializable value through its canonical (JCS, RFC 8785) JSON form.
///
/// Object key order in the source never affects the result.
pub fn hash_json<T: Serialize>(value: &T) -> Result<ContentHash, serde_json::Error> {
  let canonical = serde_json_canonicalizer::to_vec(value)?;
  Ok(hash_bytes(&canonical))
}
