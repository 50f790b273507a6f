//! Collection of the contributing source set for one platform.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use tracing::debug;

use crate::platform::Platform;
use crate::util::hash::{hash_directory, hash_file, hash_json};

use super::types::{FingerprintError, FingerprintOptions, SourceEntry};

/// Root files that affect native dependency resolution on every platform.
const SHARED_ROOT_FILES: &[&str] = &["react-native.config.js"];

/// Root files that affect the iOS native dependency toolchain.
const IOS_ROOT_FILES: &[&str] = &["Gemfile", "Gemfile.lock"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PackageJson {
  version: Option<String>,
  dependencies: BTreeMap<String, String>,
  dev_dependencies: BTreeMap<String, String>,
}

pub(crate) struct SourceCollector<'a> {
  root: &'a Path,
  platform: Platform,
  ignore: GlobSet,
}

impl<'a> SourceCollector<'a> {
  pub fn new(root: &'a Path, platform: Platform, ignore_paths: &[String]) -> Result<Self, FingerprintError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in ignore_paths {
      let glob = Glob::new(pattern).map_err(|e| FingerprintError::InvalidIgnorePattern {
        pattern: pattern.clone(),
        message: e.to_string(),
      })?;
      builder.add(glob);
    }
    let ignore = builder.build().map_err(|e| FingerprintError::InvalidIgnorePattern {
      pattern: ignore_paths.join(", "),
      message: e.to_string(),
    })?;

    Ok(Self { root, platform, ignore })
  }

  /// Gather every source for the platform. Order is irrelevant; the caller sorts.
  pub fn collect(&self, options: &FingerprintOptions) -> Result<Vec<SourceEntry>, FingerprintError> {
    let mut sources = Vec::new();

    let native_dir = self.platform.native_dir();
    if let Some(entry) = self.path_source(native_dir)? {
      sources.push(entry);
    }

    let root_files = match self.platform {
      Platform::Android => SHARED_ROOT_FILES.to_vec(),
      Platform::Ios => [SHARED_ROOT_FILES, IOS_ROOT_FILES].concat(),
    };
    for file in root_files {
      if let Some(entry) = self.path_source(file)? {
        sources.push(entry);
      }
    }

    sources.extend(self.native_module_sources()?);

    for extra in &options.extra_sources {
      match self.path_source(extra)? {
        Some(entry) => sources.push(entry),
        None => debug!(source = %extra, "extra source not found, skipping"),
      }
    }

    if let Some(settings) = &options.build_settings {
      let id = format!("config:{}", self.platform);
      let hash = hash_json(settings).map_err(|e| FingerprintError::ReadSource {
        id: id.clone(),
        message: e.to_string(),
      })?;
      sources.push(SourceEntry::config(&id, hash.0));
    }

    Ok(sources)
  }

  /// Hash a project-relative file or directory.
  ///
  /// Returns `None` if the path does not exist or is ignored.
  fn path_source(&self, rel: &str) -> Result<Option<SourceEntry>, FingerprintError> {
    let rel = rel.trim_end_matches('/');
    if self.is_excluded(rel) {
      debug!(source = %rel, "source ignored");
      return Ok(None);
    }

    let path = self.root.join(rel);
    let metadata = match fs::metadata(&path) {
      Ok(metadata) => metadata,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(e) => {
        return Err(FingerprintError::ReadSource {
          id: rel.to_string(),
          message: e.to_string(),
        });
      }
    };

    if metadata.is_dir() {
      let hash = hash_directory(&path, |inner| self.is_excluded(&format!("{}/{}", rel, inner)))
        .map_err(|e| FingerprintError::read_source(rel, e))?;
      Ok(Some(SourceEntry::dir(rel, hash.0)))
    } else {
      let hash = hash_file(&path).map_err(|e| FingerprintError::read_source(rel, e))?;
      Ok(Some(SourceEntry::file(rel, hash.0)))
    }
  }

  /// Sources for every installed dependency that ships native code for the platform.
  ///
  /// Adds one `dir` entry per linked module, covering the whole package so
  /// shared `cpp/` or `apple/` sources count, and a single `contents` entry
  /// listing the linked modules and their installed versions.
  fn native_module_sources(&self) -> Result<Vec<SourceEntry>, FingerprintError> {
    let package = self.read_package_json(Path::new("package.json"))?;
    let Some(package) = package else {
      return Ok(Vec::new());
    };

    let mut sources = Vec::new();
    let mut linked: BTreeMap<String, Option<String>> = BTreeMap::new();

    let names: BTreeSet<&String> = package.dependencies.keys().chain(package.dev_dependencies.keys()).collect();
    for name in names {
      let module_rel = format!("node_modules/{}", name);
      if !self.has_native_code(&module_rel)? {
        continue;
      }

      let version = self
        .read_package_json(&Path::new(&module_rel).join("package.json"))?
        .and_then(|p| p.version);
      linked.insert(name.clone(), version);

      if let Some(entry) = self.module_source(&module_rel)? {
        sources.push(entry);
      }
    }

    if !linked.is_empty() {
      let hash = hash_json(&linked).map_err(|e| FingerprintError::ReadSource {
        id: "autolinking".to_string(),
        message: e.to_string(),
      })?;
      sources.push(SourceEntry::contents("autolinking", hash.0));
    }

    Ok(sources)
  }

  /// A module is linked on Android when it has an `android/` dir, and on iOS
  /// when it has an `ios/` dir or a podspec at its root.
  fn has_native_code(&self, module_rel: &str) -> Result<bool, FingerprintError> {
    let module = self.root.join(module_rel);
    if !module.is_dir() {
      return Ok(false);
    }
    if module.join(self.platform.native_dir()).is_dir() {
      return Ok(true);
    }
    Ok(self.platform == Platform::Ios && self.has_podspec(module_rel)?)
  }

  /// Hash a module's package directory.
  ///
  /// Nested `node_modules`, entries only the other platform builds, and
  /// outputs are left out.
  fn module_source(&self, module_rel: &str) -> Result<Option<SourceEntry>, FingerprintError> {
    if self.is_excluded(module_rel) {
      debug!(source = %module_rel, "source ignored");
      return Ok(None);
    }

    let path = self.root.join(module_rel);
    let hash = hash_directory(&path, |inner| {
      let name = inner.rsplit('/').next().unwrap_or(inner);
      let top_level = !inner.contains('/');
      name == "node_modules"
        || (top_level && self.platform.is_foreign_module_entry(name))
        || self.is_excluded(&format!("{}/{}", module_rel, inner))
    })
    .map_err(|e| FingerprintError::read_source(module_rel, e))?;
    Ok(Some(SourceEntry::dir(module_rel, hash.0)))
  }

  fn has_podspec(&self, module_rel: &str) -> Result<bool, FingerprintError> {
    let entries = fs::read_dir(self.root.join(module_rel)).map_err(|e| FingerprintError::ReadSource {
      id: module_rel.to_string(),
      message: e.to_string(),
    })?;
    Ok(entries
      .flatten()
      .any(|entry| entry.file_name().to_string_lossy().ends_with(".podspec")))
  }

  fn read_package_json(&self, rel: &Path) -> Result<Option<PackageJson>, FingerprintError> {
    let path = self.root.join(rel);
    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(e) => {
        return Err(FingerprintError::ReadSource {
          id: rel.display().to_string(),
          message: e.to_string(),
        });
      }
    };

    serde_json::from_str(&content)
      .map(Some)
      .map_err(|e| FingerprintError::Manifest {
        path: path.display().to_string(),
        message: e.to_string(),
      })
  }

  /// `rel` is project-relative with `/` separators.
  ///
  /// Output dirs such as `build` only count as outputs next to a build file,
  /// so `android/app/build` is excluded while a `build` package under
  /// `src/main/java` is not.
  fn is_excluded(&self, rel: &str) -> bool {
    if self.ignore.is_match(rel) {
      return true;
    }
    let (parent, name) = match rel.rsplit_once('/') {
      Some((parent, name)) => (Some(parent), name),
      None => (None, rel),
    };
    if self.platform.is_volatile(name) {
      return true;
    }
    self.platform.is_output_dir(name) && parent.is_some_and(|parent| self.is_build_root(parent))
  }

  fn is_build_root(&self, rel_dir: &str) -> bool {
    fs::read_dir(self.root.join(rel_dir))
      .map(|entries| {
        entries
          .flatten()
          .any(|entry| self.platform.is_build_file(&entry.file_name().to_string_lossy()))
      })
      .unwrap_or(false)
  }
}
