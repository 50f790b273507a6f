//! Target platforms with a native build that can be cached.

pub mod paths;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fingerprint::FingerprintError;

/// A native target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
  Android,
  Ios,
}

/// Per-machine state excluded anywhere inside an Android tree.
const ANDROID_VOLATILE: &[&str] = &[".gradle", ".cxx", ".externalNativeBuild", ".idea", "local.properties", ".DS_Store"];

/// Per-machine state excluded anywhere inside an iOS tree.
const IOS_VOLATILE: &[&str] = &["DerivedData", "xcuserdata", ".xcode.env.local", ".DS_Store"];

/// Gradle writes these next to the `build.gradle` that owns them.
const ANDROID_OUTPUTS: &[&str] = &["build", "captures"];

/// Xcode and CocoaPods write these next to the project or `Podfile`.
const IOS_OUTPUTS: &[&str] = &["build", "Pods"];

const ANDROID_BUILD_FILES: &[&str] = &["build.gradle", "build.gradle.kts", "settings.gradle", "settings.gradle.kts"];

const IOS_BUILD_FILES: &[&str] = &["Podfile", ".xcodeproj", ".xcworkspace"];

/// Top-level entries of a native module that only feed the other platform.
const ANDROID_FOREIGN: &[&str] = &["ios", "apple", "macos", ".podspec"];

const IOS_FOREIGN: &[&str] = &["android"];

impl Platform {
  pub const ALL: [Platform; 2] = [Platform::Android, Platform::Ios];

  /// Lowercase identifier used in artifact names and config keys.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Android => "android",
      Self::Ios => "ios",
    }
  }

  /// Project-relative directory holding the platform's native project.
  ///
  /// Native modules under `node_modules/<pkg>/` use the same layout.
  pub fn native_dir(&self) -> &'static str {
    self.as_str()
  }

  /// Names that are per-machine state wherever they appear.
  pub fn volatile_names(&self) -> &'static [&'static str] {
    match self {
      Self::Android => ANDROID_VOLATILE,
      Self::Ios => IOS_VOLATILE,
    }
  }

  /// Returns `true` if `name` is a per-machine entry for this platform.
  pub fn is_volatile(&self, name: &str) -> bool {
    self.volatile_names().contains(&name)
  }

  /// Returns `true` if `name` is an output directory, provided its parent
  /// directory is a build root (see [`Platform::is_build_file`]).
  ///
  /// A `build` package inside `src/main/java` is source, not output.
  pub fn is_output_dir(&self, name: &str) -> bool {
    match self {
      Self::Android => ANDROID_OUTPUTS.contains(&name),
      Self::Ios => IOS_OUTPUTS.contains(&name),
    }
  }

  /// Returns `true` if `name` marks its directory as a build root.
  ///
  /// Entries starting with `.` match as suffixes (`App.xcodeproj`).
  pub fn is_build_file(&self, name: &str) -> bool {
    let markers = match self {
      Self::Android => ANDROID_BUILD_FILES,
      Self::Ios => IOS_BUILD_FILES,
    };
    matches_entry(markers, name)
  }

  /// Returns `true` if a top-level entry of a native module only feeds the
  /// other platform's build.
  pub fn is_foreign_module_entry(&self, name: &str) -> bool {
    let foreign = match self {
      Self::Android => ANDROID_FOREIGN,
      Self::Ios => IOS_FOREIGN,
    };
    matches_entry(foreign, name)
  }
}

fn matches_entry(patterns: &[&str], name: &str) -> bool {
  patterns.iter().any(|p| {
    if p.starts_with('.') {
      name.len() > p.len() && name.ends_with(p)
    } else {
      name == *p
    }
  })
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Platform {
  type Err = FingerprintError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "android" => Ok(Self::Android),
      "ios" => Ok(Self::Ios),
      _ => Err(FingerprintError::UnsupportedPlatform(s.to_string())),
    }
  }
}
