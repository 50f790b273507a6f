//! Test utilities for rnef-lib.
//!
//! Provides a throwaway React Native project tree for fingerprint and cache tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;
use walkdir::WalkDir;

/// A temporary project directory.
pub struct ProjectFixture {
  temp: TempDir,
}

impl ProjectFixture {
  /// An empty project.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// A minimal React Native app with one native module and one JS-only dependency.
  pub fn react_native() -> Self {
    let project = Self::empty();
    project.write(
      "package.json",
      r#"{
  "name": "app",
  "scripts": { "start": "react-native start" },
  "dependencies": { "react-native-camera": "^1.0.0", "lodash": "^4.17.21" }
}"#,
    );
    project.write("src/App.tsx", "export default () => null;");
    project.write("android/settings.gradle", "include ':app'");
    project.write("android/app/build.gradle", "apply plugin: 'com.android.application'");
    project.write("android/app/src/main/java/com/app/MainActivity.kt", "class MainActivity");
    project.write("ios/Podfile", "platform :ios, '13.4'");
    project.write("ios/App/AppDelegate.swift", "class AppDelegate {}");
    project.write("node_modules/react-native-camera/package.json", r#"{ "version": "1.0.3" }"#);
    project.write("node_modules/react-native-camera/android/src/Camera.kt", "class Camera");
    project.write("node_modules/react-native-camera/ios/Camera.m", "@implementation Camera @end");
    project.write("node_modules/react-native-camera/RNCamera.podspec", "Pod::Spec.new");
    project.write("node_modules/lodash/package.json", r#"{ "version": "4.17.21" }"#);
    project.write("node_modules/lodash/index.js", "module.exports = {}");
    project
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project root, creating parent directories.
  pub fn write(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  /// Create a `.github` directory so CI detection picks GitHub Actions.
  pub fn mark_github_ci(&self) {
    fs::create_dir_all(self.temp.path().join(".github/workflows")).unwrap();
  }

  /// Every file under the root with its contents.
  pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(self.root())
      .into_iter()
      .flatten()
      .filter(|e| e.file_type().is_file())
      .map(|e| {
        let rel = e.path().strip_prefix(self.root()).unwrap().display().to_string();
        (rel, fs::read(e.path()).unwrap())
      })
      .collect()
  }
}
