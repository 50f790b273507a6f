//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated React Native project tree.
///
/// Contains an Android and an iOS native directory, a `package.json` with one
/// native module and one JS-only dependency, and the matching `node_modules`.
pub struct TestProject {
  pub temp: TempDir,
}

impl TestProject {
  pub fn new() -> Self {
    let project = Self {
      temp: TempDir::new().unwrap(),
    };
    project.write_file(
      "package.json",
      r#"{
  "name": "app",
  "dependencies": { "react-native-maps": "1.10.0", "lodash": "4.17.21" }
}"#,
    );
    project.write_file("android/app/build.gradle", "apply plugin: 'com.android.application'\n");
    project.write_file("android/settings.gradle", "include ':app'\n");
    project.write_file("ios/Podfile", "platform :ios, '13.4'\n");
    project.write_file("src/App.tsx", "export default function App() {}\n");
    project.write_file(
      "node_modules/react-native-maps/package.json",
      r#"{ "name": "react-native-maps", "version": "1.10.0" }"#,
    );
    project.write_file("node_modules/react-native-maps/android/build.gradle", "// maps\n");
    project.write_file("node_modules/react-native-maps/react-native-maps.podspec", "Pod::Spec.new\n");
    project.write_file("node_modules/lodash/package.json", r#"{ "name": "lodash", "version": "4.17.21" }"#);
    project
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn artifact_dir(&self) -> PathBuf {
    self.temp.path().join(".rnef/cache/remote-build")
  }

  /// Get a Command for the rnef binary.
  ///
  /// Clears the GitHub environment so a developer's token never reaches the
  /// network from tests.
  pub fn rnef_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("rnef");
    cmd.env_remove("GITHUB_TOKEN");
    cmd.env_remove("GITHUB_REPOSITORY");
    cmd.env_remove("GITHUB_API_URL");
    cmd.env_remove("RUST_LOG");
    cmd.arg("--project-root").arg(self.root());
    cmd
  }

  /// Run a command and parse its stdout as JSON.
  pub fn run_json(&self, args: &[&str]) -> serde_json::Value {
    let output = self.rnef_cmd().args(args).arg("--output").arg("json").output().unwrap();
    assert!(
      output.status.success(),
      "command failed: {}",
      String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
  }
}
