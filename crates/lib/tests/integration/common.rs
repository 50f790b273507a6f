//! Shared helpers for rnef-lib integration tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use rnef_lib::remote::{RemoteBuildCache, RemoteCacheError};
use rnef_lib::store::LocalArtifactStore;
use rnef_lib::{ArtifactName, LocalArtifact, RemoteArtifact};

/// File name the stub provider materializes inside each downloaded artifact.
pub const STUB_FILE: &str = "app.bin";

/// Isolated React Native project tree.
pub struct TestProject {
  pub temp: TempDir,
}

impl TestProject {
  /// An app with one native module (`react-native-svg`) and one JS-only
  /// dependency (`dayjs`).
  pub fn new() -> Self {
    let project = Self {
      temp: TempDir::new().unwrap(),
    };
    project.write_file(
      "package.json",
      r#"{
  "name": "app",
  "version": "1.0.0",
  "dependencies": { "react-native-svg": "15.0.0", "dayjs": "1.11.10" }
}"#,
    );
    project.write_file("src/index.ts", "export {};\n");
    project.write_file("android/build.gradle", "buildscript {}\n");
    project.write_file("android/app/build.gradle", "android { namespace 'com.app' }\n");
    project.write_file("ios/Podfile", "platform :ios, '13.4'\n");
    project.write_file("ios/App/Info.plist", "<plist/>\n");
    project.write_file(
      "node_modules/react-native-svg/package.json",
      r#"{ "name": "react-native-svg", "version": "15.0.0" }"#,
    );
    project.write_file("node_modules/react-native-svg/android/build.gradle", "// svg\n");
    project.write_file("node_modules/react-native-svg/apple/RNSVG.mm", "// svg\n");
    project.write_file("node_modules/react-native-svg/RNSVG.podspec", "Pod::Spec.new\n");
    project.write_file(
      "node_modules/dayjs/package.json",
      r#"{ "name": "dayjs", "version": "1.11.10" }"#,
    );
    project.write_file("node_modules/dayjs/index.js", "module.exports = {};\n");
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

  pub fn store(&self) -> LocalArtifactStore {
    LocalArtifactStore::for_project(self.root())
  }
}

/// In-memory provider that serves one payload for any queried name.
///
/// Counts calls so tests can assert on network behavior.
pub struct StubProvider {
  payload: Option<Vec<u8>>,
  fail: bool,
  delay: Duration,
  pub queries: AtomicUsize,
  pub downloads: AtomicUsize,
}

impl StubProvider {
  /// A provider that has every artifact, with `payload` as its content.
  pub fn serving(payload: &[u8]) -> Self {
    Self {
      payload: Some(payload.to_vec()),
      fail: false,
      delay: Duration::ZERO,
      queries: AtomicUsize::new(0),
      downloads: AtomicUsize::new(0),
    }
  }

  /// A provider that has nothing.
  pub fn empty() -> Self {
    Self {
      payload: None,
      ..Self::serving(&[])
    }
  }

  /// A provider whose every query fails with a network error.
  pub fn failing() -> Self {
    Self {
      fail: true,
      ..Self::empty()
    }
  }

  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  pub fn query_count(&self) -> usize {
    self.queries.load(Ordering::SeqCst)
  }

  pub fn download_count(&self) -> usize {
    self.downloads.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl RemoteBuildCache for StubProvider {
  fn name(&self) -> &str {
    "stub"
  }

  async fn query(&self, name: &ArtifactName) -> Result<Option<RemoteArtifact>, RemoteCacheError> {
    self.queries.fetch_add(1, Ordering::SeqCst);
    tokio::time::sleep(self.delay).await;
    if self.fail {
      return Err(RemoteCacheError::Network("connection refused".into()));
    }
    Ok(self.payload.as_ref().map(|payload| RemoteArtifact {
      name: name.clone(),
      download_url: format!("stub://{}", name),
      size_in_bytes: Some(payload.len() as u64),
    }))
  }

  async fn download(
    &self,
    artifact: &RemoteArtifact,
    store: &LocalArtifactStore,
  ) -> Result<LocalArtifact, RemoteCacheError> {
    self.downloads.fetch_add(1, Ordering::SeqCst);
    let payload = self
      .payload
      .as_ref()
      .ok_or_else(|| RemoteCacheError::Gone(artifact.name.clone()))?;

    let staging = store.stage(&artifact.name)?;
    std::fs::write(staging.path().join(STUB_FILE), payload)?;
    Ok(store.commit(staging, &artifact.name)?)
  }
}
