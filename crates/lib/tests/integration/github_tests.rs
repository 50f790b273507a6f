use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use mockito::Matcher;
use serial_test::serial;
use zip::write::SimpleFileOptions;

use rnef_lib::cache::{BuildCache, BuildRequest, Outcome, RemotePublish};
use rnef_lib::config::ProjectConfig;
use rnef_lib::consts::{GITHUB_API_URL_ENV, GITHUB_REPOSITORY_ENV, GITHUB_TOKEN_ENV};
use rnef_lib::remote::{GitHubActionsCache, RepositoryIdentity, RetryPolicy};
use rnef_lib::{ArtifactName, Platform, format_artifact_name};

use super::common::TestProject;

fn fast_retry() -> RetryPolicy {
  RetryPolicy {
    max_attempts: 2,
    initial_delay: Duration::from_millis(1),
    max_delay: Duration::from_millis(2),
  }
}

fn github(server: &mockito::Server) -> GitHubActionsCache {
  let repo = RepositoryIdentity::parse("https://github.com/acme/app").unwrap();
  GitHubActionsCache::new(&server.url(), repo, "ghs_test".into())
    .unwrap()
    .with_retry(fast_retry())
}

fn app_zip() -> Vec<u8> {
  let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
  writer
    .start_file("app-release.apk", SimpleFileOptions::default())
    .unwrap();
  writer.write_all(b"signed apk bytes").unwrap();
  writer.finish().unwrap().into_inner()
}

async fn expected_name(cache: &BuildCache, platform: Platform, mode: &str) -> ArtifactName {
  let fingerprint = cache.fingerprint(platform).await.unwrap();
  format_artifact_name(platform, mode, &fingerprint.hash)
}

async fn mock_published(server: &mut mockito::Server, name: &ArtifactName) -> (mockito::Mock, mockito::Mock) {
  let list = serde_json::json!({
    "total_count": 2,
    "artifacts": [
      {
        "id": 9,
        "name": name.as_str(),
        "expired": true,
        "size_in_bytes": 10,
        "archive_download_url": format!("{}/expired/9", server.url()),
      },
      {
        "id": 7,
        "name": name.as_str(),
        "expired": false,
        "size_in_bytes": 120,
        "archive_download_url": format!("{}/zip/7", server.url()),
      }
    ]
  });
  let query = server
    .mock("GET", "/repos/acme/app/actions/artifacts")
    .match_query(Matcher::AllOf(vec![
      Matcher::UrlEncoded("name".into(), name.to_string()),
      Matcher::UrlEncoded("per_page".into(), "100".into()),
    ]))
    .match_header("authorization", "Bearer ghs_test")
    .with_status(200)
    .with_body(list.to_string())
    .expect(1)
    .create_async()
    .await;
  let download = server
    .mock("GET", "/zip/7")
    .with_status(200)
    .with_body(app_zip())
    .expect(1)
    .create_async()
    .await;
  (query, download)
}

#[tokio::test]
async fn published_artifact_is_downloaded_once() {
  let mut server = mockito::Server::new_async().await;
  let project = TestProject::new();
  let provider = Arc::new(github(&server));
  let cache = BuildCache::new(project.root().to_path_buf(), ProjectConfig::default(), Some(provider.clone()));
  let name = expected_name(&cache, Platform::Android, "release").await;
  let (query, download) = mock_published(&mut server, &name).await;

  let request = BuildRequest::new(Platform::Android, "release").unwrap();
  let first = cache.resolve(&request).await.unwrap();
  assert_eq!(first.outcome, Outcome::RemoteHit);
  let artifact = first.artifact.unwrap();
  assert_eq!(std::fs::read(artifact.path.join("app-release.apk")).unwrap(), b"signed apk bytes");

  // A fresh cache for the same project finds it on disk.
  let other = BuildCache::new(project.root().to_path_buf(), ProjectConfig::default(), Some(provider));
  let second = other.resolve(&request).await.unwrap();
  assert_eq!(second.outcome, Outcome::LocalHit);

  query.assert_async().await;
  download.assert_async().await;
}

#[tokio::test]
async fn publishing_an_uploaded_artifact_reports_already_present() {
  let mut server = mockito::Server::new_async().await;
  let project = TestProject::new();
  let cache = BuildCache::new(
    project.root().to_path_buf(),
    ProjectConfig::default(),
    Some(Arc::new(github(&server))),
  );
  let name = expected_name(&cache, Platform::Android, "release").await;
  let (_query, _download) = mock_published(&mut server, &name).await;
  project.write_file("android/app/build/outputs/bundle/release/app-release.aab", "aab");

  let report = cache
    .publish(
      &BuildRequest::new(Platform::Android, "release").unwrap(),
      &project.root().join("android/app/build/outputs/bundle/release"),
    )
    .await
    .unwrap();

  assert_eq!(report.remote, RemotePublish::AlreadyPresent);
  assert!(report.local.path.join("app-release.aab").is_file());
}

#[tokio::test]
async fn rejected_token_degrades_to_miss() {
  let mut server = mockito::Server::new_async().await;
  let query = server
    .mock("GET", "/repos/acme/app/actions/artifacts")
    .match_query(Matcher::Any)
    .with_status(403)
    .expect(1)
    .create_async()
    .await;
  let project = TestProject::new();
  let cache = BuildCache::new(
    project.root().to_path_buf(),
    ProjectConfig::default(),
    Some(Arc::new(github(&server))),
  );

  let resolution = cache.resolve(&BuildRequest::new(Platform::Ios, "Release").unwrap()).await.unwrap();

  assert_eq!(resolution.outcome, Outcome::Miss);
  query.assert_async().await;
}

#[tokio::test]
async fn vanished_artifact_degrades_to_miss_without_residue() {
  let mut server = mockito::Server::new_async().await;
  let project = TestProject::new();
  let cache = BuildCache::new(
    project.root().to_path_buf(),
    ProjectConfig::default(),
    Some(Arc::new(github(&server))),
  );
  let name = expected_name(&cache, Platform::Ios, "Debug").await;
  let _list = server
    .mock("GET", "/repos/acme/app/actions/artifacts")
    .match_query(Matcher::Any)
    .with_status(200)
    .with_body(
      serde_json::json!({
        "total_count": 1,
        "artifacts": [{
          "name": name.as_str(),
          "archive_download_url": format!("{}/zip/1", server.url()),
        }]
      })
      .to_string(),
    )
    .create_async()
    .await;
  let _zip = server.mock("GET", "/zip/1").with_status(410).create_async().await;

  let resolution = cache.resolve(&BuildRequest::new(Platform::Ios, "Debug").unwrap()).await.unwrap();

  assert_eq!(resolution.outcome, Outcome::Miss);
  assert!(project.store().list().is_empty());
}

#[tokio::test]
#[serial]
async fn provider_is_selected_from_the_environment() {
  let mut server = mockito::Server::new_async().await;
  let project = TestProject::new();
  project.write_file(".github/workflows/ci.yml", "on: push\n");

  let url = server.url();
  let cache = temp_env::with_vars(
    [
      (GITHUB_TOKEN_ENV, Some("ghs_test")),
      (GITHUB_REPOSITORY_ENV, Some("acme/app")),
      (GITHUB_API_URL_ENV, Some(url.as_str())),
    ],
    || BuildCache::from_project(project.root()).unwrap(),
  );
  assert_eq!(cache.provider_name(), Some("github-actions"));

  let name = expected_name(&cache, Platform::Android, "release").await;
  let (query, download) = mock_published(&mut server, &name).await;

  let resolution = cache.resolve(&BuildRequest::new(Platform::Android, "release").unwrap()).await.unwrap();

  assert_eq!(resolution.outcome, Outcome::RemoteHit);
  query.assert_async().await;
  download.assert_async().await;
}
