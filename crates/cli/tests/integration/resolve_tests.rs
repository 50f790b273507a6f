use predicates::prelude::*;

use super::common::TestProject;

#[test]
fn miss_reports_the_artifact_name() {
  let project = TestProject::new();

  let resolution = project.run_json(&["resolve", "--platform", "ios", "--mode", "Release"]);

  assert_eq!(resolution["outcome"], "miss");
  assert!(resolution["artifact"].is_null());
  let expected = format!("rnef-ios-Release-{}", resolution["fingerprint"]["hash"].as_str().unwrap());
  assert_eq!(resolution["name"], expected.as_str());
}

#[test]
fn existing_artifact_is_a_local_hit() {
  let project = TestProject::new();
  let miss = project.run_json(&["resolve", "--platform", "android", "--mode", "debug"]);
  let name = miss["name"].as_str().unwrap();

  std::fs::create_dir_all(project.artifact_dir().join(name)).unwrap();
  std::fs::write(project.artifact_dir().join(name).join("app-debug.apk"), "apk").unwrap();

  let hit = project.run_json(&["resolve", "--platform", "android", "--mode", "debug"]);
  assert_eq!(hit["outcome"], "local-hit");
  assert_eq!(hit["name"], name);
  assert!(hit["artifact"]["path"].as_str().unwrap().ends_with(name));
}

#[test]
fn mode_partitions_the_cache() {
  let project = TestProject::new();

  let debug = project.run_json(&["resolve", "--platform", "android", "--mode", "debug"]);
  let release = project.run_json(&["resolve", "--platform", "android", "--mode", "release"]);

  assert_eq!(debug["fingerprint"]["hash"], release["fingerprint"]["hash"]);
  assert_ne!(debug["name"], release["name"]);
}

#[test]
fn ci_project_without_token_degrades_to_miss() {
  let project = TestProject::new();
  project.write_file(".github/workflows/build.yml", "on: push\n");

  project
    .rnef_cmd()
    .args(["resolve", "--platform", "android", "--mode", "debug"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Cache miss"));
}

#[test]
fn unreachable_remote_degrades_to_miss() {
  let project = TestProject::new();
  project.write_file(".github/workflows/build.yml", "on: push\n");

  project
    .rnef_cmd()
    .args(["resolve", "--platform", "ios", "--mode", "Debug"])
    .env("GITHUB_TOKEN", "test-token")
    .env("GITHUB_REPOSITORY", "acme/app")
    .env("GITHUB_API_URL", "http://127.0.0.1:9")
    .assert()
    .success()
    .stdout(predicate::str::contains("Cache miss"))
    .stdout(predicate::str::contains("github-actions"));
}

#[test]
fn disabled_provider_ignores_ci_marker() {
  let project = TestProject::new();
  project.write_file(".github/workflows/build.yml", "on: push\n");
  project.write_file("rnef.config.json", r#"{ "remoteCacheProvider": "none" }"#);

  project
    .rnef_cmd()
    .args(["resolve", "--platform", "ios", "--mode", "Debug"])
    .env("GITHUB_TOKEN", "test-token")
    .env("GITHUB_REPOSITORY", "acme/app")
    .assert()
    .success()
    .stdout(predicate::str::contains("Cache miss"))
    .stdout(predicate::str::contains("Remote").not());
}
