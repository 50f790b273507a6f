use predicates::prelude::*;

use super::common::TestProject;

#[test]
fn stored_output_resolves_locally() {
  let project = TestProject::new();
  project.write_file("android/app/build/outputs/apk/debug/app-debug.apk", "apk-v1");
  let built = project.root().join("android/app/build/outputs/apk/debug/app-debug.apk");

  let report = project.run_json(&["store", "--platform", "android", "--mode", "debug", built.to_str().unwrap()]);
  assert_eq!(report["remote"]["status"], "no-provider");

  let resolution = project.run_json(&["resolve", "--platform", "android", "--mode", "debug"]);
  assert_eq!(resolution["outcome"], "local-hit");
  assert_eq!(resolution["artifact"], report["local"]);

  let stored = std::path::PathBuf::from(resolution["artifact"]["path"].as_str().unwrap());
  assert_eq!(std::fs::read_to_string(stored.join("app-debug.apk")).unwrap(), "apk-v1");
}

#[test]
fn storing_twice_keeps_the_first_artifact() {
  let project = TestProject::new();
  let built = project.root().join("out/App.app");
  project.write_file("out/App.app/Info.plist", "v1");

  project
    .rnef_cmd()
    .args(["store", "--platform", "ios", "--mode", "Debug"])
    .arg(&built)
    .assert()
    .success()
    .stdout(predicate::str::contains("Stored rnef-ios-Debug-"));

  project.write_file("out/App.app/Info.plist", "v2");
  let report = project.run_json(&["store", "--platform", "ios", "--mode", "Debug", built.to_str().unwrap()]);

  let stored = std::path::PathBuf::from(report["local"]["path"].as_str().unwrap());
  assert_eq!(std::fs::read_to_string(stored.join("Info.plist")).unwrap(), "v1");
}

#[test]
fn store_missing_output_fails() {
  let project = TestProject::new();

  project
    .rnef_cmd()
    .args(["store", "--platform", "android", "--mode", "debug"])
    .arg(project.root().join("nope.apk"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("not found"));
}

#[test]
fn info_lists_stored_artifacts() {
  let project = TestProject::new();
  project.write_file("out/app.apk", "apk");

  project
    .rnef_cmd()
    .args(["store", "--platform", "android", "--mode", "release"])
    .arg(project.root().join("out/app.apk"))
    .assert()
    .success();

  project
    .rnef_cmd()
    .args(["--verbose", "info"])
    .assert()
    .success()
    .stdout(predicate::str::contains("rnef-android-release-"));
}
