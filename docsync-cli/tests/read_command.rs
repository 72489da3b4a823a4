use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn docsync_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("docsync"));
    cmd.env("NO_COLOR", "1").env("RUST_LOG", "warn");
    cmd
}

fn publish_page(root: &Path, namespace: &str, kind: &str, name: &str, path: &str, body: &str) {
    let dir = root.join(namespace).join(kind).join(name).join(path);
    fs::create_dir_all(&dir).expect("create page dir");
    fs::write(dir.join("index.html"), body).expect("write page");
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write file");
    path
}

#[test]
fn published_page_with_cached_build_is_fresh() {
    let root = TempDir::new().expect("tempdir");
    publish_page(root.path(), "default", "component", "backstage", "", "<h1>Backstage</h1>");

    docsync_cmd()
        .args(["read", "component:default/backstage", "--content-root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(contains("CONTENT_FRESH"))
        .stdout(contains("<h1>Backstage</h1>"));
}

#[test]
fn nested_path_is_read_from_its_own_directory() {
    let root = TempDir::new().expect("tempdir");
    publish_page(root.path(), "default", "component", "backstage", "", "root page");
    publish_page(
        root.path(),
        "default",
        "component",
        "backstage",
        "guides/install",
        "install page",
    );

    docsync_cmd()
        .args([
            "read",
            "component:backstage",
            "--path",
            "/guides/install/",
            "--content-root",
        ])
        .arg(root.path())
        .assert()
        .success()
        .stdout(contains("install page"))
        .stdout(contains("root page").not());
}

#[test]
fn missing_page_is_not_found() {
    let root = TempDir::new().expect("tempdir");

    docsync_cmd()
        .args(["read", "component:default/missing", "--content-root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(contains("CONTENT_NOT_FOUND"))
        .stdout(contains("Load error: not found"));
}

#[test]
fn json_output_emits_one_object_per_change() {
    let root = TempDir::new().expect("tempdir");
    publish_page(root.path(), "default", "component", "backstage", "", "hello");

    let output = docsync_cmd()
        .args(["read", "component:default/backstage", "--json", "--content-root"])
        .arg(root.path())
        .output()
        .expect("run docsync");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).expect("utf8 stdout");
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.first().unwrap()["state"], "CHECKING");
    let last = lines.last().unwrap();
    assert_eq!(last["state"], "CONTENT_FRESH");
    assert_eq!(last["content"], "hello");
    assert_eq!(last["error_message"], "");
}

#[test]
fn slow_updated_build_goes_stale_then_ready() {
    let root = TempDir::new().expect("tempdir");
    let files = TempDir::new().expect("tempdir");
    publish_page(root.path(), "default", "component", "backstage", "", "old docs");
    let config = write_file(&files, "config.yaml", "building_threshold_ms: 50\n");
    let script = write_file(
        &files,
        "sync.yaml",
        r#"
entities:
  "component:default/backstage":
    settle_after_ms: 400
    outcome: updated
"#,
    );

    docsync_cmd()
        .args(["read", "component:default/backstage", "--content-root"])
        .arg(root.path())
        .arg("--config")
        .arg(&config)
        .arg("--sync-script")
        .arg(&script)
        .assert()
        .success()
        .stdout(contains("CONTENT_STALE_REFRESHING"))
        .stdout(contains("CONTENT_STALE_READY"))
        .stdout(contains("old docs"));
}

#[test]
fn failed_build_keeps_content_and_reports_error() {
    let root = TempDir::new().expect("tempdir");
    let files = TempDir::new().expect("tempdir");
    publish_page(root.path(), "default", "component", "backstage", "", "old docs");
    let script = write_file(
        &files,
        "sync.yaml",
        r#"
entities:
  "component:default/backstage":
    outcome: error
    error_message: builder crashed
"#,
    );

    docsync_cmd()
        .args(["read", "component:default/backstage", "--content-root"])
        .arg(root.path())
        .arg("--sync-script")
        .arg(&script)
        .assert()
        .success()
        .stdout(contains("CONTENT_STALE_ERROR"))
        .stdout(contains("Build error: builder crashed"))
        .stdout(contains("old docs"));
}

#[test]
fn build_that_never_settles_times_out() {
    let root = TempDir::new().expect("tempdir");
    let files = TempDir::new().expect("tempdir");
    let script = write_file(
        &files,
        "sync.yaml",
        r#"
entities:
  "component:default/backstage":
    settle_after_ms: 60000
"#,
    );

    docsync_cmd()
        .args(["read", "component:default/backstage", "--timeout-ms", "300"])
        .arg("--content-root")
        .arg(root.path())
        .arg("--sync-script")
        .arg(&script)
        .assert()
        .failure()
        .stderr(contains("did not settle within 300ms"));
}

#[test]
fn malformed_entity_ref_is_rejected() {
    let root = TempDir::new().expect("tempdir");

    docsync_cmd()
        .args(["read", "backstage", "--content-root"])
        .arg(root.path())
        .assert()
        .failure();
}

#[test]
fn states_prints_resolution_table() {
    docsync_cmd()
        .arg("states")
        .assert()
        .success()
        .stdout(contains("INITIAL_BUILD"))
        .stdout(contains("CONTENT_STALE_TIMEOUT"))
        .stdout(contains("BUILD_READY_RELOAD"));
}
