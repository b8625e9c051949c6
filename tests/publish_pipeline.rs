//! End-to-end pipeline tests against throwaway git repositories.
//!
//! The build stage is exercised with a stub `buildCommand` so the tests do
//! not depend on a wasm toolchain; the publish stage runs against a real
//! working copy wired to a local bare remote.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use dockhand::config::SiteConfig;
use dockhand::{build, check, publish};

const STUB_BUILD: &str =
    "mkdir -p pkg && printf loader > pkg/draw.js && printf payload > pkg/draw_bg.wasm";

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn head(dir: &Path) -> String {
    git(dir, &["rev-parse", "HEAD"])
}

fn commit_count(dir: &Path) -> usize {
    git(dir, &["rev-list", "--count", "HEAD"])
        .parse()
        .unwrap()
}

/// Project directory with a stub build command and the three page assets.
fn init_project(tmp: &Path) -> PathBuf {
    let project = tmp.join("project");
    fs::create_dir(&project).unwrap();

    fs::write(
        project.join("dockhand.json"),
        format!(r#"{{"name": "draw", "buildCommand": "{}"}}"#, STUB_BUILD),
    )
    .unwrap();

    fs::write(project.join("index.html"), "<html>demo</html>").unwrap();
    fs::write(project.join("style.css"), "body { margin: 0 }").unwrap();
    fs::write(project.join("index.js"), "wasm_bindgen('./pkg/draw_bg.wasm');").unwrap();

    project
}

/// Destination working copy with one seed commit, tracking a local bare remote.
fn init_dest(tmp: &Path) -> (PathBuf, PathBuf) {
    let remote = tmp.join("remote.git");
    fs::create_dir(&remote).unwrap();
    git(&remote, &["init", "--bare", "."]);

    let dest = tmp.join("site");
    fs::create_dir(&dest).unwrap();
    git(&dest, &["init", "."]);
    git(&dest, &["config", "user.email", "ci@example.com"]);
    git(&dest, &["config", "user.name", "CI"]);
    git(&dest, &["config", "commit.gpgsign", "false"]);

    fs::write(dest.join("README.md"), "deploy target\n").unwrap();
    git(&dest, &["add", "-A"]);
    git(&dest, &["commit", "-m", "init"]);
    git(&dest, &["remote", "add", "origin", remote.to_str().unwrap()]);
    git(&dest, &["push", "-u", "origin", "HEAD"]);

    (dest, remote)
}

fn load_config(project: &Path) -> SiteConfig {
    SiteConfig::load(project, None).unwrap()
}

#[test]
fn build_produces_expected_artifacts() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());

    let output = build::run(&project, &load_config(&project)).unwrap();

    assert!(output.success);
    assert!(project.join("pkg/draw.js").is_file());
    assert!(project.join("pkg/draw_bg.wasm").is_file());
    assert_eq!(output.artifacts, vec!["pkg/draw.js", "pkg/draw_bg.wasm"]);
}

#[test]
fn build_failure_carries_the_external_exit_code() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    fs::write(
        project.join("dockhand.json"),
        r#"{"name": "draw", "buildCommand": "echo boom >&2; exit 3"}"#,
    )
    .unwrap();

    let err = build::run(&project, &load_config(&project)).unwrap_err();

    assert_eq!(err.code.as_str(), "build.failed");
    assert_eq!(err.details["exitCode"], 3);
    assert!(err.message.contains("boom"));
}

#[test]
fn build_with_no_artifacts_fails_despite_exit_zero() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    fs::write(
        project.join("dockhand.json"),
        r#"{"name": "draw", "buildCommand": "true"}"#,
    )
    .unwrap();

    let err = build::run(&project, &load_config(&project)).unwrap_err();
    assert_eq!(err.code.as_str(), "build.failed");
    assert!(err.message.contains("missing"));
}

#[test]
fn publish_copies_commits_and_pushes() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let (dest, remote) = init_dest(tmp.path());
    let config = load_config(&project);

    build::run(&project, &config).unwrap();
    let output = publish::run(&project, &config, &dest).unwrap();

    // all five files land byte-for-byte
    assert_eq!(output.copied.len(), 5);
    for (source, target) in [
        ("pkg/draw.js", "pkg/draw.js"),
        ("pkg/draw_bg.wasm", "pkg/draw_bg.wasm"),
        ("index.html", "index.html"),
        ("style.css", "style.css"),
        ("index.js", "index.js"),
    ] {
        assert_eq!(
            fs::read(project.join(source)).unwrap(),
            fs::read(dest.join(target)).unwrap(),
            "{} does not match its source",
            target
        );
    }

    // one new commit with the fixed message, remote advanced to it
    assert!(output.committed);
    assert_eq!(commit_count(&dest), 2);
    assert_eq!(git(&dest, &["log", "-1", "--format=%s"]), "update");
    assert_eq!(head(&remote), head(&dest));
}

#[test]
fn publish_overwrites_previously_published_files() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let (dest, _remote) = init_dest(tmp.path());
    let config = load_config(&project);

    build::run(&project, &config).unwrap();
    publish::run(&project, &config, &dest).unwrap();

    fs::write(project.join("style.css"), "body { margin: 1px }").unwrap();
    publish::run(&project, &config, &dest).unwrap();

    assert_eq!(
        fs::read_to_string(dest.join("style.css")).unwrap(),
        "body { margin: 1px }"
    );
    assert_eq!(commit_count(&dest), 3);
}

#[test]
fn missing_source_fails_before_any_git_operation() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let (dest, _remote) = init_dest(tmp.path());
    let config = load_config(&project);

    build::run(&project, &config).unwrap();
    fs::remove_file(project.join("style.css")).unwrap();

    let before = head(&dest);
    let err = publish::run(&project, &config, &dest).unwrap_err();

    assert_eq!(err.code.as_str(), "publish.copy_failed");
    assert_eq!(err.details["missing"].as_array().unwrap().len(), 1);

    // nothing copied, nothing committed
    assert!(!dest.join("index.html").exists());
    assert_eq!(head(&dest), before);
}

#[test]
fn unbuilt_project_fails_publish_with_a_build_hint() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let (dest, _remote) = init_dest(tmp.path());
    let config = load_config(&project);

    let err = publish::run(&project, &config, &dest).unwrap_err();

    assert_eq!(err.code.as_str(), "publish.copy_failed");
    assert!(err
        .hints
        .iter()
        .any(|h| h.message.contains("dockhand build")));
}

#[test]
fn second_publish_with_unchanged_sources_is_a_noop() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let (dest, remote) = init_dest(tmp.path());
    let config = load_config(&project);

    build::run(&project, &config).unwrap();
    let first = publish::run(&project, &config, &dest).unwrap();
    assert!(first.committed);

    let second = publish::run(&project, &config, &dest).unwrap();
    assert!(!second.committed);
    assert!(second.commit.is_none());
    assert_eq!(second.copied.len(), 5);

    // no second commit, remote still in sync
    assert_eq!(commit_count(&dest), 2);
    assert_eq!(head(&remote), head(&dest));
}

#[test]
fn build_never_touches_the_destination() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let (dest, remote) = init_dest(tmp.path());
    let config = load_config(&project);

    let before = head(&dest);
    build::run(&project, &config).unwrap();

    assert_eq!(commit_count(&dest), 1);
    assert_eq!(head(&dest), before);
    assert_eq!(head(&remote), before);
    assert!(!dest.join("pkg").exists());
    assert!(!dest.join("index.html").exists());
}

#[test]
fn publish_without_upstream_is_push_failed() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let config = load_config(&project);

    // working copy with no remote at all
    let dest = tmp.path().join("island");
    fs::create_dir(&dest).unwrap();
    git(&dest, &["init", "."]);
    git(&dest, &["config", "user.email", "ci@example.com"]);
    git(&dest, &["config", "user.name", "CI"]);
    git(&dest, &["config", "commit.gpgsign", "false"]);
    fs::write(dest.join("README.md"), "island\n").unwrap();
    git(&dest, &["add", "-A"]);
    git(&dest, &["commit", "-m", "init"]);

    build::run(&project, &config).unwrap();
    let err = publish::run(&project, &config, &dest).unwrap_err();

    assert_eq!(err.code.as_str(), "publish.push_failed");
    assert_eq!(err.retryable, Some(true));

    // copies and the commit happened before the push failed; no rollback
    assert_eq!(commit_count(&dest), 2);
    assert!(dest.join("index.html").is_file());
}

#[test]
fn publish_into_a_plain_directory_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let config = load_config(&project);

    let dest = tmp.path().join("not-a-repo");
    fs::create_dir(&dest).unwrap();

    build::run(&project, &config).unwrap();
    let err = publish::run(&project, &config, &dest).unwrap_err();

    assert_eq!(err.code.as_str(), "git.command_failed");
    assert!(!dest.join("index.html").exists());
}

#[test]
fn check_is_clean_after_build_with_a_wired_destination() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let (dest, _remote) = init_dest(tmp.path());
    let config = load_config(&project);

    build::run(&project, &config).unwrap();
    let report = check::run(&project, None, dest.to_str()).unwrap();

    assert_eq!(report.issues, vec![]);
    assert_eq!(check::exit_code(&report), 0);
}

#[test]
fn check_flags_unbuilt_artifacts_as_warnings_only() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());
    let (dest, _remote) = init_dest(tmp.path());

    let report = check::run(&project, None, dest.to_str()).unwrap();

    let codes: Vec<_> = report.issues.iter().map(|i| i.code.as_str()).collect();
    assert_eq!(codes, vec!["ARTIFACT_NOT_BUILT", "ARTIFACT_NOT_BUILT"]);
    assert_eq!(check::exit_code(&report), 0);
}

#[test]
fn check_flags_a_missing_destination_as_an_error() {
    let tmp = TempDir::new().unwrap();
    let project = init_project(tmp.path());

    let missing = tmp.path().join("nowhere");
    let report = check::run(&project, None, missing.to_str()).unwrap();

    assert!(report.issues.iter().any(|i| i.code == "DEST_MISSING"));
    assert_eq!(check::exit_code(&report), 1);
}
