use crate::common::{MockGitHub, RELEASE_TAG, empty_config};
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use trilium_updater::test_utils::ArchiveFixture;

fn updater_cmd(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("trilium-updater").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("TRILIUM_UPDATER_NO_PROGRESS", "1")
        .arg("--config")
        .arg(empty_config(config_dir.path()));
    cmd
}

#[test]
fn test_help() {
    Command::cargo_bin("trilium-updater")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--install-dir"))
        .stdout(predicate::str::contains("--no-extract"));
}

#[test]
fn test_version() {
    Command::cargo_bin("trilium-updater")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_update_succeeds_and_logs_progress() {
    let archive = ArchiveFixture::for_host();
    let mut github = MockGitHub::start_blocking();
    github.serve_release_blocking(&archive);

    let config_dir = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();

    updater_cmd(&config_dir)
        .arg("--api-url")
        .arg(github.url())
        .arg("--install-dir")
        .arg(install.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting Trilium updater"))
        .stdout(predicate::str::contains(format!("Downloading {}...", archive.name)))
        .stdout(predicate::str::contains("Update successful !"))
        .stdout(predicate::str::contains(RELEASE_TAG));

    archive.assert_extracted_in(install.path());
    assert!(!install.path().join(&archive.name).exists());
}

#[test]
fn test_check_prints_asset_without_installing() {
    let archive = ArchiveFixture::for_host();
    let mut github = MockGitHub::start_blocking();
    github.serve_release_blocking(&archive);

    let config_dir = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();

    updater_cmd(&config_dir)
        .arg("--check")
        .arg("--api-url")
        .arg(github.url())
        .arg("--install-dir")
        .arg(install.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(archive.name.as_str()))
        .stdout(predicate::str::contains(RELEASE_TAG));

    assert_eq!(std::fs::read_dir(install.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_release_exits_with_error() {
    let mut github = MockGitHub::start_blocking();
    github.fail_latest_blocking(404);

    let config_dir = TempDir::new().unwrap();
    let install = TempDir::new().unwrap();

    updater_cmd(&config_dir)
        .arg("--api-url")
        .arg(github.url())
        .arg("-d")
        .arg(install.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("404"))
        .stderr(predicate::str::contains("no published release"));
}

#[test]
fn test_quiet_hides_info_logs() {
    let mut github = MockGitHub::start_blocking();
    github.fail_latest_blocking(404);

    let config_dir = TempDir::new().unwrap();

    updater_cmd(&config_dir)
        .arg("--quiet")
        .arg("--api-url")
        .arg(github.url())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Starting Trilium updater").not());
}

#[test]
fn test_invalid_config_file_exits_with_error() {
    let config_dir = TempDir::new().unwrap();
    let config = config_dir.path().join("broken.toml");
    std::fs::write(&config, "timeout_secs = \"forever\"").unwrap();

    Command::cargo_bin("trilium-updater")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_missing_config_file_exits_with_error() {
    let config_dir = TempDir::new().unwrap();

    Command::cargo_bin("trilium-updater")
        .unwrap()
        .arg("--config")
        .arg(config_dir.path().join("missing.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

#[test]
fn test_conflicting_verbosity_flags_rejected() {
    Command::cargo_bin("trilium-updater")
        .unwrap()
        .args(["--verbose", "--quiet"])
        .assert()
        .failure();
}
