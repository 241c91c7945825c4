//! End-to-end CLI tests for the videos-downloader binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary command isolated from the user's config and working directory.
fn downloader(sandbox: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("videos-downloader").unwrap();
    cmd.current_dir(sandbox.path())
        .env("XDG_CONFIG_HOME", sandbox.path().join("config"))
        .env("HOME", sandbox.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let sandbox = TempDir::new().unwrap();
    downloader(&sandbox)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Batch download videos and clips"))
        .stdout(predicate::str::contains("--clip-strategy"));
}

#[test]
fn test_binary_version_displays_version() {
    let sandbox = TempDir::new().unwrap();
    downloader(&sandbox)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("videos-downloader"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let sandbox = TempDir::new().unwrap();
    downloader(&sandbox)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_rejects_unknown_clip_strategy() {
    let sandbox = TempDir::new().unwrap();
    downloader(&sandbox)
        .args(["--clip-strategy", "teleport"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("teleport"));
}

#[test]
fn test_binary_missing_url_file_fails() {
    let sandbox = TempDir::new().unwrap();
    downloader(&sandbox)
        .args(["--urls", "missing.txt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error reading urls from file"));
}

#[test]
fn test_binary_empty_url_file_succeeds_and_creates_download_dir() {
    let sandbox = TempDir::new().unwrap();
    fs::write(sandbox.path().join("urls.txt"), "\n   \n").unwrap();

    downloader(&sandbox).arg("-q").assert().success();

    assert!(sandbox.path().join("downloads").is_dir());
}

#[test]
fn test_binary_unusable_yt_dlp_fails_every_request() {
    let sandbox = TempDir::new().unwrap();
    fs::write(
        sandbox.path().join("list.txt"),
        "https://video.example/watch?v=1\n",
    )
    .unwrap();

    downloader(&sandbox)
        .args(["--urls", "list.txt", "--path", "out", "--fast", "--json"])
        .args(["--yt-dlp", "./definitely-not-yt-dlp"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("process_execution_failed"))
        .stdout(predicate::str::contains("\"failed\": 1"));

    assert!(sandbox.path().join("out").is_dir());
}

#[test]
fn test_binary_reads_defaults_from_config_file() {
    let sandbox = TempDir::new().unwrap();
    let config_dir = sandbox.path().join("config").join("videos-downloader");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        "urls_file = \"from-config.txt\"\ndownload_dir = \"configured\"\n",
    )
    .unwrap();
    fs::write(sandbox.path().join("from-config.txt"), "").unwrap();

    downloader(&sandbox).arg("-q").assert().success();

    assert!(sandbox.path().join("configured").is_dir());
}

#[test]
fn test_binary_invalid_config_file_fails() {
    let sandbox = TempDir::new().unwrap();
    let config_dir = sandbox.path().join("config").join("videos-downloader");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "colour = \"blue\"\n").unwrap();

    downloader(&sandbox)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config file"));
}
