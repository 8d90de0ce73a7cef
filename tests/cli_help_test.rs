// Command line behavior of the storyreel binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn storyreel() -> Command {
    Command::cargo_bin("storyreel").unwrap()
}

#[test]
fn test_no_subcommand_shows_getting_started() {
    storyreel()
        .assert()
        .success()
        .stdout(predicate::str::contains("STORYREEL"))
        .stdout(predicate::str::contains("storyreel run ./photos"))
        .stdout(predicate::str::contains("storyreel init"));
}

#[test]
fn test_run_help_lists_modes() {
    storyreel()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--mode"))
        .stdout(predicate::str::contains("ai-code"))
        .stdout(predicate::str::contains("--max-retries"));
}

#[test]
fn test_validate_reports_every_error_and_fails() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("script.json");
    std::fs::write(&script, r#"{"version": "", "timeline": []}"#).unwrap();

    storyreel()
        .current_dir(dir.path())
        .arg("validate")
        .arg(&script)
        .assert()
        .failure()
        .stdout(predicate::str::contains("version must be a non-empty string"))
        .stdout(predicate::str::contains("timeline must be a non-empty array"));
}

#[test]
fn test_validate_accepts_a_good_script() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("script.json");
    std::fs::write(
        &script,
        r#"{
            "version": "1.0",
            "input": {"sourceDir": "/photos", "imageCount": 1, "assets": [{"id": "img_001", "path": "/photos/a.jpg"}]},
            "video": {"width": 1080, "height": 1920, "fps": 30, "durationSec": 12},
            "style": {"preset": "cinematic"},
            "timeline": [{"assetId": "img_001", "startSec": 0, "endSec": 12, "subtitleId": "s1"}],
            "subtitles": [{"id": "s1", "text": "Hello", "startSec": 0, "endSec": 12}]
        }"#,
    )
    .unwrap();

    storyreel()
        .current_dir(dir.path())
        .args(["validate", "--duration", "12"])
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("is a valid story script"));
}

#[test]
fn test_init_writes_config_once() {
    let dir = TempDir::new().unwrap();

    storyreel().current_dir(dir.path()).arg("init").assert().success();
    let written = std::fs::read_to_string(dir.path().join("storyreel.toml")).unwrap();
    assert!(written.contains("max_retries = 2"));

    storyreel()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    storyreel()
        .current_dir(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_run_rejects_missing_folder() {
    let dir = TempDir::new().unwrap();

    storyreel()
        .current_dir(dir.path())
        .env("STORYREEL__OBSERVABILITY__LOG_LEVEL", "error")
        .args(["run", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("source directory does not exist"));
}
