mod common;

use common::{config_path, hxutil_cmd};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn config_path_prints_the_given_file() {
    let config = TempDir::new().unwrap();
    let expected = config_path(config.path());

    hxutil_cmd(config.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.to_string_lossy()));
}

#[test]
fn config_path_honours_environment_variable() {
    let config = TempDir::new().unwrap();
    let from_env = config.path().join("elsewhere.toml");

    assert_cmd::cargo::cargo_bin_cmd!("hxutil")
        .env("HXUTIL_CONFIG", &from_env)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("elsewhere.toml"));
}

#[test]
fn config_show_masks_passwords() {
    let config = TempDir::new().unwrap();
    fs::write(
        config_path(config.path()),
        r#"[metadata]
version = 1

[settings]
large_value_threshold = 120

[[users]]
email = "dev@example.com"
password = "hunter2"
"#,
    )
    .unwrap();

    hxutil_cmd(config.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dev@example.com"))
        .stdout(predicate::str::contains("large_value_threshold = 120"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn unsupported_config_version_is_an_error() {
    let config = TempDir::new().unwrap();
    fs::write(config_path(config.path()), "[metadata]\nversion = 7\n").unwrap();

    hxutil_cmd(config.path())
        .args(["config", "show"])
        .assert()
        .code(255)
        .stderr(predicate::str::contains("Unsupported config file version: 7"));
}
