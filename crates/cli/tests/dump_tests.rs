//! Integration tests for `strata-cli dump`.

mod common;

use common::{generate_key, strata_cmd, write_file};
use predicates::prelude::*;
use tempfile::TempDir;

fn sample_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "application.yml",
        "imports: [common]\nserver:\n  port: 8080\n  host: localhost\n",
    );
    write_file(dir.path(), "common.yml", "feature: x\n");
    write_file(dir.path(), "application-dev.yml", "server:\n  port: 9090\n");
    dir
}

#[test]
fn test_dump_prints_merged_yaml() {
    let dir = sample_dir();
    let output = strata_cmd()
        .args(["dump", "--config-dir"])
        .arg(dir.path())
        .args(["--profile", "dev"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let tree: serde_yaml::Value = serde_yaml::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["server"]["port"], serde_yaml::Value::from(9090));
    assert_eq!(tree["server"]["host"], serde_yaml::Value::from("localhost"));
    assert_eq!(tree["feature"], serde_yaml::Value::from("x"));
    assert_eq!(tree["app"]["profile"], serde_yaml::Value::from("dev"));
    assert_eq!(
        tree["strata"]["_meta"]["sources"].as_sequence().unwrap().len(),
        3
    );
}

#[test]
fn test_dump_json_output() {
    let dir = sample_dir();
    let output = strata_cmd()
        .args(["dump", "--output-format", "json", "--config-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tree["server"]["port"], 9090);
    assert_eq!(tree["strata"]["_meta"]["profile"], "dev");
}

#[test]
fn test_dump_reads_config_dir_from_env() {
    let dir = sample_dir();
    strata_cmd()
        .env("STRATA_CONFIG_DIR", dir.path())
        .env("STRATA_PROFILE", "qa")
        .arg("dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("profile: qa"))
        .stdout(predicate::str::contains("port: 8080"));
}

#[test]
fn test_dump_to_file() {
    let dir = sample_dir();
    let out = dir.path().join("out/merged.json");
    strata_cmd()
        .args(["dump", "--output-format", "json", "--config-dir"])
        .arg(dir.path())
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Configuration written to"));

    let tree: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(tree["feature"], "x");
}

#[test]
fn test_dump_redacts_secrets_by_default() {
    let dir = TempDir::new().unwrap();
    let key = generate_key();
    let token = strata_cmd()
        .args(["encrypt", "--key", &key, "--text", "hunter2"])
        .output()
        .unwrap();
    let token = String::from_utf8(token.stdout).unwrap().trim().to_string();
    write_file(
        dir.path(),
        "application.yml",
        &format!("db:\n  password: {token}\n"),
    );

    strata_cmd()
        .env("STRATA_SECRET_KEY", &key)
        .args(["dump", "--config-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ENC(**REDACTED**)"))
        .stdout(predicate::str::contains("hunter2").not());

    strata_cmd()
        .env("STRATA_SECRET_KEY", &key)
        .args(["dump", "--secrets", "--config-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("password: hunter2"));
}

#[test]
fn test_dump_secrets_without_key_exits_3() {
    let dir = TempDir::new().unwrap();
    let key = generate_key();
    let token = strata_cmd()
        .args(["encrypt", "--key", &key, "--text", "hunter2"])
        .output()
        .unwrap();
    let token = String::from_utf8(token.stdout).unwrap().trim().to_string();
    write_file(dir.path(), "application.yml", &format!("token: {token}\n"));

    strata_cmd()
        .args(["dump", "--secrets", "--config-dir"])
        .arg(dir.path())
        .assert()
        .code(3)
        .stderr(predicate::str::contains("STRATA_SECRET_KEY"));
}

#[test]
fn test_dump_toml_directory() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "application.toml", "[server]\nport = 8080\n");
    write_file(dir.path(), "application-dev.toml", "[server]\nport = 9090\n");

    strata_cmd()
        .args(["dump", "--format", "toml", "--config-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("port: 9090"));
}
