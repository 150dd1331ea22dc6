//! Shared test utilities for strata-cli integration tests.
//!
//! Invariants / Assumptions:
//! - Every command built here ignores `.env` files and host `STRATA_*` variables.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use assert_cmd::Command;

/// Returns a hermetic `strata-cli` command for integration testing.
pub fn strata_cmd() -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("strata-cli");

    // Hermeticity: prevent loading local .env
    cmd.env("DOTENV_DISABLED", "1");

    cmd.env_remove("STRATA_PROFILE")
        .env_remove("STRATA_CONFIG_DIR")
        .env_remove("STRATA_FORMAT")
        .env_remove("STRATA_SECRET_KEY")
        .env_remove("RUST_LOG");

    cmd
}

pub fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Generates a key through the CLI and returns its hex form.
pub fn generate_key() -> String {
    let output = strata_cmd().arg("keygen").output().unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}
