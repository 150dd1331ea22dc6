//! Tests for the configuration loader.
//!
//! Responsibilities:
//! - Test base loading, format selection and metadata.
//! - Test import resolution, traversal protection and cycle detection.
//! - Test profile overlays, the production guardrail and runtime profile injection.
//! - Test secret wrapping, environment handling and dotenv loading.
//!
//! Does NOT handle:
//! - Merge rules in isolation (tested in merge.rs).
//! - Decryption primitives (tested in encryption.rs and secret.rs).
//!
//! Invariants:
//! - Tests that touch process-wide state (env vars, cwd, key registry) use `serial_test`.
//! - Every test passes an explicit profile unless it is testing profile resolution.
//! - Temporary directories are cleaned up automatically via `tempfile`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::config::Config;
use crate::format::ConfigFormat;
use crate::loader::builder::ConfigLoader;
use crate::loader::error::ConfigError;


/// Returns the global test lock for environment variable isolation.
pub fn env_lock() -> &'static Mutex<()> {
    crate::test_util::global_test_lock()
}

/// Writes `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Loads `dir` as YAML under an explicit profile.
pub fn load(dir: &Path, profile: &str) -> Result<Config, ConfigError> {
    ConfigLoader::new()
        .with_config_dir(dir)
        .with_profile(profile)
        .with_format(ConfigFormat::Yaml)
        .load()
}

/// Canonical path of `dir/name`, as recorded in the import trace.
pub fn canonical(dir: &Path, name: &str) -> PathBuf {
    dir.join(name).canonicalize().unwrap()
}
