//! Shared helpers for strata-config integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use strata_config::{Config, ConfigError, ConfigFormat, ConfigLoader};

/// Writes `contents` to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directories");
    }
    fs::write(&path, contents).expect("write config file");
    path
}

/// Loads a YAML config directory with an explicit profile.
pub fn load(dir: &Path, profile: &str) -> Result<Config, ConfigError> {
    ConfigLoader::new()
        .with_config_dir(dir)
        .with_profile(profile)
        .with_format(ConfigFormat::Yaml)
        .load()
}

pub fn canonical(dir: &Path, name: &str) -> PathBuf {
    dir.join(name).canonicalize().expect("canonicalize")
}
