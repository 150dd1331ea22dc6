//! Environment variable handling for configuration.
//!
//! Responsibilities:
//! - Expand `${VAR}` and `${VAR:default}` references in raw file text before parsing.
//! - Apply `STRATA_*` environment variables to a `ConfigLoader` instance.
//! - Provide helper functions for reading env vars with empty/whitespace filtering.
//!
//! Does NOT handle:
//! - Parsing file text (see `format.rs`).
//! - .env file loading (handled by ConfigLoader::load_dotenv).
//!
//! Invariants:
//! - Builder values take precedence over environment variables.
//! - Empty or whitespace-only environment variables are treated as unset by `env_var_or_none`.
//! - A reference to an unset variable without a default is left untouched.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::builder::ConfigLoader;
use super::error::ConfigError;
use crate::constants::{ENV_CONFIG_DIR, ENV_FORMAT, ENV_PROFILE};

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::([^}]+))?\}")
        .expect("ENV_REFERENCE compilation should never fail")
});

/// Read an environment variable, returning None if unset, empty, or whitespace-only.
/// Returns the trimmed value (leading/trailing whitespace removed) if present.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(s)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Replace `${VAR}` / `${VAR:default}` references with environment values.
///
/// A set variable wins over the default, even when it is empty. An unset variable with
/// no default keeps the reference text verbatim.
pub fn expand_env(text: &str) -> Cow<'_, str> {
    ENV_REFERENCE.replace_all(text, |caps: &Captures<'_>| {
        match (std::env::var(&caps[1]), caps.get(2)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => caps[0].to_string(),
        }
    })
}

/// Apply environment variable configuration to the loader.
///
/// Only fills settings the builder has not already set.
pub fn apply_env(loader: &mut ConfigLoader) -> Result<(), ConfigError> {
    if loader.config_dir().is_none()
        && let Some(dir) = env_var_or_none(ENV_CONFIG_DIR)
    {
        loader.set_config_dir(Some(PathBuf::from(dir)));
    }
    if loader.profile().is_none()
        && let Some(profile) = env_var_or_none(ENV_PROFILE)
    {
        loader.set_profile(Some(profile));
    }
    if loader.format().is_none()
        && let Some(format) = env_var_or_none(ENV_FORMAT)
    {
        loader.set_format(Some(format.parse()?));
    }
    Ok(())
}
