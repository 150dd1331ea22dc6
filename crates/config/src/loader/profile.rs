//! Profile selection and profile-specific rules.
//!
//! Responsibilities:
//! - Resolve the runtime profile (explicit, `STRATA_PROFILE`, test harness, default).
//! - Name the profile overlay file.
//! - Enforce the production logging guardrail.
//! - Stamp the runtime profile into the final tree.
//!
//! Does NOT handle:
//! - Loading or merging the overlay file (see `builder.rs`).
//!
//! Invariants:
//! - The runtime profile never comes from file content.
//! - After `inject_runtime_profile`, `app.profile` equals the runtime profile.

use tracing::warn;

use super::env::env_var_or_none;
use super::error::ConfigError;
use crate::constants::{
    ALLOW_DEBUG_IN_PROD_KEY, BASE_CONFIG_NAME, DEFAULT_LOGGING_LEVEL, DEFAULT_PROFILE,
    ENV_PROFILE, KNOWN_LOGGING_LEVELS, LOGGING_LEVEL_KEY, PRODUCTION_PROFILE,
    RUNTIME_PROFILE_KEY, TEST_PROFILE,
};
use crate::value::{Map, Value, ensure_map, lookup};

/// Resolves the runtime profile.
///
/// Precedence: `explicit`, then `STRATA_PROFILE`, then `test` when running under a
/// test harness, then `dev`.
pub fn resolve_profile(explicit: Option<&str>) -> String {
    if let Some(profile) = explicit.map(str::trim).filter(|p| !p.is_empty()) {
        return profile.to_string();
    }
    if let Some(profile) = env_var_or_none(ENV_PROFILE) {
        return profile;
    }
    if running_under_test_harness() {
        return TEST_PROFILE.to_string();
    }
    DEFAULT_PROFILE.to_string()
}

/// Best-effort detection of a test runner.
///
/// cargo-nextest exports `NEXTEST_RUN_ID`; `cargo test` binaries live in `target/*/deps`.
pub fn running_under_test_harness() -> bool {
    if std::env::var_os("NEXTEST_RUN_ID").is_some() {
        return true;
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| {
            exe.parent()
                .and_then(|dir| dir.file_name())
                .map(|name| name == "deps")
        })
        .unwrap_or(false)
}

/// Stem of the overlay file for `profile` (`application-<profile>`).
pub fn overlay_stem(profile: &str) -> String {
    format!("{BASE_CONFIG_NAME}-{profile}")
}

pub fn is_production(profile: &str) -> bool {
    profile == PRODUCTION_PROFILE
}

/// Normalises `logging.level` under the production profile.
///
/// A missing or unknown level becomes `INFO` with a warning. `DEBUG` is rejected unless
/// the top-level `allow_debug_in_prod` flag is `true`.
pub fn enforce_production_guardrail(tree: &mut Map, profile: &str) -> Result<(), ConfigError> {
    if !is_production(profile) {
        return Ok(());
    }

    let level = lookup(tree, LOGGING_LEVEL_KEY).cloned();
    match level {
        None => {
            warn!(
                profile = %profile,
                "No logging.level set for production profile; defaulting to {}",
                DEFAULT_LOGGING_LEVEL
            );
            set_logging_level(tree, DEFAULT_LOGGING_LEVEL);
        }
        Some(Value::String(level))
            if KNOWN_LOGGING_LEVELS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(&level)) =>
        {
            if level.eq_ignore_ascii_case("DEBUG") {
                let allowed = tree
                    .get(ALLOW_DEBUG_IN_PROD_KEY)
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if !allowed {
                    return Err(ConfigError::DebugLoggingInProduction {
                        profile: profile.to_string(),
                    });
                }
                warn!(profile = %profile, "DEBUG logging is enabled in production");
            }
        }
        Some(other) => {
            warn!(
                profile = %profile,
                value = ?other,
                "Invalid logging.level in production profile; defaulting to {}",
                DEFAULT_LOGGING_LEVEL
            );
            set_logging_level(tree, DEFAULT_LOGGING_LEVEL);
        }
    }
    Ok(())
}

fn set_logging_level(tree: &mut Map, level: &str) {
    let (parent, leaf) = split_last(LOGGING_LEVEL_KEY);
    ensure_map(tree, parent, |path, old| {
        warn!(
            "Replacing {} value at '{}' with a map to hold {}",
            old.type_name(),
            path,
            LOGGING_LEVEL_KEY
        );
    })
    .insert(leaf.to_string(), Value::from(level));
}

/// Forces `app.profile` to the runtime profile, warning if a file set something else.
pub fn inject_runtime_profile(tree: &mut Map, profile: &str) {
    if let Some(existing) = lookup(tree, RUNTIME_PROFILE_KEY)
        && existing.as_str() != Some(profile)
    {
        warn!(
            file_value = ?existing,
            runtime = %profile,
            "Ignoring app.profile from config files; the runtime profile '{}' is authoritative",
            profile
        );
    }

    let (parent, leaf) = split_last(RUNTIME_PROFILE_KEY);
    ensure_map(tree, parent, |path, old| {
        warn!(
            "Replacing {} value at '{}' with a map to hold {}",
            old.type_name(),
            path,
            RUNTIME_PROFILE_KEY
        );
    })
    .insert(leaf.to_string(), Value::from(profile));
}

fn split_last(dotted: &str) -> (&str, &str) {
    dotted.rsplit_once('.').unwrap_or(("", dotted))
}
