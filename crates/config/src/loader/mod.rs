//! Configuration loader for layered config directories.
//!
//! Responsibilities:
//! - Provide a builder-pattern `ConfigLoader` that resolves a config directory.
//! - Resolve `imports` directives recursively with an ordered provenance trace.
//! - Apply profile overlays and profile-specific rules.
//! - Enforce `DOTENV_DISABLED` gate to prevent accidental dotenv loading in tests.
//!
//! Does NOT handle:
//! - Deep-merge rules (see `merge.rs`).
//! - Secret decryption (see `secret.rs`).
//!
//! Invariants / Assumptions:
//! - Builder values take precedence over environment variables.
//! - `load_dotenv()` must be called explicitly to enable `.env` file loading.
//! - The `DOTENV_DISABLED` variable is checked before `dotenvy::dotenv()` is called.

mod builder;
mod env;
mod error;
mod imports;
mod profile;

#[cfg(test)]
mod tests;

pub use builder::{ConfigLoader, load_config};
pub use env::{env_var_or_none, expand_env};
pub use error::ConfigError;
pub use imports::ImportTraceEntry;
pub use profile::{resolve_profile, running_under_test_harness};
