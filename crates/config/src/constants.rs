//! Centralized constants for the strata workspace.
//!
//! This module contains file names, profile markers, and environment variable
//! names used across crates to avoid magic string duplication.

// =============================================================================
// File Layout
// =============================================================================

/// Stem of the base configuration file (`application.<ext>`).
pub const BASE_CONFIG_NAME: &str = "application";

/// Key under which a file declares the files it imports.
pub const IMPORTS_KEY: &str = "imports";

/// Top-level flag that silences partial-override warnings for a whole load.
pub const SUPPRESS_MERGE_WARNINGS_KEY: &str = "suppress_config_merge_warnings";

// =============================================================================
// Profiles
// =============================================================================

/// Profile that requires an overlay file and enforces the logging guardrail.
pub const PRODUCTION_PROFILE: &str = "prod";

/// Profile selected when the process is running under a test harness.
pub const TEST_PROFILE: &str = "test";

/// Profile used when nothing else selects one.
pub const DEFAULT_PROFILE: &str = "dev";

/// Dotted key that always carries the runtime profile in the final tree.
pub const RUNTIME_PROFILE_KEY: &str = "app.profile";

// =============================================================================
// Production Logging Guardrail
// =============================================================================

/// Dotted key holding the logging verbosity.
pub const LOGGING_LEVEL_KEY: &str = "logging.level";

/// Top-level flag that permits DEBUG logging under the production profile.
pub const ALLOW_DEBUG_IN_PROD_KEY: &str = "allow_debug_in_prod";

/// Level substituted when production has no usable logging level.
pub const DEFAULT_LOGGING_LEVEL: &str = "INFO";

/// Logging levels accepted by the guardrail (compared case-insensitively).
pub const KNOWN_LOGGING_LEVELS: &[&str] = &[
    "TRACE", "DEBUG", "INFO", "WARN", "WARNING", "ERROR", "CRITICAL",
];

// =============================================================================
// Metadata
// =============================================================================

/// Root key of the injected metadata (`strata._meta`).
pub const META_ROOT_KEY: &str = "strata";

/// Child key of [`META_ROOT_KEY`] holding profile, sources, and import trace.
pub const META_KEY: &str = "_meta";

// =============================================================================
// Secrets
// =============================================================================

/// Text emitted in place of a secret whenever secrets are not revealed.
pub const REDACTED_PLACEHOLDER: &str = "ENC(**REDACTED**)";

/// Length in bytes of an AES-256 key.
pub const SECRET_KEY_LEN: usize = 32;

/// Length in bytes of an AES-GCM nonce.
pub const NONCE_LEN: usize = 12;

// =============================================================================
// Environment Variables
// =============================================================================

/// Selects the active profile when none is passed explicitly.
pub const ENV_PROFILE: &str = "STRATA_PROFILE";

/// Selects the config directory when none is passed explicitly.
pub const ENV_CONFIG_DIR: &str = "STRATA_CONFIG_DIR";

/// Selects the file format when none is passed explicitly.
pub const ENV_FORMAT: &str = "STRATA_FORMAT";

/// Last link of the secret key resolution chain.
pub const ENV_SECRET_KEY: &str = "STRATA_SECRET_KEY";

/// Disables `.env` loading when set to `1` or `true`.
pub const ENV_DOTENV_DISABLED: &str = "DOTENV_DISABLED";
