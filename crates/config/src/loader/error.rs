//! Error types for configuration loading.
//!
//! Responsibilities:
//! - Define error variants for every configuration loading failure.
//! - Carry enough context (paths, import chains, key names) to act on a failure.
//!
//! Does NOT handle:
//! - Secret decryption errors in detail (see `encryption.rs`; wrapped here via `Secret`).
//!
//! Invariants:
//! - All error variants include context for debugging (paths, keys, chains).
//! - Dotenv errors NEVER include raw .env line contents to prevent secret leakage.
//! - Error messages never include decrypted secret values.

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

use crate::encryption::SecretError;

/// Errors that can occur during configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),

    #[error("Failed to parse config file at {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported config format '{0}' (expected yml, yaml, json, or toml)")]
    UnsupportedFormat(String),

    #[error("Invalid 'imports' in {} at '{position}': expected a list of strings", file.display())]
    InvalidImports { file: PathBuf, position: String },

    #[error("Import '{import_key}' escapes the config root {}", root.display())]
    PathTraversal { import_key: String, root: PathBuf },

    #[error("Circular import detected: {chain}")]
    CircularImport { chain: String },

    #[error(
        "Import '{import_key}' from {} not found (tried: {})",
        importer.display(),
        format_candidates(candidates)
    )]
    ImportNotFound {
        import_key: String,
        importer: PathBuf,
        candidates: Vec<PathBuf>,
    },

    #[error("Base config file not found at {}", path.display())]
    MissingBaseFile { path: PathBuf },

    #[error("Profile '{profile}' requires an overlay file, none found at {}", path.display())]
    MissingProfileFile { profile: String, path: PathBuf },

    #[error(
        "DEBUG logging is not allowed in profile '{profile}'. Set 'allow_debug_in_prod: true' to permit it"
    )]
    DebugLoggingInProduction { profile: String },

    #[error("No config directory given. Pass one explicitly or set STRATA_CONFIG_DIR")]
    ConfigDirUnavailable,

    #[error("A non-empty profile is required")]
    MissingProfile,

    #[error("Configuration has already been initialized")]
    AlreadyInitialized,

    #[error("Configuration has not been initialized")]
    NotInitialized,

    #[error(transparent)]
    Secret(#[from] SecretError),

    /// Failed to parse the `.env` file due to invalid syntax.
    ///
    /// SAFETY: This error only includes the byte index of the parse failure,
    /// NOT the offending line content, to prevent leaking secrets.
    #[error(
        "Failed to parse .env file at position {error_index}. Hint: set DOTENV_DISABLED=1 to skip .env loading"
    )]
    DotenvParse { error_index: usize },

    /// Failed to read the `.env` file due to an I/O error.
    #[error("Failed to read .env file: {kind}")]
    DotenvIo { kind: ErrorKind },

    /// Unknown dotenv error (future variants from dotenvy crate).
    #[error("Failed to load .env file. Hint: set DOTENV_DISABLED=1 to skip .env loading")]
    DotenvUnknown,
}

fn format_candidates(candidates: &[PathBuf]) -> String {
    candidates
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
