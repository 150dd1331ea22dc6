//! CLI exit codes for scripting and automation.
//!
//! Responsibilities:
//! - Define structured exit codes that scripts can use to distinguish error types.
//! - Map `ConfigError` and `SecretError` values found in an error chain to exit codes.
//!
//! Does NOT handle:
//! - Error message formatting (handled by anyhow Display).
//!
//! Invariants:
//! - Argument errors are reported by clap itself and exit with clap's own code.

use strata_config::{ConfigError, SecretError};
use thiserror::Error;

/// Structured exit codes for strata-cli.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Success - command completed successfully.
    Success = 0,

    /// General error - unhandled or generic failure.
    GeneralError = 1,

    /// The configuration directory could not be resolved into a tree.
    ///
    /// Scripts should fix the config files; retrying will not help.
    ConfigError = 2,

    /// A key was missing or invalid, or a token failed to decrypt.
    SecretError = 3,
}

impl ExitCode {
    /// Convert the exit code to an i32 for use with std::process::exit().
    pub const fn as_i32(self) -> i32 {
        self as u8 as i32
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(err: &ConfigError) -> Self {
        match err {
            ConfigError::Secret(_) => ExitCode::SecretError,
            ConfigError::DotenvParse { .. }
            | ConfigError::DotenvIo { .. }
            | ConfigError::DotenvUnknown
            | ConfigError::FileWrite { .. } => ExitCode::GeneralError,
            _ => ExitCode::ConfigError,
        }
    }
}

/// Failures that originate in the CLI itself.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Refusing to encrypt an empty value")]
    EmptyPlaintext,

    #[error("Failed to read plaintext from stdin")]
    Stdin(#[source] std::io::Error),
}

/// Extension trait for anyhow::Error to extract exit codes.
pub trait ExitCodeExt {
    /// Returns ExitCode::GeneralError if no library error is in the chain.
    fn exit_code(&self) -> ExitCode;
}

impl ExitCodeExt for anyhow::Error {
    fn exit_code(&self) -> ExitCode {
        for cause in self.chain() {
            if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
                return ExitCode::from(config_err);
            }
            if cause.downcast_ref::<SecretError>().is_some() {
                return ExitCode::SecretError;
            }
        }

        ExitCode::GeneralError
    }
}
