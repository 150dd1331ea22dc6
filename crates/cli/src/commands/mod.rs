//! CLI command implementations.

pub mod decrypt;
pub mod dump;
pub mod encrypt;
pub mod keygen;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use strata_config::{SecretKey, secret::resolve_key};

use crate::args::{Cli, Commands};

/// Runs the parsed command to completion.
pub fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Dump(args) => dump::run(args),
        Commands::Keygen { env_line } => keygen::run(env_line),
        Commands::Encrypt { key, text, stdin } => encrypt::run(key.as_deref(), text, stdin),
        Commands::Decrypt { key, token } => decrypt::run(key.as_deref(), &token),
    }
}

/// Resolves the key for `encrypt`/`decrypt`: `--key` if given, else the library key chain.
pub(crate) fn command_key(explicit: Option<&str>) -> Result<SecretKey> {
    let explicit = explicit
        .map(SecretKey::parse)
        .transpose()
        .context("Invalid --key value")?;
    Ok(resolve_key(explicit.as_ref())?)
}

/// Writes `content` to `path`, creating parent directories as needed.
pub(crate) fn write_to_file(content: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}
