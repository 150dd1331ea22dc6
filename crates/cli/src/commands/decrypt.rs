//! Decrypt command implementation.

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use strata_config::{LazySecret, SecretError};

use crate::commands::command_key;

pub fn run(key: Option<&str>, token: &str) -> Result<()> {
    let secret = LazySecret::from_token(token.trim())
        .ok_or_else(|| SecretError::MalformedToken("expected ENC(<hex>)".to_string()))?;
    let key = command_key(key)?;

    let plaintext = secret
        .get(Some(&key))
        .context("Failed to decrypt token")?;
    println!("{}", plaintext.expose_secret());
    Ok(())
}
