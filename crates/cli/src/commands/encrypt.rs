//! Encrypt command implementation.

use std::io::Read;

use anyhow::{Context, Result};
use strata_config::encrypt_value;

use crate::commands::command_key;
use crate::error::CliError;

pub fn run(key: Option<&str>, text: Option<String>, stdin: bool) -> Result<()> {
    let plaintext = match text {
        Some(text) => text,
        None if stdin => read_stdin()?,
        None => return Err(CliError::EmptyPlaintext.into()),
    };
    if plaintext.is_empty() {
        return Err(CliError::EmptyPlaintext.into());
    }

    let key = command_key(key)?;
    let token = encrypt_value(&plaintext, &key).context("Failed to encrypt value")?;
    println!("{}", token);
    Ok(())
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(CliError::Stdin)?;
    Ok(strip_trailing_newline(buffer))
}

fn strip_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
