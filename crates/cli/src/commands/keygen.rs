//! Keygen command implementation.

use anyhow::Result;
use strata_config::SecretKey;
use strata_config::constants::ENV_SECRET_KEY;
use tracing::info;

pub fn run(env_line: bool) -> Result<()> {
    let key = SecretKey::generate();
    info!("Generated a new 256-bit key");

    if env_line {
        println!("{}={}", ENV_SECRET_KEY, key.expose_hex());
    } else {
        println!("{}", key.expose_hex());
    }
    Ok(())
}
