//! CLI argument definitions and parsing.
//!
//! Responsibilities:
//! - Define the CLI structure using clap derive macros.
//! - Parse command-line arguments and environment variables.
//!
//! Non-responsibilities:
//! - Does not execute commands (see the `commands` module).
//! - Does not resolve configuration precedence; `ConfigLoader::from_env` does that.

use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use strata_config::ConfigFormat;

#[derive(Parser)]
#[command(name = "strata-cli")]
#[command(about = "Strata CLI - Inspect layered configuration and manage encrypted values", long_about = None)]
#[command(version)]
#[command(
    after_help = "Examples:\n  strata-cli dump --config-dir ./config --profile prod\n  strata-cli dump --config-dir ./config --output-format json --output merged.json\n  strata-cli keygen\n  strata-cli encrypt --text 'db-password'\n  echo -n 'db-password' | strata-cli encrypt --stdin\n  strata-cli decrypt 'ENC(...)'\n"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a config directory and print the merged tree
    Dump(DumpArgs),

    /// Generate a new random encryption key
    Keygen {
        /// Print the key as a `STRATA_SECRET_KEY=...` line suitable for a `.env` file
        #[arg(long)]
        env_line: bool,
    },

    /// Encrypt a value into an `ENC(...)` token
    #[command(group(ArgGroup::new("input").required(true).args(["text", "stdin"])))]
    Encrypt {
        /// Hex-encoded key (defaults to the registered key chain and STRATA_SECRET_KEY)
        #[arg(long)]
        key: Option<String>,

        /// Plaintext to encrypt
        #[arg(long)]
        text: Option<String>,

        /// Read the plaintext from stdin (one trailing newline is stripped)
        #[arg(long)]
        stdin: bool,
    },

    /// Decrypt an `ENC(...)` token and print the plaintext
    Decrypt {
        /// Hex-encoded key (defaults to the registered key chain and STRATA_SECRET_KEY)
        #[arg(long)]
        key: Option<String>,

        /// The token to decrypt, including the `ENC(` and `)` markers
        token: String,
    },
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Directory containing `application.<ext>` and its overlays.
    ///
    /// Can also be set via STRATA_CONFIG_DIR.
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Profile whose overlay is applied (falls back to STRATA_PROFILE, then `dev`)
    #[arg(long)]
    pub profile: Option<String>,

    /// Format of the config files (yml, yaml, json, toml)
    #[arg(long, value_name = "EXT")]
    pub format: Option<ConfigFormat>,

    /// Print decrypted secret values instead of the redaction placeholder
    #[arg(long)]
    pub secrets: bool,

    /// Write the result to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_dump_defaults() {
        let cli = Cli::try_parse_from(["strata-cli", "dump"]).unwrap();
        match cli.command {
            Commands::Dump(args) => {
                assert!(args.config_dir.is_none());
                assert!(!args.secrets);
                assert_eq!(args.output_format, OutputFormat::Yaml);
            }
            _ => panic!("expected dump"),
        }
    }

    #[test]
    fn test_dump_parses_format_alias() {
        let cli =
            Cli::try_parse_from(["strata-cli", "dump", "--format", "yaml", "--profile", "qa"])
                .unwrap();
        match cli.command {
            Commands::Dump(args) => {
                assert_eq!(args.format, Some(ConfigFormat::Yaml));
                assert_eq!(args.profile.as_deref(), Some("qa"));
            }
            _ => panic!("expected dump"),
        }
    }

    #[test]
    fn test_dump_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["strata-cli", "dump", "--format", "ini"]).is_err());
    }

    #[test]
    fn test_encrypt_requires_exactly_one_input() {
        assert!(Cli::try_parse_from(["strata-cli", "encrypt"]).is_err());
        assert!(
            Cli::try_parse_from(["strata-cli", "encrypt", "--text", "x", "--stdin"]).is_err()
        );
        assert!(Cli::try_parse_from(["strata-cli", "encrypt", "--stdin"]).is_ok());
    }
}
