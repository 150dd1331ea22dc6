//! Dump command implementation.

use anyhow::{Context, Result};
use strata_config::{ConfigLoader, ConfigNode};
use tracing::{debug, info};

use crate::args::{DumpArgs, OutputFormat};
use crate::commands::write_to_file;

pub fn run(args: DumpArgs) -> Result<()> {
    let mut loader = ConfigLoader::new();

    // Blank values fall through to STRATA_CONFIG_DIR.
    if let Some(dir) = args
        .config_dir
        .filter(|dir| !dir.to_string_lossy().trim().is_empty())
    {
        loader = loader.with_config_dir(dir);
    }
    if let Some(profile) = args.profile {
        loader = loader.with_profile(profile);
    }
    if let Some(format) = args.format {
        loader = loader.with_format(format);
    }

    let loader = loader
        .from_env()
        .context("Failed to load configuration from environment")?;
    let config = loader.load().context("Failed to load configuration")?;

    if let Some(metadata) = config.metadata() {
        info!(
            profile = metadata.profile(),
            files = metadata.import_trace().len(),
            "Configuration loaded"
        );
        for source in metadata.sources() {
            debug!(path = %source.display(), "Source file");
        }
    }
    debug!(top_level_keys = config.keys().count(), "Rendering configuration");

    let output = match args.output_format {
        OutputFormat::Yaml => config.to_yaml_string(args.secrets),
        OutputFormat::Json => config.to_json_string(args.secrets).map(|s| s + "\n"),
    }
    .context("Failed to render configuration")?;

    if let Some(ref path) = args.output {
        write_to_file(&output, path)
            .with_context(|| format!("Failed to write output to {}", path.display()))?;
        eprintln!(
            "Configuration written to {} ({:?} format)",
            path.display(),
            args.output_format
        );
    } else {
        print!("{}", output);
    }

    Ok(())
}
