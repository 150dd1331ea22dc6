//! Configuration loader builder implementation.
//!
//! Responsibilities:
//! - Provide a builder-pattern `ConfigLoader` (config dir, profile, format).
//! - Sequence a load: base file, base imports, profile overlay, overlay imports.
//! - Apply the production guardrail, runtime profile, secret wrapping and metadata.
//!
//! Does NOT handle:
//! - Direct environment variable parsing logic (delegated to env.rs).
//! - Import resolution details (delegated to imports.rs).
//! - Profile rules (delegated to profile.rs).
//!
//! Invariants / Assumptions:
//! - Builder methods take precedence over environment variables.
//! - The profile overlay is merged strictly after the base file and its imports, and
//!   before the overlay's own imports.
//! - Metadata is the last write to the tree.
//! - `load_dotenv()` must be called explicitly to enable `.env` file loading.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::env::apply_env;
use super::error::ConfigError;
use super::imports::{ImportResolver, extract_directives};
use super::profile::{
    enforce_production_guardrail, inject_runtime_profile, is_production, overlay_stem,
    resolve_profile,
};
use crate::config::{Config, Metadata};
use crate::constants::{
    BASE_CONFIG_NAME, ENV_DOTENV_DISABLED, META_KEY, META_ROOT_KEY, SUPPRESS_MERGE_WARNINGS_KEY,
};
use crate::format::ConfigFormat;
use crate::merge::merge_into;
use crate::secret::LazySecret;
use crate::value::{Map, Value, ensure_map};

/// Configuration loader that resolves a config directory into a `Config`.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config_dir: Option<PathBuf>,
    profile: Option<String>,
    format: Option<ConfigFormat>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if dotenv loading is disabled via environment variable.
    fn dotenv_disabled() -> bool {
        matches!(
            std::env::var(ENV_DOTENV_DISABLED).ok().as_deref(),
            Some("true") | Some("1")
        )
    }

    /// Load environment variables from .env file if present.
    ///
    /// If `DOTENV_DISABLED` environment variable is set to "true" or "1",
    /// the .env file will not be loaded (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The `.env` file exists but has invalid syntax (`ConfigError::DotenvParse`)
    /// - The `.env` file exists but cannot be read due to I/O errors (`ConfigError::DotenvIo`)
    ///
    /// Missing `.env` files are silently ignored (returns `Ok(self)`).
    pub fn load_dotenv(self) -> Result<Self, ConfigError> {
        if Self::dotenv_disabled() {
            return Ok(self);
        }

        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if Self::is_not_found(&e) => Ok(self),
            Err(dotenvy::Error::LineParse(_, idx)) => {
                Err(ConfigError::DotenvParse { error_index: idx })
            }
            Err(dotenvy::Error::Io(io_err)) => Err(ConfigError::DotenvIo {
                kind: io_err.kind(),
            }),
            Err(_) => Err(ConfigError::DotenvUnknown),
        }
    }

    fn is_not_found(err: &dotenvy::Error) -> bool {
        matches!(
            err,
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Set the directory holding `application.<ext>` and everything it imports.
    pub fn with_config_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Set the runtime profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the file format used for every file of the load.
    pub fn with_format(mut self, format: ConfigFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Fill unset settings from `STRATA_CONFIG_DIR`, `STRATA_PROFILE` and `STRATA_FORMAT`.
    pub fn from_env(mut self) -> Result<Self, ConfigError> {
        apply_env(&mut self)?;
        Ok(self)
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    pub fn format(&self) -> Option<ConfigFormat> {
        self.format
    }

    pub(crate) fn set_config_dir(&mut self, dir: Option<PathBuf>) {
        self.config_dir = dir;
    }

    pub(crate) fn set_profile(&mut self, profile: Option<String>) {
        self.profile = profile;
    }

    pub(crate) fn set_format(&mut self, format: Option<ConfigFormat>) {
        self.format = format;
    }

    /// Resolve the config directory into a `Config`.
    ///
    /// # Errors
    ///
    /// Fails on a missing base file, a missing `prod` overlay, any import error
    /// (traversal, cycle, not found, parse), or DEBUG logging under `prod` without
    /// `allow_debug_in_prod`.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let profile = resolve_profile(self.profile.as_deref());
        let format = self.format.unwrap_or_default();
        let config_dir = self
            .config_dir
            .as_deref()
            .ok_or(ConfigError::ConfigDirUnavailable)?;

        debug!(
            config_dir = %config_dir.display(),
            profile = %profile,
            format = %format,
            "Loading configuration"
        );

        let root = match config_dir.canonicalize() {
            Ok(root) => root,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::MissingBaseFile {
                    path: config_dir.join(format!(
                        "{BASE_CONFIG_NAME}.{}",
                        format.canonical_extension()
                    )),
                });
            }
            Err(source) => {
                return Err(ConfigError::FileRead {
                    path: config_dir.to_path_buf(),
                    source,
                });
            }
        };
        let mut resolver = ImportResolver::new(root, format);

        // Base file and its imports.
        let Some(base_file) = resolver.locate_stem(BASE_CONFIG_NAME)? else {
            return Err(ConfigError::MissingBaseFile {
                path: resolver.stem_candidates(BASE_CONFIG_NAME)[0].clone(),
            });
        };
        let mut tree = resolver.load_file(&base_file, None, None, 0)?;
        let mut suppress = suppress_flag(&tree);
        resolver.set_suppress_warnings(suppress);
        resolver.resolve(&mut tree, &base_file, std::slice::from_ref(&base_file))?;

        // Profile overlay, then the overlay's imports on top of everything so far.
        let overlay_name = overlay_stem(&profile);
        match resolver.locate_stem(&overlay_name)? {
            Some(overlay_file) => {
                let overlay_key = overlay_file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| overlay_name.clone());
                let mut overlay =
                    resolver.load_file(&overlay_file, Some(&base_file), Some(&overlay_key), 1)?;
                suppress |= suppress_flag(&overlay);
                resolver.set_suppress_warnings(suppress);

                let directives = extract_directives(&mut overlay, &overlay_file)?;
                merge_into(&mut tree, &overlay, "", suppress);
                let chain = [base_file.clone(), overlay_file.clone()];
                resolver.apply_directives(&mut tree, &directives, &overlay_file, &chain)?;
            }
            None if is_production(&profile) => {
                return Err(ConfigError::MissingProfileFile {
                    profile,
                    path: resolver.stem_candidates(&overlay_name)[0].clone(),
                });
            }
            None => {
                info!(
                    profile = %profile,
                    "No overlay file for profile '{}'; continuing with base config",
                    profile
                );
            }
        }

        enforce_production_guardrail(&mut tree, &profile)?;
        inject_runtime_profile(&mut tree, &profile);
        wrap_secrets(&mut tree);

        let metadata = Metadata::new(profile, resolver.into_trace());
        inject_metadata(&mut tree, &metadata);

        info!(
            profile = %metadata.profile(),
            files = metadata.import_trace().len(),
            "Configuration loaded"
        );
        Ok(Config::with_metadata(tree, metadata))
    }
}

/// Loads `config_dir` under `profile` with the default format (YAML unless
/// `STRATA_FORMAT` says otherwise).
pub fn load_config(profile: &str, config_dir: impl Into<PathBuf>) -> Result<Config, ConfigError> {
    ConfigLoader::new()
        .with_profile(profile)
        .with_config_dir(config_dir)
        .from_env()?
        .load()
}

fn suppress_flag(tree: &Map) -> bool {
    tree.get(SUPPRESS_MERGE_WARNINGS_KEY)
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Replaces every `ENC(...)` string leaf, including list items, with a lazy secret.
pub(crate) fn wrap_secrets(tree: &mut Map) {
    for value in tree.values_mut() {
        wrap_value(value);
    }
}

fn wrap_value(value: &mut Value) {
    match value {
        Value::String(text) => {
            if let Some(secret) = LazySecret::from_token(text) {
                *value = Value::Secret(secret);
            }
        }
        Value::List(items) => items.iter_mut().for_each(wrap_value),
        Value::Map(map) => wrap_secrets(map),
        _ => {}
    }
}

fn inject_metadata(tree: &mut Map, metadata: &Metadata) {
    ensure_map(tree, META_ROOT_KEY, |path, old| {
        warn!(
            "Replacing {} value at '{}' with a map to hold load metadata",
            old.type_name(),
            path
        );
    })
    .insert(META_KEY.to_string(), metadata.to_value());
}
