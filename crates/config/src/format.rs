//! Configuration file formats and their parser adapters.
//!
//! Responsibilities:
//! - Name the supported syntaxes and their file extensions (canonical plus aliases).
//! - Parse file text into a `Map`, one adapter per syntax.
//!
//! Does NOT handle:
//! - Environment expansion (applied to the text before `parse`, see `loader/env.rs`).
//! - Locating files on disk (see `loader/imports.rs`).
//!
//! Invariants:
//! - A single format is active for a whole load; files of other syntaxes are never read.
//! - The root of every parsed document is a map. An empty YAML document is an empty map.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::loader::ConfigError;
use crate::value::{Map, Value};

/// File syntax used for an entire load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Extension tried first when building candidate paths.
    pub fn canonical_extension(self) -> &'static str {
        self.extensions()[0]
    }

    /// All extensions of this format, in candidate order.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ConfigFormat::Yaml => &["yml", "yaml"],
            ConfigFormat::Json => &["json"],
            ConfigFormat::Toml => &["toml"],
        }
    }

    /// Format owning a file extension, if any.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        [ConfigFormat::Yaml, ConfigFormat::Json, ConfigFormat::Toml]
            .into_iter()
            .find(|format| format.extensions().contains(&ext.as_str()))
    }

    /// Whether `path` already carries one of this format's extensions.
    pub fn matches_path(self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    /// Parses `text` (already env-expanded) read from `path`.
    pub fn parse(self, text: &str, path: &Path) -> Result<Map, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        };

        let root: Value = match self {
            ConfigFormat::Yaml => {
                if text.trim().is_empty() {
                    return Ok(Map::new());
                }
                serde_yaml::from_str(text).map_err(|e| parse_error(e.to_string()))?
            }
            ConfigFormat::Json => {
                serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?
            }
            ConfigFormat::Toml => toml::from_str(text).map_err(|e| parse_error(e.to_string()))?,
        };

        match root {
            Value::Map(map) => Ok(map),
            // A YAML document holding only comments parses to null.
            Value::Null => Ok(Map::new()),
            other => Err(parse_error(format!(
                "top-level value must be a mapping, found {}",
                other.type_name()
            ))),
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_extension())
    }
}

impl FromStr for ConfigFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim().trim_start_matches('.'))
            .ok_or_else(|| ConfigError::UnsupportedFormat(s.to_string()))
    }
}
