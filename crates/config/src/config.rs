//! Resolved configuration and read access to it.
//!
//! Responsibilities:
//! - Own the final tree produced by `ConfigLoader::load`, plus its typed load metadata.
//! - Offer dotted-key lookups and typed getters on the root and on any nested section.
//! - Serialize to plain data, YAML or JSON with secrets redacted unless asked otherwise.
//!
//! Does NOT handle:
//! - Building the tree (see `loader/`).
//!
//! Invariants:
//! - Lookups never modify the tree.
//! - Secrets are only decrypted when `reveal_secrets` is `true`.

use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use serde::{Serialize, Serializer};

use crate::constants::REDACTED_PLACEHOLDER;
use crate::format::ConfigFormat;
use crate::loader::{ConfigError, ImportTraceEntry};
use crate::secret::LazySecret;
use crate::value::{Map, Value, lookup};

/// Provenance of a load: the runtime profile and every file opened, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    profile: String,
    import_trace: Vec<ImportTraceEntry>,
}

impl Metadata {
    pub fn new(profile: String, import_trace: Vec<ImportTraceEntry>) -> Self {
        Self {
            profile,
            import_trace,
        }
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub fn import_trace(&self) -> &[ImportTraceEntry] {
        &self.import_trace
    }

    /// Files in load order. Always aligned with [`Metadata::import_trace`].
    pub fn sources(&self) -> Vec<&Path> {
        self.import_trace
            .iter()
            .map(|entry| entry.file.as_path())
            .collect()
    }

    /// Renders the metadata as the tree stored under `strata._meta`.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("profile".to_string(), Value::from(self.profile.as_str()));
        map.insert(
            "sources".to_string(),
            Value::List(
                self.sources()
                    .into_iter()
                    .map(|path| Value::String(path.display().to_string()))
                    .collect(),
            ),
        );
        map.insert(
            "import_trace".to_string(),
            Value::List(
                self.import_trace
                    .iter()
                    .map(ImportTraceEntry::to_value)
                    .collect(),
            ),
        );
        Value::Map(map)
    }
}

/// Read access shared by the whole configuration and any nested section of it.
pub trait ConfigNode {
    /// The map this node wraps.
    fn as_map(&self) -> &Map;

    /// Looks up a dotted key such as `server.port`.
    fn get(&self, dotted: &str) -> Option<&Value> {
        lookup(self.as_map(), dotted)
    }

    fn get_or(&self, dotted: &str, default: Value) -> Value {
        self.get(dotted).cloned().unwrap_or(default)
    }

    fn get_str(&self, dotted: &str) -> Option<&str> {
        self.get(dotted).and_then(Value::as_str)
    }

    fn get_bool(&self, dotted: &str) -> Option<bool> {
        self.get(dotted).and_then(Value::as_bool)
    }

    fn get_i64(&self, dotted: &str) -> Option<i64> {
        self.get(dotted).and_then(Value::as_i64)
    }

    fn get_f64(&self, dotted: &str) -> Option<f64> {
        self.get(dotted).and_then(Value::as_f64)
    }

    fn get_secret(&self, dotted: &str) -> Option<&LazySecret> {
        self.get(dotted).and_then(Value::as_secret)
    }

    /// The nested map at `dotted`, wrapped so it offers this same interface.
    fn section(&self, dotted: &str) -> Option<ConfigView<'_>> {
        self.get(dotted)
            .and_then(Value::as_map)
            .map(|map| ConfigView { map })
    }

    fn contains_key(&self, dotted: &str) -> bool {
        self.get(dotted).is_some()
    }

    fn keys(&self) -> std::collections::btree_map::Keys<'_, String, Value> {
        self.as_map().keys()
    }

    /// Deep copy as plain values.
    ///
    /// With `reveal_secrets == false` every secret becomes `ENC(**REDACTED**)` and nothing
    /// is decrypted. With `true`, every secret is decrypted and any failure is returned.
    fn to_dict(&self, reveal_secrets: bool) -> Result<Map, ConfigError> {
        plain_map(self.as_map(), reveal_secrets)
    }
}

fn plain_map(map: &Map, reveal: bool) -> Result<Map, ConfigError> {
    map.iter()
        .map(|(key, value)| Ok((key.clone(), plain_value(value, reveal)?)))
        .collect()
}

fn plain_value(value: &Value, reveal: bool) -> Result<Value, ConfigError> {
    Ok(match value {
        Value::Map(map) => Value::Map(plain_map(map, reveal)?),
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|item| plain_value(item, reveal))
                .collect::<Result<_, _>>()?,
        ),
        Value::Secret(secret) if reveal => {
            Value::String(secret.get(None)?.expose_secret().to_string())
        }
        Value::Secret(_) => Value::from(REDACTED_PLACEHOLDER),
        other => other.clone(),
    })
}

/// A fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    data: Map,
    metadata: Option<Metadata>,
}

impl Config {
    /// Wraps an already-built tree. It carries no load metadata.
    pub fn new(data: Map) -> Self {
        Self {
            data,
            metadata: None,
        }
    }

    pub(crate) fn with_metadata(data: Map, metadata: Metadata) -> Self {
        Self {
            data,
            metadata: Some(metadata),
        }
    }

    /// Load provenance, present on configs produced by `ConfigLoader::load`.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn into_map(self) -> Map {
        self.data
    }

    pub fn to_yaml_string(&self, reveal_secrets: bool) -> Result<String, ConfigError> {
        serde_yaml::to_string(&self.to_dict(reveal_secrets)?)
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn to_json_string(&self, reveal_secrets: bool) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(&self.to_dict(reveal_secrets)?)
            .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Writes the configuration to `path`: JSON for a `.json` path, YAML otherwise.
    pub fn dump(&self, path: &Path, reveal_secrets: bool) -> Result<(), ConfigError> {
        let rendered = match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ConfigFormat::from_extension(ext) == Some(ConfigFormat::Json) => {
                self.to_json_string(reveal_secrets)?
            }
            _ => self.to_yaml_string(reveal_secrets)?,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::FileWrite {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, rendered).map_err(|source| ConfigError::FileWrite {
            path: PathBuf::from(path),
            source,
        })
    }
}

impl ConfigNode for Config {
    fn as_map(&self) -> &Map {
        &self.data
    }
}

impl Serialize for Config {
    /// Always redacted.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.data.serialize(serializer)
    }
}

/// A borrowed nested section of a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfigView<'a> {
    map: &'a Map,
}

impl<'a> ConfigView<'a> {
    pub fn new(map: &'a Map) -> Self {
        Self { map }
    }
}

impl ConfigNode for ConfigView<'_> {
    fn as_map(&self) -> &Map {
        self.map
    }
}
