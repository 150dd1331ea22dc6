//! Deep merge of configuration trees.
//!
//! Responsibilities:
//! - Combine an overlay tree onto a base tree: maps recurse, everything else is replaced.
//! - Report added and overridden keys at debug level.
//! - Warn once per map level when an overlay only partially overrides a base map.
//!
//! Does NOT handle:
//! - Import resolution or file ordering (see `loader/`).
//!
//! Invariants:
//! - The overlay is never mutated.
//! - Merging never fails and never panics.
//! - An empty overlay map is a no-op and never warns.

use tracing::{debug, warn};

use crate::value::{Map, Value};

/// Returns `overlay` merged onto a copy of `base`.
pub fn merge(base: &Map, overlay: &Map, suppress_warnings: bool) -> Map {
    let mut merged = base.clone();
    merge_into(&mut merged, overlay, "", suppress_warnings);
    merged
}

/// Merges `overlay` onto `base` in place.
///
/// `path` is the dotted position of `base` inside the full tree, used only for log
/// messages; pass `""` for the root.
pub fn merge_into(base: &mut Map, overlay: &Map, path: &str, suppress_warnings: bool) {
    if overlay.is_empty() {
        return;
    }

    if !suppress_warnings {
        let missing: Vec<&str> = base
            .keys()
            .filter(|key| !overlay.contains_key(*key))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            warn!(
                section = %display_path(path),
                missing = ?missing,
                "Config section '{}' partially overridden; keys kept from earlier layers: {}",
                display_path(path),
                missing.join(", ")
            );
        }
    }

    for (key, incoming) in overlay {
        let child_path = join_path(path, key);
        match (base.get_mut(key), incoming) {
            (Some(Value::Map(existing)), Value::Map(incoming)) => {
                merge_into(existing, incoming, &child_path, suppress_warnings);
            }
            (Some(existing), incoming) => {
                if existing != incoming {
                    debug!(key = %child_path, "Overriding config value");
                    *existing = incoming.clone();
                }
            }
            (None, incoming) => {
                debug!(key = %child_path, "Adding config value");
                base.insert(key.clone(), incoming.clone());
            }
        }
    }
}

/// Joins a dotted parent path and a child key.
pub(crate) fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "<root>" } else { path }
}
