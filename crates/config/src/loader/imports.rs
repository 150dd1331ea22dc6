//! Recursive `imports` resolution with provenance tracking.
//!
//! Responsibilities:
//! - Find `imports` directives anywhere in a map tree and remember where they were declared.
//! - Map each import key to a file inside the config root (with extension fallback).
//! - Load imported files depth-first and merge them at the declaring position.
//! - Record every opened file in the import trace, in open order.
//!
//! Does NOT handle:
//! - Base/profile sequencing (see `builder.rs`).
//! - Merge rules (see `merge.rs`).
//!
//! Invariants:
//! - No file outside the canonical config root is ever opened, including via symlinks.
//! - The import graph along any path is acyclic; revisiting an ancestor is an error.
//! - Trace `order` values are assigned consecutively from 0, parent before child.
//! - Directives inside list items are resolved into that item; lists of lists are data.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use super::env::expand_env;
use super::error::ConfigError;
use crate::constants::IMPORTS_KEY;
use crate::format::ConfigFormat;
use crate::merge::{join_path, merge_into};
use crate::value::{Map, Value};

/// One opened configuration file, in load order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTraceEntry {
    /// Absolute, canonical path of the file.
    pub file: PathBuf,
    /// File whose directive (or overlay step) caused this one to load.
    pub imported_by: Option<PathBuf>,
    /// Literal import string, or the overlay file name for the profile overlay.
    pub import_key: Option<String>,
    pub depth: usize,
    pub order: usize,
}

impl ImportTraceEntry {
    /// Renders the entry as a tree node for the injected metadata.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("file".to_string(), path_value(&self.file));
        map.insert(
            "imported_by".to_string(),
            self.imported_by.as_deref().map_or(Value::Null, path_value),
        );
        map.insert(
            "import_key".to_string(),
            self.import_key.clone().map_or(Value::Null, Value::String),
        );
        map.insert("depth".to_string(), Value::Integer(self.depth as i64));
        map.insert("order".to_string(), Value::Integer(self.order as i64));
        Value::Map(map)
    }
}

fn path_value(path: &Path) -> Value {
    Value::String(path.display().to_string())
}

/// One step from a map towards the node that declared an `imports` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PathSegment {
    Key(String),
    /// Item of the list reached by the preceding `Key`.
    Index(usize),
}

/// Renders a position as `a.b[2].c` for logs and errors; the root renders as `""`.
pub(crate) struct Position<'a>(pub &'a [PathSegment]);

impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// An `imports` list together with the position that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportDirective {
    /// Path of the map holding the `imports` key; empty for the root.
    pub position: Vec<PathSegment>,
    pub keys: Vec<String>,
}

/// Loads files under one config root and resolves their imports.
pub(crate) struct ImportResolver {
    root: PathBuf,
    format: ConfigFormat,
    suppress_warnings: bool,
    trace: Vec<ImportTraceEntry>,
}

impl ImportResolver {
    /// `root` must already be canonical.
    pub fn new(root: PathBuf, format: ConfigFormat) -> Self {
        Self {
            root,
            format,
            suppress_warnings: false,
            trace: Vec::new(),
        }
    }

    pub fn set_suppress_warnings(&mut self, suppress: bool) {
        self.suppress_warnings = suppress;
    }

    pub fn into_trace(self) -> Vec<ImportTraceEntry> {
        self.trace
    }

    /// Candidate paths for a top-level file stem (`application`, `application-dev`).
    pub fn stem_candidates(&self, stem: &str) -> Vec<PathBuf> {
        self.format
            .extensions()
            .iter()
            .map(|ext| self.root.join(format!("{stem}.{ext}")))
            .collect()
    }

    /// Reads, expands and parses a file, then records it in the trace.
    ///
    /// `path` must be canonical.
    pub fn load_file(
        &mut self,
        path: &Path,
        imported_by: Option<&Path>,
        import_key: Option<&str>,
        depth: usize,
    ) -> Result<Map, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
        let tree = self.format.parse(&expand_env(text), path)?;

        let order = self.trace.len();
        debug!(path = %path.display(), depth, order, "Loaded config file");
        self.trace.push(ImportTraceEntry {
            file: path.to_path_buf(),
            imported_by: imported_by.map(Path::to_path_buf),
            import_key: import_key.map(str::to_string),
            depth,
            order,
        });
        Ok(tree)
    }

    /// Resolves every directive in `tree`, which was loaded from `current_file`.
    ///
    /// `chain` lists the files currently being resolved, outermost first, and must end
    /// with `current_file`.
    pub fn resolve(
        &mut self,
        tree: &mut Map,
        current_file: &Path,
        chain: &[PathBuf],
    ) -> Result<(), ConfigError> {
        let directives = extract_directives(tree, current_file)?;
        self.apply_directives(tree, &directives, current_file, chain)
    }

    /// Loads the files named by `directives` and merges each one into `target` at the
    /// position its directive was declared.
    pub fn apply_directives(
        &mut self,
        target: &mut Map,
        directives: &[ImportDirective],
        current_file: &Path,
        chain: &[PathBuf],
    ) -> Result<(), ConfigError> {
        for directive in directives {
            for key in &directive.keys {
                let content = self.import(key, current_file, chain)?;
                let rendered = Position(&directive.position).to_string();
                let Some(node) = node_at(target, &directive.position) else {
                    warn!(
                        position = %rendered,
                        import_key = %key,
                        "List item at '{}' no longer exists; imported content dropped",
                        rendered
                    );
                    continue;
                };
                merge_into(node, &content, &rendered, self.suppress_warnings);
            }
        }
        Ok(())
    }

    /// Loads one import and everything it imports, fully merged.
    fn import(
        &mut self,
        import_key: &str,
        importer: &Path,
        chain: &[PathBuf],
    ) -> Result<Map, ConfigError> {
        let file = self.locate(import_key, importer)?;

        if chain.contains(&file) {
            let rendered = chain
                .iter()
                .chain(std::iter::once(&file))
                .map(|path| self.display_relative(path))
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ConfigError::CircularImport { chain: rendered });
        }

        let mut tree = self.load_file(&file, Some(importer), Some(import_key), chain.len())?;

        let mut nested_chain = chain.to_vec();
        nested_chain.push(file.clone());
        self.resolve(&mut tree, &file, &nested_chain)?;
        Ok(tree)
    }

    /// Finds the top-level file for `stem`, if any, as a canonical path inside the root.
    pub fn locate_stem(&self, stem: &str) -> Result<Option<PathBuf>, ConfigError> {
        self.find_contained(stem, self.stem_candidates(stem))
            .map(|found| found.ok())
    }

    /// Maps an import key to an existing, canonical file inside the root.
    fn locate(&self, import_key: &str, importer: &Path) -> Result<PathBuf, ConfigError> {
        let candidates: Vec<PathBuf> = if self.format.matches_path(Path::new(import_key)) {
            vec![self.root.join(import_key)]
        } else {
            self.stem_candidates(import_key)
        };

        self.find_contained(import_key, candidates)?
            .map_err(|candidates| ConfigError::ImportNotFound {
                import_key: import_key.to_string(),
                importer: importer.to_path_buf(),
                candidates,
            })
    }

    /// Returns the first existing candidate, canonicalized, or every normalized
    /// candidate when none exists.
    ///
    /// Containment is checked for every candidate before any of them touches the disk,
    /// and again on the canonical path so symlinks cannot leave the root.
    fn find_contained(
        &self,
        key: &str,
        candidates: Vec<PathBuf>,
    ) -> Result<Result<PathBuf, Vec<PathBuf>>, ConfigError> {
        let traversal = || ConfigError::PathTraversal {
            import_key: key.to_string(),
            root: self.root.clone(),
        };

        let candidates = candidates
            .iter()
            .map(|candidate| normalize_lexically(candidate))
            .collect::<Vec<_>>();
        if candidates
            .iter()
            .any(|candidate| !candidate.starts_with(&self.root))
        {
            return Err(traversal());
        }

        let Some(found) = candidates.iter().find(|candidate| candidate.is_file()) else {
            return Ok(Err(candidates));
        };

        let canonical = found.canonicalize().map_err(|source| ConfigError::FileRead {
            path: found.clone(),
            source,
        })?;
        if !canonical.starts_with(&self.root) {
            return Err(traversal());
        }
        Ok(Ok(canonical))
    }

    fn display_relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Removes every `imports` key from `tree` and returns the directives in pre-order:
/// a map's own directive first, then its child maps (and maps inside child lists) in
/// key order.
pub(crate) fn extract_directives(
    tree: &mut Map,
    file: &Path,
) -> Result<Vec<ImportDirective>, ConfigError> {
    let mut directives = Vec::new();
    collect_directives(tree, file, &mut Vec::new(), &mut directives)?;
    Ok(directives)
}

fn collect_directives(
    tree: &mut Map,
    file: &Path,
    position: &mut Vec<PathSegment>,
    out: &mut Vec<ImportDirective>,
) -> Result<(), ConfigError> {
    if let Some(value) = tree.remove(IMPORTS_KEY) {
        let invalid = || ConfigError::InvalidImports {
            file: file.to_path_buf(),
            position: join_path(&Position(position).to_string(), IMPORTS_KEY),
        };
        let keys = match value {
            Value::Null => Vec::new(),
            Value::List(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(key) => Ok(key),
                    _ => Err(invalid()),
                })
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(invalid()),
        };
        if !keys.is_empty() {
            out.push(ImportDirective {
                position: position.clone(),
                keys,
            });
        }
    }

    for (key, child) in tree.iter_mut() {
        position.push(PathSegment::Key(key.clone()));
        match child {
            Value::Map(child) => collect_directives(child, file, position, out)?,
            Value::List(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    if let Value::Map(item) = item {
                        position.push(PathSegment::Index(index));
                        collect_directives(item, file, position, out)?;
                        position.pop();
                    }
                }
            }
            _ => {}
        }
        position.pop();
    }
    Ok(())
}

/// Walks `position` from `target`, creating missing maps and replacing scalars in the
/// way. Returns `None` when a list item on the way is gone or is no longer a map.
fn node_at<'a>(target: &'a mut Map, position: &[PathSegment]) -> Option<&'a mut Map> {
    let mut node = target;
    let mut segments = position.iter().enumerate().peekable();
    while let Some((depth, segment)) = segments.next() {
        let PathSegment::Key(key) = segment else {
            return None;
        };

        if let Some((_, PathSegment::Index(index))) = segments.peek() {
            let index = *index;
            segments.next();
            node = match node.get_mut(key) {
                Some(Value::List(items)) => match items.get_mut(index) {
                    Some(Value::Map(item)) => item,
                    _ => return None,
                },
                _ => return None,
            };
            continue;
        }

        let slot = node
            .entry(key.clone())
            .or_insert_with(|| Value::Map(Map::new()));
        if !matches!(slot, Value::Map(_)) {
            let path = Position(&position[..=depth]).to_string();
            warn!(
                position = %path,
                "Replacing {} value at '{}' with a map to hold imported content",
                slot.type_name(),
                path
            );
            *slot = Value::Map(Map::new());
        }
        node = match slot {
            Value::Map(child) => child,
            _ => unreachable!("slot was just replaced with a map"),
        };
    }
    Some(node)
}

/// Resolves `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
