//! Config store: line-oriented key/value files and the test root layout.
//!
//! Every question group directory carries a `CONFIG` file, the test root may
//! carry one too, and each test case is a `<id>.test` descriptor next to its
//! `<id>.solution`. All of them share one format:
//!
//! ```text
//! # comment
//! class: "EvalTest"
//! func: add
//! doc: """
//! spans
//! several lines
//! """
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Name of the per-directory config file.
pub const CONFIG_FILE: &str = "CONFIG";

const BLOCK_DELIMITER: &str = "\"\"\"";

/// A parsed key/value file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigMap {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl ConfigMap {
    /// An empty map attributed to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// File this map was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value of a key that must be present.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingKey {
            path: self.path.clone(),
            key: key.to_string(),
        })
    }

    /// `true` only if the key is present and reads `true` in any case.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }

    /// Whitespace-separated list value; empty when the key is absent.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Numeric value, `None` when the key is absent.
    pub fn number(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidValue {
                path: self.path.clone(),
                key: key.to_string(),
                message: format!("'{raw}' is not a number"),
            })
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }
}

/// Read and parse a key/value file.
pub fn parse_config(path: &Path) -> Result<ConfigMap, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config_str(&content, path)
}

/// Parse key/value text (useful for testing).
pub fn parse_config_str(content: &str, source_path: &Path) -> Result<ConfigMap, ConfigError> {
    let parse_error = |line: usize, message: String| ConfigError::Parse {
        path: source_path.to_path_buf(),
        line,
        message,
    };

    let mut map = ConfigMap::empty(source_path);
    let mut lines = content.lines().enumerate();

    while let Some((idx, raw)) = lines.next() {
        let line_no = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, rest)) = trimmed.split_once(':') else {
            return Err(parse_error(line_no, format!("expected 'key: value', got '{trimmed}'")));
        };
        let key = key.trim();
        if key.is_empty() || key.contains('"') || key.contains(char::is_whitespace) {
            return Err(parse_error(line_no, format!("invalid key '{key}'")));
        }

        let rest = rest.trim();
        let value = if rest == BLOCK_DELIMITER {
            let mut block = Vec::new();
            loop {
                match lines.next() {
                    Some((_, l)) if l.trim() == BLOCK_DELIMITER => break,
                    Some((_, l)) => block.push(l),
                    None => {
                        return Err(parse_error(
                            line_no,
                            format!("unterminated multi-line value for '{key}'"),
                        ))
                    }
                }
            }
            block.join("\n")
        } else if let Some(inner) = rest.strip_prefix('"') {
            match inner.strip_suffix('"') {
                Some(v) if !v.contains('"') => v.to_string(),
                _ => {
                    return Err(parse_error(
                        line_no,
                        format!("unbalanced quotes in value for '{key}'"),
                    ))
                }
            }
        } else {
            rest.to_string()
        };

        if map.entries.insert(key.to_string(), value).is_some() {
            return Err(parse_error(line_no, format!("duplicate key '{key}'")));
        }
    }

    Ok(map)
}

/// The test root: one subdirectory per question group.
#[derive(Debug, Clone)]
pub struct TestRoot {
    dir: PathBuf,
}

impl TestRoot {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(ConfigError::MissingFile(dir));
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The root `CONFIG`, or an empty map when the root has none.
    pub fn root_config(&self) -> Result<ConfigMap, ConfigError> {
        let path = self.dir.join(CONFIG_FILE);
        if path.exists() {
            parse_config(&path)
        } else {
            Ok(ConfigMap::empty(path))
        }
    }

    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.dir.join(group)
    }

    /// Whether `group` names a visible directory under the root.
    pub fn has_group(&self, group: &str) -> bool {
        !group.is_empty() && !group.starts_with('.') && self.group_dir(group).is_dir()
    }

    /// The group's `CONFIG`. A missing group directory or config is fatal.
    pub fn group_config(&self, group: &str) -> Result<ConfigMap, ConfigError> {
        if !self.has_group(group) {
            return Err(ConfigError::UnknownGroup(group.to_string()));
        }
        parse_config(&self.group_dir(group).join(CONFIG_FILE))
    }

    /// All visible group directories, sorted by name.
    pub fn list_groups(&self) -> Result<Vec<String>, ConfigError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|source| ConfigError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let mut groups = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ConfigError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_dir() && !name.starts_with('.') {
                groups.push(name);
            }
        }
        groups.sort();
        Ok(groups)
    }
}
