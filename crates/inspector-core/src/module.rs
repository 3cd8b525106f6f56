//! Loaded student modules and the table that maps names to them.
//!
//! A failed load is a first-class [`LoadedModule::Failed`] value; callers
//! match on it before using a namespace. The [`ModuleTable`] is passed
//! explicitly to everything that resolves symbols.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::error::{ConfigError, ExecutionError, LoadError};

/// A loaded module's callable and readable symbols.
///
/// The engine treats a namespace as read/invoke-only: calling into it never
/// changes the module's definitions.
pub trait Namespace: Send + Sync {
    /// Module name the namespace was loaded under.
    fn name(&self) -> &str;

    /// Whether the module defines `symbol` as a function or module-level value.
    fn has_symbol(&self, symbol: &str) -> bool;

    /// All defined symbols, sorted.
    fn symbols(&self) -> Vec<String>;

    /// Value of a module-level variable or constant.
    fn value(&self, symbol: &str) -> Option<Value>;

    /// Call a function, giving up once `deadline` passes.
    fn call(&self, symbol: &str, args: &[Value], deadline: Instant)
        -> Result<Value, ExecutionError>;
}

/// Result of loading one module.
#[derive(Clone)]
pub enum LoadedModule {
    Loaded(Arc<dyn Namespace>),
    Failed(LoadError),
}

impl LoadedModule {
    pub fn namespace(&self) -> Option<&Arc<dyn Namespace>> {
        match self {
            LoadedModule::Loaded(ns) => Some(ns),
            LoadedModule::Failed(_) => None,
        }
    }

    pub fn load_error(&self) -> Option<&LoadError> {
        match self {
            LoadedModule::Loaded(_) => None,
            LoadedModule::Failed(err) => Some(err),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadedModule::Loaded(_))
    }
}

impl fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadedModule::Loaded(ns) => f
                .debug_tuple("Loaded")
                .field(&ns.name())
                .finish(),
            LoadedModule::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
        }
    }
}

/// Loads a source file into an isolated namespace.
pub trait ModuleLoader {
    /// Load `path` under `name`.
    ///
    /// Student-code problems come back as `Ok(LoadedModule::Failed(..))`.
    /// `Err` is reserved for harness problems such as a missing file.
    fn load(&self, name: &str, path: &Path) -> Result<LoadedModule, ConfigError>;
}

/// Explicit name → module mapping shared by discovery and grading.
#[derive(Debug, Clone, Default)]
pub struct ModuleTable {
    modules: BTreeMap<String, LoadedModule>,
}

impl ModuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, module: LoadedModule) {
        self.modules.insert(name.into(), module);
    }

    pub fn get(&self, name: &str) -> Option<&LoadedModule> {
        self.modules.get(name)
    }

    /// The namespace for `name` if it exists and loaded cleanly.
    pub fn namespace(&self, name: &str) -> Option<Arc<dyn Namespace>> {
        self.get(name).and_then(|m| m.namespace().cloned())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LoadedModule)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Module name for a source path: its file stem (`code/wordprops.rhai` → `wordprops`).
pub fn module_name(path: &Path) -> Result<String, ConfigError> {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingModule(path.to_path_buf()))
}

/// Load each of `files` (relative to `code_root`) into a fresh table.
///
/// Load failures are logged and stored; a missing file aborts.
pub fn load_modules(
    loader: &dyn ModuleLoader,
    code_root: &Path,
    files: &[PathBuf],
) -> Result<ModuleTable, ConfigError> {
    let mut table = ModuleTable::new();
    for file in files {
        let path = code_root.join(file);
        let name = module_name(&path)?;
        let module = loader.load(&name, &path)?;
        match &module {
            LoadedModule::Loaded(ns) => {
                tracing::debug!("loaded {} ({} symbols)", name, ns.symbols().len())
            }
            LoadedModule::Failed(err) => tracing::warn!("{err}"),
        }
        table.insert(name, module);
    }
    Ok(table)
}
