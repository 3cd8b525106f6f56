//! inspector-runner — Loads student Rhai scripts into isolated namespaces.
//!
//! Each module gets its own engine, its own seeded random generator and its
//! own module-level scope. Load failures come back as values; calls run
//! under a cooperative deadline.

pub mod compiler;
pub mod invoke;
pub mod sandbox;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rhai::{Engine, Scope, AST};
use serde_json::Value;

use inspector_core::error::{ConfigError, ExecutionError};
use inspector_core::module::{LoadedModule, ModuleLoader, Namespace};

/// Source file extension for student modules.
pub const SCRIPT_EXTENSION: &str = "rhai";

/// Resource limits applied to every module.
#[derive(Debug, Clone)]
pub struct ScriptLimits {
    /// Maximum function call nesting.
    pub max_call_depth: usize,
    /// Time allowed for a module's top-level statements.
    pub load_timeout: Duration,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            load_timeout: Duration::from_secs(10),
        }
    }
}

/// Module loader for Rhai scripts.
#[derive(Debug, Clone, Default)]
pub struct ScriptLoader {
    limits: ScriptLimits,
    seed: u64,
}

impl ScriptLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_limits(mut self, limits: ScriptLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Load `source` as module `name` without touching the filesystem.
    pub fn load_source(&self, name: &str, source: &str) -> LoadedModule {
        let engine = sandbox::build_engine(name, &self.limits, self.seed);

        let ast = match compiler::compile(&engine, name, source) {
            Ok(ast) => ast,
            Err(e) => return LoadedModule::Failed(e),
        };
        let scope = match compiler::initialize(&engine, name, &ast, &self.limits) {
            Ok(scope) => scope,
            Err(e) => return LoadedModule::Failed(e),
        };

        LoadedModule::Loaded(Arc::new(ScriptModule::new(name, engine, ast, scope)))
    }
}

impl ModuleLoader for ScriptLoader {
    fn load(&self, name: &str, path: &Path) -> Result<LoadedModule, ConfigError> {
        let source = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::MissingModule(path.to_path_buf()))?;
        tracing::debug!("loading {name} from {}", path.display());
        Ok(self.load_source(name, &source))
    }
}

/// A successfully loaded script.
pub struct ScriptModule {
    name: String,
    engine: Engine,
    ast: AST,
    scope: Scope<'static>,
    functions: BTreeSet<String>,
}

impl ScriptModule {
    fn new(name: &str, engine: Engine, ast: AST, scope: Scope<'static>) -> Self {
        let functions = ast.iter_functions().map(|f| f.name.to_string()).collect();
        Self {
            name: name.to_string(),
            engine,
            ast,
            scope,
            functions,
        }
    }
}

impl Namespace for ScriptModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_symbol(&self, symbol: &str) -> bool {
        self.functions.contains(symbol) || self.scope.contains(symbol)
    }

    fn symbols(&self) -> Vec<String> {
        let mut all: BTreeSet<String> = self.functions.clone();
        all.extend(self.scope.iter().map(|(name, _, _)| name.to_string()));
        all.into_iter().collect()
    }

    fn value(&self, symbol: &str) -> Option<Value> {
        let value = self.scope.get(symbol)?;
        invoke::from_dynamic(value).ok()
    }

    fn call(
        &self,
        symbol: &str,
        args: &[Value],
        deadline: Instant,
    ) -> Result<Value, ExecutionError> {
        if !self.functions.contains(symbol) {
            return Err(ExecutionError::new(
                "FunctionNotFound",
                format!("{} does not define a function named {symbol}", self.name),
            ));
        }
        let _deadline = sandbox::DeadlineGuard::set(deadline);
        invoke::call(&self.engine, &self.ast, &self.scope, symbol, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loaded(source: &str) -> Arc<dyn Namespace> {
        match ScriptLoader::new().load_source("student", source) {
            LoadedModule::Loaded(ns) => ns,
            LoadedModule::Failed(e) => panic!("load failed: {e}"),
        }
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ScriptLoader::new()
            .load("gone", &dir.path().join("gone.rhai"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingModule(_)));
    }

    #[test]
    fn failures_are_values() {
        let loader = ScriptLoader::new();
        let syntax = loader.load_source("broken", "fn f( { }");
        assert!(matches!(
            syntax.load_error(),
            Some(inspector_core::error::LoadError::Syntax { .. })
        ));

        let init = loader.load_source("broken", "let xs = [1, 2];\nlet x = xs[9];");
        assert!(matches!(
            init.load_error(),
            Some(inspector_core::error::LoadError::Initialization { .. })
        ));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wordprops.rhai");
        std::fs::write(&path, "fn count_vowels(s) { s.len() }").unwrap();
        let module = ScriptLoader::new().load("wordprops", &path).unwrap();
        assert!(module.namespace().unwrap().has_symbol("count_vowels"));
    }

    #[test]
    fn symbols_cover_functions_and_variables() {
        let ns = loaded("const SIDES = 4;\nlet label = \"square\";\nfn area(s) { s * s }");
        assert_eq!(ns.symbols(), vec!["SIDES", "area", "label"]);
        assert!(ns.has_symbol("area"));
        assert!(!ns.has_symbol("perimeter"));
        assert_eq!(ns.value("SIDES"), Some(json!(4)));
        assert_eq!(ns.value("area"), None);
    }

    #[test]
    fn calls_do_not_mutate_the_module() {
        let ns = loaded("let counter = 0;\nfn bump(n) { n + 1 }");
        let later = Instant::now() + Duration::from_secs(5);
        assert_eq!(ns.call("bump", &[json!(1)], later).unwrap(), json!(2));
        assert_eq!(ns.call("bump", &[json!(1)], later).unwrap(), json!(2));
        assert_eq!(ns.value("counter"), Some(json!(0)));
        assert_eq!(
            ns.call("counter", &[], later).unwrap_err().signature,
            "FunctionNotFound"
        );
    }

    #[test]
    fn same_seed_same_randomness() {
        let source = "let draws = [random_range(0, 1000), random_range(0, 1000), random_range(0, 1000)];\nfn roll() { random_range(1, 7) }";
        let later = Instant::now() + Duration::from_secs(5);

        let a = loaded(source);
        let b = loaded(source);
        assert_eq!(a.value("draws"), b.value("draws"));
        assert_eq!(
            a.call("roll", &[], later).unwrap(),
            b.call("roll", &[], later).unwrap()
        );

        let other = match ScriptLoader::new().with_seed(99).load_source("student", source) {
            LoadedModule::Loaded(ns) => ns,
            LoadedModule::Failed(e) => panic!("{e}"),
        };
        assert!(other.value("draws").is_some());
    }

    #[test]
    fn hung_call_is_terminated_at_the_deadline() {
        let ns = loaded("fn spin() { let n = 0; loop { n += 1; } }");
        let start = Instant::now();
        let err = ns
            .call("spin", &[], start + Duration::from_millis(50))
            .unwrap_err();
        assert_eq!(err.signature, "Terminated");
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
