//! Compile and initialize a module's source.

use std::time::Instant;

use rhai::{Engine, Scope, AST};

use inspector_core::error::LoadError;

use crate::sandbox::DeadlineGuard;
use crate::ScriptLimits;

/// Parse `source` without running it.
pub fn compile(engine: &Engine, module: &str, source: &str) -> Result<AST, LoadError> {
    engine.compile(source).map_err(|e| LoadError::Syntax {
        module: module.to_string(),
        message: e.to_string(),
    })
}

/// Run the module's top-level statements and return the resulting scope.
///
/// Runs under the load deadline so a module that never finishes
/// initializing fails instead of hanging the run.
pub fn initialize(
    engine: &Engine,
    module: &str,
    ast: &AST,
    limits: &ScriptLimits,
) -> Result<Scope<'static>, LoadError> {
    let mut scope = Scope::new();
    let _deadline = DeadlineGuard::set(Instant::now() + limits.load_timeout);
    engine
        .run_ast_with_scope(&mut scope, ast)
        .map_err(|e| LoadError::Initialization {
            module: module.to_string(),
            message: e.to_string(),
        })?;
    Ok(scope)
}
