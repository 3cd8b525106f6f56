//! Calling into a loaded script and classifying what it raises.

use rhai::{CallFnOptions, Dynamic, Engine, EvalAltResult, Scope, AST};
use serde_json::Value;

use inspector_core::error::ExecutionError;

/// Stable error class name for a script error.
pub fn signature(err: &EvalAltResult) -> &'static str {
    use EvalAltResult::*;

    match err.unwrap_inner() {
        ErrorMismatchDataType(..) | ErrorMismatchOutputType(..) | ErrorIndexingType(..) => {
            "TypeError"
        }
        ErrorVariableNotFound(..) => "NameError",
        ErrorFunctionNotFound(..) => "FunctionNotFound",
        ErrorArrayBounds(..) | ErrorStringBounds(..) | ErrorBitFieldBounds(..) => "IndexError",
        ErrorIndexNotFound(..) | ErrorPropertyNotFound(..) => "KeyError",
        ErrorArithmetic(..) => "ArithmeticError",
        ErrorStackOverflow(..) | ErrorTooManyOperations(..) => "RecursionError",
        ErrorRuntime(..) => "RuntimeError",
        ErrorTerminated(..) => ExecutionError::TERMINATED,
        _ => "ScriptError",
    }
}

pub fn execution_error(err: &EvalAltResult) -> ExecutionError {
    let message = match err.unwrap_inner() {
        EvalAltResult::ErrorRuntime(value, _) => value.to_string(),
        EvalAltResult::ErrorTerminated(..) => "stopped at the time limit".to_string(),
        _ => err.to_string(),
    };
    ExecutionError::new(signature(err), message)
}

pub fn to_dynamic(value: &Value) -> Result<Dynamic, ExecutionError> {
    rhai::serde::to_dynamic(value)
        .map_err(|e| ExecutionError::new("TypeError", format!("unsupported argument: {e}")))
}

pub fn from_dynamic(value: &Dynamic) -> Result<Value, ExecutionError> {
    rhai::serde::from_dynamic::<Value>(value).map_err(|e| {
        ExecutionError::new(
            "TypeError",
            format!("value of type {} cannot be compared: {e}", value.type_name()),
        )
    })
}

/// Call `name` in `ast` with a throwaway copy of the module scope.
pub fn call(
    engine: &Engine,
    ast: &AST,
    scope: &Scope<'static>,
    name: &str,
    args: &[Value],
) -> Result<Value, ExecutionError> {
    let args = args
        .iter()
        .map(to_dynamic)
        .collect::<Result<Vec<_>, _>>()?;

    let mut scope = scope.clone();
    let options = CallFnOptions::new().eval_ast(false).rewind_scope(true);
    let result = engine
        .call_fn_with_options::<Dynamic>(options, &mut scope, ast, name, args)
        .map_err(|e| execution_error(&e))?;
    from_dynamic(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::build_engine;
    use crate::ScriptLimits;
    use serde_json::json;

    const SOURCE: &str = r#"
fn add(a, b) { a + b }
fn check(n) { if n { 1 } else { 0 } }
fn at(xs, i) { xs[i] }
fn undefined_var() { missing + 1 }
fn div(a, b) { a / b }
fn fail() { throw "nope"; }
fn down(n) { down(n + 1) }
fn stats(xs) { #{ count: xs.len(), first: xs[0] } }
"#;

    fn run(name: &str, args: &[Value]) -> Result<Value, ExecutionError> {
        let engine = build_engine("student", &ScriptLimits::default(), 0);
        let ast = engine.compile(SOURCE).unwrap();
        call(&engine, &ast, &Scope::new(), name, args)
    }

    #[test]
    fn json_in_json_out() {
        assert_eq!(run("add", &[json!(2), json!(3)]).unwrap(), json!(5));
        assert_eq!(
            run("add", &[json!("ab"), json!("cd")]).unwrap(),
            json!("abcd")
        );
        assert_eq!(
            run("stats", &[json!([7, 8, 9])]).unwrap(),
            json!({"count": 3, "first": 7})
        );
    }

    #[test]
    fn error_signatures() {
        let sig = |name: &str, args: &[Value]| run(name, args).unwrap_err().signature;
        assert_eq!(sig("check", &[json!(5)]), "TypeError");
        assert_eq!(sig("at", &[json!([1, 2]), json!(5)]), "IndexError");
        assert_eq!(sig("undefined_var", &[]), "NameError");
        assert_eq!(sig("div", &[json!(1), json!(0)]), "ArithmeticError");
        assert_eq!(sig("down", &[json!(0)]), "RecursionError");
        assert_eq!(sig("nope", &[]), "FunctionNotFound");
        assert_eq!(sig("add", &[json!(1)]), "FunctionNotFound");
    }

    #[test]
    fn thrown_values_become_the_message() {
        let err = run("fail", &[]).unwrap_err();
        assert_eq!(err.signature, "RuntimeError");
        assert_eq!(err.message, "nope");
    }
}
