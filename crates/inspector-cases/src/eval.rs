//! Cases that compare a student value against the solution's `result`.

use std::path::{Path, PathBuf};

use serde_json::Value;

use inspector_core::error::{ConfigError, ExecutionError};
use inspector_core::model::{CaseVerdict, TestCaseDescriptor};
use inspector_core::parser::ConfigMap;
use inspector_core::traits::{CaseContext, TestCase};

/// Absolute tolerance for numeric comparison unless a descriptor sets one.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// The descriptor's `args` key as a JSON array; empty when absent.
pub fn parse_args(params: &ConfigMap) -> Result<Vec<Value>, ConfigError> {
    let Some(raw) = params.get("args") else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(args)) => Ok(args),
        Ok(_) => Err(ConfigError::InvalidValue {
            path: params.path().to_path_buf(),
            key: "args".into(),
            message: "expected a JSON array".into(),
        }),
        Err(e) => Err(ConfigError::InvalidValue {
            path: params.path().to_path_buf(),
            key: "args".into(),
            message: e.to_string(),
        }),
    }
}

pub fn parse_tolerance(params: &ConfigMap) -> Result<f64, ConfigError> {
    Ok(params.number("tolerance")?.unwrap_or(DEFAULT_TOLERANCE))
}

/// Expected value from a solution: JSON when it parses, the raw text otherwise.
pub fn expected_value(solution: &ConfigMap) -> Result<Value, ExecutionError> {
    let raw = solution.get("result").ok_or_else(|| {
        ExecutionError::new(
            "MissingSolution",
            format!("{} has no 'result' key", solution.path().display()),
        )
    })?;
    Ok(serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string())))
}

/// Structural equality with numeric tolerance at every level.
pub fn values_match(actual: &Value, expected: &Value, tolerance: f64) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => (a - b).abs() <= tolerance,
            _ => a == b,
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| values_match(x, y, tolerance))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| {
                    b.get(key)
                        .is_some_and(|y| values_match(x, y, tolerance))
                })
        }
        _ => actual == expected,
    }
}

/// Record the observed value next to the descriptor so it can be inspected
/// or promoted to a solution.
pub fn write_output(path: &Path, case_id: &str, actual: &Value) {
    let content = format!("# actual output of {case_id}\nresult: \"\"\"\n{actual}\n\"\"\"\n");
    if let Err(e) = std::fs::write(path, content) {
        tracing::warn!("failed to write {}: {e}", path.display());
    }
}

fn render_call(symbol: &str, args: &[Value]) -> String {
    let args: Vec<String> = args.iter().map(Value::to_string).collect();
    format!("{symbol}({})", args.join(", "))
}

fn verdict(
    label: String,
    actual: &Value,
    expected: &Value,
    tolerance: f64,
    points: f64,
) -> CaseVerdict {
    if values_match(actual, expected, tolerance) {
        CaseVerdict::pass(points).with_message(format!("{label} returned {actual}"))
    } else {
        CaseVerdict::fail(format!("{label} returned {actual}, expected {expected}"))
    }
}

// ---------------------------------------------------------------------------
// EvalTest
// ---------------------------------------------------------------------------

/// Calls a student function and compares the return value.
pub struct EvalTest {
    id: String,
    module: String,
    symbol: String,
    args: Vec<Value>,
    tolerance: f64,
    points: f64,
    output_path: PathBuf,
}

impl EvalTest {
    pub fn from_descriptor(d: &TestCaseDescriptor) -> Result<Self, ConfigError> {
        Ok(Self {
            id: d.id.clone(),
            module: d.module.clone(),
            symbol: d.symbol.clone(),
            args: parse_args(&d.params)?,
            tolerance: parse_tolerance(&d.params)?,
            points: d.points,
            output_path: d.output_path.clone(),
        })
    }
}

impl TestCase for EvalTest {
    fn execute(&self, ctx: &CaseContext) -> Result<CaseVerdict, ExecutionError> {
        let expected = expected_value(ctx.solution()?)?;
        let ns = ctx.namespace(&self.module)?;
        let actual = ns.call(&self.symbol, &self.args, ctx.deadline)?;
        write_output(&self.output_path, &self.id, &actual);

        Ok(verdict(
            render_call(&self.symbol, &self.args),
            &actual,
            &expected,
            self.tolerance,
            self.points,
        ))
    }
}

// ---------------------------------------------------------------------------
// ValueTest
// ---------------------------------------------------------------------------

/// Reads a module-level variable and compares it.
pub struct ValueTest {
    id: String,
    module: String,
    symbol: String,
    tolerance: f64,
    points: f64,
    output_path: PathBuf,
}

impl ValueTest {
    pub fn from_descriptor(d: &TestCaseDescriptor) -> Result<Self, ConfigError> {
        Ok(Self {
            id: d.id.clone(),
            module: d.module.clone(),
            symbol: d.symbol.clone(),
            tolerance: parse_tolerance(&d.params)?,
            points: d.points,
            output_path: d.output_path.clone(),
        })
    }
}

impl TestCase for ValueTest {
    fn execute(&self, ctx: &CaseContext) -> Result<CaseVerdict, ExecutionError> {
        let expected = expected_value(ctx.solution()?)?;
        let ns = ctx.namespace(&self.module)?;
        let actual = ns.value(&self.symbol).ok_or_else(|| {
            ExecutionError::new(
                "NameError",
                format!("{} is not a module-level value in {}", self.symbol, self.module),
            )
        })?;
        write_output(&self.output_path, &self.id, &actual);

        Ok(verdict(
            self.symbol.clone(),
            &actual,
            &expected,
            self.tolerance,
            self.points,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_with_tolerance() {
        assert!(values_match(&json!(0.30000000000000004), &json!(0.3), DEFAULT_TOLERANCE));
        assert!(values_match(&json!(3), &json!(3.0), DEFAULT_TOLERANCE));
        assert!(!values_match(&json!(3), &json!(3.1), DEFAULT_TOLERANCE));
        assert!(values_match(
            &json!({"area": 1.0000000000001, "sides": [1, 2]}),
            &json!({"sides": [1, 2], "area": 1}),
            DEFAULT_TOLERANCE
        ));
        assert!(!values_match(&json!([1, 2]), &json!([1, 2, 3]), DEFAULT_TOLERANCE));
        assert!(!values_match(&json!("3"), &json!(3), DEFAULT_TOLERANCE));
    }

    #[test]
    fn expected_value_falls_back_to_text() {
        let mut solution = ConfigMap::empty("q1/t_1.solution");
        solution.insert("result", "[1, 2]");
        assert_eq!(expected_value(&solution).unwrap(), json!([1, 2]));

        solution.insert("result", "rock");
        assert_eq!(expected_value(&solution).unwrap(), json!("rock"));

        let empty = ConfigMap::empty("q1/t_2.solution");
        assert_eq!(expected_value(&empty).unwrap_err().signature, "MissingSolution");
    }

    #[test]
    fn args_must_be_an_array() {
        let mut params = ConfigMap::empty("q1/t_1.test");
        assert!(parse_args(&params).unwrap().is_empty());

        params.insert("args", "[\"banana\", 2]");
        assert_eq!(parse_args(&params).unwrap(), vec![json!("banana"), json!(2)]);

        params.insert("args", "{\"a\": 1}");
        assert!(matches!(
            parse_args(&params),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn output_file_round_trips_through_the_parser() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t_1.test_output");
        write_output(&path, "t_1", &json!({"say": "he said \"hi\""}));

        let parsed = inspector_core::parser::parse_config(&path).unwrap();
        assert_eq!(
            expected_value(&parsed).unwrap(),
            json!({"say": "he said \"hi\""})
        );
    }
}
