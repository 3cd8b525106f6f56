//! Cases judged by a checker function in the harness-side test-case module.

use serde_json::Value;

use inspector_core::error::{ConfigError, ExecutionError};
use inspector_core::model::{CaseVerdict, TestCaseDescriptor};
use inspector_core::traits::{CaseContext, TestCase};

use crate::eval::{expected_value, parse_args, write_output};
use crate::TEST_CASE_MODULE;

/// Calls the student function, then hands `(actual, expected)` to the
/// descriptor's `checker`.
///
/// A boolean verdict passes or fails the case; a number is awarded as
/// points. `expected` is `null` when the case has no solution file.
pub struct ScriptTest {
    id: String,
    module: String,
    symbol: String,
    checker: String,
    args: Vec<Value>,
    points: f64,
    output_path: std::path::PathBuf,
}

impl ScriptTest {
    pub fn from_descriptor(d: &TestCaseDescriptor) -> Result<Self, ConfigError> {
        Ok(Self {
            id: d.id.clone(),
            module: d.module.clone(),
            symbol: d.symbol.clone(),
            checker: d.params.require("checker")?.to_string(),
            args: parse_args(&d.params)?,
            points: d.points,
            output_path: d.output_path.clone(),
        })
    }
}

impl TestCase for ScriptTest {
    fn execute(&self, ctx: &CaseContext) -> Result<CaseVerdict, ExecutionError> {
        let harness = ctx.namespace(TEST_CASE_MODULE)?;
        let expected = match &ctx.solution {
            Some(solution) => expected_value(solution)?,
            None => Value::Null,
        };

        let actual = ctx
            .namespace(&self.module)?
            .call(&self.symbol, &self.args, ctx.deadline)?;
        write_output(&self.output_path, &self.id, &actual);

        let judged = harness
            .call(&self.checker, &[actual.clone(), expected], ctx.deadline)
            .map_err(|e| {
                ExecutionError::new(
                    "CheckerError",
                    format!("checker {} failed: {e}", self.checker),
                )
            })?;

        match judged {
            Value::Bool(true) => Ok(CaseVerdict::pass(self.points)),
            Value::Bool(false) => Ok(CaseVerdict::fail(format!(
                "{} returned {actual}, which {} rejected",
                self.symbol, self.checker
            ))),
            Value::Number(n) => {
                let awarded = n.as_f64().unwrap_or(0.0);
                let verdict = CaseVerdict {
                    passed: awarded >= self.points,
                    points: awarded,
                    messages: vec![format!("{} awarded {awarded}/{}", self.checker, self.points)],
                };
                Ok(verdict)
            }
            other => Err(ExecutionError::new(
                "CheckerError",
                format!(
                    "checker {} must return a boolean or a number, got {other}",
                    self.checker
                ),
            )),
        }
    }
}
