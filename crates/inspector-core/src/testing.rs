//! Stub namespaces, questions and cases shared by this crate's unit tests.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::error::ExecutionError;
use crate::model::{CaseOutcome, CaseVerdict, TestCaseDescriptor};
use crate::module::Namespace;
use crate::parser::ConfigMap;
use crate::traits::{CaseContext, Question, TestCase};

type StubFn = Arc<dyn Fn(&[Value]) -> Result<Value, ExecutionError> + Send + Sync>;

/// A namespace backed by Rust closures.
pub struct FnNamespace {
    name: String,
    functions: BTreeMap<String, StubFn>,
}

impl FnNamespace {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            functions: BTreeMap::new(),
        }
    }

    pub fn with_fn<F>(mut self, symbol: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, ExecutionError> + Send + Sync + 'static,
    {
        self.functions.insert(symbol.to_string(), Arc::new(f));
        self
    }
}

impl Namespace for FnNamespace {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_symbol(&self, symbol: &str) -> bool {
        self.functions.contains_key(symbol)
    }

    fn symbols(&self) -> Vec<String> {
        self.functions.keys().cloned().collect()
    }

    fn value(&self, _symbol: &str) -> Option<Value> {
        None
    }

    fn call(
        &self,
        symbol: &str,
        args: &[Value],
        _deadline: Instant,
    ) -> Result<Value, ExecutionError> {
        let f = self.functions.get(symbol).ok_or_else(|| {
            ExecutionError::new("FunctionNotFound", format!("{symbol} is not defined"))
        })?;
        f(args)
    }
}

/// Sum of awarded points.
pub struct SumQuestion;

impl Question for SumQuestion {
    fn score(&self, outcomes: &[CaseOutcome], _max_points: f64) -> f64 {
        outcomes.iter().map(|o| o.points_awarded).sum()
    }
}

/// A case that calls its symbol with no arguments and passes when the
/// result is `true`, counting how often it ran.
pub struct CallCase {
    pub module: String,
    pub symbol: String,
    pub points: f64,
    pub invocations: Arc<AtomicUsize>,
}

impl TestCase for CallCase {
    fn execute(&self, ctx: &CaseContext) -> Result<CaseVerdict, ExecutionError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let ns = ctx.namespace(&self.module)?;
        match ns.call(&self.symbol, &[], ctx.deadline)? {
            Value::Bool(true) => Ok(CaseVerdict::pass(self.points)),
            other => Ok(CaseVerdict::fail(format!("got {other}"))),
        }
    }
}

/// A case that outlives any reasonable deadline.
pub struct SleepCase(pub Duration);

impl TestCase for SleepCase {
    fn execute(&self, _ctx: &CaseContext) -> Result<CaseVerdict, ExecutionError> {
        std::thread::sleep(self.0);
        Ok(CaseVerdict::pass(1.0))
    }
}

/// A case that panics.
pub struct PanicCase;

impl TestCase for PanicCase {
    fn execute(&self, _ctx: &CaseContext) -> Result<CaseVerdict, ExecutionError> {
        panic!("student code corrupted the harness");
    }
}

pub fn descriptor(group: &str, id: &str, class: &str) -> TestCaseDescriptor {
    TestCaseDescriptor {
        id: id.to_string(),
        group: group.to_string(),
        order: id
            .rsplit('_')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        module: "student".to_string(),
        symbol: "f".to_string(),
        class: class.to_string(),
        points: 1.0,
        disabled: false,
        params: ConfigMap::empty(format!("{group}/{id}.test")),
        solution_path: PathBuf::from(format!("{group}/{id}.solution")),
        output_path: PathBuf::from(format!("{group}/{id}.test_output")),
    }
}
