//! Core trait definitions for question groups and test cases.
//!
//! Concrete classes live in `inspector-cases`. The engine only sees these
//! traits, and it builds instances by class name through a
//! [`ClassRegistry`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ClassKind, ConfigError, ExecutionError, UnknownClassError};
use crate::model::{CaseOutcome, CaseVerdict, TestCaseDescriptor};
use crate::module::{ModuleTable, Namespace};
use crate::parser::ConfigMap;

// ---------------------------------------------------------------------------
// Test cases
// ---------------------------------------------------------------------------

/// Everything a test case may touch while it runs.
#[derive(Clone)]
pub struct CaseContext {
    /// Every loaded module, including the test-case module if one was given.
    pub modules: Arc<ModuleTable>,
    /// Expected-output data, read just before this execution. `None` when
    /// the case has no solution file.
    pub solution: Option<ConfigMap>,
    /// Wall-clock point after which the case has timed out.
    pub deadline: Instant,
}

impl CaseContext {
    /// Namespace of a loaded module.
    pub fn namespace(&self, module: &str) -> Result<Arc<dyn Namespace>, ExecutionError> {
        self.modules.namespace(module).ok_or_else(|| {
            ExecutionError::new("ModuleNotLoaded", format!("module '{module}' is not available"))
        })
    }

    /// The solution data, for cases that cannot run without one.
    pub fn solution(&self) -> Result<&ConfigMap, ExecutionError> {
        self.solution.as_ref().ok_or_else(|| {
            ExecutionError::new("MissingSolution", "no solution data exists for this test case")
        })
    }
}

/// One executable check bound to a student symbol.
///
/// `execute` runs on a blocking thread and may be abandoned at the deadline;
/// implementations must not rely on shared mutable state.
pub trait TestCase: Send + Sync {
    fn execute(&self, ctx: &CaseContext) -> Result<CaseVerdict, ExecutionError>;
}

// ---------------------------------------------------------------------------
// Questions
// ---------------------------------------------------------------------------

/// Scoring policy for a question group.
pub trait Question: Send + Sync {
    /// Raw group score from the case outcomes. The engine clamps the result
    /// to `[0, max_points]`.
    fn score(&self, outcomes: &[CaseOutcome], max_points: f64) -> f64;
}

// ---------------------------------------------------------------------------
// Class registry
// ---------------------------------------------------------------------------

/// Builds a question from its group `CONFIG`.
pub type QuestionFactory =
    Box<dyn Fn(&ConfigMap) -> Result<Box<dyn Question>, ConfigError> + Send + Sync>;

/// Builds a test case from its descriptor.
pub type CaseFactory =
    Box<dyn Fn(&TestCaseDescriptor) -> Result<Arc<dyn TestCase>, ConfigError> + Send + Sync>;

/// Class name → constructor lookup, populated at startup.
#[derive(Default)]
pub struct ClassRegistry {
    questions: HashMap<String, QuestionFactory>,
    cases: HashMap<String, CaseFactory>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_question<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ConfigMap) -> Result<Box<dyn Question>, ConfigError> + Send + Sync + 'static,
    {
        self.questions.insert(name.into(), Box::new(factory));
        self
    }

    pub fn register_case<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&TestCaseDescriptor) -> Result<Arc<dyn TestCase>, ConfigError>
            + Send
            + Sync
            + 'static,
    {
        self.cases.insert(name.into(), Box::new(factory));
        self
    }

    pub fn has_question(&self, name: &str) -> bool {
        self.questions.contains_key(name)
    }

    pub fn has_case(&self, name: &str) -> bool {
        self.cases.contains_key(name)
    }

    pub fn create_question(
        &self,
        name: &str,
        config: &ConfigMap,
    ) -> Result<Box<dyn Question>, ConfigError> {
        let factory = self.questions.get(name).ok_or_else(|| UnknownClassError {
            kind: ClassKind::Question,
            name: name.to_string(),
        })?;
        factory(config)
    }

    pub fn create_case(
        &self,
        descriptor: &TestCaseDescriptor,
    ) -> Result<Arc<dyn TestCase>, ConfigError> {
        let factory = self
            .cases
            .get(&descriptor.class)
            .ok_or_else(|| UnknownClassError {
                kind: ClassKind::TestCase,
                name: descriptor.class.clone(),
            })?;
        factory(descriptor)
    }

    /// Registered class names of each kind, sorted.
    pub fn class_names(&self, kind: ClassKind) -> Vec<String> {
        let mut names: Vec<String> = match kind {
            ClassKind::Question => self.questions.keys().cloned().collect(),
            ClassKind::TestCase => self.cases.keys().cloned().collect(),
        };
        names.sort();
        names
    }
}
