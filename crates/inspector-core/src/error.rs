//! Error taxonomy for a grading run.
//!
//! Anything rooted in harness configuration is a [`ConfigError`] and aborts
//! the run before grading begins. Anything rooted in student code
//! ([`LoadError`], [`ExecutionError`]) is contained and converted into a
//! score-affecting outcome.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal harness misconfiguration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file the run depends on does not exist.
    #[error("config file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config or descriptor file is malformed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// A required key is absent from a config or descriptor file.
    #[error("{}: missing required key '{key}'", path.display())]
    MissingKey { path: PathBuf, key: String },

    /// A key is present but its value cannot be used.
    #[error("{}: invalid value for '{key}': {message}", path.display())]
    InvalidValue {
        path: PathBuf,
        key: String,
        message: String,
    },

    /// A question group named by an order list, a dependency, or the
    /// command line has no directory under the test root.
    #[error("question group '{0}' does not exist")]
    UnknownGroup(String),

    /// The `depends` declarations form a cycle.
    #[error("dependency cycle: {}", .0.join(" -> "))]
    DependencyCycle(Vec<String>),

    /// A student or test-case module file does not exist.
    #[error("module file not found: {}", .0.display())]
    MissingModule(PathBuf),

    /// A descriptor targets a module that was never handed to the loader.
    #[error("test case '{case}' targets module '{module}', which was not loaded")]
    ModuleNotLoaded { case: String, module: String },

    /// The harness-side test-case module itself failed to load.
    #[error("test-case module failed to load: {0}")]
    TestCaseModule(LoadError),

    /// A class name in a config file has no registered constructor.
    #[error(transparent)]
    UnknownClass(#[from] UnknownClassError),
}

/// Which registry a class lookup went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    Question,
    TestCase,
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Question => write!(f, "question"),
            ClassKind::TestCase => write!(f, "test case"),
        }
    }
}

/// A declared class name has no registered constructor.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind} class '{name}'")]
pub struct UnknownClassError {
    pub kind: ClassKind,
    pub name: String,
}

/// A student module could not be loaded.
///
/// This is a value, not a fault: the loader hands it back inside
/// [`LoadedModule::Failed`](crate::module::LoadedModule::Failed) and the
/// run carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadError {
    /// The source does not parse.
    #[error("syntax error in {module}: {message}")]
    Syntax { module: String, message: String },

    /// The source parsed but its top-level statements raised.
    #[error("error while initializing {module}: {message}")]
    Initialization { module: String, message: String },
}

impl LoadError {
    /// Name of the module that failed.
    pub fn module(&self) -> &str {
        match self {
            LoadError::Syntax { module, .. } | LoadError::Initialization { module, .. } => module,
        }
    }
}

/// An error raised by student code while a test case runs.
///
/// `signature` is a stable, short error class name (e.g. `TypeError`) used
/// to look up remediation hints.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{signature}: {message}")]
pub struct ExecutionError {
    pub signature: String,
    pub message: String,
}

impl ExecutionError {
    /// Signature of student code stopped at its deadline.
    pub const TERMINATED: &'static str = "Terminated";

    pub fn new(signature: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            message: message.into(),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.signature == Self::TERMINATED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_reports_module() {
        let err = LoadError::Syntax {
            module: "wordprops".into(),
            message: "unexpected '}'".into(),
        };
        assert_eq!(err.module(), "wordprops");
        assert!(err.to_string().contains("syntax error in wordprops"));
    }

    #[test]
    fn unknown_class_converts_to_config_error() {
        let err: ConfigError = UnknownClassError {
            kind: ClassKind::TestCase,
            name: "GraphSearchTest".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "unknown test case class 'GraphSearchTest'"
        );
    }

    #[test]
    fn dependency_cycle_message() {
        let err = ConfigError::DependencyCycle(vec!["q1".into(), "q2".into(), "q1".into()]);
        assert_eq!(err.to_string(), "dependency cycle: q1 -> q2 -> q1");
    }
}
