//! Core data model types for inspector.
//!
//! These are the values that flow from discovery through grading into the
//! final report: test case descriptors, per-case outcomes, and per-group
//! score records.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::parser::ConfigMap;

/// One test case as declared by its `<id>.test` descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseDescriptor {
    /// Bare identifier derived from the file name (e.g. `add_2`).
    pub id: String,
    /// Owning question group.
    pub group: String,
    /// Integer suffix after the last `_` in `id`; cases run in ascending order.
    pub order: i64,
    /// Module the case exercises.
    pub module: String,
    /// Symbol in `module` the case invokes.
    pub symbol: String,
    /// Registered test-case class that implements the check.
    pub class: String,
    /// Points this case is worth.
    pub points: f64,
    /// `disabled: true` in the descriptor.
    pub disabled: bool,
    /// Every key in the descriptor, including unrecognized ones.
    pub params: ConfigMap,
    /// Expected-output data, re-read at execution time.
    pub solution_path: PathBuf,
    /// Where a case may record the output it actually observed.
    pub output_path: PathBuf,
}

/// Lifecycle of a question group during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupState {
    Pending,
    Running,
    /// Full marks.
    Passed,
    /// Some but not all points.
    Partial,
    /// Zero points.
    Failed,
    /// Forced to zero because a prerequisite failed.
    Gated,
}

impl GroupState {
    /// Whether dependents of a group in this state must be gated.
    pub fn blocks_dependents(self) -> bool {
        matches!(self, GroupState::Failed | GroupState::Gated)
    }
}

impl fmt::Display for GroupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupState::Pending => "pending",
            GroupState::Running => "running",
            GroupState::Passed => "passed",
            GroupState::Partial => "partial",
            GroupState::Failed => "failed",
            GroupState::Gated => "gated",
        };
        write!(f, "{s}")
    }
}

/// How a single test case ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Passed,
    Failed,
    /// Student code raised while the case ran.
    Errored,
    /// The case exceeded its time budget.
    TimedOut,
    /// Not executed: load failure, missing symbol, or prerequisite gating.
    Skipped,
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::Passed => "PASS",
            CaseStatus::Failed => "FAIL",
            CaseStatus::Errored => "ERROR",
            CaseStatus::TimedOut => "TIMEOUT",
            CaseStatus::Skipped => "SKIP",
        };
        write!(f, "{s}")
    }
}

/// What a test case implementation reports back to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseVerdict {
    pub passed: bool,
    /// Points the case awards; the engine clamps this to the case's value.
    pub points: f64,
    pub messages: Vec<String>,
}

impl CaseVerdict {
    pub fn pass(points: f64) -> Self {
        Self {
            passed: true,
            points,
            messages: Vec::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            points: 0.0,
            messages: vec![message.into()],
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }
}

/// Result of one test case within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseOutcome {
    pub case_id: String,
    pub status: CaseStatus,
    pub points_awarded: f64,
    pub points_possible: f64,
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl CaseOutcome {
    pub fn skipped(descriptor: &TestCaseDescriptor, reason: impl Into<String>) -> Self {
        Self {
            case_id: descriptor.id.clone(),
            status: CaseStatus::Skipped,
            points_awarded: 0.0,
            points_possible: descriptor.points,
            messages: vec![reason.into()],
            duration_ms: 0,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == CaseStatus::Passed
    }
}

/// Final result for one question group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub group: String,
    pub state: GroupState,
    /// In `[0, max_points]`.
    pub score: f64,
    pub max_points: f64,
    /// `true` when a failed prerequisite forced the score to zero.
    pub gated: bool,
    /// The prerequisite that caused gating.
    #[serde(default)]
    pub gated_by: Option<String>,
    pub outcomes: Vec<CaseOutcome>,
    /// One entry per module that failed to load, however many cases it blocked.
    #[serde(default)]
    pub load_failures: Vec<LoadError>,
    /// Each absent symbol once, however many cases referenced it.
    #[serde(default)]
    pub missing_symbols: Vec<String>,
}
