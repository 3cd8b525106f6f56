//! Central grading engine.
//!
//! Runs discovered question groups strictly in order, one case at a time,
//! each under a wall-clock timeout. Prerequisite failures gate dependents
//! before any of their cases execute.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::discovery::{BoundCase, CaseBinding, QuestionGroup, SolutionSource};
use crate::hints::HintMap;
use crate::model::{CaseOutcome, CaseStatus, GroupState, ScoreRecord};
use crate::module::ModuleTable;
use crate::report::GradeReport;
use crate::traits::{CaseContext, TestCase};

/// Configuration for the grading engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wall-clock budget per test case.
    pub timeout: Duration,
    /// Points added once to the total, independent of any group.
    pub cover_sheet_score: f64,
    /// Name recorded in the report.
    pub project_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            cover_sheet_score: 0.0,
            project_name: String::new(),
        }
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_group_start(&self, group: &str, case_count: usize);
    fn on_case_complete(&self, group: &str, outcome: &CaseOutcome);
    fn on_group_complete(&self, record: &ScoreRecord);
    fn on_run_complete(&self, report: &GradeReport);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_group_start(&self, _: &str, _: usize) {}
    fn on_case_complete(&self, _: &str, _: &CaseOutcome) {}
    fn on_group_complete(&self, _: &ScoreRecord) {}
    fn on_run_complete(&self, _: &GradeReport) {}
}

/// The grading engine.
pub struct GradingEngine {
    config: EngineConfig,
    hints: HintMap,
}

impl GradingEngine {
    pub fn new(config: EngineConfig, hints: HintMap) -> Self {
        Self { config, hints }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Grade `groups` in the given order.
    ///
    /// Student-code failures never escape: they become case outcomes. The
    /// report always covers every group.
    pub async fn grade(
        &self,
        groups: &[QuestionGroup],
        modules: Arc<ModuleTable>,
        progress: &dyn ProgressReporter,
    ) -> GradeReport {
        let start = Instant::now();
        let mut states: HashMap<&str, GroupState> = HashMap::new();
        let mut records = Vec::with_capacity(groups.len());

        for group in groups {
            states.insert(&group.id, GroupState::Pending);
        }

        for group in groups {
            progress.on_group_start(&group.id, group.cases.len());

            let failed_prereq = group
                .prerequisites
                .iter()
                .find(|p| states.get(p.as_str()).is_some_and(|s| s.blocks_dependents()));

            let record = match failed_prereq {
                Some(prereq) => {
                    tracing::info!("{}: gated by failed prerequisite {prereq}", group.id);
                    self.gate(group, prereq, progress)
                }
                None => {
                    states.insert(&group.id, GroupState::Running);
                    self.run_group(group, &modules, progress).await
                }
            };

            tracing::info!(
                "{}: {} ({}/{})",
                record.group,
                record.state,
                record.score,
                record.max_points
            );
            states.insert(&group.id, record.state);
            progress.on_group_complete(&record);
            records.push(record);
        }

        let report = GradeReport::new(
            self.config.project_name.clone(),
            self.config.cover_sheet_score,
            records,
            start.elapsed().as_millis() as u64,
        );
        progress.on_run_complete(&report);
        report
    }

    fn gate(
        &self,
        group: &QuestionGroup,
        prereq: &str,
        progress: &dyn ProgressReporter,
    ) -> ScoreRecord {
        let outcomes: Vec<CaseOutcome> = group
            .cases
            .iter()
            .map(|bound| {
                let outcome = CaseOutcome::skipped(
                    &bound.descriptor,
                    format!("not run: prerequisite {prereq} did not pass"),
                );
                progress.on_case_complete(&group.id, &outcome);
                outcome
            })
            .collect();

        ScoreRecord {
            group: group.id.clone(),
            state: GroupState::Gated,
            score: 0.0,
            max_points: group.max_points,
            gated: true,
            gated_by: Some(prereq.to_string()),
            outcomes,
            load_failures: group.load_failures.clone(),
            missing_symbols: group.missing_symbols.clone(),
        }
    }

    async fn run_group(
        &self,
        group: &QuestionGroup,
        modules: &Arc<ModuleTable>,
        progress: &dyn ProgressReporter,
    ) -> ScoreRecord {
        let mut outcomes = Vec::with_capacity(group.cases.len());

        for bound in &group.cases {
            let outcome = match &bound.binding {
                CaseBinding::Blocked(reason) => {
                    CaseOutcome::skipped(&bound.descriptor, reason.to_string())
                }
                CaseBinding::Runnable { case, solution } => {
                    self.run_case(&group.id, bound, case, solution, modules).await
                }
            };
            progress.on_case_complete(&group.id, &outcome);
            outcomes.push(outcome);
        }

        let score = clamp(
            group.question.score(&outcomes, group.max_points),
            group.max_points,
        );
        let state = final_state(score, group.max_points, group.has_load_problems());

        ScoreRecord {
            group: group.id.clone(),
            state,
            score,
            max_points: group.max_points,
            gated: false,
            gated_by: None,
            outcomes,
            load_failures: group.load_failures.clone(),
            missing_symbols: group.missing_symbols.clone(),
        }
    }

    async fn run_case(
        &self,
        group: &str,
        bound: &BoundCase,
        case: &Arc<dyn TestCase>,
        solution: &SolutionSource,
        modules: &Arc<ModuleTable>,
    ) -> CaseOutcome {
        let descriptor = &bound.descriptor;
        let start = Instant::now();
        let outcome = |status, points: f64, messages: Vec<String>| CaseOutcome {
            case_id: descriptor.id.clone(),
            status,
            points_awarded: points,
            points_possible: descriptor.points,
            messages,
            duration_ms: start.elapsed().as_millis() as u64,
        };

        let solution = match solution.load() {
            Ok(solution) => solution,
            Err(e) => {
                tracing::warn!("{group}/{}: {e}", descriptor.id);
                return outcome(
                    CaseStatus::Errored,
                    0.0,
                    vec![format!("could not read solution: {e}")],
                );
            }
        };

        let deadline = start + self.config.timeout;
        let ctx = CaseContext {
            modules: Arc::clone(modules),
            solution,
            deadline,
        };
        let timed_out = || {
            tracing::warn!("{group}/{} timed out", descriptor.id);
            outcome(
                CaseStatus::TimedOut,
                0.0,
                vec![format!("timed out after {:?}", self.config.timeout)],
            )
        };
        let case = Arc::clone(case);
        let handle = tokio::task::spawn_blocking(move || case.execute(&ctx));

        match tokio::time::timeout(self.config.timeout, handle).await {
            Err(_) => timed_out(),
            Ok(Err(join)) => {
                tracing::warn!("{group}/{} panicked: {join}", descriptor.id);
                outcome(
                    CaseStatus::Errored,
                    0.0,
                    vec!["test case panicked".to_string()],
                )
            }
            // Scripts stop themselves at the same deadline the engine waits on.
            Ok(Ok(Err(exec))) if exec.is_terminated() || Instant::now() >= deadline => {
                timed_out()
            }
            Ok(Ok(Err(exec))) => {
                tracing::debug!("{group}/{}: {exec}", descriptor.id);
                outcome(
                    CaseStatus::Errored,
                    0.0,
                    vec![self.hints.render(group, &exec)],
                )
            }
            Ok(Ok(Ok(verdict))) => {
                let status = if verdict.passed {
                    CaseStatus::Passed
                } else {
                    CaseStatus::Failed
                };
                outcome(
                    status,
                    clamp(verdict.points, descriptor.points),
                    verdict.messages,
                )
            }
        }
    }
}

fn clamp(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.min(max).max(0.0)
}

fn final_state(score: f64, max_points: f64, load_problems: bool) -> GroupState {
    if max_points <= 0.0 {
        return if load_problems {
            GroupState::Failed
        } else {
            GroupState::Passed
        };
    }
    if score >= max_points {
        GroupState::Passed
    } else if score > 0.0 {
        GroupState::Partial
    } else {
        GroupState::Failed
    }
}
