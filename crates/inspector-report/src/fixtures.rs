use inspector_core::error::LoadError;
use inspector_core::model::{CaseOutcome, CaseStatus, GroupState, ScoreRecord};
use inspector_core::report::GradeReport;

fn outcome(id: &str, status: CaseStatus, awarded: f64, possible: f64, message: &str) -> CaseOutcome {
    CaseOutcome {
        case_id: id.into(),
        status,
        points_awarded: awarded,
        points_possible: possible,
        messages: vec![message.into()],
        duration_ms: 3,
    }
}

/// Two groups: `q1` fully passed, `q2` gated on a failed `q0`.
pub fn sample_report() -> GradeReport {
    GradeReport::new(
        "Word <Properties>",
        5.0,
        vec![
            ScoreRecord {
                group: "q0".into(),
                state: GroupState::Failed,
                score: 0.0,
                max_points: 1.0,
                gated: false,
                gated_by: None,
                outcomes: vec![outcome(
                    "parse_1",
                    CaseStatus::Skipped,
                    0.0,
                    1.0,
                    "not run: module 'parser' failed to load",
                )],
                load_failures: vec![LoadError::Syntax {
                    module: "parser".into(),
                    message: "unexpected end of input".into(),
                }],
                missing_symbols: vec![],
            },
            ScoreRecord {
                group: "q1".into(),
                state: GroupState::Passed,
                score: 5.0,
                max_points: 5.0,
                gated: false,
                gated_by: None,
                outcomes: vec![
                    outcome("add_1", CaseStatus::Passed, 2.0, 2.0, "add(1, 1) returned 2"),
                    outcome("add_2", CaseStatus::Passed, 3.0, 3.0, "add(2, 2) returned 4"),
                ],
                load_failures: vec![],
                missing_symbols: vec![],
            },
            ScoreRecord {
                group: "q2".into(),
                state: GroupState::Gated,
                score: 0.0,
                max_points: 4.0,
                gated: true,
                gated_by: Some("q0".into()),
                outcomes: vec![outcome(
                    "area_1",
                    CaseStatus::Skipped,
                    0.0,
                    4.0,
                    "not run: prerequisite q0 did not pass",
                )],
                load_failures: vec![],
                missing_symbols: vec!["area".into()],
            },
        ],
        42,
    )
}
