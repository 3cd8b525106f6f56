//! Group scoring policies.

use inspector_core::model::CaseOutcome;
use inspector_core::traits::Question;

/// Sum of the points each case awarded.
///
/// Registered as both `Question` and `PartialCreditQuestion`.
pub struct PartialCreditQuestion;

impl Question for PartialCreditQuestion {
    fn score(&self, outcomes: &[CaseOutcome], _max_points: f64) -> f64 {
        outcomes.iter().map(|o| o.points_awarded).sum()
    }
}

/// All or nothing: full marks only when every case passed.
pub struct PassAllTestsQuestion;

impl Question for PassAllTestsQuestion {
    fn score(&self, outcomes: &[CaseOutcome], max_points: f64) -> f64 {
        if outcomes.iter().all(CaseOutcome::passed) {
            max_points
        } else {
            0.0
        }
    }
}

/// One point per passing case, regardless of declared case points.
pub struct NumberPassedQuestion;

impl Question for NumberPassedQuestion {
    fn score(&self, outcomes: &[CaseOutcome], _max_points: f64) -> f64 {
        outcomes.iter().filter(|o| o.passed()).count() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspector_core::model::CaseStatus;

    fn outcome(status: CaseStatus, awarded: f64) -> CaseOutcome {
        CaseOutcome {
            case_id: "t_1".into(),
            status,
            points_awarded: awarded,
            points_possible: 2.0,
            messages: vec![],
            duration_ms: 0,
        }
    }

    #[test]
    fn partial_credit_sums_awarded_points() {
        let outcomes = [
            outcome(CaseStatus::Passed, 2.0),
            outcome(CaseStatus::Failed, 0.5),
            outcome(CaseStatus::TimedOut, 0.0),
        ];
        assert_eq!(PartialCreditQuestion.score(&outcomes, 6.0), 2.5);
    }

    #[test]
    fn pass_all_is_all_or_nothing() {
        let passing = [outcome(CaseStatus::Passed, 2.0), outcome(CaseStatus::Passed, 2.0)];
        assert_eq!(PassAllTestsQuestion.score(&passing, 4.0), 4.0);

        let skipped = [outcome(CaseStatus::Passed, 2.0), outcome(CaseStatus::Skipped, 0.0)];
        assert_eq!(PassAllTestsQuestion.score(&skipped, 4.0), 0.0);
    }

    #[test]
    fn number_passed_counts_cases() {
        let outcomes = [
            outcome(CaseStatus::Passed, 2.0),
            outcome(CaseStatus::Errored, 0.0),
            outcome(CaseStatus::Passed, 2.0),
        ];
        assert_eq!(NumberPassedQuestion.score(&outcomes, 3.0), 2.0);
    }
}
