//! Plain-text summary printed at the end of a run.

use std::fmt::Write;

use inspector_core::model::{CaseStatus, ScoreRecord};
use inspector_core::report::GradeReport;

/// Render the report. Scores are only shown when `show_grades` is set;
/// otherwise each group shows its final state.
pub fn render_text(report: &GradeReport, show_grades: bool) -> String {
    let mut out = String::new();

    for record in &report.groups {
        render_group(&mut out, record, show_grades);
    }

    let _ = writeln!(out, "\nFinished at {}", report.created_at.format("%H:%M:%S"));
    let _ = writeln!(out, "\nProvisional grades\n==================");
    for record in &report.groups {
        if show_grades {
            let _ = writeln!(
                out,
                "Question {}: {}/{}",
                record.group,
                fmt_points(record.score),
                fmt_points(record.max_points)
            );
        } else {
            let _ = writeln!(out, "Question {}: {}", record.group, record.state);
        }
    }
    if show_grades {
        if report.cover_sheet_score > 0.0 {
            let _ = writeln!(out, "Cover sheet: {}", fmt_points(report.cover_sheet_score));
        }
        let _ = writeln!(out, "------------------");
        let _ = writeln!(
            out,
            "Total: {}/{}",
            fmt_points(report.total),
            fmt_points(report.max_total)
        );
    }
    out
}

fn render_group(out: &mut String, record: &ScoreRecord, show_grades: bool) {
    let _ = writeln!(out, "Question {}\n===========", record.group);

    for failure in &record.load_failures {
        let _ = writeln!(out, "*** {failure}");
    }
    for symbol in &record.missing_symbols {
        let _ = writeln!(out, "*** Missing definition: {symbol}");
    }
    if let Some(prereq) = &record.gated_by {
        let _ = writeln!(
            out,
            "*** Tests not run: prerequisite {prereq} must pass first."
        );
    }

    for outcome in &record.outcomes {
        if outcome.status == CaseStatus::Skipped && record.gated {
            continue;
        }
        let _ = writeln!(out, "*** {}: {}/{}", outcome.status, record.group, outcome.case_id);
        for message in &outcome.messages {
            for line in message.lines() {
                let _ = writeln!(out, "***     {line}");
            }
        }
    }

    if show_grades {
        let _ = writeln!(
            out,
            "\n### Question {}: {}/{} ###\n",
            record.group,
            fmt_points(record.score),
            fmt_points(record.max_points)
        );
    } else {
        let _ = writeln!(out, "\n### Question {}: {} ###\n", record.group, record.state);
    }
}

/// Whole numbers without a trailing `.0`.
pub fn fmt_points(points: f64) -> String {
    if points.fract() == 0.0 {
        format!("{points:.0}")
    } else {
        format!("{points:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_report;

    #[test]
    fn grades_shown_on_request() {
        let text = render_text(&sample_report(), true);
        assert!(text.contains("Question q1: 5/5"));
        assert!(text.contains("Cover sheet: 5"));
        assert!(text.contains("Total: 10/15"));
        assert!(text.contains("*** PASS: q1/add_2"));
    }

    #[test]
    fn grades_hidden_by_default() {
        let text = render_text(&sample_report(), false);
        assert!(text.contains("Question q2: gated"));
        assert!(!text.contains("Total:"));
        assert!(!text.contains("5/5"));
    }

    #[test]
    fn problems_reported_once_per_group() {
        let text = render_text(&sample_report(), false);
        assert_eq!(text.matches("syntax error in parser").count(), 1);
        assert_eq!(text.matches("Missing definition: area").count(), 1);
        assert!(text.contains("prerequisite q0 must pass first"));
        assert!(!text.contains("q2/area_1"));
    }

    #[test]
    fn point_formatting() {
        assert_eq!(fmt_points(3.0), "3");
        assert_eq!(fmt_points(2.5), "2.50");
    }
}
