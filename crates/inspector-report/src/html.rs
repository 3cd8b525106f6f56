//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use std::path::Path;

use inspector_core::model::{CaseStatus, GroupState, ScoreRecord};
use inspector_core::report::GradeReport;

use crate::text::fmt_points;

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn state_class(state: GroupState) -> &'static str {
    match state {
        GroupState::Passed => "pass",
        GroupState::Partial => "partial",
        _ => "fail",
    }
}

fn status_class(status: CaseStatus) -> &'static str {
    match status {
        CaseStatus::Passed => "pass",
        CaseStatus::Skipped => "skip",
        _ => "fail",
    }
}

/// Generate an HTML report from a grade report.
///
/// Scores are left out unless `show_grades` is set.
pub fn generate_html(report: &GradeReport, show_grades: bool) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>inspector report: {}</title>\n",
        html_escape(&report.project_name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", html_escape(&report.project_name)));
    html.push_str(&format!(
        "<p class=\"meta\">{} questions | {} passed | {} gated | {}</p>\n",
        report.groups.len(),
        report.count(GroupState::Passed),
        report.count(GroupState::Gated),
        report.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if show_grades {
        html.push_str(&format!(
            "<p class=\"total\">Total: <strong>{}/{}</strong></p>\n",
            fmt_points(report.total),
            fmt_points(report.max_total)
        ));
    }
    html.push_str("</header>\n");

    // Summary dashboard
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    if show_grades {
        html.push_str("<thead><tr><th>Question</th><th>State</th><th>Score</th><th>Cases passed</th></tr></thead>\n");
    } else {
        html.push_str("<thead><tr><th>Question</th><th>State</th><th>Cases passed</th></tr></thead>\n");
    }
    html.push_str("<tbody>\n");
    for record in &report.groups {
        let passed = record.outcomes.iter().filter(|o| o.passed()).count();
        let score = if show_grades {
            format!(
                "<td>{}/{}</td>",
                fmt_points(record.score),
                fmt_points(record.max_points)
            )
        } else {
            String::new()
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{}</td>{}<td>{}/{}</td></tr>\n",
            state_class(record.state),
            html_escape(&record.group),
            record.state,
            score,
            passed,
            record.outcomes.len(),
        ));
    }
    html.push_str("</tbody></table>\n");

    if show_grades && !report.groups.is_empty() {
        html.push_str(&generate_bar_chart(&report.groups));
    }
    html.push_str("</section>\n");

    // Load problems and gating, once per group
    let notes: Vec<String> = report.groups.iter().flat_map(group_notes).collect();
    if !notes.is_empty() {
        html.push_str("<section class=\"problems\">\n");
        html.push_str("<h2>Problems</h2>\n<ul>\n");
        for note in notes {
            html.push_str(&format!("<li>{note}</li>\n"));
        }
        html.push_str("</ul>\n</section>\n");
    }

    // Per-case results
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Results</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Question</th><th onclick=\"sortTable(1)\">Case</th><th onclick=\"sortTable(2)\">Status</th><th onclick=\"sortTable(3)\">Time</th><th>Messages</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    for record in &report.groups {
        for outcome in &record.outcomes {
            let class = status_class(outcome.status);
            let messages = outcome
                .messages
                .iter()
                .map(|m| html_escape(m))
                .collect::<Vec<_>>()
                .join("<br>");
            html.push_str(&format!(
                "<tr class=\"{}\"><td>{}</td><td>{}</td><td class=\"{}\">{}</td><td>{}ms</td><td><pre>{}</pre></td></tr>\n",
                class,
                html_escape(&record.group),
                html_escape(&outcome.case_id),
                class,
                outcome.status,
                outcome.duration_ms,
                messages
            ));
        }
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(
        &serde_json::to_string_pretty(report)
            .unwrap_or_default()
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;"),
    );
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    // JavaScript for sorting
    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

fn group_notes(record: &ScoreRecord) -> Vec<String> {
    let group = html_escape(&record.group);
    let mut notes: Vec<String> = record
        .load_failures
        .iter()
        .map(|f| format!("<strong>{group}</strong>: {}", html_escape(&f.to_string())))
        .collect();
    notes.extend(record.missing_symbols.iter().map(|s| {
        format!(
            "<strong>{group}</strong>: missing definition <code>{}</code>",
            html_escape(s)
        )
    }));
    if let Some(prereq) = &record.gated_by {
        notes.push(format!(
            "<strong>{group}</strong>: not run, prerequisite {} did not pass",
            html_escape(prereq)
        ));
    }
    notes
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &GradeReport, show_grades: bool, path: &Path) -> Result<()> {
    let html = generate_html(report, show_grades);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

fn generate_bar_chart(groups: &[ScoreRecord]) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 120;

    let total_height = groups.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 80,
        total_height
    );

    for (i, record) in groups.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let ratio = if record.max_points > 0.0 {
            (record.score / record.max_points).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let width = (ratio * max_width as f64) as usize;

        let color = if ratio >= 1.0 {
            "#22c55e"
        } else if ratio > 0.0 {
            "#eab308"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            html_escape(&record.group)
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}/{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            fmt_points(record.score),
            fmt_points(record.max_points)
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --partial: #fef9c3; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --partial: #713f12; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
.total { font-size: 1.25rem; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; vertical-align: top; }
th { background: var(--border); cursor: pointer; }
td pre { margin: 0; padding: 0; background: none; white-space: pre-wrap; }
.pass { background: var(--pass); }
.partial { background: var(--partial); }
.fail { background: var(--fail); }
.skip { color: #6b7280; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  rows.sort((a, b) => {
    const va = a.cells[col].textContent;
    const vb = b.cells[col].textContent;
    return asc ? va.localeCompare(vb, undefined, {numeric: true}) : vb.localeCompare(va, undefined, {numeric: true});
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_report;

    #[test]
    fn html_report_contains_required_elements() {
        let html = generate_html(&sample_report(), true);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Word &lt;Properties&gt;"));
        assert!(html.contains("add_2"));
        assert!(html.contains("Total: <strong>10/15</strong>"));
        assert!(html.contains("<svg"));
        assert!(html.contains("missing definition <code>area</code>"));
        assert!(html.contains("prerequisite q0 did not pass"));
    }

    #[test]
    fn grades_hidden_without_flag() {
        let html = generate_html(&sample_report(), false);
        assert!(!html.contains("Total:"));
        assert!(!html.contains("<svg"));
        assert!(html.contains("<td>gated</td>"));
    }

    #[test]
    fn html_report_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.html");

        write_html_report(&sample_report(), true, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
