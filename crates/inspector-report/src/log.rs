//! Append-only JSON run log.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Map, Value};

use inspector_core::report::GradeReport;

/// Log file name inside the output directory.
pub const LOG_FILE: &str = "inspector.log";

/// One log line summarizing `report`.
pub fn log_entry(report: &GradeReport) -> Value {
    let groups: Map<String, Value> = report
        .groups
        .iter()
        .map(|g| {
            (
                g.group.clone(),
                json!({
                    "state": g.state,
                    "score": g.score,
                    "max_points": g.max_points,
                }),
            )
        })
        .collect();

    json!({
        "id": report.id,
        "created_at": report.created_at.to_rfc3339(),
        "project_name": report.project_name,
        "total": report.total,
        "max_total": report.max_total,
        "duration_ms": report.duration_ms,
        "groups": groups,
    })
}

/// Append one line for `report` to `<output_dir>/inspector.log`.
pub fn append_log(report: &GradeReport, output_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    let path = output_dir.join(LOG_FILE);

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    writeln!(file, "{}", log_entry(report))
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
