//! Grade report type with JSON persistence.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{GroupState, ScoreRecord};

/// A complete grading run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeReport {
    /// Unique run identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Project (assignment) name.
    #[serde(default)]
    pub project_name: String,
    /// Fixed cover-sheet points added once to the total.
    pub cover_sheet_score: f64,
    /// Per-group results in run order.
    pub groups: Vec<ScoreRecord>,
    /// Cover sheet plus every group score.
    pub total: f64,
    /// Cover sheet plus every group's max points.
    pub max_total: f64,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl GradeReport {
    /// Assemble a report, computing the totals from `groups`.
    pub fn new(
        project_name: impl Into<String>,
        cover_sheet_score: f64,
        groups: Vec<ScoreRecord>,
        duration_ms: u64,
    ) -> Self {
        let total = cover_sheet_score + groups.iter().map(|g| g.score).sum::<f64>();
        let max_total = cover_sheet_score + groups.iter().map(|g| g.max_points).sum::<f64>();
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            project_name: project_name.into(),
            cover_sheet_score,
            groups,
            total,
            max_total,
            duration_ms,
        }
    }

    /// The record for `group`, if it ran.
    pub fn group(&self, group: &str) -> Option<&ScoreRecord> {
        self.groups.iter().find(|g| g.group == group)
    }

    /// Number of groups that ended in `state`.
    pub fn count(&self, state: GroupState) -> usize {
        self.groups.iter().filter(|g| g.state == state).count()
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: GradeReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}
