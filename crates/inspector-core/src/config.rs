//! Project configuration (`inspector.toml`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::hints::HintMap;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "inspector.toml";

/// Top-level project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Assignment name shown in reports.
    #[serde(default = "default_project_name")]
    pub project_name: String,
    /// Directory holding the question groups.
    #[serde(default = "default_test_root")]
    pub test_root: PathBuf,
    /// Directory the student files are relative to.
    #[serde(default = "default_code_dir")]
    pub student_code_dir: PathBuf,
    /// Student source files to load.
    #[serde(default)]
    pub student_code: Vec<String>,
    /// Harness-side module with checker functions, relative to `test_root`.
    #[serde(default)]
    pub test_case_code: Option<String>,
    /// Per-case timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Show scores in the plain-text report.
    #[serde(default)]
    pub show_grades: bool,
    /// Fixed points added once to the total.
    #[serde(default = "default_cover_sheet")]
    pub cover_sheet_score: f64,
    /// Seed for the per-module random generator.
    #[serde(default)]
    pub seed: u64,
    /// Where HTML, JSON and log output go.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Error signature → hint text, overriding the built-in table.
    #[serde(default)]
    pub hints: BTreeMap<String, String>,
    /// Per-group hint tables.
    #[serde(default)]
    pub group_hints: BTreeMap<String, BTreeMap<String, String>>,
}

fn default_project_name() -> String {
    "inspector".to_string()
}
fn default_test_root() -> PathBuf {
    PathBuf::from("test_cases")
}
fn default_code_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_timeout() -> u64 {
    60
}
fn default_cover_sheet() -> f64 {
    5.0
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./inspector-results")
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            test_root: default_test_root(),
            student_code_dir: default_code_dir(),
            student_code: Vec::new(),
            test_case_code: None,
            timeout_secs: default_timeout(),
            show_grades: false,
            cover_sheet_score: default_cover_sheet(),
            seed: 0,
            output_dir: default_output_dir(),
            hints: BTreeMap::new(),
            group_hints: BTreeMap::new(),
        }
    }
}

impl ProjectConfig {
    /// Built-in hints overlaid with the configured ones.
    pub fn hint_map(&self) -> HintMap {
        let mut custom = HintMap::new();
        for (signature, hint) in &self.hints {
            custom.insert(signature.clone(), hint.clone());
        }
        for (group, hints) in &self.group_hints {
            for (signature, hint) in hints {
                custom.insert_for_group(group.clone(), signature.clone(), hint.clone());
            }
        }
        let mut map = HintMap::builtin();
        map.merge(custom);
        map
    }

    fn resolve_env(&mut self) {
        self.project_name = resolve_env_vars(&self.project_name);
        self.test_root = resolve_path(&self.test_root);
        self.student_code_dir = resolve_path(&self.student_code_dir);
        self.output_dir = resolve_path(&self.output_dir);
        for file in &mut self.student_code {
            *file = resolve_env_vars(file);
        }
        if let Some(code) = &mut self.test_case_code {
            *code = resolve_env_vars(code);
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again.
fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(end) = rest[start..].find('}') else {
            break;
        };
        result.push_str(&rest[..start]);
        let var_name = &rest[start + 2..start + end];
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + end + 1..];
    }
    result.push_str(rest);
    result
}

fn resolve_path(path: &Path) -> PathBuf {
    PathBuf::from(resolve_env_vars(&path.to_string_lossy()))
}

/// Load config from `./inspector.toml`, or defaults when absent.
pub fn load_config() -> Result<ProjectConfig> {
    load_config_from(None)
}

/// Load config from an explicit path (which must exist), or search the
/// current directory.
pub fn load_config_from(path: Option<&Path>) -> Result<ProjectConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            local.exists().then_some(local)
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<ProjectConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => ProjectConfig::default(),
    };

    config.resolve_env();
    Ok(config)
}
