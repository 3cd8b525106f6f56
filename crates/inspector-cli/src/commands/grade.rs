//! The `inspector grade` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use inspector_cases::{default_registry, TEST_CASE_MODULE};
use inspector_core::config::{load_config_from, ProjectConfig};
use inspector_core::discovery::prepare;
use inspector_core::engine::{EngineConfig, GradingEngine, ProgressReporter};
use inspector_core::error::ConfigError;
use inspector_core::model::{CaseOutcome, ScoreRecord};
use inspector_core::module::{load_modules, LoadedModule, ModuleLoader, ModuleTable};
use inspector_core::parser::TestRoot;
use inspector_core::report::GradeReport;
use inspector_report::text::fmt_points;
use inspector_report::{append_log, render_text, write_html_report};
use inspector_runner::ScriptLoader;

#[derive(Args, Debug, Default)]
pub struct GradeArgs {
    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory holding the question groups
    #[arg(long)]
    pub test_root: Option<PathBuf>,

    /// Student source files, comma-separated (e.g. "wordprops.rhai,util.rhai")
    #[arg(long, value_delimiter = ',')]
    pub student_code: Vec<String>,

    /// Directory the student files are relative to
    #[arg(long)]
    pub code_root: Option<PathBuf>,

    /// Harness module with checker functions, relative to the test root
    #[arg(long)]
    pub test_case_code: Option<String>,

    /// Grade only this question and its prerequisites
    #[arg(short, long)]
    pub question: Option<String>,

    /// Write an HTML report to the output directory
    #[arg(long)]
    pub html: bool,

    /// Append a JSON line to the run log in the output directory
    #[arg(long)]
    pub log: bool,

    /// Write the full report as JSON to the output directory
    #[arg(long)]
    pub json: bool,

    /// Show scores in the report
    #[arg(long)]
    pub show_grades: bool,

    /// Output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Points for the cover sheet
    #[arg(long)]
    pub coversheet: Option<f64>,

    /// Per-case timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Seed for the scripts' random generator
    #[arg(long)]
    pub seed: Option<u64>,
}

impl GradeArgs {
    /// Overlay command-line flags on the loaded config.
    fn apply(&self, config: &mut ProjectConfig) {
        if let Some(root) = &self.test_root {
            config.test_root = root.clone();
        }
        if !self.student_code.is_empty() {
            config.student_code = self.student_code.clone();
        }
        if let Some(dir) = &self.code_root {
            config.student_code_dir = dir.clone();
        }
        if let Some(code) = &self.test_case_code {
            config.test_case_code = Some(code.clone());
        }
        if self.show_grades {
            config.show_grades = true;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(points) = self.coversheet {
            config.cover_sheet_score = points;
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
    }
}

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_group_start(&self, group: &str, case_count: usize) {
        eprintln!("  Starting: {group} ({case_count} cases)");
    }

    fn on_case_complete(&self, group: &str, outcome: &CaseOutcome) {
        eprintln!(
            "    {}: {group}/{} ({}ms)",
            outcome.status, outcome.case_id, outcome.duration_ms
        );
    }

    fn on_group_complete(&self, record: &ScoreRecord) {
        eprintln!("  Done: {} [{}]", record.group, record.state);
    }

    fn on_run_complete(&self, report: &GradeReport) {
        eprintln!(
            "\nComplete: {} questions ({:.1}s)",
            report.groups.len(),
            report.duration_ms as f64 / 1000.0
        );
    }
}

pub async fn execute(args: GradeArgs) -> Result<()> {
    let mut config = load_config_from(args.config.as_deref())?;
    args.apply(&mut config);

    anyhow::ensure!(config.timeout_secs >= 1, "timeout must be at least 1 second");
    anyhow::ensure!(
        config.cover_sheet_score >= 0.0,
        "cover sheet score must not be negative"
    );
    anyhow::ensure!(
        !config.student_code.is_empty(),
        "no student code given; set student_code in inspector.toml or pass --student-code"
    );

    let root = TestRoot::new(config.test_root.clone())?;
    let loader = ScriptLoader::new().with_seed(config.seed);
    let modules = load_all_modules(&loader, &config)?;

    let registry = default_registry();
    let groups = prepare(&root, args.question.as_deref(), &modules, &registry)?;
    tracing::info!(
        "grading {} questions: {}",
        groups.len(),
        groups.iter().map(|g| g.id.as_str()).collect::<Vec<_>>().join(" ")
    );

    let engine = GradingEngine::new(
        EngineConfig {
            timeout: Duration::from_secs(config.timeout_secs),
            cover_sheet_score: config.cover_sheet_score,
            project_name: config.project_name.clone(),
        },
        config.hint_map(),
    );
    let report = engine
        .grade(&groups, Arc::new(modules), &ConsoleReporter)
        .await;

    print!("{}", render_text(&report, config.show_grades));
    print_summary(&report, config.show_grades);

    let output = &config.output_dir;
    if args.json {
        let path = output.join("report.json");
        report.save_json(&path)?;
        eprintln!("JSON report: {}", path.display());
    }
    if args.html {
        let path = output.join("report.html");
        write_html_report(&report, config.show_grades, &path)?;
        eprintln!("HTML report: {}", path.display());
    }
    if args.log {
        let path = append_log(&report, output)?;
        eprintln!("Run log: {}", path.display());
    }

    Ok(())
}

/// Load the student modules, then the test-case module under its reserved name.
fn load_all_modules(loader: &ScriptLoader, config: &ProjectConfig) -> Result<ModuleTable> {
    let files: Vec<PathBuf> = config.student_code.iter().map(PathBuf::from).collect();
    let mut modules = load_modules(loader, &config.student_code_dir, &files)
        .context("failed to load student code")?;

    if let Some(code) = &config.test_case_code {
        anyhow::ensure!(
            modules.get(TEST_CASE_MODULE).is_none(),
            "student module name '{TEST_CASE_MODULE}' is reserved for the test-case module"
        );
        let path = config.test_root.join(code);
        match loader.load(TEST_CASE_MODULE, &path)? {
            LoadedModule::Failed(err) => return Err(ConfigError::TestCaseModule(err).into()),
            loaded => modules.insert(TEST_CASE_MODULE, loaded),
        }
    }

    Ok(modules)
}

fn print_summary(report: &GradeReport, show_grades: bool) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    let mut header = vec!["Question", "State", "Cases passed"];
    if show_grades {
        header.push("Score");
    }
    table.set_header(header);

    for record in &report.groups {
        let passed = record.outcomes.iter().filter(|o| o.passed()).count();
        let mut row = vec![
            Cell::new(&record.group),
            Cell::new(record.state),
            Cell::new(format!("{passed}/{}", record.outcomes.len())),
        ];
        if show_grades {
            row.push(Cell::new(format!(
                "{}/{}",
                fmt_points(record.score),
                fmt_points(record.max_points)
            )));
        }
        table.add_row(row);
    }

    eprintln!("\n{table}");
}
