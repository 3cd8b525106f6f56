//! Test discovery: turns a group directory into an ordered, bound case list.
//!
//! Cases are `<id>.test` files whose identifier ends in `_<integer>`; they
//! run in ascending integer order regardless of how the names sort as text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{ConfigError, LoadError};
use crate::model::TestCaseDescriptor;
use crate::module::{LoadedModule, ModuleTable};
use crate::parser::{parse_config, ConfigMap, TestRoot};
use crate::resolver::{resolve_order, RunOrder};
use crate::traits::{ClassRegistry, Question, TestCase};

pub const TEST_SUFFIX: &str = "test";
pub const SOLUTION_SUFFIX: &str = "solution";
pub const OUTPUT_SUFFIX: &str = "test_output";

/// Question class used when a group `CONFIG` does not name one.
pub const DEFAULT_QUESTION_CLASS: &str = "Question";

/// Deferred access to a case's expected output.
///
/// The file is read when the case executes, so solutions may be regenerated
/// between discovery and grading.
#[derive(Debug, Clone)]
pub struct SolutionSource {
    path: PathBuf,
}

impl SolutionSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the solution file; `None` when it does not exist.
    pub fn load(&self) -> Result<Option<ConfigMap>, ConfigError> {
        if self.path.exists() {
            parse_config(&self.path).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Why a case was bound but will not execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockReason {
    /// The target module failed to load.
    LoadFailure { module: String },
    /// The target module loaded but does not define the symbol.
    MissingSymbol { module: String, symbol: String },
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::LoadFailure { module } => {
                write!(f, "not run: module '{module}' failed to load")
            }
            BlockReason::MissingSymbol { module, symbol } => {
                write!(f, "not run: '{symbol}' is not defined in '{module}'")
            }
        }
    }
}

/// How a discovered case is attached to its group.
#[derive(Clone)]
pub enum CaseBinding {
    Runnable {
        case: Arc<dyn TestCase>,
        solution: SolutionSource,
    },
    Blocked(BlockReason),
}

/// A descriptor and its binding.
#[derive(Clone)]
pub struct BoundCase {
    pub descriptor: TestCaseDescriptor,
    pub binding: CaseBinding,
}

/// A question group ready for grading.
pub struct QuestionGroup {
    pub id: String,
    pub config: ConfigMap,
    /// Declared `depends`, in order.
    pub prerequisites: Vec<String>,
    pub question: Box<dyn Question>,
    /// Enabled cases in run order. Blocked cases are kept so they count
    /// towards `max_points`.
    pub cases: Vec<BoundCase>,
    pub max_points: f64,
    /// One entry per failed module the group's cases reference.
    pub load_failures: Vec<LoadError>,
    /// Each absent symbol once.
    pub missing_symbols: Vec<String>,
}

impl QuestionGroup {
    /// Whether discovery recorded a load failure or missing symbol.
    pub fn has_load_problems(&self) -> bool {
        !self.load_failures.is_empty() || !self.missing_symbols.is_empty()
    }
}

/// Integer ordering key of a case identifier: the text after its last `_`.
pub fn ordering_key(id: &str) -> Option<i64> {
    id.rsplit('_').next()?.parse().ok()
}

fn is_descriptor_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(".test") else {
        return false;
    };
    !stem.is_empty() && !name.starts_with(['#', '~', '.'])
}

/// Enumerate, parse and order the descriptors in `group_dir`.
pub fn discover(group_dir: &Path, group: &str) -> Result<Vec<TestCaseDescriptor>, ConfigError> {
    let entries = std::fs::read_dir(group_dir).map_err(|source| ConfigError::Io {
        path: group_dir.to_path_buf(),
        source,
    })?;

    let mut ids = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::Io {
            path: group_dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name().to_string_lossy().to_string();
        if entry.path().is_file() && is_descriptor_name(&name) {
            ids.push(name.trim_end_matches(".test").to_string());
        }
    }

    // Lexicographic first so equal keys keep a stable, platform-independent order.
    ids.sort();
    let mut keyed = Vec::with_capacity(ids.len());
    for id in ids {
        let path = group_dir.join(format!("{id}.{TEST_SUFFIX}"));
        let order = ordering_key(&id).ok_or_else(|| ConfigError::InvalidValue {
            path: path.clone(),
            key: "identifier".into(),
            message: format!("'{id}' does not end in _<integer>"),
        })?;
        keyed.push((order, id, path));
    }
    keyed.sort_by_key(|(order, _, _)| *order);

    keyed
        .into_iter()
        .map(|(order, id, path)| read_descriptor(group_dir, group, &id, order, &path))
        .collect()
}

fn read_descriptor(
    group_dir: &Path,
    group: &str,
    id: &str,
    order: i64,
    path: &Path,
) -> Result<TestCaseDescriptor, ConfigError> {
    let params = parse_config(path)?;
    let points = params.number("points")?.unwrap_or(1.0);
    if points < 0.0 {
        return Err(ConfigError::InvalidValue {
            path: path.to_path_buf(),
            key: "points".into(),
            message: "must not be negative".into(),
        });
    }

    Ok(TestCaseDescriptor {
        id: id.to_string(),
        group: group.to_string(),
        order,
        module: params.require("module")?.to_string(),
        symbol: params.require("func")?.to_string(),
        class: params.require("class")?.to_string(),
        points,
        disabled: params.flag("disabled"),
        solution_path: group_dir.join(format!("{id}.{SOLUTION_SUFFIX}")),
        output_path: group_dir.join(format!("{id}.{OUTPUT_SUFFIX}")),
        params,
    })
}

/// Build the question object for `group` and bind its cases.
pub fn discover_group(
    root: &TestRoot,
    group: &str,
    modules: &ModuleTable,
    registry: &ClassRegistry,
) -> Result<QuestionGroup, ConfigError> {
    let config = root.group_config(group)?;
    let class = config.get("class").unwrap_or(DEFAULT_QUESTION_CLASS);
    let question = registry.create_question(class, &config)?;

    let mut cases = Vec::new();
    let mut load_failures: Vec<LoadError> = Vec::new();
    let mut missing_symbols: Vec<String> = Vec::new();

    for descriptor in discover(&root.group_dir(group), group)? {
        let module = modules
            .get(&descriptor.module)
            .ok_or_else(|| ConfigError::ModuleNotLoaded {
                case: format!("{group}/{}", descriptor.id),
                module: descriptor.module.clone(),
            })?;

        let blocked = match module {
            LoadedModule::Failed(err) => {
                if !load_failures.contains(err) {
                    load_failures.push(err.clone());
                }
                Some(BlockReason::LoadFailure {
                    module: descriptor.module.clone(),
                })
            }
            LoadedModule::Loaded(ns) if !ns.has_symbol(&descriptor.symbol) => {
                if !missing_symbols.contains(&descriptor.symbol) {
                    missing_symbols.push(descriptor.symbol.clone());
                }
                Some(BlockReason::MissingSymbol {
                    module: descriptor.module.clone(),
                    symbol: descriptor.symbol.clone(),
                })
            }
            LoadedModule::Loaded(_) => None,
        };

        if descriptor.disabled {
            tracing::debug!("{group}/{} is disabled", descriptor.id);
            continue;
        }

        // Built even for blocked cases so an unknown class is always fatal.
        let case = registry.create_case(&descriptor)?;
        let binding = match blocked {
            Some(reason) => CaseBinding::Blocked(reason),
            None => CaseBinding::Runnable {
                case,
                solution: SolutionSource::new(&descriptor.solution_path),
            },
        };
        cases.push(BoundCase {
            descriptor,
            binding,
        });
    }

    let max_points = match declared_max_points(&config)? {
        Some(declared) => declared,
        None => cases.iter().map(|c| c.descriptor.points).sum(),
    };

    tracing::debug!(
        "{group}: {} cases, {max_points} points, {} load failures, {} missing symbols",
        cases.len(),
        load_failures.len(),
        missing_symbols.len()
    );

    Ok(QuestionGroup {
        id: group.to_string(),
        prerequisites: config.list("depends"),
        config,
        question,
        cases,
        max_points,
        load_failures,
        missing_symbols,
    })
}

/// The group's `max_points` override, which must not be negative.
fn declared_max_points(config: &ConfigMap) -> Result<Option<f64>, ConfigError> {
    match config.number("max_points")? {
        Some(max) if max < 0.0 => Err(ConfigError::InvalidValue {
            path: config.path().to_path_buf(),
            key: "max_points".into(),
            message: "must not be negative".into(),
        }),
        declared => Ok(declared),
    }
}

/// Discover every group in `order`.
pub fn discover_all(
    root: &TestRoot,
    order: &RunOrder,
    modules: &ModuleTable,
    registry: &ClassRegistry,
) -> Result<Vec<QuestionGroup>, ConfigError> {
    order
        .into_iter()
        .map(|group| discover_group(root, group, modules, registry))
        .collect()
}

/// Resolve the run order for `target` and discover every group in it.
pub fn prepare(
    root: &TestRoot,
    target: Option<&str>,
    modules: &ModuleTable,
    registry: &ClassRegistry,
) -> Result<Vec<QuestionGroup>, ConfigError> {
    let order = resolve_order(root, target)?;
    discover_all(root, &order, modules, registry)
}

/// A non-fatal problem found while validating a test tree.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub group: String,
    /// The case identifier (if applicable).
    pub case_id: Option<String>,
    pub message: String,
}

/// Check a test tree without loading any student code.
///
/// Fatal problems (unknown groups, cycles, malformed files, unknown
/// classes) come back as `Err`; softer ones as warnings.
pub fn validate_tree(
    root: &TestRoot,
    target: Option<&str>,
    registry: &ClassRegistry,
) -> Result<(RunOrder, Vec<ValidationWarning>), ConfigError> {
    let order = resolve_order(root, target)?;
    let mut warnings = Vec::new();

    for group in &order {
        let config = root.group_config(group)?;
        let class = config.get("class").unwrap_or(DEFAULT_QUESTION_CLASS);
        registry.create_question(class, &config)?;

        let descriptors = discover(&root.group_dir(group), group)?;
        let mut enabled_points = 0.0;
        let mut enabled = 0usize;

        for descriptor in &descriptors {
            if descriptor.disabled {
                continue;
            }
            registry.create_case(descriptor)?;
            enabled += 1;
            enabled_points += descriptor.points;
            if !descriptor.solution_path.exists() {
                warnings.push(ValidationWarning {
                    group: group.clone(),
                    case_id: Some(descriptor.id.clone()),
                    message: "no solution file".into(),
                });
            }
        }

        if enabled == 0 {
            warnings.push(ValidationWarning {
                group: group.clone(),
                case_id: None,
                message: "group has no enabled test cases".into(),
            });
        }

        if let Some(max) = declared_max_points(&config)? {
            if max < enabled_points {
                warnings.push(ValidationWarning {
                    group: group.clone(),
                    case_id: None,
                    message: format!(
                        "max_points ({max}) is below the sum of case points ({enabled_points})"
                    ),
                });
            }
        }
    }

    Ok((order, warnings))
}
