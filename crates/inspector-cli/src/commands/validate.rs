//! The `inspector validate` command.

use std::path::PathBuf;

use anyhow::Result;

use inspector_cases::default_registry;
use inspector_core::config::load_config_from;
use inspector_core::discovery::validate_tree;
use inspector_core::parser::TestRoot;

pub fn execute(
    config_path: Option<PathBuf>,
    test_root: Option<PathBuf>,
    question: Option<String>,
) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(root) = test_root {
        config.test_root = root;
    }

    let root = TestRoot::new(config.test_root.clone())?;
    let (order, warnings) = validate_tree(&root, question.as_deref(), &default_registry())?;

    println!(
        "Test root: {} ({} questions)",
        root.dir().display(),
        order.len()
    );
    println!("Run order: {}", order.groups().join(" -> "));

    for w in &warnings {
        let prefix = match &w.case_id {
            Some(id) => format!("  [{}/{id}]", w.group),
            None => format!("  [{}]", w.group),
        };
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Test tree valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
