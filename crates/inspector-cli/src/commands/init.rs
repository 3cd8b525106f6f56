//! The `inspector init` command.

use std::path::Path;

use anyhow::{Context, Result};

const FILES: &[(&str, &str)] = &[
    ("inspector.toml", SAMPLE_CONFIG),
    ("student/wordprops.rhai", STUDENT_CODE),
    ("test_cases/CONFIG", ROOT_CONFIG),
    ("test_cases/checks.rhai", CHECKS),
    ("test_cases/q1/CONFIG", Q1_CONFIG),
    ("test_cases/q1/count_1.test", Q1_CASE_1),
    ("test_cases/q1/count_1.solution", Q1_SOLUTION_1),
    ("test_cases/q1/count_2.test", Q1_CASE_2),
    ("test_cases/q1/count_2.solution", Q1_SOLUTION_2),
    ("test_cases/q2/CONFIG", Q2_CONFIG),
    ("test_cases/q2/longest_1.test", Q2_CASE_1),
    ("test_cases/q2/longest_1.solution", Q2_SOLUTION_1),
];

pub fn execute() -> Result<()> {
    for (name, content) in FILES {
        let path = Path::new(name);
        if path.exists() {
            println!("{name} already exists, skipping.");
            continue;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content).with_context(|| format!("failed to write {name}"))?;
        println!("Created {name}");
    }

    println!("\nNext steps:");
    println!("  1. Put the student's code in student/wordprops.rhai");
    println!("  2. Run: inspector validate");
    println!("  3. Run: inspector grade --show-grades");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# inspector configuration

project_name = "Word Properties"
test_root = "test_cases"
student_code_dir = "student"
student_code = ["wordprops.rhai"]
test_case_code = "checks.rhai"

timeout_secs = 60
cover_sheet_score = 5.0
show_grades = false
seed = 0
output_dir = "./inspector-results"

[hints]
NameError = "Check the spelling of the function name against the assignment."
"#;

const STUDENT_CODE: &str = r#"// Word properties

fn count_vowels(word) {
    let n = 0;
    for c in word.to_lower() {
        if "aeiou".contains(c) {
            n += 1;
        }
    }
    n
}

fn longest(words) {
    let best = "";
    for w in words {
        if w.len() > best.len() {
            best = w;
        }
    }
    best
}
"#;

const ROOT_CONFIG: &str = "order: q1 q2\n";

const CHECKS: &str = r#"// Checker functions used by ScriptTest cases.

fn same_ignoring_case(actual, expected) {
    actual.to_lower() == expected.to_lower()
}
"#;

const Q1_CONFIG: &str = "class: PartialCreditQuestion\n";

const Q1_CASE_1: &str = r#"class: EvalTest
module: wordprops
func: count_vowels
args: ["banana"]
points: 2
"#;

const Q1_SOLUTION_1: &str = "result: 3\n";

const Q1_CASE_2: &str = r#"class: EvalTest
module: wordprops
func: count_vowels
args: ["RHYTHM"]
points: 1
"#;

const Q1_SOLUTION_2: &str = "result: 0\n";

const Q2_CONFIG: &str = "class: PassAllTestsQuestion\ndepends: q1\nmax_points: 3\n";

const Q2_CASE_1: &str = r#"class: ScriptTest
module: wordprops
func: longest
args: [["fig", "Banana", "kiwi"]]
checker: same_ignoring_case
points: 3
"#;

const Q2_SOLUTION_1: &str = "result: banana\n";
