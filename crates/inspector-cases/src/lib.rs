//! inspector-cases — Question and test-case classes.
//!
//! Group `CONFIG` files and `.test` descriptors name these classes with
//! their `class` key; [`default_registry`] maps those names to
//! constructors.

pub mod eval;
pub mod questions;
pub mod script;

use std::sync::Arc;

use inspector_core::traits::ClassRegistry;

pub use eval::{EvalTest, ValueTest};
pub use questions::{NumberPassedQuestion, PartialCreditQuestion, PassAllTestsQuestion};
pub use script::ScriptTest;

/// Name the test-case module is loaded under.
pub const TEST_CASE_MODULE: &str = "harness";

/// Registry with every built-in class.
pub fn default_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry
        .register_question("Question", |_| Ok(Box::new(PartialCreditQuestion)))
        .register_question("PartialCreditQuestion", |_| Ok(Box::new(PartialCreditQuestion)))
        .register_question("PassAllTestsQuestion", |_| Ok(Box::new(PassAllTestsQuestion)))
        .register_question("NumberPassedQuestion", |_| Ok(Box::new(NumberPassedQuestion)))
        .register_case("EvalTest", |d| Ok(Arc::new(EvalTest::from_descriptor(d)?)))
        .register_case("ValueTest", |d| Ok(Arc::new(ValueTest::from_descriptor(d)?)))
        .register_case("ScriptTest", |d| Ok(Arc::new(ScriptTest::from_descriptor(d)?)));
    registry
}
