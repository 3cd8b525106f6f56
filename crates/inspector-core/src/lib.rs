//! inspector-core — Grading orchestration engine.
//!
//! Resolves which question groups run and in what order, discovers and
//! binds their test cases against loaded student modules, and grades them
//! under a per-case timeout with prerequisite gating.

pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod hints;
pub mod model;
pub mod module;
pub mod parser;
pub mod report;
pub mod resolver;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;
