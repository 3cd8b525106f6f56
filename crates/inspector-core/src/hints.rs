//! Error-signature → remediation text lookup shown to students.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ExecutionError;

/// Hint table, global with optional per-group overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HintMap {
    #[serde(default)]
    global: BTreeMap<String, String>,
    #[serde(default)]
    groups: BTreeMap<String, BTreeMap<String, String>>,
}

impl HintMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults for the signatures the script runner produces.
    pub fn builtin() -> Self {
        let mut map = Self::new();
        for (signature, hint) in [
            (
                "TypeError",
                "A value had the wrong type. Check the types of your arguments and return values.",
            ),
            (
                "NameError",
                "A variable was used before it was defined. Check spelling and scope.",
            ),
            (
                "FunctionNotFound",
                "A function was called that does not exist with those arguments. Check its name and parameter count.",
            ),
            (
                "IndexError",
                "An index was outside the bounds of an array or string.",
            ),
            ("KeyError", "A map was read with a key it does not contain."),
            (
                "ArithmeticError",
                "An arithmetic operation failed, such as division by zero or overflow.",
            ),
            (
                "RecursionError",
                "Your code recursed too deeply or ran too many operations. Check your base case.",
            ),
            ("RuntimeError", "Your code threw an error explicitly."),
            (
                "Terminated",
                "Your code was stopped before it finished. Look for loops that never end.",
            ),
        ] {
            map.insert(signature, hint);
        }
        map
    }

    pub fn insert(&mut self, signature: impl Into<String>, hint: impl Into<String>) {
        self.global.insert(signature.into(), hint.into());
    }

    pub fn insert_for_group(
        &mut self,
        group: impl Into<String>,
        signature: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.groups
            .entry(group.into())
            .or_default()
            .insert(signature.into(), hint.into());
    }

    /// Overlay `other` on top of this map.
    pub fn merge(&mut self, other: HintMap) {
        self.global.extend(other.global);
        for (group, hints) in other.groups {
            self.groups.entry(group).or_default().extend(hints);
        }
    }

    /// Hint for `signature`, group table first.
    pub fn lookup(&self, group: &str, signature: &str) -> Option<&str> {
        self.groups
            .get(group)
            .and_then(|hints| hints.get(signature))
            .or_else(|| self.global.get(signature))
            .map(String::as_str)
    }

    /// Outcome message for an execution error: the error itself, plus its
    /// hint on a second line when one exists.
    pub fn render(&self, group: &str, error: &ExecutionError) -> String {
        match self.lookup(group, &error.signature) {
            Some(hint) => format!("{error}\nHint: {hint}"),
            None => error.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty() && self.groups.is_empty()
    }
}
