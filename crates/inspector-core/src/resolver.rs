//! Question-group run order.
//!
//! Every group appears once, and always after all of its transitive
//! prerequisites.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::parser::TestRoot;

/// Resolved sequence of group identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOrder(Vec<String>);

impl RunOrder {
    pub fn groups(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn position(&self, group: &str) -> Option<usize> {
        self.0.iter().position(|g| g == group)
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a RunOrder {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Resolve the groups to run under `root`.
///
/// With a `target`, that group and its prerequisites run. Without one, the
/// root `CONFIG`'s `order` list is used, falling back to every group
/// directory sorted by name; either way prerequisites are pulled in ahead of
/// their dependents.
pub fn resolve_order(root: &TestRoot, target: Option<&str>) -> Result<RunOrder, ConfigError> {
    let roots = match target {
        Some(group) => vec![group.to_string()],
        None => {
            let declared = root.root_config()?.list("order");
            if declared.is_empty() {
                root.list_groups()?
            } else {
                declared
            }
        }
    };

    let order = resolve_with(&roots, |group| Ok(root.group_config(group)?.list("depends")))?;

    if let Some(group) = target {
        if order.len() > 1 {
            tracing::info!(
                "due to dependencies, the following groups will run: {}",
                order.groups().join(" ")
            );
        } else {
            tracing::debug!("grading single group {group}");
        }
    }
    Ok(order)
}

/// Order `roots` and their transitive prerequisites, prerequisites first.
///
/// `depends` returns a group's declared prerequisites left to right. Repeats
/// reached through several paths keep their first position.
pub fn resolve_with<F>(roots: &[String], mut depends: F) -> Result<RunOrder, ConfigError>
where
    F: FnMut(&str) -> Result<Vec<String>, ConfigError>,
{
    let mut done = HashSet::new();
    let mut stack = Vec::new();
    let mut order = Vec::new();
    for group in roots {
        visit(group, &mut depends, &mut stack, &mut done, &mut order)?;
    }
    Ok(RunOrder(order))
}

fn visit<F>(
    group: &str,
    depends: &mut F,
    stack: &mut Vec<String>,
    done: &mut HashSet<String>,
    order: &mut Vec<String>,
) -> Result<(), ConfigError>
where
    F: FnMut(&str) -> Result<Vec<String>, ConfigError>,
{
    if done.contains(group) {
        return Ok(());
    }
    if let Some(start) = stack.iter().position(|g| g == group) {
        let mut cycle = stack[start..].to_vec();
        cycle.push(group.to_string());
        return Err(ConfigError::DependencyCycle(cycle));
    }

    stack.push(group.to_string());
    for prereq in depends(group)? {
        visit(&prereq, depends, stack, done, order)?;
    }
    stack.pop();

    done.insert(group.to_string());
    order.push(group.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn graph(edges: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        edges
            .iter()
            .map(|(g, deps)| (g.to_string(), deps.iter().map(|d| d.to_string()).collect()))
            .collect()
    }

    fn resolve(
        graph: &HashMap<String, Vec<String>>,
        roots: &[&str],
    ) -> Result<Vec<String>, ConfigError> {
        let roots: Vec<String> = roots.iter().map(|r| r.to_string()).collect();
        resolve_with(&roots, |g| {
            graph
                .get(g)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownGroup(g.to_string()))
        })
        .map(RunOrder::into_inner)
    }

    fn assert_prerequisites_first(graph: &HashMap<String, Vec<String>>, order: &[String]) {
        for (i, group) in order.iter().enumerate() {
            let mut pending = graph[group].clone();
            while let Some(p) = pending.pop() {
                let pos = order.iter().position(|g| *g == p).expect("prerequisite missing");
                assert!(pos < i, "{p} must run before {group}");
                pending.extend(graph[&p].iter().cloned());
            }
        }
    }

    #[test]
    fn target_runs_after_prerequisites_left_to_right() {
        let g = graph(&[("q1", &[]), ("q2", &[]), ("q3", &["q1", "q2"])]);
        assert_eq!(resolve(&g, &["q3"]).unwrap(), vec!["q1", "q2", "q3"]);
    }

    #[test]
    fn diamond_dependencies_are_deduplicated() {
        let g = graph(&[
            ("base", &[]),
            ("left", &["base"]),
            ("right", &["base"]),
            ("top", &["left", "right"]),
        ]);
        let order = resolve(&g, &["top"]).unwrap();
        assert_eq!(order, vec!["base", "left", "right", "top"]);
        assert_prerequisites_first(&g, &order);
    }

    #[test]
    fn every_group_follows_its_transitive_prerequisites() {
        let g = graph(&[
            ("a", &[]),
            ("b", &["a"]),
            ("c", &["b"]),
            ("d", &["c", "a"]),
            ("e", &["d", "b"]),
            ("f", &[]),
        ]);
        let order = resolve(&g, &["f", "e", "c", "a"]).unwrap();
        assert_eq!(order.len(), 6);
        assert_prerequisites_first(&g, &order);
    }

    #[test]
    fn cycles_are_fatal() {
        let g = graph(&[("q1", &["q2"]), ("q2", &["q3"]), ("q3", &["q1"])]);
        match resolve(&g, &["q1"]).unwrap_err() {
            ConfigError::DependencyCycle(path) => {
                assert_eq!(path, vec!["q1", "q2", "q3", "q1"])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_prerequisite_is_fatal() {
        let g = graph(&[("q2", &["q1"])]);
        assert!(matches!(
            resolve(&g, &["q2"]),
            Err(ConfigError::UnknownGroup(g)) if g == "q1"
        ));
    }

    fn write_group(root: &std::path::Path, group: &str, config: &str) {
        std::fs::create_dir_all(root.join(group)).unwrap();
        std::fs::write(root.join(group).join("CONFIG"), config).unwrap();
    }

    #[test]
    fn without_target_uses_sorted_directories() {
        let dir = tempfile::tempdir().unwrap();
        write_group(dir.path(), "q2", "class: Question\n");
        write_group(dir.path(), "q1", "class: Question\n");
        write_group(dir.path(), "q10", "class: Question\n");

        let root = TestRoot::new(dir.path()).unwrap();
        let order = resolve_order(&root, None).unwrap();
        assert_eq!(order.groups(), ["q1", "q10", "q2"]);
    }

    #[test]
    fn declared_order_is_expanded_with_prerequisites() {
        let dir = tempfile::tempdir().unwrap();
        write_group(dir.path(), "q1", "class: Question\n");
        write_group(dir.path(), "q2", "class: Question\ndepends: q1\n");
        write_group(dir.path(), "q3", "class: Question\n");
        std::fs::write(dir.path().join("CONFIG"), "order: \"q3 q2\"\n").unwrap();

        let root = TestRoot::new(dir.path()).unwrap();
        let order = resolve_order(&root, None).unwrap();
        assert_eq!(order.groups(), ["q3", "q1", "q2"]);
    }

    #[test]
    fn target_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        write_group(dir.path(), "q1", "class: Question\n");
        let root = TestRoot::new(dir.path()).unwrap();
        assert!(matches!(
            resolve_order(&root, Some("q7")),
            Err(ConfigError::UnknownGroup(_))
        ));
        assert_eq!(resolve_order(&root, Some("q1")).unwrap().groups(), ["q1"]);
    }
}
