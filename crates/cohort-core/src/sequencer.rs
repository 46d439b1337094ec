//! Dependency ordering of a file subset (Kahn's algorithm)

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::graph::DependencyGraph;

/// Order `files` so each file comes after the in-set files it imports.
///
/// Only edges with both endpoints in `files` count, and self-edges are
/// ignored. Among ready files the lexicographically smallest goes first.
/// When every file waits on another the whole set is returned sorted; files
/// stuck in a cycle after an acyclic prefix are appended sorted.
pub fn order(files: &[String], graph: &DependencyGraph) -> Vec<String> {
    let mut seen = HashSet::new();
    let unique: Vec<&str> = files
        .iter()
        .map(String::as_str)
        .filter(|path| seen.insert(*path))
        .collect();

    let mut pending: HashMap<&str, usize> = HashMap::with_capacity(unique.len());
    let mut importers: HashMap<&str, Vec<&str>> = HashMap::new();
    for &path in &unique {
        let deps: Vec<&str> = graph
            .dependencies(path)
            .into_iter()
            .filter(|dep| *dep != path && seen.contains(dep))
            .collect();
        pending.insert(path, deps.len());
        for dep in deps {
            importers.entry(dep).or_default().push(path);
        }
    }

    let mut ready: BTreeSet<&str> = unique
        .iter()
        .copied()
        .filter(|path| pending[path] == 0)
        .collect();

    if ready.is_empty() {
        if !unique.is_empty() {
            tracing::debug!(
                "No dependency order for {} files (all cyclic); using lexicographic order",
                unique.len()
            );
        }
        let mut sorted: Vec<String> = unique.into_iter().map(String::from).collect();
        sorted.sort();
        return sorted;
    }

    let mut ordered: Vec<String> = Vec::with_capacity(unique.len());
    let mut done: HashSet<&str> = HashSet::with_capacity(unique.len());
    while let Some(path) = ready.pop_first() {
        ordered.push(path.to_string());
        done.insert(path);
        for &importer in importers.get(path).map_or(&[][..], Vec::as_slice) {
            if let Some(count) = pending.get_mut(importer) {
                *count -= 1;
                if *count == 0 {
                    ready.insert(importer);
                }
            }
        }
    }

    let mut remainder: Vec<&str> = unique
        .into_iter()
        .filter(|path| !done.contains(path))
        .collect();
    if !remainder.is_empty() {
        tracing::debug!(
            "{} files left in cycles, appended in lexicographic order",
            remainder.len()
        );
        remainder.sort_unstable();
        ordered.extend(remainder.into_iter().map(String::from));
    }
    ordered
}
