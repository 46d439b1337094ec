//! Test utilities for Cohort

use proptest::collection::vec;
use proptest::prelude::*;

use crate::graph::DependencyGraph;
use crate::model::{Cluster, FileNode};

/// Build a graph from `(path, size)` pairs and `(importer, imported)` edges.
pub fn graph_of(files: &[(&str, u64)], edges: &[(&str, &str)]) -> DependencyGraph {
    let nodes = files
        .iter()
        .map(|(path, size)| FileNode::new(*path, *size))
        .collect();
    DependencyGraph::from_edges(nodes, edges).unwrap()
}

/// Same as [`graph_of`] with every file weighing `size`.
pub fn uniform_graph(paths: &[&str], size: u64, edges: &[(&str, &str)]) -> DependencyGraph {
    let files: Vec<(&str, u64)> = paths.iter().map(|p| (*p, size)).collect();
    graph_of(&files, edges)
}

/// A cluster holding every file of `graph` in insertion order.
pub fn whole_cluster(graph: &DependencyGraph) -> Cluster {
    Cluster::new(graph.files().map(|f| f.path.clone()).collect())
}

pub fn strings(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

/// Random graphs of up to `max_files` files spread over a few directories,
/// with up to `max_edges` imports (self-imports and duplicates included).
/// Sizes vary between 1 and 4000.
pub fn graph_strategy(
    max_files: usize,
    max_edges: usize,
) -> impl Strategy<Value = DependencyGraph> {
    (1..=max_files)
        .prop_flat_map(move |n| {
            (
                vec(1u64..=4000, n),
                vec((0..n, 0..n), 0..=max_edges),
            )
        })
        .prop_map(|(sizes, picks)| {
            let paths: Vec<String> = (0..sizes.len())
                .map(|i| format!("src/dir{}/file{}.ts", i % 7, i))
                .collect();
            let files = paths
                .iter()
                .zip(&sizes)
                .map(|(path, size)| FileNode::new(path.clone(), *size))
                .collect();
            let edges: Vec<(&str, &str)> = picks
                .into_iter()
                .map(|(from, to)| (paths[from].as_str(), paths[to].as_str()))
                .collect();
            DependencyGraph::from_edges(files, &edges).unwrap()
        })
}
