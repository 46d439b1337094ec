//! Weakly connected clusters of the file graph

use std::collections::VecDeque;

use crate::graph::DependencyGraph;
use crate::model::Cluster;

/// Split every file of `graph` into disjoint clusters, largest first.
///
/// Traversal ignores edge direction. Files inside a cluster keep graph
/// insertion order and clusters of equal size keep discovery order.
pub fn partition(graph: &DependencyGraph) -> Vec<Cluster> {
    let n = graph.len();
    let mut visited = vec![false; n];
    let mut clusters = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        let mut members = vec![start];
        let mut queue = VecDeque::from([start]);

        while let Some(idx) = queue.pop_front() {
            let neighbours = graph
                .successors(idx)
                .into_iter()
                .chain(graph.predecessors(idx));
            for next in neighbours {
                if !visited[next] {
                    visited[next] = true;
                    members.push(next);
                    queue.push_back(next);
                }
            }
        }

        members.sort_unstable();
        clusters.push(Cluster::new(
            members
                .into_iter()
                .map(|idx| graph.path_at(idx).to_string())
                .collect(),
        ));
    }

    clusters.sort_by(|a, b| b.len().cmp(&a.len()));
    tracing::debug!("Partitioned {} files into {} clusters", n, clusters.len());
    clusters
}
