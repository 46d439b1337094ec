//! Circular dependency detection (iterative Tarjan SCC)

use crate::graph::DependencyGraph;
use crate::model::CircularGroup;

/// Find every strongly connected component with at least two files.
///
/// Files inside a group are sorted and groups are ordered by their smallest
/// path, so the result only depends on the graph's contents.
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<CircularGroup> {
    let adjacency: Vec<Vec<usize>> = (0..graph.len()).map(|i| graph.successors(i)).collect();

    let mut groups: Vec<CircularGroup> = strongly_connected(&adjacency)
        .into_iter()
        .filter(|component| component.len() >= 2)
        .map(|component| {
            CircularGroup::new(
                component
                    .into_iter()
                    .map(|idx| graph.path_at(idx).to_string())
                    .collect(),
            )
        })
        .collect();
    groups.sort_by(|a, b| a.first().cmp(&b.first()));

    if !groups.is_empty() {
        tracing::debug!(
            "Detected {} circular groups covering {} files",
            groups.len(),
            groups.iter().map(CircularGroup::len).sum::<usize>()
        );
    }
    groups
}

const UNVISITED: usize = usize::MAX;

/// Tarjan's algorithm with an explicit call stack.
///
/// Each frame holds a node and the position of the next neighbour to visit.
/// Returns every component, singletons included.
pub(crate) fn strongly_connected(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let n = adjacency.len();
    let mut index = vec![UNVISITED; n];
    let mut lowlink = vec![0usize; n];
    let mut on_stack = vec![false; n];
    let mut stack: Vec<usize> = Vec::new();
    let mut components = Vec::new();
    let mut counter = 0usize;

    for root in 0..n {
        if index[root] != UNVISITED {
            continue;
        }

        let mut frames: Vec<(usize, usize)> = vec![(root, 0)];
        index[root] = counter;
        lowlink[root] = counter;
        counter += 1;
        stack.push(root);
        on_stack[root] = true;

        while let Some(frame) = frames.last_mut() {
            let (node, pos) = *frame;

            if let Some(&next) = adjacency[node].get(pos) {
                frame.1 += 1;
                assert!(
                    next < n,
                    "adjacency of node {node} points at {next}, outside a graph of {n} nodes"
                );
                if index[next] == UNVISITED {
                    index[next] = counter;
                    lowlink[next] = counter;
                    counter += 1;
                    stack.push(next);
                    on_stack[next] = true;
                    frames.push((next, 0));
                } else if on_stack[next] {
                    lowlink[node] = lowlink[node].min(index[next]);
                }
                continue;
            }

            frames.pop();
            if let Some(&(parent, _)) = frames.last() {
                lowlink[parent] = lowlink[parent].min(lowlink[node]);
            }

            if lowlink[node] == index[node] {
                let mut component = Vec::new();
                while let Some(member) = stack.pop() {
                    on_stack[member] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                components.push(component);
            }
        }
    }

    components
}
