//! Cohesion-aware batching: pack clusters into size-bounded batches

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::BatchConfig;
use crate::graph::DependencyGraph;
use crate::model::{Batch, Cluster};
use crate::partition::partition;

/// Label of a batch whose files share no directory.
pub const MIXED_LABEL: &str = "mixed";

/// Pack one cluster under `budget` with the default merge threshold.
pub fn pack(cluster: &Cluster, graph: &DependencyGraph, budget: u64) -> Vec<Batch> {
    BatchPacker::new(graph, BatchConfig::default().with_budget(budget)).pack(cluster)
}

/// Packs the files of a cluster into batches.
pub struct BatchPacker<'g> {
    graph: &'g DependencyGraph,
    config: BatchConfig,
}

impl<'g> BatchPacker<'g> {
    pub fn new(graph: &'g DependencyGraph, config: BatchConfig) -> Self {
        BatchPacker { graph, config }
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Order by in-cluster dependents, pack greedily, then merge small batches.
    pub fn pack(&self, cluster: &Cluster) -> Vec<Batch> {
        let packed = self.pack_greedy(cluster);
        self.merge_small(packed)
    }

    /// Steps 1 and 2: dependency ordering and greedy packing, no merging.
    pub fn pack_greedy(&self, cluster: &Cluster) -> Vec<Batch> {
        if cluster.is_empty() {
            return Vec::new();
        }
        let budget = self.config.budget;
        let ordered = self.order_by_dependents(cluster);

        let mut batches = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_total = 0u64;

        for path in ordered {
            let size = self.size_of(path);

            if size > budget {
                tracing::warn!(
                    "{} ({} tokens) exceeds the batch budget of {}; emitting it alone",
                    path,
                    size,
                    budget
                );
                if !current.is_empty() {
                    batches.push(self.make_batch(std::mem::take(&mut current)));
                    current_total = 0;
                }
                batches.push(self.make_batch(vec![path.to_string()]));
                continue;
            }

            if current_total + size > budget && !current.is_empty() {
                batches.push(self.make_batch(std::mem::take(&mut current)));
                current_total = 0;
            }
            current.push(path.to_string());
            current_total += size;
        }

        if !current.is_empty() {
            batches.push(self.make_batch(current));
        }
        batches
    }

    /// Concatenate batches under the small-batch limit, in arrival order,
    /// while the merged total stays within budget.
    ///
    /// Large batches stay where they are. A merged batch takes the position
    /// of its first member. Nothing happens unless at least two batches are
    /// small.
    pub fn merge_small(&self, batches: Vec<Batch>) -> Vec<Batch> {
        let limit = self.config.small_batch_limit();
        let is_small = |b: &Batch| (b.total_size as f64) < limit;

        let small_count = batches.iter().filter(|b| is_small(*b)).count();
        if small_count < 2 {
            return batches;
        }

        let mut merged: Vec<Batch> = Vec::with_capacity(batches.len());
        let mut touched: Vec<bool> = Vec::with_capacity(batches.len());
        let mut open: Option<usize> = None;

        for batch in batches {
            if !is_small(&batch) {
                merged.push(batch);
                touched.push(false);
                continue;
            }
            match open {
                Some(at) if merged[at].total_size + batch.total_size <= self.config.budget => {
                    merged[at].total_size += batch.total_size;
                    merged[at].files.extend(batch.files);
                    touched[at] = true;
                }
                _ => {
                    merged.push(batch);
                    touched.push(false);
                    open = Some(merged.len() - 1);
                }
            }
        }

        for (batch, touched) in merged.iter_mut().zip(touched) {
            if touched {
                batch.cohesion = cohesion(&batch.files, self.graph);
                batch.label = common_label(&batch.files);
            }
        }

        tracing::debug!(
            "Merged {} small batches, {} batches remain",
            small_count,
            merged.len()
        );
        merged
    }

    pub fn make_batch(&self, files: Vec<String>) -> Batch {
        let total_size = files.iter().map(|p| self.size_of(p)).sum();
        Batch {
            cohesion: cohesion(&files, self.graph),
            label: common_label(&files),
            total_size,
            files,
        }
    }

    /// Most depended-upon files first; ties keep cluster order.
    fn order_by_dependents<'c>(&self, cluster: &'c Cluster) -> Vec<&'c str> {
        let members: HashSet<&str> = cluster.files.iter().map(String::as_str).collect();
        let mut scored: Vec<(&str, usize)> = cluster
            .files
            .iter()
            .map(|path| {
                let dependents = self
                    .graph
                    .dependents(path)
                    .into_iter()
                    .filter(|d| *d != path.as_str() && members.contains(d))
                    .count();
                (path.as_str(), dependents)
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.into_iter().map(|(path, _)| path).collect()
    }

    fn size_of(&self, path: &str) -> u64 {
        self.graph.node(path).map_or(0, |n| n.estimated_size)
    }
}

/// Directed internal edges over `n * (n - 1)`, rounded to two decimals.
///
/// Each edge counts once and self-edges are ignored.
pub fn cohesion(files: &[String], graph: &DependencyGraph) -> f64 {
    let n = files.len();
    if n < 2 {
        return 0.0;
    }
    let members: HashSet<&str> = files.iter().map(String::as_str).collect();
    let internal = files
        .iter()
        .flat_map(|from| {
            graph
                .dependencies(from)
                .into_iter()
                .filter(move |to| *to != from.as_str())
        })
        .filter(|to| members.contains(to))
        .count();
    let ratio = internal as f64 / (n * (n - 1)) as f64;
    (ratio * 100.0).round() / 100.0
}

/// Longest directory shared by every file, or [`MIXED_LABEL`].
pub fn common_label(files: &[String]) -> String {
    let mut dirs = files.iter().map(|path| {
        let mut segments: Vec<&str> = path.split('/').collect();
        segments.pop();
        segments
    });
    let Some(mut common) = dirs.next() else {
        return MIXED_LABEL.to_string();
    };
    for dir in dirs {
        let shared = common
            .iter()
            .zip(&dir)
            .take_while(|(a, b)| a == b)
            .count();
        common.truncate(shared);
    }
    if common.is_empty() {
        MIXED_LABEL.to_string()
    } else {
        common.join("/")
    }
}

// ── Whole-repository planning ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStats {
    pub file_count: usize,
    pub cluster_count: usize,
    pub total_size: u64,
    /// Batches produced cluster by cluster.
    pub packed_batches: usize,
    /// Batches left after merging small batches across clusters.
    pub final_batches: usize,
    pub oversized_files: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPlan {
    pub batches: Vec<Batch>,
    pub stats: PlanStats,
}

/// Partitions a graph and batches every cluster.
pub struct BatchPlanner<'g> {
    packer: BatchPacker<'g>,
    graph: &'g DependencyGraph,
}

impl<'g> BatchPlanner<'g> {
    pub fn new(graph: &'g DependencyGraph, config: BatchConfig) -> Self {
        BatchPlanner {
            packer: BatchPacker::new(graph, config),
            graph,
        }
    }

    pub fn plan(&self) -> BatchPlan {
        let clusters = partition(self.graph);

        let mut packed = Vec::new();
        for cluster in &clusters {
            packed.extend(self.packer.pack(cluster));
        }
        let packed_batches = packed.len();
        let batches = self.packer.merge_small(packed);

        let budget = self.packer.config().budget;
        let stats = PlanStats {
            file_count: self.graph.len(),
            cluster_count: clusters.len(),
            total_size: batches.iter().map(|b| b.total_size).sum(),
            packed_batches,
            final_batches: batches.len(),
            oversized_files: batches
                .iter()
                .filter(|b| b.len() == 1 && b.total_size > budget)
                .count(),
        };

        tracing::info!(
            "Batch plan: {} clusters -> {} packed batches -> {} batches",
            stats.cluster_count,
            stats.packed_batches,
            stats.final_batches
        );
        BatchPlan { batches, stats }
    }
}
