//! Unit tests for cohort-core

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;

use crate::batching::{BatchPacker, BatchPlanner, pack};
use crate::config::{BatchConfig, SubdivisionConfig};
use crate::cycles::detect_cycles;
use crate::graph::DependencyGraph;
use crate::model::{Cluster, FileNode, Ownership, SubdivisionCandidate};
use crate::partition::partition;
use crate::sequencer::order;
use crate::subdivision::{Subdivider, subdivide};
use crate::test_utils::*;

// ── Partitioning ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn test_partition_is_complete_and_disjoint(graph in graph_strategy(120, 150)) {
        let clusters = partition(&graph);

        let mut seen = HashSet::new();
        for cluster in &clusters {
            for path in &cluster.files {
                prop_assert!(seen.insert(path.clone()), "{} appears twice", path);
            }
        }
        let all: HashSet<String> = graph.files().map(|f| f.path.clone()).collect();
        prop_assert_eq!(seen, all);

        for pair in clusters.windows(2) {
            prop_assert!(pair[0].len() >= pair[1].len());
        }
    }
}

#[test]
fn test_isolated_files_are_singleton_clusters() {
    let graph = uniform_graph(&["a.js", "b.js", "c.js"], 1, &[("a.js", "b.js")]);
    let clusters = partition(&graph);
    assert_eq!(clusters.len(), 2);
    assert_eq!(clusters[1].files, strings(&["c.js"]));
}

// ── Cycles ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn test_cycle_groups_are_mutually_reachable(graph in graph_strategy(80, 160)) {
        let groups = detect_cycles(&graph);

        let mut seen = HashSet::new();
        for group in &groups {
            prop_assert!(group.len() >= 2);
            let mut sorted = group.files.clone();
            sorted.sort();
            prop_assert_eq!(&sorted, &group.files);
            for path in &group.files {
                prop_assert!(seen.insert(path.clone()));
                // every member imports at least one other member
                prop_assert!(
                    graph
                        .dependencies(path)
                        .iter()
                        .any(|dep| *dep != path.as_str() && group.contains(dep))
                );
            }
        }
        for pair in groups.windows(2) {
            prop_assert!(pair[0].first() < pair[1].first());
        }
    }

    #[test]
    fn test_cycle_detection_is_deterministic(graph in graph_strategy(200, 400)) {
        prop_assert_eq!(detect_cycles(&graph), detect_cycles(&graph));
    }
}

// ── Batching ────────────────────────────────────────────────────────

#[test]
fn test_two_file_pack() {
    let graph = uniform_graph(&["a.js", "b.js"], 10, &[("a.js", "b.js")]);
    let batches = pack(&whole_cluster(&graph), &graph, 1000);

    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].total_size, 20);
    assert_eq!(batches[0].cohesion, 0.5);
    insta::assert_snapshot!(
        serde_json::to_string(&batches[0]).unwrap(),
        @r#"{"files":["b.js","a.js"],"totalSize":20,"cohesion":0.5,"label":"mixed"}"#
    );
}

#[test]
fn test_batches_above_merge_limit_stay_apart() {
    let graph = uniform_graph(&["a.js", "b.js"], 10, &[]);
    let batches = pack(&whole_cluster(&graph), &graph, 15);

    assert_eq!(batches.len(), 2);
    for batch in &batches {
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.total_size, 10);
        assert_eq!(batch.cohesion, 0.0);
    }
}

#[test]
fn test_empty_cluster_has_no_batches() {
    let graph = uniform_graph(&["a.js"], 10, &[]);
    assert!(pack(&Cluster::new(Vec::new()), &graph, 100).is_empty());
}

#[test]
fn test_single_file_cluster_is_one_batch() {
    let graph = uniform_graph(&["src/a.js"], 10, &[]);
    let batches = pack(&whole_cluster(&graph), &graph, 100);
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].files, strings(&["src/a.js"]));
    assert_eq!(batches[0].label, "src");
}

#[test]
fn test_oversized_file_is_emitted_alone() {
    let graph = graph_of(&[("s1.py", 30), ("huge.py", 500), ("s2.py", 30)], &[]);
    let batches = pack(&whole_cluster(&graph), &graph, 100);

    let files: Vec<Vec<String>> = batches.iter().map(|b| b.files.clone()).collect();
    assert_eq!(
        files,
        vec![strings(&["s1.py"]), strings(&["huge.py"]), strings(&["s2.py"])]
    );
    assert_eq!(batches[1].total_size, 500);
}

#[test]
fn test_most_depended_on_files_come_first() {
    let graph = uniform_graph(
        &["app.ts", "page.ts", "api.ts", "util.ts"],
        10,
        &[
            ("app.ts", "util.ts"),
            ("page.ts", "util.ts"),
            ("api.ts", "util.ts"),
            ("app.ts", "api.ts"),
            ("page.ts", "api.ts"),
        ],
    );
    let batches = pack(&whole_cluster(&graph), &graph, 1000);
    assert_eq!(
        batches[0].files,
        strings(&["util.ts", "api.ts", "app.ts", "page.ts"])
    );
}

#[test]
fn test_merge_keeps_large_batches_in_place() {
    let graph = graph_of(
        &[("a.ts", 10), ("b.ts", 10), ("big.ts", 80), ("c.ts", 10), ("d.ts", 25)],
        &[("c.ts", "a.ts")],
    );
    let packer = BatchPacker::new(&graph, BatchConfig::default().with_budget(100));
    let batches = ["a.ts", "b.ts", "big.ts", "c.ts", "d.ts"]
        .iter()
        .map(|p| packer.make_batch(vec![p.to_string()]))
        .collect();

    let merged = packer.merge_small(batches);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].files, strings(&["a.ts", "b.ts", "c.ts", "d.ts"]));
    assert_eq!(merged[0].total_size, 55);
    assert_eq!(merged[0].cohesion, 0.08);
    assert_eq!(merged[1].files, strings(&["big.ts"]));
}

#[test]
fn test_merge_starts_a_new_group_when_full() {
    let graph = graph_of(
        &[("a", 20), ("b", 20), ("c", 25), ("d", 25), ("e", 20)],
        &[],
    );
    let packer = BatchPacker::new(&graph, BatchConfig::default().with_budget(100));
    let batches = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|p| packer.make_batch(vec![p.to_string()]))
        .collect();

    let merged = packer.merge_small(batches);
    let totals: Vec<u64> = merged.iter().map(|b| b.total_size).collect();
    assert_eq!(totals, vec![90, 20]);
}

#[test]
fn test_lone_small_batch_is_not_merged() {
    let graph = graph_of(&[("a", 10), ("big", 80)], &[]);
    let packer = BatchPacker::new(&graph, BatchConfig::default().with_budget(100));
    let batches = vec![
        packer.make_batch(strings(&["a"])),
        packer.make_batch(strings(&["big"])),
    ];
    let merged = packer.merge_small(batches.clone());
    assert_eq!(merged, batches);
}

proptest! {
    #[test]
    fn test_budget_and_coverage_hold(
        graph in graph_strategy(150, 300),
        budget in 2500u64..=9000,
    ) {
        for cluster in partition(&graph) {
            let batches = pack(&cluster, &graph, budget);

            let mut covered = Vec::new();
            for batch in &batches {
                if batch.len() > 1 {
                    prop_assert!(batch.total_size <= budget);
                }
                prop_assert!((0.0..=1.0).contains(&batch.cohesion));
                covered.extend(batch.files.iter().cloned());
            }
            let unique: HashSet<&String> = covered.iter().collect();
            prop_assert_eq!(unique.len(), covered.len(), "duplicate file across batches");

            let mut expected = cluster.files.clone();
            expected.sort();
            covered.sort();
            prop_assert_eq!(covered, expected);
        }
    }
}

#[test]
fn test_plan_merges_small_clusters() {
    let graph = uniform_graph(&["lib/a.ts", "lib/b.ts", "lib/c.ts"], 10, &[]);
    let plan = BatchPlanner::new(&graph, BatchConfig::default().with_budget(100)).plan();

    assert_eq!(plan.stats.cluster_count, 3);
    assert_eq!(plan.stats.packed_batches, 3);
    assert_eq!(plan.stats.final_batches, 1);
    assert_eq!(plan.stats.total_size, 30);
    assert_eq!(plan.batches[0].label, "lib");
    assert_eq!(plan.batches[0].files.len(), 3);
}

proptest! {
    #[test]
    fn test_plan_is_deterministic(graph in graph_strategy(300, 600)) {
        let config = BatchConfig::default().with_budget(4000);
        let first = BatchPlanner::new(&graph, config.clone()).plan();
        let second = BatchPlanner::new(&graph, config).plan();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

// ── Sequencing ──────────────────────────────────────────────────────

#[test]
fn test_order_respects_every_edge_of_a_dag() {
    let paths: Vec<String> = (0..60).map(|i| format!("m/f{i:02}.ts")).collect();
    let files: Vec<FileNode> = paths.iter().map(|p| FileNode::new(p.clone(), 1)).collect();
    let mut edges = Vec::new();
    for i in 0..paths.len() {
        for j in [i / 2, i / 3, (i * 7) % (i + 1)] {
            if j < i {
                edges.push((paths[i].clone(), paths[j].clone()));
            }
        }
    }
    let graph = DependencyGraph::from_edges(files, &edges).unwrap();

    let mut input = paths.clone();
    input.reverse();
    let ordered = order(&input, &graph);
    assert_eq!(ordered.len(), paths.len());

    let position = |p: &str| ordered.iter().position(|o| o == p).unwrap();
    for (importer, imported) in &edges {
        assert!(position(imported) < position(importer));
    }
}

// ── Subdivision ─────────────────────────────────────────────────────

fn ring_module() -> DependencyGraph {
    uniform_graph(
        &["mod/x/p1.js", "mod/y/p2.js", "mod/shared/p3.js", "mod/y/p4.js"],
        10,
        &[
            ("mod/x/p1.js", "mod/y/p2.js"),
            ("mod/y/p2.js", "mod/shared/p3.js"),
            ("mod/shared/p3.js", "mod/x/p1.js"),
            ("mod/y/p4.js", "mod/y/p2.js"),
        ],
    )
}

#[test]
fn test_entry_file_wins_contested_cycle() {
    let graph = ring_module();
    let cycles = detect_cycles(&graph);
    assert_eq!(cycles.len(), 1);

    let module_files: Vec<String> = graph.files().map(|f| f.path.clone()).collect();
    let plan = Subdivider::new(&graph, SubdivisionConfig::default()).subdivide(
        vec![
            SubdivisionCandidate::new("Alpha").with_entry_files(["mod/x/p1.js"]),
            SubdivisionCandidate::new("Beta").with_entry_files(["mod/y/p4.js"]),
        ],
        &cycles,
        &module_files,
        "mod/",
    );

    let alpha = &plan.candidates[0];
    let beta = &plan.candidates[1];
    assert_eq!(
        alpha.assigned_files,
        strings(&["mod/shared/p3.js", "mod/x/p1.js", "mod/y/p2.js"])
    );
    assert_eq!(beta.assigned_files, strings(&["mod/y/p4.js"]));
    assert_eq!(
        beta.shared_dependencies,
        strings(&["mod/shared/p3.js", "mod/x/p1.js", "mod/y/p2.js"])
    );
    assert!(plan.parent_files.is_empty());

    match &plan.resolutions[0].ownership {
        Ownership::Awarded {
            owner,
            scores,
            displaced,
        } => {
            assert_eq!(owner, "Alpha");
            assert_eq!(displaced, &strings(&["Beta"]));
            assert!((scores[0].score - 11.0 / 3.0).abs() < 1e-9);
            assert!((scores[1].score - 8.0 / 3.0).abs() < 1e-9);
        }
        other => panic!("expected an awarded group, got {other:?}"),
    }
}

#[test]
fn test_equal_scores_go_to_first_declared() {
    let graph = uniform_graph(
        &["mod/p1.js", "mod/p2.js", "mod/p4.js", "mod/p5.js"],
        10,
        &[
            ("mod/p1.js", "mod/p2.js"),
            ("mod/p2.js", "mod/p1.js"),
            ("mod/p4.js", "mod/p1.js"),
            ("mod/p5.js", "mod/p1.js"),
        ],
    );
    let cycles = detect_cycles(&graph);
    let result = subdivide(
        vec![
            SubdivisionCandidate::new("Beta").with_entry_files(["mod/p5.js"]),
            SubdivisionCandidate::new("Alpha").with_entry_files(["mod/p4.js"]),
        ],
        &cycles,
        &graph,
    );

    assert_eq!(
        result[0].assigned_files,
        strings(&["mod/p1.js", "mod/p2.js", "mod/p5.js"])
    );
    assert_eq!(result[1].assigned_files, strings(&["mod/p4.js"]));
    assert_eq!(
        result[1].shared_dependencies,
        strings(&["mod/p1.js", "mod/p2.js"])
    );
}

#[test]
fn test_partial_single_claim_is_left_alone() {
    let graph = ring_module();
    let cycles = detect_cycles(&graph);
    let module_files: Vec<String> = graph.files().map(|f| f.path.clone()).collect();
    let config = SubdivisionConfig {
        max_depth: 1,
        ..SubdivisionConfig::default()
    };

    let plan = Subdivider::new(&graph, config).subdivide(
        vec![SubdivisionCandidate::new("Beta").with_entry_files(["mod/y/p4.js"])],
        &cycles,
        &module_files,
        "mod/",
    );

    assert_eq!(
        plan.candidates[0].assigned_files,
        strings(&["mod/y/p2.js", "mod/y/p4.js"])
    );
    assert_eq!(
        plan.parent_files,
        strings(&["mod/x/p1.js", "mod/shared/p3.js"])
    );
    insta::assert_snapshot!(
        serde_json::to_string(&plan.resolutions[0].ownership).unwrap(),
        @r#"{"kind":"uncontested","owner":"Beta"}"#
    );
}

#[test]
fn test_unclaimed_cycle_stays_with_parent() {
    let graph = ring_module();
    let cycles = detect_cycles(&graph);
    let module_files: Vec<String> = graph.files().map(|f| f.path.clone()).collect();
    let plan = Subdivider::new(&graph, SubdivisionConfig::default()).subdivide(
        vec![SubdivisionCandidate::new("Empty")],
        &cycles,
        &module_files,
        "mod/",
    );
    assert_eq!(plan.resolutions[0].ownership, Ownership::Unclaimed);
    assert_eq!(plan.parent_files, module_files);
}

#[test]
fn test_traversal_stays_inside_scope() {
    let graph = uniform_graph(
        &["mod/a.js", "mod/b.js", "lib/c.js"],
        10,
        &[("mod/a.js", "lib/c.js"), ("mod/a.js", "mod/b.js")],
    );
    let module_files = strings(&["mod/a.js", "mod/b.js"]);
    let plan = Subdivider::new(&graph, SubdivisionConfig::default()).subdivide(
        vec![SubdivisionCandidate::new("A").with_key_files(["mod/a.js", "mod/missing.js"])],
        &[],
        &module_files,
        "mod/",
    );
    assert_eq!(
        plan.candidates[0].assigned_files,
        strings(&["mod/b.js", "mod/a.js"])
    );
}

#[test]
fn test_awarded_cycle_keeps_outside_members_shared() {
    let graph = uniform_graph(
        &["mod/a.js", "other/b.js", "mod/c.js"],
        10,
        &[
            ("mod/a.js", "other/b.js"),
            ("other/b.js", "mod/a.js"),
            ("mod/c.js", "mod/a.js"),
        ],
    );
    let cycles = detect_cycles(&graph);
    assert_eq!(cycles[0].files, strings(&["mod/a.js", "other/b.js"]));

    let module_files = strings(&["mod/a.js", "mod/c.js"]);
    let plan = Subdivider::new(&graph, SubdivisionConfig::default()).subdivide(
        vec![
            SubdivisionCandidate::new("Alpha").with_entry_files(["mod/a.js"]),
            SubdivisionCandidate::new("Beta").with_entry_files(["mod/c.js"]),
        ],
        &cycles,
        &module_files,
        "mod/",
    );

    assert_eq!(plan.resolutions[0].ownership.owner(), Some("Alpha"));
    let alpha = &plan.candidates[0];
    let beta = &plan.candidates[1];
    assert_eq!(alpha.assigned_files, strings(&["mod/a.js"]));
    assert_eq!(alpha.shared_dependencies, strings(&["other/b.js"]));
    assert_eq!(beta.assigned_files, strings(&["mod/c.js"]));
    assert_eq!(beta.shared_dependencies, strings(&["mod/a.js"]));
    for candidate in &plan.candidates {
        assert!(candidate.assigned_files.iter().all(|f| f.starts_with("mod/")));
    }
    assert!(plan.parent_files.is_empty());
}

#[test]
fn test_non_cyclic_overlap_goes_to_first_candidate() {
    let graph = uniform_graph(
        &["m/a.js", "m/b.js", "m/util.js"],
        10,
        &[("m/a.js", "m/util.js"), ("m/b.js", "m/util.js")],
    );
    let result = subdivide(
        vec![
            SubdivisionCandidate::new("A").with_entry_files(["m/a.js"]),
            SubdivisionCandidate::new("B").with_entry_files(["m/b.js"]),
        ],
        &[],
        &graph,
    );
    assert_eq!(result[0].assigned_files, strings(&["m/util.js", "m/a.js"]));
    assert_eq!(result[1].assigned_files, strings(&["m/b.js"]));
    assert_eq!(result[1].shared_dependencies, strings(&["m/util.js"]));
}

#[test]
fn test_orphans_adopted_by_keyword() {
    let graph = uniform_graph(
        &["shop/cart/index.js", "shop/cart/theme.css", "shop/order/form.js", "shop/readme.md"],
        10,
        &[],
    );
    let module_files: Vec<String> = graph.files().map(|f| f.path.clone()).collect();
    let mut aliases = BTreeMap::new();
    aliases.insert("订单".to_string(), "order".to_string());
    let config = SubdivisionConfig {
        adopt_orphans_by_keyword: true,
        keyword_aliases: aliases,
        ..SubdivisionConfig::default()
    };

    let plan = Subdivider::new(&graph, config).subdivide(
        vec![
            SubdivisionCandidate::new("Cart").with_entry_files(["shop/cart/index.js"]),
            SubdivisionCandidate::new("订单管理"),
        ],
        &[],
        &module_files,
        "shop/",
    );

    assert_eq!(
        plan.candidates[0].assigned_files,
        strings(&["shop/cart/index.js", "shop/cart/theme.css"])
    );
    assert_eq!(
        plan.candidates[1].assigned_files,
        strings(&["shop/order/form.js"])
    );
    assert_eq!(plan.parent_files, strings(&["shop/readme.md"]));
}
