//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use cohort_core::{
    BatchPlanner, DependencyGraph, GraphBuilder, ImportResolver, SubdivisionCandidate, Subdivider,
    detect_cycles, partition,
};
use cohort_indexer::{SourceExtractor, scan_inventory, scan_manifests};
use serde::Serialize;

use crate::settings::Settings;

pub struct Context {
    pub root: PathBuf,
    pub parallel: bool,
}

pub fn batch(ctx: &Context, settings: &Settings) -> anyhow::Result<()> {
    let graph = build_graph(ctx, settings)?;
    let plan = BatchPlanner::new(&graph, settings.engine.batch.clone()).plan();

    tracing::info!(
        "{} files ({} total size) in {} batches",
        plan.stats.file_count,
        plan.stats.total_size,
        plan.stats.final_batches
    );
    emit(&plan)
}

pub fn clusters(ctx: &Context, settings: &Settings) -> anyhow::Result<()> {
    let graph = build_graph(ctx, settings)?;
    emit(&partition(&graph))
}

pub fn cycles(ctx: &Context, settings: &Settings) -> anyhow::Result<()> {
    let graph = build_graph(ctx, settings)?;
    let groups = detect_cycles(&graph);
    if groups.is_empty() {
        tracing::info!("No circular dependencies");
    }
    emit(&groups)
}

pub fn order(ctx: &Context, settings: &Settings, files: Vec<String>) -> anyhow::Result<()> {
    let graph = build_graph(ctx, settings)?;
    let files: Vec<String> = if files.is_empty() {
        graph.files().map(|f| f.path.clone()).collect()
    } else {
        files
            .into_iter()
            .map(|f| f.trim_start_matches("./").replace('\\', "/"))
            .collect()
    };

    for file in files.iter().filter(|f| !graph.contains(f)) {
        tracing::warn!("{} is not in the inventory; it has no known dependencies", file);
    }
    emit(&cohort_core::order(&files, &graph))
}

pub fn subdivide(
    ctx: &Context,
    settings: &Settings,
    candidates_path: &Path,
    scope: &str,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(candidates_path)
        .with_context(|| format!("Failed to read candidates {}", candidates_path.display()))?;
    let candidates: Vec<SubdivisionCandidate> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid candidates JSON in {}", candidates_path.display()))?;
    if candidates.is_empty() {
        anyhow::bail!("{} declares no candidates", candidates_path.display());
    }

    let graph = build_graph(ctx, settings)?;
    let module_files: Vec<String> = graph
        .files()
        .filter(|f| f.path.starts_with(scope))
        .map(|f| f.path.clone())
        .collect();
    if module_files.is_empty() {
        tracing::warn!("No files under scope {:?}", scope);
    }

    let cycles: Vec<_> = detect_cycles(&graph)
        .into_iter()
        .filter(|group| group.files.iter().any(|f| f.starts_with(scope)))
        .collect();

    let plan = Subdivider::new(&graph, settings.engine.subdivision.clone()).subdivide(
        candidates,
        &cycles,
        &module_files,
        scope,
    );
    emit(&plan)
}

/// Scan the repository and build its dependency graph.
fn build_graph(ctx: &Context, settings: &Settings) -> anyhow::Result<DependencyGraph> {
    let files = scan_inventory(&ctx.root, &settings.inventory)?;
    let packages = scan_manifests(&ctx.root)?;
    let resolver =
        ImportResolver::new(settings.engine.resolver.clone()).with_packages(packages);
    let extractor = SourceExtractor::new(&ctx.root);
    let builder = GraphBuilder::new(&resolver);

    let graph = if ctx.parallel {
        builder.build_parallel(files, &extractor)?
    } else {
        builder.build(files, &extractor)?
    };

    tracing::info!(
        "Dependency graph: {} files, {} edges, {} warnings",
        graph.len(),
        graph.edge_count(),
        graph.warnings().len()
    );
    Ok(graph)
}

fn emit<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
