//! File dependency graph over petgraph::DiGraph, plus its builder

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rayon::prelude::*;

use crate::error::{EngineError, Result};
use crate::model::{ExtractionWarning, FileNode};
use crate::resolver::ImportResolver;

/// One import statement as reported by an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub source: String,
    pub line: Option<u32>,
}

impl ImportRecord {
    pub fn new(source: impl Into<String>) -> Self {
        ImportRecord {
            source: source.into(),
            line: None,
        }
    }
}

/// What an extractor found in one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedImports {
    pub imports: Vec<ImportRecord>,
    pub exports: Vec<String>,
    pub language: Option<String>,
}

/// Import/export extraction collaborator.
///
/// An `Err` means the file could not be analysed; the builder keeps the file
/// with no outgoing edges and records a warning.
pub trait ImportExtractor {
    fn extract(&self, file: &FileNode) -> anyhow::Result<ExtractedImports>;
}

/// Extractor over imports that were collected ahead of time.
#[derive(Debug, Clone, Default)]
pub struct StaticImports {
    imports: HashMap<String, Vec<String>>,
    failures: HashMap<String, String>,
}

impl StaticImports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_imports<I, S>(mut self, path: impl Into<String>, imports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(path, imports);
        self
    }

    pub fn with_failure(mut self, path: impl Into<String>, cause: impl Into<String>) -> Self {
        self.failures.insert(path.into(), cause.into());
        self
    }

    pub fn insert<I, S>(&mut self, path: impl Into<String>, imports: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imports
            .entry(path.into())
            .or_default()
            .extend(imports.into_iter().map(Into::into));
    }
}

impl ImportExtractor for StaticImports {
    fn extract(&self, file: &FileNode) -> anyhow::Result<ExtractedImports> {
        if let Some(cause) = self.failures.get(&file.path) {
            anyhow::bail!("{}", cause);
        }
        let imports = self
            .imports
            .get(&file.path)
            .map(|raw| raw.iter().map(ImportRecord::new).collect())
            .unwrap_or_default();
        Ok(ExtractedImports {
            imports,
            exports: Vec::new(),
            language: Some(file.language.as_str().to_string()),
        })
    }
}

/// Directed import graph: an edge `a -> b` means `a` imports `b`.
///
/// Read-only once built. Node order follows the order of the files handed to
/// the builder, and every neighbour query returns paths in that order.
pub struct DependencyGraph {
    inner: DiGraph<FileNode, ()>,
    index: HashMap<String, NodeIndex>,
    external: HashMap<String, Vec<String>>,
    warnings: Vec<ExtractionWarning>,
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .field("warnings", &self.warnings.len())
            .finish()
    }
}

impl DependencyGraph {
    fn with_files(files: Vec<FileNode>) -> Result<Self> {
        let mut inner = DiGraph::with_capacity(files.len(), files.len());
        let mut index = HashMap::with_capacity(files.len());
        for file in files {
            if index.contains_key(&file.path) {
                return Err(EngineError::DuplicateFile(file.path));
            }
            let path = file.path.clone();
            let idx = inner.add_node(file);
            index.insert(path, idx);
        }
        Ok(DependencyGraph {
            inner,
            index,
            external: HashMap::new(),
            warnings: Vec::new(),
        })
    }

    /// Build a graph from already resolved edges.
    ///
    /// Every endpoint must name one of `files`.
    pub fn from_edges<S: AsRef<str>>(files: Vec<FileNode>, edges: &[(S, S)]) -> Result<Self> {
        let mut graph = Self::with_files(files)?;
        for (from, to) in edges {
            let (from, to) = (from.as_ref(), to.as_ref());
            match (graph.index.get(from), graph.index.get(to)) {
                (Some(&a), Some(&b)) => {
                    graph.inner.update_edge(a, b, ());
                }
                _ => {
                    return Err(EngineError::UnknownEndpoint {
                        from: from.to_string(),
                        to: to.to_string(),
                    })
                }
            }
        }
        Ok(graph)
    }

    /// Number of files.
    pub fn len(&self) -> usize {
        self.inner.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.node_count() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn node(&self, path: &str) -> Option<&FileNode> {
        self.index.get(path).map(|&idx| &self.inner[idx])
    }

    /// Iterate over all files in insertion order.
    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.inner.node_indices().map(move |idx| &self.inner[idx])
    }

    /// Files imported by `path`.
    pub fn dependencies(&self, path: &str) -> Vec<&str> {
        self.neighbours(path, Direction::Outgoing)
    }

    /// Files importing `path`.
    pub fn dependents(&self, path: &str) -> Vec<&str> {
        self.neighbours(path, Direction::Incoming)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index.get(from), self.index.get(to)) {
            (Some(&a), Some(&b)) => self.inner.contains_edge(a, b),
            _ => false,
        }
    }

    /// Iterate over every edge as `(importer, imported)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.edge_references().map(move |e| {
            (
                self.inner[e.source()].path.as_str(),
                self.inner[e.target()].path.as_str(),
            )
        })
    }

    /// Raw imports of `path` that did not resolve to a file in the graph.
    pub fn external_imports(&self, path: &str) -> &[String] {
        self.external.get(path).map_or(&[], Vec::as_slice)
    }

    /// Extraction failures met while building the graph.
    pub fn warnings(&self) -> &[ExtractionWarning] {
        &self.warnings
    }

    fn neighbours(&self, path: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.index.get(path) else {
            return Vec::new();
        };
        let mut found: Vec<NodeIndex> = self.inner.neighbors_directed(idx, direction).collect();
        found.sort_unstable();
        found.dedup();
        found
            .into_iter()
            .map(|n| self.inner[n].path.as_str())
            .collect()
    }

    // ── Index-level access for the algorithms in this crate ─────────

    pub(crate) fn index_of(&self, path: &str) -> Option<usize> {
        self.index.get(path).map(|idx| idx.index())
    }

    pub(crate) fn path_at(&self, idx: usize) -> &str {
        &self.inner[NodeIndex::new(idx)].path
    }

    pub(crate) fn size_at(&self, idx: usize) -> u64 {
        self.inner[NodeIndex::new(idx)].estimated_size
    }

    /// Outgoing neighbour indices, ascending.
    pub(crate) fn successors(&self, idx: usize) -> Vec<usize> {
        self.indices(idx, Direction::Outgoing)
    }

    /// Incoming neighbour indices, ascending.
    pub(crate) fn predecessors(&self, idx: usize) -> Vec<usize> {
        self.indices(idx, Direction::Incoming)
    }

    fn indices(&self, idx: usize, direction: Direction) -> Vec<usize> {
        let mut found: Vec<usize> = self
            .inner
            .neighbors_directed(NodeIndex::new(idx), direction)
            .map(|n| n.index())
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }
}

/// Assembles a [`DependencyGraph`] from a file set and an extractor.
pub struct GraphBuilder<'a> {
    resolver: &'a ImportResolver,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(resolver: &'a ImportResolver) -> Self {
        GraphBuilder { resolver }
    }

    /// Extract imports file by file, then assemble the graph.
    pub fn build<E>(&self, files: Vec<FileNode>, extractor: &E) -> Result<DependencyGraph>
    where
        E: ImportExtractor + ?Sized,
    {
        let extracted: Vec<_> = files.iter().map(|file| extractor.extract(file)).collect();
        self.assemble(files, extracted)
    }

    /// Extract imports on the rayon pool, then assemble the graph on the
    /// calling thread once every result is in.
    pub fn build_parallel<E>(&self, files: Vec<FileNode>, extractor: &E) -> Result<DependencyGraph>
    where
        E: ImportExtractor + Sync + ?Sized,
    {
        let extracted: Vec<_> = files
            .par_iter()
            .map(|file| extractor.extract(file))
            .collect();
        self.assemble(files, extracted)
    }

    fn assemble(
        &self,
        files: Vec<FileNode>,
        extracted: Vec<anyhow::Result<ExtractedImports>>,
    ) -> Result<DependencyGraph> {
        let known: HashSet<String> = files.iter().map(|f| f.path.clone()).collect();
        let paths: Vec<String> = files.iter().map(|f| f.path.clone()).collect();
        let mut graph = DependencyGraph::with_files(files)?;

        for (from_idx, (path, result)) in paths.iter().zip(extracted).enumerate() {
            let imports = match result {
                Ok(found) => found.imports,
                Err(e) => {
                    tracing::warn!("Import extraction failed for {}: {:#}", path, e);
                    graph.warnings.push(ExtractionWarning {
                        path: path.clone(),
                        cause: format!("{e:#}"),
                    });
                    continue;
                }
            };

            let from = NodeIndex::new(from_idx);
            let mut external = Vec::new();
            for import in imports {
                match self.resolver.resolve(&import.source, path, &known) {
                    Some(target) => {
                        let to = graph.index[&target];
                        graph.inner.update_edge(from, to, ());
                    }
                    None => external.push(import.source),
                }
            }
            if !external.is_empty() {
                graph.external.insert(path.clone(), external);
            }
        }

        tracing::debug!(
            "Dependency graph built: {} files, {} edges, {} extraction warnings",
            graph.len(),
            graph.edge_count(),
            graph.warnings.len()
        );
        Ok(graph)
    }
}
