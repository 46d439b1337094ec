//! Cohort Core — dependency graph, clustering, batching and module subdivision

pub mod model;
pub mod error;
pub mod config;
pub mod resolver;
pub mod graph;
pub mod cycles;
pub mod partition;
pub mod batching;
pub mod sequencer;
pub mod subdivision;

#[cfg(test)]
pub mod tests;

#[cfg(test)]
pub mod test_utils;

pub use model::{Language, FileNode, CircularGroup, Cluster, Batch, SubdivisionCandidate, OwnershipScore, Ownership, CycleResolution, ExtractionWarning};
pub use error::{EngineError, Result};
pub use config::{EngineConfig, BatchConfig, ResolverConfig, SubdivisionConfig, AliasRule, BATCH_MAX_TOKENS, PROMPT_RESERVED_TOKENS};
pub use resolver::{ImportResolver, PackageMap};
pub use graph::{DependencyGraph, GraphBuilder, ImportExtractor, ExtractedImports, ImportRecord, StaticImports};
pub use cycles::detect_cycles;
pub use partition::partition;
pub use batching::{pack, BatchPacker, BatchPlanner, BatchPlan, PlanStats};
pub use sequencer::order;
pub use subdivision::{subdivide, Subdivider, SubdivisionPlan};
