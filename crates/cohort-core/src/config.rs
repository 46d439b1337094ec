//! Engine configuration, loadable from the `cohort.toml` sections

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Per-batch ceiling of the analysis backend.
pub const BATCH_MAX_TOKENS: u64 = 150_000;

/// Room kept free in every batch for the prompt around the files.
pub const PROMPT_RESERVED_TOKENS: u64 = 20_000;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub batch: BatchConfig,
    pub resolver: ResolverConfig,
    pub subdivision: SubdivisionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum summed `estimated_size` of a multi-file batch.
    pub budget: u64,
    /// Batches smaller than `budget * merge_threshold` are merged together.
    pub merge_threshold: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            budget: BATCH_MAX_TOKENS - PROMPT_RESERVED_TOKENS,
            merge_threshold: 0.3,
        }
    }
}

impl BatchConfig {
    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = budget;
        self
    }

    /// Size under which a batch counts as small.
    pub fn small_batch_limit(&self) -> f64 {
        self.budget as f64 * self.merge_threshold
    }
}

/// Rewrites an import prefix to a root-relative directory, e.g. `@/` to `src/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasRule {
    pub prefix: String,
    pub target: String,
}

impl AliasRule {
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        AliasRule {
            prefix: prefix.into(),
            target: target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Probed in order after the literal path.
    pub extensions: Vec<String>,
    pub aliases: Vec<AliasRule>,
    /// File stems tried inside a directory import, e.g. `index`.
    pub index_files: Vec<String>,
    /// Roots searched for dotted Python and Java module names.
    pub module_roots: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            extensions: [".js", ".ts", ".jsx", ".tsx", ".vue", ".py", ".java", ".dart"]
                .into_iter()
                .map(String::from)
                .collect(),
            aliases: vec![AliasRule::new("@/", "src/")],
            index_files: vec!["index".to_string()],
            module_roots: ["", "src", "src/main/java"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubdivisionConfig {
    /// Breadth-first depth limit when growing a candidate from its seeds.
    pub max_depth: usize,
    /// Hand unclaimed files to the first candidate whose name keyword
    /// appears in the file path.
    pub adopt_orphans_by_keyword: bool,
    /// Extra keywords: a fragment found in a candidate name maps to a path
    /// keyword, e.g. `"用户" = "user"`.
    pub keyword_aliases: BTreeMap<String, String>,
}

impl Default for SubdivisionConfig {
    fn default() -> Self {
        SubdivisionConfig {
            max_depth: 20,
            adopt_orphans_by_keyword: false,
            keyword_aliases: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str, origin: &Path) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(source).map_err(|source| EngineError::ConfigParse {
                path: origin.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source, path)?;
        tracing::debug!("Loaded engine config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.budget == 0 {
            return Err(EngineError::InvalidConfig(
                "batch.budget must be greater than zero".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.batch.merge_threshold) {
            return Err(EngineError::InvalidConfig(format!(
                "batch.merge_threshold must lie in [0, 1], got {}",
                self.batch.merge_threshold
            )));
        }
        if let Some(ext) = self.resolver.extensions.iter().find(|e| e.is_empty()) {
            return Err(EngineError::InvalidConfig(format!(
                "resolver.extensions contains an empty entry ({ext:?})"
            )));
        }
        if self.resolver.aliases.iter().any(|a| a.prefix.is_empty()) {
            return Err(EngineError::InvalidConfig(
                "resolver.aliases entries need a non-empty prefix".into(),
            ));
        }
        Ok(())
    }
}
