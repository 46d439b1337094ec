//! Core data structures for the clustering and batching engine

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source language tag attached to every file node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Vue,
    Python,
    Java,
    Dart,
    Other,
}

impl Language {
    /// Detect language from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("ts") | Some("tsx") | Some("mts") | Some("cts") => Language::TypeScript,
            Some("js") | Some("jsx") | Some("mjs") | Some("cjs") => Language::JavaScript,
            Some("vue") => Language::Vue,
            Some("py") | Some("pyi") => Language::Python,
            Some("java") => Language::Java,
            Some("dart") => Language::Dart,
            _ => Language::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Vue => "vue",
            Language::Python => "python",
            Language::Java => "java",
            Language::Dart => "dart",
            Language::Other => "other",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source file taking part in an analysis run.
///
/// `path` is the identity of the node: a repository-relative path using `/`
/// separators. `estimated_size` is the cost unit the batch budget is counted
/// in (usually tokens).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub path: String,
    pub estimated_size: u64,
    pub language: Language,
}

impl FileNode {
    pub fn new(path: impl Into<String>, estimated_size: u64) -> Self {
        let path = path.into();
        let language = Language::from_path(Path::new(&path));
        FileNode {
            path,
            estimated_size,
            language,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }
}

/// A strongly connected component with at least two files.
///
/// Files are kept sorted so membership tests are a binary search and the
/// serialized form is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircularGroup {
    pub files: Vec<String>,
}

impl CircularGroup {
    pub fn new(mut files: Vec<String>) -> Self {
        files.sort();
        files.dedup();
        CircularGroup { files }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files
            .binary_search_by(|f| f.as_str().cmp(path))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Smallest path in the group, used to order groups.
    pub fn first(&self) -> Option<&str> {
        self.files.first().map(String::as_str)
    }
}

/// A weakly connected component of the file graph.
///
/// Members keep the order in which the files were handed to the graph builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub files: Vec<String>,
}

impl Cluster {
    pub fn new(files: Vec<String>) -> Self {
        Cluster { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A size-bounded group of files analysed together.
///
/// `total_size <= budget` holds for every batch with more than one file. A
/// single file larger than the budget is emitted alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub files: Vec<String>,
    pub total_size: u64,
    /// Internal directed edges over `n * (n - 1)`, rounded to two decimals.
    pub cohesion: f64,
    /// Longest shared directory of the batch, or a generic label.
    pub label: String,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.iter().any(|f| f == path)
    }
}

/// A proposed sub-module of an oversized module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubdivisionCandidate {
    pub name: String,
    /// Seed files with the highest claim weight.
    #[serde(default)]
    pub entry_files: Vec<String>,
    /// Secondary seed files.
    #[serde(default)]
    pub key_files: Vec<String>,
    /// Files owned by this candidate. Dependency ordered once finalized.
    #[serde(default)]
    pub assigned_files: Vec<String>,
    /// Files this candidate reached but lost to another candidate.
    #[serde(default)]
    pub shared_dependencies: Vec<String>,
}

impl SubdivisionCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        SubdivisionCandidate {
            name: name.into(),
            entry_files: Vec::new(),
            key_files: Vec::new(),
            assigned_files: Vec::new(),
            shared_dependencies: Vec::new(),
        }
    }

    pub fn with_entry_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_key_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_files = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn owns(&self, path: &str) -> bool {
        self.assigned_files.iter().any(|f| f == path)
    }
}

/// Weighted claim of one candidate on one contested circular group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipScore {
    pub candidate: String,
    /// Raw score divided by the group size.
    pub score: f64,
    /// Files of the group the candidate held before resolution.
    pub overlap: Vec<String>,
}

/// How ownership of a circular group was settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Ownership {
    /// No candidate holds any file of the group.
    Unclaimed,
    /// Exactly one candidate holds part of the group; nothing moves.
    Uncontested { owner: String },
    /// Several candidates competed; the winner now holds the whole group.
    Awarded {
        owner: String,
        scores: Vec<OwnershipScore>,
        /// Losing candidates, in declaration order.
        displaced: Vec<String>,
    },
}

impl Ownership {
    pub fn owner(&self) -> Option<&str> {
        match self {
            Ownership::Unclaimed => None,
            Ownership::Uncontested { owner } | Ownership::Awarded { owner, .. } => Some(owner),
        }
    }
}

/// Outcome for one circular group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleResolution {
    pub group: CircularGroup,
    pub ownership: Ownership,
}

/// Non-fatal problem met while extracting imports for a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionWarning {
    pub path: String,
    pub cause: String,
}
