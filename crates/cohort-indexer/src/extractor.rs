//! File-backed import extractor for the dependency graph builder

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cohort_core::{ExtractedImports, FileNode, ImportExtractor};

use crate::languages::get_extractor;
use crate::parser_pool::{ParserPool, create_parser_pool};

/// Reads files below `root` and dispatches them to a language extractor.
///
/// Files of a language without an extractor yield no imports.
#[derive(Clone)]
pub struct SourceExtractor {
    root: PathBuf,
    parser_pool: ParserPool,
}

impl SourceExtractor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_pool(root, create_parser_pool())
    }

    pub fn with_pool(root: impl Into<PathBuf>, parser_pool: ParserPool) -> Self {
        SourceExtractor {
            root: root.into(),
            parser_pool,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extract from source text already in memory.
    pub fn extract_source(&self, path: &Path, source: &str) -> Result<ExtractedImports> {
        match get_extractor(path, &self.parser_pool) {
            Some(extractor) => extractor.extract(path, source),
            None => Ok(ExtractedImports::default()),
        }
    }
}

impl ImportExtractor for SourceExtractor {
    fn extract(&self, file: &FileNode) -> Result<ExtractedImports> {
        let relative = Path::new(&file.path);
        let full = self.root.join(relative);
        let bytes = std::fs::read(&full)
            .with_context(|| format!("Failed to read {}", full.display()))?;
        let source = String::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", file.path))?;

        let mut found = self.extract_source(relative, &source)?;
        if found.language.is_none() {
            found.language = Some(file.language.as_str().to_string());
        }
        Ok(found)
    }
}
