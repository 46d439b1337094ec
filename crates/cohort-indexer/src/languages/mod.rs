//! Import/export extractors for the supported source languages

pub mod dart;
pub mod java;
pub mod javascript;
pub mod python;
pub mod vue;

use std::path::Path;

use anyhow::Result;
use cohort_core::ExtractedImports;

use crate::parser_pool::{FileType, ParserPool};

/// Trait for language-specific import extractors
pub trait LanguageExtractor: Send + Sync {
    /// Collect raw import specifiers and exported names from source text
    fn extract(&self, path: &Path, source: &str) -> Result<ExtractedImports>;
}

/// Get the appropriate extractor for a file based on its extension
pub fn get_extractor(path: &Path, pool: &ParserPool) -> Option<Box<dyn LanguageExtractor>> {
    let ext = path.extension()?.to_str()?;

    match ext {
        "vue" => Some(Box::new(vue::VueExtractor::new(pool.clone()))),
        "dart" => Some(Box::new(dart::DartExtractor)),
        "java" => Some(Box::new(java::JavaExtractor)),
        _ => match FileType::from_path(path)? {
            FileType::Python => Some(Box::new(python::PythonExtractor::new(pool.clone()))),
            file_type => Some(Box::new(javascript::JavaScriptExtractor::new(
                pool.clone(),
                file_type,
            ))),
        },
    }
}

/// 1-based line of a tree-sitter node
pub(crate) fn line_of(node: tree_sitter::Node) -> Option<u32> {
    u32::try_from(node.start_position().row + 1).ok()
}

/// Strip the quotes around a string literal
pub(crate) fn unquote(text: &str) -> &str {
    text.trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
}
