//! Dart directive extractor (pattern based)

use std::path::Path;

use anyhow::Result;
use cohort_core::{ExtractedImports, ImportRecord};
use once_cell::sync::Lazy;
use regex::Regex;

use super::LanguageExtractor;

/// `import 'x.dart';`, `export 'x.dart' show A;`, `part 'x.g.dart';`
static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?m)^[ \t]*(import|export|part)\s+['"]([^'"]+)['"]"#)
        .expect("Invalid Dart directive regex")
});

/// Top-level type declarations
static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:abstract\s+|sealed\s+|base\s+|final\s+)*(?:class|mixin|enum|extension|typedef)\s+([A-Za-z_$][\w$]*)")
        .expect("Invalid Dart declaration regex")
});

pub struct DartExtractor;

impl LanguageExtractor for DartExtractor {
    fn extract(&self, _path: &Path, source: &str) -> Result<ExtractedImports> {
        let imports = DIRECTIVE
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let uri = caps.get(2)?.as_str();
                Some(ImportRecord {
                    source: uri.to_string(),
                    line: line_at(source, whole.start()),
                })
            })
            .collect();

        let exports = DECLARATION
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|name| !name.starts_with('_'))
            .collect();

        Ok(ExtractedImports {
            imports,
            exports,
            language: Some("dart".to_string()),
        })
    }
}

pub(crate) fn line_at(source: &str, offset: usize) -> Option<u32> {
    let line = source[..offset].bytes().filter(|b| *b == b'\n').count() + 1;
    u32::try_from(line).ok()
}
