//! Java import extractor (pattern based)

use std::path::Path;

use anyhow::Result;
use cohort_core::{ExtractedImports, ImportRecord};
use once_cell::sync::Lazy;
use regex::Regex;

use super::LanguageExtractor;
use super::dart::line_at;

static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*import\s+(static\s+)?([\w.]+(?:\.\*)?)\s*;")
        .expect("Invalid Java import regex")
});

static PUBLIC_TYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*public\s+(?:(?:abstract|final|sealed|static)\s+)*(?:class|interface|enum|record|@interface)\s+(\w+)")
        .expect("Invalid Java type regex")
});

pub struct JavaExtractor;

impl LanguageExtractor for JavaExtractor {
    fn extract(&self, _path: &Path, source: &str) -> Result<ExtractedImports> {
        let imports = IMPORT
            .captures_iter(source)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(2)?.as_str();
                // import static a.b.C.member; depends on a.b.C
                let source_name = if caps.get(1).is_some() {
                    name.rsplit_once('.').map_or(name, |(class, _)| class)
                } else {
                    name
                };
                Some(ImportRecord {
                    source: source_name.to_string(),
                    line: line_at(source, whole.start()),
                })
            })
            .collect();

        let exports = PUBLIC_TYPE
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect();

        Ok(ExtractedImports {
            imports,
            exports,
            language: Some("java".to_string()),
        })
    }
}
