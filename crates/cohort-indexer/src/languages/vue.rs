//! Vue single-file component extractor
//!
//! The `<script>` blocks are cut out of the component and handed to the
//! JavaScript or TypeScript grammar. Line numbers refer to the `.vue` file.

use std::path::Path;

use anyhow::Result;
use cohort_core::ExtractedImports;
use once_cell::sync::Lazy;
use regex::Regex;

use super::LanguageExtractor;
use super::dart::line_at;
use super::javascript::JavaScriptExtractor;
use crate::parser_pool::{FileType, ParserPool};

static SCRIPT_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<script\b([^>]*)>(.*?)</script>").expect("Invalid Vue script regex")
});

static TS_LANG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"lang\s*=\s*["'](ts|tsx)["']"#).expect("Invalid Vue lang regex")
});

pub struct VueExtractor {
    parser_pool: ParserPool,
}

impl VueExtractor {
    pub fn new(parser_pool: ParserPool) -> Self {
        Self { parser_pool }
    }
}

impl LanguageExtractor for VueExtractor {
    fn extract(&self, path: &Path, source: &str) -> Result<ExtractedImports> {
        let mut found = ExtractedImports {
            language: Some("vue".to_string()),
            ..ExtractedImports::default()
        };

        for caps in SCRIPT_BLOCK.captures_iter(source) {
            let (Some(attrs), Some(body)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let file_type = if TS_LANG.is_match(attrs.as_str()) {
                FileType::TypeScript
            } else {
                FileType::JavaScript
            };

            let script = JavaScriptExtractor::new(self.parser_pool.clone(), file_type)
                .extract(path, body.as_str())?;
            let offset = line_at(source, body.start()).unwrap_or(1) - 1;
            found.imports.extend(script.imports.into_iter().map(|mut record| {
                record.line = record.line.map(|line| line + offset);
                record
            }));
            found.exports.extend(script.exports);
        }

        Ok(found)
    }
}
