//! Python import extractor using tree-sitter
//!
//! Relative imports are rewritten to path form (`from ..a import b` becomes
//! `../a`) so they resolve like any other relative import. Absolute imports
//! stay dotted.

use std::path::Path;

use anyhow::Result;
use cohort_core::{ExtractedImports, ImportRecord};
use tree_sitter::Node;

use super::{LanguageExtractor, line_of};
use crate::parser_pool::{FileType, ParseRequest, ParserPool};

pub struct PythonExtractor {
    parser_pool: ParserPool,
}

impl PythonExtractor {
    pub fn new(parser_pool: ParserPool) -> Self {
        Self { parser_pool }
    }

    fn extract_imports(&self, node: Node, source: &[u8], imports: &mut Vec<ImportRecord>) {
        match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    let module = match name.kind() {
                        "aliased_import" => name.child_by_field_name("name"),
                        _ => Some(name),
                    };
                    if let Some(text) = module.and_then(|m| m.utf8_text(source).ok()) {
                        imports.push(ImportRecord {
                            source: text.to_string(),
                            line: line_of(node),
                        });
                    }
                }
                return;
            }
            "import_from_statement" => {
                for spec in from_import_specs(node, source) {
                    imports.push(ImportRecord {
                        source: spec,
                        line: line_of(node),
                    });
                }
                return;
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.extract_imports(child, source, imports);
        }
    }
}

impl LanguageExtractor for PythonExtractor {
    fn extract(&self, path: &Path, source: &str) -> Result<ExtractedImports> {
        let request = ParseRequest {
            file_type: FileType::Python,
            content: source.to_string(),
            path: path.to_path_buf(),
        };
        let parse_result = self.parser_pool.parse_blocking(request)?;
        let root = parse_result.tree.root_node();
        let bytes = parse_result.content.as_bytes();

        let mut imports = Vec::new();
        self.extract_imports(root, bytes, &mut imports);

        Ok(ExtractedImports {
            imports,
            exports: top_level_names(root, bytes),
            language: Some("python".to_string()),
        })
    }
}

fn from_import_specs(node: Node, source: &[u8]) -> Vec<String> {
    let Some(module) = node.child_by_field_name("module_name") else {
        return Vec::new();
    };
    let Ok(text) = module.utf8_text(source) else {
        return Vec::new();
    };

    if module.kind() != "relative_import" {
        return vec![text.to_string()];
    }

    let dots = text.chars().take_while(|c| *c == '.').count();
    let rest = text[dots..].replace('.', "/");
    let prefix = if dots <= 1 {
        "./".to_string()
    } else {
        "../".repeat(dots - 1)
    };

    if !rest.is_empty() {
        return vec![format!("{prefix}{rest}")];
    }

    // from . import a, b
    let mut cursor = node.walk();
    node.children_by_field_name("name", &mut cursor)
        .filter_map(|name| {
            let target = match name.kind() {
                "aliased_import" => name.child_by_field_name("name")?,
                _ => name,
            };
            let text = target.utf8_text(source).ok()?;
            Some(format!("{prefix}{}", text.replace('.', "/")))
        })
        .collect()
}

/// Public top-level functions and classes.
fn top_level_names(root: Node, source: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        let definition = match child.kind() {
            "decorated_definition" => child.child_by_field_name("definition"),
            "function_definition" | "class_definition" => Some(child),
            _ => None,
        };
        if let Some(name) = definition
            .and_then(|d| d.child_by_field_name("name"))
            .and_then(|n| n.utf8_text(source).ok())
        {
            if !name.starts_with('_') {
                names.push(name.to_string());
            }
        }
    }
    names
}
