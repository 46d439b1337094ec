//! JavaScript and TypeScript import extractor using tree-sitter

use std::path::Path;

use anyhow::Result;
use cohort_core::{ExtractedImports, ImportRecord};
use tree_sitter::Node;

use super::{LanguageExtractor, line_of, unquote};
use crate::parser_pool::{FileType, ParseRequest, ParserPool};

pub struct JavaScriptExtractor {
    parser_pool: ParserPool,
    file_type: FileType,
}

impl JavaScriptExtractor {
    pub fn new(parser_pool: ParserPool, file_type: FileType) -> Self {
        Self {
            parser_pool,
            file_type,
        }
    }

    fn visit(&self, node: Node, source: &[u8], found: &mut ExtractedImports) {
        match node.kind() {
            // import x from 'a'; import 'a';
            "import_statement" => {
                if let Some(spec) = string_field(node, "source", source) {
                    found.imports.push(record(spec, node));
                }
            }
            "export_statement" => {
                // export { a } from 'b'; export * from 'b';
                if let Some(spec) = string_field(node, "source", source) {
                    found.imports.push(record(spec, node));
                }
                collect_exports(node, source, &mut found.exports);
            }
            // require('a'), import('a')
            "call_expression" => {
                if let Some(spec) = required_module(node, source) {
                    found.imports.push(record(spec, node));
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.visit(child, source, found);
        }
    }
}

impl LanguageExtractor for JavaScriptExtractor {
    fn extract(&self, path: &Path, source: &str) -> Result<ExtractedImports> {
        let request = ParseRequest {
            file_type: self.file_type,
            content: source.to_string(),
            path: path.to_path_buf(),
        };
        let parse_result = self.parser_pool.parse_blocking(request)?;

        let mut found = ExtractedImports {
            language: Some(self.file_type.as_str().to_string()),
            ..ExtractedImports::default()
        };
        self.visit(
            parse_result.tree.root_node(),
            parse_result.content.as_bytes(),
            &mut found,
        );
        Ok(found)
    }
}

fn record(spec: &str, node: Node) -> ImportRecord {
    ImportRecord {
        source: spec.to_string(),
        line: line_of(node),
    }
}

fn string_field<'s>(node: Node, field: &str, source: &'s [u8]) -> Option<&'s str> {
    let value = node.child_by_field_name(field)?;
    if value.kind() != "string" {
        return None;
    }
    value.utf8_text(source).ok().map(unquote)
}

fn required_module<'s>(node: Node, source: &'s [u8]) -> Option<&'s str> {
    let function = node.child_by_field_name("function")?;
    let is_loader = match function.kind() {
        "import" => true,
        "identifier" => function.utf8_text(source).ok() == Some("require"),
        _ => false,
    };
    if !is_loader {
        return None;
    }
    let arguments = node.child_by_field_name("arguments")?;
    let first = arguments.named_child(0)?;
    if first.kind() != "string" {
        return None;
    }
    first.utf8_text(source).ok().map(unquote)
}

fn collect_exports(node: Node, source: &[u8], exports: &mut Vec<String>) {
    let mut cursor = node.walk();
    let is_default = node
        .children(&mut cursor)
        .any(|child| child.kind() == "default");
    if is_default {
        exports.push("default".to_string());
        return;
    }

    if let Some(declaration) = node.child_by_field_name("declaration") {
        declared_names(declaration, source, exports);
        return;
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() != "export_clause" {
            continue;
        }
        let mut inner = child.walk();
        for specifier in child.named_children(&mut inner) {
            let name = specifier
                .child_by_field_name("alias")
                .or_else(|| specifier.child_by_field_name("name"));
            if let Some(text) = name.and_then(|n| n.utf8_text(source).ok()) {
                exports.push(text.to_string());
            }
        }
    }
}

fn declared_names(declaration: Node, source: &[u8], exports: &mut Vec<String>) {
    if let Some(name) = declaration
        .child_by_field_name("name")
        .and_then(|n| n.utf8_text(source).ok())
    {
        exports.push(name.to_string());
        return;
    }

    // const a = 1, b = 2;
    let mut cursor = declaration.walk();
    for declarator in declaration.named_children(&mut cursor) {
        if declarator.kind() != "variable_declarator" {
            continue;
        }
        if let Some(name) = declarator
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(source).ok())
        {
            exports.push(name.to_string());
        }
    }
}
