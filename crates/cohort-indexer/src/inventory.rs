//! File inventory: the candidate file list handed to the engine

use std::path::Path;

use anyhow::{Context, Result};
use cohort_core::FileNode;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};

/// The `[inventory]` section of `cohort.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryConfig {
    /// Size estimate per character of source text.
    pub tokens_per_char: f64,
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Glob patterns, relative to the root, of paths to leave out.
    pub exclude: Vec<String>,
    /// Extensions (without the dot) to keep. Empty keeps every text file.
    pub extensions: Vec<String>,
    pub include_hidden: bool,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        InventoryConfig {
            tokens_per_char: 1.0 / 3.0,
            max_file_size: 10 * 1024 * 1024,
            exclude: ["**/node_modules/**", "**/build/**", "**/dist/**", "**/*.min.js"]
                .into_iter()
                .map(String::from)
                .collect(),
            extensions: [
                "js", "jsx", "mjs", "cjs", "ts", "tsx", "vue", "py", "java", "dart",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            include_hidden: false,
        }
    }
}

impl InventoryConfig {
    /// Size estimate for `chars` characters, never below 1.
    pub fn estimate(&self, chars: usize) -> u64 {
        ((chars as f64 * self.tokens_per_char).ceil() as u64).max(1)
    }
}

/// Walk `root` and return one [`FileNode`] per kept file, sorted by path.
///
/// `.gitignore` rules apply. Binary files (not valid UTF-8) and files above
/// the size limit are skipped with a debug log.
pub fn scan_inventory(root: &Path, config: &InventoryConfig) -> Result<Vec<FileNode>> {
    let excluded = build_globset(&config.exclude)?;

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(!config.include_hidden)
        .git_ignore(true)
        .git_exclude(true)
        .require_git(false);

    let mut files = Vec::new();
    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let Some(relative) = relative_path(root, path) else {
            continue;
        };
        if excluded.is_match(&relative) || !has_wanted_extension(&relative, config) {
            continue;
        }

        if let Ok(meta) = entry.metadata() {
            if meta.len() > config.max_file_size {
                tracing::debug!(
                    "Skipping large file {} ({} bytes > {})",
                    relative,
                    meta.len(),
                    config.max_file_size
                );
                continue;
            }
        }

        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let Ok(text) = std::str::from_utf8(&bytes) else {
            tracing::debug!("Skipping binary file {}", relative);
            continue;
        };

        files.push(FileNode::new(relative, config.estimate(text.chars().count())));
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::info!("Found {} source files under {}", files.len(), root.display());
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .with_context(|| format!("Invalid glob pattern in inventory exclude list: {pattern}"))?;
        builder.add(glob);
    }
    builder
        .build()
        .context("Failed to build globset for inventory excludes")
}

/// Root-relative path with `/` separators.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

fn has_wanted_extension(relative: &str, config: &InventoryConfig) -> bool {
    if config.extensions.is_empty() {
        return true;
    }
    Path::new(relative)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| config.extensions.iter().any(|wanted| wanted == ext))
}
