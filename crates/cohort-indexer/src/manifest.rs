//! Package manifest scanning for `package:` import resolution

use std::path::Path;

use anyhow::{Context, Result};
use cohort_core::PackageMap;
use ignore::WalkBuilder;
use serde::Deserialize;

pub const PUBSPEC: &str = "pubspec.yaml";

#[derive(Debug, Deserialize)]
struct Pubspec {
    name: Option<String>,
}

/// Map every package declared by a `pubspec.yaml` below `root` to its
/// root-relative source directory.
///
/// The source directory is the package's `lib/` when it exists, otherwise
/// the manifest directory. Unparseable manifests are skipped with a warning;
/// when two manifests declare the same name the first path wins.
pub fn scan_manifests(root: &Path) -> Result<PackageMap> {
    let mut packages = PackageMap::new();

    let mut builder = WalkBuilder::new(root);
    builder.hidden(true).git_ignore(true).require_git(false);
    builder.sort_by_file_path(|a, b| a.cmp(b));

    for result in builder.build() {
        let entry = match result {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read entry: {}", e);
                continue;
            }
        };
        if entry.file_name() != PUBSPEC || !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let name = match read_package_name(path) {
            Ok(Some(name)) => name,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("Skipping manifest {}: {:#}", path.display(), e);
                continue;
            }
        };

        let Some(dir) = path.parent() else {
            continue;
        };
        let source_dir = if dir.join("lib").is_dir() {
            dir.join("lib")
        } else {
            dir.to_path_buf()
        };
        let relative = source_dir
            .strip_prefix(root)
            .ok()
            .and_then(|p| p.to_str())
            .map(|p| p.replace('\\', "/"))
            .unwrap_or_default();

        if let Some(existing) = packages.get(&name) {
            tracing::warn!(
                "Package {} declared twice ({} and {}); keeping the first",
                name,
                existing,
                relative
            );
            continue;
        }
        tracing::debug!("Package {} -> {}", name, relative);
        packages.insert(name, relative);
    }

    Ok(packages)
}

fn read_package_name(path: &Path) -> Result<Option<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest: Pubspec = serde_yaml::from_str(&text)
        .with_context(|| format!("Invalid YAML in {}", path.display()))?;
    Ok(manifest
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty()))
}
