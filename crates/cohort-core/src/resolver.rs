//! Import resolution: raw import strings to in-repository file paths
//!
//! Resolution is a pure function of the raw import, the importing file, the
//! set of known paths and the resolver configuration. Anything that does not
//! land on a known path is an external dependency and yields `None`.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::config::{AliasRule, ResolverConfig};
use crate::model::Language;

/// Package name to repository-relative root directory, e.g. `app_core -> packages/core/lib`.
pub type PackageMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    config: ResolverConfig,
    packages: PackageMap,
}

impl ImportResolver {
    pub fn new(config: ResolverConfig) -> Self {
        ImportResolver {
            config,
            packages: PackageMap::new(),
        }
    }

    pub fn with_packages(mut self, packages: PackageMap) -> Self {
        self.packages = packages
            .into_iter()
            .map(|(name, root)| (name, root.trim_end_matches('/').to_string()))
            .collect();
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn packages(&self) -> &PackageMap {
        &self.packages
    }

    /// Map `raw_import`, written in `from_file`, to a path in `known`.
    pub fn resolve(
        &self,
        raw_import: &str,
        from_file: &str,
        known: &HashSet<String>,
    ) -> Option<String> {
        let raw = raw_import
            .trim()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '`');
        if raw.is_empty() {
            return None;
        }

        let language = Language::from_path(Path::new(from_file));

        if is_relative(raw) {
            let joined = normalize(&join(parent_dir(from_file), raw))?;
            return self.probe(&joined, known).or_else(|| {
                // `from . import sub` may name a package directory.
                (language == Language::Python)
                    .then(|| join(&joined, "__init__.py"))
                    .filter(|init| known.contains(init))
            });
        }

        if let Some(rest) = raw.strip_prefix("package:") {
            return self.resolve_package(rest, known);
        }

        // The longest matching prefix wins; ties keep declaration order.
        let alias = self
            .config
            .aliases
            .iter()
            .filter(|alias| raw.starts_with(alias.prefix.as_str()))
            .fold(None::<&AliasRule>, |best, alias| match best {
                Some(best) if best.prefix.len() >= alias.prefix.len() => Some(best),
                _ => Some(alias),
            });
        if let Some(alias) = alias {
            let rest = &raw[alias.prefix.len()..];
            let joined = normalize(&join(alias.target.trim_end_matches('/'), rest))?;
            return self.probe(&joined, known);
        }

        match language {
            // Dart URIs without a scheme are relative to the importing file.
            Language::Dart => {
                let joined = normalize(&join(parent_dir(from_file), raw))?;
                self.probe(&joined, known)
            }
            Language::Python => self.resolve_python_module(raw, known),
            Language::Java => self.resolve_java_class(raw, known),
            _ => None,
        }
    }

    fn resolve_package(&self, spec: &str, known: &HashSet<String>) -> Option<String> {
        let (name, sub_path) = spec.split_once('/')?;
        if sub_path.is_empty() {
            return None;
        }
        let root = self.packages.get(name)?;
        let joined = normalize(&join(root, sub_path))?;
        self.probe(&joined, known)
    }

    fn resolve_python_module(&self, module: &str, known: &HashSet<String>) -> Option<String> {
        if !is_dotted_name(module) {
            return None;
        }
        let relative = module.replace('.', "/");
        self.config.module_roots.iter().find_map(|root| {
            let base = normalize(&join(root.trim_end_matches('/'), &relative))?;
            [format!("{base}.py"), format!("{base}/__init__.py")]
                .into_iter()
                .find(|candidate| known.contains(candidate))
        })
    }

    fn resolve_java_class(&self, class: &str, known: &HashSet<String>) -> Option<String> {
        if class.ends_with(".*") || !is_dotted_name(class) {
            return None;
        }
        // `a.b.Outer.Inner` lives in `a/b/Outer.java`.
        let outer = class.rsplit_once('.').map(|(head, _)| head);
        [Some(class), outer]
            .into_iter()
            .flatten()
            .find_map(|name| {
                let relative = name.replace('.', "/");
                self.config.module_roots.iter().find_map(|root| {
                    let base = normalize(&join(root.trim_end_matches('/'), &relative))?;
                    let candidate = format!("{base}.java");
                    known.contains(&candidate).then_some(candidate)
                })
            })
    }

    /// Try the literal path, then each extension, then directory index files.
    fn probe(&self, base: &str, known: &HashSet<String>) -> Option<String> {
        if base.is_empty() {
            return None;
        }
        if known.contains(base) {
            return Some(base.to_string());
        }
        for ext in &self.config.extensions {
            let candidate = format!("{base}{ext}");
            if known.contains(&candidate) {
                return Some(candidate);
            }
        }
        for index in &self.config.index_files {
            for ext in &self.config.extensions {
                let candidate = format!("{base}/{index}{ext}");
                if known.contains(&candidate) {
                    return Some(candidate);
                }
            }
        }
        None
    }
}

fn is_relative(raw: &str) -> bool {
    raw == "." || raw == ".." || raw.starts_with("./") || raw.starts_with("../")
}

fn is_dotted_name(raw: &str) -> bool {
    !raw.starts_with('.')
        && !raw.ends_with('.')
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(dir, _)| dir)
}

fn join(base: &str, rest: &str) -> String {
    if base.is_empty() {
        rest.to_string()
    } else {
        format!("{base}/{rest}")
    }
}

/// Collapse `.` and `..` segments. Returns `None` when the path climbs above
/// the repository root.
pub(crate) fn normalize(path: &str) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}
