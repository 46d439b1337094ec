//! Splitting an oversized module into sub-module candidates
//!
//! Candidates grow from their seed files along import edges. When a circular
//! group ends up spread over several candidates, the whole group goes to the
//! candidate with the best ownership score and the others keep a reference to
//! the files they lost.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::SubdivisionConfig;
use crate::graph::DependencyGraph;
use crate::model::{CircularGroup, CycleResolution, Ownership, OwnershipScore, SubdivisionCandidate};
use crate::sequencer::order;

const ENTRY_WEIGHT: f64 = 3.0;
const KEY_WEIGHT: f64 = 2.0;
const PROXIMITY_CEILING: f64 = 10.0;

/// Subdivide every file of `graph` with the default settings.
pub fn subdivide(
    candidates: Vec<SubdivisionCandidate>,
    cycles: &[CircularGroup],
    graph: &DependencyGraph,
) -> Vec<SubdivisionCandidate> {
    let module_files: Vec<String> = graph.files().map(|f| f.path.clone()).collect();
    Subdivider::new(graph, SubdivisionConfig::default())
        .subdivide(candidates, cycles, &module_files, "")
        .candidates
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubdivisionPlan {
    pub candidates: Vec<SubdivisionCandidate>,
    /// Module files no candidate owns; they stay with the parent module.
    pub parent_files: Vec<String>,
    pub resolutions: Vec<CycleResolution>,
}

pub struct Subdivider<'g> {
    graph: &'g DependencyGraph,
    config: SubdivisionConfig,
}

impl<'g> Subdivider<'g> {
    pub fn new(graph: &'g DependencyGraph, config: SubdivisionConfig) -> Self {
        Subdivider { graph, config }
    }

    /// Seed, settle circular groups, optionally adopt orphans, then order
    /// every candidate's files.
    ///
    /// `scope` is the path prefix of the module; traversal never leaves it.
    pub fn subdivide(
        &self,
        mut candidates: Vec<SubdivisionCandidate>,
        cycles: &[CircularGroup],
        module_files: &[String],
        scope: &str,
    ) -> SubdivisionPlan {
        self.seed(&mut candidates, scope);
        let resolutions = self.resolve_conflicts(&mut candidates, cycles, scope);
        if self.config.adopt_orphans_by_keyword {
            self.adopt_orphans(&mut candidates, module_files, scope);
        }
        let parent_files = self.finalize(&mut candidates, module_files);

        tracing::info!(
            "Subdivided {} files into {} candidates ({} stay with the parent, {} circular groups)",
            module_files.len(),
            candidates.len(),
            parent_files.len(),
            resolutions.len()
        );
        SubdivisionPlan {
            candidates,
            parent_files,
            resolutions,
        }
    }

    /// Grow each candidate breadth-first from its entry and key files.
    ///
    /// Files already assigned are kept. Seeds unknown to the graph are
    /// skipped with a warning.
    pub fn seed(&self, candidates: &mut [SubdivisionCandidate], scope: &str) {
        for candidate in candidates.iter_mut() {
            let reached = self.reach(candidate, scope);
            let mut held: HashSet<String> = candidate.assigned_files.iter().cloned().collect();
            for path in reached {
                if held.insert(path.clone()) {
                    candidate.assigned_files.push(path);
                }
            }
            tracing::debug!(
                "Seeded {}: {} files",
                candidate.name,
                candidate.assigned_files.len()
            );
        }
    }

    fn reach(&self, candidate: &SubdivisionCandidate, scope: &str) -> Vec<String> {
        let mut found = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();

        for seed in candidate.entry_files.iter().chain(&candidate.key_files) {
            match self.graph.node(seed) {
                Some(node) => {
                    if seen.insert(node.path.as_str()) {
                        found.push(node.path.clone());
                        queue.push_back((node.path.as_str(), 0));
                    }
                }
                None => tracing::warn!(
                    "Seed file {} of {} is not in the dependency graph",
                    seed,
                    candidate.name
                ),
            }
        }

        while let Some((path, depth)) = queue.pop_front() {
            if depth >= self.config.max_depth {
                continue;
            }
            for dep in self.graph.dependencies(path) {
                if dep.starts_with(scope) && seen.insert(dep) {
                    found.push(dep.to_string());
                    queue.push_back((dep, depth + 1));
                }
            }
        }
        found
    }

    /// Settle ownership of every circular group, in the order given.
    ///
    /// A winner only takes the group files under `scope`; members outside
    /// the module become its shared dependencies.
    pub fn resolve_conflicts(
        &self,
        candidates: &mut [SubdivisionCandidate],
        cycles: &[CircularGroup],
        scope: &str,
    ) -> Vec<CycleResolution> {
        cycles
            .iter()
            .map(|group| CycleResolution {
                ownership: self.resolve_group(candidates, group, scope),
                group: group.clone(),
            })
            .collect()
    }

    fn resolve_group(
        &self,
        candidates: &mut [SubdivisionCandidate],
        group: &CircularGroup,
        scope: &str,
    ) -> Ownership {
        let claims: Vec<(usize, OwnershipScore)> = candidates
            .iter()
            .enumerate()
            .filter_map(|(idx, candidate)| {
                let overlap: Vec<String> = group
                    .files
                    .iter()
                    .filter(|f| candidate.owns(f))
                    .cloned()
                    .collect();
                if overlap.is_empty() {
                    return None;
                }
                let score = self.ownership_score(candidate, group, &overlap);
                Some((
                    idx,
                    OwnershipScore {
                        candidate: candidate.name.clone(),
                        score,
                        overlap,
                    },
                ))
            })
            .collect();

        match claims.as_slice() {
            [] => return Ownership::Unclaimed,
            [(_, only)] => {
                return Ownership::Uncontested {
                    owner: only.candidate.clone(),
                }
            }
            _ => {}
        }

        // Stable: equal scores keep declaration order.
        let mut ranked: Vec<usize> = (0..claims.len()).collect();
        ranked.sort_by(|&a, &b| claims[b].1.score.total_cmp(&claims[a].1.score));
        let winner = claims[ranked[0]].0;

        for (idx, claim) in &claims {
            let candidate = &mut candidates[*idx];
            if *idx == winner {
                for file in &group.files {
                    if candidate.owns(file) {
                        continue;
                    }
                    if file.starts_with(scope) {
                        candidate.assigned_files.push(file.clone());
                    } else {
                        candidate.shared_dependencies.push(file.clone());
                    }
                }
                candidate.shared_dependencies.sort();
                candidate.shared_dependencies.dedup();
            } else {
                candidate.assigned_files.retain(|f| !group.contains(f));
                candidate
                    .shared_dependencies
                    .extend(claim.overlap.iter().cloned());
                candidate.shared_dependencies.sort();
                candidate.shared_dependencies.dedup();
            }
        }

        let owner = candidates[winner].name.clone();
        let displaced = claims
            .iter()
            .filter(|(idx, _)| *idx != winner)
            .map(|(idx, _)| candidates[*idx].name.clone())
            .collect();
        tracing::info!(
            "Circular group of {} files starting at {} awarded to {}",
            group.len(),
            group.first().unwrap_or_default(),
            owner
        );
        Ownership::Awarded {
            owner,
            scores: claims.into_iter().map(|(_, score)| score).collect(),
            displaced,
        }
    }

    /// Weighted claim of `candidate` on `group`, divided by the group size.
    ///
    /// `overlap` is the part of the group the candidate currently holds.
    pub fn ownership_score(
        &self,
        candidate: &SubdivisionCandidate,
        group: &CircularGroup,
        overlap: &[String],
    ) -> f64 {
        if group.is_empty() || overlap.is_empty() {
            return 0.0;
        }

        let entry = overlap
            .iter()
            .filter(|f| candidate.entry_files.contains(f))
            .count();
        let key = overlap
            .iter()
            .filter(|f| candidate.key_files.contains(f))
            .count();

        let keywords = name_keywords(&candidate.name, &self.config.keyword_aliases);
        let distance: usize = overlap.iter().map(|f| path_distance(f, &keywords)).sum();
        let avg_distance = distance as f64 / overlap.len() as f64;
        let proximity = (PROXIMITY_CEILING - avg_distance).max(0.0);

        let (mut internal, mut external) = (0usize, 0usize);
        for file in overlap {
            for dep in self.graph.dependencies(file) {
                if group.contains(dep) {
                    internal += 1;
                } else {
                    external += 1;
                }
            }
        }
        let density = if internal + external > 0 {
            internal as f64 / (internal + external) as f64
        } else {
            0.0
        };

        let raw = ENTRY_WEIGHT * entry as f64 + KEY_WEIGHT * key as f64 + proximity + density;
        raw / group.len() as f64
    }

    /// Give unclaimed in-scope files to the first candidate whose name
    /// keyword appears in the path. Returns how many files moved.
    pub fn adopt_orphans(
        &self,
        candidates: &mut [SubdivisionCandidate],
        module_files: &[String],
        scope: &str,
    ) -> usize {
        let mut claimed: HashSet<String> = candidates
            .iter()
            .flat_map(|c| c.assigned_files.iter().cloned())
            .collect();
        let keywords: Vec<Vec<String>> = candidates
            .iter()
            .map(|c| name_keywords(&c.name, &self.config.keyword_aliases))
            .collect();

        let mut adopted = 0;
        for path in module_files {
            if !path.starts_with(scope) || claimed.contains(path) {
                continue;
            }
            let lower = path.to_lowercase();
            let Some(idx) = keywords
                .iter()
                .position(|words| words.iter().any(|w| lower.contains(w.as_str())))
            else {
                continue;
            };
            candidates[idx].assigned_files.push(path.clone());
            claimed.insert(path.clone());
            adopted += 1;
        }

        if adopted > 0 {
            tracing::debug!("Adopted {} orphan files by path keyword", adopted);
        }
        adopted
    }

    /// Make assignments disjoint, order each candidate's files by dependency
    /// and return the module files left to the parent.
    ///
    /// A file still held by several candidates stays with the first one and
    /// becomes a shared dependency of the rest.
    pub fn finalize(
        &self,
        candidates: &mut [SubdivisionCandidate],
        module_files: &[String],
    ) -> Vec<String> {
        let mut owner_of: HashMap<String, usize> = HashMap::new();
        for (idx, candidate) in candidates.iter_mut().enumerate() {
            let mut kept = Vec::with_capacity(candidate.assigned_files.len());
            for path in std::mem::take(&mut candidate.assigned_files) {
                match owner_of.get(&path) {
                    Some(&owner) if owner != idx => candidate.shared_dependencies.push(path),
                    Some(_) => {}
                    None => {
                        owner_of.insert(path.clone(), idx);
                        kept.push(path);
                    }
                }
            }
            candidate.shared_dependencies.sort();
            candidate.shared_dependencies.dedup();
            candidate.assigned_files = order(&kept, self.graph);
        }

        let mut seen = HashSet::new();
        module_files
            .iter()
            .filter(|path| !owner_of.contains_key(path.as_str()) && seen.insert(path.as_str()))
            .cloned()
            .collect()
    }
}

/// Lowercase keywords of a candidate name: its ASCII letter runs plus the
/// translation of every alias fragment the name contains.
pub fn name_keywords(name: &str, aliases: &BTreeMap<String, String>) -> Vec<String> {
    let mut words: Vec<String> = aliases
        .iter()
        .filter(|(fragment, _)| !fragment.is_empty() && name.contains(fragment.as_str()))
        .map(|(_, keyword)| keyword.to_lowercase())
        .collect();
    words.extend(
        name.to_lowercase()
            .split(|c: char| !c.is_ascii_lowercase())
            .filter(|w| !w.is_empty())
            .map(String::from),
    );
    words.sort();
    words.dedup();
    words
}

/// 0 when the path mentions a keyword, otherwise its number of segments.
pub fn path_distance(path: &str, keywords: &[String]) -> usize {
    let lower = path.to_lowercase();
    if keywords.iter().any(|k| lower.contains(k.as_str())) {
        0
    } else {
        path.split('/').count()
    }
}
