use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use depfix_core::{
    detect_with_overrides, CancelToken, Conflict, ConflictKind, DependencyMap, DepfixResult,
    InstalledVersion, Plan, Requirement, ResolutionItem, SpecifierSet, Unsolvable, Version,
};

use crate::source::PackageIndex;

/// Computes a minimally disruptive set of version changes that settles
/// the detected conflicts without breaking anything that currently works.
pub struct ConflictResolver<I> {
    index: I,
}

impl<I: PackageIndex> ConflictResolver<I> {
    /// Create a resolver over the given index.
    pub fn new(index: I) -> Self {
        Self { index }
    }

    /// Resolve the detected conflicts against the environment graph.
    ///
    /// Conflicts are grouped per dependency; each group either yields one
    /// plan item or an unsolvable record. Cancellation is honored between
    /// groups and between candidate lookups.
    pub async fn resolve(
        &self,
        map: &DependencyMap,
        conflicts: &[Conflict],
        cancel: &CancelToken,
    ) -> DepfixResult<Plan> {
        let mut buckets: BTreeMap<String, Vec<Conflict>> = BTreeMap::new();
        for conflict in conflicts {
            buckets
                .entry(conflict.dependency.clone())
                .or_default()
                .push(conflict.clone());
        }
        info!("resolving {} conflicting packages", buckets.len());

        let mut plan = Plan::default();
        let mut chosen = Vec::new();
        for (name, bucket) in &buckets {
            if cancel.is_cancelled() {
                plan.unsolvable.push(Unsolvable {
                    name: name.clone(),
                    reason: "cancelled".to_string(),
                    conflicts: bucket.clone(),
                });
                continue;
            }
            if bucket
                .iter()
                .any(|conflict| conflict.kind == ConflictKind::NotInstalled)
            {
                plan.unsolvable.push(Unsolvable {
                    name: name.clone(),
                    reason: "not installed; installing missing packages is out of scope"
                        .to_string(),
                    conflicts: bucket.clone(),
                });
                continue;
            }
            match self.resolve_bucket(map, name, bucket, cancel).await {
                Ok(item) => chosen.push(item),
                Err(reason) => plan.unsolvable.push(Unsolvable {
                    name: name.clone(),
                    reason,
                    conflicts: bucket.clone(),
                }),
            }
        }

        let ordered = order_items(map, chosen);
        self.validate(map, conflicts, ordered, &mut plan);
        Ok(plan)
    }

    /// Pick a target version for one conflicting package, or explain why
    /// none is acceptable.
    async fn resolve_bucket(
        &self,
        map: &DependencyMap,
        name: &str,
        bucket: &[Conflict],
        cancel: &CancelToken,
    ) -> Result<ResolutionItem, String> {
        // Fold in every reverse-dependency constraint from the graph so
        // the fix cannot break currently-satisfied siblings. Conflicts
        // reported outside the graph (the fallback checker) contribute
        // their own constraints on top.
        let mut combined = SpecifierSet::new();
        for (_, specifiers) in map.reverse_dependencies(name) {
            combined.intersect_with(specifiers);
        }
        for conflict in bucket {
            combined.intersect_with(&conflict.required);
        }

        // conflicts from the fallback checker can name packages the tree
        // never surfaced; they still carry the installed version
        let current = map
            .installed_version(name)
            .cloned()
            .or_else(|| bucket.iter().find_map(|conflict| conflict.installed.clone()));
        let candidates = self
            .index
            .versions(name)
            .await
            .map_err(|err| format!("index unavailable: {}", err))?;
        if candidates.is_empty() {
            return Err("no published versions found".to_string());
        }

        let mut viable: Vec<Version> = candidates
            .into_iter()
            .filter(|candidate| combined.contains(candidate))
            .collect();
        if viable.is_empty() {
            return Err(format!("no published version satisfies '{}'", combined));
        }

        // Walk candidates from least disruptive; the first one with no
        // side effects is the ranking's optimum, so index traffic stays
        // bounded in the common case.
        viable.sort_by_key(|candidate| disruption_key(&current, candidate));
        let mut best: Option<(usize, Version)> = None;
        for candidate in viable {
            if cancel.is_cancelled() {
                return Err("cancelled".to_string());
            }
            let side_effects = self.side_effects(map, name, &candidate).await;
            if side_effects == 0 {
                best = Some((0, candidate));
                break;
            }
            if best
                .as_ref()
                .map_or(true, |(count, _)| side_effects < *count)
            {
                best = Some((side_effects, candidate));
            }
        }
        let (_, target) = best.ok_or_else(|| "no viable candidate".to_string())?;

        debug!(
            "selected {} {} -> {}",
            name,
            current
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "(absent)".to_string()),
            target
        );
        Ok(ResolutionItem {
            name: name.to_string(),
            current,
            target: Some(target),
            satisfies: bucket.to_vec(),
        })
    }

    /// Over-approximate the new conflicts installing `candidate` would
    /// cause by checking its own declared requirements against what is
    /// installed. Requirements gated by an environment marker are
    /// conditional and not counted.
    async fn side_effects(&self, map: &DependencyMap, name: &str, candidate: &Version) -> usize {
        let requires = match self.index.requires(name, candidate).await {
            Ok(lines) => lines,
            Err(err) => {
                warn!(
                    "could not inspect requirements of {}=={}: {}",
                    name, candidate, err
                );
                return 0;
            }
        };

        let mut count = 0;
        for line in &requires {
            let Ok(requirement) = Requirement::parse(line) else {
                debug!("ignoring unparseable requirement '{}'", line);
                continue;
            };
            if requirement.marker.is_some() {
                continue;
            }
            match map.installed_version(&requirement.name) {
                None => count += 1,
                Some(installed) => {
                    if !requirement.specifiers.satisfied_by(installed) {
                        count += 1;
                    }
                }
            }
        }
        count
    }

    /// Validation sweep: re-detect with installed versions virtually
    /// replaced by the plan's targets and demote any item that would
    /// introduce a conflict that did not exist before.
    fn validate(
        &self,
        map: &DependencyMap,
        conflicts: &[Conflict],
        items: Vec<ResolutionItem>,
        plan: &mut Plan,
    ) {
        let overrides: BTreeMap<String, Version> = items
            .iter()
            .filter_map(|item| item.target.clone().map(|target| (item.name.clone(), target)))
            .collect();
        let known: BTreeSet<(String, String)> = conflicts
            .iter()
            .map(|conflict| (conflict.parent.clone(), conflict.dependency.clone()))
            .collect();

        let mut demoted = BTreeSet::new();
        for conflict in detect_with_overrides(map, &overrides) {
            if known.contains(&(conflict.parent.clone(), conflict.dependency.clone())) {
                continue;
            }
            if overrides.contains_key(&conflict.dependency) {
                demoted.insert(conflict.dependency.clone());
            }
        }

        for item in items {
            if demoted.contains(&item.name) {
                warn!(
                    "dropping {}: the selected version would break other packages",
                    item.name
                );
                plan.unsolvable.push(Unsolvable {
                    name: item.name.clone(),
                    reason: "selected version would introduce new conflicts".to_string(),
                    conflicts: item.satisfies,
                });
            } else {
                plan.items.push(item);
            }
        }
    }
}

/// Distance-based ranking key: fewest release-segment changes first,
/// upgrades before downgrades among equals, newest last to settle ties.
fn disruption_key(
    current: &Option<InstalledVersion>,
    candidate: &Version,
) -> (u64, bool, Reverse<Version>) {
    let installed = current.as_ref().and_then(InstalledVersion::version);
    let distance = match installed {
        Some(installed) => change_distance(installed, candidate),
        None => u64::MAX,
    };
    let upgrade = installed.map_or(true, |installed| candidate > installed);
    (distance, !upgrade, Reverse(candidate.clone()))
}

/// Patch changes beat minor changes beat major changes.
fn change_distance(current: &Version, candidate: &Version) -> u64 {
    let major = current.release_component(0).abs_diff(candidate.release_component(0));
    let minor = current.release_component(1).abs_diff(candidate.release_component(1));
    let patch = current.release_component(2).abs_diff(candidate.release_component(2));
    major
        .saturating_mul(1_000_000)
        .saturating_add(minor.saturating_mul(1_000))
        .saturating_add(patch)
}

/// Topologically order plan items so a package installs after any planned
/// package it depends on. Cycles fall back to name order.
fn order_items(map: &DependencyMap, items: Vec<ResolutionItem>) -> Vec<ResolutionItem> {
    let planned: BTreeSet<String> = items.iter().map(|item| item.name.clone()).collect();
    let mut pending: BTreeMap<String, ResolutionItem> = items
        .into_iter()
        .map(|item| (item.name.clone(), item))
        .collect();
    let dependencies: BTreeMap<String, BTreeSet<String>> = pending
        .keys()
        .map(|name| {
            let wanted = map
                .get(name)
                .map(|node| {
                    node.dependencies()
                        .keys()
                        .filter(|dependency| planned.contains(*dependency) && *dependency != name)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            (name.clone(), wanted)
        })
        .collect();

    let mut ordered = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready = dependencies
            .iter()
            .filter(|(name, wanted)| {
                pending.contains_key(*name)
                    && wanted.iter().all(|dependency| !pending.contains_key(dependency))
            })
            .map(|(name, _)| name.clone())
            .next();
        // no ready item means a dependency cycle; take the first by name
        let next = match ready.or_else(|| pending.keys().next().cloned()) {
            Some(name) => name,
            None => break,
        };
        if let Some(item) = pending.remove(&next) {
            ordered.push(item);
        }
    }
    ordered
}
