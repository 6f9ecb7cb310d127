use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::package::DependencyMap;
use crate::specifier::SpecifierSet;
use crate::version::{InstalledVersion, Version};

/// What kind of breakage a dependency edge exhibits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// The installed version does not satisfy the parent's constraint.
    VersionMismatch,
    /// The declared dependency is not installed at all.
    NotInstalled,
    /// The installed version string does not parse.
    UnparseableVersion,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::VersionMismatch => "version_mismatch",
            ConflictKind::NotInstalled => "not_installed",
            ConflictKind::UnparseableVersion => "unparseable_version",
        }
    }
}

impl fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One broken dependency edge.
#[derive(Debug, Clone, Serialize)]
pub struct Conflict {
    /// Package declaring the requirement.
    pub parent: String,
    /// Installed version of the parent.
    pub parent_version: InstalledVersion,
    /// The dependency the requirement names.
    pub dependency: String,
    /// Installed version of the dependency, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<InstalledVersion>,
    /// The constraint that is not met.
    pub required: SpecifierSet,
    pub kind: ConflictKind,
}

/// Walk every dependency edge and report the broken ones, sorted by
/// parent then dependency name so output is stable across runs.
pub fn detect_conflicts(map: &DependencyMap) -> Vec<Conflict> {
    detect_with_overrides(map, &BTreeMap::new())
}

/// Conflict detection with installed versions virtually replaced by
/// `overrides`. Used to validate a plan before anything is applied.
pub fn detect_with_overrides(
    map: &DependencyMap,
    overrides: &BTreeMap<String, Version>,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (parent, node) in map.iter() {
        let parent_version = effective_version(map, overrides, parent)
            .unwrap_or_else(|| node.installed().clone());
        for (dependency, required) in node.dependencies() {
            match effective_version(map, overrides, dependency) {
                None => conflicts.push(Conflict {
                    parent: parent.clone(),
                    parent_version: parent_version.clone(),
                    dependency: dependency.clone(),
                    installed: None,
                    required: required.clone(),
                    kind: ConflictKind::NotInstalled,
                }),
                // an installed version that does not parse is reported
                // even when the edge carries no usable constraint
                Some(installed @ InstalledVersion::Unknown(_)) => conflicts.push(Conflict {
                    parent: parent.clone(),
                    parent_version: parent_version.clone(),
                    dependency: dependency.clone(),
                    installed: Some(installed),
                    required: required.clone(),
                    kind: ConflictKind::UnparseableVersion,
                }),
                Some(InstalledVersion::Parsed(version)) => {
                    if !required.contains(&version) {
                        debug!(
                            "{} requires {}{} but {} is installed",
                            parent, dependency, required, version
                        );
                        conflicts.push(Conflict {
                            parent: parent.clone(),
                            parent_version: parent_version.clone(),
                            dependency: dependency.clone(),
                            installed: Some(InstalledVersion::Parsed(version)),
                            required: required.clone(),
                            kind: ConflictKind::VersionMismatch,
                        });
                    }
                }
            }
        }
    }
    conflicts
}

fn effective_version(
    map: &DependencyMap,
    overrides: &BTreeMap<String, Version>,
    name: &str,
) -> Option<InstalledVersion> {
    match overrides.get(name) {
        Some(version) => Some(InstalledVersion::Parsed(version.clone())),
        None => map.installed_version(name).cloned(),
    }
}
