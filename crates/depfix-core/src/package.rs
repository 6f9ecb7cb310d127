use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::specifier::SpecifierSet;
use crate::version::InstalledVersion;

/// Normalize a distribution name: lowercase, with runs of `-`, `_` and
/// `.` collapsed to a single `-`.
pub fn normalize_name(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len());
    let mut pending_separator = false;
    for ch in name.trim().chars() {
        if matches!(ch, '-' | '_' | '.') {
            pending_separator = !normalized.is_empty();
            continue;
        }
        if pending_separator {
            normalized.push('-');
            pending_separator = false;
        }
        normalized.push(ch.to_ascii_lowercase());
    }
    normalized
}

/// One installed distribution and its declared dependency constraints.
///
/// Dependency edges are name-keyed; the owning [`DependencyMap`] resolves
/// them, so cycles need no special handling and cloning stays trivial.
#[derive(Debug, Clone)]
pub struct PackageNode {
    name: String,
    installed: InstalledVersion,
    dependencies: BTreeMap<String, SpecifierSet>,
}

impl PackageNode {
    /// Create a node; the name is normalized.
    pub fn new(name: impl Into<String>, installed: InstalledVersion) -> Self {
        Self {
            name: normalize_name(&name.into()),
            installed,
            dependencies: BTreeMap::new(),
        }
    }

    /// Get the normalized package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the installed version.
    pub fn installed(&self) -> &InstalledVersion {
        &self.installed
    }

    /// Get the dependency constraints, keyed by normalized name.
    pub fn dependencies(&self) -> &BTreeMap<String, SpecifierSet> {
        &self.dependencies
    }

    /// Record a dependency edge. A duplicate edge intersects with the
    /// existing constraint.
    pub fn add_dependency(&mut self, dependency: &str, specifiers: SpecifierSet) {
        match self.dependencies.entry(normalize_name(dependency)) {
            Entry::Occupied(mut entry) => entry.get_mut().intersect_with(&specifiers),
            Entry::Vacant(entry) => {
                entry.insert(specifiers);
            }
        }
    }

    fn merge_from(&mut self, other: PackageNode) {
        // the first reported version wins, unless none was reported yet
        if self.installed.is_unset() && !other.installed.is_unset() {
            self.installed = other.installed;
        }
        for (dependency, specifiers) in other.dependencies {
            self.add_dependency(&dependency, specifiers);
        }
    }
}

/// The normalized dependency graph of an environment, keyed by package
/// name. Iteration is always in name order.
#[derive(Debug, Clone, Default)]
pub struct DependencyMap {
    nodes: BTreeMap<String, PackageNode>,
}

impl DependencyMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, merging with any existing node of the same name:
    /// the first installed version seen is retained and dependency
    /// entries are unioned.
    pub fn insert(&mut self, node: PackageNode) {
        match self.nodes.entry(node.name.clone()) {
            Entry::Occupied(mut entry) => entry.get_mut().merge_from(node),
            Entry::Vacant(entry) => {
                entry.insert(node);
            }
        }
    }

    /// Look up a node by (raw or normalized) name.
    pub fn get(&self, name: &str) -> Option<&PackageNode> {
        self.nodes.get(&normalize_name(name))
    }

    /// Mutable lookup by (raw or normalized) name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut PackageNode> {
        self.nodes.get_mut(&normalize_name(name))
    }

    /// Whether a package is present.
    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(&normalize_name(name))
    }

    /// Installed version of a package, if present.
    pub fn installed_version(&self, name: &str) -> Option<&InstalledVersion> {
        self.get(name).map(PackageNode::installed)
    }

    /// Iterate nodes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PackageNode)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every (parent, constraint) edge pointing at the given package,
    /// in parent-name order.
    pub fn reverse_dependencies(&self, name: &str) -> Vec<(&str, &SpecifierSet)> {
        let needle = normalize_name(name);
        self.nodes
            .values()
            .filter_map(|node| {
                node.dependencies
                    .get(&needle)
                    .map(|specifiers| (node.name.as_str(), specifiers))
            })
            .collect()
    }
}
