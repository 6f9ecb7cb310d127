//! Normalizer for the dependency tree enumerator's JSON output.
//!
//! The enumerator changed its JSON shape across major versions: newer
//! releases nest the package identity under a `package` object while
//! older ones keep it inline. Shape detection happens per element, so a
//! mixed document is fine. Malformed elements are skipped with a
//! warning; this pass never aborts.

use serde_json::Value;
use tracing::warn;

use crate::error::{DepfixError, DepfixResult};
use crate::package::{normalize_name, DependencyMap, PackageNode};
use crate::specifier::{SpecifierSet, ANY_MARKER};
use crate::version::InstalledVersion;

/// Parse the enumerator's JSON document into a [`DependencyMap`].
pub fn parse_dependency_tree(text: &str) -> DepfixResult<DependencyMap> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| DepfixError::parse(format!("invalid dependency tree JSON: {}", err)))?;
    Ok(build_dependency_map(&value))
}

/// Build a [`DependencyMap`] from an already-parsed enumerator document.
pub fn build_dependency_map(tree: &Value) -> DependencyMap {
    let mut map = DependencyMap::new();
    match tree.as_array() {
        Some(elements) => {
            for element in elements {
                process_element(&mut map, element);
            }
        }
        None => warn!("dependency tree root is not an array; producing an empty graph"),
    }
    map
}

/// Extract `(name, installed_version)` from either tree shape.
fn identity(value: &Value) -> Option<(&str, &str)> {
    let info = match value.get("package") {
        Some(package) if package.is_object() => package,
        _ => value,
    };
    let name = info
        .get("key")
        .or_else(|| info.get("package_name"))?
        .as_str()?;
    let version = info
        .get("installed_version")
        .and_then(Value::as_str)
        .unwrap_or("");
    Some((name, version))
}

fn process_element(map: &mut DependencyMap, element: &Value) {
    let Some((raw_name, raw_version)) = identity(element) else {
        warn!("skipping malformed tree element: {}", element);
        return;
    };
    let name = normalize_name(raw_name);
    if name.is_empty() {
        warn!("skipping tree element with empty package name");
        return;
    }
    map.insert(PackageNode::new(
        name.as_str(),
        InstalledVersion::parse(raw_version),
    ));

    let Some(dependencies) = element.get("dependencies").and_then(Value::as_array) else {
        return;
    };
    for dependency in dependencies {
        let Some((dep_raw, dep_version)) = identity(dependency) else {
            warn!("skipping malformed dependency entry under '{}'", name);
            continue;
        };
        let dep_name = normalize_name(dep_raw);
        if dep_name.is_empty() {
            continue;
        }

        // required constraint as reported by the enumerator; unbounded
        // edges arrive as the empty string or the `Any` marker and are
        // filtered before specifier construction
        let required = dependency
            .get("required_version")
            .and_then(Value::as_str)
            .or_else(|| dependency.get("version").and_then(Value::as_str))
            .unwrap_or("")
            .trim();
        if !required.is_empty() && required != ANY_MARKER {
            let specifiers = SpecifierSet::parse(required);
            if let Some(parent) = map.get_mut(&name) {
                parent.add_dependency(&dep_name, specifiers);
            }
        }

        // the dependency participates in the graph even when the edge is
        // unconstrained
        map.insert(PackageNode::new(
            dep_name.as_str(),
            InstalledVersion::parse(dep_version),
        ));
        process_element(map, dependency);
    }
}
