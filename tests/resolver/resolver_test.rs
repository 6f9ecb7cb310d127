use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::json;

use depfix_core::{
    build_dependency_map, detect_conflicts, detect_with_overrides, CancelToken, DependencyMap,
    DepfixError, DepfixResult, Version,
};
use depfix_resolver::{ConflictResolver, PackageIndex};

/// In-memory index for deterministic resolver tests.
#[derive(Default)]
struct FakeIndex {
    versions: BTreeMap<String, Vec<&'static str>>,
    requires: BTreeMap<(String, String), Vec<&'static str>>,
    unreachable: bool,
}

impl FakeIndex {
    fn with_versions(mut self, name: &str, versions: &[&'static str]) -> Self {
        self.versions.insert(name.to_string(), versions.to_vec());
        self
    }

    fn with_requires(mut self, name: &str, version: &str, requires: &[&'static str]) -> Self {
        self.requires
            .insert((name.to_string(), version.to_string()), requires.to_vec());
        self
    }
}

#[async_trait]
impl PackageIndex for FakeIndex {
    async fn versions(&self, name: &str) -> DepfixResult<Vec<Version>> {
        if self.unreachable {
            return Err(DepfixError::network("connection refused".to_string()));
        }
        let mut versions: Vec<Version> = self
            .versions
            .get(name)
            .map(|listed| listed.iter().map(|text| Version::parse(text).unwrap()).collect())
            .unwrap_or_default();
        versions.sort();
        versions.reverse();
        Ok(versions)
    }

    async fn requires(&self, name: &str, version: &Version) -> DepfixResult<Vec<String>> {
        Ok(self
            .requires
            .get(&(name.to_string(), version.to_string()))
            .map(|listed| listed.iter().map(|line| line.to_string()).collect())
            .unwrap_or_default())
    }
}

fn environment(tree: serde_json::Value) -> DependencyMap {
    build_dependency_map(&tree)
}

#[tokio::test]
async fn test_single_upgrade_settles_two_parents() {
    let map = environment(json!([
        {
            "package": {"key": "alpha", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "requests", "installed_version": "2.26.0"}, "required_version": ">=2.28.0", "dependencies": []}
            ]
        },
        {
            "package": {"key": "beta", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "requests", "installed_version": "2.26.0"}, "required_version": ">=2.27", "dependencies": []}
            ]
        }
    ]));
    let conflicts = detect_conflicts(&map);
    assert_eq!(conflicts.len(), 2);

    let index =
        FakeIndex::default().with_versions("requests", &["2.26.0", "2.27.1", "2.28.0", "2.32.5"]);
    let resolver = ConflictResolver::new(index);
    let plan = resolver
        .resolve(&map, &conflicts, &CancelToken::new())
        .await
        .unwrap();

    assert!(plan.fully_resolved());
    assert_eq!(plan.items.len(), 1);
    let item = &plan.items[0];
    assert_eq!(item.name, "requests");
    assert_eq!(item.current.as_ref().unwrap().to_string(), "2.26.0");
    // 2.28.0 and 2.32.5 both satisfy; the closer one wins
    assert_eq!(item.target.as_ref().unwrap().to_string(), "2.28.0");
    assert_eq!(item.satisfies.len(), 2);

    // applying the plan leaves no conflicts behind
    let overrides: BTreeMap<String, Version> = plan
        .items
        .iter()
        .map(|item| (item.name.clone(), item.target.clone().unwrap()))
        .collect();
    assert!(detect_with_overrides(&map, &overrides).is_empty());
}

#[tokio::test]
async fn test_contradictory_constraints_are_unsolvable() {
    let map = environment(json!([
        {
            "package": {"key": "x", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "pkg", "installed_version": "2.0"}, "required_version": "<2", "dependencies": []}
            ]
        },
        {
            "package": {"key": "y", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "pkg", "installed_version": "2.0"}, "required_version": ">=2", "dependencies": []}
            ]
        }
    ]));
    let conflicts = detect_conflicts(&map);
    assert_eq!(conflicts.len(), 1);

    let index = FakeIndex::default().with_versions("pkg", &["1.9", "2.0"]);
    let resolver = ConflictResolver::new(index);
    let plan = resolver
        .resolve(&map, &conflicts, &CancelToken::new())
        .await
        .unwrap();

    assert!(plan.items.is_empty());
    assert_eq!(plan.unsolvable.len(), 1);
    assert_eq!(plan.unsolvable[0].name, "pkg");
}

#[tokio::test]
async fn test_missing_dependency_is_out_of_scope() {
    // alpha declares a dependency on a package that never made it into
    // the environment
    let mut map = environment(json!([
        {"key": "alpha", "installed_version": "1.0", "dependencies": []}
    ]));
    map.get_mut("alpha")
        .unwrap()
        .add_dependency("ghost", depfix_core::SpecifierSet::parse(">=1.0"));

    let conflicts = detect_conflicts(&map);
    assert_eq!(conflicts.len(), 1);

    let index = FakeIndex::default().with_versions("ghost", &["1.0"]);
    let resolver = ConflictResolver::new(index);
    let plan = resolver
        .resolve(&map, &conflicts, &CancelToken::new())
        .await
        .unwrap();

    assert!(plan.items.is_empty());
    assert_eq!(plan.unsolvable.len(), 1);
    assert!(plan.unsolvable[0].reason.contains("out of scope"));
}

#[tokio::test]
async fn test_satisfied_siblings_constrain_the_fix() {
    // gamma is happy with shared 1.0 but capped below 2; the fix for
    // alpha must not break it
    let map = environment(json!([
        {
            "package": {"key": "alpha", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "shared", "installed_version": "1.0"}, "required_version": ">=1.2", "dependencies": []}
            ]
        },
        {
            "package": {"key": "gamma", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "shared", "installed_version": "1.0"}, "required_version": "<1.5", "dependencies": []}
            ]
        }
    ]));
    let conflicts = detect_conflicts(&map);
    assert_eq!(conflicts.len(), 1);

    let index = FakeIndex::default().with_versions("shared", &["1.0", "1.4", "2.0"]);
    let resolver = ConflictResolver::new(index);
    let plan = resolver
        .resolve(&map, &conflicts, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(plan.items.len(), 1);
    assert_eq!(plan.items[0].target.as_ref().unwrap().to_string(), "1.4");
}

#[tokio::test]
async fn test_candidates_with_side_effects_are_avoided() {
    let map = environment(json!([
        {
            "package": {"key": "parent", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "tool", "installed_version": "1.0"}, "required_version": ">=1.1", "dependencies": []}
            ]
        },
        {"key": "helper", "installed_version": "1.0", "dependencies": []}
    ]));
    let conflicts = detect_conflicts(&map);

    // 1.1 is closest but would demand a helper nobody has; 1.2 is clean
    let index = FakeIndex::default()
        .with_versions("tool", &["1.0", "1.1", "1.2"])
        .with_requires("tool", "1.1", &["helper>=5.0"])
        .with_requires("tool", "1.2", &["helper>=1.0"]);
    let resolver = ConflictResolver::new(index);
    let plan = resolver
        .resolve(&map, &conflicts, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(plan.items.len(), 1);
    assert_eq!(plan.items[0].target.as_ref().unwrap().to_string(), "1.2");
}

#[tokio::test]
async fn test_marker_gated_requirements_are_not_side_effects() {
    let map = environment(json!([
        {
            "package": {"key": "parent", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "tool", "installed_version": "1.0"}, "required_version": ">=1.1", "dependencies": []}
            ]
        }
    ]));
    let conflicts = detect_conflicts(&map);

    let index = FakeIndex::default()
        .with_versions("tool", &["1.1"])
        .with_requires("tool", "1.1", &["windows-only>=1.0 ; sys_platform == 'win32'"]);
    let resolver = ConflictResolver::new(index);
    let plan = resolver
        .resolve(&map, &conflicts, &CancelToken::new())
        .await
        .unwrap();

    assert_eq!(plan.items.len(), 1);
    assert_eq!(plan.items[0].target.as_ref().unwrap().to_string(), "1.1");
}

#[tokio::test]
async fn test_plan_is_topologically_ordered() {
    // zeta depends on alpha; both get replaced, so alpha must apply first
    let map = environment(json!([
        {
            "package": {"key": "root", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "zeta", "installed_version": "1.0"}, "required_version": ">=2.0", "dependencies": [
                    {"package": {"key": "alpha", "installed_version": "1.0"}, "required_version": ">=1.0", "dependencies": []}
                ]},
                {"package": {"key": "alpha", "installed_version": "1.0"}, "required_version": ">=2.0", "dependencies": []}
            ]
        }
    ]));
    let conflicts = detect_conflicts(&map);
    assert_eq!(conflicts.len(), 2);

    let index = FakeIndex::default()
        .with_versions("alpha", &["1.0", "2.0"])
        .with_versions("zeta", &["1.0", "2.0"]);
    let resolver = ConflictResolver::new(index);
    let plan = resolver
        .resolve(&map, &conflicts, &CancelToken::new())
        .await
        .unwrap();

    let names: Vec<&str> = plan.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "zeta"]);
}

#[tokio::test]
async fn test_unreachable_index_marks_buckets_unsolvable() {
    let map = environment(json!([
        {
            "package": {"key": "alpha", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "pkg", "installed_version": "1.0"}, "required_version": ">=2.0", "dependencies": []}
            ]
        }
    ]));
    let conflicts = detect_conflicts(&map);

    let index = FakeIndex {
        unreachable: true,
        ..FakeIndex::default()
    };
    let resolver = ConflictResolver::new(index);
    let plan = resolver
        .resolve(&map, &conflicts, &CancelToken::new())
        .await
        .unwrap();

    assert!(plan.items.is_empty());
    assert_eq!(plan.unsolvable.len(), 1);
    assert!(plan.unsolvable[0].reason.contains("index unavailable"));
}

#[tokio::test]
async fn test_cancellation_stops_resolution() {
    let map = environment(json!([
        {
            "package": {"key": "alpha", "installed_version": "1.0"},
            "dependencies": [
                {"package": {"key": "pkg", "installed_version": "1.0"}, "required_version": ">=2.0", "dependencies": []}
            ]
        }
    ]));
    let conflicts = detect_conflicts(&map);

    let cancel = CancelToken::new();
    cancel.cancel();
    let index = FakeIndex::default().with_versions("pkg", &["2.0"]);
    let resolver = ConflictResolver::new(index);
    let plan = resolver.resolve(&map, &conflicts, &cancel).await.unwrap();

    assert!(plan.items.is_empty());
    assert_eq!(plan.unsolvable.len(), 1);
    assert_eq!(plan.unsolvable[0].reason, "cancelled");
}
