use depfix_core::{build_dependency_map, LockFile, LOCK_SCHEMA_VERSION};
use serde_json::json;

fn sample_map() -> depfix_core::DependencyMap {
    let tree = json!([
        {
            "package": {"key": "Web_App", "installed_version": "1.0"},
            "dependencies": [
                {
                    "package": {"key": "requests", "installed_version": "2.26.0"},
                    "required_version": ">=2.25,<3",
                    "dependencies": []
                }
            ]
        },
        {"key": "aiohttp", "installed_version": "3.9.1", "dependencies": []}
    ]);
    build_dependency_map(&tree)
}

#[test]
fn test_capture_is_sorted_and_canonical() {
    let lock = LockFile::capture(&sample_map());
    assert_eq!(lock.schema_version, LOCK_SCHEMA_VERSION);

    let names: Vec<&str> = lock.entries.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, vec!["aiohttp", "requests", "web-app"]);

    let web_app = &lock.entries[2];
    assert_eq!(web_app.dependencies["requests"], ">=2.25,<3");

    let text = lock.to_canonical_json().unwrap();
    assert!(text.ends_with('\n'));
    assert!(!text.contains('\r'));
    // schema field order is fixed
    let schema_at = text.find("\"schema_version\"").unwrap();
    let generated_at = text.find("\"generated_at\"").unwrap();
    let entries_at = text.find("\"entries\"").unwrap();
    assert!(schema_at < generated_at && generated_at < entries_at);
}

#[tokio::test]
async fn test_write_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("requirements.lock.json");

    let lock = LockFile::capture(&sample_map());
    lock.write(&path).await.unwrap();

    let reloaded = LockFile::read(&path).await.unwrap();
    assert_eq!(reloaded.schema_version, lock.schema_version);
    assert_eq!(reloaded.entries, lock.entries);
}

#[test]
fn test_restore_is_idempotent_on_a_matching_environment() {
    let map = sample_map();
    let lock = LockFile::capture(&map);
    let plan = lock.restore_plan(&map, true);
    assert!(plan.items.is_empty());
    assert!(plan.fully_resolved());
}

#[test]
fn test_restore_computes_the_delta() {
    let map = sample_map();
    let lock = LockFile::capture(&map);

    // the environment drifted: requests changed, aiohttp disappeared,
    // and an unlocked package showed up
    let drifted = build_dependency_map(&json!([
        {"key": "web-app", "installed_version": "1.0", "dependencies": []},
        {"key": "requests", "installed_version": "2.32.5", "dependencies": []},
        {"key": "interloper", "installed_version": "0.1", "dependencies": []}
    ]));

    let plan = lock.restore_plan(&drifted, false);
    let names: Vec<&str> = plan.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["aiohttp", "requests"]);
    assert_eq!(plan.items[0].current, None);
    assert_eq!(plan.items[0].target.as_ref().unwrap().to_string(), "3.9.1");
    assert_eq!(plan.items[1].target.as_ref().unwrap().to_string(), "2.26.0");

    // uninstalls only when asked
    let plan = lock.restore_plan(&drifted, true);
    let removal = plan.items.iter().find(|item| item.name == "interloper").unwrap();
    assert!(removal.target.is_none());
    assert!(removal.current.is_some());
}
