use std::sync::Mutex;

use async_trait::async_trait;

use depfix_core::{
    CancelToken, CommandOutput, DepfixResult, InstalledVersion, PackageManager, Plan,
    ResolutionItem, Version,
};
use depfix_pip::{ItemStatus, PlanExecutor};

/// Records invocations instead of touching anything; names listed in
/// `fail_install` make the install step exit non-zero.
#[derive(Default)]
struct MockManager {
    calls: Mutex<Vec<String>>,
    fail_install: Vec<String>,
}

impl MockManager {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PackageManager for MockManager {
    async fn uninstall(&self, name: &str) -> DepfixResult<CommandOutput> {
        self.calls.lock().unwrap().push(format!("uninstall {}", name));
        Ok(CommandOutput {
            code: 0,
            output: String::new(),
        })
    }

    async fn install(&self, name: &str, version: &Version) -> DepfixResult<CommandOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("install {}=={}", name, version));
        if self.fail_install.iter().any(|failing| failing == name) {
            return Ok(CommandOutput {
                code: 1,
                output: "boom".to_string(),
            });
        }
        Ok(CommandOutput {
            code: 0,
            output: String::new(),
        })
    }

    async fn list_installed(&self) -> DepfixResult<Vec<(String, String)>> {
        Ok(Vec::new())
    }
}

fn item(name: &str, current: Option<&str>, target: Option<&str>) -> ResolutionItem {
    ResolutionItem {
        name: name.to_string(),
        current: current.map(InstalledVersion::parse),
        target: target.map(|text| Version::parse(text).unwrap()),
        satisfies: Vec::new(),
    }
}

fn plan(items: Vec<ResolutionItem>) -> Plan {
    Plan {
        items,
        unsolvable: Vec::new(),
    }
}

#[tokio::test]
async fn test_items_apply_in_order_with_uninstall_then_install() {
    let manager = MockManager::default();
    let executor = PlanExecutor::new(&manager);
    let plan = plan(vec![
        item("urllib3", Some("2.2.0"), Some("1.26.18")),
        item("requests", Some("2.26.0"), Some("2.28.0")),
    ]);

    let report = executor.execute(&plan, &CancelToken::new()).await;
    assert!(report.success());
    assert_eq!(report.applied_count(), 2);
    assert_eq!(
        manager.calls(),
        vec![
            "uninstall urllib3",
            "install urllib3==1.26.18",
            "uninstall requests",
            "install requests==2.28.0",
        ]
    );
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let manager = MockManager::default();
    let executor = PlanExecutor::new(&manager).dry_run(true);
    let plan = plan(vec![item("requests", Some("2.26.0"), Some("2.28.0"))]);

    let report = executor.execute(&plan, &CancelToken::new()).await;
    assert!(report.success());
    assert!(manager.calls().is_empty());
    assert_eq!(report.results[0].status, ItemStatus::WouldApply);
}

#[tokio::test]
async fn test_failures_are_recorded_and_execution_continues() {
    let manager = MockManager {
        fail_install: vec!["urllib3".to_string()],
        ..MockManager::default()
    };
    let executor = PlanExecutor::new(&manager);
    let plan = plan(vec![
        item("urllib3", Some("2.2.0"), Some("1.26.18")),
        item("requests", Some("2.26.0"), Some("2.28.0")),
    ]);

    let report = executor.execute(&plan, &CancelToken::new()).await;
    assert!(!report.success());
    assert_eq!(report.results[0].status, ItemStatus::Failed);
    assert!(report.results[0].detail.as_ref().unwrap().contains("boom"));
    // the second item still ran
    assert_eq!(report.results[1].status, ItemStatus::Applied);
}

#[tokio::test]
async fn test_cancellation_skips_remaining_items() {
    let manager = MockManager::default();
    let executor = PlanExecutor::new(&manager);
    let cancel = CancelToken::new();
    cancel.cancel();
    let plan = plan(vec![item("requests", Some("2.26.0"), Some("2.28.0"))]);

    let report = executor.execute(&plan, &cancel).await;
    assert!(report.cancelled);
    assert_eq!(report.results[0].status, ItemStatus::Skipped);
    assert!(manager.calls().is_empty());
}

#[tokio::test]
async fn test_fresh_installs_skip_uninstall_and_removals_skip_install() {
    let manager = MockManager::default();
    let executor = PlanExecutor::new(&manager);
    let plan = plan(vec![
        item("newcomer", None, Some("1.0")),
        item("leftover", Some("0.9"), None),
    ]);

    let report = executor.execute(&plan, &CancelToken::new()).await;
    assert!(report.success());
    assert_eq!(
        manager.calls(),
        vec!["install newcomer==1.0", "uninstall leftover"]
    );
}
