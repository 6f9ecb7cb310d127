use tracing::{info, warn};

use depfix_core::{CancelToken, PackageManager, Plan, ResolutionItem};

/// Outcome of one plan item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemStatus {
    /// Uninstall/install sequence completed.
    Applied,
    /// Dry run; nothing was touched.
    WouldApply,
    /// A subprocess failed; later items still ran.
    Failed,
    /// Skipped because the run was cancelled.
    Skipped,
}

/// Per-item execution record.
#[derive(Debug, Clone)]
pub struct ItemResult {
    pub name: String,
    pub status: ItemStatus,
    /// Captured subprocess output for failures.
    pub detail: Option<String>,
}

/// What happened when a plan was applied.
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    pub results: Vec<ItemResult>,
    /// Whether the run was cut short by cancellation.
    pub cancelled: bool,
}

impl ExecutionReport {
    /// Whether every attempted item went through.
    pub fn success(&self) -> bool {
        self.results
            .iter()
            .all(|result| result.status != ItemStatus::Failed)
    }

    /// Number of items that were actually applied.
    pub fn applied_count(&self) -> usize {
        self.results
            .iter()
            .filter(|result| result.status == ItemStatus::Applied)
            .count()
    }
}

/// Applies a plan through the package manager, one item at a time, in
/// plan order. Failures are recorded and execution continues with the
/// remaining items.
pub struct PlanExecutor<M> {
    manager: M,
    dry_run: bool,
}

impl<M: PackageManager> PlanExecutor<M> {
    /// Create an executor over the given package manager.
    pub fn new(manager: M) -> Self {
        Self {
            manager,
            dry_run: false,
        }
    }

    /// Toggle dry-run mode: log intended invocations, touch nothing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply the plan. Cancellation is honored between items; skipped
    /// items are recorded so the caller sees partial progress.
    pub async fn execute(&self, plan: &Plan, cancel: &CancelToken) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        for item in &plan.items {
            if cancel.is_cancelled() {
                report.cancelled = true;
                report.results.push(ItemResult {
                    name: item.name.clone(),
                    status: ItemStatus::Skipped,
                    detail: Some("cancelled".to_string()),
                });
                continue;
            }
            report.results.push(self.apply(item).await);
        }
        report
    }

    async fn apply(&self, item: &ResolutionItem) -> ItemResult {
        if self.dry_run {
            match &item.target {
                Some(target) => info!(
                    "dry-run: would uninstall {} and install {}=={}",
                    item.name, item.name, target
                ),
                None => info!("dry-run: would uninstall {}", item.name),
            }
            return ItemResult {
                name: item.name.clone(),
                status: ItemStatus::WouldApply,
                detail: None,
            };
        }

        // uninstall first so pip cannot leave two versions side by side;
        // a fresh install has nothing to remove
        if item.current.is_some() {
            info!("uninstalling {}", item.name);
            match self.manager.uninstall(&item.name).await {
                Ok(output) if !output.success() => {
                    return self.failed(
                        item,
                        format!(
                            "uninstall exited with status {}: {}",
                            output.code,
                            output.output.trim()
                        ),
                    );
                }
                Err(err) => return self.failed(item, err.to_string()),
                Ok(_) => {}
            }
        }

        if let Some(target) = &item.target {
            info!("installing {}=={}", item.name, target);
            match self.manager.install(&item.name, target).await {
                Ok(output) if !output.success() => {
                    return self.failed(
                        item,
                        format!(
                            "install exited with status {}: {}",
                            output.code,
                            output.output.trim()
                        ),
                    );
                }
                Err(err) => return self.failed(item, err.to_string()),
                Ok(_) => {}
            }
        }

        ItemResult {
            name: item.name.clone(),
            status: ItemStatus::Applied,
            detail: None,
        }
    }

    fn failed(&self, item: &ResolutionItem, detail: String) -> ItemResult {
        warn!("failed to update {}: {}", item.name, detail);
        ItemResult {
            name: item.name.clone(),
            status: ItemStatus::Failed,
            detail: Some(detail),
        }
    }
}
