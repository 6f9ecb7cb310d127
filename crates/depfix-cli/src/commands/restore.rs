use std::path::PathBuf;

use tracing::info;

use depfix_core::{CancelToken, DepfixConfig, DepfixResult, LockFile};
use depfix_pip::PlanExecutor;

/// Execute the restore command: rebuild the environment pinned in a
/// lock file. Restoring an already-matching environment is a no-op.
pub async fn execute(
    config: &DepfixConfig,
    file: Option<PathBuf>,
    remove_missing: bool,
) -> DepfixResult<i32> {
    let path = file.unwrap_or_else(|| config.lock_file.clone());
    let lock = LockFile::read(&path).await?;
    let (pip, map) = super::load_environment(config).await?;

    let plan = lock.restore_plan(&map, remove_missing || config.remove_missing_on_restore);
    if plan.items.is_empty() {
        println!("[OK] Environment already matches {}", path.display());
        return Ok(crate::EXIT_OK);
    }

    info!("restoring {} packages from {}", plan.items.len(), path.display());
    let cancel = CancelToken::new();
    let outcome = PlanExecutor::new(pip).execute(&plan, &cancel).await;
    if outcome.success() {
        println!("[OK] Restored {} packages from {}", outcome.applied_count(), path.display());
        Ok(crate::EXIT_OK)
    } else {
        Ok(crate::EXIT_ERROR)
    }
}
