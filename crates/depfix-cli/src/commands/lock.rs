use std::path::PathBuf;

use depfix_core::{DepfixConfig, DepfixResult, LockFile};

/// Execute the lock command.
pub async fn execute(config: &DepfixConfig, output: Option<PathBuf>) -> DepfixResult<i32> {
    let (_pip, map) = super::load_environment(config).await?;
    let lock = LockFile::capture(&map);
    let path = output.unwrap_or_else(|| config.lock_file.clone());
    lock.write(&path).await?;
    println!("[OK] Environment locked to {}", path.display());
    Ok(crate::EXIT_OK)
}
