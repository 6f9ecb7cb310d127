pub mod fix;
pub mod lock;
pub mod outdated;
pub mod restore;
pub mod scan;

use tracing::warn;

use depfix_core::{parse_dependency_tree, Conflict, DependencyMap, DepfixConfig, DepfixResult};
use depfix_pip::PipClient;

/// Snapshot the interpreter's environment as a dependency graph.
pub(crate) async fn load_environment(
    config: &DepfixConfig,
) -> DepfixResult<(PipClient, DependencyMap)> {
    let pip = PipClient::new(&config.python);
    let tree = pip.dependency_tree().await?;
    let map = parse_dependency_tree(&tree)?;
    Ok((pip, map))
}

/// Detect conflicts from the graph, falling back to pip's own checker
/// when the tree shows nothing wrong.
pub(crate) async fn detect_all(pip: &PipClient, map: &DependencyMap) -> Vec<Conflict> {
    let conflicts = depfix_core::detect_conflicts(map);
    if !conflicts.is_empty() {
        return conflicts;
    }
    match pip.check().await {
        Ok(found) => found,
        Err(err) => {
            warn!("pip check unavailable: {}", err);
            Vec::new()
        }
    }
}
