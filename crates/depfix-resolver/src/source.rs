use async_trait::async_trait;

use depfix_core::{DepfixResult, Version};

/// Interface to a package index (PyPI or a compatible mirror).
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Released versions for a package, newest first. An unknown package
    /// yields an empty list; only transport failures are errors.
    async fn versions(&self, name: &str) -> DepfixResult<Vec<Version>>;

    /// Raw requirement strings declared by an exact release.
    async fn requires(&self, name: &str, version: &Version) -> DepfixResult<Vec<String>>;
}
