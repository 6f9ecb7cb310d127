//! Core types and algorithms for the depfix dependency conflict engine.
//!
//! This crate provides the dependency graph model, the PEP 440 version
//! and specifier algebra, conflict detection, plan and lock documents,
//! and report rendering. Everything here is pure and deterministic; the
//! index client and the package-manager adapter live in sibling crates.

use async_trait::async_trait;

pub mod cancel;
pub mod config;
pub mod conflict;
pub mod error;
pub mod lock;
pub mod package;
pub mod report;
pub mod requirement;
pub mod resolution;
pub mod specifier;
pub mod tree;
pub mod version;

// Re-export commonly used types
pub use crate::cancel::CancelToken;
pub use crate::config::{DepfixConfig, DEFAULT_INDEX_URL};
pub use crate::conflict::{detect_conflicts, detect_with_overrides, Conflict, ConflictKind};
pub use crate::error::{DepfixError, DepfixResult};
pub use crate::lock::{LockEntry, LockFile, DEFAULT_LOCK_FILE, LOCK_SCHEMA_VERSION};
pub use crate::package::{normalize_name, DependencyMap, PackageNode};
pub use crate::requirement::Requirement;
pub use crate::resolution::{Plan, ResolutionItem, Unsolvable};
pub use crate::specifier::{Operator, Specifier, SpecifierSet};
pub use crate::tree::{build_dependency_map, parse_dependency_tree};
pub use crate::version::{InstalledVersion, Version};

/// Captured outcome of one package-manager subprocess: exit code plus
/// the combined stdout/stderr stream.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub code: i32,
    pub output: String,
}

impl CommandOutput {
    /// Whether the subprocess exited cleanly.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Subprocess seam to the external package manager. The executor only
/// talks to this trait, so tests can substitute an in-memory fake.
#[async_trait]
pub trait PackageManager: Send + Sync {
    /// Remove an installed distribution.
    async fn uninstall(&self, name: &str) -> DepfixResult<CommandOutput>;

    /// Install an exact version of a distribution.
    async fn install(&self, name: &str, version: &Version) -> DepfixResult<CommandOutput>;

    /// List installed distributions as `(name, version)` pairs.
    async fn list_installed(&self) -> DepfixResult<Vec<(String, String)>>;
}

#[async_trait]
impl<M: PackageManager + ?Sized> PackageManager for &M {
    async fn uninstall(&self, name: &str) -> DepfixResult<CommandOutput> {
        (**self).uninstall(name).await
    }

    async fn install(&self, name: &str, version: &Version) -> DepfixResult<CommandOutput> {
        (**self).install(name, version).await
    }

    async fn list_installed(&self) -> DepfixResult<Vec<(String, String)>> {
        (**self).list_installed().await
    }
}
