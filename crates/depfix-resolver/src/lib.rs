//! Conflict resolution for the depfix dependency engine.
//!
//! This crate provides the package index client (with request throttling
//! and caching) and the resolver that turns detected conflicts into a
//! minimally disruptive upgrade plan.

mod cache;
mod pypi;
mod resolver;
mod source;

pub use cache::VersionCache;
pub use pypi::PyPIClient;
pub use resolver::ConflictResolver;
pub use source::PackageIndex;

use depfix_core::{DepfixConfig, DepfixResult};

/// Create the default index client for a configuration.
pub fn create_index(config: &DepfixConfig) -> DepfixResult<PyPIClient> {
    PyPIClient::new(config)
}
