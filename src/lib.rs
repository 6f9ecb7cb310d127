//! depfix — dependency conflict diagnostics and repair for Python
//! environments.
//!
//! This crate ties together the core graph model, the index-backed
//! resolver, and the pip adapter, and exposes the command-line driver.

pub use depfix_core as core;
pub use depfix_pip as pip;
pub use depfix_resolver as resolver;

/// Version of the depfix system
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
