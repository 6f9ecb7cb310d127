//! pip subprocess adapter and plan executor for the depfix engine.
//!
//! The adapter shells out through a configured interpreter
//! (`python -m pip ...`, `python -m pipdeptree ...`); the executor
//! applies resolution plans through the [`depfix_core::PackageManager`]
//! seam so it can be exercised without a real environment.

mod executor;
mod pip;

pub use executor::{ExecutionReport, ItemResult, ItemStatus, PlanExecutor};
pub use pip::{parse_check_output, OutdatedPackage, PipClient};
