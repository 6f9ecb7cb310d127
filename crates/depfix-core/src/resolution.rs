use serde::Serialize;

use crate::conflict::Conflict;
use crate::version::{InstalledVersion, Version};

/// One version change in a resolution plan.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionItem {
    /// Normalized package name.
    pub name: String,
    /// Installed version before the change, when the package is present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<InstalledVersion>,
    /// Exact version to install. `None` removes the package; only
    /// restore produces that form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Version>,
    /// The conflicts this change settles.
    pub satisfies: Vec<Conflict>,
}

/// A conflicting package the resolver could not settle.
#[derive(Debug, Clone, Serialize)]
pub struct Unsolvable {
    /// Normalized package name.
    pub name: String,
    /// Why no candidate was acceptable.
    pub reason: String,
    /// The conflicts left standing.
    pub conflicts: Vec<Conflict>,
}

/// An ordered sequence of changes plus whatever could not be resolved.
/// Items apply in order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub items: Vec<ResolutionItem>,
    pub unsolvable: Vec<Unsolvable>,
}

impl Plan {
    /// Whether the plan changes nothing and leaves nothing unresolved.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.unsolvable.is_empty()
    }

    /// Whether every detected conflict is covered by an item.
    pub fn fully_resolved(&self) -> bool {
        self.unsolvable.is_empty()
    }
}
