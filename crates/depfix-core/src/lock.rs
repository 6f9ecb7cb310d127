use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::error::{DepfixError, DepfixResult};
use crate::package::DependencyMap;
use crate::resolution::{Plan, ResolutionItem};
use crate::version::Version;

/// Current lock document schema.
pub const LOCK_SCHEMA_VERSION: u32 = 1;

/// Default lock file name.
pub const DEFAULT_LOCK_FILE: &str = "requirements.lock.json";

/// One pinned distribution in a lock document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Normalized name.
    pub name: String,
    /// Exact installed version, verbatim.
    pub version: String,
    /// Raw specifier strings of the outbound dependency edges, keyed by
    /// normalized name. Sorted by construction.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

/// Canonical snapshot of an installed environment, sufficient to
/// reconstruct it deterministically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockFile {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    /// Entries in ascending name order.
    pub entries: Vec<LockEntry>,
}

impl LockFile {
    /// Snapshot the given graph. Entries come out sorted because the map
    /// iterates in name order.
    pub fn capture(map: &DependencyMap) -> Self {
        let entries = map
            .iter()
            .map(|(name, node)| LockEntry {
                name: name.clone(),
                version: node.installed().to_string(),
                dependencies: node
                    .dependencies()
                    .iter()
                    .map(|(dependency, specifiers)| (dependency.clone(), specifiers.to_string()))
                    .collect(),
            })
            .collect();
        Self {
            schema_version: LOCK_SCHEMA_VERSION,
            generated_at: Utc::now(),
            entries,
        }
    }

    /// Serialize to the canonical on-disk form: fixed schema field
    /// order, sorted map keys, LF line endings, trailing newline.
    pub fn to_canonical_json(&self) -> DepfixResult<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Write the canonical form to disk.
    pub async fn write(&self, path: &Path) -> DepfixResult<()> {
        let text = self.to_canonical_json()?;
        fs::write(path, text).await.map_err(|err| {
            DepfixError::lock(format!("failed to write {}: {}", path.display(), err))
        })?;
        info!("locked {} packages to {}", self.entries.len(), path.display());
        Ok(())
    }

    /// Read and validate a lock document.
    pub async fn read(path: &Path) -> DepfixResult<Self> {
        let text = fs::read_to_string(path).await.map_err(|err| {
            DepfixError::lock(format!("failed to read {}: {}", path.display(), err))
        })?;
        let lock: LockFile = serde_json::from_str(&text).map_err(|err| {
            DepfixError::lock(format!("invalid lock file {}: {}", path.display(), err))
        })?;
        if lock.schema_version != LOCK_SCHEMA_VERSION {
            return Err(DepfixError::lock(format!(
                "unsupported lock schema version {} in {}",
                lock.schema_version,
                path.display()
            )));
        }
        Ok(lock)
    }

    /// Delta between this lock and the current environment, as a plan
    /// the executor can apply. Restoring an already-matching environment
    /// yields an empty plan.
    pub fn restore_plan(&self, current: &DependencyMap, remove_missing: bool) -> Plan {
        let mut plan = Plan::default();
        let mut entries: Vec<&LockEntry> = self.entries.iter().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let mut locked_names: BTreeSet<&str> = BTreeSet::new();
        for entry in entries {
            locked_names.insert(entry.name.as_str());
            let target = match Version::parse(&entry.version) {
                Ok(version) => version,
                Err(err) => {
                    warn!(
                        "skipping lock entry '{}': unusable version '{}' ({})",
                        entry.name, entry.version, err
                    );
                    continue;
                }
            };
            match current.installed_version(&entry.name) {
                Some(installed) => {
                    let matches = match installed.version() {
                        Some(version) => *version == target,
                        None => false,
                    };
                    if !matches {
                        plan.items.push(ResolutionItem {
                            name: entry.name.clone(),
                            current: Some(installed.clone()),
                            target: Some(target),
                            satisfies: Vec::new(),
                        });
                    }
                }
                None => plan.items.push(ResolutionItem {
                    name: entry.name.clone(),
                    current: None,
                    target: Some(target),
                    satisfies: Vec::new(),
                }),
            }
        }

        if remove_missing {
            for (name, node) in current.iter() {
                if !locked_names.contains(name.as_str()) {
                    plan.items.push(ResolutionItem {
                        name: name.clone(),
                        current: Some(node.installed().clone()),
                        target: None,
                        satisfies: Vec::new(),
                    });
                }
            }
        }

        plan
    }
}
