use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use depfix_core::{DepfixResult, Version};

const CACHE_FILE_NAME: &str = "index-cache.json";
const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60); // 24 hours

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    versions: Vec<Version>,
    fetched_at: SystemTime,
}

/// On-disk cache of per-package version listings, keyed by normalized
/// name. One JSON document, loaded lazily, entries expire after a day.
#[derive(Debug)]
pub struct VersionCache {
    cache_dir: PathBuf,
    entries: HashMap<String, CacheEntry>,
    loaded: bool,
}

impl VersionCache {
    /// Create a cache rooted at the given directory.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            entries: HashMap::new(),
            loaded: false,
        }
    }

    async fn ensure_loaded(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        let path = self.cache_dir.join(CACHE_FILE_NAME);
        if let Ok(text) = fs::read_to_string(&path).await {
            match serde_json::from_str(&text) {
                Ok(entries) => self.entries = entries,
                Err(err) => debug!("discarding unreadable cache {}: {}", path.display(), err),
            }
        }
    }

    /// Fresh cached versions for a package, if any.
    pub async fn get(&mut self, name: &str) -> Option<Vec<Version>> {
        self.ensure_loaded().await;
        let entry = self.entries.get(name)?;
        let fresh = entry
            .fetched_at
            .elapsed()
            .map(|age| age < CACHE_TTL)
            .unwrap_or(false);
        fresh.then(|| entry.versions.clone())
    }

    /// Record a version listing and persist the cache.
    pub async fn store(&mut self, name: &str, versions: &[Version]) -> DepfixResult<()> {
        self.ensure_loaded().await;
        self.entries.insert(
            name.to_string(),
            CacheEntry {
                versions: versions.to_vec(),
                fetched_at: SystemTime::now(),
            },
        );
        fs::create_dir_all(&self.cache_dir).await?;
        let json = serde_json::to_string(&self.entries)?;
        fs::write(self.cache_dir.join(CACHE_FILE_NAME), json).await?;
        Ok(())
    }
}
