use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use depfix_core::{normalize_name, DepfixConfig, DepfixError, DepfixResult, Version};

use crate::cache::VersionCache;
use crate::source::PackageIndex;

/// JSON API client for a PyPI-compatible index.
///
/// Outbound requests are spaced by the configured minimum interval, and
/// results are cached in memory for the lifetime of the invocation. An
/// optional on-disk cache persists version listings across runs.
pub struct PyPIClient {
    client: Client,
    index_url: String,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
    versions_cache: RwLock<HashMap<String, Vec<Version>>>,
    requires_cache: RwLock<HashMap<(String, String), Vec<String>>>,
    disk_cache: Option<Mutex<VersionCache>>,
}

#[derive(Debug, Deserialize)]
struct ProjectDocument {
    #[serde(default)]
    releases: HashMap<String, Vec<ReleaseFile>>,
}

#[derive(Debug, Deserialize)]
struct ReleaseFile {
    #[serde(default)]
    yanked: bool,
}

#[derive(Debug, Deserialize)]
struct ReleaseDocument {
    info: ReleaseInfo,
}

#[derive(Debug, Deserialize)]
struct ReleaseInfo {
    #[serde(default)]
    requires_dist: Option<Vec<String>>,
}

impl PyPIClient {
    /// Create a client from the invocation configuration.
    pub fn new(config: &DepfixConfig) -> DepfixResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| DepfixError::network(err.to_string()))?;

        Ok(Self {
            client,
            index_url: config.index_url.trim_end_matches('/').to_string(),
            min_interval: config.request_interval,
            last_request: Mutex::new(None),
            versions_cache: RwLock::new(HashMap::new()),
            requires_cache: RwLock::new(HashMap::new()),
            disk_cache: config
                .cache_dir
                .as_ref()
                .map(|dir| Mutex::new(VersionCache::new(dir.clone()))),
        })
    }

    /// Enforce the minimum spacing between outbound requests.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(instant) = *last {
            let elapsed = instant.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    /// GET a JSON document. 404 and malformed bodies are soft failures
    /// (`None`); transport problems are errors.
    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: &str) -> DepfixResult<Option<T>> {
        self.throttle().await;
        debug!("fetching {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| DepfixError::network(format!("request to {} failed: {}", url, err)))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(DepfixError::index(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }
        match response.json::<T>().await {
            Ok(document) => Ok(Some(document)),
            Err(err) => {
                warn!("malformed index document at {}: {}", url, err);
                Ok(None)
            }
        }
    }

    async fn versions_uncached(&self, name: &str) -> DepfixResult<Vec<Version>> {
        let url = format!("{}/{}/json", self.index_url, name);
        let Some(document) = self.fetch::<ProjectDocument>(&url).await? else {
            warn!("package '{}' not found on the index", name);
            return Ok(Vec::new());
        };

        let mut finals = Vec::new();
        let mut prereleases = Vec::new();
        for (raw, files) in &document.releases {
            if files.is_empty() || files.iter().all(|file| file.yanked) {
                continue;
            }
            match Version::parse(raw) {
                Ok(version) => {
                    if version.is_prerelease() {
                        prereleases.push(version);
                    } else {
                        finals.push(version);
                    }
                }
                Err(err) => debug!("ignoring release '{}' of {}: {}", raw, name, err),
            }
        }

        // pre-releases only count when nothing else was ever published
        let mut versions = if finals.is_empty() { prereleases } else { finals };
        versions.sort();
        versions.reverse();
        Ok(versions)
    }
}

#[async_trait]
impl PackageIndex for PyPIClient {
    async fn versions(&self, name: &str) -> DepfixResult<Vec<Version>> {
        let name = normalize_name(name);
        if let Some(hit) = self.versions_cache.read().await.get(&name) {
            return Ok(hit.clone());
        }
        if let Some(cache) = &self.disk_cache {
            if let Some(hit) = cache.lock().await.get(&name).await {
                self.versions_cache
                    .write()
                    .await
                    .insert(name.clone(), hit.clone());
                return Ok(hit);
            }
        }

        let versions = self.versions_uncached(&name).await?;
        self.versions_cache
            .write()
            .await
            .insert(name.clone(), versions.clone());
        if let Some(cache) = &self.disk_cache {
            if let Err(err) = cache.lock().await.store(&name, &versions).await {
                warn!("failed to update the index cache: {}", err);
            }
        }
        Ok(versions)
    }

    async fn requires(&self, name: &str, version: &Version) -> DepfixResult<Vec<String>> {
        let name = normalize_name(name);
        let key = (name.clone(), version.to_string());
        if let Some(hit) = self.requires_cache.read().await.get(&key) {
            return Ok(hit.clone());
        }

        let url = format!("{}/{}/{}/json", self.index_url, name, version);
        let requires = match self.fetch::<ReleaseDocument>(&url).await? {
            Some(document) => document.info.requires_dist.unwrap_or_default(),
            None => {
                warn!("release {}=={} not found on the index", name, version);
                Vec::new()
            }
        };
        self.requires_cache.write().await.insert(key, requires.clone());
        Ok(requires)
    }
}
