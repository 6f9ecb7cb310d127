use std::path::PathBuf;
use std::time::Duration;

use crate::lock::DEFAULT_LOCK_FILE;

/// Default base URL of the package index JSON API.
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/pypi";

/// Runtime configuration for one invocation of the engine.
///
/// The core never reads the process environment; callers fill this record
/// in and pass it down.
#[derive(Debug, Clone)]
pub struct DepfixConfig {
    /// Base URL of the package index JSON API.
    pub index_url: String,
    /// Minimum spacing between outbound index requests.
    pub request_interval: Duration,
    /// Connect timeout for index requests.
    pub connect_timeout: Duration,
    /// Overall timeout for index requests.
    pub request_timeout: Duration,
    /// Directory for the on-disk index cache; `None` disables it.
    pub cache_dir: Option<PathBuf>,
    /// Python interpreter used for subprocess calls.
    pub python: PathBuf,
    /// Default lock file location.
    pub lock_file: PathBuf,
    /// Uninstall packages absent from the lock file during restore.
    pub remove_missing_on_restore: bool,
}

impl Default for DepfixConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            request_interval: Duration::from_millis(200),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            cache_dir: None,
            python: PathBuf::from("python3"),
            lock_file: PathBuf::from(DEFAULT_LOCK_FILE),
            remove_missing_on_restore: false,
        }
    }
}

impl DepfixConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the index base URL.
    pub fn with_index_url(mut self, url: impl Into<String>) -> Self {
        self.index_url = url.into();
        self
    }

    /// Set the minimum spacing between index requests.
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.request_interval = interval;
        self
    }

    /// Set the interpreter used for subprocess calls.
    pub fn with_python(mut self, python: impl Into<PathBuf>) -> Self {
        self.python = python.into();
        self
    }

    /// Set the lock file location.
    pub fn with_lock_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.lock_file = path.into();
        self
    }

    /// Enable the on-disk index cache under the given directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }
}
