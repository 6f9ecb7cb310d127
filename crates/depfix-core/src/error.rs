use std::io;

use thiserror::Error;

/// Custom result type for depfix operations
pub type DepfixResult<T> = Result<T, DepfixError>;

/// Custom error type for depfix operations
#[derive(Debug, Error)]
pub enum DepfixError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Version error: {0}")]
    Version(String),

    #[error("Package error: {0}")]
    Package(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Index error: {0}")]
    Index(String),

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DepfixError {
    /// Create a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        DepfixError::Parse(msg.into())
    }

    /// Create a new version error
    pub fn version<S: Into<String>>(msg: S) -> Self {
        DepfixError::Version(msg.into())
    }

    /// Create a new package error
    pub fn package<S: Into<String>>(msg: S) -> Self {
        DepfixError::Package(msg.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        DepfixError::Network(msg.into())
    }

    /// Create a new index error
    pub fn index<S: Into<String>>(msg: S) -> Self {
        DepfixError::Index(msg.into())
    }

    /// Create a new resolution error
    pub fn resolution<S: Into<String>>(msg: S) -> Self {
        DepfixError::Resolution(msg.into())
    }

    /// Create a new execution error
    pub fn execution<S: Into<String>>(msg: S) -> Self {
        DepfixError::Execution(msg.into())
    }

    /// Create a new lock error
    pub fn lock<S: Into<String>>(msg: S) -> Self {
        DepfixError::Lock(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        DepfixError::Config(msg.into())
    }
}

impl From<io::Error> for DepfixError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DepfixError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
