//! Error types for fetchlist
//!
//! Each subsystem has its own error enum so callers can react to the failures
//! that matter to them; [`AppError`] wraps all of them for the binary.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a failed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadErrorKind {
    /// The server answered 404
    ResourceNotFound,
    /// The low-speed watchdog cancelled the transfer
    LowSpeedCancelled,
    /// Anything else: transport, server status, local I/O, external cancellation
    TransferFailed,
}

impl fmt::Display for DownloadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DownloadErrorKind::ResourceNotFound => "resource-not-found",
            DownloadErrorKind::LowSpeedCancelled => "low-speed-cancelled",
            DownloadErrorKind::TransferFailed => "transfer-failed",
        };
        f.write_str(name)
    }
}

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Server answered 404
    #[error("Resource not found (HTTP 404): {url}")]
    NotFound { url: String },

    /// Transfer was too slow for too long and the watchdog cancelled it
    #[error("Transfer cancelled: speed stayed below {min_speed} B/s for {low_for_secs} seconds")]
    LowSpeed { min_speed: u64, low_for_secs: u64 },

    /// Transfer was cancelled from outside (interrupt or run deadline)
    #[error("Transfer cancelled")]
    Cancelled,

    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No response headers arrived in time
    #[error("No response from {url} within {after:?}")]
    ResponseTimeout { url: String, after: std::time::Duration },

    /// Server returned a non-success status other than 404
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// I/O error while reading the body or writing the temp file
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Destination directory or temp file could not be prepared
    #[error("Could not prepare {path}: {source}")]
    LocalSetup {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}: {source}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
        source: std::io::Error,
    },

    /// The previous file could not be moved aside
    #[error("Could not keep previous version of {path}: {source}")]
    BackupFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Generic error for other issues
    #[error("{0}")]
    Other(String),
}

impl DownloadError {
    /// Classify the failure
    pub fn kind(&self) -> DownloadErrorKind {
        match self {
            DownloadError::NotFound { .. } => DownloadErrorKind::ResourceNotFound,
            DownloadError::LowSpeed { .. } => DownloadErrorKind::LowSpeedCancelled,
            _ => DownloadErrorKind::TransferFailed,
        }
    }

    /// Whether retrying the same URL could succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            DownloadError::NotFound { .. }
                | DownloadError::Cancelled
                | DownloadError::InvalidUrl { .. }
                | DownloadError::LocalSetup { .. }
        )
    }

    /// Whether the run itself was interrupted, as opposed to this one transfer failing
    pub fn is_external_cancel(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}

/// Download cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache file could not be read or written
    #[error("Cache file I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Cache contents could not be encoded
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// No location for the default cache file
    #[error("Could not determine home directory for the download cache")]
    NoHomeDirectory,

    /// Temp file could not replace the cache file
    #[error("Could not replace cache file {path}: {source}")]
    PersistFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Item list loading errors
#[derive(Error, Debug)]
pub enum ItemsError {
    /// Item list file not found
    #[error("Item list not found: {path}")]
    NotFound { path: PathBuf },

    /// Item list could not be read
    #[error("Could not read item list {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("Invalid item list: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// An item is structurally valid YAML but unusable
    #[error("Invalid item #{index} in group '{group}': {reason}")]
    InvalidItem {
        group: String,
        index: usize,
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Could not read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Item list error
    #[error(transparent)]
    Items(#[from] ItemsError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Download(e) => e.is_retryable(),
            AppError::Cache(CacheError::Io { .. }) => true,
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Download(_) => "download",
            AppError::Cache(_) => "cache",
            AppError::Items(_) => "items",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Item list result type alias
pub type ItemsResult<T> = std::result::Result<T, ItemsError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
