//! Application constants for fetchlist
//!
//! Defaults used throughout the application, grouped by functional domain.
//! Most of them can be overridden through the settings file or the CLI.

use std::time::Duration;

/// Environment variable names
pub mod env {
    /// Overrides the proxy URL
    pub const PROXY: &str = "FETCHLIST_PROXY";

    /// Overrides the output directory
    pub const OUTPUT_DIR: &str = "FETCHLIST_OUTPUT_DIR";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Browser-like user agent; some mirrors refuse unknown clients
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// TCP keep-alive interval
    pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

    /// Maximum number of redirects to follow
    pub const MAX_REDIRECTS: usize = 10;

    /// Host serving GitHub blob pages
    pub const GITHUB_HOST: &str = "github.com";

    /// Host serving raw GitHub file contents
    pub const GITHUB_RAW_HOST: &str = "raw.githubusercontent.com";
}

/// Transfer tracking thresholds
pub mod transfer {
    use super::Duration;

    /// Copy buffer size (32 KiB)
    pub const BUFFER_SIZE: usize = 32 * 1024;

    /// Sampler and status line refresh period
    pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

    /// How long to wait for response headers once a request is sent
    pub const RESPONSE_TIMEOUT: Duration = super::http::CONNECT_TIMEOUT;

    /// Low-speed watchdog period
    pub const WATCHDOG_INTERVAL: Duration = Duration::from_secs(5);

    /// Cumulative time below the required speed before cancelling
    pub const LOW_SPEED_DURATION: Duration = Duration::from_secs(15);

    /// Speeds at or below this (B/s) are too noisy for an ETA
    pub const MIN_VALID_SPEED: f64 = 10.0;

    /// Smoothed speed (B/s) a transfer must sustain
    pub const MIN_REQUIRED_SPEED: f64 = 1024.0;

    /// Upper bound for displayed ETA
    pub const MAX_ETA: Duration = Duration::from_secs(24 * 60 * 60);

    /// Weight of the previous smoothed value
    pub const SMOOTHING_PREVIOUS_WEIGHT: f64 = 0.7;

    /// Weight of the newest instantaneous value
    pub const SMOOTHING_SAMPLE_WEIGHT: f64 = 0.3;
}

/// File naming
pub mod files {
    /// Suffix of in-progress temp files
    pub const TEMP_SUFFIX: &str = ".download";

    /// Suffix appended to the previous version when keeping old files
    pub const BACKUP_SUFFIX: &str = ".old";

    /// Default item list
    pub const DEFAULT_ITEMS_FILE: &str = "config.yaml";

    /// Default output directory
    pub const DEFAULT_OUTPUT_DIR: &str = "downloads";

    /// Settings directory name under the user config directory
    pub const CONFIG_DIR_NAME: &str = "fetchlist";

    /// Settings file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";
}

/// Download cache
pub mod cache {
    use super::Duration;

    /// Cache file name, placed in the home directory by default
    pub const FILE_NAME: &str = ".download_cache.json";

    /// A kept-updated file older than this is downloaded again
    pub const EXPIRE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

    /// Records older than this are dropped at startup
    pub const RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);
}

/// Batch retry behaviour
pub mod batch {
    use super::Duration;

    /// Attempts per URL
    pub const DEFAULT_RETRIES: u32 = 3;

    /// Delay before attempt `n + 1` is `n` times this
    pub const RETRY_DELAY_STEP: Duration = Duration::from_secs(2);
}

// Re-export commonly used constants at module level
pub use batch::DEFAULT_RETRIES;
pub use http::USER_AGENT;
pub use transfer::BUFFER_SIZE;
