//! Command-line argument parsing for fetchlist
//!
//! This module defines the CLI structure using clap derive macros. Flags given
//! on the command line override the settings file and the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::AppConfig;
use crate::constants::files;

/// fetchlist - Download a list of files described in a YAML document
#[derive(Parser, Debug)]
#[command(
    name = "fetchlist",
    version,
    about = "Download the files listed in a YAML item list",
    long_about = "Downloads every item of a YAML item list one after another, trying each item's URLs in turn.
Shows live progress, cancels transfers that stall and replaces files atomically."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download every item in the item list
    Download(DownloadArgs),

    /// Inspect or clean the download cache
    Cache(CacheArgs),
}

/// Arguments for the download command
#[derive(Args, Debug, Clone, Default)]
pub struct DownloadArgs {
    /// YAML item list
    #[arg(short, long, value_name = "FILE", default_value = files::DEFAULT_ITEMS_FILE)]
    pub items: PathBuf,

    /// Output directory; each group gets a subdirectory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Attempts per URL
    #[arg(short, long)]
    pub retries: Option<u32>,

    /// Connect timeout in seconds, also used as the wait for response headers
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Idle connection timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub idle_timeout: Option<u64>,

    /// Stop the whole run after this many minutes (0 = unlimited)
    #[arg(long, value_name = "MINUTES")]
    pub max_total_time: Option<u64>,

    /// Proxy URL (http, https or socks5)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Keep the previous file as <name>.old
    #[arg(long)]
    pub keep_old: bool,

    /// Download even when the file is up to date
    #[arg(short, long)]
    pub force: bool,

    /// Download cache file
    #[arg(long, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Show what would be downloaded without downloading
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for cache management
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache management actions
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List recorded downloads and their age
    Info {
        /// Download cache file
        #[arg(long, value_name = "FILE")]
        cache_file: Option<PathBuf>,
    },

    /// Drop records whose file is gone or that are past retention
    Clean {
        /// Download cache file
        #[arg(long, value_name = "FILE")]
        cache_file: Option<PathBuf>,
    },
}

impl CacheAction {
    pub fn cache_file(&self) -> Option<&PathBuf> {
        match self {
            CacheAction::Info { cache_file } | CacheAction::Clean { cache_file } => {
                cache_file.as_ref()
            }
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        self.log_level_or(tracing::Level::WARN)
    }

    /// Logging level from the flags, or `default` when none was given
    pub fn log_level_or(&self, default: tracing::Level) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            default
        }
    }

    /// Logging level, falling back to the settings file's level
    pub fn effective_log_level(&self, config: &AppConfig) -> tracing::Level {
        let default = tracing::Level::from_str(config.logging.level.trim())
            .unwrap_or(tracing::Level::WARN);
        self.log_level_or(default)
    }
}

impl DownloadArgs {
    /// Reject flag values that cannot work
    pub fn validate(&self) -> Result<(), String> {
        if self.retries == Some(0) {
            return Err("Number of retries must be greater than 0".to_string());
        }
        if self.connect_timeout == Some(0) {
            return Err("Connect timeout must be greater than 0".to_string());
        }
        if let Some(proxy) = &self.proxy {
            if proxy.trim().is_empty() {
                return Err("Proxy URL must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// Apply the flags on top of the loaded settings
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(output) = &self.output {
            config.batch.output_dir = output.clone();
        }
        if let Some(retries) = self.retries {
            config.batch.retries = retries;
        }
        if let Some(secs) = self.connect_timeout {
            config.client.connect_timeout = Duration::from_secs(secs);
            config.transfer.response_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.idle_timeout {
            config.client.idle_timeout = Duration::from_secs(secs);
        }
        if let Some(minutes) = self.max_total_time {
            config.batch.max_total_time = if minutes == 0 {
                None
            } else {
                Some(Duration::from_secs(minutes.saturating_mul(60)))
            };
        }
        if let Some(proxy) = &self.proxy {
            config.client.proxy = Some(proxy.trim().to_string());
        }
        if self.keep_old {
            config.batch.keep_old = true;
        }
        if self.force {
            config.batch.force = true;
        }
        if let Some(cache_file) = &self.cache_file {
            config.cache.cache_file = Some(cache_file.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(global: GlobalArgs) -> Cli {
        Cli {
            global,
            command: Commands::Cache(CacheArgs {
                action: CacheAction::Info { cache_file: None },
            }),
        }
    }

    fn global() -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            very_verbose: false,
            quiet: false,
            config: None,
        }
    }

    #[test]
    fn test_download_args_validation() {
        let mut args = DownloadArgs::default();
        assert!(args.validate().is_ok());

        args.retries = Some(0);
        assert!(args.validate().is_err());

        args.retries = Some(2);
        args.proxy = Some("  ".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let args = DownloadArgs {
            output: Some(PathBuf::from("mirror")),
            retries: Some(7),
            connect_timeout: Some(5),
            idle_timeout: Some(90),
            max_total_time: Some(30),
            proxy: Some("socks5://127.0.0.1:1080".to_string()),
            keep_old: true,
            force: true,
            cache_file: Some(PathBuf::from("cache.json")),
            ..Default::default()
        };

        let mut config = AppConfig::default();
        args.apply_to(&mut config);

        assert_eq!(config.batch.output_dir, PathBuf::from("mirror"));
        assert_eq!(config.batch.retries, 7);
        assert_eq!(config.client.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.transfer.response_timeout, Duration::from_secs(5));
        assert_eq!(config.client.idle_timeout, Duration::from_secs(90));
        assert_eq!(config.batch.max_total_time, Some(Duration::from_secs(1800)));
        assert_eq!(
            config.client.proxy.as_deref(),
            Some("socks5://127.0.0.1:1080")
        );
        assert!(config.batch.keep_old);
        assert!(config.batch.force);
        assert_eq!(config.cache.cache_file, Some(PathBuf::from("cache.json")));
    }

    #[test]
    fn test_absent_flags_keep_settings() {
        let mut config = AppConfig::default();
        config.batch.retries = 9;
        config.batch.max_total_time = Some(Duration::from_secs(60));

        DownloadArgs::default().apply_to(&mut config);

        assert_eq!(config.batch.retries, 9);
        assert_eq!(config.batch.max_total_time, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_max_total_time_is_unlimited() {
        let mut config = AppConfig::default();
        config.batch.max_total_time = Some(Duration::from_secs(60));

        let args = DownloadArgs {
            max_total_time: Some(0),
            ..Default::default()
        };
        args.apply_to(&mut config);

        assert!(config.batch.max_total_time.is_none());
    }

    #[test]
    fn test_parse_download_command() {
        let cli = Cli::try_parse_from([
            "fetchlist",
            "-v",
            "download",
            "-i",
            "list.yaml",
            "--keep-old",
            "--max-total-time",
            "10",
        ])
        .unwrap();

        assert!(cli.global.verbose);
        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.items, PathBuf::from("list.yaml"));
                assert!(args.keep_old);
                assert_eq!(args.max_total_time, Some(10));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_default_items_file() {
        let cli = Cli::try_parse_from(["fetchlist", "download"]).unwrap();
        match cli.command {
            Commands::Download(args) => assert_eq!(args.items, PathBuf::from("config.yaml")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_log_level() {
        let cli_quiet = cli_with(GlobalArgs {
            quiet: true,
            ..global()
        });
        let cli_verbose = cli_with(GlobalArgs {
            verbose: true,
            ..global()
        });

        assert_eq!(cli_quiet.log_level(), tracing::Level::ERROR);
        assert_eq!(cli_verbose.log_level(), tracing::Level::INFO);
        assert_eq!(cli_with(global()).log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_settings_level_used_without_flags() {
        let mut config = AppConfig::default();
        config.logging.level = "debug".to_string();

        assert_eq!(
            cli_with(global()).effective_log_level(&config),
            tracing::Level::DEBUG
        );

        let quiet = cli_with(GlobalArgs {
            quiet: true,
            ..global()
        });
        assert_eq!(quiet.effective_log_level(&config), tracing::Level::ERROR);
    }
}
