//! fetchlist CLI application
//!
//! Command-line interface for downloading the files listed in a YAML item
//! list, with live progress, stall detection and atomic replacement.

use std::process;

use tracing::info;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, EnvFilter};

use fetchlist::cli::{handle_cache, handle_download, Cli, Commands};
use fetchlist::config::AppConfig;
use fetchlist::errors::Result;

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // Settings are needed before logging so the file can set the level
    let config = AppConfig::load(cli.global.config.clone()).await?;
    init_logging(&cli, &config);

    info!("fetchlist v{} starting", env!("CARGO_PKG_VERSION"));

    let quiet = cli.global.quiet;
    match cli.command {
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(args, config, quiet).await
        }
        Commands::Cache(args) => {
            info!("Executing cache command");
            handle_cache(args, config).await
        }
    }
}

/// Initialize logging based on CLI verbosity and the settings file
fn init_logging(cli: &Cli, config: &AppConfig) {
    let log_level = cli.effective_log_level(config);

    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("fetchlist={}", log_level).parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
