//! Command handlers for the fetchlist CLI
//!
//! This module implements the command handlers that connect CLI arguments
//! and settings to the core application functionality.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::{
    format_duration, format_size, item_count, load_items, BatchRunner, BatchStats, CacheManager,
    Downloader, FetchClient, ItemGroups, PlannedAction,
};
use crate::cli::{CacheAction, CacheArgs, ConsoleReporter, DownloadArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Handle the download command
///
/// Loads the item list, prepares the cache, client and downloader, and runs
/// every item in order. Ctrl-C and the maximum total run time both cancel the
/// run through a shared token.
pub async fn handle_download(args: DownloadArgs, mut config: AppConfig, quiet: bool) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    args.apply_to(&mut config);
    config.validate()?;

    let groups = load_items(&args.items).await?;
    info!(
        "Loaded {} items in {} groups from {}",
        item_count(&groups),
        groups.len(),
        args.items.display()
    );

    let cache = Arc::new(CacheManager::new(config.cache.clone()).await?);
    match cache.cleanup_expired().await {
        Ok(0) => {}
        Ok(removed) => debug!("Dropped {} stale cache records", removed),
        Err(e) => warn!("Could not clean the download cache: {}", e),
    }

    if !quiet {
        print_banner(&args, &config, &cache);
    }

    let cancel = CancellationToken::new();
    let reporter = Arc::new(ConsoleReporter::new(quiet, config.transfer.min_valid_speed));
    let fetcher = Arc::new(FetchClient::new(&config.client)?);

    let downloader = Downloader::new(fetcher, config.transfer.clone())
        .with_cache(cache.clone())
        .with_observer(reporter.clone())
        .with_cancellation(cancel.clone());
    let runner = BatchRunner::new(downloader, config.batch.clone())
        .with_cache(cache.clone())
        .with_observer(reporter);

    if args.dry_run {
        print_plan(&runner, &groups).await;
        return Ok(());
    }

    if item_count(&groups) == 0 {
        println!("No items in {}", args.items.display());
        return Ok(());
    }

    let watchers = spawn_cancel_watchers(&cancel, config.batch.max_total_time);
    let stats = runner.run(&groups).await;
    for watcher in watchers {
        watcher.abort();
    }

    print_summary(&stats);
    Ok(())
}

/// Handle the cache subcommands
pub async fn handle_cache(args: CacheArgs, mut config: AppConfig) -> Result<()> {
    if let Some(cache_file) = args.action.cache_file() {
        config.cache.cache_file = Some(cache_file.clone());
    }
    let cache = CacheManager::new(config.cache.clone()).await?;

    match args.action {
        CacheAction::Info { .. } => {
            println!("Download cache: {}", cache.path().display());
            println!(
                "Records expire after {}, dropped after {}",
                format_duration(cache.config().expire_after),
                format_duration(cache.config().retention)
            );

            let entries = cache.entries().await;
            if entries.is_empty() {
                println!("No downloads recorded.");
                return Ok(());
            }

            let now = Utc::now();
            println!();
            for (path, at) in &entries {
                let age = now
                    .signed_duration_since(*at)
                    .to_std()
                    .unwrap_or(Duration::ZERO);
                let stale = if cache.needs_update(path).await {
                    " (stale)"
                } else {
                    ""
                };
                println!(
                    "  {}  {} ago{}",
                    path.display(),
                    format_duration(age),
                    stale
                );
            }
            println!("\n{} record(s)", entries.len());
        }
        CacheAction::Clean { .. } => {
            let removed = cache.cleanup_expired().await?;
            println!(
                "Removed {} record(s), {} remaining",
                removed,
                cache.len().await
            );
        }
    }

    Ok(())
}

/// Cancel `token` on Ctrl-C, and once `max_total_time` has passed
fn spawn_cancel_watchers(
    token: &CancellationToken,
    max_total_time: Option<Duration>,
) -> Vec<JoinHandle<()>> {
    let mut watchers = Vec::new();

    let on_interrupt = token.clone();
    watchers.push(tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("\nInterrupted, stopping after cleanup...");
                on_interrupt.cancel();
            }
            Err(e) => warn!("Failed to install Ctrl-C handler: {}", e),
        }
    }));

    if let Some(limit) = max_total_time {
        let on_deadline = token.clone();
        watchers.push(tokio::spawn(async move {
            tokio::select! {
                _ = on_deadline.cancelled() => {}
                _ = tokio::time::sleep(limit) => {
                    eprintln!(
                        "\nMaximum total time of {} reached, stopping",
                        format_duration(limit)
                    );
                    on_deadline.cancel();
                }
            }
        }));
    }

    watchers
}

fn print_banner(args: &DownloadArgs, config: &AppConfig, cache: &CacheManager) {
    println!("fetchlist v{}", env!("CARGO_PKG_VERSION"));
    println!("Item list:        {}", args.items.display());
    println!("Output directory: {}", config.batch.output_dir.display());
    println!(
        "Connect timeout:  {}",
        format_duration(config.client.connect_timeout)
    );
    println!(
        "Idle timeout:     {}",
        format_duration(config.client.idle_timeout)
    );
    println!(
        "Max total time:   {}",
        config
            .batch
            .max_total_time
            .map(format_duration)
            .unwrap_or_else(|| "unlimited".to_string())
    );
    println!("Retries:          {}", config.batch.retries);
    println!("Keep old files:   {}", config.batch.keep_old);
    println!("Force download:   {}", config.batch.force);
    println!(
        "Proxy:            {}",
        config.client.proxy.as_deref().unwrap_or("none")
    );
    println!("Cache file:       {}", cache.path().display());
}

async fn print_plan(runner: &BatchRunner, groups: &ItemGroups) {
    let plan = runner.plan(groups).await;
    let downloads = plan
        .iter()
        .filter(|p| p.action == PlannedAction::Download)
        .count();

    println!("\nDry run, nothing will be downloaded:");
    for item in &plan {
        let action = match item.action {
            PlannedAction::Download => "download",
            PlannedAction::Skip => "skip",
        };
        println!(
            "  [{}] {:8} {} -> {}",
            item.group,
            action,
            item.name,
            item.destination.display()
        );
        if item.action == PlannedAction::Download {
            for url in &item.urls {
                println!("             {}", url);
            }
        }
    }
    println!(
        "\n{} of {} item(s) would be downloaded",
        downloads,
        plan.len()
    );
}

fn print_summary(stats: &BatchStats) {
    println!();
    if stats.cancelled {
        println!(
            "Run cancelled after {} of {} item(s)",
            stats.outcomes.len(),
            stats.total
        );
    }
    println!(
        "All downloads finished: succeeded {}/{}",
        stats.succeeded(),
        stats.total
    );
    println!(
        "  downloaded {} ({}), up to date {}, failed {}, in {}",
        stats.downloaded(),
        format_size(stats.bytes_downloaded()),
        stats.up_to_date(),
        stats.failed(),
        format_duration(stats.elapsed)
    );
}
