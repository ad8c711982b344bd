//! Catalog-Harvester main entry point
//!
//! This is the command-line interface for the Catalog-Harvester crawler.

use anyhow::Context;
use catalog_harvester::config::{load_config_with_hash, Config};
use catalog_harvester::crawler::harvest;
use clap::Parser;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Catalog-Harvester: a recursive catalog crawler
///
/// Walks a site from its index page through category listings and their
/// pagination, writing one record file per detail page it discovers.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A recursive catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    // Flushes the log file on drop, so it must outlive the harvest
    let _log_guard = setup_logging(
        cli.verbose,
        cli.quiet,
        config.output.log_file.as_deref().map(Path::new),
    )?;

    tracing::info!(
        "Configuration loaded from {} (hash: {})",
        cli.config.display(),
        config_hash
    );

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_harvest(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Console output is always on. With a log file configured, the same events
/// are also written there without ANSI colors through a background writer;
/// the returned guard must be held until shutdown.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_file: Option<&Path>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvester=info,warn"),
            1 => EnvFilter::new("catalog_harvester=debug,info"),
            2 => EnvFilter::new("catalog_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (dir, name) = split_log_path(path);
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(name.to_string_lossy())
                .build(&dir)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Splits a log file path into the directory to create it in and its file name
fn split_log_path(path: &Path) -> (PathBuf, &OsStr) {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path.file_name().unwrap_or_else(|| OsStr::new("crawler.log"));
    (dir, name)
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Catalog-Harvester Dry Run ===\n");

    println!("Site:");
    println!("  Start URL: {}", config.site.start_url);
    println!("  Host: {}", config.site.host);
    println!("  Referer: {}", config.site.referer());

    println!("\nCrawler:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Crawl interval: {}ms", config.crawler.crawl_interval_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Retries: {} attempts, {}ms apart",
        config.crawler.retry_budget, config.crawler.retry_backoff_ms
    );
    println!("  Encodings: {}", config.crawler.encodings.join(", "));
    println!("  User agents: {}", config.crawler.user_agents.len());

    println!("\nExtraction:");
    for (i, selector) in config.extract.index_selectors.iter().enumerate() {
        println!("  Index strategy {}: {}", i + 1, selector);
    }
    println!("  List selector: {}", config.extract.list_selector);
    println!("  Category pattern: {}", config.extract.category_pattern);

    println!("\nOutput:");
    println!("  Storage root: {}", config.output.storage_root);
    println!("  Fallback directory: ./{}", config.output.fallback_dir);
    if let Some(path) = &config.output.debug_index_path {
        println!("  Index snapshot: {}", path);
    }
    if let Some(path) = &config.output.log_file {
        println!("  Log file: {}", path);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest, racing it against Ctrl-C
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    tokio::select! {
        result = harvest(config) => {
            let stats = result.context("harvest failed")?;
            tracing::info!(
                "Harvest completed successfully: {} record(s) written",
                stats.records_written
            );
            Ok(())
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("failed to listen for Ctrl-C")?;
            tracing::warn!("Interrupted, abandoning in-flight tasks");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_log_path() {
        let (dir, name) = split_log_path(Path::new("logs/crawler.log"));
        assert_eq!(dir, PathBuf::from("logs"));
        assert_eq!(name, "crawler.log");

        let (dir, name) = split_log_path(Path::new("crawler.log"));
        assert_eq!(dir, PathBuf::from("."));
        assert_eq!(name, "crawler.log");
    }

    #[test]
    fn test_log_file_receives_events() {
        let tmp = tempfile::TempDir::new().unwrap();
        let log_path = tmp.path().join("logs").join("crawler.log");
        let (dir, name) = split_log_path(&log_path);

        let appender = RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(name.to_string_lossy())
            .build(&dir)
            .unwrap();
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let subscriber = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(writer).with_ansi(false));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Saved record for testing");
        });
        drop(guard);

        let logged = std::fs::read_to_string(tmp.path().join("logs").join("crawler.log")).unwrap();
        assert!(logged.contains("Saved record for testing"));
    }
}
