//! Artist-Harvest main entry point
//!
//! This is the command-line interface for the Artist-Harvest crawler.

use anyhow::Context;
use artist_harvest::config::{load_config_with_hash, Config};
use artist_harvest::extract::SelectorExtractor;
use artist_harvest::pool::PoolOptions;
use artist_harvest::progress::{load_targets, ProgressStore};
use artist_harvest::retry::Backoff;
use artist_harvest::session::HttpSessionFactory;
use artist_harvest::{CrawlPipeline, RetryPolicy, WorkerPool};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Artist-Harvest: a resumable collection crawler
///
/// Crawls each listed artist's collections, their content items and each
/// item's engagement statistics, appending one CSV row per content item.
/// Artists already present in the output file are skipped.
#[derive(Parser, Debug)]
#[command(name = "artist-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable collection crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Artists file, overriding `output.artists-path`
    #[arg(long, value_name = "FILE")]
    artists: Option<PathBuf>,

    /// Output CSV file, overriding `output.data-path`
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the output file and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    if let Some(artists) = &cli.artists {
        config.output.artists_path = artists.display().to_string();
    }
    if let Some(output) = &cli.output {
        config.output.data_path = output.display().to_string();
    }

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_crawl(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("artist_harvest=info,warn"),
            1 => EnvFilter::new("artist_harvest=debug,info"),
            2 => EnvFilter::new("artist_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Artist-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.worker_count());
    println!("  Batch size: {}", config.crawler.batch_size);
    println!("  Max chunk size: {}", config.crawler.max_chunk_size);
    println!("  Max attempts: {}", config.crawler.max_attempts);
    println!(
        "  Retry backoff: {}ms (max {}ms)",
        config.crawler.retry_backoff_ms, config.crawler.retry_backoff_max_ms
    );
    println!("  Worker init: {:?}", config.crawler.worker_init);

    println!("\nSession:");
    println!("  User agent: {}", config.session.user_agent);
    println!("  Page timeout: {}s", config.session.page_timeout_secs);

    println!("\nOutput:");
    println!("  Artists: {}", config.output.artists_path);
    println!("  Data: {}", config.output.data_path);
    println!("  Degraded marker: {:?}", config.output.degraded_marker.as_str());

    SelectorExtractor::from_config(&config.site).context("Invalid site configuration")?;

    let targets = load_targets(&config.output.artists_path)?;
    let store = ProgressStore::open(&config.output.data_path, config.output.degraded_marker)?;
    let pending = store.pending(&targets);

    println!(
        "\nArtists: {} listed, {} already done, {} pending",
        targets.len(),
        store.completed(),
        pending.len()
    );
    for (index, batch) in pending.chunks(config.crawler.batch_size.max(1)).enumerate() {
        println!("  Batch {}:", index + 1);
        for target in batch {
            println!("    * {}", target);
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} artists", pending.len());

    Ok(())
}

/// Handles the --stats mode: shows statistics from the output file
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use artist_harvest::output::{load_statistics, print_statistics};

    println!("Output: {}\n", config.output.data_path);

    let stats = load_statistics(&config.output.data_path, config.output.degraded_marker)
        .with_context(|| format!("Failed to read {}", config.output.data_path))?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let extractor = Arc::new(
        SelectorExtractor::from_config(&config.site).context("Invalid site configuration")?,
    );

    let targets = load_targets(&config.output.artists_path)?;
    let mut store = ProgressStore::open(&config.output.data_path, config.output.degraded_marker)
        .with_context(|| format!("Failed to read {}", config.output.data_path))?;
    let pending = store.pending(&targets);
    tracing::info!(
        "{} artists listed, {} pending",
        targets.len(),
        pending.len()
    );
    if pending.is_empty() {
        tracing::info!("Nothing to crawl");
        return Ok(());
    }

    let options = PoolOptions {
        size: config.crawler.worker_count(),
        max_chunk_size: config.crawler.max_chunk_size,
        worker_init: config.crawler.worker_init,
        init_backoff: Backoff::new(
            config.crawler.retry_backoff_ms,
            config.crawler.retry_backoff_max_ms,
        ),
    };
    let factory = HttpSessionFactory::new(config.session.clone());
    let pool = WorkerPool::launch(&factory, options).await?;

    let pipeline = CrawlPipeline::new(
        pool.clone(),
        extractor,
        RetryPolicy::from_config(&config.crawler),
        config.crawler.batch_size,
    );

    let result = tokio::select! {
        result = pipeline.run(pending, &mut store) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };

    if result.is_none() {
        tracing::warn!("Interrupted; appended batches are kept and the next run resumes after them");
    }

    let closed = pool.shutdown().await;
    tracing::info!("Closed {}/{} worker sessions", closed, pool.size());

    match result {
        Some(Ok(_)) => {
            tracing::info!("Crawl completed successfully");
            Ok(())
        }
        Some(Err(e)) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
        None => Ok(()),
    }
}
