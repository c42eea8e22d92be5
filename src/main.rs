//! Silkworm main entry point
//!
//! This is the command-line interface for the Silkworm crawler.

use anyhow::Context;
use clap::Parser;
use silkworm::config::{read_config_with_hash, validate, Config};
use silkworm::crawler::Orchestrator;
use silkworm::output::{load_statistics, print_report, print_statistics};
use silkworm::storage::open_storage;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Silkworm: a concurrent web crawler
///
/// Silkworm starts from seed URLs, follows every absolute http(s) link it
/// finds, and stores the visible text of each page in SQLite. A page that
/// fails is retried up to a configurable number of attempts.
#[derive(Parser, Debug)]
#[command(name = "silkworm")]
#[command(version)]
#[command(about = "A concurrent web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Seed URL (repeatable); replaces the seeds from the config file
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Maximum number of pages processed at once
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Attempts per URL before giving up (0 = unbounded)
    #[arg(long, value_name = "N")]
    max_attempts: Option<u32>,

    /// Stop after this many pages are visited (0 = no cap)
    #[arg(long, value_name = "N")]
    max_pages: Option<usize>,

    /// Path to the SQLite database
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if !self.seeds.is_empty() {
            config.crawler.seeds = self.seeds.clone();
        }
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(max_attempts) = self.max_attempts {
            config.crawler.max_attempts = max_attempts;
        }
        if let Some(max_pages) = self.max_pages {
            config.crawler.max_pages = max_pages;
        }
        if let Some(database) = &self.database {
            config.output.database_path = database.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => load_file(path)?,
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };
    cli.apply_overrides(&mut config);

    if cli.stats {
        return handle_stats(&config);
    }

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("silkworm=info,warn"),
            1 => EnvFilter::new("silkworm=debug,info"),
            2 => EnvFilter::new("silkworm=trace,debug"),
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

/// Reads the configuration file and logs its hash
fn load_file(path: &Path) -> anyhow::Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = read_config_with_hash(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Silkworm Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    match config.crawler.max_attempts {
        0 => println!("  Max attempts: unbounded"),
        n => println!("  Max attempts: {}", n),
    }
    match config.crawler.max_pages {
        0 => println!("  Max pages: no cap"),
        n => println!("  Max pages: {}", n),
    }

    println!("\nFetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Connect timeout: {}s", config.fetcher.connect_timeout_secs);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Table: {}", config.output.table);

    println!("\nSeeds ({}):", config.crawler.seeds.len());
    for seed in &config.crawler.seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path), &config.output.table)
        .context("failed to open database")?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Seeds: {}, workers: {}",
        config.crawler.seeds.len(),
        config.crawler.workers
    );

    let orchestrator = match Orchestrator::from_config(&config) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            tracing::error!("Crawl setup failed: {}", e);
            return Err(e.into());
        }
    };

    let stop = orchestrator.stop_token();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, stop).await {
            tracing::error!("Second interrupt received, exiting without draining");
            std::process::exit(130);
        }
    });

    let report = orchestrator.run().await;
    print_report(&report);

    Ok(())
}

/// Cancels `stop` on the first interrupt
///
/// Returns true once a second interrupt arrives while in-flight pages are
/// still draining. Returns false if the signal source fails.
async fn watch_interrupts<F, Fut>(mut interrupt: F, stop: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = interrupt().await {
        tracing::error!("Could not listen for interrupts: {}", e);
        return false;
    }

    tracing::warn!("Interrupt received, finishing in-flight pages (interrupt again to exit now)");
    stop.cancel();

    interrupt().await.is_ok()
}
