//! Ria-Harvest main entry point
//!
//! This is the command-line interface for the Ria-Harvest listing harvester.

use clap::Parser;
use ria_harvest::config::load_config_with_hash;
use ria_harvest::{Config, Coordinator, HttpFetcher, SqliteStorage};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Ria-Harvest: a paginated car-listing harvester
///
/// Ria-Harvest walks a paginated used-car search, extracts structured
/// records from every new detail page, and appends them to a local
/// SQLite database. Listings already in the database are never
/// re-fetched.
#[derive(Parser, Debug)]
#[command(name = "ria-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A paginated car-listing harvester", long_about = None)]
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

    /// Validate config and show what would be harvested without fetching
    #[arg(long)]
    dry_run: bool,

    /// Override the page number the crawl starts from
    #[arg(long, value_name = "N")]
    page: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, _config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(page) = cli.page {
        tracing::info!("Start page overridden from command line: {}", page);
        config.source.start_page = page;
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_run(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ria_harvest=info,warn"),
            1 => EnvFilter::new("ria_harvest=debug,info"),
            2 => EnvFilter::new("ria_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the run plan
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Ria-Harvest Dry Run ===\n");

    println!("Source:");
    println!("  Start URL: {}", config.source.start_url);
    println!("  Start page: {}", config.source.start_page);
    println!("  Concurrency: {}", config.source.concurrency);

    println!("\nHTTP:");
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!("  Max retries: {}", config.http.max_retries);
    println!(
        "  Request delay: {:.1}-{:.1}s",
        config.http.request_delay_range.0, config.http.request_delay_range.1
    );
    println!(
        "  Page delay: {:.1}-{:.1}s",
        config.http.page_delay_range.0, config.http.page_delay_range.1
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nScheduler:");
    println!("  Timezone: {}", config.scheduler.timezone);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would harvest {} starting from page {}",
        config.source.start_url, config.source.start_page
    );

    Ok(())
}

/// Handles the main harvest operation
async fn handle_run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let fetcher = Arc::new(HttpFetcher::new(config.http.clone())?);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let storage = Arc::new(Mutex::new(storage));

    let coordinator = Coordinator::new(fetcher, Arc::clone(&storage), Arc::new(config));

    match coordinator.run().await {
        Ok(summary) => {
            let total = storage.lock().unwrap().count_cars()?;
            tracing::info!(
                "Harvest finished: {} pages, {} extracted, {} inserted ({:?}); {} listings stored",
                summary.pages_visited,
                summary.records_extracted,
                summary.records_inserted,
                summary.stop_reason,
                total
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
