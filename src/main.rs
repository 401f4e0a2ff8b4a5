//! Shop-Scraper main entry point
//!
//! This is the command-line interface for the product listing scraper.

use anyhow::Context;
use clap::Parser;
use shop_scraper::config::{load_config_or_default, validate, Config};
use shop_scraper::crawler::scrape;
use shop_scraper::output::print_summary;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Shop-Scraper: a product listing scraper
///
/// Fetches product listing pages, extracts name, price and image URL for
/// every product, and writes them to a CSV file. Runs until the page limit,
/// the time limit, or the last listing page is reached.
#[derive(Parser, Debug)]
#[command(name = "shop-scraper")]
#[command(version)]
#[command(about = "Scrape product listings into a CSV file", long_about = None)]
struct Cli {
    /// Optional TOML configuration file (selectors, pacing, output)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Time limit for the scraping session in minutes
    #[arg(long, value_name = "MINUTES")]
    time_limit: Option<u64>,

    /// Maximum number of pages to fetch
    #[arg(long, value_name = "COUNT")]
    page_limit: Option<u32>,

    /// First listing page to fetch
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// CSV output path (overwritten)
    #[arg(short, long, value_name = "PATH")]
    output: Option<String>,

    /// Fixed delay between page fetches in milliseconds
    #[arg(long, value_name = "MS")]
    delay_ms: Option<u64>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Also append warnings and errors (skipped pages, failed writes) to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Validate config and show what would be scraped without fetching anything
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line values on top of the loaded configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(minutes) = self.time_limit {
            config.scraper.time_limit = Some(minutes);
        }
        if let Some(pages) = self.page_limit {
            config.scraper.page_limit = Some(pages);
        }
        if let Some(url) = &self.start_url {
            config.scraper.start_url = url.clone();
        }
        if let Some(path) = &self.output {
            config.output.csv_path = path.clone();
        }
        if let Some(delay) = self.delay_ms {
            config.scraper.delay_ms = delay;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config_or_default(Some(path))
                .with_context(|| format!("failed to load {}", path.display()))?
        }
        None => load_config_or_default(None)?,
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_scrape(&config, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// With `log_file`, warnings and errors are appended to that file as well,
/// regardless of `-q`/`-v`.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shop_scraper=info,warn"),
            1 => EnvFilter::new("shop_scraper=debug,info"),
            2 => EnvFilter::new("shop_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let console = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_filter(filter);

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_filter(LevelFilter::WARN),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    Ok(())
}

/// Opens the error log for appending, creating it if needed
fn open_log_file(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config) {
    println!("=== Shop-Scraper Dry Run ===\n");

    println!("Run:");
    println!("  Start URL: {}", config.scraper.start_url);
    println!(
        "  Page limit: {}",
        config
            .scraper
            .page_limit
            .map_or("none".to_string(), |n| n.to_string())
    );
    println!(
        "  Time limit: {}",
        config
            .scraper
            .time_limit
            .map_or("none".to_string(), |m| format!("{} min", m))
    );
    println!(
        "  Delay: {}ms (+ up to {}ms jitter)",
        config.scraper.delay_ms, config.scraper.delay_jitter_ms
    );
    println!(
        "  Timeout: {}s, retries: {} ({}ms backoff)",
        config.scraper.request_timeout_secs,
        config.scraper.retries,
        config.scraper.retry_backoff_ms
    );
    println!("  User agents: {}", config.user_agent.agents.len());

    println!("\nExtraction rules:");
    println!("  product: {}", config.rules.product);
    println!("  name: {}", config.rules.name);
    println!("  price: {}", config.rules.price);
    println!(
        "  image: {} [{}]",
        config.rules.image, config.rules.image_attribute
    );
    println!(
        "  next page: {}",
        config.rules.next_page.as_deref().unwrap_or("none")
    );

    let follow = &config.rules.follow;
    if follow.enabled {
        println!("\nFollowing links within: {}", follow.domains.join(", "));
        if let Some(pattern) = &follow.listing_pattern {
            println!("  Listing pattern: {}", pattern);
        }
    }

    println!("\nOutput: {}", config.output.csv_path);
    println!("\n✓ Configuration is valid");
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, quiet: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Starting scrape at {} (page limit: {:?}, time limit: {:?} min)",
        config.scraper.start_url,
        config.scraper.page_limit,
        config.scraper.time_limit
    );

    match scrape(config).await {
        Ok(summary) => {
            tracing::info!("Products written to {}", config.output.csv_path);
            if !quiet {
                print_summary(&summary);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e).context("scrape aborted")
        }
    }
}
