//! Crawler module for fetching and processing listing pages
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with retry logic
//! - Product extraction with configurable selectors
//! - The frontier of pages still to visit
//! - The pagination driver that ties them together

mod extractor;
mod fetcher;
mod frontier;
mod paginator;

pub use extractor::{CompiledRules, ListingPage, ParseError, ProductRecord, Products};
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpSession};
pub use frontier::{Frontier, PageKind, QueuedUrl};
pub use paginator::{Paginator, RunLimits};

use crate::config::Config;
use crate::output::{CsvOutput, RunSummary};
use crate::Result;
use std::path::Path;

/// Runs a complete scrape and writes the CSV output
///
/// This is the main entry point. It will:
/// 1. Create (truncate) the CSV file and write its header
/// 2. Build the HTTP session and compile the extraction rules
/// 3. Fetch, extract and write pages until a stop condition is met
///
/// # Arguments
///
/// * `config` - The scraper configuration
///
/// # Returns
///
/// * `Ok(RunSummary)` - Run finished; failed pages were skipped
/// * `Err(ScrapeError)` - Setup failed or the output could not be written
///
/// # Example
///
/// ```no_run
/// use shop_scraper::config::Config;
/// use shop_scraper::crawler::scrape;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.scraper.page_limit = Some(2);
/// let summary = scrape(&config).await?;
/// println!("{} products", summary.products_written);
/// # Ok(())
/// # }
/// ```
pub async fn scrape(config: &Config) -> Result<RunSummary> {
    let mut paginator = Paginator::new(config)?;
    let mut output = CsvOutput::create(Path::new(&config.output.csv_path))?;

    paginator.run(&mut output).await
}
