//! Run statistics
//!
//! Counters collected by the pagination driver and printed at the end of a
//! run.

use std::fmt;
use std::time::Duration;

/// Why the pagination loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured number of fetches was issued
    PageLimit,
    /// The wall-clock limit elapsed
    TimeLimit,
    /// No further page link was found
    FrontierExhausted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::PageLimit => "page limit reached",
            Self::TimeLimit => "time limit reached",
            Self::FrontierExhausted => "no more pages",
        };
        f.write_str(text)
    }
}

/// Summary of one scraping run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Fetches issued, successful or not
    pub pages_fetched: u32,

    /// Fetches that failed and were skipped
    pub pages_failed: u32,

    /// Pages run through the product extractor
    pub pages_extracted: u32,

    /// Records handed to the output
    pub products_written: u64,

    /// Product entries skipped because a required field was missing
    pub entries_skipped: u64,

    pub stop_reason: StopReason,

    pub elapsed: Duration,
}

impl RunSummary {
    /// Fetches that returned a page
    pub fn pages_processed(&self) -> u32 {
        self.pages_fetched - self.pages_failed
    }

    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Scrape Summary ===\n");

    println!("Pages:");
    println!("  Fetched: {}", summary.pages_fetched);
    println!("  Failed: {}", summary.pages_failed);
    println!("  Extracted: {}", summary.pages_extracted);
    println!();

    println!("Products:");
    println!("  Written: {}", summary.products_written);
    println!("  Skipped (missing name): {}", summary.entries_skipped);
    println!();

    println!("Stopped: {}", summary.stop_reason);
    println!(
        "The scraper ran for {:.2} minutes and processed {} pages.",
        summary.elapsed_minutes(),
        summary.pages_processed()
    );
}
