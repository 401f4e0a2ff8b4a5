//! Output module for scraped products and run reports
//!
//! This module handles:
//! - Writing product records to CSV
//! - The sink abstraction the pagination driver writes through
//! - Run statistics

mod csv_writer;
pub mod stats;
mod traits;

pub use csv_writer::{write_csv, CsvOutput, CSV_HEADER};
pub use stats::{print_summary, RunSummary, StopReason};
pub use traits::RecordSink;
