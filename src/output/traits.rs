//! Output sink trait
//!
//! The pagination driver hands each page's records to a [`RecordSink`] as
//! soon as the page is extracted, so a write failure stops the run at the
//! page that caused it.

use crate::crawler::ProductRecord;
use crate::ScrapeError;

/// Destination for extracted product records
pub trait RecordSink {
    /// Writes one page worth of records
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Records written
    /// * `Err(ScrapeError)` - Write failed; the run must abort
    fn write_records(&mut self, records: &[ProductRecord]) -> Result<(), ScrapeError>;

    /// Flushes anything still buffered
    fn finish(&mut self) -> Result<(), ScrapeError> {
        Ok(())
    }

    /// Number of records accepted so far
    fn records_written(&self) -> u64;
}

/// In-memory sink, used when the caller wants the records themselves
impl RecordSink for Vec<ProductRecord> {
    fn write_records(&mut self, records: &[ProductRecord]) -> Result<(), ScrapeError> {
        self.extend_from_slice(records);
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.len() as u64
    }
}
