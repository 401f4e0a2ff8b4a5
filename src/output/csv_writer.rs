//! CSV output for product records
//!
//! Writes a header row (`name,price,image_url,page_url`) followed by one row
//! per record. The file is truncated when the writer is created, so each run
//! overwrites the previous output.

use crate::crawler::ProductRecord;
use crate::output::RecordSink;
use crate::ScrapeError;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Column names, in the order the fields of [`ProductRecord`] serialize
pub const CSV_HEADER: [&str; 4] = ["name", "price", "image_url", "page_url"];

/// CSV record sink over any writer
pub struct CsvOutput<W: Write> {
    writer: csv::Writer<W>,
    written: u64,
}

impl CsvOutput<File> {
    /// Creates (or truncates) the CSV file and writes the header row
    ///
    /// A missing parent directory is an error; it is not created.
    pub fn create(path: &Path) -> Result<Self, ScrapeError> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> CsvOutput<W> {
    /// Wraps a writer and writes the header row immediately
    ///
    /// The header is written even if no record ever follows.
    pub fn new(inner: W) -> Result<Self, ScrapeError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(CSV_HEADER)?;

        Ok(Self { writer, written: 0 })
    }

    /// Flushes and returns the underlying writer
    pub fn into_inner(self) -> Result<W, ScrapeError> {
        self.writer.into_inner().map_err(|e| {
            let error = e.error();
            ScrapeError::Io(std::io::Error::new(error.kind(), error.to_string()))
        })
    }
}

impl<W: Write> RecordSink for CsvOutput<W> {
    fn write_records(&mut self, records: &[ProductRecord]) -> Result<(), ScrapeError> {
        for record in records {
            self.writer.serialize(record)?;
            self.written += 1;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), ScrapeError> {
        self.writer.flush()?;
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.written
    }
}

/// Writes all records to `path` in one go
///
/// # Returns
///
/// * `Ok(u64)` - Number of data rows written
/// * `Err(ScrapeError)` - The file could not be created or written
pub fn write_csv(path: &Path, records: &[ProductRecord]) -> Result<u64, ScrapeError> {
    let mut output = CsvOutput::create(path)?;
    output.write_records(records)?;
    output.finish()?;
    Ok(output.records_written())
}
