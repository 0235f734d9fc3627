//! Append-only delimited row sink
//!
//! The sink is shared by every worker. Appends are serialized behind one
//! lock, so records never interleave below row granularity. Output is flushed
//! every [`FLUSH_EVERY_ROWS`] rows and once more when the run ends.

use crate::output::OutputRow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

/// Errors that can occur while writing the output table
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Header has already been written")]
    HeaderAlreadyWritten,

    #[error("Row appended before the header was written")]
    HeaderMissing,

    #[error("Sink lock poisoned by a panicking writer")]
    Poisoned,
}

/// Default number of appended rows between flushes
pub const FLUSH_EVERY_ROWS: u64 = 64;

struct SinkState {
    writer: csv::Writer<Box<dyn Write + Send>>,
    header_written: bool,
}

/// Shared, append-only output table
pub struct RowSink {
    state: Mutex<SinkState>,
    rows: AtomicU64,
    flush_every: u64,
}

impl RowSink {
    /// Wraps any writer; `delimiter` separates fields within a record
    pub fn new(writer: Box<dyn Write + Send>, delimiter: u8) -> Self {
        let writer = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .flexible(false)
            .from_writer(writer);

        Self {
            state: Mutex::new(SinkState {
                writer,
                header_written: false,
            }),
            rows: AtomicU64::new(0),
            flush_every: FLUSH_EVERY_ROWS,
        }
    }

    /// Flushes after every `rows` appended rows; 1 flushes each row
    pub fn flush_every(mut self, rows: u64) -> Self {
        self.flush_every = rows.max(1);
        self
    }

    /// Creates (or truncates) the file at `path`
    pub fn create(path: &Path, delimiter: u8) -> Result<Self, SinkError> {
        let file = File::create(path)?;
        Ok(Self::new(Box::new(BufWriter::new(file)), delimiter))
    }

    /// Writes the header record; allowed exactly once, before any row
    pub fn write_header(&self, columns: &[&str]) -> Result<(), SinkError> {
        let mut state = self.state.lock().map_err(|_| SinkError::Poisoned)?;
        if state.header_written {
            return Err(SinkError::HeaderAlreadyWritten);
        }
        state.writer.write_record(columns)?;
        state.writer.flush()?;
        state.header_written = true;
        Ok(())
    }

    /// Appends one row; safe to call from any worker
    ///
    /// The row counter only counts records handed to the writer; call
    /// [`RowSink::flush`] before reading the output back.
    pub fn append_row(&self, row: &OutputRow) -> Result<(), SinkError> {
        let mut state = self.state.lock().map_err(|_| SinkError::Poisoned)?;
        if !state.header_written {
            return Err(SinkError::HeaderMissing);
        }
        state.writer.write_record(row.fields())?;
        let written = self.rows.fetch_add(1, Ordering::SeqCst) + 1;
        if written % self.flush_every == 0 {
            state.writer.flush()?;
        }
        Ok(())
    }

    /// Number of rows appended so far, header excluded
    pub fn rows_written(&self) -> u64 {
        self.rows.load(Ordering::SeqCst)
    }

    /// Flushes buffered output to the underlying writer
    pub fn flush(&self) -> Result<(), SinkError> {
        let mut state = self.state.lock().map_err(|_| SinkError::Poisoned)?;
        state.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn row(i: usize) -> OutputRow {
        OutputRow {
            category: "Makeup".to_string(),
            subcategory: "Lips".to_string(),
            product_type: "Lipstick".to_string(),
            product_name: format!("Brand{} Matte, \"Velvet\" #{}", i, i),
            brand: format!("Brand{}", i),
            price: "₹ 499".to_string(),
            discount: "20% Off".to_string(),
            rating: "4.2".to_string(),
            rating_count: "1,024".to_string(),
            description: format!("Line one\nline two; item {}", i),
        }
    }

    fn read_back(path: &Path, delimiter: u8) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .from_path(path)
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_header_then_rows() {
        let file = NamedTempFile::new().unwrap();
        let sink = RowSink::create(file.path(), b',').unwrap();

        sink.write_header(&OutputRow::HEADER).unwrap();
        sink.append_row(&row(1)).unwrap();
        sink.flush().unwrap();

        let records = read_back(file.path(), b',');
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], OutputRow::HEADER.to_vec());
        assert_eq!(records[1][3], "Brand1 Matte, \"Velvet\" #1");
        assert_eq!(records[1][9], "Line one\nline two; item 1");
        assert_eq!(sink.rows_written(), 1);
    }

    #[test]
    fn test_header_only_once() {
        let file = NamedTempFile::new().unwrap();
        let sink = RowSink::create(file.path(), b',').unwrap();

        sink.write_header(&OutputRow::HEADER).unwrap();
        let second = sink.write_header(&OutputRow::HEADER);
        assert!(matches!(second, Err(SinkError::HeaderAlreadyWritten)));
    }

    #[test]
    fn test_row_before_header_rejected() {
        let file = NamedTempFile::new().unwrap();
        let sink = RowSink::create(file.path(), b',').unwrap();

        let result = sink.append_row(&row(0));
        assert!(matches!(result, Err(SinkError::HeaderMissing)));
        assert_eq!(sink.rows_written(), 0);
    }

    #[test]
    fn test_custom_delimiter() {
        let file = NamedTempFile::new().unwrap();
        let sink = RowSink::create(file.path(), b';').unwrap();
        sink.write_header(&OutputRow::HEADER).unwrap();
        sink.append_row(&row(7)).unwrap();
        sink.flush().unwrap();

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert!(raw.starts_with("Category;Subcategory;Product Type;"));

        let records = read_back(file.path(), b';');
        assert_eq!(records[1].len(), 10);
        assert_eq!(records[1][9], "Line one\nline two; item 7");
    }

    #[test]
    fn test_concurrent_appends_keep_record_boundaries() {
        let file = NamedTempFile::new().unwrap();
        let sink = Arc::new(RowSink::create(file.path(), b',').unwrap());
        sink.write_header(&OutputRow::HEADER).unwrap();

        let threads: Vec<_> = (0..8)
            .map(|t| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.append_row(&row(t * 1000 + i)).unwrap();
                    }
                })
            })
            .collect();
        for handle in threads {
            handle.join().unwrap();
        }
        sink.flush().unwrap();

        let records = read_back(file.path(), b',');
        assert_eq!(records.len(), 1 + 8 * 50);
        assert_eq!(sink.rows_written(), 400);

        let mut seen = std::collections::HashSet::new();
        for record in &records[1..] {
            assert_eq!(record.len(), 10);
            let expected = row(record[4].trim_start_matches("Brand").parse().unwrap());
            assert_eq!(record, &expected.fields().map(str::to_string).to_vec());
            assert!(seen.insert(record[4].clone()));
        }
    }

    #[test]
    fn test_rows_buffered_until_flush() {
        let file = NamedTempFile::new().unwrap();
        let sink = RowSink::create(file.path(), b',').unwrap().flush_every(3);
        sink.write_header(&OutputRow::HEADER).unwrap();

        sink.append_row(&row(1)).unwrap();
        sink.append_row(&row(2)).unwrap();
        assert_eq!(read_back(file.path(), b',').len(), 1);

        sink.append_row(&row(3)).unwrap();
        assert_eq!(read_back(file.path(), b',').len(), 4);

        sink.append_row(&row(4)).unwrap();
        sink.flush().unwrap();
        assert_eq!(read_back(file.path(), b',').len(), 5);
        assert_eq!(sink.rows_written(), 4);
    }
}
