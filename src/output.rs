// src/output.rs

use crate::error::ImageServerError;
use crate::identify::IdentifyResult;
use crate::record::FlatRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes flat records as CSV rows.
///
/// The header is fixed by the first record. Later records fill columns they
/// lack with empty cells; columns that are not in the header are dropped.
pub struct RecordWriter<W: Write> {
    writer: csv::Writer<W>,
    header: Option<Vec<String>>,
    rows: usize,
}

impl RecordWriter<File> {
    /// Creates (or truncates) the CSV file at `path`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ImageServerError> {
        let file = File::create(path.as_ref())?;
        Ok(Self::from_writer(file))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn from_writer(inner: W) -> Self {
        RecordWriter {
            writer: csv::Writer::from_writer(inner),
            header: None,
            rows: 0,
        }
    }

    /// Returns the header once the first record was written.
    pub fn header(&self) -> Option<&[String]> {
        self.header.as_deref()
    }

    /// Number of data rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn write_record(&mut self, record: &FlatRecord) -> Result<(), ImageServerError> {
        if self.header.is_none() {
            let header: Vec<String> = record.column_names().map(str::to_string).collect();
            self.writer.write_record(&header)?;
            self.header = Some(header);
        }
        let header = self.header.as_deref().unwrap_or_default();

        let dropped: Vec<&str> = record
            .column_names()
            .filter(|c| !header.iter().any(|h| h == c))
            .collect();
        if !dropped.is_empty() {
            log::warn!(
                "Dropping columns not present in the CSV header: {}",
                dropped.join(", ")
            );
        }

        let row: Vec<&str> = header
            .iter()
            .map(|column| record.get(column).unwrap_or(""))
            .collect();
        self.writer.write_record(&row)?;
        self.rows += 1;
        Ok(())
    }

    /// Writes one row per raster of `result` and returns the number of rows written.
    pub fn write_result(&mut self, result: &IdentifyResult) -> Result<usize, ImageServerError> {
        let records = result.to_records()?;
        for record in &records {
            self.write_record(record)?;
        }
        Ok(records.len())
    }

    pub fn flush(&mut self) -> Result<(), ImageServerError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W, ImageServerError> {
        self.writer
            .into_inner()
            .map_err(|e| ImageServerError::IoError(e.into_error()))
    }
}

/// Writes the rasters of all `results` into a single CSV file at `path`.
///
/// Returns the number of data rows written.
pub fn write_results<P: AsRef<Path>>(
    path: P,
    results: &[IdentifyResult],
) -> Result<usize, ImageServerError> {
    let mut writer = RecordWriter::create(path.as_ref())?;
    for result in results {
        writer.write_result(result)?;
    }
    writer.flush()?;
    log::info!(
        "Wrote {} rows to {}",
        writer.rows(),
        path.as_ref().display()
    );
    Ok(writer.rows())
}
