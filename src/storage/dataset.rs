//! JSON Lines dataset reading and writing.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::error_handling::{ConfigParseError, DeserializationError};
use crate::models::DomainMeasurement;

/// Appends measurements to a JSON Lines sink, one flushed line per record.
pub struct DatasetWriter<W: Write> {
    inner: W,
    written: usize,
}

impl DatasetWriter<BufWriter<File>> {
    /// Creates (or truncates) the dataset file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create dataset file: {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> DatasetWriter<W> {
    /// Wraps an arbitrary writer.
    pub fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    /// Writes one record and flushes it.
    pub fn write(&mut self, record: &DomainMeasurement) -> Result<()> {
        serde_json::to_writer(&mut self.inner, record)
            .with_context(|| format!("Failed to serialize measurement of {}", record.domain))?;
        self.inner.write_all(b"\n")?;
        self.inner.flush().context("Failed to flush dataset")?;
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads every record from a JSON Lines reader. Blank lines are skipped.
///
/// # Errors
///
/// Returns `ConfigParseError::Dataset` with the 1-based line number for the
/// first record that has a missing, unknown or mistyped field.
pub fn read_dataset<R: BufRead>(reader: R) -> Result<Vec<DomainMeasurement>, ConfigParseError> {
    let mut records = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ConfigParseError::Io {
            path: "dataset".to_string(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| DeserializationError {
            line_number: index + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Loads a dataset file written by `DatasetWriter` or `save_dataset`.
///
/// # Errors
///
/// Returns `ConfigParseError` if the file cannot be read or a record is malformed.
pub fn load_dataset(path: &Path) -> Result<Vec<DomainMeasurement>, ConfigParseError> {
    let file = File::open(path).map_err(|source| ConfigParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_dataset(BufReader::new(file))
}

/// Writes `records` to `path`, replacing any existing file.
pub fn save_dataset(path: &Path, records: &[DomainMeasurement]) -> Result<()> {
    let mut writer = DatasetWriter::create(path)?;
    for record in records {
        writer.write(record)?;
    }
    Ok(())
}
