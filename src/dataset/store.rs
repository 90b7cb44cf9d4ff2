//! Batched CSV persistence for pull request rows.

use std::fs::OpenOptions;

use camino::{Utf8Path, Utf8PathBuf};

use crate::github::ScrapeError;

use super::row::PullRequestRow;

/// Rows buffered before each append to disk.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// An append-oriented CSV dataset of pull request rows.
///
/// Rows accumulate in memory and are written in batches so an interrupted
/// run loses at most one batch. The header row is written only when the
/// file is first created, so repeated runs append cleanly.
#[derive(Debug)]
pub struct Dataset {
    path: Utf8PathBuf,
    buffer: Vec<PullRequestRow>,
    batch_size: usize,
}

impl Dataset {
    /// Opens a dataset at `path` with the default batch size.
    #[must_use]
    pub fn new(path: Utf8PathBuf) -> Self {
        Self::with_batch_size(path, DEFAULT_BATCH_SIZE)
    }

    /// Opens a dataset at `path` flushing every `batch_size` rows.
    #[must_use]
    pub fn with_batch_size(path: Utf8PathBuf, batch_size: usize) -> Self {
        Self {
            path,
            buffer: Vec::new(),
            batch_size: batch_size.max(1),
        }
    }

    /// Location of the backing CSV file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Rows currently buffered and not yet on disk.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Buffers a row, flushing to disk when the batch fills.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Dataset`] when a triggered flush fails.
    pub fn append(&mut self, row: PullRequestRow) -> Result<(), ScrapeError> {
        self.buffer.push(row);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Writes all buffered rows to disk, creating the file and header on
    /// first use. Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Dataset`] when the file cannot be opened or a
    /// row cannot be serialised.
    pub fn flush(&mut self) -> Result<usize, ScrapeError> {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let exists = self.path.as_std_path().exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path.as_std_path())
            .map_err(|error| dataset_error(&self.path, &error))?;

        let written = self.buffer.len();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(!exists)
            .from_writer(file);
        for row in self.buffer.drain(..) {
            writer
                .serialize(row)
                .map_err(|error| dataset_error(&self.path, &error))?;
        }
        writer
            .flush()
            .map_err(|error| dataset_error(&self.path, &error))?;

        Ok(written)
    }
}

/// Reads every row from a dataset file; a missing file reads as empty.
///
/// # Errors
///
/// Returns [`ScrapeError::Dataset`] when the file exists but cannot be
/// parsed.
pub fn read_rows(path: &Utf8Path) -> Result<Vec<PullRequestRow>, ScrapeError> {
    if !path.as_std_path().exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::Reader::from_path(path.as_std_path())
        .map_err(|error| dataset_error(path, &error))?;
    reader
        .deserialize()
        .map(|row| row.map_err(|error| dataset_error(path, &error)))
        .collect()
}

/// Pull request number of the last row already on disk, used to resume an
/// interrupted scrape. Missing or empty files yield `None`.
///
/// # Errors
///
/// Returns [`ScrapeError::Dataset`] when the file cannot be parsed.
pub fn last_recorded_number(path: &Utf8Path) -> Result<Option<u64>, ScrapeError> {
    Ok(read_rows(path)?.last().map(|row| row.number))
}

/// Replaces the file at `path` with exactly `rows`, header included.
///
/// Stages that rewrite a column (transcripts, classifications) regenerate
/// the whole file rather than editing in place.
///
/// # Errors
///
/// Returns [`ScrapeError::Dataset`] when the file cannot be written.
pub fn write_rows(path: &Utf8Path, rows: &[PullRequestRow]) -> Result<(), ScrapeError> {
    let mut writer =
        csv::Writer::from_path(path.as_std_path()).map_err(|error| dataset_error(path, &error))?;
    for row in rows {
        writer
            .serialize(row)
            .map_err(|error| dataset_error(path, &error))?;
    }
    writer
        .flush()
        .map_err(|error| dataset_error(path, &error))
}

fn dataset_error(path: &Utf8Path, error: &dyn std::fmt::Display) -> ScrapeError {
    ScrapeError::Dataset {
        message: format!("{path}: {error}"),
    }
}
