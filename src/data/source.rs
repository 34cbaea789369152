//! Source Reader Module
//!
//! Reads the raw tabular datasets the cache is populated from.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use indexmap::IndexMap;
use tracing::debug;

use crate::data::{Row, Value};
use crate::error::{CacheError, Result};

/// Stream of consecutive chunks, in source order.
pub type ChunkIter<'a> = Box<dyn Iterator<Item = Result<Vec<Row>>> + Send + 'a>;

// == Source Reader ==
/// A place datasets can be read from by name.
///
/// Reads are blocking; async callers run them on the blocking thread pool.
pub trait SourceReader: Send + Sync {
    /// Number of data rows in the dataset, header excluded.
    fn row_count(&self, name: &str) -> Result<usize>;

    /// Streams the dataset in chunks of at most `chunk_size` rows.
    fn read_chunks(&self, name: &str, chunk_size: usize) -> Result<ChunkIter<'_>>;
}

// == Dataset Catalog ==
/// The fixed set of dataset names and the files backing them.
#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    files: IndexMap<String, String>,
}

impl DatasetCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            files: IndexMap::new(),
        }
    }

    /// Catalog for the US DOT flight delay datasets.
    pub fn flight_delays() -> Self {
        Self::new()
            .with("airlines", "airlines.csv")
            .with("airports", "airports.csv")
            .with("flights", "flights.csv")
    }

    /// Adds a dataset name backed by `file`.
    pub fn with(mut self, name: impl Into<String>, file: impl Into<String>) -> Self {
        self.files.insert(name.into(), file.into());
        self
    }

    /// Looks up the file for a dataset name.
    pub fn file_for(&self, name: &str) -> Result<&str> {
        self.files
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| CacheError::UnknownDataset(name.to_string()))
    }
}

impl Default for DatasetCatalog {
    fn default() -> Self {
        Self::flight_delays()
    }
}

// == CSV Source ==
/// Reads catalog datasets from CSV files in a directory.
#[derive(Debug, Clone)]
pub struct CsvSource {
    data_dir: PathBuf,
    catalog: DatasetCatalog,
}

impl CsvSource {
    /// Creates a source over `data_dir` using the given catalog.
    pub fn new(data_dir: impl Into<PathBuf>, catalog: DatasetCatalog) -> Self {
        Self {
            data_dir: data_dir.into(),
            catalog,
        }
    }

    /// Path of the CSV file backing `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        Ok(self.data_dir.join(self.catalog.file_for(name)?))
    }

    fn open(path: &Path) -> Result<csv::Reader<File>> {
        let file = File::open(path)
            .map_err(|e| CacheError::Source(format!("{}: {}", path.display(), e)))?;
        Ok(ReaderBuilder::new().has_headers(true).from_reader(file))
    }
}

impl SourceReader for CsvSource {
    fn row_count(&self, name: &str) -> Result<usize> {
        let path = self.path_for(name)?;
        let mut reader = Self::open(&path)?;
        let mut count = 0;
        for record in reader.byte_records() {
            record?;
            count += 1;
        }
        debug!("Counted {} rows in {}", count, path.display());
        Ok(count)
    }

    fn read_chunks(&self, name: &str, chunk_size: usize) -> Result<ChunkIter<'_>> {
        if chunk_size == 0 {
            return Err(CacheError::InvalidRequest(
                "chunk size must be positive".to_string(),
            ));
        }
        let path = self.path_for(name)?;
        let mut reader = Self::open(&path)?;
        let headers = reader.headers()?.clone();
        Ok(Box::new(CsvChunks {
            records: reader.into_records(),
            headers,
            chunk_size,
            failed: false,
        }))
    }
}

/// Groups CSV records into chunks of typed rows.
struct CsvChunks {
    records: StringRecordsIntoIter<File>,
    headers: StringRecord,
    chunk_size: usize,
    failed: bool,
}

impl CsvChunks {
    fn to_row(&self, record: &StringRecord) -> Row {
        self.headers
            .iter()
            .zip(record.iter())
            .map(|(column, raw)| (column.to_string(), Value::infer(raw)))
            .collect()
    }
}

impl Iterator for CsvChunks {
    type Item = Result<Vec<Row>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let mut rows = Vec::with_capacity(self.chunk_size);
        while rows.len() < self.chunk_size {
            match self.records.next() {
                Some(Ok(record)) => rows.push(self.to_row(&record)),
                Some(Err(err)) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
                None => break,
            }
        }
        if rows.is_empty() {
            None
        } else {
            Some(Ok(rows))
        }
    }
}
