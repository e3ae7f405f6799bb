//! Flat-file storage
//!
//! Everything the harvester persists is a flat file: CSV exports of
//! harvested records, raw HTML pages, and newline-delimited input lists.
//! The employer source may also be an xlsx workbook.

pub mod export;
pub mod input;
pub mod templates;

use std::path::PathBuf;
use thiserror::Error;

pub use export::{flatten_record, Exporter};
pub use input::{load_links, load_proxies, read_employer_units, read_lines, write_lines, EmployerField, Sheet};
pub use templates::{Column, ColumnTemplate};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while reading or writing files
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// A column the reader depends on is missing from the header row
    #[error("Column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    #[error("No worksheet with data in {0}")]
    EmptySheet(PathBuf),

    /// A proxy line could not be parsed
    #[error("Invalid proxy on line {line}: {source}")]
    Proxy {
        line: usize,
        #[source]
        source: crate::scheduler::SchedulerError,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
