//! Ingestion of the raw cohort CSV
//!
//! The loader reads a comma-delimited file into header-keyed records,
//! `TestingRecord` gives them types, and `dedup` drops exact duplicates
//! while keeping first-seen order.

mod dedup;
mod loader;
mod record;

pub use dedup::{dedup, dedup_with_stats, DedupStats};
pub use loader::{load_raw, load_records, parse_raw};
pub use record::{columns, RawRecord, TestingRecord};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading the input file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed CSV: {0}")]
    Csv(#[source] csv::Error),

    #[error("Input has no header line")]
    MissingHeader,

    #[error("Line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Column {column}: '{value}' is not an integer count")]
    InvalidCount { column: String, value: String },
}

/// Result type for ingestion
pub type LoadResult<T> = Result<T, LoadError>;
