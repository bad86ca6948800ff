//! Storage trait definitions

use super::rows::{CasesInfoRow, DateInfoRow, JoinedTable, TestInfoRow};
use crate::ingest::TestingRecord;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Schema creation failed for {table}: {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// How the three tables are joined back into one flat table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinMode {
    /// One row per distinct extract date: the row with the lowest TEST_ID
    #[default]
    PerExtractDate,
    /// Every stored row
    PerRecord,
}

/// Outcome of a bulk insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    /// Rows written to each of the three tables
    pub inserted: usize,
    /// First TEST_ID assigned (None when nothing was inserted)
    pub first_id: Option<i64>,
    /// Last TEST_ID assigned
    pub last_id: Option<i64>,
}

/// Row counts of the three tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub date_info: usize,
    pub test_info: usize,
    pub cases_info: usize,
}

/// Trait for cohort storage backends
///
/// A store is the single handle to the relational database for a run; it
/// is passed explicitly to every stage that needs it.
pub trait CohortStore {
    /// Create DATEINFO, TESTINFO and CASESINFO if absent
    fn create_schema(&self) -> StorageResult<()>;

    /// Insert records into all three tables under a shared TEST_ID per record
    fn insert_records(&mut self, records: &[TestingRecord]) -> StorageResult<InsertSummary>;

    /// Join the three tables into one flat table ordered by TEST_ID
    fn materialize(&self, mode: JoinMode) -> StorageResult<JoinedTable>;

    /// Count rows in each table
    fn table_counts(&self) -> StorageResult<TableCounts>;

    /// First `limit` rows of DATEINFO
    fn date_info(&self, limit: usize) -> StorageResult<Vec<DateInfoRow>>;

    /// First `limit` rows of TESTINFO
    fn test_info(&self, limit: usize) -> StorageResult<Vec<TestInfoRow>>;

    /// First `limit` rows of CASESINFO
    fn cases_info(&self, limit: usize) -> StorageResult<Vec<CasesInfoRow>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: CohortStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Delete any existing database file at the path, then open a new one
    fn open_fresh(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Self::open(path)
    }

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
