//! Relational storage for cohort records
//!
//! Records are normalized into three tables (DATEINFO, TESTINFO, CASESINFO)
//! sharing a TEST_ID, and joined back into one flat table for analysis.
//! The primary implementation is `SqliteStore`.

mod rows;
mod sqlite;
mod traits;

pub use rows::{
    CasesInfoRow, DateInfoRow, JoinedRow, JoinedTable, NullCounts, TestInfoRow, JOINED_COLUMNS,
};
pub use sqlite::SqliteStore;
pub use traits::{
    CohortStore, InsertSummary, JoinMode, OpenStore, StorageError, StorageResult, TableCounts,
};
