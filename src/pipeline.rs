//! The end-to-end load pipeline
//!
//! file → raw records → dedup → typed records → store (three tables)
//! → joined table → enriched table. Each stage runs once, in order, and
//! the first failure ends the run.

use crate::config::{ConfigError, PipelineConfig};
use crate::enrich::{enrich, EnrichOutcome, EnrichedTable};
use crate::ingest::{dedup_with_stats, load_raw, LoadError, TestingRecord};
use crate::report::ReportError;
use crate::storage::{
    CohortStore, InsertSummary, JoinMode, OpenStore, SqliteStore, StorageError,
};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors that can end a pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Counters and output of one run
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Data rows read from the file
    pub parsed: usize,
    /// Rows left after deduplication
    pub unique: usize,
    pub insert: InsertSummary,
    /// Rows in the joined table
    pub joined: usize,
    /// Rows dropped by enrichment
    pub dropped: usize,
    pub table: EnrichedTable,
}

/// Open the configured database, load the CSV into it, and return the
/// enriched table
///
/// This is the only entry point that honors `fresh_db`.
pub fn run(config: &PipelineConfig) -> PipelineResult<PipelineReport> {
    let csv_path = config.csv_path()?;
    let mut store = if config.fresh_db {
        info!(db = %config.db_path.display(), "recreating database");
        SqliteStore::open_fresh(&config.db_path)?
    } else {
        SqliteStore::open(&config.db_path)?
    };
    load_into(&mut store, csv_path, config.join_mode)
}

/// Open the configured database for reading; never deletes it
pub fn open_store(config: &PipelineConfig) -> PipelineResult<SqliteStore> {
    Ok(SqliteStore::open(&config.db_path)?)
}

/// Load a CSV into an already-open store
pub fn load_into<S: CohortStore>(
    store: &mut S,
    csv_path: &Path,
    join_mode: JoinMode,
) -> PipelineResult<PipelineReport> {
    let raw = load_raw(csv_path)?;
    let parsed = raw.len();

    let (unique, _) = dedup_with_stats(raw);
    let records = unique
        .iter()
        .map(TestingRecord::from_raw)
        .collect::<Result<Vec<_>, _>>()?;

    store.create_schema()?;
    let insert = store.insert_records(&records)?;

    let joined = store.materialize(join_mode)?;
    let joined_rows = joined.len();
    let EnrichOutcome { table, dropped } = enrich(&joined);

    info!(
        parsed,
        unique = records.len(),
        inserted = insert.inserted,
        joined = joined_rows,
        enriched = table.len(),
        dropped,
        "pipeline complete"
    );

    Ok(PipelineReport {
        parsed,
        unique: records.len(),
        insert,
        joined: joined_rows,
        dropped,
        table,
    })
}

/// Build the enriched table from a populated store
pub fn load_table<S: CohortStore>(store: &S, join_mode: JoinMode) -> PipelineResult<EnrichOutcome> {
    let joined = store.materialize(join_mode)?;
    Ok(enrich(&joined))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "extract_date,specimen_date,Number_tested,Number_confirmed,Number_hospitalized,Number_deaths\n\
        2021-01-01,2020-12-30,100,10,2,0\n\
        2021-01-01,2020-12-30,100,10,2,0\n\
        2021-01-02,2020-12-31,50,5,1,1\n\
        not-a-date,2020-12-31,7,1,0,0\n";

    fn write_csv(dir: &tempfile::TempDir, text: &str) -> std::path::PathBuf {
        let path = dir.path().join("input.csv");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_load_into_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(&dir, CSV);
        let mut store = SqliteStore::open_in_memory().unwrap();

        let report = load_into(&mut store, &csv, JoinMode::PerRecord).unwrap();
        assert_eq!(report.parsed, 4);
        assert_eq!(report.unique, 3);
        assert_eq!(report.insert.inserted, 3);
        assert_eq!(report.joined, 3);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.table.len(), 2);
    }

    #[test]
    fn test_load_table_from_populated_store() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(&dir, CSV);
        let mut store = SqliteStore::open_in_memory().unwrap();
        load_into(&mut store, &csv, JoinMode::PerExtractDate).unwrap();

        let outcome = load_table(&store, JoinMode::PerExtractDate).unwrap();
        assert_eq!(outcome.table.len(), 2);
        assert_eq!(outcome.dropped, 1);
    }

    #[test]
    fn test_run_requires_csv_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            db_path: dir.path().join("cohorts.db"),
            ..PipelineConfig::default()
        };
        assert!(matches!(run(&config), Err(PipelineError::Config(ConfigError::MissingCsvPath))));
    }

    #[test]
    fn test_open_store_ignores_fresh_db() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            csv_path: Some(write_csv(&dir, CSV)),
            db_path: dir.path().join("cohorts.db"),
            fresh_db: true,
            join_mode: JoinMode::PerRecord,
        };
        run(&config).unwrap();

        let store = open_store(&config).unwrap();
        assert_eq!(store.table_counts().unwrap().date_info, 3);
        let outcome = load_table(&store, config.join_mode).unwrap();
        assert_eq!(outcome.table.len(), 2);
    }

    #[test]
    fn test_malformed_row_aborts_before_store_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(&dir, "extract_date,specimen_date,Number_tested,Number_confirmed,Number_hospitalized,Number_deaths\n2021-01-01,2020-12-30,100\n");
        let mut store = SqliteStore::open_in_memory().unwrap();

        let err = load_into(&mut store, &csv, JoinMode::PerRecord).unwrap_err();
        assert!(matches!(err, PipelineError::Load(LoadError::FieldCount { .. })));
        assert_eq!(store.table_counts().unwrap().date_info, 0);
    }
}
