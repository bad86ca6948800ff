//! SQLite storage backend for cohort data

use super::rows::{CasesInfoRow, DateInfoRow, JoinedRow, JoinedTable, TestInfoRow};
use super::traits::{
    CohortStore, InsertSummary, JoinMode, OpenStore, StorageError, StorageResult, TableCounts,
};
use crate::ingest::TestingRecord;
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::{debug, info};

const CREATE_DATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS DATEINFO (
        TEST_ID INTEGER PRIMARY KEY AUTOINCREMENT,
        EXTRACT_DATE DATE,
        SPECIMEN_DATE DATE
    )"#;

// TEST_ID is copied from DATEINFO rather than generated, so the three
// tables always agree on which source row an id belongs to.
const CREATE_TEST_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS TESTINFO (
        TEST_ID INTEGER PRIMARY KEY,
        NUMBER_TESTED INTEGER,
        FOREIGN KEY (TEST_ID) REFERENCES DATEINFO(TEST_ID)
    )"#;

const CREATE_CASES_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS CASESINFO (
        TEST_ID INTEGER PRIMARY KEY,
        NUMBER_CONFIRMED INTEGER,
        NUMBER_HOSPITALIZED INTEGER,
        NUMBER_DEATHS INTEGER,
        FOREIGN KEY (TEST_ID) REFERENCES DATEINFO(TEST_ID)
    )"#;

const JOIN_COLUMNS: &str = r#"
    SELECT D.TEST_ID, D.EXTRACT_DATE, D.SPECIMEN_DATE, T.NUMBER_TESTED,
           C.NUMBER_CONFIRMED, C.NUMBER_HOSPITALIZED, C.NUMBER_DEATHS
    FROM DATEINFO D
    JOIN TESTINFO T ON D.TEST_ID = T.TEST_ID
    JOIN CASESINFO C ON D.TEST_ID = C.TEST_ID"#;

// Keeps the lowest TEST_ID per extract date among fully joined rows.
const PER_EXTRACT_DATE_FILTER: &str = r#"
    WHERE D.TEST_ID IN (
        SELECT MIN(D2.TEST_ID)
        FROM DATEINFO D2
        JOIN TESTINFO T2 ON D2.TEST_ID = T2.TEST_ID
        JOIN CASESINFO C2 ON D2.TEST_ID = C2.TEST_ID
        GROUP BY D2.EXTRACT_DATE
    )"#;

/// SQLite-backed cohort store
///
/// Owns the only connection used for a run. The connection closes when
/// the store is dropped.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    fn from_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self { conn };
        store.create_schema()?;
        Ok(store)
    }

    fn count(&self, table: &str) -> StorageResult<usize> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn row_to_joined(row: &Row<'_>) -> rusqlite::Result<JoinedRow> {
        Ok(JoinedRow {
            test_id: row.get(0)?,
            extract_date: text_column(row, 1)?,
            specimen_date: text_column(row, 2)?,
            number_tested: row.get(3)?,
            number_confirmed: row.get(4)?,
            number_hospitalized: row.get(5)?,
            number_deaths: row.get(6)?,
        })
    }
}

/// Read a DATE column as text whatever storage class SQLite chose
///
/// DATE has NUMERIC affinity, so a value such as `20210101` is stored as
/// an integer.
fn text_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(t) | ValueRef::Blob(t) => Some(String::from_utf8_lossy(t).into_owned()),
    })
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opened database");
        Self::from_connection(conn)
    }

    fn open_in_memory() -> StorageResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }
}

impl CohortStore for SqliteStore {
    fn create_schema(&self) -> StorageResult<()> {
        for (table, sql) in [
            ("DATEINFO", CREATE_DATE_TABLE),
            ("TESTINFO", CREATE_TEST_TABLE),
            ("CASESINFO", CREATE_CASES_TABLE),
        ] {
            self.conn
                .execute(sql, [])
                .map_err(|source| StorageError::Schema { table, source })?;
        }
        Ok(())
    }

    fn insert_records(&mut self, records: &[TestingRecord]) -> StorageResult<InsertSummary> {
        let tx = self.conn.transaction()?;
        let mut summary = InsertSummary::default();
        {
            let mut date_stmt = tx.prepare_cached(
                "INSERT INTO DATEINFO (EXTRACT_DATE, SPECIMEN_DATE) VALUES (?1, ?2)",
            )?;
            let mut test_stmt =
                tx.prepare_cached("INSERT INTO TESTINFO (TEST_ID, NUMBER_TESTED) VALUES (?1, ?2)")?;
            let mut cases_stmt = tx.prepare_cached(
                "INSERT INTO CASESINFO (TEST_ID, NUMBER_CONFIRMED, NUMBER_HOSPITALIZED, NUMBER_DEATHS)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for record in records {
                date_stmt.execute(params![record.extract_date, record.specimen_date])?;
                let test_id = tx.last_insert_rowid();
                test_stmt.execute(params![test_id, record.number_tested])?;
                cases_stmt.execute(params![
                    test_id,
                    record.number_confirmed,
                    record.number_hospitalized,
                    record.number_deaths,
                ])?;

                summary.inserted += 1;
                summary.first_id.get_or_insert(test_id);
                summary.last_id = Some(test_id);
            }
        }
        tx.commit()?;

        info!(
            rows = summary.inserted,
            first_id = ?summary.first_id,
            last_id = ?summary.last_id,
            "inserted rows into DATEINFO, TESTINFO, CASESINFO"
        );
        Ok(summary)
    }

    fn materialize(&self, mode: JoinMode) -> StorageResult<JoinedTable> {
        let filter = match mode {
            JoinMode::PerExtractDate => PER_EXTRACT_DATE_FILTER,
            JoinMode::PerRecord => "",
        };
        let sql = format!("{JOIN_COLUMNS}{filter}\n    ORDER BY D.TEST_ID ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], Self::row_to_joined)?
            .collect::<Result<Vec<_>, _>>()?;

        info!(rows = rows.len(), mode = ?mode, "materialized joined table");
        Ok(JoinedTable::new(rows))
    }

    fn table_counts(&self) -> StorageResult<TableCounts> {
        Ok(TableCounts {
            date_info: self.count("DATEINFO")?,
            test_info: self.count("TESTINFO")?,
            cases_info: self.count("CASESINFO")?,
        })
    }

    fn date_info(&self, limit: usize) -> StorageResult<Vec<DateInfoRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT TEST_ID, EXTRACT_DATE, SPECIMEN_DATE FROM DATEINFO ORDER BY TEST_ID LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(DateInfoRow {
                    test_id: row.get(0)?,
                    extract_date: text_column(row, 1)?,
                    specimen_date: text_column(row, 2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn test_info(&self, limit: usize) -> StorageResult<Vec<TestInfoRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT TEST_ID, NUMBER_TESTED FROM TESTINFO ORDER BY TEST_ID LIMIT ?1")?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(TestInfoRow {
                    test_id: row.get(0)?,
                    number_tested: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn cases_info(&self, limit: usize) -> StorageResult<Vec<CasesInfoRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT TEST_ID, NUMBER_CONFIRMED, NUMBER_HOSPITALIZED, NUMBER_DEATHS
             FROM CASESINFO ORDER BY TEST_ID LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(CasesInfoRow {
                    test_id: row.get(0)?,
                    number_confirmed: row.get(1)?,
                    number_hospitalized: row.get(2)?,
                    number_deaths: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
