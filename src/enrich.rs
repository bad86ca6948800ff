//! Enrichment pass: typed dates and derived month/year columns
//!
//! Date strings that do not parse are treated as null, and rows with a
//! null extract or specimen date are dropped. Month and year are then
//! derived from the parsed dates.

use crate::storage::{JoinedRow, JoinedTable};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, info};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
];

/// Parse a date string, returning `None` when no known format matches
///
/// Accepts ISO dates, US `MM/DD/YYYY`, `YYYY/MM/DD`, and the same with a
/// time-of-day suffix (which is discarded).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// A joined row with parsed dates and derived calendar fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRow {
    pub test_id: i64,
    pub extract_date: NaiveDate,
    pub specimen_date: NaiveDate,
    pub number_tested: Option<i64>,
    pub number_confirmed: Option<i64>,
    pub number_hospitalized: Option<i64>,
    pub number_deaths: Option<i64>,
    pub extract_month: u32,
    pub extract_year: i32,
    pub specimen_month: u32,
    pub specimen_year: i32,
}

impl EnrichedRow {
    /// Enrich one joined row; `None` if either date is null or unparseable
    pub fn from_joined(row: &JoinedRow) -> Option<Self> {
        let extract_date = row.extract_date.as_deref().and_then(parse_date)?;
        let specimen_date = row.specimen_date.as_deref().and_then(parse_date)?;

        let mut enriched = Self {
            test_id: row.test_id,
            extract_date,
            specimen_date,
            number_tested: row.number_tested,
            number_confirmed: row.number_confirmed,
            number_hospitalized: row.number_hospitalized,
            number_deaths: row.number_deaths,
            extract_month: 0,
            extract_year: 0,
            specimen_month: 0,
            specimen_year: 0,
        };
        enriched.derive();
        Some(enriched)
    }

    /// Recompute month/year from the parsed dates
    pub fn derive(&mut self) {
        self.extract_month = self.extract_date.month();
        self.extract_year = self.extract_date.year();
        self.specimen_month = self.specimen_date.month();
        self.specimen_year = self.specimen_date.year();
    }
}

/// Result of an enrichment pass
#[derive(Debug, Clone)]
pub struct EnrichOutcome {
    pub table: EnrichedTable,
    /// Rows dropped for a null or unparseable date
    pub dropped: usize,
}

/// The enriched flat table, in TEST_ID order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichedTable {
    rows: Vec<EnrichedRow>,
}

impl EnrichedTable {
    pub fn new(rows: Vec<EnrichedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Recompute every derived column; running it twice changes nothing
    pub fn rederive(&mut self) {
        self.rows.iter_mut().for_each(EnrichedRow::derive);
    }
}

/// Parse dates, drop rows without both dates, derive month/year
pub fn enrich(table: &JoinedTable) -> EnrichOutcome {
    let mut rows = Vec::with_capacity(table.len());
    let mut dropped = 0;

    for row in table.rows() {
        match EnrichedRow::from_joined(row) {
            Some(enriched) => rows.push(enriched),
            None => {
                dropped += 1;
                debug!(
                    test_id = row.test_id,
                    extract_date = ?row.extract_date,
                    specimen_date = ?row.specimen_date,
                    "dropping row with unparseable date"
                );
            }
        }
    }

    info!(kept = rows.len(), dropped, "enriched joined table");
    EnrichOutcome {
        table: EnrichedTable::new(rows),
        dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(test_id: i64, extract: Option<&str>, specimen: Option<&str>) -> JoinedRow {
        JoinedRow {
            test_id,
            extract_date: extract.map(str::to_string),
            specimen_date: specimen.map(str::to_string),
            number_tested: Some(100),
            number_confirmed: Some(10),
            number_hospitalized: Some(2),
            number_deaths: None,
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 7).unwrap();
        for s in [
            "2021-03-07",
            "03/07/2021",
            "2021/03/07",
            "2021-03-07T00:00:00",
            "2021-03-07T00:00:00.000",
            "2021-03-07 13:45:00",
            "03/07/2021 12:00:00 AM",
            "03/07/2021 23:10:00",
            "2021-03-07T10:00:00+00:00",
            "  2021-03-07 ",
        ] {
            assert_eq!(parse_date(s), Some(expected), "failed to parse {s:?}");
        }
    }

    #[test]
    fn test_parse_date_rejects_garbage() {
        for s in ["", "   ", "not-a-date", "2021-13-01", "2021-02-30", "20210101"] {
            assert_eq!(parse_date(s), None, "unexpectedly parsed {s:?}");
        }
    }

    #[test]
    fn test_enrich_derives_month_and_year() {
        let table = JoinedTable::new(vec![joined(1, Some("2021-01-05"), Some("2020-12-30"))]);
        let outcome = enrich(&table);
        assert_eq!(outcome.dropped, 0);

        let row = &outcome.table.rows()[0];
        assert_eq!(row.extract_month, 1);
        assert_eq!(row.extract_year, 2021);
        assert_eq!(row.specimen_month, 12);
        assert_eq!(row.specimen_year, 2020);
        assert_eq!(row.number_deaths, None);
    }

    #[test]
    fn test_enrich_drops_null_and_malformed_dates() {
        let table = JoinedTable::new(vec![
            joined(1, Some("not-a-date"), Some("2020-12-30")),
            joined(2, Some("2021-01-01"), Some("")),
            joined(3, None, Some("2020-12-30")),
            joined(4, Some("2021-01-01"), None),
            joined(5, Some("2021-01-01"), Some("2020-12-30")),
        ]);

        let outcome = enrich(&table);
        assert_eq!(outcome.dropped, 4);
        assert_eq!(outcome.table.len(), 1);
        assert_eq!(outcome.table.rows()[0].test_id, 5);
    }

    #[test]
    fn test_rederive_is_idempotent() {
        let table = JoinedTable::new(vec![
            joined(1, Some("2021-01-05"), Some("2020-12-30")),
            joined(2, Some("06/15/2022"), Some("2022/06/01")),
        ]);
        let mut enriched = enrich(&table).table;
        let before = enriched.clone();

        enriched.rederive();
        assert_eq!(enriched, before);
        enriched.rederive();
        assert_eq!(enriched, before);
    }

    #[test]
    fn test_enrich_from_rendered_dates_is_idempotent() {
        let table = JoinedTable::new(vec![joined(1, Some("01/05/2021 12:00:00 AM"), Some("2020-12-30"))]);
        let first = enrich(&table).table;

        // feed the parsed dates back in as strings
        let again = JoinedTable::new(
            first
                .rows()
                .iter()
                .map(|r| {
                    joined(
                        r.test_id,
                        Some(r.extract_date.to_string().as_str()),
                        Some(r.specimen_date.to_string().as_str()),
                    )
                })
                .collect(),
        );
        let second = enrich(&again).table;
        assert_eq!(first, second);
    }
}
