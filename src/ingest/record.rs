//! Raw and typed representations of one CSV row

use super::{LoadError, LoadResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column names as they appear in the source header (case-sensitive)
pub mod columns {
    pub const EXTRACT_DATE: &str = "extract_date";
    pub const SPECIMEN_DATE: &str = "specimen_date";
    pub const NUMBER_TESTED: &str = "Number_tested";
    pub const NUMBER_CONFIRMED: &str = "Number_confirmed";
    pub const NUMBER_HOSPITALIZED: &str = "Number_hospitalized";
    pub const NUMBER_DEATHS: &str = "Number_deaths";
}

/// One data line keyed by header name, values untouched
///
/// Equality and hashing cover the complete field set; column order in the
/// file does not matter. A header that repeats a name keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RawRecord {
    fields: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), value.into());
    }

    /// Look up a value by exact column name
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate `(column, value)` pairs in column-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = RawRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// A typed testing-cohort row
///
/// Dates stay as the strings found in the file; they are parsed only by
/// the enrichment pass, after the rows have been stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TestingRecord {
    pub extract_date: String,
    pub specimen_date: String,
    pub number_tested: i64,
    pub number_confirmed: i64,
    pub number_hospitalized: i64,
    pub number_deaths: i64,
}

impl TestingRecord {
    /// Build a typed record from a raw one
    pub fn from_raw(raw: &RawRecord) -> LoadResult<Self> {
        Ok(Self {
            extract_date: required(raw, columns::EXTRACT_DATE)?.to_string(),
            specimen_date: required(raw, columns::SPECIMEN_DATE)?.to_string(),
            number_tested: count(raw, columns::NUMBER_TESTED)?,
            number_confirmed: count(raw, columns::NUMBER_CONFIRMED)?,
            number_hospitalized: count(raw, columns::NUMBER_HOSPITALIZED)?,
            number_deaths: count(raw, columns::NUMBER_DEATHS)?,
        })
    }
}

fn required<'a>(raw: &'a RawRecord, column: &str) -> LoadResult<&'a str> {
    raw.get(column)
        .ok_or_else(|| LoadError::MissingColumn(column.to_string()))
}

fn count(raw: &RawRecord, column: &str) -> LoadResult<i64> {
    let value = required(raw, column)?;
    value.trim().parse().map_err(|_| LoadError::InvalidCount {
        column: column.to_string(),
        value: value.to_string(),
    })
}
