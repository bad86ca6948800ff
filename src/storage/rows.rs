//! Row types read back from the store

use serde::Serialize;

/// A DATEINFO row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateInfoRow {
    pub test_id: i64,
    pub extract_date: Option<String>,
    pub specimen_date: Option<String>,
}

/// A TESTINFO row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestInfoRow {
    pub test_id: i64,
    pub number_tested: Option<i64>,
}

/// A CASESINFO row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CasesInfoRow {
    pub test_id: i64,
    pub number_confirmed: Option<i64>,
    pub number_hospitalized: Option<i64>,
    pub number_deaths: Option<i64>,
}

/// One row of the joined flat table
///
/// Every value column is nullable: the table reflects what is stored,
/// which may come from a database this crate did not populate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinedRow {
    pub test_id: i64,
    pub extract_date: Option<String>,
    pub specimen_date: Option<String>,
    pub number_tested: Option<i64>,
    pub number_confirmed: Option<i64>,
    pub number_hospitalized: Option<i64>,
    pub number_deaths: Option<i64>,
}

/// Number of columns in a `JoinedRow`
pub const JOINED_COLUMNS: usize = 7;

/// Null counts per joined column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NullCounts {
    pub extract_date: usize,
    pub specimen_date: usize,
    pub number_tested: usize,
    pub number_confirmed: usize,
    pub number_hospitalized: usize,
    pub number_deaths: usize,
}

impl NullCounts {
    pub fn total(&self) -> usize {
        self.extract_date
            + self.specimen_date
            + self.number_tested
            + self.number_confirmed
            + self.number_hospitalized
            + self.number_deaths
    }
}

/// The joined table, ordered by TEST_ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinedTable {
    rows: Vec<JoinedRow>,
}

impl JoinedTable {
    pub fn new(rows: Vec<JoinedRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[JoinedRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<JoinedRow> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> &[JoinedRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Last `n` rows
    pub fn tail(&self, n: usize) -> &[JoinedRow] {
        &self.rows[self.rows.len().saturating_sub(n)..]
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), JOINED_COLUMNS)
    }

    pub fn null_counts(&self) -> NullCounts {
        self.rows.iter().fold(NullCounts::default(), |mut acc, r| {
            acc.extract_date += r.extract_date.is_none() as usize;
            acc.specimen_date += r.specimen_date.is_none() as usize;
            acc.number_tested += r.number_tested.is_none() as usize;
            acc.number_confirmed += r.number_confirmed.is_none() as usize;
            acc.number_hospitalized += r.number_hospitalized.is_none() as usize;
            acc.number_deaths += r.number_deaths.is_none() as usize;
            acc
        })
    }
}
