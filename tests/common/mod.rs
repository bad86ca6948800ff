//! Shared fixtures for pipeline integration tests

#![allow(dead_code)]

use std::path::PathBuf;
use tempfile::TempDir;

pub const HEADER: &str =
    "extract_date,specimen_date,Number_tested,Number_confirmed,Number_hospitalized,Number_deaths";

/// A temporary directory holding one input CSV and a database path
pub struct Fixture {
    pub dir: TempDir,
    pub csv: PathBuf,
    pub db: PathBuf,
}

impl Fixture {
    /// Write `body` (data lines, without header) to a fresh CSV
    pub fn with_rows(body: &str) -> Self {
        Self::with_text(&format!("{HEADER}\n{body}"))
    }

    /// Write `text` verbatim as the CSV
    pub fn with_text(text: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let csv = dir.path().join("cohorts.csv");
        std::fs::write(&csv, text).expect("write csv");
        let db = dir.path().join("cohorts.db");
        Self { dir, csv, db }
    }

    pub fn config(&self) -> cohorts::PipelineConfig {
        cohorts::PipelineConfig {
            csv_path: Some(self.csv.clone()),
            db_path: self.db.clone(),
            ..cohorts::PipelineConfig::default()
        }
    }
}

/// One CSV data line
pub fn line(extract: &str, specimen: &str, tested: i64, confirmed: i64, hosp: i64, deaths: i64) -> String {
    format!("{extract},{specimen},{tested},{confirmed},{hosp},{deaths}\n")
}
