//! Cohorts: COVID-19 testing cohort ETL and reporting
//!
//! Loads a CSV of testing, case, hospitalization and death counts (by
//! extract date and specimen date) into a normalized SQLite schema, joins
//! it back into one flat table, enriches it with calendar fields, and
//! renders filtered reports.
//!
//! # Stages
//!
//! - **ingest**: raw CSV rows, typed records, order-preserving dedup
//! - **storage**: DATEINFO / TESTINFO / CASESINFO sharing one TEST_ID
//! - **enrich**: date parsing, invalid-date removal, month/year fields
//! - **report**: line/bar/pie/box/summary instructions per filter
//!
//! # Example
//!
//! ```
//! use cohorts::{enrich, CohortStore, JoinMode, OpenStore, SqliteStore, TestingRecord};
//!
//! let mut store = SqliteStore::open_in_memory().unwrap();
//! store
//!     .insert_records(&[TestingRecord {
//!         extract_date: "2021-01-01".into(),
//!         specimen_date: "2020-12-30".into(),
//!         number_tested: 100,
//!         number_confirmed: 10,
//!         number_hospitalized: 2,
//!         number_deaths: 0,
//!     }])
//!     .unwrap();
//! let joined = store.materialize(JoinMode::PerExtractDate).unwrap();
//! assert_eq!(enrich(&joined).table.len(), 1);
//! ```

pub mod config;
pub mod enrich;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod storage;

pub use config::{ConfigError, PipelineConfig};
pub use enrich::{enrich, parse_date, EnrichOutcome, EnrichedRow, EnrichedTable};
pub use ingest::{dedup, LoadError, RawRecord, TestingRecord};
pub use pipeline::{PipelineError, PipelineReport, PipelineResult};
pub use report::{
    render, render_text, AnalysisType, FilterOptions, RenderPlan, Report, ReportError,
    ReportFilter, ReportRequest,
};
pub use storage::{
    CohortStore, JoinMode, JoinedRow, JoinedTable, OpenStore, SqliteStore, StorageError,
    StorageResult,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
