//! Reporting over the enriched table
//!
//! A `ReportRequest` (analysis + filter) is turned into a `RenderPlan`, a
//! toolkit-independent description of what to draw. `render_text` draws a
//! plan on the terminal; the JSON form of a plan can feed any charting
//! front end.

mod filter;
mod plan;
mod stats;
mod text;

pub use filter::{AnalysisType, FilterOptions, ReportFilter, ReportRequest};
pub use plan::{render, BoxSeries, DayPoint, PieSlice, RenderPlan, Report, PIE_START_ANGLE};
pub use stats::{BoxSummary, ColumnSummary};
pub use text::render_text;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur while building a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Unknown analysis: {0}")]
    UnknownAnalysis(String),

    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),

    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;
