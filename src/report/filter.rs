//! Report selection: which analysis, over which rows

use super::{ReportError, ReportResult};
use crate::enrich::{EnrichedRow, EnrichedTable};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The analyses a report can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisType {
    /// Line plot of tests per day
    TestResults,
    /// Bar chart of confirmed cases per day
    ConfirmedCases,
    /// Bar chart of hospitalized cases per day
    HospitalizedCases,
    /// Bar chart of deaths per day
    Deaths,
    /// Descriptive statistics of every numeric column
    SummaryStatistics,
    /// Share of confirmed / hospitalized / deaths
    PieChart,
    /// Distribution of confirmed / hospitalized / deaths
    BoxPlot,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 7] = [
        AnalysisType::TestResults,
        AnalysisType::ConfirmedCases,
        AnalysisType::HospitalizedCases,
        AnalysisType::Deaths,
        AnalysisType::SummaryStatistics,
        AnalysisType::PieChart,
        AnalysisType::BoxPlot,
    ];

    /// Short machine name
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::TestResults => "test-results",
            AnalysisType::ConfirmedCases => "confirmed-cases",
            AnalysisType::HospitalizedCases => "hospitalized-cases",
            AnalysisType::Deaths => "deaths",
            AnalysisType::SummaryStatistics => "summary-statistics",
            AnalysisType::PieChart => "pie-chart",
            AnalysisType::BoxPlot => "box-plot",
        }
    }

    /// Human label, as shown on the selector
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::TestResults => "Plot Test Results",
            AnalysisType::ConfirmedCases => "Plot Confirmed Cases",
            AnalysisType::HospitalizedCases => "Plot Hospitalized Cases",
            AnalysisType::Deaths => "Plot Deaths",
            AnalysisType::SummaryStatistics => "Summary Statistics",
            AnalysisType::PieChart => "Pie Chart",
            AnalysisType::BoxPlot => "Box Plot",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = ReportError;

    /// Accepts the machine name or the selector label, case-insensitively
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AnalysisType::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(wanted) || a.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ReportError::UnknownAnalysis(s.to_string()))
    }
}

/// Which rows a report covers, by extract date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportFilter {
    /// Rows extracted in the given calendar month
    MonthYear { month: u32, year: i32 },
    /// Rows extracted between `start` and `end`, inclusive
    DateRange { start: NaiveDate, end: NaiveDate },
}

impl ReportFilter {
    pub fn validate(&self) -> ReportResult<()> {
        match *self {
            ReportFilter::MonthYear { month, .. } if !(1..=12).contains(&month) => {
                Err(ReportError::InvalidMonth(month))
            }
            ReportFilter::DateRange { start, end } if start > end => {
                Err(ReportError::InvalidRange { start, end })
            }
            _ => Ok(()),
        }
    }

    pub fn matches(&self, row: &EnrichedRow) -> bool {
        match *self {
            ReportFilter::MonthYear { month, year } => {
                row.extract_month == month && row.extract_year == year
            }
            ReportFilter::DateRange { start, end } => {
                start <= row.extract_date && row.extract_date <= end
            }
        }
    }

    /// Rows of `table` selected by this filter, in table order
    pub fn select<'a>(&self, table: &'a EnrichedTable) -> Vec<&'a EnrichedRow> {
        table.rows().iter().filter(|r| self.matches(r)).collect()
    }
}

impl fmt::Display for ReportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFilter::MonthYear { month, year } => write!(f, "{:04}-{:02}", year, month),
            ReportFilter::DateRange { start, end } => write!(f, "{} to {}", start, end),
        }
    }
}

/// A complete report selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub analysis: AnalysisType,
    pub filter: ReportFilter,
}

impl ReportRequest {
    pub fn new(analysis: AnalysisType, filter: ReportFilter) -> Self {
        Self { analysis, filter }
    }
}

/// Values available for the month/year selectors
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Distinct extract months, in order of first appearance
    pub months: Vec<u32>,
    /// Distinct extract years, in order of first appearance
    pub years: Vec<i32>,
    /// Earliest and latest extract date
    pub date_span: Option<(NaiveDate, NaiveDate)>,
}

impl FilterOptions {
    pub fn from_table(table: &EnrichedTable) -> Self {
        let mut options = FilterOptions::default();
        for row in table.rows() {
            if !options.months.contains(&row.extract_month) {
                options.months.push(row.extract_month);
            }
            if !options.years.contains(&row.extract_year) {
                options.years.push(row.extract_year);
            }
            options.date_span = Some(match options.date_span {
                None => (row.extract_date, row.extract_date),
                Some((lo, hi)) => (lo.min(row.extract_date), hi.max(row.extract_date)),
            });
        }
        options
    }
}
