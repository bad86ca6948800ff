//! Rendering instructions derived from a report request
//!
//! `render` is a pure function of the enriched table and the request. It
//! never touches the table and knows nothing about how the plan will be
//! drawn.

use super::filter::{AnalysisType, ReportRequest};
use super::stats::{BoxSummary, ColumnSummary};
use super::ReportResult;
use crate::enrich::{EnrichedRow, EnrichedTable};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Starting angle of the first pie slice, in degrees
pub const PIE_START_ANGLE: f64 = 140.0;

/// One (day-of-month, value) point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DayPoint {
    pub day: u32,
    /// Mean of the column over rows extracted on that day
    pub value: f64,
}

/// One pie slice
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    /// Column sum, widened so totals of large counts cannot overflow
    pub value: i128,
    /// Share of the pie total, 0-100
    pub percent: f64,
}

/// One box of a box plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSeries {
    pub label: String,
    pub count: usize,
    /// `None` when the selection has no values for this series
    pub summary: Option<BoxSummary>,
}

/// What to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderPlan {
    Line {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<DayPoint>,
    },
    Bar {
        title: String,
        x_label: String,
        y_label: String,
        points: Vec<DayPoint>,
    },
    Pie {
        title: String,
        start_angle: f64,
        slices: Vec<PieSlice>,
    },
    Box {
        title: String,
        series: Vec<BoxSeries>,
    },
    Summary {
        columns: Vec<ColumnSummary>,
    },
}

impl RenderPlan {
    pub fn title(&self) -> &str {
        match self {
            RenderPlan::Line { title, .. }
            | RenderPlan::Bar { title, .. }
            | RenderPlan::Pie { title, .. }
            | RenderPlan::Box { title, .. } => title.as_str(),
            RenderPlan::Summary { .. } => "Summary Statistics",
        }
    }
}

/// A rendered report: the request, how many rows it selected, and the plan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub request: ReportRequest,
    pub rows: usize,
    pub plan: RenderPlan,
}

type Column = fn(&EnrichedRow) -> Option<i64>;

const CASE_COLUMNS: [(&str, Column); 3] = [
    ("Confirmed", |r| r.number_confirmed),
    ("Hospitalized", |r| r.number_hospitalized),
    ("Deaths", |r| r.number_deaths),
];

/// Build the rendering instructions for a request
pub fn render(table: &EnrichedTable, request: &ReportRequest) -> ReportResult<Report> {
    request.filter.validate()?;
    let rows = request.filter.select(table);
    if rows.is_empty() {
        warn!(filter = %request.filter, analysis = %request.analysis, "no rows match the selection");
    } else {
        debug!(filter = %request.filter, rows = rows.len(), "selected rows");
    }

    let plan = match request.analysis {
        AnalysisType::TestResults => RenderPlan::Line {
            title: "Test Results Over Time".to_string(),
            x_label: "day".to_string(),
            y_label: "NUMBER_TESTED".to_string(),
            points: daily_means(&rows, |r| r.number_tested),
        },
        AnalysisType::ConfirmedCases => {
            bar("Confirmed Cases Over Time", "NUMBER_CONFIRMED", &rows, |r| r.number_confirmed)
        }
        AnalysisType::HospitalizedCases => bar(
            "Hospitalized Cases Over Time",
            "NUMBER_HOSPITALIZED",
            &rows,
            |r| r.number_hospitalized,
        ),
        AnalysisType::Deaths => bar("Deaths Over Time", "NUMBER_DEATHS", &rows, |r| r.number_deaths),
        AnalysisType::SummaryStatistics => RenderPlan::Summary {
            columns: summary_columns(&rows),
        },
        AnalysisType::PieChart => RenderPlan::Pie {
            title: "Distribution of Cases".to_string(),
            start_angle: PIE_START_ANGLE,
            slices: pie_slices(&rows),
        },
        AnalysisType::BoxPlot => RenderPlan::Box {
            title: "Box Plot of Cases".to_string(),
            series: CASE_COLUMNS
                .iter()
                .map(|(label, column)| {
                    let data = values(&rows, *column);
                    BoxSeries {
                        label: label.to_string(),
                        count: data.len(),
                        summary: BoxSummary::from_values(&data),
                    }
                })
                .collect(),
        },
    };

    Ok(Report {
        request: *request,
        rows: rows.len(),
        plan,
    })
}

fn bar(title: &str, y_label: &str, rows: &[&EnrichedRow], column: Column) -> RenderPlan {
    RenderPlan::Bar {
        title: title.to_string(),
        x_label: "day".to_string(),
        y_label: y_label.to_string(),
        points: daily_means(rows, column),
    }
}

fn values(rows: &[&EnrichedRow], column: Column) -> Vec<f64> {
    rows.iter().filter_map(|&r| column(r)).map(|v| v as f64).collect()
}

/// Mean of `column` per extract day-of-month, ascending by day
fn daily_means(rows: &[&EnrichedRow], column: Column) -> Vec<DayPoint> {
    let mut by_day: BTreeMap<u32, (f64, usize)> = BTreeMap::new();
    for &row in rows {
        if let Some(v) = column(row) {
            let entry = by_day.entry(row.extract_date.day()).or_insert((0.0, 0));
            entry.0 += v as f64;
            entry.1 += 1;
        }
    }
    by_day
        .into_iter()
        .map(|(day, (sum, n))| DayPoint {
            day,
            value: sum / n as f64,
        })
        .collect()
}

fn pie_slices(rows: &[&EnrichedRow]) -> Vec<PieSlice> {
    let sums: Vec<(&str, i128)> = CASE_COLUMNS
        .iter()
        .map(|(label, column)| {
            let sum = rows.iter().filter_map(|&r| column(r)).map(i128::from).sum::<i128>();
            (*label, sum)
        })
        .collect();
    let total: i128 = sums.iter().map(|(_, v)| v).sum();

    sums.into_iter()
        .map(|(label, value)| PieSlice {
            label: label.to_string(),
            value,
            percent: if total == 0 {
                0.0
            } else {
                value as f64 * 100.0 / total as f64
            },
        })
        .collect()
}

fn summary_columns(rows: &[&EnrichedRow]) -> Vec<ColumnSummary> {
    let numeric: [(&str, fn(&EnrichedRow) -> Option<f64>); 9] = [
        ("TEST_ID", |r| Some(r.test_id as f64)),
        ("NUMBER_TESTED", |r| r.number_tested.map(|v| v as f64)),
        ("NUMBER_CONFIRMED", |r| r.number_confirmed.map(|v| v as f64)),
        ("NUMBER_HOSPITALIZED", |r| r.number_hospitalized.map(|v| v as f64)),
        ("NUMBER_DEATHS", |r| r.number_deaths.map(|v| v as f64)),
        ("EXTRACT_MONTH", |r| Some(r.extract_month as f64)),
        ("EXTRACT_YEAR", |r| Some(r.extract_year as f64)),
        ("SPECIMEN_MONTH", |r| Some(r.specimen_month as f64)),
        ("SPECIMEN_YEAR", |r| Some(r.specimen_year as f64)),
    ];

    numeric
        .iter()
        .map(|(name, column)| {
            let values: Vec<f64> = rows.iter().filter_map(|&r| column(r)).collect();
            ColumnSummary::describe(*name, &values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ReportError, ReportFilter};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(test_id: i64, extract: NaiveDate, tested: i64, confirmed: i64, hosp: i64, deaths: i64) -> EnrichedRow {
        let mut row = EnrichedRow {
            test_id,
            extract_date: extract,
            specimen_date: date(2020, 12, 30),
            number_tested: Some(tested),
            number_confirmed: Some(confirmed),
            number_hospitalized: Some(hosp),
            number_deaths: Some(deaths),
            extract_month: 0,
            extract_year: 0,
            specimen_month: 0,
            specimen_year: 0,
        };
        row.derive();
        row
    }

    fn table() -> EnrichedTable {
        EnrichedTable::new(vec![
            row(1, date(2021, 1, 2), 100, 10, 2, 0),
            row(2, date(2021, 1, 1), 200, 20, 4, 1),
            row(3, date(2021, 1, 2), 300, 30, 6, 1),
            row(4, date(2021, 2, 1), 999, 99, 9, 9),
        ])
    }

    fn january(analysis: AnalysisType) -> ReportRequest {
        ReportRequest::new(analysis, ReportFilter::MonthYear { month: 1, year: 2021 })
    }

    #[test]
    fn test_line_plot_means_per_day() {
        let report = render(&table(), &january(AnalysisType::TestResults)).unwrap();
        assert_eq!(report.rows, 3);
        match report.plan {
            RenderPlan::Line { title, points, .. } => {
                assert_eq!(title, "Test Results Over Time");
                assert_eq!(
                    points,
                    vec![DayPoint { day: 1, value: 200.0 }, DayPoint { day: 2, value: 200.0 }]
                );
            }
            other => panic!("expected line plot, got {other:?}"),
        }
    }

    #[test]
    fn test_bar_charts() {
        for (analysis, title, day2) in [
            (AnalysisType::ConfirmedCases, "Confirmed Cases Over Time", 20.0),
            (AnalysisType::HospitalizedCases, "Hospitalized Cases Over Time", 4.0),
            (AnalysisType::Deaths, "Deaths Over Time", 0.5),
        ] {
            let report = render(&table(), &january(analysis)).unwrap();
            match report.plan {
                RenderPlan::Bar { title: t, points, .. } => {
                    assert_eq!(t, title);
                    assert_eq!(points.len(), 2);
                    assert_eq!(points[1].day, 2);
                    assert!((points[1].value - day2).abs() < 1e-9);
                }
                other => panic!("expected bar chart, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_pie_chart_proportions() {
        let request = ReportRequest::new(
            AnalysisType::PieChart,
            ReportFilter::DateRange { start: date(2021, 1, 1), end: date(2021, 1, 5) },
        );
        let report = render(&table(), &request).unwrap();
        match report.plan {
            RenderPlan::Pie { slices, start_angle, .. } => {
                assert_eq!(start_angle, PIE_START_ANGLE);
                let values: Vec<_> = slices.iter().map(|s| s.value).collect();
                assert_eq!(values, vec![60, 12, 2]);
                let total: f64 = slices.iter().map(|s| s.percent).sum();
                assert!((total - 100.0).abs() < 1e-9);
                assert_eq!(slices[0].label, "Confirmed");
            }
            other => panic!("expected pie chart, got {other:?}"),
        }
    }

    #[test]
    fn test_pie_chart_sums_past_i64_range() {
        let t = EnrichedTable::new(vec![
            row(1, date(2021, 1, 1), 5, i64::MAX, 0, 0),
            row(2, date(2021, 1, 2), 5, 1, i64::MAX, 0),
        ]);
        let report = render(&t, &january(AnalysisType::PieChart)).unwrap();
        match report.plan {
            RenderPlan::Pie { slices, .. } => {
                assert_eq!(slices[0].value, i64::MAX as i128 + 1);
                assert_eq!(slices[1].value, i64::MAX as i128);
                assert!((slices[0].percent - 50.0).abs() < 1e-6);
                assert!((slices[1].percent - 50.0).abs() < 1e-6);
                assert_eq!(slices[2].percent, 0.0);
            }
            other => panic!("expected pie chart, got {other:?}"),
        }
    }

    #[test]
    fn test_pie_chart_all_zero() {
        let t = EnrichedTable::new(vec![row(1, date(2021, 1, 1), 5, 0, 0, 0)]);
        let report = render(&t, &january(AnalysisType::PieChart)).unwrap();
        match report.plan {
            RenderPlan::Pie { slices, .. } => assert!(slices.iter().all(|s| s.percent == 0.0)),
            other => panic!("expected pie chart, got {other:?}"),
        }
    }

    #[test]
    fn test_box_plot_series() {
        let report = render(&table(), &january(AnalysisType::BoxPlot)).unwrap();
        match report.plan {
            RenderPlan::Box { series, .. } => {
                assert_eq!(series.len(), 3);
                assert_eq!(series[0].label, "Confirmed");
                assert_eq!(series[0].count, 3);
                let summary = series[0].summary.as_ref().unwrap();
                assert_eq!(summary.median, 20.0);
            }
            other => panic!("expected box plot, got {other:?}"),
        }
    }

    #[test]
    fn test_summary_statistics() {
        let report = render(&table(), &january(AnalysisType::SummaryStatistics)).unwrap();
        match report.plan {
            RenderPlan::Summary { columns } => {
                assert_eq!(columns.len(), 9);
                let tested = columns.iter().find(|c| c.column == "NUMBER_TESTED").unwrap();
                assert_eq!(tested.count, 3);
                assert_eq!(tested.mean, Some(200.0));
                assert_eq!(tested.max, Some(300.0));
            }
            other => panic!("expected summary, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_selection_renders_empty_plan() {
        let request = ReportRequest::new(
            AnalysisType::TestResults,
            ReportFilter::MonthYear { month: 6, year: 1999 },
        );
        let report = render(&table(), &request).unwrap();
        assert_eq!(report.rows, 0);
        assert!(matches!(report.plan, RenderPlan::Line { ref points, .. } if points.is_empty()));
    }

    #[test]
    fn test_invalid_filter_rejected() {
        let request = ReportRequest::new(
            AnalysisType::TestResults,
            ReportFilter::MonthYear { month: 0, year: 2021 },
        );
        assert!(matches!(render(&table(), &request), Err(ReportError::InvalidMonth(0))));
    }

    #[test]
    fn test_render_does_not_mutate_table() {
        let t = table();
        let before = t.clone();
        for analysis in AnalysisType::ALL {
            render(&t, &january(analysis)).unwrap();
        }
        assert_eq!(t, before);
    }

    #[test]
    fn test_plan_serializes_with_kind_tag() {
        let report = render(&table(), &january(AnalysisType::Deaths)).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["plan"]["kind"], "bar");
        assert_eq!(json["request"]["analysis"], "deaths");
        assert_eq!(json["request"]["filter"]["kind"], "month_year");
    }
}
