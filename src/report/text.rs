//! Plain-text rendering of a report for the terminal

use super::plan::{DayPoint, Report, RenderPlan};
use super::stats::ColumnSummary;
use std::fmt::Write;

const BAR_WIDTH: usize = 40;

/// Render a report as plain text
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} [{} | {} rows]",
        report.plan.title(),
        report.request.filter,
        report.rows
    );

    match &report.plan {
        RenderPlan::Line { y_label, points, .. } | RenderPlan::Bar { y_label, points, .. } => {
            write_points(&mut out, y_label, points)
        }
        RenderPlan::Pie { slices, .. } => {
            for slice in slices {
                let _ = writeln!(
                    out,
                    "{:<14} {:>12} {:>6.1}%",
                    slice.label, slice.value, slice.percent
                );
            }
        }
        RenderPlan::Box { series, .. } => {
            let _ = writeln!(
                out,
                "{:<14} {:>6} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
                "SERIES", "COUNT", "LOW", "Q1", "MEDIAN", "Q3", "HIGH", "OUTLIERS"
            );
            for s in series {
                match &s.summary {
                    Some(b) => {
                        let _ = writeln!(
                            out,
                            "{:<14} {:>6} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>8}",
                            s.label,
                            s.count,
                            b.whisker_low,
                            b.q1,
                            b.median,
                            b.q3,
                            b.whisker_high,
                            b.outliers.len()
                        );
                    }
                    None => {
                        let _ = writeln!(out, "{:<14} {:>6}  (no data)", s.label, s.count);
                    }
                }
            }
        }
        RenderPlan::Summary { columns } => write_summary(&mut out, columns),
    }
    out
}

fn write_points(out: &mut String, y_label: &str, points: &[DayPoint]) {
    if points.is_empty() {
        let _ = writeln!(out, "(no data)");
        return;
    }
    let max = points.iter().map(|p| p.value).fold(0.0_f64, f64::max);
    let _ = writeln!(out, "{:>3}  {:>12}", "day", y_label);
    for p in points {
        let len = if max > 0.0 {
            ((p.value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(out, "{:>3}  {:>12.2}  {}", p.day, p.value, "#".repeat(len));
    }
}

fn write_summary(out: &mut String, columns: &[ColumnSummary]) {
    let _ = write!(out, "{:<6}", "");
    for c in columns {
        let _ = write!(out, " {:>19}", c.column);
    }
    let _ = writeln!(out);

    let _ = write!(out, "{:<6}", "count");
    for c in columns {
        let _ = write!(out, " {:>19}", c.count);
    }
    let _ = writeln!(out);

    let rows: [(&str, fn(&ColumnSummary) -> Option<f64>); 7] = [
        ("mean", |c| c.mean),
        ("std", |c| c.std),
        ("min", |c| c.min),
        ("25%", |c| c.q25),
        ("50%", |c| c.median),
        ("75%", |c| c.q75),
        ("max", |c| c.max),
    ];
    for (name, stat) in rows {
        let _ = write!(out, "{:<6}", name);
        for c in columns {
            match stat(c) {
                Some(v) => {
                    let _ = write!(out, " {:>19.6}", v);
                }
                None => {
                    let _ = write!(out, " {:>19}", "NaN");
                }
            }
        }
        let _ = writeln!(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{AnalysisType, PieSlice, ReportFilter, ReportRequest};

    fn report(analysis: AnalysisType, plan: RenderPlan) -> Report {
        Report {
            request: ReportRequest::new(analysis, ReportFilter::MonthYear { month: 1, year: 2021 }),
            rows: 2,
            plan,
        }
    }

    #[test]
    fn test_bar_text_scales_to_max() {
        let text = render_text(&report(
            AnalysisType::Deaths,
            RenderPlan::Bar {
                title: "Deaths Over Time".to_string(),
                x_label: "day".to_string(),
                y_label: "NUMBER_DEATHS".to_string(),
                points: vec![DayPoint { day: 1, value: 10.0 }, DayPoint { day: 2, value: 5.0 }],
            },
        ));
        assert!(text.starts_with("Deaths Over Time [2021-01 | 2 rows]"));
        assert!(text.contains(&"#".repeat(BAR_WIDTH)));
        assert!(text.contains(&format!("5.00  {}\n", "#".repeat(BAR_WIDTH / 2))));
    }

    #[test]
    fn test_empty_points() {
        let text = render_text(&report(
            AnalysisType::TestResults,
            RenderPlan::Line {
                title: "Test Results Over Time".to_string(),
                x_label: "day".to_string(),
                y_label: "NUMBER_TESTED".to_string(),
                points: vec![],
            },
        ));
        assert!(text.contains("(no data)"));
    }

    #[test]
    fn test_pie_text() {
        let text = render_text(&report(
            AnalysisType::PieChart,
            RenderPlan::Pie {
                title: "Distribution of Cases".to_string(),
                start_angle: 140.0,
                slices: vec![PieSlice { label: "Confirmed".to_string(), value: 3, percent: 75.0 }],
            },
        ));
        assert!(text.contains("Confirmed"));
        assert!(text.contains("75.0%"));
    }

    #[test]
    fn test_summary_text_marks_undefined_as_nan() {
        let text = render_text(&report(
            AnalysisType::SummaryStatistics,
            RenderPlan::Summary {
                columns: vec![ColumnSummary::describe("NUMBER_TESTED", &[5.0])],
            },
        ));
        assert!(text.contains("NUMBER_TESTED"));
        assert!(text.contains("NaN"));
        assert!(text.contains("5.000000"));
    }
}
