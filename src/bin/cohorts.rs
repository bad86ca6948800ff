//! Cohorts CLI: load the testing-cohort CSV and report on it.
//!
//! Usage:
//!   cohorts load --csv path [--db path] [--fresh]
//!   cohorts inspect [--db path] [--rows N]
//!   cohorts report <analysis> (--month M --year Y | --start D --end D) [--format text|json]
//!   cohorts options [--db path]

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use cohorts::pipeline::{self, PipelineError};
use cohorts::{
    render, render_text, AnalysisType, CohortStore, FilterOptions, JoinMode, JoinedRow,
    PipelineConfig, ReportFilter, ReportRequest,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "cohorts",
    version,
    about = "COVID-19 testing cohort ETL and reporting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CommonArgs {
    /// YAML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Path to SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,
    /// Keep every stored row instead of one row per extract date
    #[arg(long)]
    per_record: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a CSV into the database
    Load {
        /// Input CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Delete the database file before loading
        #[arg(long)]
        fresh: bool,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Show table counts, previews and null counts
    Inspect {
        /// Rows to show per preview
        #[arg(long, default_value_t = 5)]
        rows: usize,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Render one analysis for a month or a date range
    Report {
        /// Analysis to run (e.g. test-results, deaths, pie-chart, box-plot)
        analysis: AnalysisType,
        /// Extract month (1-12)
        #[arg(long, requires = "year", conflicts_with_all = ["start", "end"])]
        month: Option<u32>,
        /// Extract year
        #[arg(long, requires = "month")]
        year: Option<i32>,
        /// First extract date (YYYY-MM-DD)
        #[arg(long, requires = "end")]
        start: Option<NaiveDate>,
        /// Last extract date (YYYY-MM-DD), inclusive
        #[arg(long, requires = "start")]
        end: Option<NaiveDate>,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[command(flatten)]
        common: CommonArgs,
    },
    /// List the months and years available for reports
    Options {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(common: &CommonArgs) -> Result<PipelineConfig, PipelineError> {
    let mut config = match &common.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(db) = &common.db {
        config.db_path = db.clone();
    }
    if common.per_record {
        config.join_mode = JoinMode::PerRecord;
    }
    Ok(config)
}

fn cmd_load(mut config: PipelineConfig, csv: Option<PathBuf>, fresh: bool) -> Result<(), PipelineError> {
    if csv.is_some() {
        config.csv_path = csv;
    }
    config.fresh_db |= fresh;

    let report = pipeline::run(&config)?;
    println!(
        "Loaded {} rows ({} unique) into {}",
        report.parsed,
        report.unique,
        config.db_path.display()
    );
    println!(
        "Joined table: {} rows, {} kept after date parsing, {} dropped",
        report.joined,
        report.table.len(),
        report.dropped
    );
    Ok(())
}

fn show(v: Option<i64>) -> String {
    v.map_or_else(|| "NULL".to_string(), |v| v.to_string())
}

fn print_joined(rows: &[JoinedRow]) {
    println!(
        "{:>8}  {:<12}  {:<12}  {:>8}  {:>9}  {:>12}  {:>6}",
        "TEST_ID", "EXTRACT", "SPECIMEN", "TESTED", "CONFIRMED", "HOSPITALIZED", "DEATHS"
    );
    for r in rows {
        println!(
            "{:>8}  {:<12}  {:<12}  {:>8}  {:>9}  {:>12}  {:>6}",
            r.test_id,
            r.extract_date.as_deref().unwrap_or("NULL"),
            r.specimen_date.as_deref().unwrap_or("NULL"),
            show(r.number_tested),
            show(r.number_confirmed),
            show(r.number_hospitalized),
            show(r.number_deaths),
        );
    }
}

fn cmd_inspect(config: &PipelineConfig, rows: usize) -> Result<(), PipelineError> {
    let store = pipeline::open_store(config)?;

    let counts = store.table_counts()?;
    println!(
        "DATEINFO: {}  TESTINFO: {}  CASESINFO: {}",
        counts.date_info, counts.test_info, counts.cases_info
    );

    println!("\nDATEINFO (first {})", rows);
    for r in store.date_info(rows)? {
        println!(
            "{:>8}  {:<12}  {:<12}",
            r.test_id,
            r.extract_date.as_deref().unwrap_or("NULL"),
            r.specimen_date.as_deref().unwrap_or("NULL")
        );
    }
    println!("\nTESTINFO (first {})", rows);
    for r in store.test_info(rows)? {
        println!("{:>8}  {:>8}", r.test_id, show(r.number_tested));
    }
    println!("\nCASESINFO (first {})", rows);
    for r in store.cases_info(rows)? {
        println!(
            "{:>8}  {:>9}  {:>12}  {:>6}",
            r.test_id,
            show(r.number_confirmed),
            show(r.number_hospitalized),
            show(r.number_deaths)
        );
    }

    let joined = store.materialize(config.join_mode)?;
    let (n_rows, n_cols) = joined.shape();
    println!("\nJoined table: {} rows x {} columns", n_rows, n_cols);
    println!("head:");
    print_joined(joined.head(rows));
    println!("tail:");
    print_joined(joined.tail(rows));

    let nulls = joined.null_counts();
    println!(
        "\nnulls: extract_date={} specimen_date={} tested={} confirmed={} hospitalized={} deaths={}",
        nulls.extract_date,
        nulls.specimen_date,
        nulls.number_tested,
        nulls.number_confirmed,
        nulls.number_hospitalized,
        nulls.number_deaths
    );

    let outcome = cohorts::enrich(&joined);
    println!(
        "enriched: {} rows ({} dropped for unparseable dates)",
        outcome.table.len(),
        outcome.dropped
    );
    Ok(())
}

fn cmd_report(
    config: &PipelineConfig,
    request: ReportRequest,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = pipeline::open_store(config)?;
    let outcome = pipeline::load_table(&store, config.join_mode)?;
    let report = render(&outcome.table, &request)?;

    match format {
        OutputFormat::Text => print!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn cmd_options(config: &PipelineConfig) -> Result<(), PipelineError> {
    let store = pipeline::open_store(config)?;
    let outcome = pipeline::load_table(&store, config.join_mode)?;
    let options = FilterOptions::from_table(&outcome.table);

    if options.months.is_empty() {
        println!("No enriched rows available.");
        return Ok(());
    }
    let join = |v: Vec<String>| v.join(", ");
    println!("months: {}", join(options.months.iter().map(|m| m.to_string()).collect()));
    println!("years:  {}", join(options.years.iter().map(|y| y.to_string()).collect()));
    if let Some((first, last)) = options.date_span {
        println!("extract dates: {} to {}", first, last);
    }
    println!(
        "analyses: {}",
        join(AnalysisType::ALL.iter().map(|a| a.to_string()).collect())
    );
    Ok(())
}

fn report_filter(
    month: Option<u32>,
    year: Option<i32>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Option<ReportFilter> {
    match (month, year, start, end) {
        (Some(month), Some(year), None, None) => Some(ReportFilter::MonthYear { month, year }),
        (None, None, Some(start), Some(end)) => Some(ReportFilter::DateRange { start, end }),
        _ => None,
    }
}

fn exit_on_error<E: std::fmt::Display>(result: Result<(), E>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let common = match &cli.command {
        Commands::Load { common, .. }
        | Commands::Inspect { common, .. }
        | Commands::Report { common, .. }
        | Commands::Options { common } => common,
    };
    let config = match resolve_config(common) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Load { csv, fresh, .. } => exit_on_error(cmd_load(config, csv, fresh)),
        Commands::Inspect { rows, .. } => exit_on_error(cmd_inspect(&config, rows)),
        Commands::Report {
            analysis,
            month,
            year,
            start,
            end,
            format,
            ..
        } => match report_filter(month, year, start, end) {
            Some(filter) => {
                exit_on_error(cmd_report(&config, ReportRequest::new(analysis, filter), format))
            }
            None => {
                eprintln!("Error: pass either --month and --year, or --start and --end");
                1
            }
        },
        Commands::Options { .. } => exit_on_error(cmd_options(&config)),
    };
    std::process::exit(code);
}
