//! CLI entry point for the taxi trip statistics pipeline.
//!
//! Fetches trips for a date range into the local Parquet dataset and reports
//! either the average daily trip time or its 45-day rolling average.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use taxi_trip_stats::analyzers::AggregateMode;
use taxi_trip_stats::config::PipelineConfig;
use taxi_trip_stats::fetch::{DateRange, RetryPolicy, build_client};
use taxi_trip_stats::output::{append_record, log_summary, write_summary_csv};
use taxi_trip_stats::pipeline::{RunOptions, RunReport, fetch_and_aggregate, summarize_stored};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
};

#[derive(Parser)]
#[command(name = "taxi_trip_stats")]
#[command(about = "Fetch taxi trips and compute trip-duration aggregates", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a date range, store it, and report the average daily trip time
    FetchMean(FetchArgs),
    /// Fetch a date range, store it, and report the 45-day rolling average
    FetchRolling(FetchArgs),
    /// Aggregate the stored dataset without fetching
    Summarize {
        #[arg(short, long, value_enum, default_value_t = Mode::Mean)]
        mode: Mode,

        /// Write the daily summary to this CSV file
        #[arg(long)]
        summary_csv: Option<PathBuf>,
    },
}

#[derive(Args)]
struct FetchArgs {
    /// Name of a date range from the config file
    #[arg(short, long, conflicts_with_all = ["start", "end"])]
    range: Option<String>,

    /// First pickup date to fetch (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<NaiveDate>,

    /// Last pickup date to fetch (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Replace the stored dataset instead of appending to it
    #[arg(long, default_value_t = false)]
    fresh: bool,

    /// Write the daily summary to this CSV file
    #[arg(long)]
    summary_csv: Option<PathBuf>,

    /// CSV file to append a run record to
    #[arg(long)]
    history: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Mean,
    Rolling,
}

impl From<Mode> for AggregateMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mean => AggregateMode::Mean,
            Mode::Rolling => AggregateMode::Rolling,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let cli = Cli::parse();

    // Logging setup: colored stderr + JSON rolling log file, scoped to this run
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/taxi_trip_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("taxi_trip_stats.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    let subscriber = tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer);

    tracing::subscriber::with_default(subscriber, || run(cli))
}

fn run(cli: Cli) -> Result<()> {
    info!("Start of the run");
    let config = PipelineConfig::load(&cli.config)?;

    match cli.command {
        Commands::FetchMean(args) => fetch(&config, args, AggregateMode::Mean)?,
        Commands::FetchRolling(args) => fetch(&config, args, AggregateMode::Rolling)?,
        Commands::Summarize { mode, summary_csv } => {
            let report = summarize_stored(&config.storage.dataset_path, mode.into())?;
            info!(records = report.dataset.len(), "Stored dataset summarized");
            report_outputs(&report, summary_csv.as_deref(), None)?;
        }
    }

    info!("End of the run");
    Ok(())
}

fn fetch(config: &PipelineConfig, args: FetchArgs, mode: AggregateMode) -> Result<()> {
    let range = resolve_range(config, &args)?;
    let client = build_client(config.api.app_token.clone(), RetryPolicy::default())?;

    let options = RunOptions {
        range,
        mode,
        fresh: args.fresh,
    };
    let report = fetch_and_aggregate(&*client, config, &options)?;
    report_outputs(&report, args.summary_csv.as_deref(), args.history.as_deref())
}

fn resolve_range(config: &PipelineConfig, args: &FetchArgs) -> Result<DateRange> {
    match (&args.range, args.start, args.end) {
        (Some(name), _, _) => config.range(name),
        (None, Some(start), Some(end)) => DateRange::new(start, end),
        _ => bail!("either --range or both --start and --end are required"),
    }
}

fn report_outputs(
    report: &RunReport,
    summary_csv: Option<&Path>,
    history: Option<&Path>,
) -> Result<()> {
    log_summary(&report.processed);

    if let Some(path) = summary_csv {
        write_summary_csv(path, &report.processed)?;
    }
    if let Some(path) = history {
        append_record(path, &report.stats)?;
        info!(path = %path.display(), "Run recorded");
    }
    Ok(())
}
