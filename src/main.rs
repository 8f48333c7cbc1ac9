//! CLI entry point for the covid_divergence tool.
//!
//! Provides subcommands for the cases and deaths divergence pipelines and
//! the raw deaths cohort view. Each run fetches the source extract, computes
//! its table, and writes a timestamped CSV plus the chart artifacts.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use covid_divergence::chart::html::render_html;
use covid_divergence::chart::svg::SvgChart;
use covid_divergence::chart::{ChartSpec, Series};
use covid_divergence::cohort::Partition;
use covid_divergence::config::{self, MetricConfig};
use covid_divergence::error::DivergenceError;
use covid_divergence::fetch::{BasicClient, fetch_bytes};
use covid_divergence::output::{timestamped_path, write_divergence_csv, write_raw_csv};
use covid_divergence::parser::{Observation, parse_observations};
use covid_divergence::pipeline::divergence::divergence_table;
use covid_divergence::pipeline::raw::raw_table;
use covid_divergence::pipeline::series::{aggregate, normalize};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "covid_divergence")]
#[command(about = "Age-cohort divergence analysis over coronavirus API data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by every pipeline subcommand.
#[derive(Args)]
struct PipelineArgs {
    /// Path to a local CSV file or URL to fetch (defaults to the preset endpoint)
    #[arg(short, long)]
    source: Option<String>,

    /// Directory for CSV exports
    #[arg(long)]
    data_dir: Option<String>,

    /// Directory for chart artifacts
    #[arg(long)]
    charts_dir: Option<String>,

    /// Drop merged rows before this date (YYYY-MM-DD)
    #[arg(long)]
    date_floor: Option<NaiveDate>,

    /// JSON file overriding the cohort partition; for divergence the first
    /// cohort is shifted onto the second cohort's peak
    #[arg(long)]
    partition: Option<String>,

    /// Treat age bands missing from the partition as fatal
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Case divergence between the under/over-80 cohorts, aligned on the rolling sum
    Cases {
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Death divergence between the under/over-80 cohorts
    Deaths {
        #[command(flatten)]
        args: PipelineArgs,
    },
    /// Raw daily deaths for the decade cohorts, without normalization
    RawDeaths {
        #[command(flatten)]
        args: PipelineArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/covid_divergence.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("covid_divergence.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Cases { args } => run_divergence(config::cases(), args).await?,
        Commands::Deaths { args } => run_divergence(config::deaths(), args).await?,
        Commands::RawDeaths { args } => run_raw(config::raw_deaths(), args).await?,
    }

    Ok(())
}

/// Runs the full divergence pipeline for one metric preset.
#[tracing::instrument(skip(cfg, args), fields(metric = cfg.name))]
async fn run_divergence(cfg: MetricConfig, args: PipelineArgs) -> Result<()> {
    let observations = load_observations(&cfg, &args).await?;
    let partition = resolve_partition(&cfg, &args)?;

    let series = aggregate(&observations, &partition, args.strict)?;
    anyhow::ensure!(
        series.len() == 2,
        "divergence needs a two-cohort partition, got {} cohorts",
        series.len()
    );

    let under = normalize(&series[0])?;
    let over = normalize(&series[1])?;

    let date_floor = args.date_floor.or(cfg.date_floor);
    let table = divergence_table(under, over, date_floor, cfg.name)?;

    info!(
        offset_days = table.offset_days,
        under_peak = %table.under_peak_date,
        over_peak = %table.over_peak_date,
        rows = table.rows.len(),
        "Divergence computed"
    );

    let run_date = Utc::now().date_naive();
    let data_dir = args.data_dir.as_deref().unwrap_or(cfg.data_dir);
    std::fs::create_dir_all(data_dir)?;

    let csv_path = timestamped_path(data_dir, cfg.stem, run_date, ".csv");
    write_divergence_csv(&csv_path, cfg.kind, &table)?;
    info!(path = %csv_path.display(), "Divergence CSV written");

    let chart_series = vec![Series {
        name: "divergence".into(),
        points: table.rows.iter().map(|r| (r.date, r.divergence)).collect(),
    }];
    let charts_dir = args.charts_dir.as_deref().unwrap_or(cfg.charts_dir);
    write_charts(charts_dir, cfg.stem, run_date, &chart_series, &cfg.chart)?;

    Ok(())
}

/// Runs the unnormalized multi-cohort view for one metric preset.
#[tracing::instrument(skip(cfg, args), fields(metric = cfg.name))]
async fn run_raw(cfg: MetricConfig, args: PipelineArgs) -> Result<()> {
    let observations = load_observations(&cfg, &args).await?;
    let partition = resolve_partition(&cfg, &args)?;

    let mut rows = raw_table(&observations, &partition, args.strict, cfg.name)?;
    if let Some(floor) = args.date_floor.or(cfg.date_floor) {
        rows.retain(|r| r.date >= floor);
    }
    info!(rows = rows.len(), cohorts = partition.len(), "Raw cohort table computed");

    let run_date = Utc::now().date_naive();
    let data_dir = args.data_dir.as_deref().unwrap_or(cfg.data_dir);
    std::fs::create_dir_all(data_dir)?;

    let csv_path = timestamped_path(data_dir, cfg.stem, run_date, ".csv");
    write_raw_csv(&csv_path, cfg.kind, &rows)?;
    info!(path = %csv_path.display(), "Raw cohort CSV written");

    // One chart trace per cohort, in partition order.
    let chart_series: Vec<Series> = partition
        .names()
        .map(|name| Series {
            name: name.to_string(),
            points: rows
                .iter()
                .filter(|r| r.cohort == name)
                .map(|r| (r.date, r.value as f64))
                .collect(),
        })
        .collect();
    let charts_dir = args.charts_dir.as_deref().unwrap_or(cfg.charts_dir);
    write_charts(charts_dir, cfg.stem, run_date, &chart_series, &cfg.chart)?;

    Ok(())
}

/// Fetches and parses the source table, rejecting an empty result.
async fn load_observations(cfg: &MetricConfig, args: &PipelineArgs) -> Result<Vec<Observation>> {
    let source = args.source.clone().unwrap_or_else(|| cfg.url.to_string());
    let bytes = fetcher(&source).await?;
    let observations = parse_observations(&bytes, cfg.kind)?;
    info!(rows = observations.len(), "Source table parsed");

    if observations.is_empty() {
        return Err(DivergenceError::EmptyDataset { metric: cfg.name.to_string() }.into());
    }
    Ok(observations)
}

fn resolve_partition(cfg: &MetricConfig, args: &PipelineArgs) -> Result<Partition> {
    match &args.partition {
        Some(path) => Partition::load(path),
        None => Ok(cfg.partition.clone()),
    }
}

/// Loads the source table from a local file path or fetches it over HTTP.
#[tracing::instrument(fields(source = %source))]
async fn fetcher(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::new();
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source)?
    };
    Ok(bytes)
}

/// Writes the interactive HTML and static SVG artifacts for a finished table.
fn write_charts(
    dir: &str,
    stem: &str,
    run_date: NaiveDate,
    series: &[Series],
    spec: &ChartSpec,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    let html_path = timestamped_path(dir, stem, run_date, "_interactive.html");
    std::fs::write(&html_path, render_html(series, spec))?;
    info!(path = %html_path.display(), "Interactive chart written");

    let svg_path = timestamped_path(dir, stem, run_date, "_static.svg");
    std::fs::write(&svg_path, SvgChart::default().export(series, spec))?;
    info!(path = %svg_path.display(), "Static chart written");

    Ok(())
}
