//! charge-cast - run the charging volume analysis and forecasting pipeline

use charge_cast::utils::{generate_sample_readings, write_forecast_csv, SampleSettings};
use charge_cast::visualization::{
    daily_pattern_chart, feature_importance_chart, forecast_chart, heatmap_chart,
    hourly_pattern_chart, monthly_pattern_chart, predictions_chart, residuals_chart,
    time_series_chart,
};
use charge_cast::{
    evaluate, feature_importance, forecast_from_table, peak_days, peak_hours, prepare_features,
    summary_stats, Chart, DataLoader, EvaluationMetrics, LinearRegression, PipelineConfig,
    ReadingTable, Result, SummaryStats,
};
use chrono::NaiveDate;
use clap::Parser;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "charge-cast")]
#[command(about = "EV charging volume analysis and forecasting", long_about = None)]
struct Cli {
    /// Input CSV with a `time` column and one numeric column per zone
    #[arg(short, long, required_unless_present = "sample_hours")]
    input: Option<PathBuf>,

    /// Use this many hours of synthetic readings instead of an input file
    #[arg(long, conflicts_with = "input")]
    sample_hours: Option<usize>,

    /// Directory for metrics, forecast and chart files
    #[arg(short, long, default_value = "charge_cast_output")]
    output: PathBuf,

    /// Pipeline configuration as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Forecast horizon in hours
    #[arg(long)]
    steps: Option<usize>,

    /// Fraction of rows used for training
    #[arg(long)]
    train_ratio: Option<f64>,
}

#[derive(Serialize)]
struct Report<'a> {
    summary: &'a SummaryStats,
    peak_hours: Vec<(u32, f64)>,
    peak_days: Vec<(String, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<&'a EvaluationMetrics>,
    feature_importance: Vec<(String, f64)>,
}

fn load_readings(cli: &Cli) -> Result<ReadingTable> {
    match (&cli.input, cli.sample_hours) {
        (Some(path), _) => DataLoader::from_csv(path),
        (None, hours) => {
            let start = NaiveDate::from_ymd_opt(2024, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap_or_default();
            generate_sample_readings(&SampleSettings::new(start, hours.unwrap_or(24 * 60)))
        }
    }
}

fn write_chart(dir: &Path, name: &str, chart: &Chart) -> Result<()> {
    fs::write(dir.join(format!("{}.json", name)), chart.to_json()?)?;
    #[cfg(feature = "render")]
    charge_cast::render::render_svg(
        chart,
        dir.join(format!("{}.svg", name)),
        charge_cast::render::DEFAULT_SIZE,
    )?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(steps) = cli.steps {
        config.forecast_steps = steps;
    }
    if let Some(ratio) = cli.train_ratio {
        config.train_ratio = ratio;
    }
    config.validate()?;

    let readings = load_readings(&cli)?;
    info!(rows = readings.len(), zones = readings.zones().len(), "readings loaded");

    let features = prepare_features(&readings, &config)?;
    let table = features.table();

    let summary = summary_stats(table)?;
    info!("\n{}", summary);
    let hours = peak_hours(table, config.peak_hours_top_n)?;
    let days = peak_days(table, config.peak_days_top_n)?;
    info!(?hours, ?days, "peak periods");

    let (train, test) = features.split(config.train_ratio)?;
    let mut model = LinearRegression::new();
    model.train(&train)?;

    let actual = test.target()?;
    let predicted = model.predict_table(&test)?;
    let metrics = if test.is_empty() {
        warn!(rows = features.len(), "no rows left for evaluation, skipping metrics");
        None
    } else {
        let metrics = evaluate(&actual, &predicted)?;
        info!("\n{}", metrics);
        Some(metrics)
    };

    let importance = feature_importance(&model, features.feature_columns())?;
    let forecast = forecast_from_table(&model, &features, config.forecast_steps)?;

    fs::create_dir_all(&cli.output)?;
    let report = Report {
        summary: &summary,
        peak_hours: hours,
        peak_days: days,
        metrics: metrics.as_ref(),
        feature_importance: importance.clone(),
    };
    fs::write(
        cli.output.join("metrics.json"),
        serde_json::to_string_pretty(&report)?,
    )?;
    write_forecast_csv(cli.output.join("forecast.csv"), &forecast)?;

    let history = table.timestamps()?;
    let volume = table.column_values(features.target_column())?;
    let test_dates = test.table().timestamps()?;
    let mut charts = vec![
        ("time_series", time_series_chart(table, None)?),
        ("hourly_pattern", hourly_pattern_chart(table)?),
        ("daily_pattern", daily_pattern_chart(table)?),
        ("monthly_pattern", monthly_pattern_chart(table)?),
        ("heatmap", heatmap_chart(table)?),
        (
            "forecast",
            forecast_chart(&history, &volume, &forecast.timestamps, &forecast.values)?,
        ),
        (
            "feature_importance",
            feature_importance_chart(&importance, config.importance_top_n),
        ),
    ];
    if metrics.is_some() {
        charts.push((
            "predictions",
            predictions_chart(&actual, &predicted, &test_dates, None)?,
        ));
        charts.push((
            "residuals",
            residuals_chart(&actual, &predicted, config.residual_bins)?,
        ));
    }
    for (name, chart) in &charts {
        write_chart(&cli.output, name, chart)?;
    }

    info!(output = %cli.output.display(), charts = charts.len(), "pipeline complete");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "charge_cast=info".into()),
        )
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
