//! End-to-end run over eight weeks of synthetic charging readings
//!
//! ```text
//! cargo run -p charge_cast --example sample_pipeline
//! ```

use charge_cast::utils::{generate_sample_readings, SampleSettings};
use charge_cast::visualization::forecast_chart;
use charge_cast::{
    evaluate, feature_importance, forecast_from_table, peak_days, peak_hours, prepare_features,
    summary_stats, LinearRegression, PipelineConfig,
};
use chrono::NaiveDate;

fn main() -> charge_cast::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "charge_cast=debug".into()),
        )
        .init();

    let start = NaiveDate::from_ymd_opt(2024, 3, 4)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let readings = generate_sample_readings(&SampleSettings::new(start, 24 * 7 * 8))?;

    let config = PipelineConfig::default();
    let features = prepare_features(&readings, &config)?;

    println!("{}", summary_stats(features.table())?);
    println!("Peak hours: {:?}", peak_hours(features.table(), 5)?);
    println!("Peak days:  {:?}", peak_days(features.table(), 3)?);

    let (train, test) = features.split(config.train_ratio)?;
    let mut model = LinearRegression::new();
    model.train(&train)?;

    let metrics = evaluate(&test.target()?, &model.predict_table(&test)?)?;
    println!("{}", metrics);

    println!("Top features:");
    for (name, weight) in feature_importance(&model, features.feature_columns())?
        .iter()
        .take(5)
    {
        println!("  {:<16} {:.4}", name, weight);
    }

    let forecast = forecast_from_table(&model, &features, config.forecast_steps)?;
    for (ts, value) in forecast.timestamps.iter().zip(&forecast.values).take(6) {
        println!("  {}  {:>8.2}", ts, value);
    }

    let history = features.table().timestamps()?;
    let chart = forecast_chart(
        &history,
        &features.target()?,
        &forecast.timestamps,
        &forecast.values,
    )?;
    println!("Forecast chart has {} traces", chart.traces.len());

    Ok(())
}
