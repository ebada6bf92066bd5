use charge_cast::utils::{generate_sample_readings, write_forecast_csv, SampleSettings};
use charge_cast::visualization::{forecast_chart, heatmap_chart, residuals_chart};
use charge_cast::{
    evaluate, feature_columns, feature_importance, forecast_from_table, forecast_future,
    peak_days, peak_hours, prepare_features, split_data, summary_stats, ForecastState,
    LinearRegression, PipelineConfig, Regressor,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

#[test]
fn test_full_pipeline_on_synthetic_readings() {
    let config = PipelineConfig::default();
    let readings = generate_sample_readings(&SampleSettings::new(start(), 24 * 21)).unwrap();

    // 1. Features: the largest lag (24) decides how many rows are dropped
    let features = prepare_features(&readings, &config).unwrap();
    assert_eq!(features.len(), readings.len() - 24);
    assert_eq!(features.feature_columns().len(), 21);
    assert_eq!(features.feature_columns(), feature_columns(&config).as_slice());

    // 2. Analysis
    let summary = summary_stats(features.table()).unwrap();
    assert_eq!(summary.total_records, features.len());
    let hours = peak_hours(features.table(), 5).unwrap();
    assert_eq!(hours.len(), 5);
    assert!(hours.windows(2).all(|w| w[0].1 >= w[1].1));
    let days = peak_days(features.table(), 3).unwrap();
    assert!(days.iter().all(|(day, _)| !day.starts_with("Sat") && !day.starts_with("Sun")));

    // 3. Split, train, evaluate
    let (train, test) = split_data(&features, config.train_ratio).unwrap();
    assert_eq!(train.len(), (features.len() as f64 * 0.8).floor() as usize);
    assert_eq!(train.len() + test.len(), features.len());

    let mut model = LinearRegression::new();
    model.train(&train).unwrap();
    assert!(model.is_trained());

    let actual = test.target().unwrap();
    let predicted = model.predict_table(&test).unwrap();
    let metrics = evaluate(&actual, &predicted).unwrap();
    assert!(metrics.mae >= 0.0);
    assert!(metrics.rmse >= metrics.mae);
    assert!(metrics.r2 > 0.5, "r2 = {}", metrics.r2);
    assert!(metrics.mape.is_finite());

    // 4. Importance covers every feature, largest first
    let importance = feature_importance(&model, features.feature_columns()).unwrap();
    assert_eq!(importance.len(), 21);
    assert!(importance.windows(2).all(|w| w[0].1 >= w[1].1));

    // 5. Forecast
    let forecast = forecast_from_table(&model, &features, 24).unwrap();
    assert_eq!(forecast.len(), 24);
    assert!(forecast.values.iter().all(|v| v.is_finite()));
    let last = *features.table().timestamps().unwrap().last().unwrap();
    assert_eq!(forecast.timestamps[0], last + Duration::hours(1));
    assert_eq!(forecast.timestamps[23], last + Duration::hours(24));

    // 6. Charts and files
    let history = features.table().timestamps().unwrap();
    let chart = forecast_chart(
        &history,
        &features.target().unwrap(),
        &forecast.timestamps,
        &forecast.values,
    )
    .unwrap();
    assert_eq!(chart.traces.len(), 2);

    let heatmap = heatmap_chart(features.table()).unwrap().heatmap.unwrap();
    assert_eq!(heatmap.y_labels.len(), 7);
    assert_eq!(heatmap.x_labels.len(), 24);

    let residuals = residuals_chart(&actual, &predicted, config.residual_bins).unwrap();
    assert_eq!(residuals.bins, Some(50));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forecast.csv");
    write_forecast_csv(&path, &forecast).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written.lines().count(), 25);
}

#[test]
fn test_forecast_matches_single_step_prediction() {
    let config = PipelineConfig::default();
    let readings = generate_sample_readings(&SampleSettings::new(start(), 24 * 10)).unwrap();
    let features = prepare_features(&readings, &config).unwrap();

    let mut model = LinearRegression::new();
    model.train(&features).unwrap();

    let state = ForecastState::from_row(&features.last_row().unwrap()).unwrap();
    let x = state.feature_vector(features.feature_columns()).unwrap();
    let first = model.predict_one(&x).unwrap();

    let forecast = forecast_future(&model, &state, features.feature_columns(), 3).unwrap();
    assert_eq!(forecast.len(), 3);
    assert_eq!(forecast[0], first);

    let next = state.advance(first);
    let second = model
        .predict_one(&next.feature_vector(features.feature_columns()).unwrap())
        .unwrap();
    assert_eq!(forecast[1], second);
    assert!(forecast_future(&model, &state, features.feature_columns(), 0)
        .unwrap()
        .is_empty());
}

#[test]
fn test_too_short_input_yields_empty_features() {
    let config = PipelineConfig::default();
    let readings = generate_sample_readings(&SampleSettings::new(start(), 20)).unwrap();
    let features = prepare_features(&readings, &config).unwrap();
    assert!(features.is_empty());

    let (train, _) = features.split(0.8).unwrap();
    let mut model = LinearRegression::new();
    assert!(model.train(&train).is_err());
    assert!(summary_stats(features.table()).unwrap().avg_volume.is_none());
}

#[test]
fn test_config_from_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{ "lags": [1, 2, 24], "windows": [12], "forecast_steps": 6 }"#)
        .unwrap();

    let config = PipelineConfig::from_json_file(&path).unwrap();
    assert_eq!(config.lags, vec![1, 2, 24]);
    assert_eq!(config.train_ratio, 0.8);

    let readings = generate_sample_readings(&SampleSettings::new(start(), 24 * 4)).unwrap();
    let features = prepare_features(&readings, &config).unwrap();
    assert_eq!(features.feature_columns().len(), 9 + 3 + 2);
}
