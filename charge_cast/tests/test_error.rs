use charge_cast::{feature_importance, ForecastError, LinearRegression, PipelineConfig, Regressor};
use volume_math::MathError;

#[test]
fn test_error_display() {
    let err = ForecastError::InsufficientData { needed: 25, got: 3 };
    assert_eq!(err.to_string(), "Insufficient data: need at least 25 rows, got 3");

    let err = ForecastError::ModelNotTrained;
    assert_eq!(err.to_string(), "Model has not been trained");

    let err = ForecastError::DimensionMismatch { expected: 21, got: 20 };
    assert_eq!(err.to_string(), "Dimension mismatch: expected 21, got 20");
}

#[test]
fn test_error_conversions() {
    let math: ForecastError = MathError::InvalidInput("period".to_string()).into();
    assert!(matches!(math, ForecastError::Math(_)));

    let io: ForecastError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(io, ForecastError::IoError(_)));

    let json: ForecastError = serde_json::from_str::<PipelineConfig>("{").unwrap_err().into();
    assert!(matches!(json, ForecastError::Serialization(_)));
}

#[test]
fn test_untrained_model_errors() {
    let model = LinearRegression::new();
    assert!(!model.is_trained());
    assert!(matches!(
        model.predict(&[vec![1.0]]),
        Err(ForecastError::ModelNotTrained)
    ));
    assert!(matches!(
        feature_importance(&model, &["a".to_string()]),
        Err(ForecastError::ModelNotTrained)
    ));
}

#[test]
fn test_training_on_nothing() {
    let mut model = LinearRegression::new();
    let result = model.fit(&[], &[]);
    assert!(matches!(result, Err(ForecastError::InsufficientData { .. })));
}
