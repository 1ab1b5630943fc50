#![cfg(feature = "serde")]

use statistico_common::{CellValue, Dataset};
use statistico_stats::logistic::{FitBundle, LogisticSpec, fit_logistic_regression};
use statistico_stats::meta::{EffectColumns, MetaModel, MetaSpec, run_meta_analysis};
use statistico_stats::outliers::{OutlierMethod, detect_outliers};

#[test]
fn configs_deserialize_with_defaults() {
    let spec: LogisticSpec =
        serde_json::from_str(r#"{"dependent":"bought","numeric_predictors":["age"]}"#).unwrap();
    assert!(spec.intercept);
    assert_eq!(spec.max_iterations, 60);

    let method: OutlierMethod =
        serde_json::from_str(r#"{"method":"z_score","threshold":2.5}"#).unwrap();
    assert_eq!(method, OutlierMethod::ZScore { threshold: 2.5 });

    let meta: MetaSpec = serde_json::from_str(
        r#"{"effect":{"type":"binary","a":"a","b":"b","c":"c","d":"d"},"model":"fixed"}"#,
    )
    .unwrap();
    assert_eq!(meta.model, MetaModel::Fixed);
    assert!(matches!(meta.effect, EffectColumns::Binary { .. }));
    assert_eq!(meta.confidence_level, 0.95);
}

#[test]
fn bundles_serialize() {
    let report = detect_outliers(&[1.0, 2.0, 2.5, 3.0, 40.0], OutlierMethod::iqr()).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["method"]["method"], "iqr");
    assert_eq!(json["outliers"][0]["kind"], "upper");

    let ds = Dataset::from_numeric(vec![("effect", vec![0.2, 0.5, 0.1]), ("se", vec![0.1, 0.2, 0.15])])
        .unwrap();
    let meta = run_meta_analysis(&ds, &MetaSpec::default()).unwrap();
    let json = serde_json::to_value(&meta).unwrap();
    assert_eq!(json["studies"].as_array().unwrap().len(), 3);
    assert!(json["heterogeneity"]["tau_squared"].is_number());

    let rows = (0..20)
        .map(|i| vec![CellValue::Int(i64::from(i % 3 == 0 || i > 14)), (i as f64).into()])
        .collect();
    let ds = Dataset::from_rows(&["y", "x"], rows).unwrap();
    let spec = LogisticSpec {
        dependent: "y".into(),
        numeric_predictors: vec!["x".into()],
        ..Default::default()
    };
    let bundle = fit_logistic_regression(&ds, &spec, 0.5).unwrap();
    let text = serde_json::to_string(&bundle).unwrap();
    let back: FitBundle = serde_json::from_str(&text).unwrap();
    assert_eq!(back.coefficients.len(), bundle.coefficients.len());
    assert_eq!(back.predictions.len(), 20);
}
