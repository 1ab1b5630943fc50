use proptest::prelude::*;
use rand::Rng;
use statistico_common::Dataset;
use statistico_stats::descriptive::{describe, quantile, sorted_copy};
use statistico_stats::factor::{FactorSpec, Rotation, run_factor_analysis};
use statistico_stats::logistic::auc;
use statistico_stats::meta::{MetaSpec, run_meta_analysis};
use statistico_stats::outliers::{OutlierKind, OutlierMethod, detect_outliers};
use statistico_stats::random::seeded_source;

fn data_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6..1.0e6f64, 1..200)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn quartiles_are_ordered(data in data_strategy()) {
        let sorted = sorted_copy(&data);
        let q1 = quantile(&sorted, 0.25).unwrap();
        let q2 = quantile(&sorted, 0.5).unwrap();
        let q3 = quantile(&sorted, 0.75).unwrap();
        prop_assert!(sorted[0] <= q1 && q1 <= q2 && q2 <= q3 && q3 <= sorted[sorted.len() - 1]);
    }

    #[test]
    fn quantile_half_is_the_median(data in data_strategy()) {
        let stats = describe(&data).unwrap();
        let q = quantile(&sorted_copy(&data), 0.5).unwrap();
        prop_assert_eq!(q, stats.median);
    }

    #[test]
    fn auc_stays_in_unit_interval(
        scores in prop::collection::vec(0.0..1.0f64, 2..100),
        flip in any::<u64>(),
    ) {
        let y: Vec<f64> = (0..scores.len()).map(|i| ((flip >> (i % 64)) & 1) as f64).collect();
        if let Some(a) = auc(&y, &scores) {
            prop_assert!((0.0..=1.0).contains(&a));
        }
    }
}

#[test]
fn single_upper_outlier_scenario() {
    let data = [10.0, 12.0, 12.0, 13.0, 12.0, 11.0, 14.0, 13.0, 15.0, 10.0, 90.0];
    let report = detect_outliers(&data, OutlierMethod::iqr()).unwrap();
    assert_eq!(report.count(), 1);
    let o = &report.outliers[0];
    assert_eq!(o.index, 10);
    assert_eq!(o.kind, OutlierKind::Upper);
    // Q1 = 11.5, Q3 = 13.5 on the 11-point set
    assert_eq!(report.lower_bound, 8.5);
    assert_eq!(report.upper_bound, 16.5);
}

#[test]
fn every_method_flags_a_point_ten_iqrs_out() {
    let mut data: Vec<f64> = (0..29).map(|i| 10.0 + 0.5 * i as f64).collect();
    // Quartiles of the final set do not depend on the extreme value itself.
    let mut extended = data.clone();
    extended.push(f64::MAX);
    let sorted = sorted_copy(&extended);
    let q1 = quantile(&sorted, 0.25).unwrap();
    let q3 = quantile(&sorted, 0.75).unwrap();
    let extreme = q3 + 10.0 * (q3 - q1);
    data.push(extreme);

    for method in [
        OutlierMethod::iqr(),
        OutlierMethod::z_score(),
        OutlierMethod::grubbs(),
        OutlierMethod::mad(),
    ] {
        let report = detect_outliers(&data, method).unwrap();
        assert!(
            report.outliers.iter().any(|o| o.index == 29 && o.kind == OutlierKind::Upper),
            "{} missed the extreme point",
            method.name()
        );
    }
}

#[test]
fn auc_boundaries() {
    let y = [0.0, 0.0, 1.0, 0.0, 1.0, 1.0];
    let separating = [0.1, 0.2, 0.8, 0.3, 0.9, 0.7];
    assert_eq!(auc(&y, &separating), Some(1.0));
    assert_eq!(auc(&y, &[0.42; 6]), Some(0.5));
}

#[test]
fn identical_study_effects_have_no_heterogeneity() {
    let ds = Dataset::from_numeric(vec![
        ("effect", vec![0.35; 6]),
        ("se", vec![0.1, 0.25, 0.2, 0.12, 0.3, 0.08]),
    ])
    .unwrap();
    let b = run_meta_analysis(&ds, &MetaSpec::default()).unwrap();
    assert_eq!(b.heterogeneity.tau_squared, 0.0);
    assert_eq!(b.random.estimate, b.fixed.estimate);
    assert!((b.fixed.estimate - 0.35).abs() < 1e-12);
}

#[test]
fn unrotated_eigenvectors_are_orthonormal() {
    let mut rng = seeded_source(99);
    let names = ["v1", "v2", "v3", "v4", "v5"];
    let mut cols: Vec<(&str, Vec<f64>)> = names.iter().map(|n| (*n, Vec::new())).collect();
    for _ in 0..150 {
        let f: f64 = rng.gen_range(-1.0..1.0);
        for (j, c) in cols.iter_mut().enumerate() {
            let noise: f64 = rng.gen_range(-1.0..1.0);
            c.1.push(f * j as f64 + noise);
        }
    }
    let ds = Dataset::from_numeric(cols).unwrap();
    let spec = FactorSpec {
        variables: names.iter().map(|s| s.to_string()).collect(),
        rotation: Rotation::None,
        ..Default::default()
    };
    let b = run_factor_analysis(&ds, &spec).unwrap();
    let v = &b.extraction.eigenvectors;
    let p = names.len();
    for a in 0..p {
        for c in 0..p {
            let d: f64 = (0..p).map(|k| v[k][a] * v[k][c]).sum();
            let expected = if a == c { 1.0 } else { 0.0 };
            assert!((d - expected).abs() < 1e-6, "columns {a},{c}: {d}");
        }
    }
}
