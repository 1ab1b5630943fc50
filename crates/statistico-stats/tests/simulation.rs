//! Repeated-draw checks with seeded generators.

use rand::Rng;
use rand::rngs::SmallRng;
use statistico_common::{CellValue, Dataset};
use statistico_stats::logistic::{LogisticSpec, fit_logistic_regression, sigmoid};
use statistico_stats::random::seeded_source;
use statistico_stats::resampling::{BootstrapConfig, BootstrapStatistic, bootstrap_ci};

fn standard_normal(rng: &mut SmallRng) -> f64 {
    // Box-Muller; 1 - u keeps the log argument positive.
    let u1: f64 = 1.0 - rng.r#gen::<f64>();
    let u2: f64 = rng.r#gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

fn spec() -> LogisticSpec {
    LogisticSpec {
        dependent: "y".into(),
        numeric_predictors: vec!["x".into()],
        ..Default::default()
    }
}

#[test]
fn logistic_recovers_known_coefficients() {
    let mut rng = seeded_source(2024);
    let rows = (0..2000)
        .map(|_| {
            let x = standard_normal(&mut rng);
            let y = rng.r#gen::<f64>() < sigmoid(2.0 * x - 1.0);
            vec![CellValue::Int(i64::from(y)), x.into()]
        })
        .collect();
    let ds = Dataset::from_rows(&["y", "x"], rows).unwrap();
    let fit = fit_logistic_regression(&ds, &spec(), 0.5).unwrap();

    assert!(fit.fit.converged);
    let slope = fit.coefficient("x").unwrap().estimate;
    let intercept = fit.coefficient("(Intercept)").unwrap().estimate;
    assert!((slope - 2.0).abs() < 0.3, "slope {slope}");
    assert!((intercept + 1.0).abs() < 0.3, "intercept {intercept}");
    assert!(fit.fit.lr_p_value.unwrap() < 1e-10);
    assert!(fit.ranking.auc > 0.75);
}

#[test]
fn independent_outcome_rarely_rejects() {
    let mut rng = seeded_source(77);
    let trials = 100;
    let mut quiet = 0;
    for _ in 0..trials {
        let rows = (0..200)
            .map(|_| {
                let x = standard_normal(&mut rng);
                let y = rng.r#gen::<f64>() < 0.4;
                vec![CellValue::Boolean(y), x.into()]
            })
            .collect();
        let ds = Dataset::from_rows(&["y", "x"], rows).unwrap();
        let fit = fit_logistic_regression(&ds, &spec(), 0.5).unwrap();
        if fit.coefficient("x").unwrap().z.abs() < 2.0 {
            quiet += 1;
        }
    }
    assert!(quiet >= 88, "only {quiet} of {trials} fits stayed below |z| = 2");
}

#[test]
fn bootstrap_mean_interval_covers_zero() {
    let mut rng = seeded_source(5);
    let config = BootstrapConfig {
        statistic: BootstrapStatistic::Mean,
        iterations: 500,
        alpha: 0.05,
    };
    let trials = 200;
    let mut covered = 0;
    for _ in 0..trials {
        let sample: Vec<f64> = (0..200).map(|_| standard_normal(&mut rng)).collect();
        let ci = bootstrap_ci(&sample, &config, &mut rng).unwrap();
        if ci.lower <= 0.0 && 0.0 <= ci.upper {
            covered += 1;
        }
    }
    assert!(covered >= 180, "covered {covered} of {trials}");
}
