//! One-sample hypothesis tests, classical and bootstrap.
//!
//! Notes:
//! - Classical tests cover the mean (t, df = n − 1), the variance
//!   (χ² = (n − 1)s²/H0, df = n − 1) and the standard deviation (the variance
//!   test against H0²). Medians and percentiles have no classical reference
//!   distribution here and are bootstrap-only.
//! - Two-sided p-values double the smaller tail.
//! - H0 is rejected iff `p < alpha`.

use statistico_common::StatsError;

use crate::descriptive::{mean, sample_variance};
use crate::distributions::{ChiSquared, ContinuousDistribution, StudentT, clamp_probability};
use crate::random::RandomSource;
use crate::resampling::{
    Alternative, BootstrapConfig, BootstrapStatistic, bootstrap_ci, bootstrap_test, check_alpha,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestMethod {
    #[default]
    Classical,
    Bootstrap,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestParameter {
    #[default]
    Mean,
    Median,
    Variance,
    StdDev,
    Percentile,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisConfig {
    pub method: TestMethod,
    pub parameter: TestParameter,
    pub alternative: Alternative,
    pub null_value: f64,
    pub alpha: f64,
    /// Probability for `TestParameter::Percentile`.
    pub percentile: f64,
    /// Resamples for `TestMethod::Bootstrap`.
    pub iterations: usize,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            method: TestMethod::Classical,
            parameter: TestParameter::Mean,
            alternative: Alternative::TwoSided,
            null_value: 0.0,
            alpha: 0.05,
            percentile: 0.5,
            iterations: 1000,
        }
    }
}

/// Rejection region on the scale of the test statistic.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CriticalRegion {
    pub lower: Option<f64>,
    pub upper: Option<f64>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct HypothesisTestResult {
    pub test_name: String,
    pub method: TestMethod,
    pub parameter: TestParameter,
    pub alternative: Alternative,
    pub n: usize,
    pub null_value: f64,
    /// Sample value of the tested parameter.
    pub estimate: f64,
    /// t or χ² for classical tests, the observed statistic for bootstrap.
    pub statistic: f64,
    pub p_value: f64,
    pub df: Option<f64>,
    pub critical: CriticalRegion,
    pub reject_null: bool,
    pub alpha: f64,
    pub confidence_interval: ConfidenceInterval,
}

pub fn run_hypothesis_test(
    data: &[f64],
    config: &HypothesisConfig,
    rng: &mut dyn RandomSource,
) -> Result<HypothesisTestResult, StatsError> {
    check_alpha(config.alpha)?;
    if !config.null_value.is_finite() {
        return Err(StatsError::config("null hypothesis value must be finite"));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::config("numeric vector contains a non-finite value"));
    }
    match config.method {
        TestMethod::Classical => classical(data, config),
        TestMethod::Bootstrap => bootstrap(data, config, rng),
    }
}

/// p-value from the tails of a reference distribution.
fn tail_p<D: ContinuousDistribution>(dist: &D, stat: f64, alt: Alternative) -> f64 {
    let p = match alt {
        Alternative::Left => dist.cdf(stat),
        Alternative::Right => dist.sf(stat),
        Alternative::TwoSided => 2.0 * dist.cdf(stat).min(dist.sf(stat)),
    };
    clamp_probability(p)
}

fn critical_region<D: ContinuousDistribution>(
    dist: &D,
    alpha: f64,
    alt: Alternative,
) -> Result<CriticalRegion, StatsError> {
    Ok(match alt {
        Alternative::Left => CriticalRegion {
            lower: Some(dist.inverse_cdf(alpha)?),
            upper: None,
        },
        Alternative::Right => CriticalRegion {
            lower: None,
            upper: Some(dist.inverse_cdf(1.0 - alpha)?),
        },
        Alternative::TwoSided => CriticalRegion {
            lower: Some(dist.inverse_cdf(alpha / 2.0)?),
            upper: Some(dist.inverse_cdf(1.0 - alpha / 2.0)?),
        },
    })
}

fn classical(data: &[f64], config: &HypothesisConfig) -> Result<HypothesisTestResult, StatsError> {
    let n = data.len();
    StatsError::ensure_min("one-sample test", 2, n)?;
    let df = (n - 1) as f64;
    let m = mean(data)?;
    let var = sample_variance(data)?;
    let alpha = config.alpha;
    let level = 1.0 - alpha;

    let (test_name, estimate, statistic, p_value, critical, confidence_interval) =
        match config.parameter {
            TestParameter::Mean => {
                let se = (var / n as f64).sqrt();
                if se == 0.0 {
                    return Err(StatsError::unstable(
                        "sample has zero variance, t statistic is undefined",
                    ));
                }
                let t = (m - config.null_value) / se;
                let dist = StudentT::new(df)?;
                let half = dist.inverse_cdf(1.0 - alpha / 2.0)? * se;
                (
                    "One-sample t-test",
                    m,
                    t,
                    tail_p(&dist, t, config.alternative),
                    critical_region(&dist, alpha, config.alternative)?,
                    ConfidenceInterval {
                        lower: m - half,
                        upper: m + half,
                        level,
                    },
                )
            }
            TestParameter::Variance | TestParameter::StdDev => {
                let is_sd = config.parameter == TestParameter::StdDev;
                if config.null_value <= 0.0 {
                    return Err(StatsError::config(format!(
                        "null {} must be positive, got {}",
                        if is_sd { "standard deviation" } else { "variance" },
                        config.null_value
                    )));
                }
                let h0_var = if is_sd {
                    config.null_value * config.null_value
                } else {
                    config.null_value
                };
                let chi = df * var / h0_var;
                let dist = ChiSquared::new(df)?;
                let lo = df * var / dist.inverse_cdf(1.0 - alpha / 2.0)?;
                let hi = df * var / dist.inverse_cdf(alpha / 2.0)?;
                let (estimate, lower, upper, name) = if is_sd {
                    (var.sqrt(), lo.sqrt(), hi.sqrt(), "Chi-square test for standard deviation")
                } else {
                    (var, lo, hi, "Chi-square test for variance")
                };
                (
                    name,
                    estimate,
                    chi,
                    tail_p(&dist, chi, config.alternative),
                    critical_region(&dist, alpha, config.alternative)?,
                    ConfidenceInterval {
                        lower,
                        upper,
                        level,
                    },
                )
            }
            TestParameter::Median | TestParameter::Percentile => {
                return Err(StatsError::config(
                    "median and percentile tests are only available with the bootstrap method",
                ));
            }
        };

    let statistic = StatsError::ensure_finite("test statistic", statistic)?;
    Ok(HypothesisTestResult {
        test_name: test_name.to_string(),
        method: TestMethod::Classical,
        parameter: config.parameter,
        alternative: config.alternative,
        n,
        null_value: config.null_value,
        estimate,
        statistic,
        p_value,
        df: Some(df),
        critical,
        reject_null: p_value < alpha,
        alpha,
        confidence_interval,
    })
}

fn bootstrap(
    data: &[f64],
    config: &HypothesisConfig,
    rng: &mut dyn RandomSource,
) -> Result<HypothesisTestResult, StatsError> {
    let statistic = match config.parameter {
        TestParameter::Mean => BootstrapStatistic::Mean,
        TestParameter::Median => BootstrapStatistic::Median,
        TestParameter::Variance => BootstrapStatistic::Variance,
        TestParameter::StdDev => BootstrapStatistic::StdDev,
        TestParameter::Percentile => BootstrapStatistic::Percentile(config.percentile),
    };
    statistic.validate()?;
    let test = bootstrap_test(
        data,
        statistic,
        config.null_value,
        config.alternative,
        config.alpha,
        config.iterations,
        rng,
    )?;
    let ci = bootstrap_ci(
        data,
        &BootstrapConfig {
            statistic,
            iterations: config.iterations,
            alpha: config.alpha,
        },
        rng,
    )?;

    Ok(HypothesisTestResult {
        test_name: format!("Bootstrap test ({})", statistic.name()),
        method: TestMethod::Bootstrap,
        parameter: config.parameter,
        alternative: config.alternative,
        n: data.len(),
        null_value: config.null_value,
        estimate: test.observed,
        statistic: test.observed,
        p_value: test.p_value,
        df: None,
        critical: CriticalRegion {
            lower: test.lower_critical,
            upper: test.upper_critical,
        },
        reject_null: test.p_value < config.alpha,
        alpha: config.alpha,
        confidence_interval: ConfidenceInterval {
            lower: ci.lower,
            upper: ci.upper,
            level: 1.0 - config.alpha,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_source;
    use statistico_common::StatsErrorKind;

    const DATA: [f64; 10] = [5.1, 4.9, 5.6, 5.8, 6.0, 5.2, 5.5, 4.7, 5.3, 5.9];

    #[test]
    fn classical_mean_t_test() {
        let mut rng = seeded_source(1);
        let cfg = HypothesisConfig {
            null_value: 5.0,
            ..Default::default()
        };
        let r = run_hypothesis_test(&DATA, &cfg, &mut rng).unwrap();
        // mean 5.4, s = 0.4346, se = 0.13744, t = 2.9104
        assert!((r.estimate - 5.4).abs() < 1e-12);
        assert!((r.statistic - 2.9104).abs() < 1e-3);
        assert_eq!(r.df, Some(9.0));
        assert!(r.p_value > 0.015 && r.p_value < 0.02);
        assert!(r.reject_null);
        let crit = r.critical.upper.unwrap();
        assert!((crit - 2.262157).abs() < 1e-4);
        assert!((r.critical.lower.unwrap() + crit).abs() < 1e-6);
        assert!(r.confidence_interval.lower > 5.0 && r.confidence_interval.upper < 5.8);
    }

    #[test]
    fn one_sided_tails_sum_to_one() {
        let mut rng = seeded_source(1);
        let left = HypothesisConfig {
            null_value: 5.0,
            alternative: Alternative::Left,
            ..Default::default()
        };
        let right = HypothesisConfig {
            alternative: Alternative::Right,
            ..left.clone()
        };
        let l = run_hypothesis_test(&DATA, &left, &mut rng).unwrap();
        let r = run_hypothesis_test(&DATA, &right, &mut rng).unwrap();
        assert!((l.p_value + r.p_value - 1.0).abs() < 1e-9);
        assert!(l.critical.upper.is_none() && r.critical.lower.is_none());
    }

    #[test]
    fn variance_and_stdev_tests_agree() {
        let mut rng = seeded_source(1);
        let var = HypothesisConfig {
            parameter: TestParameter::Variance,
            null_value: 0.25,
            ..Default::default()
        };
        let sd = HypothesisConfig {
            parameter: TestParameter::StdDev,
            null_value: 0.5,
            ..Default::default()
        };
        let a = run_hypothesis_test(&DATA, &var, &mut rng).unwrap();
        let b = run_hypothesis_test(&DATA, &sd, &mut rng).unwrap();
        assert!((a.statistic - b.statistic).abs() < 1e-12);
        assert!((a.p_value - b.p_value).abs() < 1e-12);
        assert!((b.estimate * b.estimate - a.estimate).abs() < 1e-12);
        assert!(a.confidence_interval.lower < a.estimate && a.estimate < a.confidence_interval.upper);
    }

    #[test]
    fn invalid_configurations() {
        let mut rng = seeded_source(1);
        let zero_var = HypothesisConfig {
            parameter: TestParameter::Variance,
            null_value: 0.0,
            ..Default::default()
        };
        let err = run_hypothesis_test(&DATA, &zero_var, &mut rng).unwrap_err();
        assert_eq!(err.kind(), StatsErrorKind::InvalidConfiguration);

        let median = HypothesisConfig {
            parameter: TestParameter::Median,
            ..Default::default()
        };
        assert!(run_hypothesis_test(&DATA, &median, &mut rng).is_err());

        let flat = [2.0, 2.0, 2.0];
        let err = run_hypothesis_test(&flat, &HypothesisConfig::default(), &mut rng).unwrap_err();
        assert_eq!(err.kind(), StatsErrorKind::NumericalInstability);

        let err = run_hypothesis_test(&[1.0], &HypothesisConfig::default(), &mut rng).unwrap_err();
        assert_eq!(err.kind(), StatsErrorKind::InsufficientData);
    }

    #[test]
    fn bootstrap_median_test() {
        let mut rng = seeded_source(9);
        let cfg = HypothesisConfig {
            method: TestMethod::Bootstrap,
            parameter: TestParameter::Median,
            null_value: 5.4,
            iterations: 400,
            ..Default::default()
        };
        let r = run_hypothesis_test(&DATA, &cfg, &mut rng).unwrap();
        assert_eq!(r.df, None);
        assert!((r.estimate - 5.4).abs() < 1e-12);
        assert!(r.p_value > 0.5);
        assert!(!r.reject_null);
        assert!(r.confidence_interval.lower <= 5.4 && 5.4 <= r.confidence_interval.upper);
    }
}
