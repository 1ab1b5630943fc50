//! Nonparametric bootstrap.
//!
//! Notes:
//! - Resamples are drawn with replacement through an injected
//!   [`RandomSource`]; nothing here touches global RNG state.
//! - Percentile intervals use `[sorted[floor(B·α/2)], sorted[floor(B·(1−α/2))]]`
//!   with the upper index clamped to `B − 1`.
//! - Hypothesis tests move the data onto the null before resampling. Location
//!   statistics (mean, median, percentile) are shifted by `observed − H0`;
//!   scale statistics (variance, standard deviation) are rescaled about the
//!   mean, since a shift leaves their value unchanged.

use statistico_common::StatsError;

use crate::descriptive::{mean, median_sorted, quantile, sample_variance, sorted_copy};
use crate::random::RandomSource;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MIN_BOOTSTRAP_N: usize = 2;
pub const MIN_ITERATIONS: usize = 10;
pub const DEFAULT_ITERATIONS: usize = 1000;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BootstrapStatistic {
    Mean,
    Median,
    Variance,
    StdDev,
    /// Quantile at the given probability, midpoint convention.
    Percentile(f64),
}

impl BootstrapStatistic {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Variance => "variance",
            Self::StdDev => "standard deviation",
            Self::Percentile(_) => "percentile",
        }
    }

    pub fn is_scale(&self) -> bool {
        matches!(self, Self::Variance | Self::StdDev)
    }

    pub fn validate(&self) -> Result<(), StatsError> {
        if let Self::Percentile(p) = self {
            if !(0.0..=1.0).contains(p) {
                return Err(StatsError::config(format!(
                    "percentile must lie in [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }

    pub fn compute(&self, data: &[f64]) -> Result<f64, StatsError> {
        match self {
            Self::Mean => mean(data),
            Self::Median => median_sorted(&sorted_copy(data)),
            Self::Variance => sample_variance(data),
            Self::StdDev => sample_variance(data).map(f64::sqrt),
            Self::Percentile(p) => quantile(&sorted_copy(data), *p),
        }
    }
}

/// Direction of the alternative hypothesis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alternative {
    Left,
    Right,
    #[default]
    TwoSided,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapConfig {
    pub statistic: BootstrapStatistic,
    pub iterations: usize,
    pub alpha: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            statistic: BootstrapStatistic::Mean,
            iterations: DEFAULT_ITERATIONS,
            alpha: 0.05,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapInterval {
    pub statistic: BootstrapStatistic,
    /// Statistic on the original sample.
    pub observed: f64,
    pub lower: f64,
    pub upper: f64,
    pub alpha: f64,
    pub iterations: usize,
    /// Standard deviation of the resample statistics.
    pub standard_error: f64,
    /// Mean resample statistic minus the observed statistic.
    pub bias: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapTest {
    pub statistic: BootstrapStatistic,
    pub observed: f64,
    pub null_value: f64,
    pub p_value: f64,
    /// Rejection bounds read off the null resample distribution.
    pub lower_critical: Option<f64>,
    pub upper_critical: Option<f64>,
    pub iterations: usize,
}

pub(crate) fn check_alpha(alpha: f64) -> Result<(), StatsError> {
    if alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(StatsError::config(format!(
            "alpha must lie strictly between 0 and 1, got {alpha}"
        )))
    }
}

fn check_inputs(data: &[f64], iterations: usize) -> Result<(), StatsError> {
    StatsError::ensure_min("bootstrap resampling", MIN_BOOTSTRAP_N, data.len())?;
    if iterations < MIN_ITERATIONS {
        return Err(StatsError::config(format!(
            "bootstrap needs at least {MIN_ITERATIONS} iterations, got {iterations}"
        )));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::config("numeric vector contains a non-finite value"));
    }
    Ok(())
}

/// Statistic of `iterations` resamples, in draw order.
pub fn bootstrap_distribution(
    data: &[f64],
    statistic: BootstrapStatistic,
    iterations: usize,
    rng: &mut dyn RandomSource,
) -> Result<Vec<f64>, StatsError> {
    check_inputs(data, iterations)?;
    statistic.validate()?;
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("bootstrap", n = data.len(), iterations).entered();

    let n = data.len();
    let mut sample = vec![0.0; n];
    let mut out = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        for slot in sample.iter_mut() {
            *slot = data[rng.index(n)];
        }
        out.push(statistic.compute(&sample)?);
    }
    Ok(out)
}

/// Percentile interval of a sorted resample distribution.
pub fn percentile_interval(sorted: &[f64], alpha: f64) -> (f64, f64) {
    let b = sorted.len();
    let lo = ((b as f64 * alpha / 2.0).floor() as usize).min(b - 1);
    let hi = ((b as f64 * (1.0 - alpha / 2.0)).floor() as usize).min(b - 1);
    (sorted[lo], sorted[hi])
}

pub fn bootstrap_ci(
    data: &[f64],
    config: &BootstrapConfig,
    rng: &mut dyn RandomSource,
) -> Result<BootstrapInterval, StatsError> {
    check_alpha(config.alpha)?;
    let observed = config.statistic.compute(data)?;
    let dist = bootstrap_distribution(data, config.statistic, config.iterations, rng)?;
    let boot_mean = mean(&dist)?;
    let standard_error = sample_variance(&dist)?.sqrt();
    let sorted = sorted_copy(&dist);
    let (lower, upper) = percentile_interval(&sorted, config.alpha);
    Ok(BootstrapInterval {
        statistic: config.statistic,
        observed,
        lower,
        upper,
        alpha: config.alpha,
        iterations: config.iterations,
        standard_error,
        bias: boot_mean - observed,
    })
}

/// Move the sample onto the null hypothesis.
fn to_null(
    data: &[f64],
    statistic: BootstrapStatistic,
    observed: f64,
    null_value: f64,
) -> Result<Vec<f64>, StatsError> {
    if !statistic.is_scale() {
        let shift = observed - null_value;
        return Ok(data.iter().map(|x| x - shift).collect());
    }
    if null_value <= 0.0 {
        return Err(StatsError::config(format!(
            "null {} must be positive, got {null_value}",
            statistic.name()
        )));
    }
    if observed <= 0.0 {
        return Err(StatsError::unstable(
            "sample has no spread, cannot rescale to the null",
        ));
    }
    let factor = match statistic {
        BootstrapStatistic::Variance => (null_value / observed).sqrt(),
        _ => null_value / observed,
    };
    let m = mean(data)?;
    Ok(data.iter().map(|x| m + (x - m) * factor).collect())
}

/// Bootstrap test of `statistic == null_value`.
pub fn bootstrap_test(
    data: &[f64],
    statistic: BootstrapStatistic,
    null_value: f64,
    alternative: Alternative,
    alpha: f64,
    iterations: usize,
    rng: &mut dyn RandomSource,
) -> Result<BootstrapTest, StatsError> {
    check_alpha(alpha)?;
    check_inputs(data, iterations)?;
    if !null_value.is_finite() {
        return Err(StatsError::config("null value must be finite"));
    }
    let observed = statistic.compute(data)?;
    let shifted = to_null(data, statistic, observed, null_value)?;
    let dist = bootstrap_distribution(&shifted, statistic, iterations, rng)?;

    let b = dist.len() as f64;
    let extreme = match alternative {
        Alternative::Right => dist.iter().filter(|s| **s >= observed).count(),
        Alternative::Left => dist.iter().filter(|s| **s <= observed).count(),
        Alternative::TwoSided => {
            let gap = (observed - null_value).abs();
            dist.iter()
                .filter(|s| (**s - null_value).abs() >= gap)
                .count()
        }
    };

    let sorted = sorted_copy(&dist);
    let at = |q: f64| sorted[((b * q).floor() as usize).min(sorted.len() - 1)];
    let (lower_critical, upper_critical) = match alternative {
        Alternative::Left => (Some(at(alpha)), None),
        Alternative::Right => (None, Some(at(1.0 - alpha))),
        Alternative::TwoSided => (Some(at(alpha / 2.0)), Some(at(1.0 - alpha / 2.0))),
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(observed, null_value, extreme, "bootstrap_test");

    Ok(BootstrapTest {
        statistic,
        observed,
        null_value,
        p_value: (extreme as f64 / b).clamp(0.0, 1.0),
        lower_critical,
        upper_critical,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_source;

    #[test]
    fn percentile_interval_indices() {
        let sorted: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        assert_eq!(percentile_interval(&sorted, 0.05), (25.0, 975.0));
        let tiny = [1.0, 2.0];
        assert_eq!(percentile_interval(&tiny, 0.01), (1.0, 2.0));
    }

    #[test]
    fn ci_brackets_observed_mean() {
        let data: Vec<f64> = (1..=50).map(|i| i as f64).collect();
        let mut rng = seeded_source(11);
        let ci = bootstrap_ci(&data, &BootstrapConfig::default(), &mut rng).unwrap();
        assert_eq!(ci.observed, 25.5);
        assert!(ci.lower < 25.5 && 25.5 < ci.upper);
        assert!(ci.standard_error > 0.0);
        assert!(ci.bias.abs() < 1.0);
    }

    #[test]
    fn null_shift_recenters_location() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let shifted = to_null(&data, BootstrapStatistic::Mean, 2.5, 10.0).unwrap();
        assert_eq!(mean(&shifted).unwrap(), 10.0);
        let scaled = to_null(&data, BootstrapStatistic::Variance, 5.0 / 3.0, 15.0).unwrap();
        assert!((sample_variance(&scaled).unwrap() - 15.0).abs() < 1e-9);
        assert!(to_null(&data, BootstrapStatistic::StdDev, 1.0, 0.0).is_err());
    }

    #[test]
    fn bootstrap_test_detects_shifted_mean() {
        let data: Vec<f64> = (0..40).map(|i| 5.0 + (i % 5) as f64 * 0.1).collect();
        let mut rng = seeded_source(3);
        let far = bootstrap_test(
            &data,
            BootstrapStatistic::Mean,
            0.0,
            Alternative::TwoSided,
            0.05,
            500,
            &mut rng,
        )
        .unwrap();
        assert_eq!(far.p_value, 0.0);
        let near = bootstrap_test(
            &data,
            BootstrapStatistic::Mean,
            far.observed,
            Alternative::TwoSided,
            0.05,
            500,
            &mut rng,
        )
        .unwrap();
        assert_eq!(near.p_value, 1.0);
        assert!(near.lower_critical.unwrap() < near.upper_critical.unwrap());
    }

    #[test]
    fn guards() {
        let mut rng = seeded_source(1);
        assert!(bootstrap_distribution(&[1.0], BootstrapStatistic::Mean, 100, &mut rng).is_err());
        assert!(bootstrap_distribution(&[1.0, 2.0], BootstrapStatistic::Mean, 5, &mut rng).is_err());
        assert!(
            bootstrap_distribution(&[1.0, 2.0], BootstrapStatistic::Percentile(2.0), 50, &mut rng)
                .is_err()
        );
    }
}
