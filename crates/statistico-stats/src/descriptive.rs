//! Descriptive statistics for a single numeric vector.
//!
//! Notes:
//! - Quartiles follow the midpoint rule
//!   `(sorted[floor((n-1)p)] + sorted[ceil((n-1)p)]) / 2`. Box plots, the
//!   histogram summary and the IQR outlier fence all read quartiles from
//!   [`quantile`], so they always agree.
//! - Variance and standard deviation are sample statistics (divisor n − 1).
//! - Skewness and kurtosis are population (divide-by-n) standardized moments.
//!   Kurtosis is stored as *excess* kurtosis; [`DescriptiveStats::raw_kurtosis`]
//!   is the only place the +3 conversion happens.

use statistico_common::StatsError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    pub n: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// Smallest of the most frequent values; `None` when all values are unique.
    pub mode: Option<f64>,
    /// Sample variance (n − 1). `None` for n < 2.
    pub variance: Option<f64>,
    pub std_dev: Option<f64>,
    pub population_variance: f64,
    pub standard_error: Option<f64>,
    /// `std_dev / |mean|`; `None` when undefined.
    pub coefficient_of_variation: Option<f64>,
    /// `None` when the data has no spread.
    pub skewness: Option<f64>,
    pub excess_kurtosis: Option<f64>,
}

impl DescriptiveStats {
    /// Fourth standardized moment without the −3 shift.
    pub fn raw_kurtosis(&self) -> Option<f64> {
        self.excess_kurtosis.map(excess_to_raw)
    }
}

#[inline]
pub fn excess_to_raw(excess: f64) -> f64 {
    excess + 3.0
}

/// Quantile of already-sorted data using the midpoint convention.
pub fn quantile(sorted: &[f64], p: f64) -> Result<f64, StatsError> {
    if sorted.is_empty() {
        return Err(StatsError::insufficient("quantile", 1, 0));
    }
    if !(0.0..=1.0).contains(&p) {
        return Err(StatsError::config(format!(
            "quantile probability must lie in [0, 1], got {p}"
        )));
    }
    let rank = (sorted.len() - 1) as f64 * p;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Ok((sorted[lo] + sorted[hi]) / 2.0)
}

/// Median of already-sorted data (average of the middle two for even n).
pub fn median_sorted(sorted: &[f64]) -> Result<f64, StatsError> {
    let n = sorted.len();
    if n == 0 {
        return Err(StatsError::insufficient("median", 1, 0));
    }
    if n % 2 == 1 {
        Ok(sorted[n / 2])
    } else {
        Ok((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

pub fn sorted_copy(data: &[f64]) -> Vec<f64> {
    let mut v = data.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

pub fn mean(data: &[f64]) -> Result<f64, StatsError> {
    if data.is_empty() {
        return Err(StatsError::insufficient("mean", 1, 0));
    }
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Sample variance (n − 1 divisor).
pub fn sample_variance(data: &[f64]) -> Result<f64, StatsError> {
    StatsError::ensure_min("sample variance", 2, data.len())?;
    let m = mean(data)?;
    Ok(data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64)
}

pub fn sample_std_dev(data: &[f64]) -> Result<f64, StatsError> {
    sample_variance(data).map(f64::sqrt)
}

/// Population variance (n divisor).
pub fn population_variance(data: &[f64]) -> Result<f64, StatsError> {
    let m = mean(data)?;
    Ok(data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64)
}

/// Central moments `(m2, m3, m4)` with divisor n.
pub(crate) fn central_moments(data: &[f64], mean: f64) -> (f64, f64, f64) {
    let n = data.len() as f64;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for x in data {
        let d = x - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Population skewness and excess kurtosis; `None` without spread.
pub fn shape_moments(data: &[f64]) -> Result<Option<(f64, f64)>, StatsError> {
    let m = mean(data)?;
    let (m2, m3, m4) = central_moments(data, m);
    if m2 == 0.0 || m2.sqrt() <= 1e-12 * m.abs() {
        return Ok(None);
    }
    let skew = m3 / m2.powf(1.5);
    let kurt = m4 / (m2 * m2);
    Ok(Some((skew, kurt - 3.0)))
}

fn mode(sorted: &[f64]) -> Option<f64> {
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        let count = j - i;
        if count > 1 && best.is_none_or(|(_, c)| count > c) {
            best = Some((sorted[i], count));
        }
        i = j;
    }
    best.map(|(v, _)| v)
}

/// Full descriptive summary. Empty input is an explicit `InsufficientData`.
pub fn describe(data: &[f64]) -> Result<DescriptiveStats, StatsError> {
    StatsError::ensure_min("descriptive statistics", 1, data.len())?;
    if let Some(bad) = data.iter().find(|v| !v.is_finite()) {
        return Err(StatsError::config(format!(
            "numeric vector contains a non-finite value ({bad})"
        )));
    }
    let n = data.len();
    let sorted = sorted_copy(data);
    let sum: f64 = data.iter().sum();
    let mean = sum / n as f64;
    let min = sorted[0];
    let max = sorted[n - 1];
    let q1 = quantile(&sorted, 0.25)?;
    let q3 = quantile(&sorted, 0.75)?;

    let variance = (n >= 2).then(|| sample_variance(data)).transpose()?;
    let std_dev = variance.map(f64::sqrt);
    let standard_error = std_dev.map(|s| s / (n as f64).sqrt());
    let coefficient_of_variation = match std_dev {
        Some(s) if mean != 0.0 => Some(s / mean.abs()),
        _ => None,
    };
    let shape = shape_moments(data)?;

    Ok(DescriptiveStats {
        n,
        sum,
        mean,
        min,
        max,
        range: max - min,
        median: median_sorted(&sorted)?,
        q1,
        q3,
        iqr: q3 - q1,
        mode: mode(&sorted),
        variance,
        std_dev,
        population_variance: population_variance(data)?,
        standard_error,
        coefficient_of_variation,
        skewness: shape.map(|(s, _)| s),
        excess_kurtosis: shape.map(|(_, k)| k),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quartiles_use_midpoint_rule() {
        let sorted = sorted_copy(&[10., 12., 12., 13., 12., 11., 14., 13., 15., 10., 90.]);
        assert_eq!(quantile(&sorted, 0.25).unwrap(), 11.5);
        assert_eq!(quantile(&sorted, 0.5).unwrap(), 12.0);
        assert_eq!(quantile(&sorted, 0.75).unwrap(), 13.5);
        // not linear interpolation: (n-1)p = 0.75 picks the midpoint of 1 and 2
        assert_eq!(quantile(&[1.0, 2.0, 3.0, 4.0], 0.25).unwrap(), 1.5);
        assert!(quantile(&sorted, 1.5).is_err());
    }

    #[test]
    fn median_matches_quantile() {
        for data in [vec![3.0, 1.0, 2.0], vec![4.0, 1.0, 3.0, 2.0]] {
            let s = sorted_copy(&data);
            assert_eq!(median_sorted(&s).unwrap(), quantile(&s, 0.5).unwrap());
        }
    }

    #[test]
    fn describe_basic() {
        let d = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(d.n, 8);
        assert_eq!(d.mean, 5.0);
        assert_eq!(d.population_variance, 4.0);
        assert!((d.variance.unwrap() - 32.0 / 7.0).abs() < 1e-12);
        assert_eq!(d.median, 4.5);
        assert_eq!(d.mode, Some(4.0));
        assert_eq!(d.range, 7.0);
        // population moments: m3 = 5.25, m4 = 44.5 with m2 = 4
        assert!((d.skewness.unwrap() - 5.25 / 8.0).abs() < 1e-12);
        assert!((d.excess_kurtosis.unwrap() - (44.5 / 16.0 - 3.0)).abs() < 1e-12);
        assert!((d.raw_kurtosis().unwrap() - 44.5 / 16.0).abs() < 1e-12);
    }

    #[test]
    fn small_and_degenerate_inputs() {
        assert_eq!(
            describe(&[]).unwrap_err().kind(),
            statistico_common::StatsErrorKind::InsufficientData
        );
        let one = describe(&[3.0]).unwrap();
        assert_eq!(one.variance, None);
        assert_eq!(one.skewness, None);
        assert_eq!(one.mode, None);
        let flat = describe(&[2.0, 2.0, 2.0]).unwrap();
        assert_eq!(flat.variance, Some(0.0));
        assert_eq!(flat.skewness, None);
        assert_eq!(flat.excess_kurtosis, None);
        assert!(describe(&[1.0, f64::NAN]).is_err());
        assert!(sample_variance(&[1.0]).is_err());
    }
}
