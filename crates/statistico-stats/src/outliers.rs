//! Outlier detection rules over a numeric vector.
//!
//! Notes:
//! - Every rule reports outliers by their position in the input so callers can
//!   map them back to worksheet rows. Nothing here reorders the input.
//! - IQR fences read quartiles from [`crate::descriptive::quantile`].
//! - The z-score rule uses population mean and standard deviation; Grubbs uses
//!   the sample standard deviation and flags at most one point.
//! - A rule whose scale estimate is zero (no spread, or MAD = 0) fails with
//!   `NumericalInstability` instead of dividing by zero.

use statistico_common::{Dataset, StatsError};

use crate::descriptive::{describe, median_sorted, quantile, sorted_copy};
use crate::distributions::{ContinuousDistribution, StudentT};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MIN_OUTLIER_N: usize = 3;
const MAD_SCALE: f64 = 0.6745;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "method", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlierMethod {
    Iqr { multiplier: f64 },
    ZScore { threshold: f64 },
    Grubbs { alpha: f64 },
    Mad { threshold: f64 },
}

impl Default for OutlierMethod {
    fn default() -> Self {
        Self::iqr()
    }
}

impl OutlierMethod {
    pub fn iqr() -> Self {
        Self::Iqr { multiplier: 1.5 }
    }

    pub fn z_score() -> Self {
        Self::ZScore { threshold: 3.0 }
    }

    pub fn grubbs() -> Self {
        Self::Grubbs { alpha: 0.05 }
    }

    pub fn mad() -> Self {
        Self::Mad { threshold: 3.5 }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Iqr { .. } => "IQR",
            Self::ZScore { .. } => "Z-Score",
            Self::Grubbs { .. } => "Grubbs",
            Self::Mad { .. } => "MAD",
        }
    }

    fn validate(&self) -> Result<(), StatsError> {
        let (what, v, ok) = match *self {
            Self::Iqr { multiplier } => ("IQR multiplier", multiplier, multiplier > 0.0),
            Self::ZScore { threshold } => ("z-score threshold", threshold, threshold > 0.0),
            Self::Grubbs { alpha } => ("Grubbs alpha", alpha, alpha > 0.0 && alpha < 1.0),
            Self::Mad { threshold } => ("MAD threshold", threshold, threshold > 0.0),
        };
        if ok && v.is_finite() {
            Ok(())
        } else {
            Err(StatsError::config(format!("{what} out of range: {v}")))
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlierKind {
    Lower,
    Upper,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Outlier {
    /// Position in the input (or dataset row for column detection).
    pub index: usize,
    pub value: f64,
    pub kind: OutlierKind,
    /// z, modified z, G, or distance beyond the IQR fence.
    pub score: f64,
    pub address: Option<String>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierSummary {
    pub n: usize,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub method: OutlierMethod,
    pub outliers: Vec<Outlier>,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub summary: OutlierSummary,
    /// Grubbs G and its critical value.
    pub grubbs: Option<(f64, f64)>,
    /// Non-numeric cells skipped by [`detect_outliers_in_column`].
    pub excluded: usize,
}

impl OutlierReport {
    pub fn count(&self) -> usize {
        self.outliers.len()
    }
}

fn classify(value: f64, centre: f64) -> OutlierKind {
    if value < centre {
        OutlierKind::Lower
    } else {
        OutlierKind::Upper
    }
}

/// Grubbs critical value for two-sided `alpha`.
pub fn grubbs_critical(n: usize, alpha: f64) -> Result<f64, StatsError> {
    StatsError::ensure_min("Grubbs test", MIN_OUTLIER_N, n)?;
    let nf = n as f64;
    let t = StudentT::new(nf - 2.0)?.inverse_cdf(1.0 - alpha / (2.0 * nf))?;
    let t2 = t * t;
    Ok((nf - 1.0) / nf.sqrt() * (t2 / (nf - 2.0 + t2)).sqrt())
}

pub fn detect_outliers(data: &[f64], method: OutlierMethod) -> Result<OutlierReport, StatsError> {
    method.validate()?;
    StatsError::ensure_min("outlier detection", MIN_OUTLIER_N, data.len())?;
    let stats = describe(data)?;
    let summary = OutlierSummary {
        n: stats.n,
        mean: stats.mean,
        std_dev: stats.std_dev,
        median: stats.median,
        q1: stats.q1,
        q3: stats.q3,
    };
    let mut grubbs = None;

    let (lower_bound, upper_bound, outliers) = match method {
        OutlierMethod::Iqr { multiplier } => {
            let (lo, hi) = fences(data, multiplier)?;
            let found = data
                .iter()
                .enumerate()
                .filter_map(|(index, &value)| {
                    let (kind, score) = if value < lo {
                        (OutlierKind::Lower, lo - value)
                    } else if value > hi {
                        (OutlierKind::Upper, value - hi)
                    } else {
                        return None;
                    };
                    Some(Outlier {
                        index,
                        value,
                        kind,
                        score,
                        address: None,
                    })
                })
                .collect();
            (lo, hi, found)
        }
        OutlierMethod::ZScore { threshold } => {
            let sd = stats.population_variance.sqrt();
            if sd == 0.0 {
                return Err(StatsError::unstable("zero standard deviation, z-scores undefined"));
            }
            let found = data
                .iter()
                .enumerate()
                .filter_map(|(index, &value)| {
                    let z = (value - stats.mean) / sd;
                    (z.abs() > threshold).then(|| Outlier {
                        index,
                        value,
                        kind: classify(value, stats.mean),
                        score: z,
                        address: None,
                    })
                })
                .collect();
            (stats.mean - threshold * sd, stats.mean + threshold * sd, found)
        }
        OutlierMethod::Grubbs { alpha } => {
            let sd = stats.std_dev.unwrap_or(0.0);
            if sd == 0.0 {
                return Err(StatsError::unstable("zero standard deviation, Grubbs G undefined"));
            }
            let g_crit = grubbs_critical(data.len(), alpha)?;
            // First index wins on ties
            let mut best = (0, data[0]);
            for (i, &v) in data.iter().enumerate().skip(1) {
                if (v - stats.mean).abs() > (best.1 - stats.mean).abs() {
                    best = (i, v);
                }
            }
            let g = (best.1 - stats.mean).abs() / sd;
            grubbs = Some((g, g_crit));
            let found = if g > g_crit {
                vec![Outlier {
                    index: best.0,
                    value: best.1,
                    kind: classify(best.1, stats.mean),
                    score: g,
                    address: None,
                }]
            } else {
                Vec::new()
            };
            (stats.mean - g_crit * sd, stats.mean + g_crit * sd, found)
        }
        OutlierMethod::Mad { threshold } => {
            let med = stats.median;
            let deviations: Vec<f64> = data.iter().map(|x| (x - med).abs()).collect();
            let mad = median_sorted(&sorted_copy(&deviations))?;
            if mad == 0.0 {
                return Err(StatsError::unstable(
                    "median absolute deviation is zero, modified z-scores undefined",
                ));
            }
            let found = data
                .iter()
                .enumerate()
                .filter_map(|(index, &value)| {
                    let m = MAD_SCALE * (value - med) / mad;
                    (m.abs() > threshold).then(|| Outlier {
                        index,
                        value,
                        kind: classify(value, med),
                        score: m,
                        address: None,
                    })
                })
                .collect();
            let half = threshold * mad / MAD_SCALE;
            (med - half, med + half, found)
        }
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(method = method.name(), n = data.len(), flagged = outliers.len(), "outliers");

    Ok(OutlierReport {
        method,
        outliers,
        lower_bound,
        upper_bound,
        summary,
        grubbs,
        excluded: 0,
    })
}

/// Detect outliers in a dataset column, reporting dataset row indices and,
/// when the dataset carries a sheet origin, A1 addresses.
pub fn detect_outliers_in_column(
    dataset: &Dataset,
    column: &str,
    method: OutlierMethod,
) -> Result<OutlierReport, StatsError> {
    let (rows, values) = dataset.numeric_column(column)?;
    let mut report = detect_outliers(&values, method)?;
    for o in &mut report.outliers {
        o.index = rows[o.index];
        o.address = dataset.cell_address(column, o.index);
    }
    report.excluded = dataset.row_count() - rows.len();
    Ok(report)
}

/// Tukey fences `(Q1 − k·IQR, Q3 + k·IQR)`; the IQR rule flags what falls outside.
pub fn fences(data: &[f64], multiplier: f64) -> Result<(f64, f64), StatsError> {
    let sorted = sorted_copy(data);
    let q1 = quantile(&sorted, 0.25)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Ok((q1 - multiplier * iqr, q3 + multiplier * iqr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use statistico_common::{CellValue, Coord, StatsErrorKind};

    const SCENARIO: [f64; 11] = [10., 12., 12., 13., 12., 11., 14., 13., 15., 10., 90.];

    #[test]
    fn iqr_scenario() {
        let r = detect_outliers(&SCENARIO, OutlierMethod::iqr()).unwrap();
        assert_eq!(r.summary.q1, 11.5);
        assert_eq!(r.summary.q3, 13.5);
        assert_eq!(r.lower_bound, 8.5);
        assert_eq!(r.upper_bound, 16.5);
        assert_eq!(r.count(), 1);
        let o = &r.outliers[0];
        assert_eq!((o.index, o.value, o.kind), (10, 90.0, OutlierKind::Upper));
        assert_eq!(o.score, 73.5);
        assert_eq!(fences(&SCENARIO, 1.5).unwrap(), (8.5, 16.5));
    }

    #[test]
    fn iqr_rule_uses_fences_for_any_multiplier() {
        for k in [0.5, 1.5, 3.0] {
            let r = detect_outliers(&SCENARIO, OutlierMethod::Iqr { multiplier: k }).unwrap();
            assert_eq!((r.lower_bound, r.upper_bound), fences(&SCENARIO, k).unwrap());
        }
        // k = 0.5 puts the fences at 10.5 and 14.5
        let r = detect_outliers(&SCENARIO, OutlierMethod::Iqr { multiplier: 0.5 }).unwrap();
        let flagged: Vec<usize> = r.outliers.iter().map(|o| o.index).collect();
        assert_eq!(flagged, vec![0, 8, 9, 10]);
        assert_eq!(r.outliers[0].kind, OutlierKind::Lower);
    }

    #[test]
    fn grubbs_flags_single_extreme() {
        let data = [2.0, 2.1, 2.2, 2.0, 2.1, 2.3, 50.0];
        let r = detect_outliers(&data, OutlierMethod::grubbs()).unwrap();
        assert_eq!(r.count(), 1);
        assert_eq!(r.outliers[0].index, 6);
        let (g, crit) = r.grubbs.unwrap();
        assert!(g > crit);
        // published table: n = 7, alpha = 0.05 two-sided gives 2.02
        assert!((crit - 2.02).abs() < 0.01);

        let tight = [1.0, 1.1, 1.2, 0.9, 1.05, 0.95, 1.15];
        assert_eq!(detect_outliers(&tight, OutlierMethod::grubbs()).unwrap().count(), 0);
    }

    #[test]
    fn mad_and_zscore_keep_input_order() {
        let data = [100.0, 5.0, 5.5, 4.5, 5.2, 4.8, 5.1, 4.9, 5.0, 5.3, 4.7, 5.05, 4.95, -80.0];
        let mad = detect_outliers(&data, OutlierMethod::mad()).unwrap();
        let idx: Vec<usize> = mad.outliers.iter().map(|o| o.index).collect();
        assert_eq!(idx, vec![0, 13]);
        assert_eq!(mad.outliers[0].kind, OutlierKind::Upper);
        assert_eq!(mad.outliers[1].kind, OutlierKind::Lower);
        let z = detect_outliers(&data, OutlierMethod::ZScore { threshold: 1.5 }).unwrap();
        assert!(z.outliers.windows(2).all(|w| w[0].index < w[1].index));
    }

    #[test]
    fn degenerate_spread_is_numerical_instability() {
        let flat = [3.0; 6];
        for m in [OutlierMethod::z_score(), OutlierMethod::grubbs(), OutlierMethod::mad()] {
            let err = detect_outliers(&flat, m).unwrap_err();
            assert_eq!(err.kind(), StatsErrorKind::NumericalInstability);
        }
        // IQR of zero is a valid (if strict) fence
        assert_eq!(detect_outliers(&flat, OutlierMethod::iqr()).unwrap().count(), 0);
        assert!(detect_outliers(&[1.0, 2.0], OutlierMethod::iqr()).is_err());
        assert!(detect_outliers(&SCENARIO, OutlierMethod::Grubbs { alpha: 1.5 }).is_err());
    }

    #[test]
    fn column_detection_maps_rows_and_addresses() {
        let mut values: Vec<CellValue> = SCENARIO.iter().map(|&v| CellValue::Number(v)).collect();
        values.insert(3, CellValue::Text("n/a".into()));
        let rows = values.into_iter().map(|v| vec![v]).collect();
        let ds = Dataset::from_rows(&["score"], rows)
            .unwrap()
            .with_origin(Coord::parse_a1("B2").unwrap());
        let r = detect_outliers_in_column(&ds, "score", OutlierMethod::iqr()).unwrap();
        assert_eq!(r.excluded, 1);
        assert_eq!(r.outliers[0].index, 11);
        assert_eq!(r.outliers[0].address.as_deref(), Some("B13"));
    }
}
