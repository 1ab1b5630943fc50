//! Normality tests and the composite normality score.
//!
//! Notes:
//! - Shapiro-Wilk uses Blom-scored normal order statistics
//!   `m_i = Φ⁻¹((i − 0.375)/(n + 0.25))`, normalized to unit length, as the
//!   coefficients. The p-value follows Royston (1992): an exact arcsine form at
//!   n = 3, a small-sample log transform for n ≤ 11 and a log-normal fit of
//!   `1 − W` for n ≥ 12.
//! - Jarque-Bera reads the raw fourth moment and subtracts 3 itself.
//! - Kolmogorov-Smirnov compares against a normal with the sample mean and
//!   standard deviation; the p-value is the Kolmogorov series at `√n·D`.
//! - Anderson-Darling reports the small-sample adjusted statistic
//!   `A* = A²(1 + 0.75/n + 2.25/n²)`, which also drives the p-value.
//! - The score is a heuristic blend of the four p-values, not a test.

use statistico_common::StatsError;

use crate::descriptive::{excess_to_raw, mean, sample_std_dev, shape_moments, sorted_copy};
use crate::distributions::{clamp_probability, std_norm_cdf, std_norm_inv};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MIN_NORMALITY_N: usize = 3;
pub const NORMALITY_ALPHA: f64 = 0.05;

const KS_TERMS: usize = 100;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalityTest {
    pub statistic: f64,
    pub p_value: f64,
    /// Normality rejected at α = 0.05.
    pub rejected: bool,
}

impl NormalityTest {
    fn new(statistic: f64, p_value: f64) -> Self {
        let p_value = clamp_probability(p_value);
        Self {
            statistic,
            p_value,
            rejected: p_value < NORMALITY_ALPHA,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalityBand {
    Likely,
    Possibly,
    Unlikely,
}

impl NormalityBand {
    pub fn from_score(score: u32) -> Self {
        match score {
            70.. => Self::Likely,
            40.. => Self::Possibly,
            _ => Self::Unlikely,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Likely => "Likely normal",
            Self::Possibly => "Possibly normal",
            Self::Unlikely => "Unlikely normal",
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct NormalitySuite {
    pub n: usize,
    pub shapiro_wilk: NormalityTest,
    pub jarque_bera: NormalityTest,
    pub kolmogorov_smirnov: NormalityTest,
    pub anderson_darling: NormalityTest,
    /// 0–100, higher reads as "more normal".
    pub score: u32,
    pub band: NormalityBand,
}

/// Weighted blend `0.35·SW + 0.25·JB + 0.20·KS + 0.20·AD` of p-values, ×100.
pub fn normality_score(sw: f64, jb: f64, ks: f64, ad: f64) -> u32 {
    let blend = 0.35 * sw + 0.25 * jb + 0.20 * ks + 0.20 * ad;
    (blend * 100.0).round().clamp(0.0, 100.0) as u32
}

fn prepare(data: &[f64]) -> Result<(Vec<f64>, f64, f64), StatsError> {
    StatsError::ensure_min("normality test", MIN_NORMALITY_N, data.len())?;
    if data.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::config("numeric vector contains a non-finite value"));
    }
    let m = mean(data)?;
    let sd = sample_std_dev(data)?;
    if sd == 0.0 {
        return Err(StatsError::unstable("sample has zero variance"));
    }
    Ok((sorted_copy(data), m, sd))
}

/* ═══════════════════════════════════════════════════════════════════════════
SHAPIRO-WILK
═══════════════════════════════════════════════════════════════════════════ */

fn blom_coefficients(n: usize) -> Vec<f64> {
    let nf = n as f64;
    let m: Vec<f64> = (1..=n)
        .map(|i| std_norm_inv((i as f64 - 0.375) / (nf + 0.25)).unwrap_or(0.0))
        .collect();
    let norm = m.iter().map(|v| v * v).sum::<f64>().sqrt();
    m.into_iter().map(|v| v / norm).collect()
}

fn poly(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn shapiro_wilk_p(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    if n == 3 {
        let p = 6.0 / std::f64::consts::PI * (w.sqrt().asin() - 0.75f64.sqrt().asin());
        return p.max(0.0);
    }
    let y = (1.0 - w).ln();
    let (z, mu, sigma) = if n <= 11 {
        let gamma = poly(&[-2.273, 0.459], nf);
        if y >= gamma {
            return 0.0;
        }
        let mu = poly(&[0.544, -0.39978, 0.025054, -6.714e-4], nf);
        let sigma = poly(&[1.3822, -0.77857, 0.062767, -0.0020322], nf).exp();
        (-(gamma - y).ln(), mu, sigma)
    } else {
        let u = nf.ln();
        let mu = poly(&[-1.5861, -0.31082, -0.083751, 0.0038915], u);
        let sigma = poly(&[-0.4803, -0.082676, 0.0030302], u).exp();
        (y, mu, sigma)
    };
    1.0 - std_norm_cdf((z - mu) / sigma)
}

pub fn shapiro_wilk(data: &[f64]) -> Result<NormalityTest, StatsError> {
    let (sorted, m, _) = prepare(data)?;
    let a = blom_coefficients(sorted.len());
    let num: f64 = a.iter().zip(&sorted).map(|(a, x)| a * x).sum();
    let ss: f64 = sorted.iter().map(|x| (x - m).powi(2)).sum();
    let w = (num * num / ss).min(1.0);
    Ok(NormalityTest::new(w, shapiro_wilk_p(w, sorted.len())))
}

/* ═══════════════════════════════════════════════════════════════════════════
JARQUE-BERA
═══════════════════════════════════════════════════════════════════════════ */

pub fn jarque_bera(data: &[f64]) -> Result<NormalityTest, StatsError> {
    prepare(data)?;
    let (skew, excess) = shape_moments(data)?
        .ok_or_else(|| StatsError::unstable("sample has zero variance"))?;
    let kurt = excess_to_raw(excess);
    let n = data.len() as f64;
    let jb = n / 6.0 * (skew * skew + (kurt - 3.0).powi(2) / 4.0);
    // chi-square(2) survival is exp(-x/2)
    Ok(NormalityTest::new(jb, (-jb / 2.0).exp()))
}

/* ═══════════════════════════════════════════════════════════════════════════
KOLMOGOROV-SMIRNOV
═══════════════════════════════════════════════════════════════════════════ */

/// Asymptotic Kolmogorov survival `Q(λ) = 2 Σ (−1)^(k−1) exp(−2k²λ²)`.
pub fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let mut sum = 0.0;
    let mut sign = 1.0;
    for k in 1..=KS_TERMS {
        let kf = k as f64;
        let term = (-2.0 * kf * kf * lambda * lambda).exp();
        sum += sign * term;
        if term < 1e-12 {
            return clamp_probability(2.0 * sum);
        }
        sign = -sign;
    }
    1.0
}

pub fn kolmogorov_smirnov(data: &[f64]) -> Result<NormalityTest, StatsError> {
    let (sorted, m, sd) = prepare(data)?;
    let n = sorted.len() as f64;
    let d = sorted
        .iter()
        .enumerate()
        .map(|(i, x)| {
            let f = std_norm_cdf((x - m) / sd);
            let above = (i as f64 + 1.0) / n - f;
            let below = f - i as f64 / n;
            above.max(below)
        })
        .fold(0.0, f64::max);
    Ok(NormalityTest::new(d, kolmogorov_sf(n.sqrt() * d)))
}

/* ═══════════════════════════════════════════════════════════════════════════
ANDERSON-DARLING
═══════════════════════════════════════════════════════════════════════════ */

/// Stephens' piecewise p-value, keyed on the adjusted `A*`, not the raw `A²`.
fn anderson_darling_p(a: f64) -> f64 {
    if a >= 0.6 {
        (1.2937 - 5.709 * a + 0.0186 * a * a).exp()
    } else if a > 0.34 {
        (0.9177 - 4.279 * a - 1.38 * a * a).exp()
    } else if a > 0.2 {
        1.0 - (-8.318 + 42.796 * a - 59.938 * a * a).exp()
    } else {
        1.0 - (-13.436 + 101.14 * a - 223.73 * a * a).exp()
    }
}

pub fn anderson_darling(data: &[f64]) -> Result<NormalityTest, StatsError> {
    let (sorted, m, sd) = prepare(data)?;
    let n = sorted.len();
    let nf = n as f64;
    let cdf: Vec<f64> = sorted
        .iter()
        .map(|x| std_norm_cdf((x - m) / sd).clamp(1e-15, 1.0 - 1e-15))
        .collect();
    let s: f64 = (0..n)
        .map(|i| (2 * i + 1) as f64 * (cdf[i].ln() + (1.0 - cdf[n - 1 - i]).ln()))
        .sum();
    let a2 = -nf - s / nf;
    let adjusted = a2 * (1.0 + 0.75 / nf + 2.25 / (nf * nf));
    Ok(NormalityTest::new(adjusted, anderson_darling_p(adjusted)))
}

/* ═══════════════════════════════════════════════════════════════════════════
SUITE
═══════════════════════════════════════════════════════════════════════════ */

pub fn run_normality_suite(data: &[f64]) -> Result<NormalitySuite, StatsError> {
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("normality_suite", n = data.len()).entered();

    let shapiro_wilk = shapiro_wilk(data)?;
    let jarque_bera = jarque_bera(data)?;
    let kolmogorov_smirnov = kolmogorov_smirnov(data)?;
    let anderson_darling = anderson_darling(data)?;
    let score = normality_score(
        shapiro_wilk.p_value,
        jarque_bera.p_value,
        kolmogorov_smirnov.p_value,
        anderson_darling.p_value,
    );
    Ok(NormalitySuite {
        n: data.len(),
        shapiro_wilk,
        jarque_bera,
        kolmogorov_smirnov,
        anderson_darling,
        score,
        band: NormalityBand::from_score(score),
    })
}
