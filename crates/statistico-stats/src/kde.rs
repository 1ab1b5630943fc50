//! Kernel density estimation on an evenly spaced grid.
//!
//! Bandwidth is Scott's rule `1.06·s·n^(−1/5)` (sample standard deviation)
//! scaled by the caller's multiplier. The grid spans the data range padded by
//! `padding × range` on each side.

use statistico_common::StatsError;

use crate::descriptive::{sample_std_dev, sorted_copy};
use crate::distributions::std_norm_pdf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kernel {
    #[default]
    Gaussian,
    Epanechnikov,
    Triangular,
    Uniform,
}

impl Kernel {
    #[inline]
    pub fn weight(&self, u: f64) -> f64 {
        match self {
            Self::Gaussian => std_norm_pdf(u),
            _ if u.abs() > 1.0 => 0.0,
            Self::Epanechnikov => 0.75 * (1.0 - u * u),
            Self::Triangular => 1.0 - u.abs(),
            Self::Uniform => 0.5,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct KdeConfig {
    pub kernel: Kernel,
    pub bandwidth_multiplier: f64,
    pub grid_points: usize,
    /// Fraction of the data range added below the minimum and above the maximum.
    pub padding: f64,
}

impl Default for KdeConfig {
    fn default() -> Self {
        Self {
            kernel: Kernel::Gaussian,
            bandwidth_multiplier: 1.0,
            grid_points: 200,
            padding: 0.2,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityPoint {
    pub x: f64,
    pub density: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct KdeResult {
    pub kernel: Kernel,
    /// Bandwidth actually used (Scott × multiplier).
    pub bandwidth: f64,
    pub scott_bandwidth: f64,
    pub grid_min: f64,
    pub grid_max: f64,
    pub density: Vec<DensityPoint>,
}

impl KdeResult {
    /// Trapezoid integral of the density over the grid.
    pub fn integral(&self) -> f64 {
        self.density
            .windows(2)
            .map(|w| (w[1].x - w[0].x) * (w[0].density + w[1].density) / 2.0)
            .sum()
    }
}

pub fn scott_bandwidth(data: &[f64]) -> Result<f64, StatsError> {
    let sd = sample_std_dev(data)?;
    if sd == 0.0 {
        return Err(StatsError::unstable("zero standard deviation, bandwidth undefined"));
    }
    Ok(1.06 * sd * (data.len() as f64).powf(-0.2))
}

pub fn estimate_kde(data: &[f64], config: &KdeConfig) -> Result<KdeResult, StatsError> {
    if !(config.bandwidth_multiplier.is_finite() && config.bandwidth_multiplier > 0.0) {
        return Err(StatsError::config(format!(
            "bandwidth multiplier must be positive, got {}",
            config.bandwidth_multiplier
        )));
    }
    if config.grid_points < 2 {
        return Err(StatsError::config("KDE grid needs at least 2 points"));
    }
    if !(config.padding.is_finite() && config.padding >= 0.0) {
        return Err(StatsError::config("KDE padding must be non-negative"));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::config("numeric vector contains a non-finite value"));
    }

    let scott = scott_bandwidth(data)?;
    let h = scott * config.bandwidth_multiplier;
    let sorted = sorted_copy(data);
    let (lo, hi) = (sorted[0], sorted[sorted.len() - 1]);
    let pad = (hi - lo) * config.padding;
    let (grid_min, grid_max) = (lo - pad, hi + pad);
    let step = (grid_max - grid_min) / (config.grid_points - 1) as f64;
    let norm = data.len() as f64 * h;

    let density = (0..config.grid_points)
        .map(|i| {
            let x = grid_min + step * i as f64;
            let sum: f64 = data.iter().map(|xi| config.kernel.weight((x - xi) / h)).sum();
            DensityPoint {
                x,
                density: sum / norm,
            }
        })
        .collect();

    Ok(KdeResult {
        kernel: config.kernel,
        bandwidth: h,
        scott_bandwidth: scott,
        grid_min,
        grid_max,
        density,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statistico_common::StatsErrorKind;

    fn sample() -> Vec<f64> {
        vec![1.2, 1.9, 2.1, 2.4, 2.5, 2.8, 3.0, 3.1, 3.3, 3.9, 4.4, 5.0]
    }

    #[test]
    fn kernels_have_unit_mass() {
        for k in [Kernel::Epanechnikov, Kernel::Triangular, Kernel::Uniform] {
            let step = 0.001;
            let mass: f64 = (0..2000).map(|i| k.weight(-1.0 + (i as f64 + 0.5) * step) * step).sum();
            assert!((mass - 1.0).abs() < 1e-3, "{k:?}");
            assert_eq!(k.weight(1.5), 0.0);
        }
        assert!((Kernel::Gaussian.weight(0.0) - 0.398942).abs() < 1e-6);
    }

    #[test]
    fn grid_and_bandwidth() {
        let data = sample();
        let r = estimate_kde(&data, &KdeConfig::default()).unwrap();
        assert_eq!(r.density.len(), 200);
        assert!((r.grid_min - (1.2 - 0.76)).abs() < 1e-12);
        assert!((r.grid_max - (5.0 + 0.76)).abs() < 1e-12);
        let sd = sample_std_dev(&data).unwrap();
        assert!((r.scott_bandwidth - 1.06 * sd * 12f64.powf(-0.2)).abs() < 1e-12);

        let wide = KdeConfig {
            bandwidth_multiplier: 2.0,
            ..Default::default()
        };
        let r2 = estimate_kde(&data, &wide).unwrap();
        assert!((r2.bandwidth - 2.0 * r.bandwidth).abs() < 1e-12);
    }

    #[test]
    fn density_integrates_near_one() {
        let data = sample();
        for kernel in [Kernel::Gaussian, Kernel::Epanechnikov, Kernel::Triangular, Kernel::Uniform] {
            let cfg = KdeConfig {
                kernel,
                padding: 0.6,
                grid_points: 1000,
                ..Default::default()
            };
            let r = estimate_kde(&data, &cfg).unwrap();
            assert!((r.integral() - 1.0).abs() < 0.03, "{kernel:?}: {}", r.integral());
            assert!(r.density.iter().all(|p| p.density >= 0.0));
        }
    }

    #[test]
    fn rejects_bad_configuration() {
        let data = sample();
        let zero = KdeConfig {
            bandwidth_multiplier: 0.0,
            ..Default::default()
        };
        assert_eq!(
            estimate_kde(&data, &zero).unwrap_err().kind(),
            StatsErrorKind::InvalidConfiguration
        );
        assert_eq!(
            estimate_kde(&[1.0], &KdeConfig::default()).unwrap_err().kind(),
            StatsErrorKind::InsufficientData
        );
        assert_eq!(
            estimate_kde(&[2.0, 2.0], &KdeConfig::default()).unwrap_err().kind(),
            StatsErrorKind::NumericalInstability
        );
    }
}
