//! Loading rotations.
//!
//! Notes:
//! - Varimax works on Kaiser-normalized rows (each row divided by the square
//!   root of its communality) and rotates one factor pair at a time by
//!   `φ = ¼·atan2(num, den)` until every angle in a sweep is below 1e-6 or
//!   [`VARIMAX_SWEEPS`] sweeps have run.
//! - Promax raises the varimax loadings to a power (keeping sign), regresses
//!   that target on the varimax loadings, and rescales the transform so the
//!   factor correlation matrix `Φ = (UᵀU)⁻¹` has a unit diagonal.

use statistico_common::StatsError;

use crate::linalg::{Matrix, MatrixInverter, invert_with_ridge};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const VARIMAX_SWEEPS: usize = 30;
const VARIMAX_TOLERANCE: f64 = 1e-6;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    None,
    #[default]
    Varimax,
    Promax,
    /// Promax with power 2, a lighter oblique rotation.
    Oblimin,
}

impl Rotation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Varimax => "varimax",
            Self::Promax => "promax",
            Self::Oblimin => "oblimin",
        }
    }

    /// Target power for the oblique rotations.
    pub fn power(&self) -> Option<f64> {
        match self {
            Self::Promax => Some(4.0),
            Self::Oblimin => Some(2.0),
            Self::None | Self::Varimax => None,
        }
    }

    pub fn is_oblique(&self) -> bool {
        self.power().is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Varimax {
    pub loadings: Matrix,
    pub sweeps: usize,
    pub converged: bool,
}

pub fn varimax(loadings: &Matrix) -> Varimax {
    let (p, m) = loadings.shape();
    let mut x = loadings.clone();
    if m < 2 {
        return Varimax {
            loadings: x,
            sweeps: 0,
            converged: true,
        };
    }

    let h: Vec<f64> = (0..p)
        .map(|i| {
            let s = x.row(i).norm();
            if s > 0.0 { s } else { 1.0 }
        })
        .collect();
    for i in 0..p {
        for j in 0..m {
            x[(i, j)] /= h[i];
        }
    }

    let pf = p as f64;
    let mut sweeps = 0;
    let mut converged = false;
    while sweeps < VARIMAX_SWEEPS {
        sweeps += 1;
        let mut largest = 0.0f64;
        for a in 0..m {
            for b in (a + 1)..m {
                let (mut sa, mut sb, mut sc, mut sd) = (0.0, 0.0, 0.0, 0.0);
                for i in 0..p {
                    let (xa, xb) = (x[(i, a)], x[(i, b)]);
                    let u = xa * xa - xb * xb;
                    let v = 2.0 * xa * xb;
                    sa += u;
                    sb += v;
                    sc += u * u - v * v;
                    sd += 2.0 * u * v;
                }
                let num = sd - 2.0 * sa * sb / pf;
                let den = sc - (sa * sa - sb * sb) / pf;
                let phi = 0.25 * num.atan2(den);
                largest = largest.max(phi.abs());
                if phi.abs() < f64::EPSILON {
                    continue;
                }
                let (s, c) = phi.sin_cos();
                for i in 0..p {
                    let (xa, xb) = (x[(i, a)], x[(i, b)]);
                    x[(i, a)] = c * xa + s * xb;
                    x[(i, b)] = -s * xa + c * xb;
                }
            }
        }
        if largest < VARIMAX_TOLERANCE {
            converged = true;
            break;
        }
    }

    for i in 0..p {
        for j in 0..m {
            x[(i, j)] *= h[i];
        }
    }
    Varimax {
        loadings: x,
        sweeps,
        converged,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Oblique {
    /// Pattern matrix, variables × factors.
    pub pattern: Matrix,
    /// Factor correlations.
    pub phi: Matrix,
    pub ridged: bool,
}

fn inverse(inverter: &dyn MatrixInverter, m: &Matrix, what: &str) -> Result<(Matrix, bool), StatsError> {
    invert_with_ridge(inverter, m)
        .map(|r| (r.inverse, r.ridged))
        .map_err(|_| StatsError::unstable(format!("could not invert {what}")))
}

pub fn promax(
    varimax: &Matrix,
    power: f64,
    inverter: &dyn MatrixInverter,
) -> Result<Oblique, StatsError> {
    let (p, m) = varimax.shape();
    let mut target = Matrix::zeros(p, m);
    for i in 0..p {
        for j in 0..m {
            let l = varimax[(i, j)];
            target[(i, j)] = l * l.abs().powf(power - 1.0);
        }
    }

    let (xtx_inv, r1) = inverse(inverter, &varimax.tr_mul(varimax), "promax normal equations")?;
    let mut u = xtx_inv * varimax.tr_mul(&target);

    let (utu_inv, r2) = inverse(inverter, &u.tr_mul(&u), "promax transform")?;
    let scale: Vec<f64> = utu_inv.diagonal().iter().map(|d| d.max(0.0).sqrt()).collect();
    for i in 0..m {
        for j in 0..m {
            u[(i, j)] *= scale[j];
        }
    }

    let (phi, r3) = inverse(inverter, &u.tr_mul(&u), "factor correlation matrix")?;
    Ok(Oblique {
        pattern: varimax * &u,
        phi,
        ridged: r1 || r2 || r3,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{GaussJordan, from_rows};

    fn two_clusters() -> Matrix {
        // two blocks of variables loading on a 45°-rotated pair of axes
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let base = [[0.8, 0.0], [0.7, 0.0], [0.75, 0.0], [0.0, 0.8], [0.0, 0.7], [0.0, 0.75]];
        let rows: Vec<Vec<f64>> = base
            .iter()
            .map(|[a, b]| vec![s * (a - b), s * (a + b)])
            .collect();
        from_rows(&rows).unwrap()
    }

    #[test]
    fn varimax_recovers_simple_structure() {
        let v = varimax(&two_clusters());
        assert!(v.converged);
        for i in 0..6 {
            let (a, b) = (v.loadings[(i, 0)].abs(), v.loadings[(i, 1)].abs());
            assert!(a.min(b) < 1e-6, "row {i} not simple: {a} {b}");
        }
        // communalities are preserved by an orthogonal rotation
        let before = two_clusters();
        for i in 0..6 {
            let h0 = before.row(i).norm_squared();
            let h1 = v.loadings.row(i).norm_squared();
            assert!((h0 - h1).abs() < 1e-12);
        }
    }

    #[test]
    fn single_factor_is_left_alone() {
        let l = from_rows(&[vec![0.9], vec![0.5]]).unwrap();
        let v = varimax(&l);
        assert_eq!(v.sweeps, 0);
        assert_eq!(v.loadings, l);
    }

    #[test]
    fn promax_has_unit_factor_variances() {
        let mut l = varimax(&two_clusters()).loadings;
        // a little cross-loading so the factors correlate
        l[(0, 1)] += 0.2;
        l[(3, 0)] += 0.2;
        let o = promax(&l, 4.0, &GaussJordan::default()).unwrap();
        assert!((o.phi[(0, 0)] - 1.0).abs() < 1e-9);
        assert!((o.phi[(1, 1)] - 1.0).abs() < 1e-9);
        assert!(o.phi[(0, 1)].abs() < 1.0);
        assert!((o.phi[(0, 1)] - o.phi[(1, 0)]).abs() < 1e-9);
        assert!(Rotation::Promax.is_oblique() && !Rotation::Varimax.is_oblique());
    }
}
