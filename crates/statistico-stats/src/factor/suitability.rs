//! Sampling adequacy checks run before extraction.

use statistico_common::StatsError;

use crate::distributions::chi_square_sf;
use crate::linalg::{Matrix, MatrixInverter, invert_with_ridge};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAdequacy {
    pub variable: String,
    pub msa: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Suitability {
    /// Kaiser-Meyer-Olkin overall measure.
    pub kmo: f64,
    /// Kaiser's verbal scale for `kmo`.
    pub adequacy: String,
    pub variables: Vec<VariableAdequacy>,
    /// Determinant of the correlation matrix.
    pub determinant: f64,
    /// `None` when the determinant is not positive or `n` is too small for
    /// the Bartlett multiplier.
    pub bartlett_chi_square: Option<f64>,
    pub bartlett_df: usize,
    pub bartlett_p_value: Option<f64>,
    pub ridged: bool,
}

pub fn kmo_label(kmo: f64) -> &'static str {
    match kmo {
        k if k >= 0.9 => "marvelous",
        k if k >= 0.8 => "meritorious",
        k if k >= 0.7 => "middling",
        k if k >= 0.6 => "mediocre",
        k if k >= 0.5 => "miserable",
        _ => "unacceptable",
    }
}

/// Zero when there is no correlation at all to share.
fn adequacy_ratio(r2: f64, a2: f64) -> f64 {
    if r2 + a2 > 0.0 { r2 / (r2 + a2) } else { 0.0 }
}

/// `eigenvalues` are those of `r`; their product is the determinant.
pub fn assess(
    variables: &[String],
    r: &Matrix,
    eigenvalues: &[f64],
    n: usize,
    inverter: &dyn MatrixInverter,
) -> Result<Suitability, StatsError> {
    let p = r.nrows();
    let inv = invert_with_ridge(inverter, r)
        .map_err(|_| StatsError::unstable("could not invert correlation matrix"))?;
    let ri = &inv.inverse;

    let mut r2_total = 0.0;
    let mut a2_total = 0.0;
    let mut per_variable = Vec::with_capacity(p);
    for i in 0..p {
        let (mut r2, mut a2) = (0.0, 0.0);
        for j in 0..p {
            if i == j {
                continue;
            }
            let partial = -ri[(i, j)] / (ri[(i, i)] * ri[(j, j)]).sqrt();
            r2 += r[(i, j)] * r[(i, j)];
            a2 += partial * partial;
        }
        r2_total += r2;
        a2_total += a2;
        per_variable.push(VariableAdequacy {
            variable: variables[i].clone(),
            msa: adequacy_ratio(r2, a2),
        });
    }
    let kmo = StatsError::ensure_finite("KMO", adequacy_ratio(r2_total, a2_total))?;

    let determinant: f64 = eigenvalues.iter().product();
    let multiplier = n as f64 - 1.0 - (2.0 * p as f64 + 5.0) / 6.0;
    let bartlett_df = p * (p - 1) / 2;
    let bartlett_chi_square =
        (determinant > 0.0 && multiplier > 0.0).then(|| -multiplier * determinant.ln());
    let bartlett_p_value = bartlett_chi_square.map(|c| chi_square_sf(c, bartlett_df as f64));

    Ok(Suitability {
        kmo,
        adequacy: kmo_label(kmo).to_string(),
        variables: per_variable,
        determinant,
        bartlett_chi_square,
        bartlett_df,
        bartlett_p_value,
        ridged: inv.ridged,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::{GaussJordan, from_rows, jacobi_eigen};

    fn names(p: usize) -> Vec<String> {
        (0..p).map(|i| format!("v{i}")).collect()
    }

    #[test]
    fn equicorrelated_matrix() {
        // r = 0.5 everywhere off the diagonal, p = 3
        let r = from_rows(&[
            vec![1.0, 0.5, 0.5],
            vec![0.5, 1.0, 0.5],
            vec![0.5, 0.5, 1.0],
        ])
        .unwrap();
        let e = jacobi_eigen(&r, 1e-12, 50).unwrap();
        let s = assess(&names(3), &r, &e.values, 100, &GaussJordan::default()).unwrap();
        // det = (1 + 2r)(1 - r)^2 = 0.5
        assert!((s.determinant - 0.5).abs() < 1e-10);
        assert_eq!(s.bartlett_df, 3);
        let expected = -(99.0 - 11.0 / 6.0) * 0.5f64.ln();
        assert!((s.bartlett_chi_square.unwrap() - expected).abs() < 1e-8);
        assert!(s.bartlett_p_value.unwrap() < 1e-10);
        // partial correlation 1/3 against r = 1/2: KMO = 0.25 / (0.25 + 1/9)
        assert!((s.kmo - 0.25 / (0.25 + 1.0 / 9.0)).abs() < 1e-10);
        assert_eq!(s.adequacy, "mediocre");
        assert!(s.variables.iter().all(|v| (v.msa - s.kmo).abs() < 1e-10));
    }

    #[test]
    fn identity_has_no_sphericity_evidence() {
        let r = Matrix::identity(4, 4);
        let s = assess(&names(4), &r, &[1.0; 4], 3, &GaussJordan::default()).unwrap();
        assert_eq!(s.determinant, 1.0);
        // n too small for the multiplier
        assert!(s.bartlett_chi_square.is_none());
        assert_eq!(s.kmo, 0.0);
        assert_eq!(kmo_label(0.95), "marvelous");
        assert_eq!(kmo_label(0.3), "unacceptable");
    }
}
