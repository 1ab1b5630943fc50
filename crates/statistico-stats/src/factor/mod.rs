//! Principal-component factor analysis on the correlation matrix.
//!
//! [`run_factor_analysis`] takes listwise-complete numeric rows, extracts
//! loadings from the Jacobi eigendecomposition of the Pearson correlation
//! matrix, rotates them, and reports suitability, communalities, residual
//! fit and regression-style scores in one [`FactorBundle`].
//!
//! Notes:
//! - Without an explicit factor count, components with eigenvalue above 1
//!   are retained (at least one).
//! - Eigenvector columns are sign-aligned so each sums to a non-negative
//!   value. Loadings and scores are built from the aligned vectors, so they
//!   agree in sign; rotated loadings are aligned again after varimax.
//! - Communalities above 1 are counted as Heywood cases and reported as-is.

pub mod rotation;
pub mod suitability;

use rustc_hash::FxHashSet;
use statistico_common::{Dataset, StatsError};

use crate::linalg::{self, GaussJordan, Matrix, MatrixInverter, jacobi_eigen};

pub use rotation::{Oblique, Rotation, Varimax, promax, varimax};
pub use suitability::{Suitability, VariableAdequacy, assess, kmo_label};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const EIGEN_TOLERANCE: f64 = 1e-10;
pub const EIGEN_SWEEPS: usize = 80;
/// Off-diagonal reproduced-correlation residuals above this are counted.
pub const RESIDUAL_CUTOFF: f64 = 0.05;
const HEYWOOD_SLACK: f64 = 1e-9;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct FactorSpec {
    pub variables: Vec<String>,
    /// `None` applies the eigenvalue-above-one rule.
    pub factors: Option<usize>,
    pub rotation: Rotation,
    /// Cases for which scores are returned.
    pub max_scores: usize,
}

impl Default for FactorSpec {
    fn default() -> Self {
        Self {
            variables: Vec::new(),
            factors: None,
            rotation: Rotation::Varimax,
            max_scores: 60,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VarianceRow {
    /// 1-based component number.
    pub component: usize,
    pub eigenvalue: f64,
    pub percent: f64,
    pub cumulative_percent: f64,
    pub retained: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub eigenvalues: Vec<f64>,
    /// Column `j` is the unit eigenvector for `eigenvalues[j]`.
    pub eigenvectors: Vec<Vec<f64>>,
    pub variance: Vec<VarianceRow>,
    pub retained: usize,
    /// The retained count came from the eigenvalue rule.
    pub kaiser_rule: bool,
    /// Variables × retained factors.
    pub loadings: Vec<Vec<f64>>,
    pub sweeps: usize,
    pub converged: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RotationResult {
    pub method: Rotation,
    /// Pattern loadings, variables × factors. Equal to the structure for
    /// orthogonal rotations.
    pub loadings: Vec<Vec<f64>>,
    /// `P·Φ`, only for oblique rotations.
    pub structure: Option<Vec<Vec<f64>>>,
    pub factor_correlations: Option<Vec<Vec<f64>>>,
    /// Sum of squared loadings per factor (structure loadings when oblique).
    pub ss_loadings: Vec<f64>,
    pub sweeps: usize,
    pub converged: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Communality {
    pub variable: String,
    pub communality: f64,
    pub uniqueness: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FactorDiagnostics {
    pub heywood_cases: usize,
    /// Root mean square of off-diagonal residuals `R − LΦLᵀ`.
    pub residual_rmsr: f64,
    pub large_residuals: usize,
    pub warnings: Vec<String>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FactorScore {
    /// Dataset row.
    pub row: usize,
    pub scores: Vec<f64>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FactorBundle {
    pub variables: Vec<String>,
    pub n: usize,
    pub excluded_rows: usize,
    pub correlation: Vec<Vec<f64>>,
    pub suitability: Suitability,
    pub extraction: Extraction,
    pub rotation: RotationResult,
    pub communalities: Vec<Communality>,
    pub diagnostics: FactorDiagnostics,
    pub scores: Vec<FactorScore>,
}

/* ═══════════════════════════════════════════════════════════════════════════
STANDARDIZATION
═══════════════════════════════════════════════════════════════════════════ */

/// Column-standardized rows (sample standard deviation) and their Pearson
/// correlation matrix.
pub fn standardize(
    variables: &[String],
    rows: &[Vec<f64>],
) -> Result<(Vec<Vec<f64>>, Matrix), StatsError> {
    let p = variables.len();
    let n = rows.len();
    let nf = n as f64;
    let mut means = vec![0.0; p];
    for row in rows {
        for (m, v) in means.iter_mut().zip(row) {
            *m += v;
        }
    }
    for m in &mut means {
        *m /= nf;
    }
    let mut sds = vec![0.0; p];
    for row in rows {
        for j in 0..p {
            let d = row[j] - means[j];
            sds[j] += d * d;
        }
    }
    for (j, s) in sds.iter_mut().enumerate() {
        *s = (*s / (nf - 1.0)).sqrt();
        if !(s.is_finite() && *s > 0.0) {
            return Err(StatsError::unstable(format!(
                "variable '{}' has zero variance",
                variables[j]
            )));
        }
    }

    let z: Vec<Vec<f64>> = rows
        .iter()
        .map(|row| (0..p).map(|j| (row[j] - means[j]) / sds[j]).collect())
        .collect();
    let mut r = Matrix::identity(p, p);
    for a in 0..p {
        for b in (a + 1)..p {
            let s: f64 = z.iter().map(|zi| zi[a] * zi[b]).sum();
            let c = (s / (nf - 1.0)).clamp(-1.0, 1.0);
            r[(a, b)] = c;
            r[(b, a)] = c;
        }
    }
    Ok((z, r))
}

/// Flip columns that sum negative.
fn align_signs(m: &mut Matrix) {
    for mut col in m.column_iter_mut() {
        if col.sum() < 0.0 {
            col.neg_mut();
        }
    }
}

fn column_ss(m: &Matrix) -> Vec<f64> {
    m.column_iter().map(|c| c.norm_squared()).collect()
}

fn validate(spec: &FactorSpec) -> Result<(), StatsError> {
    if spec.variables.len() < 2 {
        return Err(StatsError::config(
            "factor analysis needs at least two variables",
        ));
    }
    let mut seen = FxHashSet::default();
    for v in &spec.variables {
        if !seen.insert(v.as_str()) {
            return Err(StatsError::config(format!("variable '{v}' selected twice")));
        }
    }
    match spec.factors {
        Some(0) => Err(StatsError::config("at least one factor must be extracted")),
        Some(m) if m > spec.variables.len() => Err(StatsError::config(format!(
            "requested {m} factors from only {} variables",
            spec.variables.len()
        ))),
        _ => Ok(()),
    }
}

/* ═══════════════════════════════════════════════════════════════════════════
ANALYSIS
═══════════════════════════════════════════════════════════════════════════ */

pub fn run_factor_analysis(dataset: &Dataset, spec: &FactorSpec) -> Result<FactorBundle, StatsError> {
    run_factor_analysis_with(dataset, spec, &GaussJordan::default())
}

pub fn run_factor_analysis_with(
    dataset: &Dataset,
    spec: &FactorSpec,
    inverter: &dyn MatrixInverter,
) -> Result<FactorBundle, StatsError> {
    validate(spec)?;
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!(
        "factor_analysis",
        variables = spec.variables.len(),
        rotation = spec.rotation.name()
    )
    .entered();

    let data = dataset.numeric_rows(&spec.variables)?;
    let p = spec.variables.len();
    let n = data.rows.len();
    StatsError::ensure_min("factor analysis", (p + 1).max(3), n)?;

    let (z, r) = standardize(&spec.variables, &data.rows)?;
    let mut eigen = jacobi_eigen(&r, EIGEN_TOLERANCE, EIGEN_SWEEPS)?;
    align_signs(&mut eigen.vectors);
    let mut warnings = Vec::new();
    if !eigen.converged {
        warnings.push(format!(
            "eigendecomposition stopped after {} sweeps without converging",
            eigen.sweeps
        ));
    }

    let suitability = assess(&spec.variables, &r, &eigen.values, n, inverter)?;
    if suitability.ridged {
        warnings.push("correlation matrix is singular; KMO uses a ridged inverse".to_string());
    }

    // Extraction
    let kaiser_rule = spec.factors.is_none();
    let m = spec
        .factors
        .unwrap_or_else(|| eigen.values.iter().filter(|v| **v > 1.0).count().max(1));
    let mut loadings = Matrix::zeros(p, m);
    for j in 0..m {
        let scale = eigen.values[j].max(0.0).sqrt();
        for i in 0..p {
            loadings[(i, j)] = eigen.vectors[(i, j)] * scale;
        }
    }

    let mut cumulative = 0.0;
    let variance = eigen
        .values
        .iter()
        .enumerate()
        .map(|(j, &ev)| {
            let percent = 100.0 * ev / p as f64;
            cumulative += percent;
            VarianceRow {
                component: j + 1,
                eigenvalue: ev,
                percent,
                cumulative_percent: cumulative,
                retained: j < m,
            }
        })
        .collect();

    // Rotation
    let mut rotated = loadings.clone();
    let mut phi: Option<Matrix> = None;
    let (mut sweeps, mut converged) = (0, true);
    if m < 2 && spec.rotation != Rotation::None {
        warnings.push(format!(
            "{} rotation needs at least two factors; loadings are unrotated",
            spec.rotation.name()
        ));
    } else if spec.rotation != Rotation::None {
        let v = varimax(&loadings);
        sweeps = v.sweeps;
        converged = v.converged;
        if !converged {
            warnings.push(format!("varimax did not converge in {sweeps} sweeps"));
        }
        rotated = v.loadings;
        align_signs(&mut rotated);
        if let Some(power) = spec.rotation.power() {
            let o = promax(&rotated, power, inverter)?;
            if o.ridged {
                warnings.push(format!("{} transform needed a ridge", spec.rotation.name()));
            }
            rotated = o.pattern;
            phi = Some(o.phi);
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(n, p, m, sweeps, converged, "factor extraction and rotation");

    let structure = phi.as_ref().map(|f| &rotated * f);
    let ss_loadings = column_ss(structure.as_ref().unwrap_or(&rotated));

    let communalities: Vec<Communality> = (0..p)
        .map(|i| {
            let row = rotated.row(i);
            let h = match &phi {
                Some(f) => (&row * f).dot(&row),
                None => row.norm_squared(),
            };
            Communality {
                variable: spec.variables[i].clone(),
                communality: h,
                uniqueness: 1.0 - h,
            }
        })
        .collect();
    let heywood_cases = communalities
        .iter()
        .filter(|c| c.communality > 1.0 + HEYWOOD_SLACK)
        .count();
    if heywood_cases > 0 {
        warnings.push(format!("{heywood_cases} variable(s) with communality above 1"));
    }

    // Residuals against R − LΦLᵀ.
    let reproduced = match &phi {
        Some(f) => &rotated * f * rotated.transpose(),
        None => &rotated * rotated.transpose(),
    };
    let (mut sum_sq, mut count, mut large) = (0.0, 0usize, 0usize);
    for a in 0..p {
        for b in (a + 1)..p {
            let res = r[(a, b)] - reproduced[(a, b)];
            sum_sq += res * res;
            count += 1;
            if res.abs() > RESIDUAL_CUTOFF {
                large += 1;
            }
        }
    }
    let residual_rmsr = (sum_sq / count as f64).sqrt();

    let scores = z
        .iter()
        .zip(&data.indices)
        .take(spec.max_scores)
        .map(|(zi, &row)| FactorScore {
            row,
            scores: (0..m)
                .map(|j| (0..p).map(|k| zi[k] * eigen.vectors[(k, j)]).sum())
                .collect(),
        })
        .collect();

    Ok(FactorBundle {
        variables: spec.variables.clone(),
        n,
        excluded_rows: data.excluded,
        correlation: linalg::to_rows(&r),
        suitability,
        extraction: Extraction {
            eigenvalues: eigen.values.clone(),
            eigenvectors: linalg::to_rows(&eigen.vectors),
            variance,
            retained: m,
            kaiser_rule,
            loadings: linalg::to_rows(&loadings),
            sweeps: eigen.sweeps,
            converged: eigen.converged,
        },
        rotation: RotationResult {
            method: spec.rotation,
            loadings: linalg::to_rows(&rotated),
            structure: structure.as_ref().map(linalg::to_rows),
            factor_correlations: phi.as_ref().map(linalg::to_rows),
            ss_loadings,
            sweeps,
            converged,
        },
        communalities,
        diagnostics: FactorDiagnostics {
            heywood_cases,
            residual_rmsr,
            large_residuals: large,
            warnings,
        },
        scores,
    })
}
