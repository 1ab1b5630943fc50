//! Dense linear algebra for the small p×p systems the regression and factor
//! engines solve (p is the number of predictors or variables, well under 100).
//!
//! Storage and products are `nalgebra` dynamic matrices. Inversion sits
//! behind [`MatrixInverter`]: [`GaussJordan`] is the default and
//! [`CholeskyInverter`] is a drop-in for symmetric positive definite input.
//! The symmetric eigendecomposition is the cyclic Jacobi sweep, run directly
//! on the matrix storage.

use std::fmt;

use nalgebra::{DMatrix, DVector};
use statistico_common::StatsError;

pub type Matrix = DMatrix<f64>;
pub type Vector = DVector<f64>;

/// Build from row vectors; every row must have the same length.
pub fn from_rows(rows: &[Vec<f64>]) -> Result<Matrix, StatsError> {
    let cols = rows.first().map(|r| r.len()).unwrap_or(0);
    if let Some((i, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != cols) {
        return Err(StatsError::config(format!(
            "row {i} has {} entries, expected {cols}",
            r.len()
        )));
    }
    Ok(Matrix::from_row_iterator(
        rows.len(),
        cols,
        rows.iter().flat_map(|r| r.iter().copied()),
    ))
}

/// Row-major copy for result records.
pub fn to_rows(m: &Matrix) -> Vec<Vec<f64>> {
    m.row_iter().map(|r| r.iter().copied().collect()).collect()
}

pub fn is_finite(m: &Matrix) -> bool {
    m.iter().all(|v| v.is_finite())
}

pub fn max_abs_off_diagonal(m: &Matrix) -> f64 {
    let mut max = 0.0f64;
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            if i != j {
                max = max.max(m[(i, j)].abs());
            }
        }
    }
    max
}

/* ═══════════════════════════════════════════════════════════════════════════
INVERSION
═══════════════════════════════════════════════════════════════════════════ */

/// The matrix could not be inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingularMatrix;

impl fmt::Display for SingularMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("matrix is singular")
    }
}

impl std::error::Error for SingularMatrix {}

pub trait MatrixInverter {
    fn invert(&self, m: &Matrix) -> Result<Matrix, SingularMatrix>;
}

/// Gauss-Jordan elimination with partial pivoting.
#[derive(Debug, Clone, Copy)]
pub struct GaussJordan {
    /// Pivots with magnitude below this (relative to the largest diagonal
    /// entry) are treated as zero.
    pub pivot_tolerance: f64,
}

impl Default for GaussJordan {
    fn default() -> Self {
        Self {
            pivot_tolerance: 1e-12,
        }
    }
}

impl MatrixInverter for GaussJordan {
    fn invert(&self, m: &Matrix) -> Result<Matrix, SingularMatrix> {
        if !m.is_square() || !is_finite(m) {
            return Err(SingularMatrix);
        }
        let n = m.nrows();
        let scale = m.diagonal().amax().max(1.0);
        let mut a = m.clone();
        let mut inv = Matrix::identity(n, n);

        for col in 0..n {
            let (offset, pivot_abs) = a
                .view_range(col.., col)
                .iter()
                .map(|v| v.abs())
                .enumerate()
                .fold((0, f64::NEG_INFINITY), |best, (i, v)| {
                    if v > best.1 { (i, v) } else { best }
                });
            if pivot_abs <= self.pivot_tolerance * scale {
                return Err(SingularMatrix);
            }
            if offset != 0 {
                a.swap_rows(col, col + offset);
                inv.swap_rows(col, col + offset);
            }
            let pivot = a[(col, col)];
            for j in 0..n {
                a[(col, j)] /= pivot;
                inv[(col, j)] /= pivot;
            }
            for r in 0..n {
                let factor = a[(r, col)];
                if r == col || factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a[(r, j)] -= factor * a[(col, j)];
                    inv[(r, j)] -= factor * inv[(col, j)];
                }
            }
        }

        if is_finite(&inv) {
            Ok(inv)
        } else {
            Err(SingularMatrix)
        }
    }
}

/// Inverse through the Cholesky factor; fails unless the input is
/// symmetric positive definite.
#[derive(Debug, Clone, Copy, Default)]
pub struct CholeskyInverter;

impl MatrixInverter for CholeskyInverter {
    fn invert(&self, m: &Matrix) -> Result<Matrix, SingularMatrix> {
        if !m.is_square() || !is_finite(m) {
            return Err(SingularMatrix);
        }
        let inv = nalgebra::Cholesky::new(m.clone())
            .ok_or(SingularMatrix)?
            .inverse();
        if is_finite(&inv) {
            Ok(inv)
        } else {
            Err(SingularMatrix)
        }
    }
}

/// Ridge added to the diagonal when the first inversion attempt fails.
pub const RIDGE: f64 = 1e-6;

/// Whether the inverse needed the ridge fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeInverse {
    pub inverse: Matrix,
    pub ridged: bool,
}

/// Invert, retrying once with [`RIDGE`] on the diagonal.
pub fn invert_with_ridge(
    inverter: &dyn MatrixInverter,
    m: &Matrix,
) -> Result<RidgeInverse, SingularMatrix> {
    match inverter.invert(m) {
        Ok(inverse) => Ok(RidgeInverse {
            inverse,
            ridged: false,
        }),
        Err(SingularMatrix) => {
            let ridged = m + Matrix::identity(m.nrows(), m.ncols()) * RIDGE;
            inverter.invert(&ridged).map(|inverse| RidgeInverse {
                inverse,
                ridged: true,
            })
        }
    }
}

/* ═══════════════════════════════════════════════════════════════════════════
SYMMETRIC EIGENDECOMPOSITION
═══════════════════════════════════════════════════════════════════════════ */

#[derive(Debug, Clone, PartialEq)]
pub struct Eigen {
    /// Sorted descending.
    pub values: Vec<f64>,
    /// Column `j` is the unit eigenvector for `values[j]`.
    pub vectors: Matrix,
    pub sweeps: usize,
    pub converged: bool,
}

/// Apply the plane rotation `(c, s)` to columns `p` and `q` of `m`.
fn rotate_columns(m: &mut Matrix, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.nrows() {
        let (mp, mq) = (m[(k, p)], m[(k, q)]);
        m[(k, p)] = c * mp - s * mq;
        m[(k, q)] = s * mp + c * mq;
    }
}

/// Apply the transposed rotation to rows `p` and `q` of `m`.
fn rotate_rows(m: &mut Matrix, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..m.ncols() {
        let (mp, mq) = (m[(p, k)], m[(q, k)]);
        m[(p, k)] = c * mp - s * mq;
        m[(q, k)] = s * mp + c * mq;
    }
}

/// Cyclic Jacobi rotation. Sweeps until the largest off-diagonal element is
/// below `tolerance` or `max_sweeps` is reached.
pub fn jacobi_eigen(m: &Matrix, tolerance: f64, max_sweeps: usize) -> Result<Eigen, StatsError> {
    if !m.is_square() {
        return Err(StatsError::config("eigendecomposition needs a square matrix"));
    }
    if !is_finite(m) {
        return Err(StatsError::unstable("matrix contains non-finite entries"));
    }
    let n = m.nrows();
    let mut a = m.clone();
    let mut v = Matrix::identity(n, n);
    let mut sweeps = 0;
    let mut converged = max_abs_off_diagonal(&a) < tolerance;

    while !converged && sweeps < max_sweeps {
        sweeps += 1;
        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[(p, q)];
                if apq.abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[(q, q)] - a[(p, p)]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                // A ← JᵀAJ, V ← VJ
                rotate_columns(&mut a, p, q, c, s);
                rotate_rows(&mut a, p, q, c, s);
                rotate_columns(&mut v, p, q, c, s);
            }
        }
        converged = max_abs_off_diagonal(&a) < tolerance;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| a[(j, j)].total_cmp(&a[(i, i)]));
    let values: Vec<f64> = order.iter().map(|&i| a[(i, i)]).collect();
    let vectors = v.select_columns(order.iter());

    Ok(Eigen {
        values,
        vectors,
        sweeps,
        converged,
    })
}
