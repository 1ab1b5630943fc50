//! Iteratively reweighted least squares for the logit link.

use statistico_common::StatsError;

use crate::linalg::{Matrix, MatrixInverter, Vector, invert_with_ridge};

/// Floor on the working weight `μ(1 − μ)`.
pub const MIN_WEIGHT: f64 = 1e-8;
const ETA_LIMIT: f64 = 35.0;

#[inline]
pub fn sigmoid(eta: f64) -> f64 {
    1.0 / (1.0 + (-eta.clamp(-ETA_LIMIT, ETA_LIMIT)).exp())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrlsOptions {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for IrlsOptions {
    fn default() -> Self {
        Self {
            max_iterations: 60,
            tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IrlsFit {
    pub beta: Vec<f64>,
    /// Inverse information `(XᵀWX)⁻¹` at the final coefficients.
    pub covariance: Matrix,
    /// Fitted probabilities.
    pub mu: Vec<f64>,
    /// Working weights `max(μ(1 − μ), MIN_WEIGHT)`.
    pub weights: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
    /// Largest coefficient change in the last iteration.
    pub last_delta: f64,
    /// Some inversion needed the diagonal ridge.
    pub ridged: bool,
}

/// `XᵀWX` for diagonal `W`.
pub fn weighted_gram(x: &Matrix, w: &[f64]) -> Matrix {
    let wx = Matrix::from_fn(x.nrows(), x.ncols(), |i, j| w[i] * x[(i, j)]);
    let g = x.tr_mul(&wx);
    (&g + g.transpose()) * 0.5
}

fn mean_and_weights(x: &Matrix, beta: &Vector) -> (Vector, Vec<f64>, Vec<f64>) {
    let eta = x * beta;
    let mu: Vec<f64> = eta.iter().map(|e| sigmoid(*e)).collect();
    let w = mu.iter().map(|m| (m * (1.0 - m)).max(MIN_WEIGHT)).collect();
    (eta, mu, w)
}

fn information_inverse(
    inverter: &dyn MatrixInverter,
    info: &Matrix,
) -> Result<(Matrix, bool), StatsError> {
    let r = invert_with_ridge(inverter, info)
        .map_err(|_| StatsError::unstable("could not invert information matrix"))?;
    #[cfg(feature = "tracing")]
    if r.ridged {
        tracing::debug!("information matrix singular, ridge applied");
    }
    Ok((r.inverse, r.ridged))
}

pub fn fit_irls(
    x: &Matrix,
    y: &[f64],
    options: IrlsOptions,
    inverter: &dyn MatrixInverter,
) -> Result<IrlsFit, StatsError> {
    let mut beta = Vector::zeros(x.ncols());
    let mut iterations = 0;
    let mut converged = false;
    let mut last_delta = f64::INFINITY;
    let mut ridged = false;

    while iterations < options.max_iterations {
        iterations += 1;
        let (eta, mu, w) = mean_and_weights(x, &beta);
        let wz = Vector::from_fn(y.len(), |i, _| w[i] * (eta[i] + (y[i] - mu[i]) / w[i]));
        let (inv, r) = information_inverse(inverter, &weighted_gram(x, &w))?;
        ridged |= r;
        let next = inv * x.tr_mul(&wz);
        if next.iter().any(|b| !b.is_finite()) {
            return Err(StatsError::unstable("IRLS produced non-finite coefficients"));
        }
        last_delta = (&next - &beta).amax();
        beta = next;
        if last_delta < options.tolerance {
            converged = true;
            break;
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(iterations, converged, last_delta, "irls finished");

    let (_, mu, weights) = mean_and_weights(x, &beta);
    let (covariance, r) = information_inverse(inverter, &weighted_gram(x, &weights))?;
    Ok(IrlsFit {
        beta: beta.iter().copied().collect(),
        covariance,
        mu,
        weights,
        iterations,
        converged,
        last_delta,
        ridged: ridged || r,
    })
}
