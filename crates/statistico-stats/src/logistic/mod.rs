//! Binary logistic regression.
//!
//! [`fit_logistic_regression`] builds the design matrix from a [`Dataset`],
//! fits by IRLS, and assembles a [`FitBundle`] with Wald inference, model fit
//! statistics, threshold and ranking metrics, influence diagnostics and
//! separation warnings.
//!
//! Notes:
//! - At least [`MIN_LOGISTIC_N`] complete rows and both outcome classes are
//!   required.
//! - Hitting the iteration cap is a warning, not an error.
//! - The likelihood-ratio test has `k − 1` degrees of freedom with an
//!   intercept and `k` without one.

pub mod design;
pub mod diagnostics;
pub mod irls;
pub mod metrics;

use statistico_common::{Dataset, StatsError};

use crate::descriptive::{mean, sample_std_dev};
use crate::distributions::{Normal, chi_square_sf, normal_inv};
use crate::linalg::{self, GaussJordan, MatrixInverter, RIDGE, Vector};

pub use design::{DesignMatrix, INTERCEPT, build_design};
pub use diagnostics::{
    InfluenceSummary, LevelRate, ObservationDiagnostics, SeparationKind, SeparationWarning,
};
pub use irls::{IrlsFit, IrlsOptions, fit_irls, sigmoid};
pub use metrics::{
    ClassificationMetrics, ConfusionMatrix, DecileRow, RankingMetrics, auc, classification_metrics,
    ks_statistic, ranking_metrics,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MIN_LOGISTIC_N: usize = 10;
pub const DEFAULT_THRESHOLD: f64 = 0.5;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticSpec {
    pub dependent: String,
    pub numeric_predictors: Vec<String>,
    pub categorical_predictors: Vec<String>,
    pub intercept: bool,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Level for coefficient and odds-ratio intervals.
    pub confidence_level: f64,
}

impl Default for LogisticSpec {
    fn default() -> Self {
        Self {
            dependent: String::new(),
            numeric_predictors: Vec::new(),
            categorical_predictors: Vec::new(),
            intercept: true,
            max_iterations: 60,
            tolerance: 1e-6,
            confidence_level: 0.95,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: f64,
    pub z: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub odds_ratio: f64,
    pub or_lower: f64,
    pub or_upper: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFit {
    pub n: usize,
    /// Estimated parameters, intercept included.
    pub k: usize,
    pub log_likelihood: f64,
    pub null_log_likelihood: f64,
    pub minus_two_log_likelihood: f64,
    pub deviance: f64,
    pub null_deviance: f64,
    pub aic: f64,
    pub bic: f64,
    pub mcfadden_r2: f64,
    pub cox_snell_r2: f64,
    pub nagelkerke_r2: f64,
    pub lr_chi_square: f64,
    pub lr_df: usize,
    /// `None` when the model has no slope terms.
    pub lr_p_value: Option<f64>,
    pub iterations: usize,
    pub converged: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Dataset row.
    pub row: usize,
    pub observed: bool,
    pub linear_predictor: f64,
    pub probability: f64,
    pub predicted: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorSummary {
    pub name: String,
    pub mean: f64,
    pub std_dev: Option<f64>,
    pub mean_events: Option<f64>,
    pub mean_non_events: Option<f64>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticDescriptives {
    pub events: usize,
    pub non_events: usize,
    pub event_rate: f64,
    pub predictors: Vec<PredictorSummary>,
    pub levels: Vec<LevelRate>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct FitBundle {
    pub dependent: String,
    pub coefficients: Vec<Coefficient>,
    /// Coefficient covariance, rows and columns in coefficient order.
    pub covariance: Vec<Vec<f64>>,
    pub fit: ModelFit,
    pub predictions: Vec<Prediction>,
    pub classification: ClassificationMetrics,
    pub ranking: RankingMetrics,
    pub diagnostics: InfluenceSummary,
    pub separation: Vec<SeparationWarning>,
    pub descriptives: LogisticDescriptives,
    pub excluded_rows: usize,
    pub warnings: Vec<String>,
}

impl FitBundle {
    /// Re-score the existing fit at a new threshold.
    pub fn reclassify(&mut self, threshold: f64) -> Result<(), StatsError> {
        metrics::check_threshold(threshold)?;
        let y: Vec<f64> = self
            .predictions
            .iter()
            .map(|p| if p.observed { 1.0 } else { 0.0 })
            .collect();
        let prob: Vec<f64> = self.predictions.iter().map(|p| p.probability).collect();
        for p in &mut self.predictions {
            p.predicted = p.probability >= threshold;
        }
        self.classification = classification_metrics(&y, &prob, threshold);
        Ok(())
    }

    pub fn coefficient(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }
}

fn validate(spec: &LogisticSpec, threshold: f64) -> Result<(), StatsError> {
    metrics::check_threshold(threshold)?;
    if !(spec.confidence_level > 0.0 && spec.confidence_level < 1.0) {
        return Err(StatsError::config(format!(
            "confidence level must lie strictly between 0 and 1, got {}",
            spec.confidence_level
        )));
    }
    if spec.max_iterations == 0 {
        return Err(StatsError::config("IRLS needs at least one iteration"));
    }
    if !(spec.tolerance.is_finite() && spec.tolerance > 0.0) {
        return Err(StatsError::config("IRLS tolerance must be positive"));
    }
    Ok(())
}

fn log_likelihood(y: &[f64], mu: &[f64]) -> f64 {
    y.iter()
        .zip(mu)
        .map(|(y, m)| {
            let m = m.clamp(1e-15, 1.0 - 1e-15);
            y * m.ln() + (1.0 - y) * (1.0 - m).ln()
        })
        .sum()
}

fn null_log_likelihood(y: &[f64], intercept: bool) -> f64 {
    let n = y.len() as f64;
    if !intercept {
        return n * 0.5f64.ln();
    }
    let p = y.iter().sum::<f64>() / n;
    n * (p * p.ln() + (1.0 - p) * (1.0 - p).ln())
}

fn predictor_summaries(design: &DesignMatrix) -> Result<Vec<PredictorSummary>, StatsError> {
    let offset = usize::from(design.intercept);
    design
        .numeric
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let col: Vec<f64> = design.x.column(j + offset).iter().copied().collect();
            let split = |event: bool| -> Vec<f64> {
                col.iter()
                    .zip(&design.y)
                    .filter(|(_, y)| (**y >= 0.5) == event)
                    .map(|(v, _)| *v)
                    .collect()
            };
            Ok(PredictorSummary {
                name: name.clone(),
                mean: mean(&col)?,
                std_dev: sample_std_dev(&col).ok(),
                mean_events: mean(&split(true)).ok(),
                mean_non_events: mean(&split(false)).ok(),
            })
        })
        .collect()
}

pub fn fit_logistic_regression(
    dataset: &Dataset,
    spec: &LogisticSpec,
    threshold: f64,
) -> Result<FitBundle, StatsError> {
    fit_logistic_regression_with(dataset, spec, threshold, &GaussJordan::default())
}

/// As [`fit_logistic_regression`] with a caller-supplied matrix inverter.
pub fn fit_logistic_regression_with(
    dataset: &Dataset,
    spec: &LogisticSpec,
    threshold: f64,
    inverter: &dyn MatrixInverter,
) -> Result<FitBundle, StatsError> {
    validate(spec, threshold)?;
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("logistic_fit", dependent = %spec.dependent).entered();

    let design = build_design(dataset, spec)?;
    let n = design.n();
    let k = design.k();
    StatsError::ensure_min("logistic regression", MIN_LOGISTIC_N.max(k + 1), n)?;
    let events = design.y.iter().filter(|y| **y >= 0.5).count();
    if events == 0 || events == n {
        return Err(StatsError::insufficient(
            format!("logistic regression on '{}' needs both outcome classes", spec.dependent),
            2,
            1,
        ));
    }

    let fit = fit_irls(
        &design.x,
        &design.y,
        IrlsOptions {
            max_iterations: spec.max_iterations,
            tolerance: spec.tolerance,
        },
        inverter,
    )?;

    let mut warnings = Vec::new();
    if !fit.converged {
        warnings.push(format!(
            "IRLS did not converge after {} iterations (last change {:.3e})",
            fit.iterations, fit.last_delta
        ));
    }
    if fit.ridged {
        warnings.push(format!(
            "information matrix was singular; a ridge of {RIDGE:e} was added to its diagonal"
        ));
    }

    // Inference
    let z_crit = normal_inv(0.5 + spec.confidence_level / 2.0)?;
    let coefficients = design
        .names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let estimate = fit.beta[j];
            let variance = fit.covariance[(j, j)];
            if !(variance.is_finite() && variance > 0.0) {
                return Err(StatsError::unstable(format!(
                    "non-positive variance for coefficient '{name}'"
                )));
            }
            let std_error = variance.sqrt();
            let z = estimate / std_error;
            let (ci_lower, ci_upper) = (estimate - z_crit * std_error, estimate + z_crit * std_error);
            Ok(Coefficient {
                name: name.clone(),
                estimate,
                std_error,
                z,
                p_value: Normal::two_sided_p(z),
                ci_lower,
                ci_upper,
                odds_ratio: estimate.exp(),
                or_lower: ci_lower.exp(),
                or_upper: ci_upper.exp(),
            })
        })
        .collect::<Result<Vec<_>, StatsError>>()?;

    // Model fit
    let nf = n as f64;
    let kf = k as f64;
    let ll = log_likelihood(&design.y, &fit.mu);
    let ll0 = null_log_likelihood(&design.y, design.intercept);
    let lr_df = k - usize::from(design.intercept);
    let lr = (2.0 * (ll - ll0)).max(0.0);
    let cox_snell = 1.0 - (2.0 * (ll0 - ll) / nf).exp();
    let max_cox_snell = 1.0 - (2.0 * ll0 / nf).exp();
    let model_fit = ModelFit {
        n,
        k,
        log_likelihood: ll,
        null_log_likelihood: ll0,
        minus_two_log_likelihood: -2.0 * ll,
        deviance: -2.0 * ll,
        null_deviance: -2.0 * ll0,
        aic: 2.0 * kf - 2.0 * ll,
        bic: nf.ln() * kf - 2.0 * ll,
        mcfadden_r2: 1.0 - ll / ll0,
        cox_snell_r2: cox_snell,
        nagelkerke_r2: if max_cox_snell > 0.0 { cox_snell / max_cox_snell } else { 0.0 },
        lr_chi_square: lr,
        lr_df,
        lr_p_value: (lr_df > 0).then(|| chi_square_sf(lr, lr_df as f64)),
        iterations: fit.iterations,
        converged: fit.converged,
    };

    let eta = &design.x * Vector::from_column_slice(&fit.beta);
    let predictions = (0..n)
        .map(|i| Prediction {
            row: design.rows[i],
            observed: design.y[i] >= 0.5,
            linear_predictor: eta[i],
            probability: fit.mu[i],
            predicted: fit.mu[i] >= threshold,
        })
        .collect();

    let classification = classification_metrics(&design.y, &fit.mu, threshold);
    let ranking = ranking_metrics(&design.y, &fit.mu)?;
    let diagnostics = diagnostics::influence(&design, &fit);
    let levels = diagnostics::level_event_rates(&design);
    let separation = diagnostics::separation_warnings(&design, &levels);
    warnings.extend(separation.iter().map(SeparationWarning::message));

    let descriptives = LogisticDescriptives {
        events,
        non_events: n - events,
        event_rate: events as f64 / nf,
        predictors: predictor_summaries(&design)?,
        levels,
    };

    #[cfg(feature = "tracing")]
    tracing::debug!(
        n,
        k,
        excluded = design.excluded,
        auc = ranking.auc,
        warnings = warnings.len(),
        "logistic fit assembled"
    );

    Ok(FitBundle {
        dependent: spec.dependent.clone(),
        coefficients,
        covariance: linalg::to_rows(&fit.covariance),
        fit: model_fit,
        predictions,
        classification,
        ranking,
        diagnostics,
        separation,
        descriptives,
        excluded_rows: design.excluded,
        warnings,
    })
}
