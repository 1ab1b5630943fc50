//! Per-observation influence diagnostics and separation checks.
//!
//! Notes:
//! - Leverage is the diagonal of the weighted hat matrix,
//!   `h_i = w_i · x_iᵀ (XᵀWX)⁻¹ x_i`.
//! - Cook's distance uses the Pearson residual: `r² h / (k (1 − h)²)`.
//! - DFBETA is the one-step approximation `(XᵀWX)⁻¹ x_i (y_i − μ_i) / (1 − h_i)`;
//!   only its largest absolute component is kept.
//! - Points are flagged influential above `4/n` (Cook) and high-leverage above
//!   `2k/n`.

use super::design::DesignMatrix;
use super::irls::{IrlsFit, MIN_WEIGHT};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Proportion of one class at which a level is reported as quasi-separated.
pub const QUASI_SEPARATION: f64 = 0.95;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationDiagnostics {
    /// Dataset row.
    pub row: usize,
    pub leverage: f64,
    pub pearson_residual: f64,
    pub deviance_residual: f64,
    pub cooks_distance: f64,
    pub max_abs_dfbeta: f64,
    pub influential: bool,
    pub high_leverage: bool,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct InfluenceSummary {
    pub observations: Vec<ObservationDiagnostics>,
    pub cooks_threshold: f64,
    pub leverage_threshold: f64,
    pub influential_count: usize,
    pub high_leverage_count: usize,
    pub max_cooks_distance: f64,
    pub max_abs_dfbeta: f64,
}

fn clamp_mu(mu: f64) -> f64 {
    mu.clamp(1e-15, 1.0 - 1e-15)
}

pub fn deviance_residual(y: f64, mu: f64) -> f64 {
    let mu = clamp_mu(mu);
    let contribution = if y >= 0.5 { -2.0 * mu.ln() } else { -2.0 * (1.0 - mu).ln() };
    (y - mu).signum() * contribution.max(0.0).sqrt()
}

pub fn pearson_residual(y: f64, mu: f64) -> f64 {
    (y - mu) / (mu * (1.0 - mu)).max(MIN_WEIGHT).sqrt()
}

pub fn influence(design: &DesignMatrix, fit: &IrlsFit) -> InfluenceSummary {
    let n = design.n();
    let k = design.k();
    let cooks_threshold = 4.0 / n as f64;
    let leverage_threshold = 2.0 * k as f64 / n as f64;
    let cov = &fit.covariance;

    let observations: Vec<ObservationDiagnostics> = (0..n)
        .map(|i| {
            let xi = design.x.row(i).transpose();
            let y = design.y[i];
            let mu = fit.mu[i];
            let cx = cov * &xi;
            let h = (fit.weights[i] * xi.dot(&cx)).clamp(0.0, 1.0);
            let one_minus_h = (1.0 - h).max(1e-12);
            let pearson = pearson_residual(y, mu);
            let cooks = pearson * pearson * h / (k as f64 * one_minus_h * one_minus_h);
            let max_abs_dfbeta = cx
                .iter()
                .map(|c| (c * (y - mu) / one_minus_h).abs())
                .fold(0.0, f64::max);
            ObservationDiagnostics {
                row: design.rows[i],
                leverage: h,
                pearson_residual: pearson,
                deviance_residual: deviance_residual(y, mu),
                cooks_distance: cooks,
                max_abs_dfbeta,
                influential: cooks > cooks_threshold,
                high_leverage: h > leverage_threshold,
            }
        })
        .collect();

    InfluenceSummary {
        cooks_threshold,
        leverage_threshold,
        influential_count: observations.iter().filter(|o| o.influential).count(),
        high_leverage_count: observations.iter().filter(|o| o.high_leverage).count(),
        max_cooks_distance: observations.iter().map(|o| o.cooks_distance).fold(0.0, f64::max),
        max_abs_dfbeta: observations.iter().map(|o| o.max_abs_dfbeta).fold(0.0, f64::max),
        observations,
    }
}

/* ═══════════════════════════════════════════════════════════════════════════
SEPARATION
═══════════════════════════════════════════════════════════════════════════ */

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparationKind {
    /// A level (or a threshold on a numeric predictor) splits the outcome
    /// perfectly.
    Complete,
    /// At least 95% of a level falls in one class.
    Quasi,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SeparationWarning {
    pub variable: String,
    /// `None` for a numeric predictor.
    pub level: Option<String>,
    pub kind: SeparationKind,
    pub count: usize,
    pub events: usize,
}

impl SeparationWarning {
    pub fn message(&self) -> String {
        let what = match &self.level {
            Some(l) => format!("{} = {}", self.variable, l),
            None => self.variable.clone(),
        };
        match self.kind {
            SeparationKind::Complete => format!(
                "complete separation on {what} ({} of {} events); estimates may be unreliable",
                self.events, self.count
            ),
            SeparationKind::Quasi => format!(
                "quasi-complete separation on {what} ({} of {} events)",
                self.events, self.count
            ),
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRate {
    pub variable: String,
    pub level: String,
    pub reference: bool,
    pub count: usize,
    pub events: usize,
    pub event_rate: f64,
}

/// Event counts per level of every categorical predictor, reference first.
pub fn level_event_rates(design: &DesignMatrix) -> Vec<LevelRate> {
    let mut out = Vec::new();
    for term in &design.categorical {
        let all = std::iter::once(&term.reference).chain(&term.levels);
        for level in all {
            let (count, events) = term
                .values
                .iter()
                .zip(&design.y)
                .filter(|(v, _)| *v == level)
                .fold((0, 0), |(c, e), (_, y)| (c + 1, e + usize::from(*y >= 0.5)));
            if count == 0 {
                continue;
            }
            out.push(LevelRate {
                variable: term.variable.clone(),
                level: level.clone(),
                reference: level == &term.reference,
                count,
                events,
                event_rate: events as f64 / count as f64,
            });
        }
    }
    out
}

pub fn separation_warnings(design: &DesignMatrix, levels: &[LevelRate]) -> Vec<SeparationWarning> {
    let mut out: Vec<SeparationWarning> = levels
        .iter()
        .filter_map(|l| {
            let kind = if l.events == 0 || l.events == l.count {
                SeparationKind::Complete
            } else if l.event_rate >= QUASI_SEPARATION || l.event_rate <= 1.0 - QUASI_SEPARATION {
                SeparationKind::Quasi
            } else {
                return None;
            };
            Some(SeparationWarning {
                variable: l.variable.clone(),
                level: Some(l.level.clone()),
                kind,
                count: l.count,
                events: l.events,
            })
        })
        .collect();

    // A numeric predictor separates when the class ranges do not overlap.
    let offset = usize::from(design.intercept);
    for (j, name) in design.numeric.iter().enumerate() {
        let col = design.x.column(j + offset);
        let (mut lo1, mut hi1, mut lo0, mut hi0) = (
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        );
        for (v, y) in col.iter().zip(&design.y) {
            if *y >= 0.5 {
                lo1 = lo1.min(*v);
                hi1 = hi1.max(*v);
            } else {
                lo0 = lo0.min(*v);
                hi0 = hi0.max(*v);
            }
        }
        if hi0 < lo1 || hi1 < lo0 {
            let events = design.y.iter().filter(|y| **y >= 0.5).count();
            out.push(SeparationWarning {
                variable: name.clone(),
                level: None,
                kind: SeparationKind::Complete,
                count: design.n(),
                events,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residual_signs_follow_outcome() {
        assert!(deviance_residual(1.0, 0.3) > 0.0);
        assert!(deviance_residual(0.0, 0.3) < 0.0);
        // y = 1, mu = 0.5: sqrt(2 ln 2)
        assert!((deviance_residual(1.0, 0.5) - (2.0 * 2f64.ln()).sqrt()).abs() < 1e-12);
        assert!((pearson_residual(1.0, 0.5) - 1.0).abs() < 1e-12);
        assert!(deviance_residual(1.0, 1.0).is_finite());
    }

    #[test]
    fn separation_message_names_level() {
        let w = SeparationWarning {
            variable: "region".into(),
            level: Some("north".into()),
            kind: SeparationKind::Complete,
            count: 4,
            events: 4,
        };
        assert!(w.message().contains("region = north"));
    }
}
