//! Fixed- and random-effects meta-analysis.
//!
//! Each study row is reduced to an effect `y` and a sampling variance `v`
//! (Hedges' g, log odds ratio, or a supplied effect and standard error), then
//! pooled with inverse-variance weights. The random-effects model adds the
//! DerSimonian-Laird between-study variance `τ²` to every `v`.
//!
//! Notes:
//! - Rows that cannot produce a finite effect with positive variance are
//!   dropped and counted in `excluded_studies`; a 2×2 table with an empty
//!   margin is one of them.
//! - A 2×2 table with a zero cell (but no empty margin) gets 0.5 added to
//!   every cell.
//! - Both pooled models are always reported; `MetaSpec::model` selects which
//!   weights are attached to the studies.
//! - The Q p-value is the exact chi-square survival function on k − 1 degrees
//!   of freedom (regularized upper incomplete gamma), not a table lookup.

use statistico_common::{Dataset, StatsError};

use crate::distributions::{Normal, chi_square_sf, normal_inv};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const MIN_STUDIES: usize = 2;
const CONTINUITY_CORRECTION: f64 = 0.5;

/// Column roles for each effect type.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum EffectColumns {
    /// Two-group means, standard deviations and sizes; pooled as Hedges' g.
    Continuous {
        mean1: String,
        sd1: String,
        n1: String,
        mean2: String,
        sd2: String,
        n2: String,
    },
    /// 2×2 counts: `a`/`b` events/non-events in group 1, `c`/`d` in group 2.
    Binary {
        a: String,
        b: String,
        c: String,
        d: String,
    },
    Direct { effect: String, std_error: String },
}

impl Default for EffectColumns {
    fn default() -> Self {
        Self::Direct {
            effect: "effect".to_string(),
            std_error: "se".to_string(),
        }
    }
}

impl EffectColumns {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::Continuous { .. } => EffectKind::HedgesG,
            Self::Binary { .. } => EffectKind::LogOddsRatio,
            Self::Direct { .. } => EffectKind::Direct,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    HedgesG,
    LogOddsRatio,
    Direct,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetaModel {
    Fixed,
    #[default]
    Random,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct MetaSpec {
    pub effect: EffectColumns,
    /// Column holding study names.
    pub label: Option<String>,
    pub model: MetaModel,
    pub confidence_level: f64,
}

impl Default for MetaSpec {
    fn default() -> Self {
        Self {
            effect: EffectColumns::default(),
            label: None,
            model: MetaModel::Random,
            confidence_level: 0.95,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Study {
    /// Dataset row.
    pub row: usize,
    pub label: String,
    pub effect: f64,
    pub variance: f64,
    pub std_error: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    /// `exp(effect)` for log odds ratios.
    pub odds_ratio: Option<f64>,
    /// A 0.5 continuity correction was applied.
    pub corrected: bool,
    pub fixed_weight: f64,
    pub random_weight: f64,
    /// Weight under the selected model.
    pub weight: f64,
    pub weight_percent: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PooledEffect {
    pub model: MetaModel,
    pub estimate: f64,
    pub std_error: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub z: f64,
    pub p_value: f64,
    /// Natural-scale odds ratio and interval for binary effects.
    pub odds_ratio: Option<f64>,
    pub or_lower: Option<f64>,
    pub or_upper: Option<f64>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Heterogeneity {
    pub q: f64,
    pub df: usize,
    pub q_p_value: f64,
    /// Percent.
    pub i_squared: f64,
    pub h_squared: f64,
    pub tau_squared: f64,
    pub tau: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MetaBundle {
    pub effect: EffectKind,
    pub model: MetaModel,
    pub k: usize,
    pub studies: Vec<Study>,
    pub fixed: PooledEffect,
    pub random: PooledEffect,
    pub heterogeneity: Heterogeneity,
    pub excluded_studies: usize,
}

impl MetaBundle {
    /// Pooled effect under the selected model.
    pub fn pooled(&self) -> &PooledEffect {
        match self.model {
            MetaModel::Fixed => &self.fixed,
            MetaModel::Random => &self.random,
        }
    }
}

/* ═══════════════════════════════════════════════════════════════════════════
EFFECT SIZES
═══════════════════════════════════════════════════════════════════════════ */

/// `(g, variance)` or `None` when the inputs cannot define one.
pub fn hedges_g(
    mean1: f64,
    sd1: f64,
    n1: f64,
    mean2: f64,
    sd2: f64,
    n2: f64,
) -> Option<(f64, f64)> {
    if n1 < 2.0 || n2 < 2.0 || sd1 < 0.0 || sd2 < 0.0 {
        return None;
    }
    let df = n1 + n2 - 2.0;
    let pooled = (((n1 - 1.0) * sd1 * sd1 + (n2 - 1.0) * sd2 * sd2) / df).sqrt();
    if pooled.is_nan() || pooled <= 0.0 {
        return None;
    }
    let d = (mean1 - mean2) / pooled;
    let j = 1.0 - 3.0 / (4.0 * df - 1.0);
    let v = j * j * ((n1 + n2) / (n1 * n2) + d * d / (2.0 * (n1 + n2)));
    Some((j * d, v)).filter(|(g, v)| g.is_finite() && v.is_finite() && *v > 0.0)
}

/// `(log OR, variance, corrected)` from a 2×2 table.
pub fn log_odds_ratio(a: f64, b: f64, c: f64, d: f64) -> Option<(f64, f64, bool)> {
    if [a, b, c, d].iter().any(|x| *x < 0.0) {
        return None;
    }
    if a + b == 0.0 || c + d == 0.0 || a + c == 0.0 || b + d == 0.0 {
        return None;
    }
    let corrected = [a, b, c, d].contains(&0.0);
    let [a, b, c, d] = if corrected {
        [a, b, c, d].map(|x| x + CONTINUITY_CORRECTION)
    } else {
        [a, b, c, d]
    };
    let y = (a * d / (b * c)).ln();
    let v = 1.0 / a + 1.0 / b + 1.0 / c + 1.0 / d;
    Some((y, v, corrected)).filter(|(y, v, _)| y.is_finite() && v.is_finite())
}

/* ═══════════════════════════════════════════════════════════════════════════
POOLING
═══════════════════════════════════════════════════════════════════════════ */

struct Input {
    row: usize,
    label: String,
    y: f64,
    v: f64,
    corrected: bool,
}

fn read_studies(dataset: &Dataset, spec: &MetaSpec) -> Result<(Vec<Input>, usize), StatsError> {
    let numeric = |name: &String| -> Result<Vec<Option<f64>>, StatsError> {
        Ok(dataset.column(name)?.iter().map(|v| v.as_number()).collect())
    };
    let labels = spec
        .label
        .as_ref()
        .map(|l| dataset.column(l))
        .transpose()?;

    let names: Vec<&String> = match &spec.effect {
        EffectColumns::Continuous {
            mean1,
            sd1,
            n1,
            mean2,
            sd2,
            n2,
        } => vec![mean1, sd1, n1, mean2, sd2, n2],
        EffectColumns::Binary { a, b, c, d } => vec![a, b, c, d],
        EffectColumns::Direct { effect, std_error } => vec![effect, std_error],
    };
    let columns = names
        .into_iter()
        .map(numeric)
        .collect::<Result<Vec<_>, _>>()?;

    let mut studies = Vec::new();
    let mut excluded = 0;
    for row in 0..dataset.row_count() {
        let values: Option<Vec<f64>> = columns.iter().map(|c| c[row]).collect();
        let effect = values.and_then(|x| match spec.effect {
            EffectColumns::Continuous { .. } => {
                hedges_g(x[0], x[1], x[2], x[3], x[4], x[5]).map(|(y, v)| (y, v, false))
            }
            EffectColumns::Binary { .. } => log_odds_ratio(x[0], x[1], x[2], x[3]),
            EffectColumns::Direct { .. } => {
                let (y, se) = (x[0], x[1]);
                (se > 0.0).then_some((y, se * se, false))
            }
        });
        let Some((y, v, corrected)) = effect else {
            excluded += 1;
            continue;
        };
        let label = labels
            .and_then(|l| l[row].as_level())
            .unwrap_or_else(|| format!("Study {}", row + 1));
        studies.push(Input {
            row,
            label,
            y,
            v,
            corrected,
        });
    }
    Ok((studies, excluded))
}

fn pool(
    model: MetaModel,
    studies: &[Input],
    weights: &[f64],
    z_crit: f64,
    odds: bool,
) -> Result<PooledEffect, StatsError> {
    let total: f64 = weights.iter().sum();
    let estimate = studies.iter().zip(weights).map(|(s, w)| w * s.y).sum::<f64>() / total;
    let estimate = StatsError::ensure_finite("pooled effect", estimate)?;
    let std_error = (1.0 / total).sqrt();
    let (ci_lower, ci_upper) = (estimate - z_crit * std_error, estimate + z_crit * std_error);
    let z = estimate / std_error;
    Ok(PooledEffect {
        model,
        estimate,
        std_error,
        ci_lower,
        ci_upper,
        z,
        p_value: Normal::two_sided_p(z),
        odds_ratio: odds.then(|| estimate.exp()),
        or_lower: odds.then(|| ci_lower.exp()),
        or_upper: odds.then(|| ci_upper.exp()),
    })
}

/// DerSimonian-Laird heterogeneity from fixed-effect weights.
fn heterogeneity(studies: &[Input], fixed_weights: &[f64], fixed_estimate: f64) -> Heterogeneity {
    let k = studies.len();
    let df = k - 1;
    let q: f64 = studies
        .iter()
        .zip(fixed_weights)
        .map(|(s, w)| w * (s.y - fixed_estimate).powi(2))
        .sum();
    let sw: f64 = fixed_weights.iter().sum();
    let sw2: f64 = fixed_weights.iter().map(|w| w * w).sum();
    let c = sw - sw2 / sw;
    let dff = df as f64;
    let tau_squared = if c > 0.0 { ((q - dff) / c).max(0.0) } else { 0.0 };
    Heterogeneity {
        q,
        df,
        q_p_value: chi_square_sf(q, dff),
        i_squared: if q > 0.0 { (100.0 * (q - dff) / q).max(0.0) } else { 0.0 },
        h_squared: q / dff,
        tau_squared,
        tau: tau_squared.sqrt(),
    }
}

pub fn run_meta_analysis(dataset: &Dataset, spec: &MetaSpec) -> Result<MetaBundle, StatsError> {
    if !(spec.confidence_level > 0.0 && spec.confidence_level < 1.0) {
        return Err(StatsError::config(format!(
            "confidence level must lie strictly between 0 and 1, got {}",
            spec.confidence_level
        )));
    }
    #[cfg(feature = "tracing")]
    let _span = tracing::info_span!("meta_analysis", rows = dataset.row_count()).entered();

    let (inputs, excluded_studies) = read_studies(dataset, spec)?;
    let k = inputs.len();
    StatsError::ensure_min("meta-analysis", MIN_STUDIES, k)?;
    let kind = spec.effect.kind();
    let odds = kind == EffectKind::LogOddsRatio;
    let z_crit = normal_inv(0.5 + spec.confidence_level / 2.0)?;

    let fixed_weights: Vec<f64> = inputs.iter().map(|s| 1.0 / s.v).collect();
    let fixed = pool(MetaModel::Fixed, &inputs, &fixed_weights, z_crit, odds)?;
    let het = heterogeneity(&inputs, &fixed_weights, fixed.estimate);
    let random_weights: Vec<f64> = inputs.iter().map(|s| 1.0 / (s.v + het.tau_squared)).collect();
    let random = pool(MetaModel::Random, &inputs, &random_weights, z_crit, odds)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(k, excluded_studies, q = het.q, tau2 = het.tau_squared, "meta-analysis pooled");

    let selected = match spec.model {
        MetaModel::Fixed => &fixed_weights,
        MetaModel::Random => &random_weights,
    };
    let total: f64 = selected.iter().sum();
    let studies = inputs
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let se = s.v.sqrt();
            Study {
                row: s.row,
                label: s.label.clone(),
                effect: s.y,
                variance: s.v,
                std_error: se,
                ci_lower: s.y - z_crit * se,
                ci_upper: s.y + z_crit * se,
                odds_ratio: odds.then(|| s.y.exp()),
                corrected: s.corrected,
                fixed_weight: fixed_weights[i],
                random_weight: random_weights[i],
                weight: selected[i],
                weight_percent: 100.0 * selected[i] / total,
            }
        })
        .collect();

    Ok(MetaBundle {
        effect: kind,
        model: spec.model,
        k,
        studies,
        fixed,
        random,
        heterogeneity: het,
        excluded_studies,
    })
}
