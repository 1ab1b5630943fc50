//! Classification and ranking metrics for fitted probabilities.
//!
//! Classification metrics depend on a threshold (predict positive iff
//! `p >= threshold`); ranking metrics (AUC, Gini, KS, deciles) do not.

use statistico_common::StatsError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationMetrics {
    pub threshold: f64,
    pub confusion: ConfusionMatrix,
    pub accuracy: f64,
    /// `None` when the denominator is zero.
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub precision: Option<f64>,
    pub f1: Option<f64>,
}

fn ratio(num: usize, den: usize) -> Option<f64> {
    (den > 0).then(|| num as f64 / den as f64)
}

pub fn check_threshold(threshold: f64) -> Result<(), StatsError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(StatsError::config(format!(
            "classification threshold must lie in [0, 1], got {threshold}"
        )))
    }
}

pub fn classification_metrics(y: &[f64], p: &[f64], threshold: f64) -> ClassificationMetrics {
    let mut c = ConfusionMatrix::default();
    for (&obs, &prob) in y.iter().zip(p) {
        match (obs >= 0.5, prob >= threshold) {
            (true, true) => c.true_positive += 1,
            (false, true) => c.false_positive += 1,
            (false, false) => c.true_negative += 1,
            (true, false) => c.false_negative += 1,
        }
    }
    let sensitivity = ratio(c.true_positive, c.true_positive + c.false_negative);
    let precision = ratio(c.true_positive, c.true_positive + c.false_positive);
    let f1 = match (precision, sensitivity) {
        (Some(p), Some(r)) if p + r > 0.0 => Some(2.0 * p * r / (p + r)),
        _ => None,
    };
    ClassificationMetrics {
        threshold,
        confusion: c,
        accuracy: ratio(c.true_positive + c.true_negative, c.total()).unwrap_or(0.0),
        sensitivity,
        specificity: ratio(c.true_negative, c.true_negative + c.false_positive),
        precision,
        f1,
    }
}

/* ═══════════════════════════════════════════════════════════════════════════
RANKING
═══════════════════════════════════════════════════════════════════════════ */

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DecileRow {
    /// 1 is the highest-scored tenth.
    pub decile: usize,
    pub count: usize,
    pub events: usize,
    pub event_rate: f64,
    /// Share of all events captured up to and including this decile.
    pub cumulative_gain: f64,
    pub lift: f64,
    pub cumulative_lift: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RankingMetrics {
    pub auc: f64,
    pub gini: f64,
    pub ks: f64,
    /// Score at which the KS gap is reached.
    pub ks_threshold: f64,
    pub deciles: Vec<DecileRow>,
    pub gain_at_20: f64,
    pub gain_at_40: f64,
    pub lift_at_20: f64,
    pub lift_at_40: f64,
}

fn class_counts(y: &[f64]) -> (usize, usize) {
    let pos = y.iter().filter(|v| **v >= 0.5).count();
    (pos, y.len() - pos)
}

/// Indices ordered by descending score, ties in input order.
fn descending(p: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..p.len()).collect();
    order.sort_by(|&a, &b| p[b].total_cmp(&p[a]));
    order
}

/// Mann-Whitney AUC with tie-averaged ranks. `None` without both classes.
pub fn auc(y: &[f64], p: &[f64]) -> Option<f64> {
    let (n1, n0) = class_counts(y);
    if n1 == 0 || n0 == 0 {
        return None;
    }
    let mut order: Vec<usize> = (0..p.len()).collect();
    order.sort_by(|&a, &b| p[a].total_cmp(&p[b]));
    let mut rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && p[order[j]] == p[order[i]] {
            j += 1;
        }
        // ranks i+1 ..= j share their average
        let avg = (i + 1 + j) as f64 / 2.0;
        rank_sum += avg * order[i..j].iter().filter(|&&k| y[k] >= 0.5).count() as f64;
        i = j;
    }
    let n1f = n1 as f64;
    Some((rank_sum - n1f * (n1f + 1.0) / 2.0) / (n1f * n0 as f64))
}

/// Largest gap between cumulative event and non-event rates, walking the
/// scores from high to low one tie group at a time.
pub fn ks_statistic(y: &[f64], p: &[f64]) -> Option<(f64, f64)> {
    let (n1, n0) = class_counts(y);
    if n1 == 0 || n0 == 0 {
        return None;
    }
    let order = descending(p);
    let (mut pos, mut neg) = (0usize, 0usize);
    let mut best = (0.0, p[order[0]]);
    let mut i = 0;
    while i < order.len() {
        let score = p[order[i]];
        while i < order.len() && p[order[i]] == score {
            if y[order[i]] >= 0.5 {
                pos += 1;
            } else {
                neg += 1;
            }
            i += 1;
        }
        let gap = (pos as f64 / n1 as f64 - neg as f64 / n0 as f64).abs();
        if gap > best.0 {
            best = (gap, score);
        }
    }
    Some(best)
}

pub fn ranking_metrics(y: &[f64], p: &[f64]) -> Result<RankingMetrics, StatsError> {
    let (auc, (ks, ks_threshold)) = match (auc(y, p), ks_statistic(y, p)) {
        (Some(a), Some(k)) => (a, k),
        _ => {
            return Err(StatsError::insufficient(
                "ranking metrics need both outcome classes",
                2,
                1,
            ));
        }
    };
    let n = y.len();
    let (total_events, _) = class_counts(y);
    let overall = total_events as f64 / n as f64;
    let order = descending(p);

    let mut deciles = Vec::with_capacity(10);
    let mut cum_events = 0;
    let mut cum_count = 0;
    for d in 0..10 {
        let (start, end) = (d * n / 10, (d + 1) * n / 10);
        if start == end {
            continue;
        }
        let events = order[start..end].iter().filter(|&&i| y[i] >= 0.5).count();
        let count = end - start;
        cum_events += events;
        cum_count += count;
        let event_rate = events as f64 / count as f64;
        deciles.push(DecileRow {
            decile: d + 1,
            count,
            events,
            event_rate,
            cumulative_gain: cum_events as f64 / total_events as f64,
            lift: event_rate / overall,
            cumulative_lift: (cum_events as f64 / cum_count as f64) / overall,
        });
    }

    let gain_at = |share: f64| -> (f64, f64) {
        let top = ((n as f64 * share).floor() as usize).max(1);
        let events = order[..top].iter().filter(|&&i| y[i] >= 0.5).count();
        let gain = events as f64 / total_events as f64;
        (gain, gain / (top as f64 / n as f64))
    };
    let (gain_at_20, lift_at_20) = gain_at(0.2);
    let (gain_at_40, lift_at_40) = gain_at(0.4);

    Ok(RankingMetrics {
        auc,
        gini: 2.0 * auc - 1.0,
        ks,
        ks_threshold,
        deciles,
        gain_at_20,
        gain_at_40,
        lift_at_20,
        lift_at_40,
    })
}
