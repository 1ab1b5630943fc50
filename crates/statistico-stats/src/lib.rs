//! Statistical computation core for worksheet analyses.
//!
//! Every entry point is a pure function of its inputs: data comes in as a
//! slice or a [`statistico_common::Dataset`], configuration as an explicit
//! struct, and resampling draws from an injected [`random::RandomSource`].
//! Failures are [`statistico_common::StatsError`] values of one of three
//! kinds; row-level problems are excluded and counted instead.
//!
//! | Analysis | Entry point |
//! |---|---|
//! | Descriptives | [`descriptive::describe`] |
//! | Hypothesis tests | [`hypothesis::run_hypothesis_test`] |
//! | Outliers | [`outliers::detect_outliers`] |
//! | Normality | [`normality::run_normality_suite`] |
//! | Density | [`kde::estimate_kde`] |
//! | Logistic regression | [`logistic::fit_logistic_regression`] |
//! | Factor analysis | [`factor::run_factor_analysis`] |
//! | Meta-analysis | [`meta::run_meta_analysis`] |

pub mod descriptive;
pub mod distributions;
pub mod factor;
pub mod hypothesis;
pub mod kde;
pub mod linalg;
pub mod logistic;
pub mod meta;
pub mod normality;
pub mod outliers;
pub mod random;
pub mod resampling;

pub use descriptive::{DescriptiveStats, describe, quantile};
pub use factor::{FactorBundle, FactorSpec, Rotation, run_factor_analysis};
pub use hypothesis::{HypothesisConfig, HypothesisTestResult, run_hypothesis_test};
pub use kde::{KdeConfig, KdeResult, Kernel, estimate_kde};
pub use logistic::{FitBundle, LogisticSpec, fit_logistic_regression};
pub use meta::{EffectColumns, MetaBundle, MetaModel, MetaSpec, run_meta_analysis};
pub use normality::{NormalitySuite, run_normality_suite};
pub use outliers::{OutlierMethod, OutlierReport, detect_outliers, detect_outliers_in_column};
pub use random::{RandomSource, default_source, seeded_source};
pub use resampling::{BootstrapConfig, BootstrapStatistic, bootstrap_ci, bootstrap_test};
