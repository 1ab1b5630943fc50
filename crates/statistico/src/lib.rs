//! Meta crate that re-exports the Statistico building blocks with sensible
//! defaults. Downstream users can depend on this crate and opt into specific
//! layers via feature flags while keeping access to the underlying crates
//! when deeper integration is required.

#[cfg(feature = "common")]
pub use statistico_common as common;

#[cfg(feature = "stats")]
pub use statistico_stats as stats;

#[cfg(feature = "common")]
pub use statistico_common::{CellValue, Coord, Dataset, StatsError, StatsErrorKind};

#[cfg(feature = "stats")]
pub use statistico_stats::{
    BootstrapConfig, BootstrapStatistic, DescriptiveStats, EffectColumns, FactorBundle,
    FactorSpec, FitBundle, HypothesisConfig, HypothesisTestResult, KdeConfig, KdeResult, Kernel,
    LogisticSpec, MetaBundle, MetaModel, MetaSpec, NormalitySuite, OutlierMethod, OutlierReport,
    RandomSource, Rotation, bootstrap_ci, bootstrap_test, default_source, describe,
    detect_outliers, detect_outliers_in_column, estimate_kde, fit_logistic_regression, quantile,
    run_factor_analysis, run_hypothesis_test, run_meta_analysis, run_normality_suite,
    seeded_source,
};

#[cfg(feature = "stats")]
pub mod doc_examples;
