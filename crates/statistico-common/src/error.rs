//! Error representation shared by every analysis.
//!
//! - **`StatsErrorKind`** : the three failure classes the UI distinguishes
//! - **`StatsError`**     : one enum carrying the kind plus a specific payload
//!
//! Row-level problems (a missing predictor, a degenerate 2×2 table) are never
//! errors; they are excluded and counted in the result. Only whole-dataset
//! problems surface here.

use std::fmt;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The canonical failure classes.
///
/// **Note:** names are CamelCase (idiomatic Rust) while `Display`
/// renders the stable code the UI keys its messages on.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StatsErrorKind {
    InsufficientData,
    InvalidConfiguration,
    NumericalInstability,
}

impl fmt::Display for StatsErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InsufficientData => "INSUFFICIENT_DATA",
            Self::InvalidConfiguration => "INVALID_CONFIGURATION",
            Self::NumericalInstability => "NUMERICAL_INSTABILITY",
        })
    }
}

impl StatsErrorKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INSUFFICIENT_DATA" => Some(Self::InsufficientData),
            "INVALID_CONFIGURATION" => Some(Self::InvalidConfiguration),
            "NUMERICAL_INSTABILITY" => Some(Self::NumericalInstability),
            _ => None,
        }
    }
}

/// The single error type every compute function returns.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatsError {
    /// Fewer usable observations than the component's minimum.
    #[error("insufficient data for {context}: need at least {required}, got {actual}")]
    InsufficientData {
        context: String,
        required: usize,
        actual: usize,
    },

    /// Nonsensical parameter combination, unknown column, or out-of-range option.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Singular matrix even after ridge correction, or a non-finite
    /// intermediate where a finite value was required.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),
}

/* ───────────────────── Constructors & helpers ─────────────────────── */

impl StatsError {
    pub fn insufficient(context: impl Into<String>, required: usize, actual: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            required,
            actual,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn unstable(msg: impl Into<String>) -> Self {
        Self::NumericalInstability(msg.into())
    }

    pub fn kind(&self) -> StatsErrorKind {
        match self {
            Self::InsufficientData { .. } => StatsErrorKind::InsufficientData,
            Self::InvalidConfiguration(_) => StatsErrorKind::InvalidConfiguration,
            Self::NumericalInstability(_) => StatsErrorKind::NumericalInstability,
        }
    }

    /// Fail with `InsufficientData` unless `actual >= required`.
    pub fn ensure_min(context: &str, required: usize, actual: usize) -> Result<(), Self> {
        if actual < required {
            Err(Self::insufficient(context, required, actual))
        } else {
            Ok(())
        }
    }

    /// Fail with `NumericalInstability` unless `value` is finite.
    pub fn ensure_finite(what: &str, value: f64) -> Result<f64, Self> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::unstable(format!("{what} is not finite ({value})")))
        }
    }
}

impl From<StatsError> for String {
    fn from(error: StatsError) -> Self {
        format!("{error}")
    }
}

impl PartialEq<StatsErrorKind> for StatsError {
    fn eq(&self, other: &StatsErrorKind) -> bool {
        self.kind() == *other
    }
}

pub type StatsResult<T> = Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_roundtrip() {
        for kind in [
            StatsErrorKind::InsufficientData,
            StatsErrorKind::InvalidConfiguration,
            StatsErrorKind::NumericalInstability,
        ] {
            assert_eq!(StatsErrorKind::parse(&kind.to_string()), Some(kind));
        }
        assert_eq!(StatsErrorKind::parse("#DIV/0!"), None);
    }

    #[test]
    fn insufficient_message() {
        let err = StatsError::insufficient("logistic regression", 10, 4);
        assert_eq!(err, StatsErrorKind::InsufficientData);
        assert_eq!(
            err.to_string(),
            "insufficient data for logistic regression: need at least 10, got 4"
        );
    }

    #[test]
    fn ensure_helpers() {
        assert!(StatsError::ensure_min("variance", 2, 2).is_ok());
        assert_eq!(
            StatsError::ensure_min("variance", 2, 1).unwrap_err().kind(),
            StatsErrorKind::InsufficientData
        );
        assert_eq!(StatsError::ensure_finite("x", 1.5), Ok(1.5));
        assert_eq!(
            StatsError::ensure_finite("x", f64::INFINITY)
                .unwrap_err()
                .kind(),
            StatsErrorKind::NumericalInstability
        );
    }
}
