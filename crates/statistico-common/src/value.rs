use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ───────────────────── Excel date-serial utilities ───────────────────
Excel's serial date system:
  Serial 1  = 1900-01-01
  Serial 59 = 1900-02-28
  Serial 60 = 1900-02-29  (phantom – doesn't exist, but Excel thinks it does)
  Serial 61 = 1900-03-01
Base date = 1899-12-31 so that serial 1 = base + 1 day = 1900-01-01.
Time is stored as fractional days (no timezone).
------------------------------------------------------------------- */

/// Base date for the 1900 date system. Serial 1 = base + 1 day = 1900-01-01.
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 31).unwrap_or(NaiveDate::MIN)
}

pub fn datetime_to_serial(dt: &NaiveDateTime) -> f64 {
    let days = (dt.date() - excel_epoch()).num_days();
    // Dates on or after 1900-03-01 get +1 to account for phantom Feb 29
    let phantom_cutoff = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap_or(NaiveDate::MIN);
    let serial_days = if dt.date() >= phantom_cutoff {
        days + 1
    } else {
        days
    };

    let secs_in_day = dt.time().num_seconds_from_midnight() as f64;
    serial_days as f64 + secs_in_day / 86_400.0
}

/// A raw worksheet cell as handed over by the host.
///
/// This is the only shape the analysis layer accepts; the host is
/// responsible for reading ranges and mapping its own value types onto
/// these variants.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Empty,
    /// A worksheet error such as `#N/A`; always treated as missing.
    Error(String),
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::DateTime(dt) => write!(f, "{dt}"),
            CellValue::Empty => write!(f, ""),
            CellValue::Error(e) => write!(f, "{e}"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::from(value.as_str())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Empty)
    }
}

impl CellValue {
    /// Numeric coercion used by every analysis.
    ///
    /// Numbers pass through, numeric text is parsed, dates become Excel
    /// serials. Booleans, blanks, errors, non-numeric text and non-finite
    /// numbers are missing.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Int(i) => *i as f64,
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Date(d) => {
                let dt = d.and_time(NaiveTime::MIN);
                datetime_to_serial(&dt)
            }
            CellValue::DateTime(dt) => datetime_to_serial(dt),
            CellValue::Boolean(_) | CellValue::Empty | CellValue::Error(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Binary outcome coercion: `0`/`1` numbers (or numeric text) and booleans.
    pub fn as_binary(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(b) => Some(*b),
            CellValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => binary_from_number(self.as_number()?),
            },
            _ => binary_from_number(self.as_number()?),
        }
    }

    /// Category label for dummy encoding; `None` for blanks and errors.
    pub fn as_level(&self) -> Option<String> {
        match self {
            CellValue::Empty | CellValue::Error(_) => None,
            CellValue::Text(s) if s.trim().is_empty() => None,
            CellValue::Text(s) => Some(s.trim().to_string()),
            CellValue::Number(n) if !n.is_finite() => None,
            other => Some(other.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty | CellValue::Error(_) => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

fn binary_from_number(n: f64) -> Option<bool> {
    if n == 0.0 {
        Some(false)
    } else if n == 1.0 {
        Some(true)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_coercion_policy() {
        assert_eq!(CellValue::Int(3).as_number(), Some(3.0));
        assert_eq!(CellValue::Number(2.5).as_number(), Some(2.5));
        assert_eq!(CellValue::Text(" 4.25 ".into()).as_number(), Some(4.25));
        assert_eq!(CellValue::Text("abc".into()).as_number(), None);
        assert_eq!(CellValue::Boolean(true).as_number(), None);
        assert_eq!(CellValue::Empty.as_number(), None);
        assert_eq!(CellValue::Error("#N/A".into()).as_number(), None);
        assert_eq!(CellValue::Number(f64::NAN).as_number(), None);
        assert_eq!(CellValue::Text("inf".into()).as_number(), None);
    }

    #[test]
    fn dates_become_serials() {
        let d = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert_eq!(CellValue::Date(d).as_number(), Some(1.0));
        let d = NaiveDate::from_ymd_opt(1900, 3, 1).unwrap();
        assert_eq!(CellValue::Date(d).as_number(), Some(61.0));
        let dt = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(CellValue::DateTime(dt).as_number(), Some(45292.5));
    }

    #[test]
    fn binary_outcomes() {
        assert_eq!(CellValue::Int(1).as_binary(), Some(true));
        assert_eq!(CellValue::Number(0.0).as_binary(), Some(false));
        assert_eq!(CellValue::Number(2.0).as_binary(), None);
        assert_eq!(CellValue::Boolean(false).as_binary(), Some(false));
        assert_eq!(CellValue::Text("TRUE".into()).as_binary(), Some(true));
        assert_eq!(CellValue::Text("1".into()).as_binary(), Some(true));
        assert_eq!(CellValue::Text("yes".into()).as_binary(), None);
        assert_eq!(CellValue::Empty.as_binary(), None);
    }

    #[test]
    fn levels_and_missing() {
        assert_eq!(CellValue::Text(" North ".into()).as_level(), Some("North".into()));
        assert_eq!(CellValue::Int(2).as_level(), Some("2".into()));
        assert_eq!(CellValue::Boolean(true).as_level(), Some("TRUE".into()));
        assert_eq!(CellValue::Empty.as_level(), None);
        assert!(CellValue::Text("   ".into()).is_missing());
        assert!(!CellValue::Number(0.0).is_missing());
        assert_eq!(CellValue::from(""), CellValue::Empty);
        assert_eq!(CellValue::from(None::<f64>), CellValue::Empty);
    }
}
