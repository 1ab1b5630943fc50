//! Design matrix construction for logistic regression.
//!
//! Rows are kept only when the outcome is binary, every numeric predictor is
//! numeric and every categorical predictor has a level. Categorical predictors
//! are dummy-encoded against the first level in sorted order.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use statistico_common::{CellValue, Dataset, StatsError};

use super::LogisticSpec;
use crate::linalg::Matrix;

pub const INTERCEPT: &str = "(Intercept)";

#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalTerm {
    pub variable: String,
    pub reference: String,
    /// Non-reference levels, one dummy column each, in sorted order.
    pub levels: Vec<String>,
    /// Level of each retained row.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    /// Column labels, `(Intercept)` first when present.
    pub names: Vec<String>,
    pub x: Matrix,
    pub y: Vec<f64>,
    /// Dataset row of each retained observation.
    pub rows: Vec<usize>,
    pub excluded: usize,
    pub intercept: bool,
    /// Numeric predictor names in design order.
    pub numeric: Vec<String>,
    pub categorical: Vec<CategoricalTerm>,
}

impl DesignMatrix {
    pub fn n(&self) -> usize {
        self.y.len()
    }

    pub fn k(&self) -> usize {
        self.names.len()
    }
}

fn validate(spec: &LogisticSpec) -> Result<(), StatsError> {
    if spec.dependent.is_empty() {
        return Err(StatsError::config("no dependent variable selected"));
    }
    if spec.numeric_predictors.is_empty() && spec.categorical_predictors.is_empty() {
        return Err(StatsError::config("no predictors selected"));
    }
    let mut seen = FxHashSet::default();
    for p in spec.numeric_predictors.iter().chain(&spec.categorical_predictors) {
        if p == &spec.dependent {
            return Err(StatsError::config(format!(
                "'{p}' cannot be both the outcome and a predictor"
            )));
        }
        if !seen.insert(p.as_str()) {
            return Err(StatsError::config(format!("predictor '{p}' selected twice")));
        }
    }
    Ok(())
}

pub fn build_design(dataset: &Dataset, spec: &LogisticSpec) -> Result<DesignMatrix, StatsError> {
    validate(spec)?;
    let outcome = dataset.column(&spec.dependent)?;
    let numeric: Vec<&[CellValue]> = spec
        .numeric_predictors
        .iter()
        .map(|n| dataset.column(n))
        .collect::<Result<_, _>>()?;
    let categorical: Vec<&[CellValue]> = spec
        .categorical_predictors
        .iter()
        .map(|n| dataset.column(n))
        .collect::<Result<_, _>>()?;

    let mut rows = Vec::new();
    let mut y = Vec::new();
    let mut num_values: Vec<Vec<f64>> = Vec::new();
    let mut cat_values: Vec<Vec<String>> = vec![Vec::new(); categorical.len()];

    'rows: for r in 0..dataset.row_count() {
        let Some(outcome) = outcome[r].as_binary() else {
            continue;
        };
        let mut nums = Vec::with_capacity(numeric.len());
        for col in &numeric {
            match col[r].as_number() {
                Some(v) => nums.push(v),
                None => continue 'rows,
            }
        }
        let mut levels = Vec::with_capacity(categorical.len());
        for col in &categorical {
            match col[r].as_level() {
                Some(l) => levels.push(l),
                None => continue 'rows,
            }
        }
        rows.push(r);
        y.push(if outcome { 1.0 } else { 0.0 });
        num_values.push(nums);
        for (slot, level) in cat_values.iter_mut().zip(levels) {
            slot.push(level);
        }
    }
    let excluded = dataset.row_count() - rows.len();

    let mut terms = Vec::with_capacity(categorical.len());
    for (variable, values) in spec.categorical_predictors.iter().zip(cat_values) {
        let distinct: BTreeSet<&str> = values.iter().map(String::as_str).collect();
        let mut levels = distinct
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into_iter();
        let Some(reference) = levels.next() else {
            // no retained rows; the size guard below reports it
            terms.push(CategoricalTerm {
                variable: variable.clone(),
                reference: String::new(),
                levels: Vec::new(),
                values,
            });
            continue;
        };
        let levels: Vec<String> = levels.collect();
        if levels.is_empty() {
            return Err(StatsError::config(format!(
                "categorical predictor '{variable}' has a single level ('{reference}')"
            )));
        }
        terms.push(CategoricalTerm {
            variable: variable.clone(),
            reference,
            levels,
            values,
        });
    }

    let mut names = Vec::new();
    if spec.intercept {
        names.push(INTERCEPT.to_string());
    }
    names.extend(spec.numeric_predictors.iter().cloned());
    for t in &terms {
        names.extend(t.levels.iter().map(|l| format!("{}[{}]", t.variable, l)));
    }

    let n = rows.len();
    let k = names.len();
    let mut x = Matrix::zeros(n, k);
    for i in 0..n {
        let mut j = 0;
        if spec.intercept {
            x[(i, j)] = 1.0;
            j += 1;
        }
        for v in &num_values[i] {
            x[(i, j)] = *v;
            j += 1;
        }
        for t in &terms {
            for level in &t.levels {
                x[(i, j)] = if &t.values[i] == level { 1.0 } else { 0.0 };
                j += 1;
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(n, k, excluded, "logistic design matrix");

    Ok(DesignMatrix {
        names,
        x,
        y,
        rows,
        excluded,
        intercept: spec.intercept,
        numeric: spec.numeric_predictors.clone(),
        categorical: terms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use statistico_common::StatsErrorKind;

    fn spec() -> LogisticSpec {
        LogisticSpec {
            dependent: "bought".into(),
            numeric_predictors: vec!["age".into()],
            categorical_predictors: vec!["region".into()],
            ..Default::default()
        }
    }

    fn dataset() -> Dataset {
        let rows = vec![
            vec![CellValue::Int(1), 34.0.into(), "west".into()],
            vec![CellValue::Boolean(false), 51.0.into(), "east".into()],
            vec!["maybe".into(), 40.0.into(), "east".into()],
            vec![CellValue::Int(0), CellValue::Empty, "north".into()],
            vec![CellValue::Int(1), "29".into(), "north".into()],
            vec![CellValue::Int(0), 45.0.into(), CellValue::Empty],
        ];
        Dataset::from_rows(&["bought", "age", "region"], rows).unwrap()
    }

    #[test]
    fn dummy_encodes_against_sorted_first_level() {
        let d = build_design(&dataset(), &spec()).unwrap();
        assert_eq!(d.rows, vec![0, 1, 4]);
        assert_eq!(d.excluded, 3);
        assert_eq!(d.y, vec![1.0, 0.0, 1.0]);
        assert_eq!(
            d.names,
            vec!["(Intercept)", "age", "region[north]", "region[west]"]
        );
        assert_eq!(d.categorical[0].reference, "east");
        assert_eq!(
            crate::linalg::to_rows(&d.x),
            vec![
                vec![1.0, 34.0, 0.0, 1.0],
                vec![1.0, 51.0, 0.0, 0.0],
                vec![1.0, 29.0, 1.0, 0.0],
            ]
        );
    }

    #[test]
    fn rejects_inconsistent_specs() {
        let mut s = spec();
        s.numeric_predictors.push("bought".into());
        assert_eq!(
            build_design(&dataset(), &s).unwrap_err().kind(),
            StatsErrorKind::InvalidConfiguration
        );
        let mut s = spec();
        s.categorical_predictors.push("region".into());
        assert!(build_design(&dataset(), &s).is_err());
        let mut s = spec();
        s.numeric_predictors = vec!["missing".into()];
        assert!(build_design(&dataset(), &s).is_err());
    }

    #[test]
    fn categorical_with_no_retained_rows_still_builds() {
        // every row lacks a usable outcome, so no level survives
        let rows = vec![
            vec!["maybe".into(), 34.0.into(), "west".into()],
            vec![CellValue::Empty, 51.0.into(), "east".into()],
        ];
        let ds = Dataset::from_rows(&["bought", "age", "region"], rows).unwrap();
        let d = build_design(&ds, &spec()).unwrap();
        assert_eq!(d.n(), 0);
        assert_eq!(d.excluded, 2);
        assert_eq!(d.categorical[0].reference, "");
        assert!(d.categorical[0].levels.is_empty());
        assert_eq!(d.names, vec!["(Intercept)", "age"]);
        assert_eq!(d.x.shape(), (0, 2));
    }
}
