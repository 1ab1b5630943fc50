//! Column-major tabular input.
//!
//! Row order is insertion order and is preserved by every accessor so
//! results can be reported against the original rows.

use crate::coord::Coord;
use crate::error::StatsError;
use crate::value::CellValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

/// Named columns of equal length plus an optional sheet origin.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Dataset {
    columns: Vec<Column>,
    rows: usize,
    /// Sheet position of the first data cell (row 0 of column 0).
    origin: Option<Coord>,
}

/// Numeric view of one or more columns after missing-value filtering.
#[derive(Clone, Debug, PartialEq)]
pub struct NumericRows {
    /// Original row index of each retained row.
    pub indices: Vec<usize>,
    /// One inner vector per retained row, one entry per requested column.
    pub rows: Vec<Vec<f64>>,
    pub excluded: usize,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Result<Self, StatsError> {
        let rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        for c in &columns {
            if c.values.len() != rows {
                return Err(StatsError::config(format!(
                    "column '{}' has {} rows, expected {rows}",
                    c.name,
                    c.values.len()
                )));
            }
        }
        for (i, c) in columns.iter().enumerate() {
            if columns[..i].iter().any(|other| other.name == c.name) {
                return Err(StatsError::config(format!(
                    "duplicate column name '{}'",
                    c.name
                )));
            }
        }
        Ok(Self {
            columns,
            rows,
            origin: None,
        })
    }

    /// Build from row-major cells with a header row, the shape ranges
    /// arrive in from the host. Short rows are padded with blanks.
    pub fn from_rows(header: &[&str], rows: Vec<Vec<CellValue>>) -> Result<Self, StatsError> {
        let mut columns: Vec<Column> = header
            .iter()
            .map(|h| Column {
                name: h.to_string(),
                values: Vec::with_capacity(rows.len()),
            })
            .collect();
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() > columns.len() {
                return Err(StatsError::config(format!(
                    "row {r} has {} cells but the header has {}",
                    row.len(),
                    columns.len()
                )));
            }
            let width = row.len();
            for (c, v) in row.into_iter().enumerate() {
                columns[c].values.push(v);
            }
            for col in columns.iter_mut().skip(width) {
                col.values.push(CellValue::Empty);
            }
        }
        Self::new(columns)
    }

    /// Convenience for purely numeric columns.
    pub fn from_numeric(columns: Vec<(&str, Vec<f64>)>) -> Result<Self, StatsError> {
        Self::new(
            columns
                .into_iter()
                .map(|(name, values)| Column {
                    name: name.to_string(),
                    values: values.into_iter().map(CellValue::Number).collect(),
                })
                .collect(),
        )
    }

    pub fn with_origin(mut self, origin: Coord) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn origin(&self) -> Option<Coord> {
        self.origin
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Result<&[CellValue], StatsError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| StatsError::config(format!("column '{name}' not found")))
    }

    fn column_position(&self, name: &str) -> Result<usize, StatsError> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| StatsError::config(format!("column '{name}' not found")))
    }

    /// Numeric entries of one column with their original row indices.
    pub fn numeric_column(&self, name: &str) -> Result<(Vec<usize>, Vec<f64>), StatsError> {
        let mut indices = Vec::new();
        let mut values = Vec::new();
        for (i, v) in self.column(name)?.iter().enumerate() {
            if let Some(n) = v.as_number() {
                indices.push(i);
                values.push(n);
            }
        }
        Ok((indices, values))
    }

    /// Listwise deletion across `names`: a row is kept only when every
    /// requested column is numeric.
    pub fn numeric_rows(&self, names: &[String]) -> Result<NumericRows, StatsError> {
        let cols = names
            .iter()
            .map(|n| self.column(n))
            .collect::<Result<Vec<_>, _>>()?;
        let mut out = NumericRows {
            indices: Vec::new(),
            rows: Vec::new(),
            excluded: 0,
        };
        'rows: for r in 0..self.rows {
            let mut row = Vec::with_capacity(cols.len());
            for c in &cols {
                match c[r].as_number() {
                    Some(n) => row.push(n),
                    None => {
                        out.excluded += 1;
                        continue 'rows;
                    }
                }
            }
            out.indices.push(r);
            out.rows.push(row);
        }
        Ok(out)
    }

    /// `A1` address of `row` in column `name`, when an origin is known.
    pub fn cell_address(&self, name: &str, row: usize) -> Option<String> {
        let origin = self.origin?;
        let col = self.column_position(name).ok()?;
        origin.offset(row, col).ok().map(|c| c.to_string())
    }
}
