//! Worksheet coordinates for tracing results back to cells.
//!
//! Analyses work on row indices into a [`Dataset`](crate::Dataset). When the
//! host supplies the sheet position of the first data cell, those indices can
//! be turned into `A1`-style addresses for highlighting flagged values.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const ROW_MAX: u32 = 1_048_575;
const COL_MAX: u32 = 16_383;

/// Errors returned when constructing coordinates from unchecked inputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoordError {
    RowOverflow(u64),
    ColOverflow(u64),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::RowOverflow(row) => write!(f, "row {row} exceeds {ROW_MAX}"),
            CoordError::ColOverflow(col) => write!(f, "col {col} exceeds {COL_MAX}"),
        }
    }
}

impl std::error::Error for CoordError {}

/// Zero-based absolute cell position with Excel-compatible bounds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Coord {
    row: u32,
    col: u32,
}

impl Coord {
    pub fn try_new(row: u32, col: u32) -> Result<Self, CoordError> {
        if row > ROW_MAX {
            return Err(CoordError::RowOverflow(row as u64));
        }
        if col > COL_MAX {
            return Err(CoordError::ColOverflow(col as u64));
        }
        Ok(Self { row, col })
    }

    /// Construct from Excel 1-based coordinates.
    pub fn from_excel(row: u32, col: u32) -> Result<Self, CoordError> {
        Self::try_new(row.saturating_sub(1), col.saturating_sub(1))
    }

    /// Parse an unanchored or `$`-anchored `A1` reference.
    pub fn parse_a1(s: &str) -> Option<Self> {
        let s = s.trim().replace('$', "");
        let split = s.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = s.split_at(split);
        let col = letters_to_column_index(&letters.to_ascii_uppercase())?;
        let row: u32 = digits.parse().ok()?;
        if row == 0 {
            return None;
        }
        Self::try_new(row - 1, col).ok()
    }

    #[inline(always)]
    pub fn row(self) -> u32 {
        self.row
    }

    #[inline(always)]
    pub fn col(self) -> u32 {
        self.col
    }

    /// Move down by `rows` and right by `cols`, failing past the sheet edge.
    pub fn offset(self, rows: usize, cols: usize) -> Result<Self, CoordError> {
        let row = self.row as u64 + rows as u64;
        let col = self.col as u64 + cols as u64;
        if row > ROW_MAX as u64 {
            return Err(CoordError::RowOverflow(row));
        }
        if col > COL_MAX as u64 {
            return Err(CoordError::ColOverflow(col));
        }
        Ok(Self {
            row: row as u32,
            col: col as u32,
        })
    }

    pub fn col_to_letters(col: u32) -> String {
        column_to_letters(col)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row + 1)
    }
}

fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

fn letters_to_column_index(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for (idx, ch) in s.bytes().enumerate() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let val = (ch - b'A') as u32;
        col = col.checked_mul(26)?;
        col = col.checked_add(val)?;
        if idx != s.len() - 1 {
            col = col.checked_add(1)?;
        }
    }
    Some(col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_a1() {
        assert_eq!(Coord::try_new(0, 0).unwrap().to_string(), "A1");
        assert_eq!(Coord::try_new(5, 27).unwrap().to_string(), "AB6");
        assert_eq!(Coord::from_excel(10, 3).unwrap().to_string(), "C10");
    }

    #[test]
    fn bounds() {
        assert!(Coord::try_new(ROW_MAX, COL_MAX).is_ok());
        assert_eq!(
            Coord::try_new(ROW_MAX + 1, 0),
            Err(CoordError::RowOverflow((ROW_MAX + 1) as u64))
        );
        let corner = Coord::try_new(ROW_MAX, 0).unwrap();
        assert!(corner.offset(1, 0).is_err());
    }

    #[test]
    fn parse_and_offset() {
        let origin = Coord::parse_a1("$B$2").unwrap();
        assert_eq!((origin.row(), origin.col()), (1, 1));
        assert_eq!(origin.offset(3, 1).unwrap().to_string(), "C5");
        assert!(Coord::parse_a1("A0").is_none());
        assert!(Coord::parse_a1("12").is_none());
        assert_eq!(Coord::parse_a1("xfd1").unwrap().col(), COL_MAX);
    }

    #[test]
    fn column_letter_roundtrip() {
        let letters = Coord::col_to_letters(27);
        assert_eq!(letters, "AB");
        assert_eq!(letters_to_column_index(&letters), Some(27));
        assert!(letters_to_column_index("a1").is_none());
    }
}
