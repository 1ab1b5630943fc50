use crate::{Dataset, DescriptiveStats, StatsError, describe};

/// Summarise one column of a worksheet-shaped table.
///
/// Blank and text cells are skipped the same way the analysis entry points
/// skip them; this helper exists so documentation examples stay short.
///
/// # Example
///
/// ```rust
/// # use statistico::doc_examples::describe_column;
/// # use statistico::{CellValue, Dataset};
/// let ds = Dataset::from_rows(
///     &["score"],
///     vec![
///         vec![CellValue::Number(4.0)],
///         vec![CellValue::Empty],
///         vec![CellValue::Number(8.0)],
///     ],
/// )?;
/// let stats = describe_column(&ds, "score")?;
/// assert_eq!(stats.n, 2);
/// assert_eq!(stats.mean, 6.0);
/// # Ok::<(), statistico::StatsError>(())
/// ```
pub fn describe_column(dataset: &Dataset, column: &str) -> Result<DescriptiveStats, StatsError> {
    let (_, values) = dataset.numeric_column(column)?;
    describe(&values)
}
