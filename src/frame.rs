//! Indexed polars containers: the feature table an indicator reads and the
//! target it is scored against, plus the join that lines an indicator
//! column up with the target's rows.

use polars::prelude::{
    Column, DataFrame, DataType, IntoLazy, JoinArgs, JoinType, NamedFrom, PolarsResult, Series,
    SortMultipleOptions, col,
};

use crate::error::{Error, Result};

/// Name of the index column of frames built from plain vectors.
pub const INDEX_COLUMN: &str = "index";

const KEY: &str = "__tuneta_key";
const VALUE: &str = "__tuneta_value";
const ROW: &str = "__tuneta_row";

/// A feature table: a polars [`DataFrame`] with a unique `i64` index column
/// (timestamps or ordinals) alongside the feature columns.
///
/// ```
/// use tuneta::FeatureFrame;
///
/// let frame = FeatureFrame::new((0..4).collect())
///     .with_column("close", vec![1.0, 2.0, 3.0, 4.0])
///     .unwrap();
/// assert_eq!(frame.len(), 4);
/// let close = frame.data_frame().column("close").unwrap().f64().unwrap();
/// assert_eq!(close.get(2), Some(3.0));
/// ```
#[derive(Clone, Debug)]
pub struct FeatureFrame {
    data: DataFrame,
    index: Column,
}

impl FeatureFrame {
    /// A frame holding only an [`INDEX_COLUMN`] over `index`.
    ///
    /// Labels are expected to be unique; duplicates are reported when the
    /// frame is first aligned to a target.
    #[must_use]
    pub fn new(index: Vec<i64>) -> Self {
        let index = Series::new(INDEX_COLUMN.into(), index);
        Self {
            data: index.clone().into_frame(),
            index: Column::from(index),
        }
    }

    /// Wrap an existing frame, using column `index` as the row index.
    ///
    /// The index is cast to `i64`.
    ///
    /// # Errors
    ///
    /// [`Error::Polars`] if the column is missing or cannot be cast, and
    /// [`Error::InvalidFrame`] if it holds nulls or repeated labels.
    pub fn from_data_frame(mut data: DataFrame, index: &str) -> Result<Self> {
        let index = data.column(index)?.cast(&DataType::Int64)?;
        if index.null_count() > 0 {
            return Err(Error::InvalidFrame(format!(
                "index column '{}' contains nulls",
                index.name()
            )));
        }
        check_unique(&index)?;
        data.with_column(index.clone())?;
        Ok(Self { data, index })
    }

    /// Add or replace a float column.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] if `values` is not as long as the index,
    /// [`Error::InvalidFrame`] if `name` is the index column.
    pub fn with_column(mut self, name: &str, values: Vec<f64>) -> Result<Self> {
        self.insert_column(name, values)?;
        Ok(self)
    }

    /// Add or replace a float column in place.
    ///
    /// # Errors
    ///
    /// See [`with_column`](Self::with_column).
    pub fn insert_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(Error::LengthMismatch {
                what: "frame column",
                expected: self.len(),
                got: values.len(),
            });
        }
        if name == self.index.name().as_str() {
            return Err(Error::InvalidFrame(format!(
                "cannot overwrite index column '{name}'"
            )));
        }
        self.data.with_column(Series::new(name.into(), values))?;
        Ok(())
    }

    /// The underlying frame, index column included.
    #[must_use]
    pub fn data_frame(&self) -> &DataFrame {
        &self.data
    }

    /// The row index.
    #[must_use]
    pub fn index(&self) -> &Column {
        &self.index
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.height()
    }

    /// Returns `true` if the frame has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The signal a fit is scored against: an `i64` index and one `f64` value
/// per entry. Null values are read as NaN.
#[derive(Clone, Debug)]
pub struct Target {
    index: Column,
    values: Vec<f64>,
}

impl Target {
    /// Pair an index with values.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] if the lengths differ.
    pub fn new(index: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        if index.len() != values.len() {
            return Err(Error::LengthMismatch {
                what: "target values",
                expected: index.len(),
                got: values.len(),
            });
        }
        Ok(Self {
            index: Column::new(INDEX_COLUMN.into(), index),
            values,
        })
    }

    /// Build a target from polars columns, casting the index to `i64` and
    /// the values to `f64`.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] if the lengths differ, [`Error::Polars`] if
    /// a cast fails, [`Error::InvalidFrame`] if the index holds nulls.
    pub fn from_columns(index: &Column, values: &Column) -> Result<Self> {
        if index.len() != values.len() {
            return Err(Error::LengthMismatch {
                what: "target values",
                expected: index.len(),
                got: values.len(),
            });
        }
        let index = index.cast(&DataType::Int64)?;
        if index.null_count() > 0 {
            return Err(Error::InvalidFrame("target index contains nulls".to_owned()));
        }
        let values = float_values(values.as_materialized_series())?;
        Ok(Self { index, values })
    }

    /// The index.
    #[must_use]
    pub fn index(&self) -> &Column {
        &self.index
    }

    /// The values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the target is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Re-express `values` (indexed by `source`) on the `target` index.
///
/// A left join of the target labels against the source labels, kept in
/// target order. Target labels missing from `source` come out as NaN, as do
/// null values.
///
/// # Errors
///
/// [`Error::LengthMismatch`] if `values` and `source` differ in length,
/// [`Error::InvalidFrame`] if `source` repeats a label, and
/// [`Error::Polars`] if the join fails, e.g. on incompatible index types.
pub fn reindex(source: &Column, values: &Series, target: &Column) -> Result<Vec<f64>> {
    if source.len() != values.len() {
        return Err(Error::LengthMismatch {
            what: "reindexed values",
            expected: source.len(),
            got: values.len(),
        });
    }
    check_unique(source)?;

    let right = DataFrame::new(vec![
        renamed(source, KEY),
        Column::from(values.cast(&DataType::Float64)?.with_name(VALUE.into())),
    ])?;
    let left = DataFrame::new(vec![renamed(target, KEY)])?;
    let joined = left
        .lazy()
        .with_row_index(ROW, None)
        .join(
            right.lazy(),
            [col(KEY)],
            [col(KEY)],
            JoinArgs::new(JoinType::Left),
        )
        .sort([ROW], SortMultipleOptions::default())
        .select([col(VALUE)])
        .collect()?;
    Ok(float_values(joined.column(VALUE)?.as_materialized_series())?)
}

/// `series` as `f64`, nulls read as NaN.
pub(crate) fn float_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let cast = series.cast(&DataType::Float64)?;
    Ok(cast
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

fn renamed(column: &Column, name: &str) -> Column {
    Column::from(
        column
            .as_materialized_series()
            .clone()
            .with_name(name.into()),
    )
}

fn check_unique(index: &Column) -> Result<()> {
    let distinct = index.as_materialized_series().n_unique()?;
    if distinct == index.len() {
        Ok(())
    } else {
        Err(Error::InvalidFrame(format!(
            "index column '{}' repeats {} label(s)",
            index.name(),
            index.len() - distinct
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(labels: Vec<i64>) -> Column {
        Column::new(INDEX_COLUMN.into(), labels)
    }

    #[test]
    fn reindex_fills_missing_with_nan() {
        let values = Series::new("v".into(), vec![1.0, 2.0, 3.0]);
        let out = reindex(&index(vec![10, 11, 12]), &values, &index(vec![11, 13, 10])).unwrap();
        assert_eq!(out[0], 2.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 1.0);
    }

    #[test]
    fn reindex_keeps_target_order_and_repeats() {
        let values = Series::new("v".into(), vec![1.0, 2.0, 3.0]);
        let target = index(vec![12, 10, 12, 11, 10]);
        let out = reindex(&index(vec![10, 11, 12]), &values, &target).unwrap();
        assert_eq!(out, vec![3.0, 1.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn reindex_reads_nulls_and_integers_as_float() {
        let values = Series::new("v".into(), [Some(4_i32), None, Some(6)]);
        let out = reindex(&index(vec![0, 1, 2]), &values, &index(vec![0, 1, 2])).unwrap();
        assert_eq!(out[0], 4.0);
        assert!(out[1].is_nan());
        assert_eq!(out[2], 6.0);
    }

    #[test]
    fn reindex_rejects_repeated_source_labels() {
        let values = Series::new("v".into(), vec![1.0, 2.0]);
        assert!(matches!(
            reindex(&index(vec![5, 5]), &values, &index(vec![5])),
            Err(Error::InvalidFrame(_))
        ));
    }

    #[test]
    fn column_length_is_checked() {
        let frame = FeatureFrame::new(vec![0, 1, 2]);
        assert!(matches!(
            frame.with_column("close", vec![1.0]),
            Err(Error::LengthMismatch { expected: 3, got: 1, .. })
        ));
    }

    #[test]
    fn insert_column_replaces() {
        let mut frame = FeatureFrame::new(vec![0, 1]);
        frame.insert_column("a", vec![1.0, 2.0]).unwrap();
        frame.insert_column("a", vec![3.0, 4.0]).unwrap();
        assert_eq!(frame.data_frame().width(), 2);
        let a = frame.data_frame().column("a").unwrap().f64().unwrap();
        assert_eq!(a.get(0), Some(3.0));
        assert!(matches!(
            frame.insert_column(INDEX_COLUMN, vec![0.0, 0.0]),
            Err(Error::InvalidFrame(_))
        ));
    }

    #[test]
    fn from_data_frame_validates_the_index() {
        let data = DataFrame::new(vec![
            Column::new("ts".into(), [3_i32, 4, 5]),
            Column::new("close".into(), [1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let frame = FeatureFrame::from_data_frame(data, "ts").unwrap();
        assert_eq!(frame.index().dtype(), &DataType::Int64);
        assert_eq!(frame.len(), 3);

        let repeated = DataFrame::new(vec![Column::new("ts".into(), [1_i64, 1])]).unwrap();
        assert!(matches!(
            FeatureFrame::from_data_frame(repeated, "ts"),
            Err(Error::InvalidFrame(_))
        ));
        let missing = DataFrame::new(vec![Column::new("ts".into(), [1_i64])]).unwrap();
        assert!(matches!(
            FeatureFrame::from_data_frame(missing, "time"),
            Err(Error::Polars(_))
        ));
    }

    #[test]
    fn target_length_is_checked() {
        assert!(Target::new(vec![0, 1], vec![1.0]).is_err());
        assert_eq!(Target::new(vec![0], vec![1.0]).unwrap().len(), 1);
    }

    #[test]
    fn target_from_columns_reads_nulls_as_nan() {
        let values = Column::new("y".into(), [Some(1.5), None]);
        let target = Target::from_columns(&index(vec![7, 8]), &values).unwrap();
        assert_eq!(target.values()[0], 1.5);
        assert!(target.values()[1].is_nan());
    }
}
