//! Date-aligned return matrix across several assets.

use std::collections::HashSet;

use chrono::NaiveDate;

use super::series::{check_increasing, ReturnSeries};
use crate::error::{AnalyticsError, Result};
use crate::primitives::Matrix;

/// Returns for several assets on a shared date index.
///
/// Rows are dates, columns are asset symbols. Symbols are unique and
/// non-empty. Values may be `NaN` when built through
/// [`from_columns`](Self::from_columns) with gaps; covariance-based code
/// works on [`drop_incomplete_rows`](Self::drop_incomplete_rows).
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use folio_analytics::data::{ReturnMatrix, ReturnSeries};
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).expect("valid date");
/// let a = ReturnSeries::new(vec![d(1), d(4), d(5)], vec![0.01, 0.02, -0.01]).expect("valid");
/// let b = ReturnSeries::new(vec![d(4), d(5), d(6)], vec![0.00, 0.03, 0.01]).expect("valid");
///
/// let matrix = ReturnMatrix::inner_join(&[("A".to_string(), a), ("B".to_string(), b)])
///     .expect("unique symbols");
/// assert_eq!(matrix.shape(), (2, 2)); // only 4th and 5th overlap
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    data: Matrix,
}

impl ReturnMatrix {
    /// Creates a matrix from named, equally long, pre-aligned columns.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no columns, column lengths differ from
    /// the date index, symbols are empty or duplicated, or dates are not
    /// strictly increasing.
    pub fn from_columns(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        if columns.is_empty() {
            return Err(AnalyticsError::invalid_parameter(
                "columns",
                0,
                "at least one asset",
            ));
        }
        check_increasing(&dates)?;
        let n_rows = dates.len();
        for (name, col) in &columns {
            if col.len() != n_rows {
                return Err(AnalyticsError::dimension_mismatch(
                    &format!("rows for {name}"),
                    n_rows,
                    col.len(),
                ));
            }
        }
        let symbols: Vec<String> = columns.iter().map(|(n, _)| n.clone()).collect();
        check_symbols(&symbols)?;

        let mut data = Matrix::zeros(n_rows, columns.len());
        for (j, (_, col)) in columns.iter().enumerate() {
            for (i, &v) in col.iter().enumerate() {
                data.set(i, j, v);
            }
        }

        Ok(Self {
            dates,
            symbols,
            data,
        })
    }

    /// Aligns several series on the intersection of their dates.
    ///
    /// # Errors
    ///
    /// Returns an error if no series is given or symbols are not unique.
    /// Disjoint date ranges are not an error: the result simply has no rows.
    pub fn inner_join(series: &[(String, ReturnSeries)]) -> Result<Self> {
        let Some((_, first)) = series.first() else {
            return Err(AnalyticsError::invalid_parameter(
                "series",
                0,
                "at least one asset",
            ));
        };

        let dates: Vec<NaiveDate> = first
            .dates()
            .iter()
            .copied()
            .filter(|d| series[1..].iter().all(|(_, s)| s.get(*d).is_some()))
            .collect();

        let columns = series
            .iter()
            .map(|(symbol, s)| {
                let values = dates.iter().filter_map(|d| s.get(*d)).collect();
                (symbol.clone(), values)
            })
            .collect();

        Self::from_columns(dates, columns)
    }

    /// Shape as (observations, assets).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.data.shape()
    }

    /// Number of aligned observations.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.data.n_rows()
    }

    /// Number of assets.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.data.n_cols()
    }

    /// Asset symbols in column order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Date index.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Underlying row-major data.
    #[must_use]
    pub fn matrix(&self) -> &Matrix {
        &self.data
    }

    /// Column position of a symbol.
    #[must_use]
    pub fn column_index(&self, symbol: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// Returns for one asset.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::UnknownAsset`] if the symbol is absent.
    pub fn column(&self, symbol: &str) -> Result<Vec<f64>> {
        let idx = self
            .column_index(symbol)
            .ok_or_else(|| AnalyticsError::UnknownAsset {
                symbol: symbol.to_string(),
            })?;
        Ok(self.data.column(idx))
    }

    /// Column `idx` as a dated series, skipping missing values; `None` if
    /// `idx` is out of range.
    #[must_use]
    pub fn series(&self, idx: usize) -> Option<ReturnSeries> {
        if idx >= self.n_assets() {
            return None;
        }
        let (dates, values): (Vec<NaiveDate>, Vec<f64>) = self
            .dates
            .iter()
            .copied()
            .zip(self.data.column(idx))
            .filter(|(_, v)| v.is_finite())
            .unzip();
        Some(ReturnSeries::new(dates, values).unwrap_or_default())
    }

    /// Subset of columns in the requested order.
    ///
    /// # Errors
    ///
    /// Returns an error if a symbol is absent or the selection is empty.
    pub fn select(&self, symbols: &[&str]) -> Result<Self> {
        let columns = symbols
            .iter()
            .map(|s| Ok(((*s).to_string(), self.column(s)?)))
            .collect::<Result<Vec<_>>>()?;
        Self::from_columns(self.dates.clone(), columns)
    }

    /// True if no value is missing.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.data.as_slice().iter().all(|v| v.is_finite())
    }

    /// Copy without any row that holds a missing value.
    #[must_use]
    pub fn drop_incomplete_rows(&self) -> Self {
        if self.is_complete() {
            return self.clone();
        }
        let keep: Vec<usize> = (0..self.n_rows())
            .filter(|&r| self.data.row(r).iter().all(|v| v.is_finite()))
            .collect();

        let mut matrix = Matrix::zeros(keep.len(), self.n_assets());
        for (i, &r) in keep.iter().enumerate() {
            for (j, &v) in self.data.row(r).iter().enumerate() {
                matrix.set(i, j, v);
            }
        }

        Self {
            dates: keep.iter().map(|&r| self.dates[r]).collect(),
            symbols: self.symbols.clone(),
            data: matrix,
        }
    }

    /// Arithmetic mean return per asset (per period), ignoring missing values.
    #[must_use]
    pub fn mean_returns(&self) -> Vec<f64> {
        (0..self.n_assets())
            .map(|j| {
                let col: Vec<f64> = self
                    .data
                    .column(j)
                    .into_iter()
                    .filter(|v| v.is_finite())
                    .collect();
                if col.is_empty() {
                    0.0
                } else {
                    col.iter().sum::<f64>() / col.len() as f64
                }
            })
            .collect()
    }
}

fn check_symbols(symbols: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(symbols.len());
    for symbol in symbols {
        if symbol.is_empty() {
            return Err(AnalyticsError::invalid_parameter(
                "symbol",
                "\"\"",
                "non-empty asset identifiers",
            ));
        }
        if !seen.insert(symbol.as_str()) {
            return Err(AnalyticsError::invalid_parameter(
                "symbol",
                symbol,
                "unique asset identifiers",
            ));
        }
    }
    Ok(())
}
