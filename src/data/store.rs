//! Return data collaborators: the [`ReturnSource`] interface and an
//! in-memory store implementing it.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use super::{ReturnMatrix, ReturnSeries};
use crate::error::{AnalyticsError, Result};

/// Anything that can hand out periodic returns for an asset.
///
/// Market-data fetching lives behind this trait; the analytics only ever
/// see already-fetched, consistently denominated returns.
pub trait ReturnSource {
    /// Returns for one asset within `[start, end]` (open-ended on `None`).
    ///
    /// # Errors
    ///
    /// Implementations return [`AnalyticsError::UnknownAsset`] for assets
    /// they do not know.
    fn get_returns(
        &self,
        asset_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ReturnSeries>;

    /// Aligned returns for several assets on their common dates.
    ///
    /// # Errors
    ///
    /// Propagates lookup errors; fails on an empty or duplicated symbol list.
    fn return_matrix(
        &self,
        symbols: &[&str],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ReturnMatrix> {
        let series = symbols
            .iter()
            .map(|s| Ok(((*s).to_string(), self.get_returns(s, start, end)?)))
            .collect::<Result<Vec<_>>>()?;
        ReturnMatrix::inner_join(&series)
    }
}

/// In-memory return series keyed by asset identifier.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use folio_analytics::data::{ReturnSeriesStore, ReturnSource};
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 5, day).expect("valid date");
/// let mut store = ReturnSeriesStore::new();
/// store
///     .insert_prices("AAA", vec![d(1), d(2), d(3)], &[10.0, 10.5, 10.0])
///     .expect("valid prices");
///
/// let returns = store.get_returns("AAA", Some(d(3)), None).expect("known asset");
/// assert_eq!(returns.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ReturnSeriesStore {
    series: BTreeMap<String, ReturnSeries>,
}

impl ReturnSeriesStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a return series, replacing any previous one for the asset.
    pub fn insert(&mut self, asset_id: impl Into<String>, series: ReturnSeries) -> Option<ReturnSeries> {
        self.series.insert(asset_id.into(), series)
    }

    /// Derive returns from a price history and store them.
    ///
    /// # Errors
    ///
    /// Returns an error if the price history is malformed.
    pub fn insert_prices(
        &mut self,
        asset_id: impl Into<String>,
        dates: Vec<NaiveDate>,
        prices: &[f64],
    ) -> Result<()> {
        let series = ReturnSeries::from_prices(dates, prices)?;
        self.series.insert(asset_id.into(), series);
        Ok(())
    }

    /// Known asset identifiers, sorted.
    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.series.keys().map(String::as_str)
    }

    /// True if the asset is known.
    #[must_use]
    pub fn contains(&self, asset_id: &str) -> bool {
        self.series.contains_key(asset_id)
    }

    /// Number of stored assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// True if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl ReturnSource for ReturnSeriesStore {
    fn get_returns(
        &self,
        asset_id: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ReturnSeries> {
        self.series
            .get(asset_id)
            .map(|s| s.window(start, end))
            .ok_or_else(|| AnalyticsError::UnknownAsset {
                symbol: asset_id.to_string(),
            })
    }
}
