//! Time-indexed periodic return series for a single asset.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Periodic (typically daily) fractional returns indexed by date.
///
/// Invariants: dates strictly increasing, values finite.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use folio_analytics::data::ReturnSeries;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date");
/// let series = ReturnSeries::from_prices(
///     vec![d(2), d(3), d(4)],
///     &[100.0, 110.0, 99.0],
/// ).expect("valid prices");
///
/// assert_eq!(series.len(), 2);
/// assert!((series.values()[0] - 0.10).abs() < 1e-12);
/// assert!((series.values()[1] + 0.10).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReturnSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl ReturnSeries {
    /// Creates a series from already-computed returns.
    ///
    /// # Errors
    ///
    /// Returns an error if lengths differ, dates are not strictly increasing,
    /// or any value is non-finite.
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(AnalyticsError::dimension_mismatch(
                "return values",
                dates.len(),
                values.len(),
            ));
        }
        check_increasing(&dates)?;
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(AnalyticsError::invalid_parameter(
                "values",
                format!("{} at {}", values[pos], dates[pos]),
                "finite returns",
            ));
        }
        Ok(Self { dates, values })
    }

    /// Derives simple returns `p_t / p_{t-1} - 1` from a price history.
    ///
    /// The first observation has no predecessor and is dropped, as is any
    /// return that comes out non-finite (a zero or missing previous price).
    ///
    /// # Errors
    ///
    /// Returns an error if lengths differ or dates are not strictly increasing.
    pub fn from_prices(dates: Vec<NaiveDate>, prices: &[f64]) -> Result<Self> {
        if dates.len() != prices.len() {
            return Err(AnalyticsError::dimension_mismatch(
                "prices",
                dates.len(),
                prices.len(),
            ));
        }
        check_increasing(&dates)?;

        let mut out_dates = Vec::with_capacity(dates.len().saturating_sub(1));
        let mut out_values = Vec::with_capacity(dates.len().saturating_sub(1));
        for (i, w) in prices.windows(2).enumerate() {
            let r = w[1] / w[0] - 1.0;
            if r.is_finite() {
                out_dates.push(dates[i + 1]);
                out_values.push(r);
            }
        }

        Ok(Self {
            dates: out_dates,
            values: out_values,
        })
    }

    /// Series with no observations.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Observation dates.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Return values.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// First observation date.
    #[must_use]
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    /// Last observation date.
    #[must_use]
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Calendar days between the first and last observation.
    #[must_use]
    pub fn span_days(&self) -> i64 {
        match (self.first_date(), self.last_date()) {
            (Some(first), Some(last)) => (last - first).num_days(),
            _ => 0,
        }
    }

    /// Value on a given date.
    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }

    /// Observations within `[start, end]`; `None` leaves that side open.
    #[must_use]
    pub fn window(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let lo = start.map_or(0, |s| self.dates.partition_point(|d| *d < s));
        let hi = end.map_or(self.dates.len(), |e| self.dates.partition_point(|d| *d <= e));
        if lo >= hi {
            return Self::empty();
        }
        Self {
            dates: self.dates[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
        }
    }

    /// Iterate over `(date, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }
}

pub(crate) fn check_increasing(dates: &[NaiveDate]) -> Result<()> {
    if let Some(pos) = dates.windows(2).position(|w| w[1] <= w[0]) {
        return Err(AnalyticsError::invalid_parameter(
            "dates",
            format!("{} followed by {}", dates[pos], dates[pos + 1]),
            "strictly increasing dates without duplicates",
        ));
    }
    Ok(())
}
