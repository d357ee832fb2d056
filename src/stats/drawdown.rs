//! Drawdown analysis of a compounded return path.
//!
//! The wealth path is the cumulative product of `1 + r`; drawdown at each
//! step is `wealth / running_max − 1`, so it is never positive.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::ReturnSeries;

/// Worst peak-to-trough decline with its dates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownReport {
    /// Minimum drawdown, a fraction `<= 0` (−0.25 is a 25% decline)
    pub max_drawdown: f64,
    /// Date of the running maximum preceding the trough
    pub peak: Option<NaiveDate>,
    /// Date of the minimum drawdown
    pub trough: Option<NaiveDate>,
    /// First date after the trough at which wealth regains the peak
    pub recovery: Option<NaiveDate>,
}

/// Cumulative wealth path starting from the first return.
#[must_use]
pub fn wealth_path(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect()
}

/// Drawdown at every observation, each `<= 0`.
///
/// # Example
///
/// ```
/// use folio_analytics::stats::drawdown_series;
///
/// let dd = drawdown_series(&[0.10, -0.20, 0.05]);
/// assert_eq!(dd[0], 0.0);
/// assert!((dd[1] + 0.20).abs() < 1e-12);
/// assert!((dd[2] + 0.16).abs() < 1e-12);
/// ```
#[must_use]
pub fn drawdown_series(returns: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    wealth_path(returns)
        .into_iter()
        .map(|w| {
            peak = peak.max(w);
            if peak > 0.0 {
                (w / peak - 1.0).min(0.0)
            } else {
                0.0
            }
        })
        .collect()
}

/// Index of the trough and of its preceding peak; `None` without decline.
fn worst_drawdown(wealth: &[f64]) -> Option<(f64, usize, usize)> {
    let mut peak_idx = 0;
    let mut worst: Option<(f64, usize, usize)> = None;
    for (i, &w) in wealth.iter().enumerate() {
        if w > wealth[peak_idx] {
            peak_idx = i;
        }
        let peak = wealth[peak_idx];
        if peak <= 0.0 {
            continue;
        }
        let dd = (w / peak - 1.0).min(0.0);
        if dd < worst.map_or(0.0, |(v, _, _)| v) {
            worst = Some((dd, peak_idx, i));
        }
    }
    worst
}

/// Maximum drawdown of a dated series.
///
/// A series that never declines reports 0.0 with no dates. The recovery
/// date is `None` while wealth stays below the pre-drawdown peak.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use folio_analytics::data::ReturnSeries;
/// use folio_analytics::stats::max_drawdown;
///
/// let d = |day| NaiveDate::from_ymd_opt(2024, 2, day).expect("valid date");
/// let series = ReturnSeries::new(
///     vec![d(1), d(2), d(5), d(6)],
///     vec![0.10, -0.50, 0.50, 0.40],
/// ).expect("valid");
///
/// let report = max_drawdown(&series);
/// assert!((report.max_drawdown + 0.50).abs() < 1e-12);
/// assert_eq!(report.peak, Some(d(1)));
/// assert_eq!(report.trough, Some(d(2)));
/// assert_eq!(report.recovery, Some(d(6)));
/// ```
#[must_use]
pub fn max_drawdown(series: &ReturnSeries) -> DrawdownReport {
    let wealth = wealth_path(series.values());
    let Some((dd, peak_idx, trough_idx)) = worst_drawdown(&wealth) else {
        return DrawdownReport::default();
    };
    let dates = series.dates();
    let peak_value = wealth[peak_idx];
    let recovery = wealth[trough_idx + 1..]
        .iter()
        .position(|w| *w >= peak_value)
        .map(|offset| dates[trough_idx + 1 + offset]);

    DrawdownReport {
        max_drawdown: dd,
        peak: Some(dates[peak_idx]),
        trough: Some(dates[trough_idx]),
        recovery,
    }
}

/// Maximum drawdown value of an undated return slice, `<= 0`.
#[must_use]
pub fn max_drawdown_value(returns: &[f64]) -> f64 {
    worst_drawdown(&wealth_path(returns)).map_or(0.0, |(dd, _, _)| dd)
}

/// Longest run of consecutive observations spent below a prior peak.
#[must_use]
pub fn max_drawdown_duration(returns: &[f64]) -> usize {
    let mut peak = f64::NEG_INFINITY;
    let mut current = 0;
    let mut longest = 0;
    for w in wealth_path(returns) {
        if w >= peak {
            peak = w;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}
