//! Return and risk-adjusted performance measures.
//!
//! Rates passed in (`risk_free_rate`) are annual; `periods_per_year`
//! converts between periodic and annual figures (252 for daily data).
//!
//! Degenerate denominators are guarded rather than propagated as NaN:
//!
//! | measure  | zero denominator                                   |
//! |----------|----------------------------------------------------|
//! | Sharpe   | 0.0                                                |
//! | Sortino  | no downside: `+∞` if the excess return is positive, else 0.0; downside without dispersion: 0.0 |
//! | Calmar   | `+∞` if the annualized return is positive, else 0.0 |
//!
//! Rankings by Sharpe therefore treat flat series as neutral, while
//! Sortino and Calmar rank loss-free series above everything else.

use serde::{Deserialize, Serialize};

use super::descriptive::{kurtosis, sample_std, semideviation, skewness};
use super::drawdown::{max_drawdown, max_drawdown_duration, max_drawdown_value, DrawdownReport};
use super::tail::{conditional_var, value_at_risk};
use crate::config::AnalyticsConfig;
use crate::data::ReturnSeries;
use crate::error::Result;

/// Denominators at or below this are treated as zero.
const EPS: f64 = 1e-12;

/// Ratio with the "positive numerator over nothing is infinite" convention.
#[inline]
fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > EPS {
        numerator / denominator
    } else if numerator > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Compound return `∏(1 + r) − 1`.
///
/// # Example
///
/// ```
/// use folio_analytics::stats::total_return;
///
/// let r = total_return(&[0.10, -0.10]);
/// assert!((r - (-0.01)).abs() < 1e-12);
/// ```
#[must_use]
pub fn total_return(returns: &[f64]) -> f64 {
    returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// Geometric annualized return `(1 + total)^(periods_per_year / n) − 1`.
///
/// Needs at least two observations, else 0.0. A path that loses everything
/// annualizes to −1.0.
#[must_use]
pub fn annualized_return(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let growth = 1.0 + total_return(returns);
    if growth <= 0.0 {
        return -1.0;
    }
    growth.powf(periods_per_year / returns.len() as f64) - 1.0
}

/// [`annualized_return`] for a dated series; 0.0 unless it spans more than
/// zero calendar days.
#[must_use]
pub fn annualized_return_dated(series: &ReturnSeries, periods_per_year: f64) -> f64 {
    if series.span_days() <= 0 {
        return 0.0;
    }
    annualized_return(series.values(), periods_per_year)
}

/// Sample standard deviation of returns, optionally scaled by `sqrt(periods_per_year)`.
#[must_use]
pub fn volatility(returns: &[f64], annualize: bool, periods_per_year: f64) -> f64 {
    let std = sample_std(returns);
    if annualize {
        std * periods_per_year.sqrt()
    } else {
        std
    }
}

/// `(annualized_return − risk_free_rate) / annualized_volatility`.
///
/// Returns 0.0 when volatility is zero.
///
/// # Example
///
/// ```
/// use folio_analytics::stats::sharpe_ratio;
///
/// // A constant series has no volatility
/// assert_eq!(sharpe_ratio(&[0.001; 252], 0.0, 252.0), 0.0);
///
/// let returns = [0.01, 0.02, -0.01, 0.03, 0.01, -0.02, 0.02, 0.01];
/// assert!(sharpe_ratio(&returns, 0.02, 252.0) > 0.0);
/// ```
#[must_use]
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    let vol = volatility(returns, true, periods_per_year);
    if vol <= EPS {
        return 0.0;
    }
    (annualized_return(returns, periods_per_year) - risk_free_rate) / vol
}

/// Like [`sharpe_ratio`] but the denominator is the annualized sample
/// standard deviation of returns below the periodic risk-free rate.
///
/// With no downside observation the result is `+∞` when the excess return
/// is positive, else 0.0. Downside observations without dispersion (a
/// single one, or all equal) give 0.0.
#[must_use]
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64, periods_per_year: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }
    let threshold = risk_free_rate / periods_per_year;
    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < threshold).collect();
    let excess = annualized_return(returns, periods_per_year) - risk_free_rate;
    if downside.is_empty() {
        return guarded_ratio(excess, 0.0);
    }
    let downside_vol = sample_std(&downside) * periods_per_year.sqrt();
    if downside_vol <= EPS {
        return 0.0;
    }
    excess / downside_vol
}

/// `annualized_return / |max_drawdown|`.
#[must_use]
pub fn calmar_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    let mdd = max_drawdown_value(returns).abs();
    guarded_ratio(annualized_return(returns, periods_per_year), mdd)
}

/// Every single-series statistic in one serializable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Number of observations
    pub observations: usize,
    /// Compound return over the window
    pub total_return: f64,
    /// Geometric annualized return
    pub annualized_return: f64,
    /// Annualized sample volatility
    pub annualized_volatility: f64,
    /// Sharpe ratio against the configured risk-free rate
    pub sharpe_ratio: f64,
    /// Sortino ratio against the configured risk-free rate
    pub sortino_ratio: f64,
    /// Calmar ratio
    pub calmar_ratio: f64,
    /// Worst drawdown with dates
    pub drawdown: DrawdownReport,
    /// Longest under-water run, in periods
    pub max_drawdown_duration: usize,
    /// Historical 95% VaR (signed)
    pub value_at_risk_95: f64,
    /// Historical 95% CVaR (signed)
    pub conditional_var_95: f64,
    /// Population skewness
    pub skewness: f64,
    /// Population excess kurtosis
    pub kurtosis: f64,
    /// Standard deviation of negative returns
    pub semideviation: f64,
}

impl PerformanceSummary {
    /// Computes the summary for `series` under `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid.
    pub fn from_series(series: &ReturnSeries, config: &AnalyticsConfig) -> Result<Self> {
        config.validate()?;
        let r = series.values();
        let ppy = config.periods_per_year;
        let rf = config.risk_free_rate;
        let annualized = annualized_return_dated(series, ppy);
        let vol = volatility(r, true, ppy);
        let drawdown = max_drawdown(series);

        let (sharpe, sortino, calmar) = if series.span_days() > 0 {
            (
                sharpe_ratio(r, rf, ppy),
                sortino_ratio(r, rf, ppy),
                calmar_ratio(r, ppy),
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        Ok(Self {
            observations: series.len(),
            total_return: total_return(r),
            annualized_return: annualized,
            annualized_volatility: vol,
            sharpe_ratio: sharpe,
            sortino_ratio: sortino,
            calmar_ratio: calmar,
            drawdown,
            max_drawdown_duration: max_drawdown_duration(r),
            value_at_risk_95: value_at_risk(r, 0.95)?,
            conditional_var_95: conditional_var(r, 0.95)?,
            skewness: skewness(r),
            kurtosis: kurtosis(r),
            semideviation: semideviation(r),
        })
    }
}

#[cfg(test)]
#[path = "performance_tests.rs"]
mod tests;
