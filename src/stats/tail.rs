//! Historical Value at Risk and Conditional Value at Risk.
//!
//! Both are reported as signed returns: a 95% VaR of −0.02 means the worst
//! 5% of periods lost at least 2%. They are not negated into a positive loss.

use super::descriptive::{mean, percentile};
use crate::error::{AnalyticsError, Result};

fn check_confidence(confidence: f64) -> Result<()> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(AnalyticsError::invalid_parameter(
            "confidence",
            confidence,
            "a level strictly between 0 and 1",
        ))
    }
}

/// Empirical VaR: the `1 − confidence` percentile of `returns`.
///
/// Returns 0.0 for an empty sample.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] if `confidence` is outside `(0, 1)`.
///
/// # Example
///
/// ```
/// use folio_analytics::stats::value_at_risk;
///
/// let returns: Vec<f64> = (1..=100).map(|i| (i as f64 - 50.0) / 1000.0).collect();
/// let var = value_at_risk(&returns, 0.95).expect("valid confidence");
/// assert!(var < 0.0);
/// assert!(value_at_risk(&returns, 1.0).is_err());
/// ```
pub fn value_at_risk(returns: &[f64], confidence: f64) -> Result<f64> {
    check_confidence(confidence)?;
    Ok(percentile(returns, 1.0 - confidence))
}

/// Expected shortfall: the mean of observations at or below the VaR.
///
/// Falls back to the VaR itself when no observation qualifies, so the
/// result is never above the VaR.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] if `confidence` is outside `(0, 1)`.
pub fn conditional_var(returns: &[f64], confidence: f64) -> Result<f64> {
    let var = value_at_risk(returns, confidence)?;
    let tail: Vec<f64> = returns.iter().copied().filter(|r| *r <= var).collect();
    if tail.is_empty() {
        return Ok(var);
    }
    Ok(mean(&tail).min(var))
}
