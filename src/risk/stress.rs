//! Scenario shocks applied to a portfolio.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::WeightVector;
use crate::error::{AnalyticsError, Result};

/// Outcome of applying one shock scenario to a portfolio worth 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    /// Pre-shock value, always 1.0
    pub baseline_value: f64,
    /// Post-shock value including cash
    pub stressed_value: f64,
    /// `stressed_value − baseline_value`
    pub value_change: f64,
    /// Untouched cash weight `1 − Σw`
    pub cash_weight: f64,
    /// Post-shock value of each held asset
    pub asset_values: BTreeMap<String, f64>,
    /// Shocked symbols not held by the portfolio, ignored
    pub ignored: Vec<String>,
}

/// Applies per-asset fractional shocks to a subset of holdings.
///
/// Shocked assets are worth `w_i (1 + s_i)` afterwards, unshocked assets
/// keep `w_i`, and the cash weight `1 − Σw` is unaffected.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] for a non-finite shock.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use folio_analytics::data::WeightVector;
/// use folio_analytics::risk::stress_test;
///
/// let weights = WeightVector::from_pairs([("EQ", 0.6), ("BOND", 0.3)]).expect("valid");
/// let shocks = BTreeMap::from([("EQ".to_string(), -0.30)]);
///
/// let result = stress_test(&weights, &shocks).expect("finite shocks");
/// assert!((result.value_change + 0.18).abs() < 1e-12);
/// assert!((result.cash_weight - 0.1).abs() < 1e-12);
/// ```
pub fn stress_test(weights: &WeightVector, shocks: &BTreeMap<String, f64>) -> Result<StressResult> {
    if let Some((symbol, shock)) = shocks.iter().find(|(_, s)| !s.is_finite()) {
        return Err(AnalyticsError::invalid_parameter(
            &format!("shock[{symbol}]"),
            shock,
            "a finite fractional return",
        ));
    }

    let asset_values: BTreeMap<String, f64> = weights
        .iter()
        .map(|(symbol, w)| {
            let shock = shocks.get(symbol).copied().unwrap_or(0.0);
            (symbol.to_string(), w * (1.0 + shock))
        })
        .collect();

    let ignored: Vec<String> = shocks
        .keys()
        .filter(|s| weights.get(s).is_none())
        .cloned()
        .collect();
    if !ignored.is_empty() {
        tracing::debug!(?ignored, "stress shocks for assets not held");
    }

    let cash_weight = 1.0 - weights.sum();
    let stressed_value = asset_values.values().sum::<f64>() + cash_weight;
    let baseline_value = 1.0;

    Ok(StressResult {
        baseline_value,
        stressed_value,
        value_change: stressed_value - baseline_value,
        cash_weight,
        asset_values,
        ignored,
    })
}
