//! Portfolio weights keyed by asset identifier.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Mapping from asset identifier to weight, in insertion order.
///
/// The risk functions accept arbitrary finite weights (for stress and
/// decomposition purposes); sum-to-one and bounds are the optimizer's job.
/// Serializes as a JSON object `{"SYMBOL": weight, ...}`.
///
/// # Example
///
/// ```
/// use folio_analytics::data::WeightVector;
///
/// let w = WeightVector::from_pairs([("AAA", 0.6), ("BBB", 0.4)]).expect("unique symbols");
/// assert_eq!(w.get("BBB"), Some(0.4));
/// assert!((w.sum() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct WeightVector {
    entries: Vec<(String, f64)>,
}

impl WeightVector {
    /// Pairs symbols with weights positionally.
    ///
    /// # Errors
    ///
    /// Returns an error if lengths differ, a symbol repeats, or a weight is non-finite.
    pub fn new(symbols: &[String], weights: &[f64]) -> Result<Self> {
        if symbols.len() != weights.len() {
            return Err(AnalyticsError::dimension_mismatch(
                "weights",
                symbols.len(),
                weights.len(),
            ));
        }
        Self::from_pairs(symbols.iter().cloned().zip(weights.iter().copied()))
    }

    /// Builds weights from `(symbol, weight)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if a symbol repeats or a weight is non-finite.
    pub fn from_pairs<S, I>(pairs: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, f64)>,
    {
        let mut seen = HashSet::new();
        let mut entries = Vec::new();
        for (symbol, weight) in pairs {
            let symbol = symbol.into();
            if !weight.is_finite() {
                return Err(AnalyticsError::invalid_parameter(
                    &format!("weight[{symbol}]"),
                    weight,
                    "a finite number",
                ));
            }
            if !seen.insert(symbol.clone()) {
                return Err(AnalyticsError::invalid_parameter(
                    "symbol",
                    symbol,
                    "unique asset identifiers",
                ));
            }
            entries.push((symbol, weight));
        }
        Ok(Self { entries })
    }

    /// Wraps entries whose symbols are known to be unique.
    pub(crate) fn from_entries(entries: Vec<(String, f64)>) -> Self {
        Self { entries }
    }

    /// Equal weights `1/n` over the given symbols.
    ///
    /// # Errors
    ///
    /// Returns an error if a symbol repeats.
    pub fn equal(symbols: &[String]) -> Result<Self> {
        let w = if symbols.is_empty() {
            0.0
        } else {
            1.0 / symbols.len() as f64
        };
        Self::from_pairs(symbols.iter().map(|s| (s.clone(), w)))
    }

    /// Weight of one asset.
    #[must_use]
    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, w)| *w)
    }

    /// Number of assets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if there are no assets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Symbols in insertion order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    /// Weights in insertion order.
    #[must_use]
    pub fn weights(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, w)| *w).collect()
    }

    /// Iterate over `(symbol, weight)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.entries.iter().map(|(s, w)| (s.as_str(), *w))
    }

    /// Sum of all weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, w)| w).sum()
    }

    /// Weights reordered to match `symbols`; absent symbols get 0.0.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::UnknownAsset`] if this vector holds a symbol
    /// that `symbols` does not.
    pub fn aligned_to(&self, symbols: &[String]) -> Result<Vec<f64>> {
        if let Some((unknown, _)) = self
            .entries
            .iter()
            .find(|(s, _)| !symbols.iter().any(|t| t == s))
        {
            return Err(AnalyticsError::UnknownAsset {
                symbol: unknown.clone(),
            });
        }
        Ok(symbols
            .iter()
            .map(|s| self.get(s).unwrap_or(0.0))
            .collect())
    }
}

impl From<BTreeMap<String, f64>> for WeightVector {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self {
            entries: map.into_iter().collect(),
        }
    }
}

impl From<WeightVector> for BTreeMap<String, f64> {
    fn from(weights: WeightVector) -> Self {
        weights.entries.into_iter().collect()
    }
}
