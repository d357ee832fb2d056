//! Portfolio variance and its attribution to individual assets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::covariance::CovarianceMatrix;
use crate::data::WeightVector;
use crate::error::Result;
use crate::primitives::Matrix;

/// Replacement for a negative `wᵗΣw` produced by rounding noise.
pub const VARIANCE_FLOOR: f64 = 1e-12;

/// `Σw`, assuming matching dimensions.
pub(crate) fn sigma_w(sigma: &Matrix, w: &[f64]) -> Vec<f64> {
    (0..sigma.n_rows())
        .map(|i| {
            sigma
                .row(i)
                .iter()
                .zip(w)
                .map(|(s, x)| s * x)
                .sum::<f64>()
        })
        .collect()
}

/// `wᵗΣw` with the negative-noise guard, assuming matching dimensions.
///
/// A negative result (a covariance that is not quite PSD) is clamped to
/// [`VARIANCE_FLOOR`] and reported with a warning.
pub(crate) fn guarded_variance(sigma: &Matrix, w: &[f64]) -> f64 {
    checked_variance(sigma, w).0
}

/// Guarded `wᵗΣw` and whether it is degenerate, i.e. the raw quadratic
/// form is at or below [`VARIANCE_FLOOR`].
fn checked_variance(sigma: &Matrix, w: &[f64]) -> (f64, bool) {
    let var: f64 = sigma_w(sigma, w).iter().zip(w).map(|(s, x)| s * x).sum();
    if var < 0.0 {
        tracing::warn!(
            variance = var,
            "negative portfolio variance from ill-conditioned covariance, clamping"
        );
        return (VARIANCE_FLOOR, true);
    }
    (var, var <= VARIANCE_FLOOR)
}

/// `wᵗΣw` for weights keyed by symbol.
///
/// Weights for assets absent from `weights` count as zero.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnknownAsset`] if `weights` holds a symbol the
/// covariance does not.
///
/// [`AnalyticsError::UnknownAsset`]: crate::AnalyticsError::UnknownAsset
pub fn portfolio_variance(weights: &WeightVector, cov: &CovarianceMatrix) -> Result<f64> {
    let w = weights.aligned_to(cov.symbols())?;
    Ok(guarded_variance(cov.matrix(), &w))
}

/// Per-asset risk attribution of a portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDecomposition {
    /// Asset symbols, in covariance order
    pub symbols: Vec<String>,
    /// Aligned weights
    pub weights: Vec<f64>,
    /// Marginal contribution `(Σw)_i`
    pub marginal: Vec<f64>,
    /// Absolute contribution to volatility `w_i (Σw)_i / σ_p`; sums to `σ_p`
    pub contribution: Vec<f64>,
    /// Share of variance `w_i (Σw)_i / wᵗΣw`; sums to 1 when variance is positive
    pub percentage: Vec<f64>,
    /// `wᵗΣw`
    pub portfolio_variance: f64,
    /// `sqrt(wᵗΣw)`
    pub portfolio_volatility: f64,
}

impl RiskDecomposition {
    /// Percentage contributions keyed by symbol.
    #[must_use]
    pub fn percentage_map(&self) -> BTreeMap<String, f64> {
        self.symbols
            .iter()
            .cloned()
            .zip(self.percentage.iter().copied())
            .collect()
    }

    /// Sum of percentage contributions.
    #[must_use]
    pub fn total_percentage(&self) -> f64 {
        self.percentage.iter().sum()
    }
}

/// Slice-level decomposition used by the optimizer.
pub(crate) fn decompose(sigma: &Matrix, w: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>, f64) {
    let marginal = sigma_w(sigma, w);
    let (variance, degenerate) = checked_variance(sigma, w);
    if degenerate {
        let zeros = vec![0.0; w.len()];
        return (marginal, zeros.clone(), zeros, variance);
    }
    let vol = variance.sqrt();
    let raw: Vec<f64> = w.iter().zip(&marginal).map(|(x, m)| x * m).collect();
    let contribution = raw.iter().map(|r| r / vol).collect();
    let percentage = raw.iter().map(|r| r / variance).collect();
    (marginal, contribution, percentage, variance)
}

/// Marginal and total risk contribution per asset.
///
/// When the portfolio variance is zero, or negative noise had to be
/// clamped, every contribution is 0.0.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnknownAsset`] if `weights` holds a symbol the
/// covariance does not.
///
/// [`AnalyticsError::UnknownAsset`]: crate::AnalyticsError::UnknownAsset
///
/// # Example
///
/// ```
/// use folio_analytics::data::WeightVector;
/// use folio_analytics::primitives::Matrix;
/// use folio_analytics::risk::{risk_contribution, CovarianceMatrix};
///
/// let symbols = vec!["A".to_string(), "B".to_string()];
/// let cov = CovarianceMatrix::new(symbols.clone(), Matrix::diag(&[0.04, 0.01]), true)
///     .expect("square");
/// let w = WeightVector::new(&symbols, &[0.5, 0.5]).expect("valid");
///
/// let rc = risk_contribution(&w, &cov).expect("known symbols");
/// assert!((rc.total_percentage() - 1.0).abs() < 1e-12);
/// assert!((rc.percentage[0] - 0.8).abs() < 1e-12);
/// ```
pub fn risk_contribution(weights: &WeightVector, cov: &CovarianceMatrix) -> Result<RiskDecomposition> {
    let w = weights.aligned_to(cov.symbols())?;
    let (marginal, contribution, percentage, variance) = decompose(cov.matrix(), &w);
    Ok(RiskDecomposition {
        symbols: cov.symbols().to_vec(),
        weights: w,
        marginal,
        contribution,
        percentage,
        portfolio_variance: variance,
        portfolio_volatility: variance.sqrt(),
    })
}

/// Weight concentration of a portfolio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConcentrationReport {
    /// Herfindahl-Hirschman index `Σw²`
    pub hhi: f64,
    /// Effective number of assets `1 / HHI` (0.0 when HHI is 0)
    pub effective_assets: f64,
    /// Largest single weight
    pub max_weight: f64,
    /// Asset holding the largest weight
    pub max_weight_asset: Option<String>,
}

/// Herfindahl index, effective number of assets and largest position.
#[must_use]
pub fn concentration_risk(weights: &WeightVector) -> ConcentrationReport {
    let hhi: f64 = weights.iter().map(|(_, w)| w * w).sum();
    let max = weights
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1));
    ConcentrationReport {
        hhi,
        effective_assets: if hhi > 0.0 { 1.0 / hhi } else { 0.0 },
        max_weight: max.map_or(0.0, |(_, w)| w),
        max_weight_asset: max.map(|(s, _)| s.to_string()),
    }
}

/// Weighted average volatility over portfolio volatility.
///
/// Equals 1.0 for perfectly correlated assets and grows with
/// diversification; 0.0 for a zero-variance portfolio.
///
/// # Errors
///
/// Returns [`AnalyticsError::UnknownAsset`] if `weights` holds a symbol the
/// covariance does not.
///
/// [`AnalyticsError::UnknownAsset`]: crate::AnalyticsError::UnknownAsset
pub fn diversification_ratio(weights: &WeightVector, cov: &CovarianceMatrix) -> Result<f64> {
    let w = weights.aligned_to(cov.symbols())?;
    let (variance, degenerate) = checked_variance(cov.matrix(), &w);
    if degenerate {
        return Ok(0.0);
    }
    let weighted: f64 = w
        .iter()
        .zip(cov.volatilities())
        .map(|(x, v)| x * v)
        .sum();
    Ok(weighted / variance.sqrt())
}
