//! Efficient frontier by repeated target-return solves.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{OptimizationResult, PortfolioOptimizer, WeightBounds};
use crate::data::WeightVector;
use crate::error::{AnalyticsError, Result};

/// One solved point of the frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    /// Target return the point was solved for
    pub target_return: f64,
    /// Realized annualized return
    pub expected_return: f64,
    /// Annualized volatility
    pub volatility: f64,
    /// Sharpe ratio at the configured risk-free rate
    pub sharpe_ratio: f64,
    /// Portfolio weights
    pub weights: WeightVector,
}

/// Successfully solved frontier points, ascending by target return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EfficientFrontier {
    /// Solved points
    pub points: Vec<FrontierPoint>,
    /// Targets whose solve failed or did not converge
    pub skipped: usize,
}

impl EfficientFrontier {
    /// Number of solved points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if no point was solved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point with the lowest volatility.
    #[must_use]
    pub fn min_volatility(&self) -> Option<&FrontierPoint> {
        self.points
            .iter()
            .min_by(|a, b| a.volatility.total_cmp(&b.volatility))
    }

    /// The point with the highest Sharpe ratio.
    #[must_use]
    pub fn max_sharpe(&self) -> Option<&FrontierPoint> {
        self.points
            .iter()
            .max_by(|a, b| a.sharpe_ratio.total_cmp(&b.sharpe_ratio))
    }
}

impl From<(f64, OptimizationResult)> for FrontierPoint {
    fn from((target_return, result): (f64, OptimizationResult)) -> Self {
        Self {
            target_return,
            expected_return: result.expected_return,
            volatility: result.expected_volatility,
            sharpe_ratio: result.sharpe_ratio,
            weights: result.weights,
        }
    }
}

/// `num` targets evenly spaced over `[lo, hi]`; a single target when the
/// range is degenerate.
fn linspace_targets(lo: f64, hi: f64, num: usize) -> Vec<f64> {
    if num == 1 || hi - lo <= f64::EPSILON * lo.abs().max(hi.abs()).max(1.0) {
        return vec![lo];
    }
    let step = (hi - lo) / (num - 1) as f64;
    (0..num)
        .map(|i| if i == num - 1 { hi } else { lo + step * i as f64 })
        .collect()
}

impl PortfolioOptimizer {
    /// Traces the efficient frontier.
    ///
    /// Targets are `num_portfolios` returns evenly spaced between the lowest
    /// and highest single-asset expected return; each is solved with
    /// [`mean_variance_optimization`](Self::mean_variance_optimization) on a
    /// rayon worker. Points that fail or do not converge are skipped and
    /// counted in [`EfficientFrontier::skipped`]. When all assets share one
    /// expected return the frontier has a single target.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidParameter`] for `num_portfolios == 0`
    /// or invalid bounds, and [`AnalyticsError::InsufficientData`] for too
    /// little data. Per-point failures never abort the frontier.
    pub fn efficient_frontier(
        &self,
        num_portfolios: usize,
        bounds: WeightBounds,
    ) -> Result<EfficientFrontier> {
        if num_portfolios == 0 {
            return Err(AnalyticsError::invalid_parameter(
                "num_portfolios",
                num_portfolios,
                ">= 1",
            ));
        }
        let mu = self.expected_returns()?;
        bounds.validate(mu.len())?;
        let lo = mu.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = mu.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let targets = linspace_targets(lo, hi, num_portfolios);

        let solved: Vec<Option<FrontierPoint>> = targets
            .par_iter()
            .map(|&target| {
                match self.mean_variance_optimization(Some(target), None, bounds) {
                    Ok(result) if result.success => Some((target, result).into()),
                    Ok(_) => None,
                    Err(err) => {
                        tracing::debug!(target, error = %err, "frontier point failed");
                        None
                    }
                }
            })
            .collect();

        let requested = solved.len();
        let mut points: Vec<FrontierPoint> = solved.into_iter().flatten().collect();
        points.sort_by(|a, b| a.target_return.total_cmp(&b.target_return));
        let skipped = requested - points.len();
        if skipped > 0 {
            tracing::warn!(skipped, requested, "skipped efficient frontier points");
        }
        Ok(EfficientFrontier { points, skipped })
    }
}
