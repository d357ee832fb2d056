//! Constant Proportion Portfolio Insurance (CPPI) paths.
//!
//! The portfolio starts at 1.0 with a fixed floor value. Each period
//!
//! ```text
//! cushion  = max(value − floor, 0)
//! exposure = min(multiplier · cushion, 1)
//! value   *= 1 + exposure · r_risky + (1 − exposure) · r_safe
//! ```
//!
//! with `r_risky ~ N(mean, std)` and a constant per-period safe return.
//!
//! Reference: Black & Perold (1992), "Theory of Constant Proportion
//! Portfolio Insurance"

use serde::{Deserialize, Serialize};

use super::simulate::{run_blocks, validate_distribution};
use super::MonteCarloRng;
use crate::control::StopToken;
use crate::error::{AnalyticsError, Result};
use crate::stats::{mean, percentile_sorted};

/// CPPI strategy and return-distribution parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CppiParams {
    /// Mean periodic return of the risky asset
    pub mean: f64,
    /// Standard deviation of the risky asset's periodic return
    pub std: f64,
    /// Cushion multiplier
    pub multiplier: f64,
    /// Floor as a fraction of the initial value 1.0
    pub floor: f64,
    /// Number of periods simulated
    pub time_horizon: usize,
    /// Periodic return of the safe asset
    pub safe_return: f64,
}

impl CppiParams {
    /// Parameters for a risky asset `N(mean, std)` with multiplier 3,
    /// floor 0.8, a 252-period horizon and a zero safe return.
    #[must_use]
    pub fn new(mean: f64, std: f64) -> Self {
        Self {
            mean,
            std,
            multiplier: 3.0,
            floor: 0.8,
            time_horizon: 252,
            safe_return: 0.0,
        }
    }

    /// Set the cushion multiplier
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Set the floor fraction
    #[must_use]
    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = floor;
        self
    }

    /// Set the number of periods
    #[must_use]
    pub fn with_time_horizon(mut self, time_horizon: usize) -> Self {
        self.time_horizon = time_horizon;
        self
    }

    /// Set the periodic safe-asset return
    #[must_use]
    pub fn with_safe_return(mut self, safe_return: f64) -> Self {
        self.safe_return = safe_return;
        self
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        validate_distribution(self.mean, self.std, 1, self.time_horizon)?;
        if !(self.multiplier.is_finite() && self.multiplier >= 0.0) {
            return Err(AnalyticsError::invalid_parameter(
                "multiplier",
                self.multiplier,
                "a non-negative finite number",
            ));
        }
        if !(self.floor.is_finite() && (0.0..1.0).contains(&self.floor)) {
            return Err(AnalyticsError::invalid_parameter("floor", self.floor, "in [0, 1)"));
        }
        if !(self.safe_return.is_finite() && self.safe_return > -1.0) {
            return Err(AnalyticsError::invalid_parameter(
                "safe_return",
                self.safe_return,
                "a finite number > -1",
            ));
        }
        Ok(())
    }
}

/// One simulated CPPI path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CppiPath {
    /// Portfolio value at each period, starting with 1.0
    pub values: Vec<f64>,
    /// Risky exposure chosen at each period
    pub exposures: Vec<f64>,
    /// Floor value
    pub floor_value: f64,
    /// Value after the last period
    pub final_value: f64,
    /// Highest value along the path
    pub max_value: f64,
    /// Lowest value along the path
    pub min_value: f64,
    /// True if the value ever fell below the floor
    pub floor_breached: bool,
    /// Worst peak-to-trough decline along the path, `<= 0`
    pub max_drawdown: f64,
}

fn generate_path(params: &CppiParams, rng: &mut MonteCarloRng) -> CppiPath {
    let floor_value = params.floor;
    let mut value = 1.0_f64;
    let mut values = Vec::with_capacity(params.time_horizon + 1);
    let mut exposures = Vec::with_capacity(params.time_horizon);
    values.push(value);

    let (mut peak, mut max_drawdown) = (value, 0.0_f64);
    let (mut max_value, mut min_value) = (value, value);

    for _ in 0..params.time_horizon {
        let cushion = (value - floor_value).max(0.0);
        let exposure = (cushion * params.multiplier).min(1.0);
        let risky = rng.normal(params.mean, params.std);
        value *= 1.0 + exposure * risky + (1.0 - exposure) * params.safe_return;

        peak = peak.max(value);
        if peak > 0.0 {
            max_drawdown = max_drawdown.min(value / peak - 1.0);
        }
        max_value = max_value.max(value);
        min_value = min_value.min(value);
        exposures.push(exposure);
        values.push(value);
    }

    CppiPath {
        values,
        exposures,
        floor_value,
        final_value: value,
        max_value,
        min_value,
        floor_breached: min_value < floor_value,
        max_drawdown,
    }
}

/// Simulates one CPPI path.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] for invalid parameters.
///
/// # Example
///
/// ```
/// use folio_analytics::monte_carlo::{cppi_path, CppiParams};
///
/// let params = CppiParams::new(0.0004, 0.01).with_time_horizon(60);
/// let path = cppi_path(&params, 7).expect("valid parameters");
/// assert_eq!(path.values.len(), 61);
/// assert_eq!(path.values[0], 1.0);
/// assert!(path.exposures.iter().all(|e| (0.0..=1.0).contains(e)));
/// ```
pub fn cppi_path(params: &CppiParams, seed: u64) -> Result<CppiPath> {
    params.validate()?;
    Ok(generate_path(params, &mut MonteCarloRng::new(seed)))
}

/// Outcome distribution of many CPPI paths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CppiSummary {
    /// Paths simulated
    pub paths: usize,
    /// Mean final value
    pub mean_final_value: f64,
    /// Median final value
    pub median_final_value: f64,
    /// 5th percentile of final values
    pub p5_final_value: f64,
    /// 95th percentile of final values
    pub p95_final_value: f64,
    /// Lowest final value
    pub min_final_value: f64,
    /// Highest final value
    pub max_final_value: f64,
    /// Fraction of paths that breached the floor
    pub breach_probability: f64,
    /// Mean of the per-path maximum drawdowns
    pub mean_max_drawdown: f64,
    /// Worst per-path maximum drawdown
    pub worst_max_drawdown: f64,
}

/// Simulates `paths` CPPI paths in parallel blocks and summarizes them.
///
/// Reproducible for a given `seed` regardless of thread count; `stop` is
/// polled between blocks.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] for invalid parameters or
/// zero paths, and [`AnalyticsError::Cancelled`] or
/// [`AnalyticsError::DeadlineExceeded`] when stopped.
pub fn cppi_simulation(
    params: &CppiParams,
    paths: usize,
    seed: u64,
    stop: Option<&StopToken>,
) -> Result<CppiSummary> {
    params.validate()?;
    if paths == 0 {
        return Err(AnalyticsError::invalid_parameter("paths", paths, ">= 1"));
    }
    tracing::debug!(paths, time_horizon = params.time_horizon, seed, "running cppi simulation");

    let outcomes = run_blocks(paths, seed, stop, |rng, n| {
        (0..n)
            .map(|_| {
                let path = generate_path(params, rng);
                (path.final_value, path.floor_breached, path.max_drawdown)
            })
            .collect()
    })?;

    let mut finals: Vec<f64> = outcomes.iter().map(|(v, _, _)| *v).collect();
    finals.sort_by(f64::total_cmp);
    let drawdowns: Vec<f64> = outcomes.iter().map(|(_, _, dd)| *dd).collect();
    let breaches = outcomes.iter().filter(|(_, breached, _)| *breached).count();

    Ok(CppiSummary {
        paths,
        mean_final_value: mean(&finals),
        median_final_value: percentile_sorted(&finals, 0.50),
        p5_final_value: percentile_sorted(&finals, 0.05),
        p95_final_value: percentile_sorted(&finals, 0.95),
        min_final_value: finals[0],
        max_final_value: finals[paths - 1],
        breach_probability: breaches as f64 / paths as f64,
        mean_max_drawdown: mean(&drawdowns),
        worst_max_drawdown: drawdowns.iter().copied().fold(0.0, f64::min),
    })
}
