//! I.i.d. normal scenario generation and its outcome distribution.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::MonteCarloRng;
use crate::control::StopToken;
use crate::error::{AnalyticsError, Result};
use crate::stats::{mean, percentile_sorted, sample_std};

/// Scenarios generated from one seed before moving to the next.
///
/// Block `b` draws from seed `seed + b`, so the outcome vector does not
/// depend on how many threads run the blocks.
pub const BLOCK_SIZE: usize = 256;

/// Distribution summary of simulated outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    /// Number of outcomes summarized
    pub scenarios: usize,
    /// Mean outcome
    pub mean: f64,
    /// Median outcome
    pub median: f64,
    /// Sample standard deviation
    pub std: f64,
    /// 5th percentile
    pub p5: f64,
    /// 25th percentile
    pub p25: f64,
    /// 75th percentile
    pub p75: f64,
    /// 95th percentile
    pub p95: f64,
    /// Smallest outcome
    pub min: f64,
    /// Largest outcome
    pub max: f64,
    /// Fraction of outcomes above zero
    pub prob_positive: f64,
    /// Monte Carlo standard error of the mean, `std / sqrt(n)`
    pub standard_error: f64,
}

impl MonteCarloSummary {
    /// Summarizes `outcomes`; all fields are 0.0 for an empty slice.
    #[must_use]
    pub fn from_outcomes(outcomes: &[f64]) -> Self {
        if outcomes.is_empty() {
            return Self::default();
        }
        let mut sorted = outcomes.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let std = sample_std(&sorted);
        let positive = sorted.iter().filter(|v| **v > 0.0).count();

        Self {
            scenarios: n,
            mean: mean(&sorted),
            median: percentile_sorted(&sorted, 0.50),
            std,
            p5: percentile_sorted(&sorted, 0.05),
            p25: percentile_sorted(&sorted, 0.25),
            p75: percentile_sorted(&sorted, 0.75),
            p95: percentile_sorted(&sorted, 0.95),
            min: sorted[0],
            max: sorted[n - 1],
            prob_positive: positive as f64 / n as f64,
            standard_error: std / (n as f64).sqrt(),
        }
    }
}

/// Outcome table of a Monte Carlo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Cumulative return of each scenario, in scenario order
    pub outcomes: Vec<f64>,
    /// Distribution summary of `outcomes`
    pub summary: MonteCarloSummary,
}

/// Checks the parameters shared by both simulators.
pub(crate) fn validate_distribution(mean: f64, std: f64, paths: usize, horizon: usize) -> Result<()> {
    if !mean.is_finite() {
        return Err(AnalyticsError::invalid_parameter("mean", mean, "a finite number"));
    }
    if !(std.is_finite() && std >= 0.0) {
        return Err(AnalyticsError::invalid_parameter(
            "std",
            std,
            "a non-negative finite number",
        ));
    }
    if paths == 0 {
        return Err(AnalyticsError::invalid_parameter("scenarios", paths, ">= 1"));
    }
    if horizon == 0 {
        return Err(AnalyticsError::invalid_parameter("time_horizon", horizon, ">= 1"));
    }
    Ok(())
}

/// Runs `count` items in blocks of [`BLOCK_SIZE`] on the rayon pool.
///
/// `generate(rng, n)` fills one block; `stop` is polled before each block.
pub(crate) fn run_blocks<T, F>(count: usize, seed: u64, stop: Option<&StopToken>, generate: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&mut MonteCarloRng, usize) -> Vec<T> + Sync,
{
    let blocks = count.div_ceil(BLOCK_SIZE);
    let chunks: Vec<Vec<T>> = (0..blocks)
        .into_par_iter()
        .map(|b| {
            if let Some(reason) = stop.and_then(StopToken::check) {
                return Err(AnalyticsError::from(reason));
            }
            let mut rng = MonteCarloRng::new(seed.wrapping_add(b as u64));
            let size = BLOCK_SIZE.min(count - b * BLOCK_SIZE);
            Ok(generate(&mut rng, size))
        })
        .collect::<Result<_>>()?;
    Ok(chunks.into_iter().flatten().collect())
}

/// Monte Carlo distribution of cumulative returns.
///
/// Each scenario compounds `time_horizon` i.i.d. `N(mean, std)` periodic
/// returns into `∏(1 + r) − 1`. Runs are reproducible for a given `seed`.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidParameter`] for a non-finite mean, a
/// negative or non-finite std, or zero scenarios or horizon.
///
/// # Example
///
/// ```
/// use folio_analytics::monte_carlo::monte_carlo;
///
/// let result = monte_carlo(0.0005, 0.01, 2_000, 252, 42).expect("valid parameters");
/// assert_eq!(result.outcomes.len(), 2_000);
/// assert!(result.summary.p5 < result.summary.median);
/// assert!(result.summary.median < result.summary.p95);
/// ```
pub fn monte_carlo(
    mean: f64,
    std: f64,
    scenarios: usize,
    time_horizon: usize,
    seed: u64,
) -> Result<SimulationResult> {
    simulate(mean, std, scenarios, time_horizon, seed, None)
}

/// [`monte_carlo`] that stops between scenario blocks when `stop` fires.
///
/// # Errors
///
/// As [`monte_carlo`], plus [`AnalyticsError::Cancelled`] or
/// [`AnalyticsError::DeadlineExceeded`]; a partial distribution is never
/// returned.
pub fn monte_carlo_with_stop(
    mean: f64,
    std: f64,
    scenarios: usize,
    time_horizon: usize,
    seed: u64,
    stop: &StopToken,
) -> Result<SimulationResult> {
    simulate(mean, std, scenarios, time_horizon, seed, Some(stop))
}

fn simulate(
    mean: f64,
    std: f64,
    scenarios: usize,
    time_horizon: usize,
    seed: u64,
    stop: Option<&StopToken>,
) -> Result<SimulationResult> {
    validate_distribution(mean, std, scenarios, time_horizon)?;
    tracing::debug!(scenarios, time_horizon, seed, "running monte carlo");

    let outcomes = run_blocks(scenarios, seed, stop, |rng, n| {
        (0..n)
            .map(|_| {
                let growth = (0..time_horizon).fold(1.0, |acc, _| acc * (1.0 + rng.normal(mean, std)));
                growth - 1.0
            })
            .collect()
    })?;

    let summary = MonteCarloSummary::from_outcomes(&outcomes);
    Ok(SimulationResult { outcomes, summary })
}
