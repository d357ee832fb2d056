//! Constrained portfolio construction.
//!
//! [`PortfolioOptimizer`] works on the annualized mean vector `μ` and the
//! annualized covariance `Σ` of a [`ReturnMatrix`]. Both are computed on
//! first use and reused by every later call on the same optimizer.
//!
//! Every problem keeps the weights inside per-asset bounds and on the
//! budget `Σw = 1`:
//!
//! - [`mean_variance_optimization`](PortfolioOptimizer::mean_variance_optimization):
//!   minimum variance for a target return, a risk-aversion utility, or the
//!   maximum Sharpe ratio
//! - [`risk_parity_optimization`](PortfolioOptimizer::risk_parity_optimization):
//!   equal risk contributions
//! - [`min_variance`](PortfolioOptimizer::min_variance): the global
//!   minimum-variance point
//! - [`efficient_frontier`](PortfolioOptimizer::efficient_frontier): a sweep
//!   of target returns solved in parallel
//!
//! A solve that does not converge is not an error: the best iterate comes
//! back with `success == false` and the solver diagnostic.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use folio_analytics::data::ReturnMatrix;
//! use folio_analytics::portfolio::{PortfolioOptimizer, WeightBounds};
//!
//! let dates = (1..=8).map(|d| NaiveDate::from_ymd_opt(2024, 1, d).expect("valid")).collect();
//! let returns = ReturnMatrix::from_columns(dates, vec![
//!     ("A".into(), vec![0.01, -0.01, 0.01, -0.01, 0.01, -0.01, 0.01, -0.01]),
//!     ("B".into(), vec![0.02, 0.02, -0.02, -0.02, 0.02, 0.02, -0.02, -0.02]),
//! ]).expect("valid");
//!
//! let optimizer = PortfolioOptimizer::new(returns);
//! let result = optimizer.min_variance(WeightBounds::default()).expect("enough data");
//!
//! assert!(result.success);
//! // Uncorrelated, variances 1:4, so weights 0.8 / 0.2
//! assert!((result.weights.get("A").expect("held") - 0.8).abs() < 1e-6);
//! ```

use std::sync::OnceLock;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::{AnalyticsConfig, SolverConfig};
use crate::control::StopToken;
use crate::data::{ReturnMatrix, ReturnSource, WeightVector};
use crate::error::{AnalyticsError, Result};
use crate::optim::{
    project_capped_simplex, AugmentedLagrangian, ConvergenceStatus, ProjectedGradientDescent,
    SolverResult,
};
use crate::primitives::{dot, Matrix};
use crate::risk::decomposition::{guarded_variance, sigma_w};
use crate::risk::{covariance_matrix, CovarianceMatrix};

mod frontier;

pub use frontier::{EfficientFrontier, FrontierPoint};

/// Volatility at or below this makes a Sharpe ratio undefined.
const MIN_VOLATILITY: f64 = 1e-12;

/// Per-asset weight bounds `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightBounds {
    /// Minimum weight of every asset
    pub lower: f64,
    /// Maximum weight of every asset
    pub upper: f64,
}

impl Default for WeightBounds {
    /// Long-only: `[0, 1]`.
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 1.0,
        }
    }
}

impl WeightBounds {
    /// Default bounds for risk parity; the positive floor keeps every asset
    /// contributing risk.
    pub const RISK_PARITY: Self = Self {
        lower: 0.01,
        upper: 1.0,
    };

    /// Creates bounds `[lower, upper]`.
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Checks that `n` assets can hold a fully invested portfolio.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidParameter`] for non-finite bounds,
    /// `lower > upper`, or when `n·lower ≤ 1 ≤ n·upper` fails.
    pub fn validate(&self, n: usize) -> Result<()> {
        if !(self.lower.is_finite() && self.upper.is_finite()) {
            return Err(AnalyticsError::invalid_parameter(
                "weight_bounds",
                format!("({}, {})", self.lower, self.upper),
                "finite bounds",
            ));
        }
        if self.lower > self.upper {
            return Err(AnalyticsError::invalid_parameter(
                "weight_bounds",
                format!("({}, {})", self.lower, self.upper),
                "lower <= upper",
            ));
        }
        let n = n as f64;
        let slack = 1e-12;
        if n * self.lower > 1.0 + slack || n * self.upper < 1.0 - slack {
            return Err(AnalyticsError::invalid_parameter(
                "weight_bounds",
                format!("({}, {})", self.lower, self.upper),
                "n * lower <= 1 <= n * upper so the weights can sum to 1",
            ));
        }
        Ok(())
    }
}

/// Outcome of one portfolio optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Weights found (the best iterate when the solve did not converge)
    pub weights: WeightVector,
    /// Annualized expected return `μᵗw`
    pub expected_return: f64,
    /// Annualized volatility `sqrt(wᵗΣw)`
    pub expected_volatility: f64,
    /// `(μᵗw − r_f) / σ`, 0.0 at zero volatility
    pub sharpe_ratio: f64,
    /// True if the solver converged with all constraints satisfied
    pub success: bool,
    /// Solver diagnostic
    pub message: String,
    /// Solver status
    pub status: ConvergenceStatus,
    /// Solver iterations spent
    pub iterations: usize,
}

/// `μ`, `Σ` and their inputs, computed once per optimizer.
#[derive(Debug)]
struct Prepared {
    symbols: Vec<String>,
    mu: Vec<f64>,
    cov: CovarianceMatrix,
}

/// Mean-variance and risk-parity optimizer over one return matrix.
///
/// The optimizer is `Sync`; frontier points are solved concurrently on
/// the shared, read-only `μ`/`Σ`.
#[derive(Debug)]
pub struct PortfolioOptimizer {
    returns: ReturnMatrix,
    config: AnalyticsConfig,
    stop: Option<StopToken>,
    prepared: OnceLock<Prepared>,
}

impl PortfolioOptimizer {
    /// Creates an optimizer with the default configuration.
    #[must_use]
    pub fn new(returns: ReturnMatrix) -> Self {
        Self {
            returns,
            config: AnalyticsConfig::default(),
            stop: None,
            prepared: OnceLock::new(),
        }
    }

    /// Creates an optimizer over the aligned returns of `symbols` fetched
    /// from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidParameter`] for an empty symbol list
    /// and propagates lookup and alignment errors.
    pub fn from_source<S: ReturnSource + ?Sized>(
        source: &S,
        symbols: &[&str],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Self> {
        if symbols.is_empty() {
            return Err(AnalyticsError::invalid_parameter(
                "symbols",
                "[]",
                "at least one asset",
            ));
        }
        Ok(Self::new(source.return_matrix(symbols, start, end)?))
    }

    /// Replaces the configuration; cached `μ`/`Σ` are recomputed on next use.
    #[must_use]
    pub fn with_config(mut self, config: AnalyticsConfig) -> Self {
        self.config = config;
        self.prepared = OnceLock::new();
        self
    }

    /// Lets `token` stop every subsequent solve.
    #[must_use]
    pub fn with_stop_token(mut self, token: StopToken) -> Self {
        self.stop = Some(token);
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Asset symbols in optimization order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        self.returns.symbols()
    }

    /// Annualized mean return per asset.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InsufficientData`] with fewer than two
    /// complete rows.
    pub fn expected_returns(&self) -> Result<&[f64]> {
        Ok(&self.prepare()?.mu)
    }

    /// Annualized covariance matrix.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InsufficientData`] with fewer than two
    /// complete rows.
    pub fn covariance(&self) -> Result<&CovarianceMatrix> {
        Ok(&self.prepare()?.cov)
    }

    /// Computes `μ` and `Σ` on the complete rows, once.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InsufficientData`] with fewer than two
    /// complete rows and [`AnalyticsError::InvalidParameter`] for an invalid
    /// configuration.
    fn prepare(&self) -> Result<&Prepared> {
        if let Some(prepared) = self.prepared.get() {
            return Ok(prepared);
        }
        self.config.validate()?;
        let ppy = self.config.periods_per_year;
        let clean = self.returns.drop_incomplete_rows();
        let cov = covariance_matrix(&clean, true, ppy)?;
        let mu = clean.mean_returns().into_iter().map(|m| m * ppy).collect();
        tracing::debug!(
            assets = clean.n_assets(),
            observations = clean.n_rows(),
            "prepared expected returns and covariance"
        );
        let prepared = Prepared {
            symbols: clean.symbols().to_vec(),
            mu,
            cov,
        };
        Ok(self.prepared.get_or_init(|| prepared))
    }

    /// Mean-variance optimization.
    ///
    /// - `target_return = Some(r)`: minimize `wᵗΣw` subject to `μᵗw = r`
    /// - else `risk_aversion = Some(γ)`: maximize `μᵗw − ½γ wᵗΣw`
    /// - else: maximize the Sharpe ratio `(μᵗw − r_f) / sqrt(wᵗΣw)` with the
    ///   configured risk-free rate
    ///
    /// All variants start from equal weights and keep `Σw = 1` and
    /// `bounds`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid bounds or parameters and for too little
    /// data. Solver non-convergence is reported through
    /// [`OptimizationResult::success`].
    pub fn mean_variance_optimization(
        &self,
        target_return: Option<f64>,
        risk_aversion: Option<f64>,
        bounds: WeightBounds,
    ) -> Result<OptimizationResult> {
        let prepared = self.prepare()?;
        let n = prepared.symbols.len();
        bounds.validate(n)?;
        let sigma = prepared.cov.matrix();
        let mu = prepared.mu.as_slice();

        let solved = match (target_return, risk_aversion) {
            (Some(target), _) => {
                if !target.is_finite() {
                    return Err(AnalyticsError::invalid_parameter(
                        "target_return",
                        target,
                        "a finite number",
                    ));
                }
                self.solve_with_equality(
                    |w: &[f64]| variance(sigma, w),
                    |w: &[f64]| sigma_w(sigma, w).into_iter().map(|s| 2.0 * s).collect(),
                    |w: &[f64]| vec![dot(mu, w) - target],
                    |_: &[f64]| vec![mu.to_vec()],
                    n,
                    bounds,
                )
            }
            (None, Some(gamma)) => {
                if !(gamma.is_finite() && gamma >= 0.0) {
                    return Err(AnalyticsError::invalid_parameter(
                        "risk_aversion",
                        gamma,
                        "a non-negative finite number",
                    ));
                }
                self.solve(
                    |w: &[f64]| -dot(mu, w) + 0.5 * gamma * variance(sigma, w),
                    |w: &[f64]| {
                        sigma_w(sigma, w)
                            .into_iter()
                            .zip(mu)
                            .map(|(s, m)| gamma * s - m)
                            .collect()
                    },
                    n,
                    bounds,
                )
            }
            (None, None) => {
                let rf = self.config.risk_free_rate;
                self.solve(
                    |w: &[f64]| negative_sharpe(sigma, mu, rf, w),
                    |w: &[f64]| negative_sharpe_gradient(sigma, mu, rf, w),
                    n,
                    bounds,
                )
            }
        };

        Ok(self.finish(prepared, solved))
    }

    /// Risk parity: minimize `Σ (RC_i − 1/n)²` over the percentage risk
    /// contributions `RC_i = w_i (Σw)_i / wᵗΣw`.
    ///
    /// Use [`WeightBounds::RISK_PARITY`] for the customary `[0.01, 1]`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid bounds and for too little data.
    pub fn risk_parity_optimization(&self, bounds: WeightBounds) -> Result<OptimizationResult> {
        let prepared = self.prepare()?;
        let n = prepared.symbols.len();
        bounds.validate(n)?;
        let sigma = prepared.cov.matrix();

        let solved = self.solve(
            |w: &[f64]| risk_parity_objective(sigma, w),
            |w: &[f64]| risk_parity_gradient(sigma, w),
            n,
            bounds,
        );
        Ok(self.finish(prepared, solved))
    }

    /// Global minimum-variance portfolio within `bounds`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid bounds and for too little data.
    pub fn min_variance(&self, bounds: WeightBounds) -> Result<OptimizationResult> {
        let prepared = self.prepare()?;
        let n = prepared.symbols.len();
        bounds.validate(n)?;
        let sigma = prepared.cov.matrix();

        let solved = self.solve(
            |w: &[f64]| variance(sigma, w),
            |w: &[f64]| sigma_w(sigma, w).into_iter().map(|s| 2.0 * s).collect(),
            n,
            bounds,
        );
        Ok(self.finish(prepared, solved))
    }

    fn inner_solver(&self, solver: &SolverConfig) -> ProjectedGradientDescent {
        let pgd = ProjectedGradientDescent::new(solver.max_inner_iterations, 1.0, solver.tolerance);
        match &self.stop {
            Some(token) => pgd.with_stop_token(token.clone()),
            None => pgd,
        }
    }

    fn solve<F, G>(&self, objective: F, gradient: G, n: usize, bounds: WeightBounds) -> SolverResult
    where
        F: Fn(&[f64]) -> f64,
        G: Fn(&[f64]) -> Vec<f64>,
    {
        let (lower, upper) = (vec![bounds.lower; n], vec![bounds.upper; n]);
        let project = |w: &[f64]| project_capped_simplex(w, &lower, &upper, 1.0);
        self.inner_solver(&self.config.solver)
            .minimize(objective, gradient, project, vec![1.0 / n as f64; n])
    }

    fn solve_with_equality<F, G, H, J>(
        &self,
        objective: F,
        gradient: G,
        equality: H,
        jacobian: J,
        n: usize,
        bounds: WeightBounds,
    ) -> SolverResult
    where
        F: Fn(&[f64]) -> f64,
        G: Fn(&[f64]) -> Vec<f64>,
        H: Fn(&[f64]) -> Vec<f64>,
        J: Fn(&[f64]) -> Vec<Vec<f64>>,
    {
        let solver = &self.config.solver;
        let (lower, upper) = (vec![bounds.lower; n], vec![bounds.upper; n]);
        let project = |w: &[f64]| project_capped_simplex(w, &lower, &upper, 1.0);
        let al = AugmentedLagrangian::new(
            solver.max_iterations,
            solver.constraint_tolerance,
            solver.initial_penalty,
        )
        .with_rho_increase(solver.penalty_growth)
        .with_rho_max(solver.max_penalty)
        .with_inner(self.inner_solver(solver));
        al.minimize_equality(
            objective,
            gradient,
            equality,
            jacobian,
            project,
            vec![1.0 / n as f64; n],
        )
    }

    /// Realized statistics at the solver's iterate.
    fn finish(&self, prepared: &Prepared, solved: SolverResult) -> OptimizationResult {
        let w = solved.solution;
        let expected_return = dot(&prepared.mu, &w);
        let expected_volatility = guarded_variance(prepared.cov.matrix(), &w).sqrt();
        let sharpe_ratio = if expected_volatility > MIN_VOLATILITY {
            (expected_return - self.config.risk_free_rate) / expected_volatility
        } else {
            0.0
        };

        let success = solved.status == ConvergenceStatus::Converged;
        if success {
            tracing::debug!(
                iterations = solved.iterations,
                objective = solved.objective_value,
                violation = solved.constraint_violation,
                "portfolio optimization converged"
            );
        } else {
            tracing::warn!(
                status = ?solved.status,
                iterations = solved.iterations,
                violation = solved.constraint_violation,
                message = %solved.message,
                "portfolio optimization did not converge, returning best iterate"
            );
        }

        let weights = prepared.symbols.iter().cloned().zip(w.iter().copied()).collect();

        OptimizationResult {
            weights: WeightVector::from_entries(weights),
            expected_return,
            expected_volatility,
            sharpe_ratio,
            success,
            message: solved.message,
            status: solved.status,
            iterations: solved.iterations,
        }
    }
}

/// Unguarded `wᵗΣw` for use inside objectives.
fn variance(sigma: &Matrix, w: &[f64]) -> f64 {
    dot(&sigma_w(sigma, w), w)
}

/// `−(μᵗw − r_f) / σ`; `+∞` at zero volatility so the line search moves
/// away from degenerate points.
fn negative_sharpe(sigma: &Matrix, mu: &[f64], rf: f64, w: &[f64]) -> f64 {
    let vol = variance(sigma, w).max(0.0).sqrt();
    if vol <= MIN_VOLATILITY {
        return f64::INFINITY;
    }
    -(dot(mu, w) - rf) / vol
}

/// `∇(−S) = −μ/σ + (μᵗw − r_f) Σw / σ³`.
fn negative_sharpe_gradient(sigma: &Matrix, mu: &[f64], rf: f64, w: &[f64]) -> Vec<f64> {
    let sw = sigma_w(sigma, w);
    let vol = dot(&sw, w).max(0.0).sqrt();
    if vol <= MIN_VOLATILITY {
        return vec![0.0; w.len()];
    }
    let excess = dot(mu, w) - rf;
    let vol3 = vol * vol * vol;
    mu.iter()
        .zip(&sw)
        .map(|(m, s)| -m / vol + excess * s / vol3)
        .collect()
}

/// Percentage risk contributions and `(Σw, wᵗΣw)`; `None` when the variance
/// vanishes.
fn risk_shares(sigma: &Matrix, w: &[f64]) -> Option<(Vec<f64>, Vec<f64>, f64)> {
    let sw = sigma_w(sigma, w);
    let var = dot(&sw, w);
    if var <= MIN_VOLATILITY * MIN_VOLATILITY {
        return None;
    }
    let shares = w.iter().zip(&sw).map(|(x, s)| x * s / var).collect();
    Some((shares, sw, var))
}

fn risk_parity_objective(sigma: &Matrix, w: &[f64]) -> f64 {
    let target = 1.0 / w.len() as f64;
    match risk_shares(sigma, w) {
        Some((shares, _, _)) => shares.iter().map(|p| (p - target).powi(2)).sum(),
        None => w.len() as f64 * target * target,
    }
}

/// With `d_i = RC_i − 1/n`:
/// `∂f/∂w_k = (2/v) [d_k (Σw)_k + (Σ(d∘w))_k − 2 (Σw)_k Σ_i d_i RC_i]`.
fn risk_parity_gradient(sigma: &Matrix, w: &[f64]) -> Vec<f64> {
    let target = 1.0 / w.len() as f64;
    let Some((shares, sw, var)) = risk_shares(sigma, w) else {
        return vec![0.0; w.len()];
    };
    let d: Vec<f64> = shares.iter().map(|p| p - target).collect();
    let dw: Vec<f64> = d.iter().zip(w).map(|(di, wi)| di * wi).collect();
    let sigma_dw = sigma_w(sigma, &dw);
    let cross = dot(&d, &shares);
    (0..w.len())
        .map(|k| 2.0 / var * (d[k] * sw[k] + sigma_dw[k] - 2.0 * sw[k] * cross))
        .collect()
}

#[cfg(test)]
#[path = "portfolio_tests.rs"]
mod tests;
