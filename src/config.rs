//! Analytics configuration.
//!
//! A single serializable record carries the annualization constant, the
//! risk-free rate and the solver settings so a host application can keep
//! them in one JSON document.
//!
//! # Example
//!
//! ```
//! use folio_analytics::config::AnalyticsConfig;
//!
//! let config = AnalyticsConfig::default()
//!     .with_periods_per_year(52.0)
//!     .with_risk_free_rate(0.02);
//! config.validate().expect("valid config");
//!
//! let json = config.to_json_string().expect("serializable");
//! let back = AnalyticsConfig::from_json_str(&json).expect("round trip");
//! assert_eq!(back.periods_per_year, 52.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// Trading days per year, the default annualization constant.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Top-level analytics configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Return observations per year (252 for daily data)
    pub periods_per_year: f64,
    /// Annual risk-free rate used by Sharpe/Sortino and the optimizer
    pub risk_free_rate: f64,
    /// Constrained solver settings
    pub solver: SolverConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            periods_per_year: TRADING_DAYS_PER_YEAR,
            risk_free_rate: 0.0,
            solver: SolverConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Set the annualization constant
    #[must_use]
    pub fn with_periods_per_year(mut self, periods_per_year: f64) -> Self {
        self.periods_per_year = periods_per_year;
        self
    }

    /// Set the annual risk-free rate
    #[must_use]
    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    /// Replace the solver settings
    #[must_use]
    pub fn with_solver(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Risk-free rate expressed per period.
    #[must_use]
    pub fn periodic_risk_free_rate(&self) -> f64 {
        self.risk_free_rate / self.periods_per_year
    }

    /// Check every field for a usable value.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if !(self.periods_per_year.is_finite() && self.periods_per_year > 0.0) {
            return Err(AnalyticsError::invalid_parameter(
                "periods_per_year",
                self.periods_per_year,
                "a positive finite number",
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(AnalyticsError::invalid_parameter(
                "risk_free_rate",
                self.risk_free_rate,
                "a finite number",
            ));
        }
        self.solver.validate()
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the result fails [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Settings for the augmented-Lagrangian / projected-gradient solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Outer (multiplier update) iterations
    pub max_iterations: usize,
    /// Projected-gradient iterations per subproblem
    pub max_inner_iterations: usize,
    /// Projected-gradient stationarity tolerance
    pub tolerance: f64,
    /// Maximum equality-constraint violation accepted as feasible
    pub constraint_tolerance: f64,
    /// Initial penalty parameter ρ
    pub initial_penalty: f64,
    /// Factor applied to ρ when the violation does not shrink fast enough
    pub penalty_growth: f64,
    /// Upper limit for ρ
    pub max_penalty: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            max_inner_iterations: 2000,
            tolerance: 1e-9,
            constraint_tolerance: 1e-8,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
            max_penalty: 1e10,
        }
    }
}

impl SolverConfig {
    /// Set the outer iteration limit
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the inner iteration limit
    #[must_use]
    pub fn with_max_inner_iterations(mut self, max_inner_iterations: usize) -> Self {
        self.max_inner_iterations = max_inner_iterations;
        self
    }

    /// Set the stationarity tolerance
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the feasibility tolerance
    #[must_use]
    pub fn with_constraint_tolerance(mut self, tolerance: f64) -> Self {
        self.constraint_tolerance = tolerance;
        self
    }

    /// Check limits and tolerances.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AnalyticsError::invalid_parameter(
                "solver.max_iterations",
                self.max_iterations,
                ">= 1",
            ));
        }
        if self.max_inner_iterations == 0 {
            return Err(AnalyticsError::invalid_parameter(
                "solver.max_inner_iterations",
                self.max_inner_iterations,
                ">= 1",
            ));
        }
        for (name, value) in [
            ("solver.tolerance", self.tolerance),
            ("solver.constraint_tolerance", self.constraint_tolerance),
            ("solver.initial_penalty", self.initial_penalty),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalyticsError::invalid_parameter(
                    name,
                    value,
                    "a positive finite number",
                ));
            }
        }
        if !(self.penalty_growth > 1.0) {
            return Err(AnalyticsError::invalid_parameter(
                "solver.penalty_growth",
                self.penalty_growth,
                "> 1",
            ));
        }
        if !(self.max_penalty >= self.initial_penalty) {
            return Err(AnalyticsError::invalid_parameter(
                "solver.max_penalty",
                self.max_penalty,
                ">= solver.initial_penalty",
            ));
        }
        Ok(())
    }
}
