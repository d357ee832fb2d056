//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use folio_analytics::prelude::*;
//! ```

pub use crate::config::{AnalyticsConfig, SolverConfig};
pub use crate::control::StopToken;
pub use crate::data::{ReturnMatrix, ReturnSeries, ReturnSeriesStore, ReturnSource, WeightVector};
pub use crate::error::{AnalyticsError, Result};
pub use crate::monte_carlo::{cppi_simulation, monte_carlo, CppiParams};
pub use crate::portfolio::{OptimizationResult, PortfolioOptimizer, WeightBounds};
pub use crate::primitives::Matrix;
pub use crate::risk::{
    concentration_risk, correlation_matrix, covariance_matrix, portfolio_variance,
    risk_contribution, stress_test,
};
pub use crate::stats::{
    annualized_return, calmar_ratio, conditional_var, max_drawdown, sharpe_ratio, sortino_ratio,
    total_return, value_at_risk, volatility, PerformanceSummary,
};
