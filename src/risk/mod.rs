//! Covariance-based risk analysis of a weighted portfolio.
//!
//! Build a [`CovarianceMatrix`] from a [`ReturnMatrix`](crate::data::ReturnMatrix),
//! then decompose portfolio variance across assets or apply stress shocks.

pub mod covariance;
pub mod decomposition;
pub mod stress;

pub use covariance::{correlation_matrix, covariance_matrix, CorrelationMatrix, CovarianceMatrix};
pub use decomposition::{
    concentration_risk, diversification_ratio, portfolio_variance, risk_contribution,
    ConcentrationReport, RiskDecomposition, VARIANCE_FLOOR,
};
pub use stress::{stress_test, StressResult};

#[cfg(test)]
mod tests;
