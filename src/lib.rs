//! Folio Analytics: portfolio analytics and optimization in pure Rust.
//!
//! Given historical asset returns and portfolio weights, the crate computes
//! return and risk statistics, decomposes portfolio risk, solves
//! constrained weight-selection problems and simulates forward paths. All
//! computations are pure functions over immutable inputs; results are
//! plain serializable records.
//!
//! # Quick Start
//!
//! ```
//! use chrono::NaiveDate;
//! use folio_analytics::prelude::*;
//!
//! let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).expect("valid date");
//! let dates: Vec<NaiveDate> = (1..=6).map(d).collect();
//! let returns = ReturnMatrix::from_columns(dates, vec![
//!     ("AAA".into(), vec![0.010, -0.004, 0.006, -0.002, 0.008, -0.001]),
//!     ("BBB".into(), vec![0.002, 0.003, -0.001, 0.004, 0.001, 0.002]),
//! ]).expect("aligned columns");
//!
//! // Statistics of one asset
//! let aaa = returns.series(0).expect("first column");
//! assert!(total_return(aaa.values()) > 0.0);
//!
//! // Risk of an equal-weight portfolio
//! let cov = covariance_matrix(&returns, true, 252.0).expect("enough rows");
//! let weights = WeightVector::equal(returns.symbols()).expect("unique symbols");
//! let rc = risk_contribution(&weights, &cov).expect("known symbols");
//! assert!((rc.total_percentage() - 1.0).abs() < 1e-9);
//!
//! // Minimum-variance weights
//! let optimizer = PortfolioOptimizer::new(returns);
//! let result = optimizer.min_variance(WeightBounds::default()).expect("valid bounds");
//! assert!((result.weights.sum() - 1.0).abs() < 1e-9);
//! ```
//!
//! # Modules
//!
//! - [`data`]: return series, aligned return matrices, weights, return
//!   sources, CSV price loading and caching
//! - [`stats`]: performance ratios, drawdowns, VaR/CVaR and moments
//! - [`risk`]: covariance, risk contribution, concentration and stress tests
//! - [`optim`]: projected-gradient and augmented-Lagrangian solvers
//! - [`portfolio`]: mean-variance, risk-parity and efficient-frontier optimization
//! - [`monte_carlo`]: Monte Carlo and CPPI simulation
//! - [`config`]: serializable analytics and solver configuration
//! - [`control`]: cancellation and deadlines
//! - [`error`]: the crate error type

pub mod config;
pub mod control;
pub mod data;
pub mod error;
pub mod monte_carlo;
pub mod optim;
pub mod portfolio;
pub mod prelude;
pub mod primitives;
pub mod risk;
pub mod stats;

pub use error::{AnalyticsError, Result};
pub use primitives::Matrix;
