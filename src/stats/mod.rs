//! Return and risk statistics for a single return series.
//!
//! Pure functions over `&[f64]` (or a dated [`ReturnSeries`](crate::data::ReturnSeries)
//! where dates matter). Empty or too-short input degrades to a neutral
//! value instead of an error; the only fallible functions are the tail
//! measures, which reject confidence levels outside `(0, 1)`.
//!
//! # Examples
//!
//! ```
//! use folio_analytics::stats::{conditional_var, max_drawdown_value, value_at_risk};
//!
//! let returns = [0.012, -0.007, 0.004, -0.021, 0.015, -0.003, 0.009];
//! let var = value_at_risk(&returns, 0.95).expect("valid confidence");
//! let cvar = conditional_var(&returns, 0.95).expect("valid confidence");
//! assert!(cvar <= var);
//! assert!(max_drawdown_value(&returns) <= 0.0);
//! ```

pub mod benchmark;
pub mod descriptive;
pub mod drawdown;
pub mod performance;
pub mod tail;

pub use benchmark::{beta, information_ratio, jensens_alpha, tracking_error};
pub use descriptive::{
    kurtosis, mean, percentile, percentile_sorted, sample_std, semideviation, skewness,
};
pub use drawdown::{
    drawdown_series, max_drawdown, max_drawdown_duration, max_drawdown_value, wealth_path,
    DrawdownReport,
};
pub use performance::{
    annualized_return, annualized_return_dated, calmar_ratio, sharpe_ratio, sortino_ratio,
    total_return, volatility, PerformanceSummary,
};
pub use tail::{conditional_var, value_at_risk};
