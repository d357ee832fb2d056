//! Covariance and correlation matrices over a [`ReturnMatrix`].
//!
//! ```text
//! Cov(X, Y) = 1/(n−1) Σ (x_i − x̄)(y_i − ȳ)
//! ρ(X, Y)   = Cov(X, Y) / (σ_X σ_Y)
//! ```

use std::collections::BTreeMap;

use crate::data::ReturnMatrix;
use crate::error::{AnalyticsError, Result};
use crate::primitives::Matrix;
use crate::stats::mean;

/// Square symmetric covariance matrix labelled by asset symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    symbols: Vec<String>,
    matrix: Matrix,
    annualized: bool,
}

impl CovarianceMatrix {
    /// Wraps an existing matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is not square with one row per symbol,
    /// or is not symmetric.
    pub fn new(symbols: Vec<String>, matrix: Matrix, annualized: bool) -> Result<Self> {
        let n = symbols.len();
        if matrix.shape() != (n, n) {
            return Err(AnalyticsError::DimensionMismatch {
                expected: format!("{n}x{n} covariance"),
                actual: format!("{}x{}", matrix.n_rows(), matrix.n_cols()),
            });
        }
        if !matrix.is_symmetric(1e-12) {
            return Err(AnalyticsError::invalid_parameter(
                "covariance",
                "asymmetric matrix",
                "a symmetric matrix",
            ));
        }
        Ok(Self {
            symbols,
            matrix,
            annualized,
        })
    }

    /// Asset symbols in row/column order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Number of assets.
    #[must_use]
    pub fn n_assets(&self) -> usize {
        self.symbols.len()
    }

    /// Underlying matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// True if scaled by periods per year.
    #[must_use]
    pub fn is_annualized(&self) -> bool {
        self.annualized
    }

    /// Covariance between two assets by symbol.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        Some(self.matrix.get(i, j))
    }

    /// Per-asset volatility, the square root of the diagonal.
    #[must_use]
    pub fn volatilities(&self) -> Vec<f64> {
        self.matrix
            .diagonal()
            .into_iter()
            .map(|v| v.max(0.0).sqrt())
            .collect()
    }

    /// Correlation implied by this covariance.
    #[must_use]
    pub fn to_correlation(&self) -> CorrelationMatrix {
        let vols = self.volatilities();
        let n = self.n_assets();
        let mut corr = Matrix::eye(n);
        for i in 0..n {
            for j in (i + 1)..n {
                let rho = pearson(self.matrix.get(i, j), vols[i], vols[j]);
                corr.set(i, j, rho);
                corr.set(j, i, rho);
            }
        }
        CorrelationMatrix {
            symbols: self.symbols.clone(),
            matrix: corr,
        }
    }

    /// Nested `symbol -> symbol -> value` map, ready for JSON encoding.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        labelled(&self.symbols, &self.matrix)
    }
}

/// Pearson correlation matrix labelled by asset symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    symbols: Vec<String>,
    matrix: Matrix,
}

impl CorrelationMatrix {
    /// Asset symbols in row/column order.
    #[must_use]
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Underlying matrix.
    #[must_use]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Correlation between two assets by symbol.
    #[must_use]
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        Some(self.matrix.get(i, j))
    }

    /// Nested `symbol -> symbol -> value` map, ready for JSON encoding.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        labelled(&self.symbols, &self.matrix)
    }
}

fn labelled(symbols: &[String], matrix: &Matrix) -> BTreeMap<String, BTreeMap<String, f64>> {
    symbols
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let row = symbols
                .iter()
                .enumerate()
                .map(|(j, b)| (b.clone(), matrix.get(i, j)))
                .collect();
            (a.clone(), row)
        })
        .collect()
}

/// Correlation from a covariance and two volatilities; 0.0 when either
/// volatility is zero.
fn pearson(cov: f64, vol_a: f64, vol_b: f64) -> f64 {
    let denom = vol_a * vol_b;
    if denom > 0.0 {
        (cov / denom).clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn sample_cov(x: &[f64], y: &[f64]) -> f64 {
    let (mx, my) = (mean(x), mean(y));
    let s: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    s / (x.len() - 1) as f64
}

/// Sample covariance over rows without missing values, optionally
/// multiplied by `periods_per_year`.
///
/// # Errors
///
/// Returns [`AnalyticsError::InsufficientData`] with fewer than two complete rows.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use folio_analytics::data::ReturnMatrix;
/// use folio_analytics::risk::covariance_matrix;
///
/// let dates = (1..=4).map(|d| NaiveDate::from_ymd_opt(2024, 1, d).expect("valid")).collect();
/// let returns = ReturnMatrix::from_columns(dates, vec![
///     ("A".into(), vec![0.01, -0.01, 0.02, 0.00]),
///     ("B".into(), vec![0.02, -0.02, 0.04, 0.00]),
/// ]).expect("valid");
///
/// let cov = covariance_matrix(&returns, true, 252.0).expect("enough rows");
/// let var_a = cov.get("A", "A").expect("known");
/// assert!((cov.get("B", "B").expect("known") - 4.0 * var_a).abs() < 1e-12);
/// ```
pub fn covariance_matrix(
    returns: &ReturnMatrix,
    annualize: bool,
    periods_per_year: f64,
) -> Result<CovarianceMatrix> {
    let clean = returns.drop_incomplete_rows();
    if clean.n_rows() < 2 {
        return Err(AnalyticsError::insufficient_data(format!(
            "covariance needs at least 2 aligned observations, got {}",
            clean.n_rows()
        )));
    }
    let n = clean.n_assets();
    let columns: Vec<Vec<f64>> = (0..n).map(|j| clean.matrix().column(j)).collect();
    let scale = if annualize { periods_per_year } else { 1.0 };

    let mut matrix = Matrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let c = sample_cov(&columns[i], &columns[j]) * scale;
            matrix.set(i, j, c);
            matrix.set(j, i, c);
        }
    }

    Ok(CovarianceMatrix {
        symbols: clean.symbols().to_vec(),
        matrix,
        annualized: annualize,
    })
}

/// Pearson correlation with pairwise-complete observations.
///
/// Each pair uses the rows where both assets have a value. Pairs with
/// fewer than two such rows, or with a constant side, get 0.0; the
/// diagonal is 1.0.
///
/// # Errors
///
/// Currently infallible for a valid [`ReturnMatrix`]; kept fallible for
/// parity with [`covariance_matrix`].
pub fn correlation_matrix(returns: &ReturnMatrix) -> Result<CorrelationMatrix> {
    let n = returns.n_assets();
    let columns: Vec<Vec<f64>> = (0..n).map(|j| returns.matrix().column(j)).collect();

    let mut matrix = Matrix::eye(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let (x, y): (Vec<f64>, Vec<f64>) = columns[i]
                .iter()
                .zip(&columns[j])
                .filter(|(a, b)| a.is_finite() && b.is_finite())
                .map(|(a, b)| (*a, *b))
                .unzip();
            let rho = if x.len() < 2 {
                0.0
            } else {
                let vx = sample_cov(&x, &x).sqrt();
                let vy = sample_cov(&y, &y).sqrt();
                pearson(sample_cov(&x, &y), vx, vy)
            };
            matrix.set(i, j, rho);
            matrix.set(j, i, rho);
        }
    }

    Ok(CorrelationMatrix {
        symbols: returns.symbols().to_vec(),
        matrix,
    })
}
