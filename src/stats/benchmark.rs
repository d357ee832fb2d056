//! Relative performance against a benchmark series.
//!
//! Portfolio and benchmark are aligned on their common dates first; with
//! fewer than two common observations every measure is 0.0.

use super::descriptive::{mean, sample_std};
use crate::data::ReturnSeries;

/// Paired returns on dates present in both series.
fn aligned(portfolio: &ReturnSeries, benchmark: &ReturnSeries) -> (Vec<f64>, Vec<f64>) {
    portfolio
        .iter()
        .filter_map(|(date, r)| benchmark.get(date).map(|b| (r, b)))
        .unzip()
}

fn sample_cov(x: &[f64], y: &[f64]) -> f64 {
    let (mx, my) = (mean(x), mean(y));
    let s: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    s / (x.len() - 1) as f64
}

/// `cov(r, b) / var(b)`.
#[must_use]
pub fn beta(portfolio: &ReturnSeries, benchmark: &ReturnSeries) -> f64 {
    let (r, b) = aligned(portfolio, benchmark);
    if r.len() < 2 {
        return 0.0;
    }
    let var_b = sample_std(&b).powi(2);
    if var_b <= 0.0 {
        return 0.0;
    }
    sample_cov(&r, &b) / var_b
}

/// Annualized Jensen's alpha: `ppy · (E[r − rf] − β·E[b − rf])`.
#[must_use]
pub fn jensens_alpha(
    portfolio: &ReturnSeries,
    benchmark: &ReturnSeries,
    risk_free_rate: f64,
    periods_per_year: f64,
) -> f64 {
    let (r, b) = aligned(portfolio, benchmark);
    if r.len() < 2 {
        return 0.0;
    }
    let rf = risk_free_rate / periods_per_year;
    let beta = beta(portfolio, benchmark);
    periods_per_year * ((mean(&r) - rf) - beta * (mean(&b) - rf))
}

/// Annualized standard deviation of active returns `r − b`.
#[must_use]
pub fn tracking_error(
    portfolio: &ReturnSeries,
    benchmark: &ReturnSeries,
    periods_per_year: f64,
) -> f64 {
    let (r, b) = aligned(portfolio, benchmark);
    let active: Vec<f64> = r.iter().zip(&b).map(|(x, y)| x - y).collect();
    sample_std(&active) * periods_per_year.sqrt()
}

/// Annualized mean active return over tracking error; 0.0 when the
/// portfolio tracks the benchmark exactly.
#[must_use]
pub fn information_ratio(
    portfolio: &ReturnSeries,
    benchmark: &ReturnSeries,
    periods_per_year: f64,
) -> f64 {
    let (r, b) = aligned(portfolio, benchmark);
    if r.len() < 2 {
        return 0.0;
    }
    let active: Vec<f64> = r.iter().zip(&b).map(|(x, y)| x - y).collect();
    let te = sample_std(&active) * periods_per_year.sqrt();
    if te <= 0.0 {
        return 0.0;
    }
    mean(&active) * periods_per_year / te
}
