//! Moments and order statistics of a return sample.
//!
//! Conventions:
//! - `sample_std` divides by `N - 1`.
//! - `skewness` and `kurtosis` are population moments (divide by `N`);
//!   `kurtosis` is reported as excess kurtosis (normal = 0).
//! - `percentile` interpolates linearly between order statistics
//!   (Hyndman & Fan type 7, the numpy default).
//!
//! Every function returns 0.0 on empty input.

/// Arithmetic mean.
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (`N - 1` denominator).
///
/// Returns exactly 0.0 for fewer than two values or a constant sample, so
/// callers can rely on the zero-volatility guard triggering.
///
/// # Example
///
/// ```
/// use folio_analytics::stats::sample_std;
///
/// assert_eq!(sample_std(&[0.001; 10]), 0.0);
/// assert!((sample_std(&[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 || is_constant(values) {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Population central moment of order `k` about the mean.
fn central_moment(values: &[f64], m: f64, k: i32) -> f64 {
    values.iter().map(|v| (v - m).powi(k)).sum::<f64>() / values.len() as f64
}

/// Population skewness `m3 / m2^1.5`.
#[must_use]
pub fn skewness(values: &[f64]) -> f64 {
    if values.len() < 2 || is_constant(values) {
        return 0.0;
    }
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    if m2 <= 0.0 {
        return 0.0;
    }
    central_moment(values, m, 3) / m2.powf(1.5)
}

/// Population excess kurtosis `m4 / m2² − 3`.
#[must_use]
pub fn kurtosis(values: &[f64]) -> f64 {
    if values.len() < 2 || is_constant(values) {
        return 0.0;
    }
    let m = mean(values);
    let m2 = central_moment(values, m, 2);
    if m2 <= 0.0 {
        return 0.0;
    }
    central_moment(values, m, 4) / (m2 * m2) - 3.0
}

/// Sample standard deviation of the strictly negative values only.
#[must_use]
pub fn semideviation(values: &[f64]) -> f64 {
    let negative: Vec<f64> = values.iter().copied().filter(|v| *v < 0.0).collect();
    sample_std(&negative)
}

/// Percentile `p` in `[0, 1]` with linear interpolation.
///
/// `p` is clamped into range.
///
/// # Example
///
/// ```
/// use folio_analytics::stats::percentile;
///
/// let v = [4.0, 1.0, 3.0, 2.0, 5.0];
/// assert_eq!(percentile(&v, 0.5), 3.0);
/// assert_eq!(percentile(&v, 0.25), 2.0);
/// assert!((percentile(&v, 0.1) - 1.4).abs() < 1e-12);
/// ```
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

/// [`percentile`] on data that is already sorted ascending.
#[must_use]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    match n {
        0 => return 0.0,
        1 => return sorted[0],
        _ => {}
    }
    let idx = p.clamp(0.0, 1.0) * (n - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;
    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}
