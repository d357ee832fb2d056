//! Euclidean projections onto the portfolio feasible sets.

/// Clamp each coordinate into `[lower_i, upper_i]`.
///
/// Never panics: where `lower_i > upper_i` the coordinate is set to
/// `upper_i`, and a NaN bound leaves that side unconstrained.
///
/// # Example
///
/// ```
/// use folio_analytics::optim::project_box;
///
/// assert_eq!(project_box(&[-1.0, 0.5, 2.0], &[0.0; 3], &[1.0; 3]), vec![0.0, 0.5, 1.0]);
/// // Crossed bounds resolve to the upper bound
/// assert_eq!(project_box(&[0.5], &[0.8], &[0.2]), vec![0.2]);
/// ```
#[must_use]
pub fn project_box(x: &[f64], lower: &[f64], upper: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(lower.iter().zip(upper))
        .map(|(v, (l, u))| clamp_to(*v, *l, *u))
        .collect()
}

/// `f64::clamp` without its `lower <= upper` assertion.
#[inline]
fn clamp_to(v: f64, lower: f64, upper: f64) -> f64 {
    v.max(lower).min(upper)
}

/// Projection onto the capped simplex `{ l ≤ w ≤ u, Σw = total }`.
///
/// The projection is `w_i = clamp(v_i − λ, l_i, u_i)` for the unique shift
/// `λ` making the sum equal `total`; `λ` is found by bisection, since the
/// sum is monotone in it. If the set is empty (`Σl > total` or
/// `Σu < total`) the nearest bound vector is returned. Crossed bounds
/// (`l_i > u_i`) pin that coordinate to `u_i` instead of panicking.
///
/// # Example
///
/// ```
/// use folio_analytics::optim::project_capped_simplex;
///
/// let w = project_capped_simplex(&[0.8, 0.8, -0.5], &[0.0; 3], &[0.6; 3], 1.0);
/// assert!((w[0] - 0.5).abs() < 1e-12);
/// assert!((w[1] - 0.5).abs() < 1e-12);
/// assert_eq!(w[2], 0.0);
/// ```
#[must_use]
pub fn project_capped_simplex(v: &[f64], lower: &[f64], upper: &[f64], total: f64) -> Vec<f64> {
    let sum_lower: f64 = lower.iter().sum();
    let sum_upper: f64 = upper.iter().sum();
    if sum_lower >= total {
        return lower.to_vec();
    }
    if sum_upper <= total {
        return upper.to_vec();
    }

    let shifted_sum = |lambda: f64| -> f64 {
        v.iter()
            .zip(lower.iter().zip(upper))
            .map(|(x, (l, u))| clamp_to(x - lambda, *l, *u))
            .sum()
    };

    // At `lo` every coordinate sits on its upper bound, at `hi` on its lower
    let mut lo = v
        .iter()
        .zip(upper)
        .map(|(x, u)| x - u)
        .fold(f64::INFINITY, f64::min);
    let mut hi = v
        .iter()
        .zip(lower)
        .map(|(x, l)| x - l)
        .fold(f64::NEG_INFINITY, f64::max);

    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if mid <= lo || mid >= hi {
            break;
        }
        if shifted_sum(mid) > total {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    let lambda = 0.5 * (lo + hi);
    let mut w: Vec<f64> = v
        .iter()
        .zip(lower.iter().zip(upper))
        .map(|(x, (l, u))| clamp_to(x - lambda, *l, *u))
        .collect();

    // Put the rounding residue on a coordinate with room to absorb it
    let residue = total - w.iter().sum::<f64>();
    if residue != 0.0 {
        if let Some(i) = (0..w.len()).find(|&i| {
            let moved = w[i] + residue;
            moved >= lower[i] && moved <= upper[i]
        }) {
            w[i] += residue;
        }
    }
    w
}
