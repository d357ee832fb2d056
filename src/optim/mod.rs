//! Constrained numerical optimization over real vectors.
//!
//! The portfolio problems all have the shape
//!
//! ```text
//! minimize  f(w)
//! subject to l ≤ w ≤ u,  Σw = 1,  h(w) = 0
//! ```
//!
//! The bounds and the budget constraint define a convex set with an exact
//! Euclidean projection ([`project_capped_simplex`]), so they are handled by
//! [`ProjectedGradientDescent`]. Any further equality constraints `h(w) = 0`
//! (such as a target return) are handled by the [`AugmentedLagrangian`]
//! outer loop wrapped around it.
//!
//! # Example
//!
//! ```
//! use folio_analytics::optim::{project_capped_simplex, ConvergenceStatus, ProjectedGradientDescent};
//!
//! // Minimize ‖w − c‖² over the probability simplex
//! let c = [0.9, 0.4, -0.3];
//! let objective = |w: &[f64]| w.iter().zip(&c).map(|(a, b)| (a - b).powi(2)).sum::<f64>();
//! let gradient = |w: &[f64]| w.iter().zip(&c).map(|(a, b)| 2.0 * (a - b)).collect::<Vec<_>>();
//! let project = |w: &[f64]| project_capped_simplex(w, &[0.0; 3], &[1.0; 3], 1.0);
//!
//! let result = ProjectedGradientDescent::new(1000, 1.0, 1e-10)
//!     .minimize(objective, gradient, project, vec![1.0 / 3.0; 3]);
//!
//! assert_eq!(result.status, ConvergenceStatus::Converged);
//! assert!((result.solution[0] - 0.75).abs() < 1e-6);
//! assert!((result.solution[1] - 0.25).abs() < 1e-6);
//! assert!(result.solution[2].abs() < 1e-9);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::primitives::norm;

mod augmented_lagrangian;
mod projected_gradient;
mod projection;

pub use augmented_lagrangian::AugmentedLagrangian;
pub use projected_gradient::ProjectedGradientDescent;
pub use projection::{project_box, project_capped_simplex};

/// Solver diagnostic for a successful solve.
pub const MSG_SUCCESS: &str = "Optimization terminated successfully";
/// Solver diagnostic when the iteration budget runs out.
pub const MSG_MAX_ITERATIONS: &str = "Iteration limit reached";

/// Convergence status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// Stationary within tolerance and constraints satisfied
    Converged,
    /// Reached maximum iteration limit
    MaxIterations,
    /// Line search could not find a descent step
    Stalled,
    /// Numerical error (NaN, Inf, etc.)
    NumericalError,
    /// Equality constraints still violated after the outer iteration budget
    Infeasible,
    /// Stopped through a cancellation token or deadline
    UserTerminated,
}

impl ConvergenceStatus {
    /// Default diagnostic text for this status.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Converged => MSG_SUCCESS,
            Self::MaxIterations => MSG_MAX_ITERATIONS,
            Self::Stalled => "Line search failed to find a descent direction",
            Self::NumericalError => "Objective or gradient is not finite",
            Self::Infeasible => "Equality constraints not satisfied within tolerance",
            Self::UserTerminated => "Terminated by caller",
        }
    }
}

/// Result of a solver run.
///
/// The solution is always the best feasible-set iterate found, also when
/// the solver did not converge.
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// Final iterate
    pub solution: Vec<f64>,
    /// Objective value at the final iterate
    pub objective_value: f64,
    /// Total inner iterations performed
    pub iterations: usize,
    /// Convergence status
    pub status: ConvergenceStatus,
    /// Projected-gradient stationarity `‖x − P(x − ∇f(x))‖` at the final iterate
    pub gradient_norm: f64,
    /// Largest absolute equality-constraint residual (0.0 when there are none)
    pub constraint_violation: f64,
    /// Human-readable diagnostic
    pub message: String,
    /// Wall-clock time spent
    pub elapsed_time: Duration,
}

impl SolverResult {
    /// True if the solver converged.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ConvergenceStatus::Converged
    }
}

/// Gradient by central differences with per-coordinate step
/// `h · max(1, |x_i|)`.
///
/// # Example
///
/// ```
/// use folio_analytics::optim::numerical_gradient;
///
/// let f = |x: &[f64]| x[0] * x[0] + 3.0 * x[1];
/// let g = numerical_gradient(f, &[2.0, -1.0], 1e-6);
/// assert!((g[0] - 4.0).abs() < 1e-6);
/// assert!((g[1] - 3.0).abs() < 1e-6);
/// ```
pub fn numerical_gradient<F>(f: F, x: &[f64], h: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut probe = x.to_vec();
    (0..x.len())
        .map(|i| {
            let step = h * x[i].abs().max(1.0);
            probe[i] = x[i] + step;
            let plus = f(&probe);
            probe[i] = x[i] - step;
            let minus = f(&probe);
            probe[i] = x[i];
            (plus - minus) / (2.0 * step)
        })
        .collect()
}

fn sub(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// `‖x − P(x − g)‖`, zero exactly at constrained stationary points.
fn stationarity<P>(project: &P, x: &[f64], g: &[f64]) -> f64
where
    P: Fn(&[f64]) -> Vec<f64>,
{
    let moved: Vec<f64> = x.iter().zip(g).map(|(xi, gi)| xi - gi).collect();
    norm(&sub(x, &project(&moved)))
}

#[cfg(test)]
#[path = "optim_tests.rs"]
mod tests;
