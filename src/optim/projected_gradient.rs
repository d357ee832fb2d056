//! Projected Gradient Descent for constrained optimization.

use std::time::Instant;

use super::{stationarity, sub, ConvergenceStatus, SolverResult};
use crate::control::StopToken;
use crate::primitives::norm;

/// Upper limit for the adaptive step size.
const MAX_STEP: f64 = 1e12;

/// Projected Gradient Descent with Armijo backtracking.
///
/// Solves problems of the form:
/// ```text
/// minimize f(x)
/// subject to x ∈ C
/// ```
///
/// where C is a closed convex set with an exact projection operator.
///
/// # Algorithm
///
/// ```text
/// for k = 1, 2, ..., max_iter:
///     α = 2α                               (try a longer step first)
///     repeat: y = P_C(x_k − α∇f(x_k)),  α = βα
///     until f(y) ≤ f(x_k) + c₁ ∇f(x_k)ᵀ(y − x_k)
///     x_k+1 = y
/// ```
///
/// Stops when `‖x − P_C(x − ∇f(x))‖ < tol`, or when the objective no
/// longer changes at machine precision.
///
/// # References
///
/// - Bertsekas (1999). "Nonlinear Programming."
/// - Beck (2017). "First-Order Methods in Optimization." Chapter 10.
#[derive(Debug, Clone)]
pub struct ProjectedGradientDescent {
    /// Maximum number of iterations
    max_iter: usize,
    /// Initial step size
    step_size: f64,
    /// Stationarity tolerance
    tol: f64,
    /// Backtracking factor (0 < beta < 1)
    beta: f64,
    /// Armijo sufficient-decrease constant
    c1: f64,
    stop: Option<StopToken>,
}

impl ProjectedGradientDescent {
    /// Creates a new solver.
    ///
    /// # Arguments
    ///
    /// * `max_iter` - Maximum number of iterations
    /// * `step_size` - Initial step size, adapted by the line search
    /// * `tol` - Projected-gradient stationarity tolerance
    #[must_use]
    pub fn new(max_iter: usize, step_size: f64, tol: f64) -> Self {
        Self {
            max_iter,
            step_size,
            tol,
            beta: 0.5,
            c1: 1e-4,
            stop: None,
        }
    }

    /// Sets the backtracking factor.
    #[must_use]
    pub fn with_backtracking(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Polls `token` once per iteration.
    #[must_use]
    pub fn with_stop_token(mut self, token: StopToken) -> Self {
        self.stop = Some(token);
        self
    }

    /// Maximum number of iterations.
    #[must_use]
    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    /// Minimizes `objective` over the set described by `project`, starting
    /// from the projection of `x0`.
    pub fn minimize<F, G, P>(
        &self,
        objective: F,
        gradient: G,
        project: P,
        x0: Vec<f64>,
    ) -> SolverResult
    where
        F: Fn(&[f64]) -> f64,
        G: Fn(&[f64]) -> Vec<f64>,
        P: Fn(&[f64]) -> Vec<f64>,
    {
        let start_time = Instant::now();
        let mut x = project(&x0);
        let mut f_x = objective(&x);
        let mut alpha = self.step_size;

        let finish = |x: Vec<f64>,
                      f_x: f64,
                      iterations: usize,
                      gnorm: f64,
                      status: ConvergenceStatus,
                      message: &str| SolverResult {
            solution: x,
            objective_value: f_x,
            iterations,
            status,
            gradient_norm: gnorm,
            constraint_violation: 0.0,
            message: message.to_string(),
            elapsed_time: start_time.elapsed(),
        };

        for iter in 0..self.max_iter {
            if let Some(reason) = self.stop.as_ref().and_then(StopToken::check) {
                let grad = gradient(&x);
                let gnorm = stationarity(&project, &x, &grad);
                return finish(x, f_x, iter, gnorm, ConvergenceStatus::UserTerminated, reason.message());
            }

            let grad = gradient(&x);
            if !f_x.is_finite() || grad.iter().any(|g| !g.is_finite()) {
                let status = ConvergenceStatus::NumericalError;
                return finish(x, f_x, iter, f64::NAN, status, status.message());
            }

            let gnorm = stationarity(&project, &x, &grad);
            if gnorm < self.tol {
                let status = ConvergenceStatus::Converged;
                return finish(x, f_x, iter, gnorm, status, status.message());
            }

            // Backtracking line search along the projection arc
            alpha = (alpha * 2.0).min(MAX_STEP);
            let mut accepted = None;
            for _ in 0..60 {
                let trial: Vec<f64> = x
                    .iter()
                    .zip(&grad)
                    .map(|(xi, gi)| xi - alpha * gi)
                    .collect();
                let y = project(&trial);
                let f_y = objective(&y);
                let decrease: f64 = grad.iter().zip(sub(&y, &x)).map(|(g, d)| g * d).sum();
                if f_y.is_finite() && f_y <= f_x + self.c1 * decrease {
                    accepted = Some((y, f_y));
                    break;
                }
                alpha *= self.beta;
            }

            let Some((y, f_y)) = accepted else {
                let status = ConvergenceStatus::Stalled;
                return finish(x, f_x, iter + 1, gnorm, status, status.message());
            };

            let step = norm(&sub(&y, &x));
            let f_change = (f_x - f_y).abs();
            x = y;
            f_x = f_y;

            // Nothing left to gain at machine precision
            let flat = f_change <= 4.0 * f64::EPSILON * f_x.abs().max(f64::MIN_POSITIVE);
            if step == 0.0 || (flat && step < self.tol.sqrt()) {
                let grad = gradient(&x);
                let gnorm = stationarity(&project, &x, &grad);
                let status = ConvergenceStatus::Converged;
                return finish(x, f_x, iter + 1, gnorm, status, status.message());
            }
        }

        let grad = gradient(&x);
        let gnorm = stationarity(&project, &x, &grad);
        let status = if gnorm < self.tol {
            ConvergenceStatus::Converged
        } else {
            ConvergenceStatus::MaxIterations
        };
        finish(x, f_x, self.max_iter, gnorm, status, status.message())
    }
}
