//! Augmented Lagrangian method for equality-constrained optimization.

use std::time::Instant;

use super::{ConvergenceStatus, ProjectedGradientDescent, SolverResult};
use crate::control::StopToken;

/// Augmented Lagrangian method on top of projected gradient descent.
///
/// Solves problems of the form:
/// ```text
/// minimize f(x)
/// subject to h(x) = 0,  x ∈ C
/// ```
///
/// where C is handled exactly by a projection and `h` by multipliers.
///
/// # Algorithm
///
/// ```text
/// Augmented Lagrangian: L_ρ(x, λ) = f(x) + λᵀh(x) + ½ρ‖h(x)‖²
///
/// for k = 1, 2, ..., max_iter:
///     x_k = argmin_{x ∈ C} L_ρ(x, λ_k)     (projected gradient, warm start)
///     λ_k+1 = λ_k + ρ h(x_k)
///     if ‖h(x_k)‖∞ < tol and the subproblem converged: done
///     if ‖h(x_k)‖∞ > ¼‖h(x_k−1)‖∞: ρ = min(growth·ρ, ρ_max)
/// ```
///
/// # Example
///
/// ```
/// use folio_analytics::optim::{project_box, AugmentedLagrangian, ProjectedGradientDescent};
///
/// // Minimize ½(x₁−2)² + ½(x₂−3)² subject to x₁ + x₂ = 1, −10 ≤ x ≤ 10
/// let objective = |x: &[f64]| 0.5 * (x[0] - 2.0).powi(2) + 0.5 * (x[1] - 3.0).powi(2);
/// let gradient = |x: &[f64]| vec![x[0] - 2.0, x[1] - 3.0];
/// let equality = |x: &[f64]| vec![x[0] + x[1] - 1.0];
/// let jacobian = |_x: &[f64]| vec![vec![1.0, 1.0]];
/// let project = |x: &[f64]| project_box(x, &[-10.0; 2], &[10.0; 2]);
///
/// let al = AugmentedLagrangian::new(100, 1e-8, 1.0)
///     .with_inner(ProjectedGradientDescent::new(5000, 1.0, 1e-10));
/// let result = al.minimize_equality(objective, gradient, equality, jacobian, project, vec![0.0; 2]);
///
/// assert!(result.is_success());
/// assert!(result.constraint_violation < 1e-8);
/// assert!(result.solution[0].abs() < 1e-6);
/// assert!((result.solution[1] - 1.0).abs() < 1e-6);
/// ```
///
/// # References
///
/// - Nocedal & Wright (2006). "Numerical Optimization." Chapter 17.
/// - Bertsekas (1982). "Constrained Optimization and Lagrange Multiplier Methods."
#[derive(Debug, Clone)]
pub struct AugmentedLagrangian {
    /// Maximum number of outer iterations
    max_iter: usize,
    /// Convergence tolerance for constraint violation
    tol: f64,
    /// Initial penalty parameter
    initial_rho: f64,
    /// Penalty increase factor (> 1)
    rho_increase: f64,
    /// Maximum penalty parameter
    rho_max: f64,
    inner: ProjectedGradientDescent,
    stop: Option<StopToken>,
}

impl AugmentedLagrangian {
    /// Creates a new solver.
    ///
    /// # Arguments
    ///
    /// * `max_iter` - Maximum number of outer iterations
    /// * `tol` - Convergence tolerance for constraint violation
    /// * `initial_rho` - Initial penalty parameter (typically 1.0-10.0)
    #[must_use]
    pub fn new(max_iter: usize, tol: f64, initial_rho: f64) -> Self {
        Self {
            max_iter,
            tol,
            initial_rho,
            rho_increase: 10.0,
            rho_max: 1e10,
            inner: ProjectedGradientDescent::new(2000, 1.0, 1e-9),
            stop: None,
        }
    }

    /// Sets penalty increase factor.
    #[must_use]
    pub fn with_rho_increase(mut self, factor: f64) -> Self {
        self.rho_increase = factor;
        self
    }

    /// Caps the penalty parameter.
    #[must_use]
    pub fn with_rho_max(mut self, rho_max: f64) -> Self {
        self.rho_max = rho_max;
        self
    }

    /// Subproblem solver.
    #[must_use]
    pub fn with_inner(mut self, inner: ProjectedGradientDescent) -> Self {
        self.inner = inner;
        self
    }

    /// Polls `token` in every inner iteration.
    #[must_use]
    pub fn with_stop_token(mut self, token: StopToken) -> Self {
        self.stop = Some(token);
        self
    }

    /// Minimizes `objective` subject to `equality(x) = 0` and the set
    /// described by `project`.
    ///
    /// # Arguments
    ///
    /// * `objective` - Objective function f(x)
    /// * `gradient` - Gradient ∇f(x)
    /// * `equality` - Equality constraints h(x) = 0 (returns vector)
    /// * `equality_jac` - Jacobian of equality constraints, one row per constraint
    /// * `project` - Projection onto the simple constraint set
    /// * `x0` - Initial point
    pub fn minimize_equality<F, G, H, J, P>(
        &self,
        objective: F,
        gradient: G,
        equality: H,
        equality_jac: J,
        project: P,
        x0: Vec<f64>,
    ) -> SolverResult
    where
        F: Fn(&[f64]) -> f64,
        G: Fn(&[f64]) -> Vec<f64>,
        H: Fn(&[f64]) -> Vec<f64>,
        J: Fn(&[f64]) -> Vec<Vec<f64>>,
        P: Fn(&[f64]) -> Vec<f64>,
    {
        let start_time = Instant::now();
        let inner = match &self.stop {
            Some(token) => self.inner.clone().with_stop_token(token.clone()),
            None => self.inner.clone(),
        };

        let mut x = project(&x0);
        let mut lambda = vec![0.0; equality(&x).len()];
        let mut rho = self.initial_rho;
        let mut prev_violation = f64::INFINITY;
        let mut iterations = 0;
        let mut last = None;

        for _ in 0..self.max_iter {
            let (lam, r) = (lambda.clone(), rho);
            let aug_objective = |z: &[f64]| {
                let h = equality(z);
                let penalty: f64 = h
                    .iter()
                    .zip(&lam)
                    .map(|(hj, lj)| lj * hj + 0.5 * r * hj * hj)
                    .sum();
                objective(z) + penalty
            };
            let aug_gradient = |z: &[f64]| {
                let mut g = gradient(z);
                let h = equality(z);
                for (row, (hj, lj)) in equality_jac(z).iter().zip(h.iter().zip(&lam)) {
                    let coeff = lj + r * hj;
                    for (gi, ji) in g.iter_mut().zip(row) {
                        *gi += coeff * ji;
                    }
                }
                g
            };

            let sub = inner.minimize(aug_objective, aug_gradient, &project, x);
            iterations += sub.iterations;
            x = sub.solution;

            let h = equality(&x);
            let violation = h.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            let outcome = Outcome {
                iterations,
                violation,
                gradient_norm: sub.gradient_norm,
            };

            match sub.status {
                ConvergenceStatus::UserTerminated | ConvergenceStatus::NumericalError => {
                    return outcome.into_result(x, &objective, sub.status, sub.message, start_time);
                }
                ConvergenceStatus::Converged if violation < self.tol => {
                    let status = ConvergenceStatus::Converged;
                    let message = status.message().to_string();
                    return outcome.into_result(x, &objective, status, message, start_time);
                }
                _ => {}
            }

            for (lj, hj) in lambda.iter_mut().zip(&h) {
                *lj += rho * hj;
            }
            if violation > 0.25 * prev_violation {
                rho = (rho * self.rho_increase).min(self.rho_max);
            }
            prev_violation = violation;
            last = Some((outcome, sub.status));
        }

        let (outcome, inner_status) = last.unwrap_or((
            Outcome {
                iterations,
                violation: f64::INFINITY,
                gradient_norm: f64::NAN,
            },
            ConvergenceStatus::MaxIterations,
        ));
        let (status, message) = if outcome.violation >= self.tol {
            let status = ConvergenceStatus::Infeasible;
            let message = format!("{} (violation = {:.3e})", status.message(), outcome.violation);
            (status, message)
        } else {
            // Feasible, but the last subproblem was not solved to tolerance
            let status = match inner_status {
                ConvergenceStatus::Converged => ConvergenceStatus::MaxIterations,
                other => other,
            };
            (status, status.message().to_string())
        };
        tracing::debug!(
            iterations = outcome.iterations,
            violation = outcome.violation,
            ?status,
            "augmented lagrangian stopped without converging"
        );
        outcome.into_result(x, &objective, status, message, start_time)
    }
}

/// Bookkeeping of the latest outer iteration.
#[derive(Debug, Clone, Copy)]
struct Outcome {
    iterations: usize,
    violation: f64,
    gradient_norm: f64,
}

impl Outcome {
    fn into_result<F>(
        self,
        x: Vec<f64>,
        objective: &F,
        status: ConvergenceStatus,
        message: String,
        start_time: Instant,
    ) -> SolverResult
    where
        F: Fn(&[f64]) -> f64,
    {
        SolverResult {
            objective_value: objective(&x),
            solution: x,
            iterations: self.iterations,
            status,
            gradient_norm: self.gradient_norm,
            constraint_violation: self.violation,
            message,
            elapsed_time: start_time.elapsed(),
        }
    }
}
