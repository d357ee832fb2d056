use super::*;
use crate::control::StopToken;

fn simplex(n: usize) -> impl Fn(&[f64]) -> Vec<f64> {
    move |x: &[f64]| project_capped_simplex(x, &vec![0.0; n], &vec![1.0; n], 1.0)
}

// ===== projections =====

#[test]
fn test_project_box_clamps() {
    let p = project_box(&[-1.0, 0.5, 2.0], &[0.0; 3], &[1.0; 3]);
    assert_eq!(p, vec![0.0, 0.5, 1.0]);
}

#[test]
fn test_project_box_crossed_bounds_take_upper() {
    let p = project_box(&[0.5, -3.0, 4.0], &[0.8, 0.0, 0.0], &[0.2, 1.0, 1.0]);
    assert_eq!(p, vec![0.2, 0.0, 1.0]);
}

#[test]
fn test_capped_simplex_crossed_bounds_do_not_panic() {
    let p = project_capped_simplex(&[0.5, 0.5], &[0.8, 0.0], &[0.2, 1.0], 1.0);
    assert_eq!(p[0], 0.2);
    assert!((p[0] + p[1] - 1.0).abs() < 1e-9);
}

#[test]
fn test_capped_simplex_feasible_point_unchanged() {
    let v = [0.2, 0.3, 0.5];
    let p = project_capped_simplex(&v, &[0.0; 3], &[1.0; 3], 1.0);
    for (a, b) in p.iter().zip(&v) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn test_capped_simplex_sum_and_bounds() {
    let lower = [0.05, 0.05, 0.05, 0.05];
    let upper = [0.4, 0.4, 0.4, 0.4];
    let p = project_capped_simplex(&[3.0, -2.0, 0.7, 0.1], &lower, &upper, 1.0);
    assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    for (i, w) in p.iter().enumerate() {
        assert!(*w >= lower[i] - 1e-15 && *w <= upper[i] + 1e-15, "w[{i}] = {w}");
    }
    assert!((p[0] - 0.4).abs() < 1e-12);
    assert!((p[1] - 0.05).abs() < 1e-12);
}

#[test]
fn test_capped_simplex_is_nearest_point() {
    // Equal shifts: projecting (1, 1) onto the 2-simplex gives (0.5, 0.5)
    let p = project_capped_simplex(&[1.0, 1.0], &[0.0; 2], &[1.0; 2], 1.0);
    assert!((p[0] - 0.5).abs() < 1e-12);
    assert!((p[1] - 0.5).abs() < 1e-12);
}

#[test]
fn test_capped_simplex_empty_set_returns_nearest_bound() {
    assert_eq!(
        project_capped_simplex(&[0.3, 0.3], &[0.6, 0.6], &[1.0; 2], 1.0),
        vec![0.6, 0.6]
    );
    assert_eq!(
        project_capped_simplex(&[0.3, 0.3], &[0.0; 2], &[0.4, 0.4], 1.0),
        vec![0.4, 0.4]
    );
}

#[test]
fn test_single_asset_simplex() {
    assert_eq!(project_capped_simplex(&[7.0], &[0.0], &[1.0], 1.0), vec![1.0]);
}

// ===== numerical gradient =====

#[test]
fn test_numerical_gradient_quadratic() {
    let f = |x: &[f64]| 3.0 * x[0] * x[0] + x[0] * x[1];
    let g = numerical_gradient(f, &[1.0, 2.0], 1e-6);
    assert!((g[0] - 8.0).abs() < 1e-6);
    assert!((g[1] - 1.0).abs() < 1e-6);
}

// ===== projected gradient =====

#[test]
fn test_pgd_box_constrained_quadratic() {
    let c = [1.0, -2.0, 3.0, -1.0];
    let objective = |x: &[f64]| x.iter().zip(&c).map(|(a, b)| 0.5 * (a - b).powi(2)).sum::<f64>();
    let gradient = |x: &[f64]| x.iter().zip(&c).map(|(a, b)| a - b).collect::<Vec<_>>();
    let project = |x: &[f64]| project_box(x, &[0.0; 4], &[f64::INFINITY; 4]);

    let result = ProjectedGradientDescent::new(1000, 0.1, 1e-10).minimize(
        objective,
        gradient,
        project,
        vec![0.0; 4],
    );

    assert!(result.is_success());
    assert_eq!(result.message, MSG_SUCCESS);
    let expected = [1.0, 0.0, 3.0, 0.0];
    for (x, e) in result.solution.iter().zip(&expected) {
        assert!((x - e).abs() < 1e-8);
    }
}

#[test]
fn test_pgd_min_variance_on_simplex() {
    // Diagonal variances 1, 4: minimum-variance weights are 0.8, 0.2
    let var = [1.0, 4.0];
    let objective = |w: &[f64]| w.iter().zip(&var).map(|(x, v)| v * x * x).sum::<f64>();
    let gradient = |w: &[f64]| w.iter().zip(&var).map(|(x, v)| 2.0 * v * x).collect::<Vec<_>>();

    let result = ProjectedGradientDescent::new(2000, 1.0, 1e-10).minimize(
        objective,
        gradient,
        simplex(2),
        vec![0.5, 0.5],
    );

    assert!(result.is_success());
    assert!((result.solution[0] - 0.8).abs() < 1e-8);
    assert!((result.solution[1] - 0.2).abs() < 1e-8);
    assert!(result.gradient_norm < 1e-10);
}

#[test]
fn test_pgd_iteration_limit() {
    let objective = |x: &[f64]| x[0].powi(4) + 1e-3 * x[1].powi(2);
    let gradient = |x: &[f64]| vec![4.0 * x[0].powi(3), 2e-3 * x[1]];
    let project = |x: &[f64]| x.to_vec();

    let result = ProjectedGradientDescent::new(3, 0.01, 1e-14).minimize(
        objective,
        gradient,
        project,
        vec![5.0, 5.0],
    );

    assert_eq!(result.status, ConvergenceStatus::MaxIterations);
    assert_eq!(result.message, MSG_MAX_ITERATIONS);
    assert_eq!(result.iterations, 3);
    assert!(result.objective_value < objective(&[5.0, 5.0]));
}

#[test]
fn test_pgd_non_finite_objective() {
    let objective = |_: &[f64]| f64::INFINITY;
    let gradient = |x: &[f64]| vec![0.0; x.len()];
    let result = ProjectedGradientDescent::new(10, 1.0, 1e-9).minimize(
        objective,
        gradient,
        simplex(2),
        vec![0.5, 0.5],
    );
    assert_eq!(result.status, ConvergenceStatus::NumericalError);
    assert!(!result.is_success());
}

#[test]
fn test_pgd_cancelled() {
    let token = StopToken::new();
    token.cancel();
    let objective = |w: &[f64]| w[0] * w[0];
    let gradient = |w: &[f64]| vec![2.0 * w[0], 0.0];
    let result = ProjectedGradientDescent::new(100, 1.0, 1e-9)
        .with_stop_token(token)
        .minimize(objective, gradient, simplex(2), vec![0.5, 0.5]);
    assert_eq!(result.status, ConvergenceStatus::UserTerminated);
    assert_eq!(result.message, "cancelled");
    assert!((result.solution[0] - 0.5).abs() < 1e-12);
    assert_eq!(result.iterations, 0);
}

// ===== augmented lagrangian =====

#[test]
fn test_al_linear_equality_on_simplex() {
    // min w'Σw, Σ = diag(1, 1, 1), subject to μ'w = 0.2, w in simplex
    // with μ = (0.1, 0.2, 0.3): symmetric solution is (1/3, 1/3, 1/3)
    let mu = [0.1, 0.2, 0.3];
    let objective = |w: &[f64]| w.iter().map(|x| x * x).sum::<f64>();
    let gradient = |w: &[f64]| w.iter().map(|x| 2.0 * x).collect::<Vec<_>>();
    let equality = |w: &[f64]| vec![w.iter().zip(&mu).map(|(x, m)| x * m).sum::<f64>() - 0.2];
    let jacobian = |_: &[f64]| vec![mu.to_vec()];

    let result = AugmentedLagrangian::new(100, 1e-8, 10.0).minimize_equality(
        objective,
        gradient,
        equality,
        jacobian,
        simplex(3),
        vec![0.6, 0.3, 0.1],
    );

    assert!(result.is_success(), "{}", result.message);
    assert!(result.constraint_violation < 1e-8);
    for w in &result.solution {
        assert!((w - 1.0 / 3.0).abs() < 1e-5);
    }
}

#[test]
fn test_al_target_pulls_away_from_unconstrained_optimum() {
    // min w'w on the simplex alone gives (0.5, 0.5); the target forces (0.25, 0.75)
    let mu = [0.0, 0.4];
    let objective = |w: &[f64]| w.iter().map(|x| x * x).sum::<f64>();
    let gradient = |w: &[f64]| w.iter().map(|x| 2.0 * x).collect::<Vec<_>>();
    let equality = |w: &[f64]| vec![0.4 * w[1] - 0.3];
    let jacobian = |_: &[f64]| vec![mu.to_vec()];

    let result = AugmentedLagrangian::new(100, 1e-8, 10.0).minimize_equality(
        objective,
        gradient,
        equality,
        jacobian,
        simplex(2),
        vec![0.5, 0.5],
    );

    assert!(result.is_success(), "{}", result.message);
    assert!((result.solution[0] - 0.25).abs() < 1e-6);
    assert!((result.solution[1] - 0.75).abs() < 1e-6);
}

#[test]
fn test_al_infeasible_target_reports_violation() {
    // μ'w <= 0.3 on the simplex, so 0.5 is unreachable
    let mu = [0.1, 0.3];
    let objective = |w: &[f64]| w.iter().map(|x| x * x).sum::<f64>();
    let gradient = |w: &[f64]| w.iter().map(|x| 2.0 * x).collect::<Vec<_>>();
    let equality = |w: &[f64]| vec![0.1 * w[0] + 0.3 * w[1] - 0.5];
    let jacobian = |_: &[f64]| vec![mu.to_vec()];

    let result = AugmentedLagrangian::new(10, 1e-8, 10.0).minimize_equality(
        objective,
        gradient,
        equality,
        jacobian,
        simplex(2),
        vec![0.5, 0.5],
    );

    assert!(!result.is_success());
    assert!(result.constraint_violation > 0.1);
    // Best iterate is still a valid point of the simplex
    assert!((result.solution.iter().sum::<f64>() - 1.0).abs() < 1e-9);
}

#[test]
fn test_al_deadline() {
    let token = StopToken::new().with_deadline(std::time::Instant::now());
    let objective = |w: &[f64]| w.iter().map(|x| x * x).sum::<f64>();
    let gradient = |w: &[f64]| w.iter().map(|x| 2.0 * x).collect::<Vec<_>>();
    let equality = |w: &[f64]| vec![w[0] - 0.3];
    let jacobian = |_: &[f64]| vec![vec![1.0, 0.0]];

    let result = AugmentedLagrangian::new(10, 1e-8, 10.0)
        .with_stop_token(token)
        .minimize_equality(objective, gradient, equality, jacobian, simplex(2), vec![0.5, 0.5]);

    assert_eq!(result.status, ConvergenceStatus::UserTerminated);
    assert_eq!(result.message, "deadline exceeded");
}
