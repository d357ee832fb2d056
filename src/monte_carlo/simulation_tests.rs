use super::*;
use crate::control::StopToken;
use crate::error::AnalyticsError;

// ===== monte carlo =====

#[test]
fn test_monte_carlo_reproducible() {
    let a = monte_carlo(0.0005, 0.01, 600, 50, 9).expect("valid");
    let b = monte_carlo(0.0005, 0.01, 600, 50, 9).expect("valid");
    assert_eq!(a, b);

    let c = monte_carlo(0.0005, 0.01, 600, 50, 10).expect("valid");
    assert_ne!(a.outcomes, c.outcomes);
}

#[test]
fn test_monte_carlo_thread_count_independent() {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(1)
        .build()
        .expect("thread pool");
    let single = pool.install(|| monte_carlo(0.0003, 0.015, 1_000, 20, 5).expect("valid"));
    let parallel = monte_carlo(0.0003, 0.015, 1_000, 20, 5).expect("valid");
    assert_eq!(single, parallel);
}

#[test]
fn test_monte_carlo_blocks_extend_prefix() {
    let full = monte_carlo(0.0, 0.02, BLOCK_SIZE + 44, 10, 3).expect("valid");
    let first_block = monte_carlo(0.0, 0.02, BLOCK_SIZE, 10, 3).expect("valid");
    assert_eq!(full.outcomes.len(), BLOCK_SIZE + 44);
    assert_eq!(&full.outcomes[..BLOCK_SIZE], first_block.outcomes.as_slice());
}

#[test]
fn test_monte_carlo_zero_std_is_deterministic() {
    let result = monte_carlo(0.001, 0.0, 100, 12, 1).expect("valid");
    let expected = 1.001_f64.powi(12) - 1.0;
    for outcome in &result.outcomes {
        assert!((outcome - expected).abs() < 1e-15);
    }
    assert_eq!(result.summary.std, 0.0);
    assert_eq!(result.summary.standard_error, 0.0);
    assert_eq!(result.summary.prob_positive, 1.0);
}

#[test]
fn test_monte_carlo_mean_matches_compounding() {
    let result = monte_carlo(0.001, 0.01, 4_000, 10, 123).expect("valid");
    let expected = 1.001_f64.powi(10) - 1.0;
    // Per-scenario std ≈ 0.0316, standard error ≈ 0.0005
    assert!((result.summary.mean - expected).abs() < 0.003);
    assert!(result.summary.standard_error > 0.0 && result.summary.standard_error < 0.001);
}

#[test]
fn test_monte_carlo_summary_ordering() {
    let s = monte_carlo(0.0002, 0.02, 2_000, 30, 77).expect("valid").summary;
    assert_eq!(s.scenarios, 2_000);
    assert!(s.min <= s.p5);
    assert!(s.p5 <= s.p25);
    assert!(s.p25 <= s.median);
    assert!(s.median <= s.p75);
    assert!(s.p75 <= s.p95);
    assert!(s.p95 <= s.max);
    assert!((0.0..=1.0).contains(&s.prob_positive));
}

#[test]
fn test_monte_carlo_rejects_bad_parameters() {
    for result in [
        monte_carlo(f64::NAN, 0.01, 10, 10, 0),
        monte_carlo(0.0, -0.01, 10, 10, 0),
        monte_carlo(0.0, 0.01, 0, 10, 0),
        monte_carlo(0.0, 0.01, 10, 0, 0),
    ] {
        assert!(matches!(result, Err(AnalyticsError::InvalidParameter { .. })));
    }
}

#[test]
fn test_monte_carlo_cancelled() {
    let token = StopToken::new();
    token.cancel();
    let err = monte_carlo_with_stop(0.0, 0.01, 1_000, 10, 0, &token).expect_err("cancelled");
    assert!(matches!(err, AnalyticsError::Cancelled));
}

#[test]
fn test_monte_carlo_deadline() {
    let token = StopToken::new().with_deadline(std::time::Instant::now());
    let err = monte_carlo_with_stop(0.0, 0.01, 1_000, 10, 0, &token).expect_err("expired");
    assert!(matches!(err, AnalyticsError::DeadlineExceeded));
}

#[test]
fn test_summary_of_nothing() {
    assert_eq!(MonteCarloSummary::from_outcomes(&[]), MonteCarloSummary::default());
}

#[test]
fn test_summary_known_values() {
    let s = MonteCarloSummary::from_outcomes(&[-0.1, 0.0, 0.1, 0.2, 0.3]);
    assert!((s.mean - 0.1).abs() < 1e-15);
    assert!((s.median - 0.1).abs() < 1e-15);
    assert!((s.min + 0.1).abs() < 1e-15);
    assert!((s.max - 0.3).abs() < 1e-15);
    assert!((s.prob_positive - 0.6).abs() < 1e-15);
    assert!((s.p25 - 0.0).abs() < 1e-15);
}

// ===== cppi =====

#[test]
fn test_cppi_flat_market_keeps_value() {
    let params = CppiParams::new(0.0, 0.0).with_time_horizon(10);
    let path = cppi_path(&params, 0).expect("valid");
    assert!(path.values.iter().all(|v| (*v - 1.0).abs() < 1e-15));
    // cushion 0.2 times multiplier 3
    assert!(path.exposures.iter().all(|e| (*e - 0.6).abs() < 1e-12));
    assert!(!path.floor_breached);
    assert_eq!(path.max_drawdown, 0.0);
}

#[test]
fn test_cppi_zero_multiplier_earns_safe_return() {
    let params = CppiParams::new(0.01, 0.05)
        .with_multiplier(0.0)
        .with_safe_return(0.001)
        .with_time_horizon(20);
    let path = cppi_path(&params, 4).expect("valid");
    assert!((path.final_value - 1.001_f64.powi(20)).abs() < 1e-12);
    assert!(path.exposures.iter().all(|e| *e == 0.0));
}

#[test]
fn test_cppi_steady_losses_respect_floor() {
    // Each step loses 0.15 of the cushion, so the floor is approached but never crossed
    let params = CppiParams::new(-0.05, 0.0).with_time_horizon(100);
    let path = cppi_path(&params, 0).expect("valid");
    assert!(!path.floor_breached);
    assert!(path.final_value > path.floor_value);
    assert!(path.final_value < 1.0);
    assert_eq!(path.max_value, 1.0);
    assert!((path.max_drawdown - (path.final_value - 1.0)).abs() < 1e-12);
    assert!((path.min_value - path.final_value).abs() < 1e-15);
}

#[test]
fn test_cppi_gap_loss_breaches_floor() {
    let params = CppiParams::new(-0.5, 0.0)
        .with_multiplier(10.0)
        .with_time_horizon(5);
    let path = cppi_path(&params, 0).expect("valid");
    assert!(path.floor_breached);
    assert!((path.final_value - 0.5).abs() < 1e-15);
    assert_eq!(path.exposures[0], 1.0);
    assert!(path.exposures[1..].iter().all(|e| *e == 0.0));
    assert!((path.max_drawdown + 0.5).abs() < 1e-15);
}

#[test]
fn test_cppi_params_validation() {
    assert!(CppiParams::new(0.0, 0.01).validate().is_ok());
    assert!(CppiParams::new(0.0, 0.01).with_floor(1.0).validate().is_err());
    assert!(CppiParams::new(0.0, 0.01).with_multiplier(-1.0).validate().is_err());
    assert!(CppiParams::new(0.0, 0.01).with_time_horizon(0).validate().is_err());
    assert!(CppiParams::new(0.0, 0.01).with_safe_return(-1.0).validate().is_err());
    assert!(CppiParams::new(0.0, f64::INFINITY).validate().is_err());
}

#[test]
fn test_cppi_simulation_summary() {
    let params = CppiParams::new(0.0003, 0.02).with_time_horizon(60);
    let a = cppi_simulation(&params, 700, 21, None).expect("valid");
    let b = cppi_simulation(&params, 700, 21, None).expect("valid");
    assert_eq!(a, b);

    assert_eq!(a.paths, 700);
    assert!((0.0..=1.0).contains(&a.breach_probability));
    assert!(a.worst_max_drawdown <= a.mean_max_drawdown);
    assert!(a.mean_max_drawdown <= 0.0);
    assert!(a.min_final_value <= a.p5_final_value);
    assert!(a.p5_final_value <= a.median_final_value);
    assert!(a.median_final_value <= a.p95_final_value);
    assert!(a.p95_final_value <= a.max_final_value);
}

#[test]
fn test_cppi_simulation_rejects_zero_paths() {
    let params = CppiParams::new(0.0, 0.01);
    assert!(matches!(
        cppi_simulation(&params, 0, 0, None),
        Err(AnalyticsError::InvalidParameter { .. })
    ));
}

#[test]
fn test_cppi_simulation_cancelled() {
    let token = StopToken::new();
    token.cancel();
    let params = CppiParams::new(0.0, 0.01);
    assert!(matches!(
        cppi_simulation(&params, 100, 0, Some(&token)),
        Err(AnalyticsError::Cancelled)
    ));
}
