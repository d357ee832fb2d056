use super::*;
use crate::data::{ReturnMatrix, WeightVector};
use crate::error::AnalyticsError;
use crate::primitives::Matrix;
use chrono::NaiveDate;
use std::collections::BTreeMap;

fn dates(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    (0..n)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect()
}

fn sample_returns() -> ReturnMatrix {
    ReturnMatrix::from_columns(
        dates(6),
        vec![
            ("A".into(), vec![0.010, -0.020, 0.015, 0.003, -0.007, 0.012]),
            ("B".into(), vec![0.004, -0.010, 0.009, 0.001, -0.002, 0.006]),
            ("C".into(), vec![-0.005, 0.012, -0.004, 0.002, 0.008, -0.006]),
        ],
    )
    .expect("valid")
}

fn symbols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

// ===== covariance / correlation =====

#[test]
fn test_covariance_symmetric_and_annualized() {
    let returns = sample_returns();
    let daily = covariance_matrix(&returns, false, 252.0).expect("cov");
    let annual = covariance_matrix(&returns, true, 252.0).expect("cov");
    assert!(daily.matrix().is_symmetric(0.0));
    assert!(!daily.is_annualized());
    let ab = daily.get("A", "B").expect("known");
    assert!((annual.get("A", "B").expect("known") - 252.0 * ab).abs() < 1e-15);
    assert_eq!(daily.get("A", "Z"), None);
}

#[test]
fn test_covariance_diagonal_matches_sample_variance() {
    let returns = sample_returns();
    let cov = covariance_matrix(&returns, false, 252.0).expect("cov");
    let a = returns.column("A").expect("A");
    let std = crate::stats::sample_std(&a);
    assert!((cov.get("A", "A").expect("known") - std * std).abs() < 1e-15);
    assert!((cov.volatilities()[0] - std).abs() < 1e-12);
}

#[test]
fn test_covariance_insufficient_rows() {
    let returns =
        ReturnMatrix::from_columns(dates(1), vec![("A".into(), vec![0.01])]).expect("valid");
    let err = covariance_matrix(&returns, true, 252.0).unwrap_err();
    assert!(matches!(err, AnalyticsError::InsufficientData { .. }));
}

#[test]
fn test_covariance_drops_incomplete_rows() {
    let returns = ReturnMatrix::from_columns(
        dates(4),
        vec![
            ("A".into(), vec![0.01, f64::NAN, -0.01, 0.02]),
            ("B".into(), vec![0.02, 0.5, -0.02, 0.04]),
        ],
    )
    .expect("valid");
    let cov = covariance_matrix(&returns, false, 252.0).expect("cov");
    let corr = cov.to_correlation();
    assert!((corr.get("A", "B").expect("known") - 1.0).abs() < 1e-12);
}

#[test]
fn test_correlation_pairwise_complete() {
    let returns = ReturnMatrix::from_columns(
        dates(4),
        vec![
            ("A".into(), vec![0.01, f64::NAN, -0.01, 0.02]),
            ("B".into(), vec![0.02, 0.5, -0.02, 0.04]),
            ("C".into(), vec![-0.01, 0.3, 0.01, -0.02]),
        ],
    )
    .expect("valid");
    let corr = correlation_matrix(&returns).expect("corr");
    assert!((corr.get("A", "B").expect("known") - 1.0).abs() < 1e-12);
    assert!((corr.get("A", "C").expect("known") + 1.0).abs() < 1e-12);
    assert_eq!(corr.get("B", "B"), Some(1.0));
    // B and C use all four rows
    let bc = corr.get("B", "C").expect("known");
    assert!(bc > 0.0 && bc < 1.0);
}

#[test]
fn test_correlation_constant_column_is_zero() {
    let returns = ReturnMatrix::from_columns(
        dates(3),
        vec![
            ("A".into(), vec![0.01, 0.01, 0.01]),
            ("B".into(), vec![0.02, -0.01, 0.00]),
        ],
    )
    .expect("valid");
    let corr = correlation_matrix(&returns).expect("corr");
    assert_eq!(corr.get("A", "B"), Some(0.0));
}

#[test]
fn test_covariance_new_validates_shape() {
    let err = CovarianceMatrix::new(symbols(&["A", "B"]), Matrix::eye(3), false).unwrap_err();
    assert!(matches!(err, AnalyticsError::DimensionMismatch { .. }));
    let mut asym = Matrix::eye(2);
    asym.set(0, 1, 0.5);
    assert!(CovarianceMatrix::new(symbols(&["A", "B"]), asym, false).is_err());
}

#[test]
fn test_to_map_is_nested() {
    let cov = CovarianceMatrix::new(symbols(&["A", "B"]), Matrix::diag(&[0.04, 0.09]), true)
        .expect("valid");
    let map = cov.to_map();
    assert_eq!(map["A"]["A"], 0.04);
    assert_eq!(map["B"]["A"], 0.0);
}

// ===== decomposition =====

#[test]
fn test_portfolio_variance_quadratic_form() {
    let mut m = Matrix::diag(&[0.04, 0.09]);
    m.set(0, 1, 0.01);
    m.set(1, 0, 0.01);
    let cov = CovarianceMatrix::new(symbols(&["A", "B"]), m, true).expect("valid");
    let w = WeightVector::from_pairs([("A", 0.5), ("B", 0.5)]).expect("valid");
    let expected = 0.25 * 0.04 + 0.25 * 0.09 + 2.0 * 0.25 * 0.01;
    assert!((portfolio_variance(&w, &cov).expect("ok") - expected).abs() < 1e-15);
}

#[test]
fn test_portfolio_variance_negative_is_clamped() {
    // Not PSD: eigenvalues 1.5 and -0.5
    let mut m = Matrix::eye(2);
    m.set(0, 1, 1.0);
    m.set(1, 0, 1.0);
    m.set(0, 0, 0.5);
    m.set(1, 1, 0.5);
    let cov = CovarianceMatrix::new(symbols(&["A", "B"]), m, false).expect("valid");
    let w = WeightVector::from_pairs([("A", 1.0), ("B", -1.0)]).expect("valid");
    assert_eq!(portfolio_variance(&w, &cov).expect("ok"), VARIANCE_FLOOR);
}

#[test]
fn test_risk_contribution_zero_when_variance_clamped() {
    // Off-diagonal slightly above the diagonal: wᵗΣw ≈ -5e-8 for a long/short pair
    let sigma = Matrix::from_vec(2, 2, vec![1.0, 1.000_000_1, 1.000_000_1, 1.0]).expect("square");
    let cov = CovarianceMatrix::new(symbols(&["A", "B"]), sigma, false).expect("valid");
    let w = WeightVector::from_pairs([("A", 0.5), ("B", -0.5)]).expect("valid");

    let rc = risk_contribution(&w, &cov).expect("known symbols");
    assert_eq!(rc.portfolio_variance, VARIANCE_FLOOR);
    assert!(rc.percentage.iter().all(|p| *p == 0.0));
    assert!(rc.contribution.iter().all(|c| *c == 0.0));
    assert_eq!(rc.total_percentage(), 0.0);
    assert_eq!(diversification_ratio(&w, &cov).expect("known symbols"), 0.0);
}

#[test]
fn test_portfolio_variance_unknown_asset() {
    let cov = CovarianceMatrix::new(symbols(&["A"]), Matrix::eye(1), false).expect("valid");
    let w = WeightVector::from_pairs([("Z", 1.0)]).expect("valid");
    assert!(matches!(
        portfolio_variance(&w, &cov),
        Err(AnalyticsError::UnknownAsset { .. })
    ));
}

#[test]
fn test_risk_contribution_sums_to_one() {
    let cov = covariance_matrix(&sample_returns(), true, 252.0).expect("cov");
    let w = WeightVector::from_pairs([("A", 0.5), ("B", 0.3), ("C", 0.2)]).expect("valid");
    let rc = risk_contribution(&w, &cov).expect("ok");
    assert!((rc.total_percentage() - 1.0).abs() < 1e-9);
    let vol_sum: f64 = rc.contribution.iter().sum();
    assert!((vol_sum - rc.portfolio_volatility).abs() < 1e-12);
    assert_eq!(rc.percentage_map().len(), 3);
}

#[test]
fn test_risk_contribution_zero_variance() {
    let cov = CovarianceMatrix::new(symbols(&["A", "B"]), Matrix::zeros(2, 2), false)
        .expect("valid");
    let w = WeightVector::from_pairs([("A", 0.5), ("B", 0.5)]).expect("valid");
    let rc = risk_contribution(&w, &cov).expect("ok");
    assert_eq!(rc.percentage, vec![0.0, 0.0]);
    assert_eq!(rc.contribution, vec![0.0, 0.0]);
    assert_eq!(rc.portfolio_volatility, 0.0);
}

#[test]
fn test_concentration_risk() {
    let w = WeightVector::from_pairs([("A", 0.5), ("B", 0.25), ("C", 0.25)]).expect("valid");
    let report = concentration_risk(&w);
    assert!((report.hhi - 0.375).abs() < 1e-12);
    assert!((report.effective_assets - 1.0 / 0.375).abs() < 1e-12);
    assert_eq!(report.max_weight, 0.5);
    assert_eq!(report.max_weight_asset.as_deref(), Some("A"));

    let empty = concentration_risk(&WeightVector::default());
    assert_eq!(empty, ConcentrationReport::default());
}

#[test]
fn test_diversification_ratio() {
    let cov = CovarianceMatrix::new(symbols(&["A", "B"]), Matrix::diag(&[0.04, 0.04]), true)
        .expect("valid");
    let w = WeightVector::from_pairs([("A", 0.5), ("B", 0.5)]).expect("valid");
    // Weighted vol 0.2, portfolio vol 0.2 / sqrt(2)
    let dr = diversification_ratio(&w, &cov).expect("ok");
    assert!((dr - 2.0_f64.sqrt()).abs() < 1e-12);
}

// ===== stress =====

#[test]
fn test_stress_unshocked_assets_keep_value() {
    let w = WeightVector::from_pairs([("A", 0.5), ("B", 0.5)]).expect("valid");
    let shocks = BTreeMap::from([("A".to_string(), -0.2), ("Z".to_string(), -0.9)]);
    let result = stress_test(&w, &shocks).expect("ok");
    assert_eq!(result.baseline_value, 1.0);
    assert!((result.asset_values["A"] - 0.4).abs() < 1e-12);
    assert_eq!(result.asset_values["B"], 0.5);
    assert!((result.value_change + 0.1).abs() < 1e-12);
    assert_eq!(result.cash_weight, 0.0);
    assert_eq!(result.ignored, vec!["Z".to_string()]);
}

#[test]
fn test_stress_rejects_non_finite_shock() {
    let w = WeightVector::from_pairs([("A", 1.0)]).expect("valid");
    let shocks = BTreeMap::from([("A".to_string(), f64::NAN)]);
    assert!(stress_test(&w, &shocks).is_err());
}

#[test]
fn test_idempotent_outputs() {
    let cov = covariance_matrix(&sample_returns(), true, 252.0).expect("cov");
    let w = WeightVector::from_pairs([("A", 0.2), ("B", 0.3), ("C", 0.5)]).expect("valid");
    let a = risk_contribution(&w, &cov).expect("ok");
    let b = risk_contribution(&w, &cov).expect("ok");
    assert_eq!(a, b);
}
