//! Integration tests for the robust covariance pipeline.
//!
//! Purpose
//! -------
//! - Validate the end-to-end path from fitted-regression inputs, through
//!   residual rescaling and score aggregation, to assembled covariance
//!   matrices and standard errors.
//! - Exercise realistic multi-parameter designs alongside the
//!   hand-checkable intercept-only fixtures.
//!
//! Coverage
//! --------
//! - `model::FittedRegression`:
//!   - Construction with and without a supplied leverage vector.
//! - `api`:
//!   - Every named configuration: HC0 through HC3, `cov_white_simple`,
//!     `cov_hac`, `cov_cluster`, `cov_cluster_2groups`, `cov_nw_panel`,
//!     and `se_cov`.
//! - `sandwich`:
//!   - Symmetry of every returned matrix.
//!   - The HC1/HC0 uniform-scaling identity.
//!   - The HAC bandwidth-0 degeneracy to HC0.
//!   - The two-way inclusion-exclusion identity against independently
//!     computed one-way estimates.
//!   - The within-panel restriction of the kernel window.
//!   - Non-fatal warnings on indefinite two-way results.
//! - `bandwidth` and error paths:
//!   - The documented automatic rule and the oversized-bandwidth and
//!     leverage-at-unity configuration errors.
//!
//! Exclusions
//! ----------
//! - Fine-grained validation of low-level building blocks (guards,
//!   kernel values, cluster canonicalization) — these are covered by
//!   unit tests in their own modules.
//! - Plug-in bandwidth numerics, which depend on the autoregression fit
//!   and are unit-tested for structural behavior only.
use ndarray::{array, Array1, Array2};
use sandwich_covariance::{
    api::{
        cov_cluster, cov_cluster_2groups, cov_hac, cov_hc0, cov_hc1, cov_hc2, cov_hc3,
        cov_nw_panel, cov_white_simple, se_cov,
    },
    bandwidth::{select_bandwidth, HacOptions},
    errors::{CovarianceError, NumericalWarning},
    kernel::KernelType,
    model::FittedRegression,
};

/// Purpose
/// -------
/// Construct a two-parameter (intercept + trend) regression fixture with
/// alternating-sign, unequal-magnitude residuals, so that every
/// estimator sees genuine heteroscedastic structure.
///
/// Returns
/// -------
/// - A `FittedRegression` over 8 observations with no supplied leverage,
///   forcing the leverage-based variants through the derivation path.
///
/// Invariants
/// ----------
/// - The design has full column rank (distinct trend values), so the
///   bread inverse is a true inverse and closed-form identities hold
///   exactly.
fn make_trend_model() -> FittedRegression {
    let design = array![
        [1.0, 0.0],
        [1.0, 1.0],
        [1.0, 2.0],
        [1.0, 3.0],
        [1.0, 4.0],
        [1.0, 5.0],
        [1.0, 6.0],
        [1.0, 7.0],
    ];
    let residuals = array![0.5, -1.25, 0.75, -0.25, 1.5, -0.75, 0.25, -1.0];
    FittedRegression::new(design, residuals, None)
        .expect("trend fixture must pass validation")
}

/// Purpose
/// -------
/// Construct the intercept-only fixture whose meats are hand-computable:
/// n = 4, residuals [1, -1, 1, -1], leverage 0.25 per observation.
fn make_intercept_model() -> FittedRegression {
    FittedRegression::new(
        array![[1.0], [1.0], [1.0], [1.0]],
        array![1.0, -1.0, 1.0, -1.0],
        None,
    )
    .expect("intercept fixture must pass validation")
}

fn assert_symmetric(cov: &Array2<f64>) {
    for i in 0..cov.nrows() {
        for j in 0..cov.ncols() {
            assert!(
                (cov[[i, j]] - cov[[j, i]]).abs() < 1e-12,
                "asymmetry at ({i}, {j}): {} vs {}",
                cov[[i, j]],
                cov[[j, i]]
            );
        }
    }
}

fn assert_matrices_close(a: &Array2<f64>, b: &Array2<f64>, tol: f64) {
    assert_eq!(a.shape(), b.shape());
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            assert!(
                (a[[i, j]] - b[[i, j]]).abs() < tol,
                "mismatch at ({i}, {j}): {} vs {}",
                a[[i, j]],
                b[[i, j]]
            );
        }
    }
}

#[test]
fn every_estimator_returns_a_symmetric_matrix() {
    let model = make_trend_model();
    let clusters = [0_i64, 0, 1, 1, 2, 2, 3, 3];
    let panels = [0_i64, 0, 0, 0, 1, 1, 1, 1];

    let mut matrices = vec![
        cov_hc0(&model).unwrap().into_matrix(),
        cov_hc1(&model).unwrap().into_matrix(),
        cov_hc2(&model).unwrap().into_matrix(),
        cov_hc3(&model).unwrap().into_matrix(),
        cov_white_simple(&model, true).unwrap().into_matrix(),
        cov_hac(&model, &HacOptions::default(), false).unwrap().into_matrix(),
        cov_hac(&model, &HacOptions::bartlett(3), true).unwrap().into_matrix(),
        cov_cluster(&model, &clusters, true).unwrap().into_matrix(),
        cov_nw_panel(&model, &HacOptions::bartlett(2), &panels, false)
            .unwrap()
            .into_matrix(),
    ];
    let two_way = cov_cluster_2groups(&model, &clusters, &panels, false).unwrap();
    matrices.push(two_way.combined.into_matrix());

    for cov in &matrices {
        assert_eq!(cov.shape(), &[2, 2]);
        assert_symmetric(cov);
    }
}

#[test]
fn hc1_is_hc0_scaled_by_the_uniform_dof_factor() {
    let model = make_trend_model();
    let hc0 = cov_hc0(&model).unwrap().into_matrix();
    let hc1 = cov_hc1(&model).unwrap().into_matrix();

    // n = 8, k = 2, so the factor is 8/6.
    let scaled = hc0 * (8.0 / 6.0);
    assert_matrices_close(&hc1, &scaled, 1e-12);
}

#[test]
fn hac_with_bandwidth_zero_equals_hc0() {
    let model = make_trend_model();
    let hc0 = cov_hc0(&model).unwrap().into_matrix();
    let hac = cov_hac(&model, &HacOptions::bartlett(0), false).unwrap().into_matrix();

    assert_matrices_close(&hac, &hc0, 1e-12);

    // The degeneracy is kernel-independent at bandwidth 0.
    for kernel in [KernelType::Parzen, KernelType::QuadraticSpectral] {
        let opts = HacOptions::new(kernel, Some(0), Default::default());
        let cov = cov_hac(&model, &opts, false).unwrap().into_matrix();
        assert_matrices_close(&cov, &hc0, 1e-12);
    }
}

#[test]
fn intercept_fixture_matches_hand_computed_meats() {
    let model = make_intercept_model();

    // Bread is 1/4; meats are 4, 16/3, 16/3, and 64/9.
    let expected = [
        (cov_hc0(&model).unwrap(), 4.0 / 16.0),
        (cov_hc1(&model).unwrap(), (16.0 / 3.0) / 16.0),
        (cov_hc2(&model).unwrap(), (16.0 / 3.0) / 16.0),
        (cov_hc3(&model).unwrap(), (64.0 / 9.0) / 16.0),
    ];
    for (outcome, value) in expected {
        assert!(
            (outcome.covariance()[[0, 0]] - value).abs() < 1e-12,
            "expected {value}, got {}",
            outcome.covariance()[[0, 0]]
        );
        assert!(outcome.warnings().is_empty());
    }
}

#[test]
fn two_way_estimate_satisfies_the_inclusion_exclusion_identity() {
    let model = make_trend_model();
    let first = [0_i64, 0, 1, 1, 2, 2, 3, 3];
    let second = [0_i64, 1, 0, 1, 0, 1, 0, 1];
    let pair: Vec<(i64, i64)> =
        first.iter().copied().zip(second.iter().copied()).collect();

    for use_correction in [false, true] {
        let two_way = cov_cluster_2groups(&model, &first, &second, use_correction).unwrap();
        let pair_only = cov_cluster(&model, &pair, use_correction).unwrap();

        let reconstructed = two_way.first.covariance() + two_way.second.covariance()
            - pair_only.covariance();
        assert_matrices_close(two_way.combined.covariance(), &reconstructed, 1e-10);
    }
}

#[test]
fn panel_window_drops_cross_panel_lag_pairs() {
    // Constant unit scores make the lag arithmetic exact: the full-sample
    // Bartlett window at bandwidth 1 yields meat 7, the within-panel
    // version meat 6, with bread 1/4 on each side.
    let model = FittedRegression::new(
        array![[1.0], [1.0], [1.0], [1.0]],
        array![1.0, 1.0, 1.0, 1.0],
        None,
    )
    .unwrap();
    let panels = [0_i64, 0, 1, 1];

    let within =
        cov_nw_panel(&model, &HacOptions::bartlett(1), &panels, false).unwrap().into_matrix();
    let full = cov_hac(&model, &HacOptions::bartlett(1), false).unwrap().into_matrix();

    assert!((within[[0, 0]] - 6.0 / 16.0).abs() < 1e-12);
    assert!((full[[0, 0]] - 7.0 / 16.0).abs() < 1e-12);
}

#[test]
fn automatic_bandwidth_follows_the_documented_rule() {
    assert_eq!(select_bandwidth(100, None).unwrap(), 4);

    match select_bandwidth(50, Some(60)) {
        Err(CovarianceError::BandwidthExceedsSample { bandwidth, nobs }) => {
            assert_eq!(bandwidth, 60);
            assert_eq!(nobs, 50);
        }
        other => panic!("expected BandwidthExceedsSample, got {other:?}"),
    }

    // The same contract holds through the HAC entry point.
    let model = make_trend_model();
    let oversized = HacOptions::bartlett(8);
    assert!(matches!(
        cov_hac(&model, &oversized, false),
        Err(CovarianceError::BandwidthExceedsSample { bandwidth: 8, nobs: 8 })
    ));
}

#[test]
fn leverage_at_unity_fails_instead_of_returning_infinities() {
    let model = FittedRegression::new(
        array![[1.0], [1.0], [1.0], [1.0]],
        array![1.0, -1.0, 1.0, -1.0],
        Some(array![0.25, 0.25, 1.0, 0.25]),
    )
    .unwrap();

    for result in [cov_hc2(&model), cov_hc3(&model)] {
        match result {
            Err(CovarianceError::LeverageAtUnity { index, leverage }) => {
                assert_eq!(index, 2);
                assert_eq!(leverage, 1.0);
            }
            other => panic!("expected LeverageAtUnity, got {other:?}"),
        }
    }
}

#[test]
fn indefinite_two_way_result_carries_a_warning_not_a_failure() {
    let model = FittedRegression::new(
        array![[1.0], [1.0], [1.0], [1.0]],
        array![1.0, -1.0, -1.0, 1.0],
        None,
    )
    .unwrap();
    let first = [0_i64, 0, 1, 1];
    let second = [0_i64, 1, 0, 1];

    let two_way = cov_cluster_2groups(&model, &first, &second, false).unwrap();

    assert!((two_way.combined.covariance()[[0, 0]] + 0.25).abs() < 1e-12);
    assert!(two_way
        .combined
        .warnings()
        .iter()
        .any(|w| matches!(w, NumericalWarning::NegativeEigenvalue { .. })));
}

#[test]
fn standard_errors_agree_between_outcome_and_se_cov() {
    let model = make_trend_model();
    let outcome = cov_hc3(&model).unwrap();

    let from_outcome: Array1<f64> = outcome.standard_errors();
    let from_matrix = se_cov(outcome.covariance());

    assert_eq!(from_outcome.len(), 2);
    for i in 0..2 {
        assert!((from_outcome[i] - from_matrix[i]).abs() < 1e-15);
        assert!(from_outcome[i] > 0.0);
    }
}
