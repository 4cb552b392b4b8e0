//! Named estimator configurations: the public covariance surface.
//!
//! Purpose
//! -------
//! Expose the classical estimator names as thin constructors over the
//! single assembler in [`crate::sandwich`]. Each function here only
//! validates its grouping keys, builds a [`RobustConfig`], and delegates
//! to [`robust_covariance`]; none of them re-implements any assembly
//! logic, so the names cannot drift apart numerically.
//!
//! Surface
//! -------
//! - [`cov_hc0`], [`cov_hc1`], [`cov_hc2`], [`cov_hc3`]:
//!   heteroscedasticity-consistent variants.
//! - [`cov_white_simple`]: the classical White estimator with an optional
//!   uniform small-sample correction.
//! - [`cov_hac`]: kernel-weighted heteroscedasticity- and
//!   autocorrelation-consistent estimator.
//! - [`cov_cluster`], [`cov_cluster_2groups`]: one-way and two-way
//!   cluster-robust estimators.
//! - [`cov_nw_panel`]: kernel window within panels, zero across panels.
//! - [`se_cov`]: square roots of a covariance diagonal.
//!
//! Conventions
//! -----------
//! - Grouping keys are accepted as slices of any hashable type; ids need
//!   not be contiguous integers.
//! - Every function returns a [`CovarianceOutcome`] so that non-fatal
//!   numerical warnings always reach the caller.

use crate::{
    bandwidth::HacOptions,
    cluster::ClusterIndex,
    errors::CovarianceResult,
    hc::HcScale,
    model::FittedRegression,
    panel::PanelIndex,
    sandwich::{robust_covariance, CovarianceOutcome, Grouping, RobustConfig},
    validation::validate_labels,
};
use ndarray::{Array1, Array2};
use std::hash::Hash;

/// White (HC0) heteroscedasticity-consistent covariance.
///
/// # Examples
/// ```rust
/// # use ndarray::array;
/// # use sandwich_covariance::api::cov_hc0;
/// # use sandwich_covariance::model::FittedRegression;
/// let model = FittedRegression::new(
///     array![[1.0], [1.0], [1.0], [1.0]],
///     array![1.0, -1.0, 1.0, -1.0],
///     None,
/// )
/// .unwrap();
/// let outcome = cov_hc0(&model).unwrap();
/// assert!((outcome.covariance()[[0, 0]] - 0.25).abs() < 1e-12);
/// ```
pub fn cov_hc0(model: &FittedRegression) -> CovarianceResult<CovarianceOutcome> {
    hc_covariance(model, HcScale::Hc0)
}

/// HC1: the HC0 meat scaled uniformly by `n/(n−k)`.
pub fn cov_hc1(model: &FittedRegression) -> CovarianceResult<CovarianceOutcome> {
    hc_covariance(model, HcScale::Hc1)
}

/// HC2: residuals rescaled by `1/sqrt(1−h_i)`.
///
/// Uses the caller-supplied leverage vector when present, otherwise
/// derives the hat diagonal from the design matrix.
pub fn cov_hc2(model: &FittedRegression) -> CovarianceResult<CovarianceOutcome> {
    hc_covariance(model, HcScale::Hc2)
}

/// HC3: residuals rescaled by `1/(1−h_i)`.
pub fn cov_hc3(model: &FittedRegression) -> CovarianceResult<CovarianceOutcome> {
    hc_covariance(model, HcScale::Hc3)
}

/// Classical White estimator with an optional small-sample correction.
///
/// With `use_correction` set, the HC0 covariance is scaled uniformly by
/// `n/(n−k)`; without it, this is exactly [`cov_hc0`].
pub fn cov_white_simple(
    model: &FittedRegression, use_correction: bool,
) -> CovarianceResult<CovarianceOutcome> {
    let config = RobustConfig { small_sample: use_correction, ..Default::default() };
    robust_covariance(model, &config)
}

/// Kernel-weighted HAC covariance.
///
/// Parameters
/// ----------
/// - `model`: `&FittedRegression`
///   The fitted-regression adapter.
/// - `options`: `&HacOptions`
///   Kernel family and bandwidth regime. An explicit bandwidth must be
///   below the observation count; bandwidth 0 reproduces [`cov_hc0`].
/// - `use_correction`: `bool`
///   Apply the uniform `n/(n−k)` correction to the result.
///
/// Returns
/// -------
/// `CovarianceResult<CovarianceOutcome>`
///   The HAC covariance, or the first configuration error.
pub fn cov_hac(
    model: &FittedRegression, options: &HacOptions, use_correction: bool,
) -> CovarianceResult<CovarianceOutcome> {
    let config = RobustConfig {
        window: Some(options.clone()),
        small_sample: use_correction,
        ..Default::default()
    };
    robust_covariance(model, &config)
}

/// One-way cluster-robust covariance.
///
/// Parameters
/// ----------
/// - `model`: `&FittedRegression`
///   The fitted-regression adapter.
/// - `labels`: `&[K]`
///   One grouping key per observation; any hashable type.
/// - `use_correction`: `bool`
///   Apply the `G/(G−1)` cluster-count correction (requires at least two
///   clusters).
///
/// Returns
/// -------
/// `CovarianceResult<CovarianceOutcome>`
///   The cluster-robust covariance, or the first configuration error.
pub fn cov_cluster<K: Hash + Eq>(
    model: &FittedRegression, labels: &[K], use_correction: bool,
) -> CovarianceResult<CovarianceOutcome> {
    validate_labels(model.nobs(), labels.len(), "cluster labels")?;
    let config = RobustConfig {
        grouping: Grouping::OneWay(ClusterIndex::from_labels(labels)),
        small_sample: use_correction,
        ..Default::default()
    };
    robust_covariance(model, &config)
}

/// The combined two-way estimate together with its one-way components.
#[derive(Debug, Clone)]
pub struct TwoWayCovariance {
    /// Inclusion-exclusion combination over both grouping keys.
    pub combined: CovarianceOutcome,
    /// One-way estimate on the first key alone.
    pub first: CovarianceOutcome,
    /// One-way estimate on the second key alone.
    pub second: CovarianceOutcome,
}

/// Two-way cluster-robust covariance.
///
/// Computes `V = V_g1 + V_g2 − V_g1×g2`, where the subtracted term
/// clusters on the combination of both keys, and returns the two one-way
/// components alongside the combination. Identical grouping keys attach
/// a degeneracy warning to the combined outcome rather than failing.
///
/// # Errors
/// - `CovarianceError::DimensionMismatch` when either labeling does not
///   cover every observation.
/// - `CovarianceError::InsufficientClusters` when `use_correction` is set
///   and any component has fewer than two clusters.
pub fn cov_cluster_2groups<K1: Hash + Eq, K2: Hash + Eq>(
    model: &FittedRegression, first_labels: &[K1], second_labels: &[K2], use_correction: bool,
) -> CovarianceResult<TwoWayCovariance> {
    validate_labels(model.nobs(), first_labels.len(), "first grouping labels")?;
    validate_labels(model.nobs(), second_labels.len(), "second grouping labels")?;

    let config = RobustConfig {
        grouping: Grouping::TwoWay {
            first: ClusterIndex::from_labels(first_labels),
            second: ClusterIndex::from_labels(second_labels),
            pair: ClusterIndex::from_label_pairs(first_labels, second_labels)?,
        },
        small_sample: use_correction,
        ..Default::default()
    };
    let combined = robust_covariance(model, &config)?;
    let first = cov_cluster(model, first_labels, use_correction)?;
    let second = cov_cluster(model, second_labels, use_correction)?;
    Ok(TwoWayCovariance { combined, first, second })
}

/// Panel-robust covariance: kernel window within panels, zero across.
///
/// Parameters
/// ----------
/// - `model`: `&FittedRegression`
///   The fitted-regression adapter, with observations sorted so that
///   each panel is one contiguous, time-ordered block of rows.
/// - `options`: `&HacOptions`
///   Kernel family and bandwidth regime shared by all panels; panels
///   shorter than the bandwidth truncate their own lag windows.
/// - `labels`: `&[K]`
///   One panel key per observation.
/// - `use_correction`: `bool`
///   Apply the uniform `n/(n−k)` correction to the result.
///
/// Returns
/// -------
/// `CovarianceResult<CovarianceOutcome>`
///   The panel-robust covariance, or the first configuration error
///   (including `NonContiguousPanel` for interleaved rows).
pub fn cov_nw_panel<K: Hash + Eq>(
    model: &FittedRegression, options: &HacOptions, labels: &[K], use_correction: bool,
) -> CovarianceResult<CovarianceOutcome> {
    validate_labels(model.nobs(), labels.len(), "panel labels")?;
    let config = RobustConfig {
        grouping: Grouping::Panel(PanelIndex::from_labels(labels)?),
        window: Some(options.clone()),
        small_sample: use_correction,
        ..Default::default()
    };
    robust_covariance(model, &config)
}

/// Standard errors from a covariance matrix: `sqrt(diag(V))`.
///
/// # Examples
/// ```rust
/// # use ndarray::array;
/// # use sandwich_covariance::api::se_cov;
/// let cov = array![[4.0, 0.0], [0.0, 0.25]];
/// let se = se_cov(&cov);
/// assert_eq!(se[0], 2.0);
/// assert_eq!(se[1], 0.5);
/// ```
pub fn se_cov(cov: &Array2<f64>) -> Array1<f64> {
    cov.diag().mapv(f64::sqrt)
}

fn hc_covariance(
    model: &FittedRegression, scale: HcScale,
) -> CovarianceResult<CovarianceOutcome> {
    robust_covariance(model, &RobustConfig { scale, ..Default::default() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Each named configuration delegating to the shared assembler with
    //   the expected axes set (spot-checked through closed-form values).
    // - Label-length validation at the public boundary.
    // - `se_cov` on a hand-built diagonal.
    //
    // They intentionally DO NOT cover:
    // - Assembly numerics in depth; those live with the sandwich module
    //   and the integration suite.
    // -------------------------------------------------------------------------

    const TOL: f64 = 1e-10;

    fn intercept_model() -> FittedRegression {
        FittedRegression::new(
            array![[1.0], [1.0], [1.0], [1.0]],
            array![1.0, -1.0, 1.0, -1.0],
            None,
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Spot-check the named HC variants against their closed forms on the
    // intercept-only fixture.
    //
    // Given
    // -----
    // - n = 4 ones, residuals [1, -1, 1, -1].
    //
    // Expect
    // ------
    // - HC0 0.25, HC1 1/3, HC2 1/3, HC3 4/9.
    fn named_hc_variants_match_closed_forms() {
        // Arrange
        let model = intercept_model();

        // Act / Assert
        assert_relative_eq!(cov_hc0(&model).unwrap().covariance()[[0, 0]], 0.25, epsilon = TOL);
        assert_relative_eq!(
            cov_hc1(&model).unwrap().covariance()[[0, 0]],
            1.0 / 3.0,
            epsilon = TOL
        );
        assert_relative_eq!(
            cov_hc2(&model).unwrap().covariance()[[0, 0]],
            1.0 / 3.0,
            epsilon = TOL
        );
        assert_relative_eq!(
            cov_hc3(&model).unwrap().covariance()[[0, 0]],
            4.0 / 9.0,
            epsilon = TOL
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify that `cov_white_simple` equals HC0 without correction and
    // the HC1 value with it.
    //
    // Given
    // -----
    // - The intercept fixture.
    //
    // Expect
    // ------
    // - 0.25 uncorrected; 1/3 corrected.
    fn white_simple_toggles_the_uniform_correction() {
        // Arrange
        let model = intercept_model();

        // Act / Assert
        assert_relative_eq!(
            cov_white_simple(&model, false).unwrap().covariance()[[0, 0]],
            0.25,
            epsilon = TOL
        );
        assert_relative_eq!(
            cov_white_simple(&model, true).unwrap().covariance()[[0, 0]],
            1.0 / 3.0,
            epsilon = TOL
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify that the public cluster entry point rejects label slices of
    // the wrong length before building any index.
    //
    // Given
    // -----
    // - Four observations and three labels.
    //
    // Expect
    // ------
    // - A `DimensionMismatch` naming the cluster labels.
    fn cov_cluster_rejects_short_label_slice() {
        // Arrange
        let model = intercept_model();

        // Act
        let result = cov_cluster(&model, &[0, 0, 1], false);

        // Assert
        match result {
            Err(crate::errors::CovarianceError::DimensionMismatch { quantity, .. }) => {
                assert_eq!(quantity, "cluster labels");
            }
            other => panic!("expected DimensionMismatch, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify `se_cov` on a hand-built diagonal covariance.
    //
    // Given
    // -----
    // - diag(4, 0.25).
    //
    // Expect
    // ------
    // - Standard errors [2, 0.5], matching the outcome accessor.
    fn se_cov_takes_square_roots_of_the_diagonal() {
        // Arrange
        let cov = array![[4.0, 0.0], [0.0, 0.25]];

        // Act
        let se = se_cov(&cov);

        // Assert
        assert_relative_eq!(se[0], 2.0, epsilon = TOL);
        assert_relative_eq!(se[1], 0.5, epsilon = TOL);
    }
}
