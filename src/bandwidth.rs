//! Truncation-lag selection for HAC estimators.
//!
//! Purpose
//! -------
//! Decide how many lagged cross-products the kernel-weighted meat retains.
//! An explicit, user-supplied bandwidth is validated against the sample
//! size; an omitted bandwidth is filled in by a documented deterministic
//! rule or, on request, by the kernel-specific AR(1) plug-in.
//!
//! Key behaviors
//! -------------
//! - [`select_bandwidth`] enforces the `bandwidth < n` contract for
//!   explicit values (bandwidth 0 is legal and keeps only the lag-0 term).
//! - The automatic rule is `floor(4 · (n/100)^(2/9))`, truncated to
//!   `n − 1`. This exact formula is part of the crate's compatibility
//!   contract: a different default would silently change every
//!   automatic-bandwidth result.
//! - [`HacOptions`] packages the kernel, the bandwidth regime, and the
//!   automatic rule into one configuration value.
//!
//! Conventions
//! -----------
//! - Bandwidths are expressed in lag units on the row index of whatever
//!   matrix is being aggregated (observations, or cluster-level rows when
//!   a grouping is configured).

use crate::{
    errors::{CovarianceError, CovarianceResult},
    kernel::KernelType,
};
use ndarray::ArrayView2;

/// Deterministic automatic truncation lag, `floor(4 · (n/100)^(2/9))`.
///
/// # Arguments
/// - `nobs`: number of rows that will be aggregated.
///
/// # Returns
/// The rule-of-thumb lag count, not yet truncated to `nobs − 1`.
///
/// # Examples
/// ```rust
/// # use sandwich_covariance::bandwidth::newey_west_lags;
/// assert_eq!(newey_west_lags(100), 4);
/// ```
pub fn newey_west_lags(nobs: usize) -> usize {
    (4.0 * (nobs as f64 / 100.0).powf(2.0 / 9.0)).floor() as usize
}

/// Resolve a truncation lag from the sample size and an optional override.
///
/// Parameters
/// ----------
/// - `nobs`: `usize`
///   Number of rows available for lagging. Must be at least 1.
/// - `explicit`: `Option<usize>`
///   User-supplied bandwidth. `Some(b)` with `b < nobs` is returned
///   unchanged (0 is allowed and degenerates the kernel window to the
///   lag-0 term). `Some(b)` with `b >= nobs` is a configuration error:
///   truncation must leave at least one retained lag of slack.
///
/// Returns
/// -------
/// `CovarianceResult<usize>`
///   The validated explicit bandwidth, or the automatic rule
///   [`newey_west_lags`] truncated to `nobs − 1` when `explicit` is
///   `None`.
///
/// Errors
/// ------
/// - `CovarianceError::BandwidthExceedsSample`
///   When an explicit bandwidth is at or above the sample size.
///
/// Examples
/// --------
/// ```rust
/// # use sandwich_covariance::bandwidth::select_bandwidth;
/// assert_eq!(select_bandwidth(100, None).unwrap(), 4);
/// assert!(select_bandwidth(50, Some(60)).is_err());
/// ```
pub fn select_bandwidth(nobs: usize, explicit: Option<usize>) -> CovarianceResult<usize> {
    match explicit {
        Some(bandwidth) if bandwidth >= nobs => {
            Err(CovarianceError::BandwidthExceedsSample { bandwidth, nobs })
        }
        Some(bandwidth) => Ok(bandwidth),
        None => Ok(newey_west_lags(nobs).min(nobs.saturating_sub(1))),
    }
}

/// Automatic-bandwidth regime used when no explicit bandwidth is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandwidthRule {
    /// The deterministic rule `floor(4 · (n/100)^(2/9))`.
    #[default]
    NeweyWest,
    /// Kernel-specific AR(1) plug-in with deterministic-rule fallback.
    AndrewsPlugin,
}

/// Configuration for the kernel-weighted (HAC) meat.
///
/// Bundles the taper family, the bandwidth regime (explicit vs
/// automatic), and the automatic rule. The default is the Bartlett kernel
/// with the deterministic automatic rule, the common econometric
/// baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct HacOptions {
    /// Kernel taper family.
    pub kernel: KernelType,
    /// Optional explicit truncation lag; `None` selects automatically.
    pub bandwidth: Option<usize>,
    /// Automatic rule applied when `bandwidth` is `None`.
    pub rule: BandwidthRule,
}

impl HacOptions {
    /// Construct a `HacOptions` value from explicit settings.
    pub fn new(kernel: KernelType, bandwidth: Option<usize>, rule: BandwidthRule) -> HacOptions {
        HacOptions { kernel, bandwidth, rule }
    }

    /// Bartlett kernel with a fixed truncation lag.
    pub fn bartlett(bandwidth: usize) -> HacOptions {
        HacOptions {
            kernel: KernelType::Bartlett,
            bandwidth: Some(bandwidth),
            rule: BandwidthRule::NeweyWest,
        }
    }

    /// Resolve the effective truncation lag for a concrete row matrix.
    ///
    /// Explicit bandwidths are assumed to have been validated against the
    /// observation count already and are only clamped to `rows − 1` here
    /// (relevant when the window runs over aggregated cluster rows).
    /// Automatic regimes consult the deterministic rule or the plug-in on
    /// the same rows the kernel window will see.
    pub fn resolve(&self, rows: ArrayView2<'_, f64>) -> usize {
        let n = rows.nrows();
        let cap = n.saturating_sub(1);
        match self.bandwidth {
            Some(bandwidth) => bandwidth.min(cap),
            None => match self.rule {
                BandwidthRule::NeweyWest => newey_west_lags(n).min(cap),
                BandwidthRule::AndrewsPlugin => self.kernel.plugin_bandwidth(rows).min(cap),
            },
        }
    }
}

impl Default for HacOptions {
    fn default() -> Self {
        Self { kernel: KernelType::Bartlett, bandwidth: None, rule: BandwidthRule::NeweyWest }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The documented automatic rule at several sample sizes.
    // - Explicit-bandwidth validation, including the zero and boundary
    //   cases.
    // - Effective-lag resolution against concrete row matrices.
    //
    // They intentionally DO NOT cover:
    // - Plug-in bandwidth numerics; those live with the kernel module.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Pin the automatic rule to its documented values.
    //
    // Given
    // -----
    // - Sample sizes 100, 250, 500, and 1000.
    //
    // Expect
    // ------
    // - floor(4 · (n/100)^(2/9)) = 4, 4, 5, 6 respectively.
    fn newey_west_lags_matches_documented_formula() {
        // Arrange / Act / Assert
        assert_eq!(newey_west_lags(100), 4);
        assert_eq!(newey_west_lags(250), 4);
        assert_eq!(newey_west_lags(500), 5);
        assert_eq!(newey_west_lags(1000), 6);
    }

    #[test]
    // Purpose
    // -------
    // Verify the automatic path of `select_bandwidth`, including the
    // truncation to n − 1 for tiny samples.
    //
    // Given
    // -----
    // - n = 100 (rule value 4 fits) and n = 1 (rule value exceeds n − 1).
    //
    // Expect
    // ------
    // - 4 for n = 100; 0 for n = 1.
    fn select_bandwidth_automatic_uses_rule_and_truncates() {
        // Arrange / Act / Assert
        assert_eq!(select_bandwidth(100, None).unwrap(), 4);
        assert_eq!(select_bandwidth(1, None).unwrap(), 0);
    }

    #[test]
    // Purpose
    // -------
    // Verify explicit-bandwidth validation: in-range values pass through
    // unchanged (including 0), out-of-range values fail.
    //
    // Given
    // -----
    // - n = 50 with explicit bandwidths 0, 49, 50, and 60.
    //
    // Expect
    // ------
    // - 0 and 49 are returned unchanged.
    // - 50 and 60 produce `BandwidthExceedsSample`.
    fn select_bandwidth_explicit_validates_against_sample_size() {
        // Arrange / Act / Assert
        assert_eq!(select_bandwidth(50, Some(0)).unwrap(), 0);
        assert_eq!(select_bandwidth(50, Some(49)).unwrap(), 49);

        for bad in [50, 60] {
            match select_bandwidth(50, Some(bad)) {
                Err(CovarianceError::BandwidthExceedsSample { bandwidth, nobs }) => {
                    assert_eq!(bandwidth, bad);
                    assert_eq!(nobs, 50);
                }
                other => panic!("expected BandwidthExceedsSample, got {other:?}"),
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify that `HacOptions::resolve` clamps explicit lags to the row
    // count of the matrix actually being windowed.
    //
    // Given
    // -----
    // - An explicit bandwidth of 10 and a 4-row score matrix.
    //
    // Expect
    // ------
    // - Effective lag 3.
    fn resolve_clamps_explicit_bandwidth_to_rows() {
        // Arrange
        let opts = HacOptions::bartlett(10);
        let rows = array![[1.0], [2.0], [3.0], [4.0]];

        // Act / Assert
        assert_eq!(opts.resolve(rows.view()), 3);
    }

    #[test]
    // Purpose
    // -------
    // Verify the documented defaults of `HacOptions`.
    //
    // Given
    // -----
    // - `HacOptions::default()`.
    //
    // Expect
    // ------
    // - Bartlett kernel, automatic bandwidth, deterministic rule.
    fn hac_options_default_matches_documented_defaults() {
        // Arrange
        let opts = HacOptions::default();

        // Act / Assert
        assert_eq!(opts.kernel, KernelType::Bartlett);
        assert!(opts.bandwidth.is_none());
        assert_eq!(opts.rule, BandwidthRule::NeweyWest);
    }
}
