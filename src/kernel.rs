//! Kernel taper weights and plug-in bandwidths for HAC estimation.
//!
//! This module provides:
//! - A `KernelType` enum with the common HAC tapers (Bartlett/Newey–West,
//!   Parzen, Quadratic-Spectral).
//! - Per-lag weights `weight(lag, bandwidth)` with `weight(0, _) = 1` and,
//!   for the compact-support tapers, zero weight beyond the bandwidth.
//! - A plug-in bandwidth selector `plugin_bandwidth` that fits AR(1)
//!   models column-wise on the provided score matrix and computes an
//!   Andrews-style `α(q)` (with `q=1` for Bartlett, `q=2` for Parzen and
//!   QS). If the plug-in fails (e.g., near-unit root or tiny denominator),
//!   it falls back to the deterministic rule in [`crate::bandwidth`].
//!
//! Conventions:
//! - The taper argument is `z = lag/(bandwidth+1)` for every kernel, so
//!   that `z < 1` at `lag = bandwidth` and bandwidth 0 is well defined.
//! - The Quadratic-Spectral taper never truncates: its weight is nonzero
//!   for every positive lag, and the bandwidth acts as a scale. Callers
//!   must not assume zero weight beyond the bandwidth for this variant.
use crate::{
    bandwidth::newey_west_lags,
    errors::{CovarianceError, CovarianceResult},
    numerical::{GENERAL_TOL, STATIONARITY_MARGIN},
};
use arima::estimate;
use ndarray::ArrayView2;

/// HAC taper family.
///
/// - `Bartlett`: triangular (Newey–West) kernel, compact support.
/// - `Parzen`: smoother compact-support kernel with heavier down-weighting
///   at high lags.
/// - `QuadraticSpectral`: infinite-support taper with high large-sample
///   efficiency; the bandwidth is a scale, not a cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelType {
    Bartlett,
    Parzen,
    QuadraticSpectral,
}

impl KernelType {
    /// Evaluate the kernel weight for a lag under the given bandwidth.
    ///
    /// # Arguments
    /// - `lag`: non-negative lag index `k`.
    /// - `bandwidth`: truncation lag (Bartlett/Parzen) or scale (QS).
    ///
    /// # Returns
    /// The taper weight in `[0, 1]`. Every kernel returns exactly `1.0`
    /// at lag 0. Bartlett and Parzen return `0.0` for `lag > bandwidth`;
    /// Quadratic-Spectral decays smoothly instead of truncating.
    ///
    /// # Examples
    /// ```rust
    /// # use sandwich_covariance::kernel::KernelType;
    /// assert_eq!(KernelType::Bartlett.weight(0, 4), 1.0);
    /// assert_eq!(KernelType::Bartlett.weight(1, 4), 0.8);
    /// assert_eq!(KernelType::Bartlett.weight(5, 4), 0.0);
    /// assert!(KernelType::QuadraticSpectral.weight(5, 4) != 0.0);
    /// ```
    pub fn weight(&self, lag: usize, bandwidth: usize) -> f64 {
        if lag == 0 {
            return 1.0;
        }
        let z = lag as f64 / (bandwidth as f64 + 1.0);
        match self {
            KernelType::Bartlett => {
                if lag <= bandwidth {
                    1.0 - z
                } else {
                    0.0
                }
            }
            KernelType::Parzen => {
                if lag > bandwidth {
                    0.0
                } else if z <= 0.5 {
                    let z2 = z * z;
                    1.0 - 6.0 * z2 + 6.0 * z * z2
                } else {
                    2.0 * (1.0 - z).powi(3)
                }
            }
            KernelType::QuadraticSpectral => {
                let pi_z = std::f64::consts::PI * z;
                let trig = 6.0 * pi_z / 5.0;
                (25.0 / (12.0 * pi_z * pi_z)) * (trig.sin() / trig - trig.cos())
            }
        }
    }

    /// Plug-in bandwidth selection for the given kernel.
    ///
    /// Strategy:
    /// - For `Bartlett`: compute `α(1)` from AR(1) fits per column and use
    ///   `L ≈ 1.1447 · (n·α)^{1/3}`.
    /// - For `Parzen`: compute `α(2)` and use `L ≈ 2.6614 · (n·α)^{1/5}`.
    /// - For `QuadraticSpectral`: compute `α(2)` and use
    ///   `L ≈ 1.3221 · (n·α)^{1/5}`.
    ///
    /// If the plug-in step errors (stationarity violated, too few rows, or
    /// a tiny denominator), falls back to the deterministic rule
    /// [`newey_west_lags`].
    ///
    /// # Arguments
    /// - `series_mat`: `n×p` matrix (rows index time). Pass the same rows
    ///   that the HAC aggregation will consume.
    ///
    /// # Returns
    /// Non-negative integer bandwidth, truncated by the caller (e.g., to
    /// `n−1`).
    pub fn plugin_bandwidth(&self, series_mat: ArrayView2<'_, f64>) -> usize {
        let n = series_mat.nrows() as f64;
        let (order, constant, exponent) = match self {
            KernelType::Bartlett => (1, 1.1447, 1.0 / 3.0),
            KernelType::Parzen => (2, 2.6614, 1.0 / 5.0),
            KernelType::QuadraticSpectral => (2, 1.3221, 1.0 / 5.0),
        };
        match plugin_alpha(series_mat, order) {
            Ok(alpha) => (constant * (n * alpha).powf(exponent)).round() as usize,
            Err(_) => newey_west_lags(series_mat.nrows()),
        }
    }
}

/// Compute the Andrews plug-in `α(q)` by aggregating across columns.
///
/// For each column:
/// 1. Fit AR(1) to obtain `(intercept, φ)`.
/// 2. Enforce stationarity via a small safety margin; if violated, error.
/// 3. Compute residuals and `σ²` (sample variance, `n−1` denominator).
/// 4. Accumulate the numerator/denominator terms for `q=1` or `q=2`.
///
/// After iterating all columns, validate the denominator against
/// `GENERAL_TOL`; if too small, return an error so callers can fall back.
///
/// # Errors
/// - `StationarityViolated { phi }` if `|φ|` is too close to 1.
/// - `DenominatorTooSmall { denominator }` if the final sum is tiny.
/// - `AutoregressionFailed` for too-short columns or AR solver breakdowns.
fn plugin_alpha(series_mat: ArrayView2<'_, f64>, order: usize) -> CovarianceResult<f64> {
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for col in series_mat.columns() {
        let series = col.to_vec();
        if series.len() < 3 {
            return Err(CovarianceError::AutoregressionFailed);
        }
        let coeff = estimate::fit(&series, 1, 0, 0)
            .map_err(|_| CovarianceError::AutoregressionFailed)?;
        if coeff.len() < 2 {
            return Err(CovarianceError::AutoregressionFailed);
        }
        let intercept = coeff[0];
        let phi = coeff[1];
        if phi.abs() >= 1.0 - STATIONARITY_MARGIN {
            return Err(CovarianceError::StationarityViolated { phi });
        }
        let residuals = estimate::residuals(&series, intercept, Some(&[phi]), None)
            .map_err(|_| CovarianceError::AutoregressionFailed)?;
        if residuals.len() < 2 {
            return Err(CovarianceError::AutoregressionFailed);
        }
        let sigma2 =
            residuals.iter().map(|&e| e * e).sum::<f64>() / ((residuals.len() - 1) as f64);
        let sigma4 = sigma2 * sigma2;
        let phi2 = phi * phi;
        denominator += sigma4 / (1.0 - phi2).powi(4);
        numerator += match order {
            1 => 4.0 * phi2 * sigma4 / ((1.0 - phi).powi(6) * (1.0 + phi).powi(2)),
            _ => 4.0 * phi2 * sigma4 / (1.0 - phi).powi(8),
        };
    }
    if denominator < GENERAL_TOL {
        return Err(CovarianceError::DenominatorTooSmall { denominator });
    }
    Ok(numerator / denominator)
}
