//! Sandwich assembly: meat builders, corrections, and diagnostics.
//!
//! Purpose
//! -------
//! Combine the "meat" (weighted outer products of scores, possibly
//! cluster- or lag-aggregated) with the "bread" (pseudoinverse of the
//! Gram matrix) into the final `k×k` covariance matrix. Every named
//! estimator in this crate is a configuration of the single driver
//! [`robust_covariance`]; there is no per-estimator assembly code.
//!
//! Key behaviors
//! -------------
//! - Build the meat on the sum scale (no `1/n` normalization): the plain
//!   outer product `Sᵀ S`, the kernel-weighted lagged form
//!   `Γ₀ + Σ_{lag} w_lag (Γ_lag + Γ_lagᵀ)`, its within-panel restriction,
//!   and cluster-aggregated versions of both.
//! - Assemble `bread · meat · breadᵀ` and symmetrize the result with
//!   `(V + Vᵀ)/2` to absorb floating-point asymmetry.
//! - Apply small-sample corrections as final uniform scalars, selectable
//!   independently of every other axis: `n/(n−k)` for unclustered
//!   estimators, `G/(G−1)` per one-way component for clustered ones.
//! - Combine two-way clusterings at the covariance level through the
//!   inclusion–exclusion identity `V = V_g1 + V_g2 − V_g1×g2`.
//! - Inspect the eigenvalues of the finished matrix and attach a
//!   [`NumericalWarning::NegativeEigenvalue`] when it is indefinite
//!   beyond roundoff; detection never aborts the call.
//!
//! Invariants & assumptions
//! ------------------------
//! - All configuration errors are raised before any meat computation
//!   begins; a returned matrix is always the product of a fully executed
//!   assembly.
//! - The four configuration axes of [`RobustConfig`] (residual
//!   rescaling, kernel window, grouping structure, small-sample
//!   correction) are orthogonal: any combination is accepted, and
//!   degenerate combinations reduce to the expected special cases
//!   (bandwidth 0 keeps only the lag-0 term; an absent window equals a
//!   bandwidth-0 window; a grouping with a window runs the window over
//!   cluster-level rows in first-appearance order).
//!
//! Conventions
//! -----------
//! - Rows index observations (or cluster-level sums), columns index
//!   parameters.
//! - Inputs are never mutated; every builder returns a fresh matrix.
//!
//! Downstream usage
//! ----------------
//! - The named configurations in [`crate::api`] construct a
//!   [`RobustConfig`] and delegate here.
//! - [`CovarianceOutcome`] is the crate-wide return value: the matrix
//!   plus any non-fatal numerical warnings.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the meat builders against hand-computed values,
//!   the degeneracy identities (bandwidth 0, absent window), the
//!   inclusion–exclusion combination, correction scalars, and the
//!   negative-eigenvalue diagnostic.
//! - The integration suite exercises the same properties through the
//!   named configurations.

use crate::{
    bandwidth::{select_bandwidth, HacOptions},
    cluster::ClusterIndex,
    errors::{CovarianceError, CovarianceResult, NumericalWarning},
    hc::HcScale,
    kernel::KernelType,
    model::{to_dmatrix, FittedRegression},
    numerical::PSD_TOL,
    panel::PanelIndex,
};
use ndarray::{s, Array1, Array2, ArrayView2};

/// Grouping structure of the estimator.
#[derive(Debug, Clone, Default)]
pub enum Grouping {
    /// No grouping; scores enter the meat observation by observation.
    #[default]
    None,
    /// One-way cluster-robust aggregation.
    OneWay(ClusterIndex),
    /// Two-way cluster-robust aggregation with the intersection partition
    /// used by the inclusion-exclusion correction.
    TwoWay {
        first: ClusterIndex,
        second: ClusterIndex,
        pair: ClusterIndex,
    },
    /// Panel structure: the kernel window runs within each panel and is
    /// zero across panels.
    Panel(PanelIndex),
}

/// Orthogonal configuration of one sandwich estimator.
///
/// The four axes compose freely; see the module documentation for how
/// degenerate combinations reduce. `Default` is the plain HC0 estimator.
#[derive(Debug, Clone, Default)]
pub struct RobustConfig {
    /// Leverage-based residual rescaling (HC0 through HC3).
    pub scale: HcScale,
    /// Optional kernel window over lagged cross-products.
    pub window: Option<HacOptions>,
    /// Grouping structure (none, one-way, two-way, panel).
    pub grouping: Grouping,
    /// Whether to apply the final uniform small-sample correction.
    pub small_sample: bool,
}

/// Covariance matrix plus the non-fatal diagnostics collected on it.
///
/// Purpose
/// -------
/// Carry the sole output artifact of the crate, a symmetric `k×k`
/// covariance matrix, together with any numerical warnings detected
/// post-hoc. Warnings are reported, never silently swallowed, and never
/// turn a finished computation into a failure.
#[derive(Debug, Clone)]
pub struct CovarianceOutcome {
    cov: Array2<f64>,
    warnings: Vec<NumericalWarning>,
}

impl CovarianceOutcome {
    /// The covariance matrix.
    pub fn covariance(&self) -> &Array2<f64> {
        &self.cov
    }

    /// Consume the outcome, keeping only the matrix.
    pub fn into_matrix(self) -> Array2<f64> {
        self.cov
    }

    /// Non-fatal numerical diagnostics attached to this result.
    pub fn warnings(&self) -> &[NumericalWarning] {
        &self.warnings
    }

    /// Square roots of the diagonal: per-parameter standard errors.
    pub fn standard_errors(&self) -> Array1<f64> {
        self.cov.diag().mapv(f64::sqrt)
    }
}

/// Combine bread and meat into the sandwich `B · M · Bᵀ`.
///
/// Parameters
/// ----------
/// - `bread_inverse`: `&Array2<f64>`
///   `k×k` pseudoinverse of the Gram matrix.
/// - `meat`: `&Array2<f64>`
///   `k×k` meat matrix on the sum scale.
///
/// Returns
/// -------
/// `Array2<f64>`
///   The symmetrized product `(V + Vᵀ)/2`; inputs are never mutated.
pub fn assemble(bread_inverse: &Array2<f64>, meat: &Array2<f64>) -> Array2<f64> {
    let product = bread_inverse.dot(meat).dot(&bread_inverse.t());
    symmetrize(product)
}

/// Absorb floating-point asymmetry: `(M + Mᵀ)/2`.
fn symmetrize(matrix: Array2<f64>) -> Array2<f64> {
    let transposed = matrix.t().to_owned();
    (matrix + transposed) * 0.5
}

/// Plain outer-product meat, `Sᵀ S`.
pub fn meat_outer(rows: ArrayView2<'_, f64>) -> Array2<f64> {
    rows.t().dot(&rows)
}

/// Kernel-weighted meat over lagged cross-products.
///
/// Computes `Γ₀ + Σ_{lag=1}^{L} w_lag (Γ_lag + Γ_lagᵀ)` with
/// `Γ_lag = Σ_t s_{t+lag} s_tᵀ` over all valid `t`, on the sum scale.
/// The lag loop is truncated to `rows − 1`; with bandwidth 0 only the
/// lag-0 term survives, which is exactly [`meat_outer`]. Lags whose
/// kernel weight is zero are skipped without forming the cross-product.
///
/// # Arguments
/// - `rows`: the row sequence to window (observations, or cluster-level
///   sums).
/// - `kernel`: taper family providing `w_lag`.
/// - `bandwidth`: truncation lag (or scale, for Quadratic-Spectral).
pub fn meat_kernel(
    rows: ArrayView2<'_, f64>, kernel: KernelType, bandwidth: usize,
) -> Array2<f64> {
    let n = rows.nrows();
    let mut meat = meat_outer(rows);
    let top = bandwidth.min(n.saturating_sub(1));
    for lag in 1..=top {
        let weight = kernel.weight(lag, bandwidth);
        if weight == 0.0 {
            continue;
        }
        let lagged = rows.slice(s![lag.., ..]);
        let leading = rows.slice(s![..n - lag, ..]);
        let gamma = lagged.t().dot(&leading);
        meat.scaled_add(weight, &gamma);
        meat.scaled_add(weight, &gamma.t());
    }
    meat
}

/// Within-panel kernel-weighted meat, zero across panels.
///
/// Applies [`meat_kernel`] to each panel's contiguous block of rows and
/// sums the per-panel results, so no cross-product ever pairs
/// observations from different panels. The same bandwidth is used for
/// every panel; blocks shorter than the bandwidth truncate their own lag
/// loops.
pub fn meat_panel(
    rows: ArrayView2<'_, f64>, panels: &PanelIndex, kernel: KernelType, bandwidth: usize,
) -> Array2<f64> {
    let k = rows.ncols();
    let mut meat = Array2::<f64>::zeros((k, k));
    for &(start, len) in panels.spans() {
        let block = rows.slice(s![start..start + len, ..]);
        meat += &meat_kernel(block, kernel, bandwidth);
    }
    meat
}

/// Meat for one row sequence under an optional kernel window.
///
/// An absent window is the bandwidth-0 case: only the lag-0 outer
/// product enters.
fn windowed_meat(rows: ArrayView2<'_, f64>, window: Option<&HacOptions>) -> Array2<f64> {
    match window {
        None => meat_outer(rows),
        Some(opts) => meat_kernel(rows, opts.kernel, opts.resolve(rows)),
    }
}

/// Run the configured sandwich estimator on a fitted regression.
///
/// Parameters
/// ----------
/// - `model`: `&FittedRegression`
///   Validated design matrix, residuals, and optional leverage.
/// - `config`: `&RobustConfig`
///   The four orthogonal estimator axes. See [`RobustConfig`].
///
/// Returns
/// -------
/// `CovarianceResult<CovarianceOutcome>`
///   The symmetric `k×k` covariance matrix with any non-fatal numerical
///   warnings, or the first configuration error.
///
/// Errors
/// ------
/// - `CovarianceError::DimensionMismatch`
///   A grouping index covering a different number of observations than
///   the model.
/// - `CovarianceError::BandwidthExceedsSample`
///   An explicit window bandwidth at or above the observation count.
/// - `CovarianceError::DegenerateDof`
///   `nobs <= nparams` with HC1 or with the small-sample correction on
///   an unclustered estimator.
/// - `CovarianceError::InsufficientClusters`
///   Fewer than two clusters in any corrected one-way component.
/// - `CovarianceError::LeverageAtUnity`
///   A hat-diagonal entry at or above one under HC2/HC3.
///
/// All of these are raised before any meat computation begins.
///
/// Notes
/// -----
/// - Two-way grouping keys that induce the same partition attach a
///   [`NumericalWarning::DegenerateTwoWay`]; the returned matrix then
///   equals the one-way estimate, which is the correct value for the
///   degenerate input.
/// - A minimum eigenvalue below the relative negative tolerance attaches
///   [`NumericalWarning::NegativeEigenvalue`]. Two-way estimates are the
///   usual source: the inclusion-exclusion difference is not guaranteed
///   positive semi-definite.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::array;
/// # use sandwich_covariance::model::FittedRegression;
/// # use sandwich_covariance::sandwich::{robust_covariance, RobustConfig};
/// let model = FittedRegression::new(
///     array![[1.0], [1.0], [1.0], [1.0]],
///     array![1.0, -1.0, 1.0, -1.0],
///     None,
/// )
/// .unwrap();
/// let outcome = robust_covariance(&model, &RobustConfig::default()).unwrap();
/// assert!((outcome.covariance()[[0, 0]] - 0.25).abs() < 1e-12);
/// assert!(outcome.warnings().is_empty());
/// ```
pub fn robust_covariance(
    model: &FittedRegression, config: &RobustConfig,
) -> CovarianceResult<CovarianceOutcome> {
    let nobs = model.nobs();
    let nparams = model.nparams();
    let mut warnings: Vec<NumericalWarning> = Vec::new();

    // Fail fast: every configuration error surfaces before any meat is
    // formed.
    validate_grouping(&config.grouping, nobs, config.small_sample)?;
    if let Some(opts) = &config.window {
        if let Some(bandwidth) = opts.bandwidth {
            select_bandwidth(nobs, Some(bandwidth))?;
        }
    }
    if config.small_sample
        && matches!(config.grouping, Grouping::None | Grouping::Panel(_))
        && nobs <= nparams
    {
        return Err(CovarianceError::DegenerateDof { nobs, nparams });
    }
    let meat_factor = config.scale.meat_factor(nobs, nparams)?;

    let bread = model.bread();
    let leverage = if config.scale.needs_leverage() {
        Some(model.hat_diagonal_from(&bread))
    } else {
        None
    };
    let residual_scale = config.scale.residual_scale(nobs, leverage.as_ref())?;
    let scaled_residuals = model.residuals() * &residual_scale;
    let scores = model.score_matrix(&scaled_residuals);

    let dof_factor = if config.small_sample {
        nobs as f64 / (nobs - nparams) as f64
    } else {
        1.0
    };

    let cov = match &config.grouping {
        Grouping::None => {
            let meat = windowed_meat(scores.view(), config.window.as_ref());
            assemble(&bread, &meat) * (meat_factor * dof_factor)
        }
        Grouping::Panel(panels) => {
            let opts = config.window.clone().unwrap_or_else(|| HacOptions::bartlett(0));
            let bandwidth = opts.resolve(scores.view());
            let meat = meat_panel(scores.view(), panels, opts.kernel, bandwidth);
            assemble(&bread, &meat) * (meat_factor * dof_factor)
        }
        Grouping::OneWay(index) => {
            one_way_covariance(&bread, &scores, index, config, meat_factor)?
        }
        Grouping::TwoWay { first, second, pair } => {
            if first.same_partition(second) {
                warnings.push(NumericalWarning::DegenerateTwoWay);
            }
            let v_first = one_way_covariance(&bread, &scores, first, config, meat_factor)?;
            let v_second = one_way_covariance(&bread, &scores, second, config, meat_factor)?;
            let v_pair = one_way_covariance(&bread, &scores, pair, config, meat_factor)?;
            &v_first + &v_second - &v_pair
        }
    };

    let (min_eigenvalue, max_abs) = eigenvalue_range(&cov);
    if min_eigenvalue < -(PSD_TOL * max_abs.max(1.0)) {
        warnings.push(NumericalWarning::NegativeEigenvalue { min_eigenvalue });
    }

    Ok(CovarianceOutcome { cov, warnings })
}

/// One fully corrected one-way cluster-robust covariance component.
fn one_way_covariance(
    bread: &Array2<f64>, scores: &Array2<f64>, index: &ClusterIndex, config: &RobustConfig,
    meat_factor: f64,
) -> CovarianceResult<Array2<f64>> {
    let cluster_rows = index.aggregate(scores)?;
    let meat = windowed_meat(cluster_rows.view(), config.window.as_ref());
    let mut cov = assemble(bread, &meat) * meat_factor;
    if config.small_sample {
        let n_clusters = index.n_clusters() as f64;
        cov *= n_clusters / (n_clusters - 1.0);
    }
    Ok(cov)
}

/// Check grouping indexes against the model before any computation.
fn validate_grouping(
    grouping: &Grouping, nobs: usize, small_sample: bool,
) -> CovarianceResult<()> {
    let check_cover = |covered: usize| -> CovarianceResult<()> {
        if covered != nobs {
            return Err(CovarianceError::DimensionMismatch {
                quantity: "grouping labels",
                expected: nobs,
                actual: covered,
            });
        }
        Ok(())
    };
    let check_count = |index: &ClusterIndex| -> CovarianceResult<()> {
        if small_sample && index.n_clusters() < 2 {
            return Err(CovarianceError::InsufficientClusters { found: index.n_clusters() });
        }
        Ok(())
    };

    match grouping {
        Grouping::None => Ok(()),
        Grouping::OneWay(index) => {
            check_cover(index.nobs())?;
            check_count(index)
        }
        Grouping::TwoWay { first, second, pair } => {
            check_cover(first.nobs())?;
            check_cover(second.nobs())?;
            check_cover(pair.nobs())?;
            check_count(first)?;
            check_count(second)?;
            check_count(pair)
        }
        Grouping::Panel(panels) => check_cover(panels.nobs()),
    }
}

/// Minimum eigenvalue and maximum absolute eigenvalue of a symmetric
/// matrix, for the post-hoc definiteness diagnostic.
fn eigenvalue_range(matrix: &Array2<f64>) -> (f64, f64) {
    let eigenvalues = to_dmatrix(matrix).symmetric_eigen().eigenvalues;
    let mut min = f64::INFINITY;
    let mut max_abs = 0.0_f64;
    for &value in eigenvalues.iter() {
        min = min.min(value);
        max_abs = max_abs.max(value.abs());
    }
    (min, max_abs)
}
