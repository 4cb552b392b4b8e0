//! Fitted-regression adapter: scores, leverage, and the bread inverse.
//!
//! Purpose
//! -------
//! Provide the single in-process boundary between a fitted model and the
//! covariance estimators. [`FittedRegression`] owns the design matrix,
//! the residual vector, and an optional hat-diagonal (leverage) vector,
//! and derives the quantities every estimator consumes: the score matrix,
//! the leverage values, and the eigendecomposition-based pseudoinverse of
//! the Gram matrix `XᵀX` (the "bread" of the sandwich).
//!
//! Key behaviors
//! -------------
//! - Validate all inputs once, at construction, so downstream code can
//!   rely on conformable, finite arrays.
//! - Build score rows `s_i = e_i · x_i` for arbitrary (possibly rescaled)
//!   residual vectors.
//! - Copy the Gram matrix into a `nalgebra::DMatrix` (column-major) and
//!   invert it through `symmetric_eigen` with eigenvalue truncation, so
//!   collinear design columns degrade gracefully instead of blowing up.
//! - Derive hat-diagonal values `h_i = x_iᵀ (XᵀX)⁺ x_i` when the caller
//!   did not supply them.
//!
//! Invariants & assumptions
//! ------------------------
//! - After construction, the design matrix is `n×k` with `n, k >= 1`, the
//!   residual vector has length `n`, and any leverage vector has length
//!   `n`; every entry is finite.
//! - The pseudoinverse drops eigenvalue directions at or below the
//!   relative cutoff in [`crate::numerical::EIGEN_EPS`]; symmetry of
//!   `XᵀX` is exact by construction, so no re-symmetrization is needed.
//!
//! Conventions
//! -----------
//! - Rows index observations, columns index parameters.
//! - All derived quantities are computed per call; nothing is cached, so
//!   a `FittedRegression` can be shared freely across threads.
//!
//! Testing notes
//! -------------
//! - Unit tests cover score construction, the bread pseudoinverse on a
//!   hand-invertible design, hat-diagonal derivation, and the preference
//!   for caller-supplied leverage.

use crate::{
    errors::CovarianceResult,
    numerical::EIGEN_EPS,
    validation::validate_regression,
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

/// Immutable bundle of fitted-model outputs consumed by the estimators.
///
/// Purpose
/// -------
/// Hold the design matrix `X`, residual vector `e`, and optional
/// hat-diagonal vector of a fitted regression, validated once so that
/// every covariance routine can assume conformable, finite inputs.
///
/// Fields
/// ------
/// - `design`: `Array2<f64>`
///   `n×k` design matrix.
/// - `residuals`: `Array1<f64>`
///   Length-`n` residual vector.
/// - `leverage`: `Option<Array1<f64>>`
///   Optional length-`n` hat-diagonal vector. When absent, leverage-based
///   variants derive it from the design matrix.
///
/// Invariants
/// ----------
/// - Shapes and finiteness are enforced by [`FittedRegression::new`];
///   instances cannot exist in an inconsistent state.
///
/// Notes
/// -----
/// - The struct is a value object: it never mutates its inputs and holds
///   no state between estimator calls.
#[derive(Debug, Clone)]
pub struct FittedRegression {
    design: Array2<f64>,
    residuals: Array1<f64>,
    leverage: Option<Array1<f64>>,
}

impl FittedRegression {
    /// Validate and wrap fitted-model outputs.
    ///
    /// Parameters
    /// ----------
    /// - `design`: `Array2<f64>`
    ///   `n×k` design matrix with `n, k >= 1`.
    /// - `residuals`: `Array1<f64>`
    ///   Length-`n` residual vector.
    /// - `leverage`: `Option<Array1<f64>>`
    ///   Optional length-`n` hat-diagonal vector. Values at or above one
    ///   are accepted here; only the leverage-based variants reject them.
    ///
    /// Returns
    /// -------
    /// `CovarianceResult<FittedRegression>`
    ///   The validated adapter, or the first violated constraint.
    ///
    /// Errors
    /// ------
    /// - `CovarianceError::DimensionMismatch`
    ///   Empty design, or a residual/leverage length differing from `n`.
    /// - `CovarianceError::NonFiniteInput`
    ///   Any NaN or infinite entry in any input.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::array;
    /// # use sandwich_covariance::model::FittedRegression;
    /// let model = FittedRegression::new(
    ///     array![[1.0], [1.0], [1.0], [1.0]],
    ///     array![1.0, -1.0, 1.0, -1.0],
    ///     None,
    /// )
    /// .unwrap();
    /// assert_eq!(model.nobs(), 4);
    /// assert_eq!(model.nparams(), 1);
    /// ```
    pub fn new(
        design: Array2<f64>, residuals: Array1<f64>, leverage: Option<Array1<f64>>,
    ) -> CovarianceResult<FittedRegression> {
        validate_regression(&design, &residuals, leverage.as_ref())?;
        Ok(FittedRegression { design, residuals, leverage })
    }

    /// Number of observations `n`.
    pub fn nobs(&self) -> usize {
        self.design.nrows()
    }

    /// Number of parameters `k`.
    pub fn nparams(&self) -> usize {
        self.design.ncols()
    }

    /// The design matrix.
    pub fn design(&self) -> &Array2<f64> {
        &self.design
    }

    /// The residual vector.
    pub fn residuals(&self) -> &Array1<f64> {
        &self.residuals
    }

    /// The caller-supplied hat-diagonal vector, if any.
    pub fn leverage(&self) -> Option<&Array1<f64>> {
        self.leverage.as_ref()
    }

    /// Build the score matrix for an arbitrary residual vector.
    ///
    /// Row `i` of the result is `residuals[i] · x_i`. The residual
    /// argument is taken explicitly (rather than always using the stored
    /// residuals) so that leverage-rescaled residuals produce rescaled
    /// scores through the same code path; each entry of `residuals` is a
    /// per-row scalar, never broadcast across rows.
    ///
    /// # Arguments
    /// - `residuals`: length-`n` vector of (possibly rescaled) residuals.
    ///
    /// # Returns
    /// The `n×k` score matrix.
    pub fn score_matrix(&self, residuals: &Array1<f64>) -> Array2<f64> {
        let mut scores = self.design.clone();
        for (mut row, &e) in scores.rows_mut().into_iter().zip(residuals.iter()) {
            row *= e;
        }
        scores
    }

    /// The bread inverse `(XᵀX)⁺`.
    ///
    /// Computed through a symmetric eigendecomposition with relative
    /// eigenvalue truncation: directions with eigenvalues at or below
    /// `EIGEN_EPS · max(1, |λ|_max)` are excluded, so a rank-deficient
    /// Gram matrix yields the Moore–Penrose pseudoinverse on its range
    /// instead of failing.
    ///
    /// # Returns
    /// The `k×k` symmetric pseudoinverse of the Gram matrix.
    pub fn bread(&self) -> Array2<f64> {
        let gram = self.design.t().dot(&self.design);
        symmetric_pinv(&gram)
    }

    /// Hat-diagonal values, preferring the caller-supplied vector.
    ///
    /// # Returns
    /// The stored leverage vector when present, otherwise
    /// `h_i = x_iᵀ (XᵀX)⁺ x_i` derived from the design matrix.
    pub fn hat_diagonal(&self) -> Array1<f64> {
        match &self.leverage {
            Some(h) => h.clone(),
            None => self.hat_diagonal_from(&self.bread()),
        }
    }

    /// Hat-diagonal values computed against an already-built bread
    /// inverse, so callers that hold one avoid a second decomposition.
    pub(crate) fn hat_diagonal_from(&self, bread: &Array2<f64>) -> Array1<f64> {
        if let Some(h) = &self.leverage {
            return h.clone();
        }
        let mut hat = Array1::<f64>::zeros(self.nobs());
        for (i, row) in self.design.rows().into_iter().enumerate() {
            let projected = bread.dot(&row);
            hat[i] = row.dot(&projected);
        }
        hat
    }
}

/// Copy a square symmetric `ndarray` matrix into a `nalgebra::DMatrix`.
///
/// The copy proceeds column by column, matching the internal storage of
/// `DMatrix`. No symmetrization is performed; callers pass matrices that
/// are symmetric by construction.
pub(crate) fn to_dmatrix(matrix: &Array2<f64>) -> DMatrix<f64> {
    let n = matrix.ncols();
    let mut dm = DMatrix::<f64>::zeros(n, n);
    for j in 0..n {
        for i in 0..n {
            dm[(i, j)] = matrix[[i, j]];
        }
    }
    dm
}

/// Pseudoinverse of a symmetric matrix via eigendecomposition.
///
/// Decomposes with `symmetric_eigen` and reconstructs
/// `Σ_{λ > cutoff} λ⁻¹ q qᵀ` with the relative cutoff
/// `EIGEN_EPS · max(1, |λ|_max)`.
pub(crate) fn symmetric_pinv(matrix: &Array2<f64>) -> Array2<f64> {
    let n = matrix.ncols();
    let eigen = to_dmatrix(matrix).symmetric_eigen();
    let q = eigen.eigenvectors;
    let eigenvalues = eigen.eigenvalues;

    let max_abs = eigenvalues.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let cutoff = EIGEN_EPS * max_abs.max(1.0);

    let mut inverse = Array2::<f64>::zeros((n, n));
    for (idx, &lambda) in eigenvalues.iter().enumerate() {
        if lambda > cutoff {
            let scale = 1.0 / lambda;
            for i in 0..n {
                for j in 0..n {
                    inverse[[i, j]] += scale * q[(i, idx)] * q[(j, idx)];
                }
            }
        }
    }
    inverse
}
