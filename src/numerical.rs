//! Numerical tolerance constants shared across the crate.
//!
//! Groups the cutoffs used by the eigendecomposition-based pseudoinverse,
//! the post-hoc positive-semidefiniteness diagnostic, and the AR(1)
//! plug-in bandwidth selector. Keeping them in one place makes the
//! numerical contracts of the estimators auditable and consistent.

/// Relative eigenvalue cutoff for pseudoinverse truncation.
///
/// When inverting a symmetric Gram matrix `XᵀX` through its eigendecomposition,
/// eigenvalues at or below `EIGEN_EPS * max(1, |λ|_max)` are treated as zero
/// and excluded from the inverse. Directions dropped this way correspond to
/// collinear (or nearly collinear) columns of the design matrix.
pub const EIGEN_EPS: f64 = 1e-12;

/// Relative tolerance for the negative-eigenvalue diagnostic.
///
/// A returned covariance matrix whose minimum eigenvalue falls below
/// `-PSD_TOL * max(1, |λ|_max)` is flagged with a non-fatal warning.
/// Negative values within this band are attributed to floating-point
/// roundoff and stay silent, matching the tolerance callers are expected
/// to apply themselves.
pub const PSD_TOL: f64 = 1e-8;

/// Safety margin for strict stationarity in the AR(1) plug-in.
///
/// The plug-in bandwidth formulas divide by powers of `1 - φ` and
/// `1 - φ²`; an autoregressive coefficient with `|φ| >= 1 - STATIONARITY_MARGIN`
/// puts those denominators in an ill-conditioned regime, so the plug-in
/// reports failure and the caller falls back to the deterministic rule.
pub const STATIONARITY_MARGIN: f64 = 1e-6;

/// General-purpose denominator tolerance.
///
/// Sums that serve as denominators (e.g. the plug-in α aggregation) are
/// rejected when they fall below this value, rather than producing a
/// meaninglessly large quotient.
pub const GENERAL_TOL: f64 = 1e-12;
