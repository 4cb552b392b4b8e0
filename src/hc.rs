//! Heteroscedasticity-consistent residual rescaling (HC0 through HC3).
//!
//! Purpose
//! -------
//! Encode the four classical leverage-based rescaling schemes applied to
//! residuals before the meat of the sandwich is formed. The schemes
//! differ only in a per-observation multiplier on the residual and, for
//! HC1, a uniform multiplier on the finished meat; everything else in the
//! estimator is shared.
//!
//! Elementwise contracts
//! ---------------------
//! Stated explicitly so there is no ambiguity about which quantities are
//! scalars and which are per-row:
//! - HC0: residual multiplier 1 (per-row), meat factor 1 (scalar).
//! - HC1: residual multiplier 1 (per-row), meat factor `n/(n−k)` (scalar).
//! - HC2: residual multiplier `1/sqrt(1−h_i)` (per-row), meat factor 1.
//! - HC3: residual multiplier `1/(1−h_i)` (per-row), meat factor 1.
//!
//! Squaring the residual multipliers inside the meat reproduces the usual
//! `1/(1−h_i)` and `1/(1−h_i)²` weights on the squared residuals.
//!
//! Failure modes
//! -------------
//! Any hat-diagonal entry at or above one makes HC2/HC3 undefined (a
//! perfectly fitted or collinear row); the rescaling detects this and
//! reports a configuration error rather than dividing toward infinity.

use crate::errors::{CovarianceError, CovarianceResult};
use ndarray::Array1;

/// Leverage-based residual rescaling scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HcScale {
    /// No adjustment; the classical White estimator.
    #[default]
    Hc0,
    /// HC0 meat scaled uniformly by `n/(n−k)`.
    Hc1,
    /// Residuals scaled by `1/sqrt(1−h_i)`.
    Hc2,
    /// Residuals scaled by `1/(1−h_i)`.
    Hc3,
}

impl HcScale {
    /// Whether this variant consumes the hat diagonal.
    pub fn needs_leverage(&self) -> bool {
        matches!(self, HcScale::Hc2 | HcScale::Hc3)
    }

    /// Per-observation residual multipliers.
    ///
    /// Parameters
    /// ----------
    /// - `nobs`: `usize`
    ///   Number of observations; sets the output length.
    /// - `leverage`: `Option<&Array1<f64>>`
    ///   Hat-diagonal vector. Required for `Hc2`/`Hc3`; ignored by
    ///   `Hc0`/`Hc1`.
    ///
    /// Returns
    /// -------
    /// `CovarianceResult<Array1<f64>>`
    ///   Length-`nobs` vector of multipliers applied elementwise to the
    ///   residual vector before scores are formed.
    ///
    /// Errors
    /// ------
    /// - `CovarianceError::LeverageRequired`
    ///   `Hc2`/`Hc3` called without a leverage vector.
    /// - `CovarianceError::LeverageAtUnity`
    ///   Any hat-diagonal entry `>= 1`, where the rescaling is undefined.
    pub fn residual_scale(
        &self, nobs: usize, leverage: Option<&Array1<f64>>,
    ) -> CovarianceResult<Array1<f64>> {
        match self {
            HcScale::Hc0 | HcScale::Hc1 => Ok(Array1::ones(nobs)),
            HcScale::Hc2 | HcScale::Hc3 => {
                let hat = leverage.ok_or(CovarianceError::LeverageRequired {
                    variant: self.name(),
                })?;
                let mut scale = Array1::<f64>::zeros(hat.len());
                for (index, &h) in hat.iter().enumerate() {
                    if h >= 1.0 {
                        return Err(CovarianceError::LeverageAtUnity { index, leverage: h });
                    }
                    scale[index] = match self {
                        HcScale::Hc2 => 1.0 / (1.0 - h).sqrt(),
                        _ => 1.0 / (1.0 - h),
                    };
                }
                Ok(scale)
            }
        }
    }

    /// Uniform multiplier applied to the finished meat.
    ///
    /// Only `Hc1` scales the meat, by `n/(n−k)`; the other variants
    /// return 1. Composes independently with the small-sample correction
    /// flag of the assembler.
    ///
    /// # Errors
    /// - `CovarianceError::DegenerateDof` when `Hc1` is requested with
    ///   `nobs <= nparams`.
    pub fn meat_factor(&self, nobs: usize, nparams: usize) -> CovarianceResult<f64> {
        match self {
            HcScale::Hc1 => {
                if nobs <= nparams {
                    return Err(CovarianceError::DegenerateDof { nobs, nparams });
                }
                Ok(nobs as f64 / (nobs - nparams) as f64)
            }
            _ => Ok(1.0),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            HcScale::Hc0 => "HC0",
            HcScale::Hc1 => "HC1",
            HcScale::Hc2 => "HC2",
            HcScale::Hc3 => "HC3",
        }
    }
}
