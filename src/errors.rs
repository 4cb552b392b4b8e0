//! Unified error handling for robust covariance estimation.
//!
//! This module defines `CovarianceError`, the central error type used by
//! bandwidth selection, residual rescaling, cluster aggregation, and
//! sandwich assembly, together with the alias `CovarianceResult<T>` that
//! standardizes return types across the crate. It also defines
//! `NumericalWarning`, the non-fatal diagnostics attached to an otherwise
//! successful covariance computation.
//!
//! All configuration failures are raised before any meat computation
//! begins; numerical issues detected on the finished matrix are reported
//! as warnings and never abort the call.

/// Unified error type for covariance estimation routines.
///
/// Covers malformed inputs (dimension mismatches, non-finite values),
/// invalid estimator configuration (oversized bandwidths, degenerate
/// degrees of freedom, leverage at unity), cluster-structure defects, and
/// plug-in bandwidth degeneracies. Integrates with `anyhow::Error` via
/// `From`, and provides readable diagnostics through `Display`.
#[derive(Debug, Clone, PartialEq)]
pub enum CovarianceError {
    // ---- Input shape and content ----
    /// Two quantities that must share a length or dimension do not.
    DimensionMismatch {
        quantity: &'static str,
        expected: usize,
        actual: usize,
    },

    /// An input entry is NaN or infinite.
    NonFiniteInput {
        quantity: &'static str,
        index: usize,
        value: f64,
    },

    // ---- Estimator configuration ----
    /// An explicit truncation lag does not leave any slack in the sample.
    BandwidthExceedsSample {
        bandwidth: usize,
        nobs: usize,
    },

    /// A hat-diagonal entry is at or above one, so leverage-based
    /// rescaling is undefined for that observation.
    LeverageAtUnity {
        index: usize,
        leverage: f64,
    },

    /// A leverage-based variant was requested without a leverage vector.
    LeverageRequired {
        variant: &'static str,
    },

    /// A small-sample correction was requested with `nobs <= nparams`.
    DegenerateDof {
        nobs: usize,
        nparams: usize,
    },

    // ---- Cluster structure ----
    /// A cluster with zero members reached the aggregation step.
    EmptyCluster {
        cluster: usize,
    },

    /// Cluster-level corrections need at least two clusters.
    InsufficientClusters {
        found: usize,
    },

    /// A panel's observations are not stored as one contiguous block.
    NonContiguousPanel {
        panel: usize,
    },

    // ---- Plug-in bandwidth selection ----
    /// Stationarity is violated in an AR(1) fit.
    StationarityViolated {
        phi: f64,
    },

    /// Denominator is too close to zero in the plug-in aggregation.
    DenominatorTooSmall {
        denominator: f64,
    },

    /// The AR(1) fit itself failed (too few observations or a solver
    /// breakdown inside the autoregression routine).
    AutoregressionFailed,

    // ---- Anyhow catchall ----
    Anyhow(String),
}

pub type CovarianceResult<T> = Result<T, CovarianceError>;

impl std::error::Error for CovarianceError {}

impl From<anyhow::Error> for CovarianceError {
    fn from(err: anyhow::Error) -> Self {
        CovarianceError::Anyhow(err.to_string())
    }
}

impl std::fmt::Display for CovarianceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input shape and content ----
            CovarianceError::DimensionMismatch { quantity, expected, actual } => write!(
                f,
                "Covariance Error: {} has length {} but {} was expected",
                quantity, actual, expected
            ),
            CovarianceError::NonFiniteInput { quantity, index, value } => write!(
                f,
                "Covariance Error: {} contains non-finite value {} at index {}",
                quantity, value, index
            ),

            // ---- Estimator configuration ----
            CovarianceError::BandwidthExceedsSample { bandwidth, nobs } => write!(
                f,
                "Covariance Error: bandwidth {} must be smaller than the sample size {}",
                bandwidth, nobs
            ),
            CovarianceError::LeverageAtUnity { index, leverage } => write!(
                f,
                "Covariance Error: leverage {} at observation {} is >= 1; \
                 leverage-based rescaling is undefined",
                leverage, index
            ),
            CovarianceError::LeverageRequired { variant } => write!(
                f,
                "Covariance Error: variant {} requires a leverage vector",
                variant
            ),
            CovarianceError::DegenerateDof { nobs, nparams } => write!(
                f,
                "Covariance Error: small-sample correction is undefined for \
                 {} observations and {} parameters",
                nobs, nparams
            ),

            // ---- Cluster structure ----
            CovarianceError::EmptyCluster { cluster } => {
                write!(f, "Covariance Error: cluster {} has zero members", cluster)
            }
            CovarianceError::InsufficientClusters { found } => write!(
                f,
                "Covariance Error: cluster-level corrections require at least 2 clusters; found {}",
                found
            ),
            CovarianceError::NonContiguousPanel { panel } => write!(
                f,
                "Covariance Error: panel {} is not a contiguous block of observations",
                panel
            ),

            // ---- Plug-in bandwidth selection ----
            CovarianceError::StationarityViolated { phi } => {
                write!(f, "Covariance Error: stationarity violated (phi = {})", phi)
            }
            CovarianceError::DenominatorTooSmall { denominator } => write!(
                f,
                "Covariance Error: denominator too small ({}) in plug-in bandwidth calculation",
                denominator
            ),
            CovarianceError::AutoregressionFailed => {
                write!(f, "Covariance Error: AR(1) estimation failed in plug-in bandwidth")
            }

            // ---- Anyhow catchall ----
            CovarianceError::Anyhow(msg) => write!(f, "Covariance Error: {}", msg),
        }
    }
}

/// Non-fatal diagnostics attached to a successful covariance computation.
///
/// Warnings are carried inside the returned outcome so that callers can
/// inspect them; they never interrupt the computation and are never
/// silently dropped by this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericalWarning {
    /// The returned matrix has an eigenvalue below the negative tolerance,
    /// so it is not positive semi-definite beyond roundoff.
    NegativeEigenvalue {
        min_eigenvalue: f64,
    },

    /// Both grouping keys of a two-way clustering induce the same
    /// partition; the estimate collapses to the one-way value.
    DegenerateTwoWay,
}

impl std::fmt::Display for NumericalWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericalWarning::NegativeEigenvalue { min_eigenvalue } => write!(
                f,
                "Covariance Warning: matrix has negative eigenvalue {} beyond roundoff tolerance",
                min_eigenvalue
            ),
            NumericalWarning::DegenerateTwoWay => write!(
                f,
                "Covariance Warning: two-way grouping keys induce identical partitions; \
                 the estimate equals the one-way value"
            ),
        }
    }
}
