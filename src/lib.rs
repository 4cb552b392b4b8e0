//! sandwich_covariance — robust covariance estimators for fitted regressions.
//!
//! Purpose
//! -------
//! Compute heteroscedasticity- and/or autocorrelation-consistent
//! covariance matrices for estimated regression coefficients from a
//! fitted model's design matrix, residuals, and (optionally) leverage
//! values. The crate covers the HC0–HC3 family, kernel-weighted HAC
//! estimators, one-way and two-way cluster-robust estimators, and the
//! panel-robust composition of the two, all assembled by a single
//! sandwich driver.
//!
//! Key behaviors
//! -------------
//! - Accept fitted-model outputs through [`model::FittedRegression`], the
//!   crate's only in-process boundary; model fitting itself is out of
//!   scope.
//! - Expose the classical estimator names ([`api::cov_hc0`] through
//!   [`api::cov_hc3`], [`api::cov_hac`], [`api::cov_cluster`],
//!   [`api::cov_cluster_2groups`], [`api::cov_nw_panel`],
//!   [`api::se_cov`]) as thin configurations of
//!   [`sandwich::robust_covariance`].
//! - Treat residual rescaling, kernel windows, grouping structure, and
//!   small-sample corrections as four orthogonal configuration axes of
//!   [`sandwich::RobustConfig`].
//! - Report configuration problems as [`errors::CovarianceError`] before
//!   any computation, and numerical findings on the finished matrix as
//!   [`errors::NumericalWarning`] values carried inside
//!   [`sandwich::CovarianceOutcome`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Every returned matrix is symmetrized with `(V + Vᵀ)/2` before it
//!   leaves the assembler.
//! - All entities are transient: nothing is cached between calls, so
//!   independent calls may run concurrently on disjoint inputs without
//!   synchronization.
//!
//! Conventions
//! -----------
//! - Rows index observations, columns index parameters, everywhere.
//! - All functions are pure with respect to I/O: no logging, no global
//!   state, no `unsafe`. Diagnostics travel through error values and
//!   outcome warnings.
//!
//! Downstream usage
//! ----------------
//! - Wrap a fitted model's outputs in [`model::FittedRegression`], pick a
//!   named configuration from [`api`] (or build a
//!   [`sandwich::RobustConfig`] directly), and feed the resulting matrix
//!   to any inference routine that consumes a coefficient covariance.
//! - `use sandwich_covariance::prelude::*;` imports the primary surface
//!   in one line.
//!
//! Testing notes
//! -------------
//! - Each module carries a unit suite for its own contracts; the
//!   `tests/` integration suite exercises the named configurations
//!   end-to-end on hand-checkable fixtures.

pub mod api;
pub mod bandwidth;
pub mod cluster;
pub mod errors;
pub mod hc;
pub mod kernel;
pub mod model;
pub mod numerical;
pub mod panel;
pub mod sandwich;
pub mod validation;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::api::{
    cov_cluster, cov_cluster_2groups, cov_hac, cov_hc0, cov_hc1, cov_hc2, cov_hc3, cov_nw_panel,
    cov_white_simple, se_cov, TwoWayCovariance,
};
pub use self::bandwidth::{select_bandwidth, BandwidthRule, HacOptions};
pub use self::cluster::ClusterIndex;
pub use self::errors::{CovarianceError, CovarianceResult, NumericalWarning};
pub use self::hc::HcScale;
pub use self::kernel::KernelType;
pub use self::model::FittedRegression;
pub use self::panel::PanelIndex;
pub use self::sandwich::{robust_covariance, CovarianceOutcome, Grouping, RobustConfig};

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use sandwich_covariance::prelude::*;` to import
// the primary estimation surface in a single line.

pub mod prelude {
    pub use super::api::{
        cov_cluster, cov_cluster_2groups, cov_hac, cov_hc0, cov_hc1, cov_hc2, cov_hc3,
        cov_nw_panel, cov_white_simple, se_cov, TwoWayCovariance,
    };
    pub use super::bandwidth::{select_bandwidth, BandwidthRule, HacOptions};
    pub use super::errors::{CovarianceError, CovarianceResult, NumericalWarning};
    pub use super::hc::HcScale;
    pub use super::kernel::KernelType;
    pub use super::model::FittedRegression;
    pub use super::sandwich::{robust_covariance, CovarianceOutcome, Grouping, RobustConfig};
}
