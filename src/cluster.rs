//! Cluster index structures and within-cluster score aggregation.
//!
//! Purpose
//! -------
//! Turn arbitrary grouping keys into the integer cluster-id arrays the
//! assembler consumes, and sum per-observation score rows within each
//! cluster to form cluster-level score vectors. One-way clustering uses a
//! single [`ClusterIndex`]; two-way clustering uses two independent
//! indexes plus their pairwise intersection, combined by the assembler
//! through the inclusion–exclusion identity.
//!
//! Key behaviors
//! -------------
//! - Canonicalize labels of any hashable type into first-appearance-order
//!   cluster ids, so callers never need contiguous integer keys.
//! - Aggregate an `n×k` score matrix into a `G×k` matrix of
//!   within-cluster sums.
//! - Build the intersection partition of two labelings for the two-way
//!   correction.
//! - Detect when two labelings induce the same partition, which
//!   degenerates two-way clustering to one-way.
//!
//! Invariants
//! ----------
//! - Every observation belongs to exactly one cluster per index; cluster
//!   sizes are at least 1 by construction, but the aggregation step still
//!   defends against empty clusters.
//! - `assignments` maps each observation to a cluster id in
//!   `0..n_clusters`, ids ordered by first appearance.

use crate::errors::{CovarianceError, CovarianceResult};
use ndarray::Array2;
use std::collections::HashMap;
use std::hash::Hash;

/// Cluster membership information for grouped observations.
///
/// Stores both directions of the mapping: per-observation cluster ids and
/// per-cluster observation lists. Ids are assigned in order of first
/// appearance, so the same partition always canonicalizes to the same id
/// vector regardless of the label values used to express it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterIndex {
    /// assignments[i] = cluster id of observation i.
    assignments: Vec<usize>,
    /// members[g] = observation indices belonging to cluster g, ascending.
    members: Vec<Vec<usize>>,
}

impl ClusterIndex {
    /// Build a cluster index from one grouping key per observation.
    ///
    /// # Arguments
    /// - `labels`: one key per observation; any hashable type, ids need
    ///   not be contiguous or numeric.
    ///
    /// # Returns
    /// The canonicalized index. Labels of length zero produce an index
    /// with zero clusters; entry points reject that earlier via the
    /// label-length validation.
    pub fn from_labels<K: Hash + Eq>(labels: &[K]) -> ClusterIndex {
        let mut id_of: HashMap<&K, usize> = HashMap::new();
        let mut assignments = Vec::with_capacity(labels.len());
        let mut members: Vec<Vec<usize>> = Vec::new();

        for (i, key) in labels.iter().enumerate() {
            let id = match id_of.get(key) {
                Some(&g) => g,
                None => {
                    let g = members.len();
                    id_of.insert(key, g);
                    members.push(Vec::new());
                    g
                }
            };
            assignments.push(id);
            members[id].push(i);
        }

        ClusterIndex { assignments, members }
    }

    /// Build the intersection partition of two labelings.
    ///
    /// Observations share a cluster in the result exactly when they share
    /// a cluster under *both* input labelings. This is the `g1×g2`
    /// partition subtracted by the two-way inclusion–exclusion identity.
    ///
    /// # Errors
    /// - `CovarianceError::DimensionMismatch` when the labelings differ
    ///   in length.
    pub fn from_label_pairs<K1: Hash + Eq, K2: Hash + Eq>(
        first: &[K1], second: &[K2],
    ) -> CovarianceResult<ClusterIndex> {
        if first.len() != second.len() {
            return Err(CovarianceError::DimensionMismatch {
                quantity: "second grouping labels",
                expected: first.len(),
                actual: second.len(),
            });
        }
        let pairs: Vec<(&K1, &K2)> = first.iter().zip(second.iter()).collect();
        Ok(ClusterIndex::from_labels(&pairs))
    }

    /// Number of distinct clusters `G`.
    pub fn n_clusters(&self) -> usize {
        self.members.len()
    }

    /// Number of observations covered by the index.
    pub fn nobs(&self) -> usize {
        self.assignments.len()
    }

    /// Per-cluster observation lists.
    pub fn members(&self) -> &[Vec<usize>] {
        &self.members
    }

    /// Whether two indexes induce the same partition of observations.
    ///
    /// Compares canonical id vectors, so relabeled but structurally
    /// identical groupings are recognized as equal.
    pub fn same_partition(&self, other: &ClusterIndex) -> bool {
        self.assignments == other.assignments
    }

    /// Sum score rows within each cluster.
    ///
    /// Parameters
    /// ----------
    /// - `scores`: `&Array2<f64>`
    ///   `n×k` score matrix whose row count must match the index.
    ///
    /// Returns
    /// -------
    /// `CovarianceResult<Array2<f64>>`
    ///   `G×k` matrix whose row `g` is the sum of the score rows of the
    ///   observations in cluster `g`.
    ///
    /// Errors
    /// ------
    /// - `CovarianceError::DimensionMismatch`
    ///   Score row count differing from the indexed observation count.
    /// - `CovarianceError::EmptyCluster`
    ///   A cluster with zero members. Cannot arise from a well-formed
    ///   partition but is defended against rather than producing a row of
    ///   silent zeros.
    pub fn aggregate(&self, scores: &Array2<f64>) -> CovarianceResult<Array2<f64>> {
        if scores.nrows() != self.nobs() {
            return Err(CovarianceError::DimensionMismatch {
                quantity: "score rows",
                expected: self.nobs(),
                actual: scores.nrows(),
            });
        }

        let mut sums = Array2::<f64>::zeros((self.n_clusters(), scores.ncols()));
        for (g, rows) in self.members.iter().enumerate() {
            if rows.is_empty() {
                return Err(CovarianceError::EmptyCluster { cluster: g });
            }
            let mut acc = sums.row_mut(g);
            for &i in rows {
                acc += &scores.row(i);
            }
        }
        Ok(sums)
    }
}
