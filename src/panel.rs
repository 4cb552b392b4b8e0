//! Panel structure for within-panel kernel windows.
//!
//! Purpose
//! -------
//! Validate and index panel-structured data, where serial correlation is
//! expected *within* each panel (unit) and ruled out *across* panels. The
//! panel-robust meat is the kernel-weighted HAC form applied inside each
//! panel and zero elsewhere, so this module only supplies structure; the
//! lag arithmetic lives with the assembler's meat builders.
//!
//! Conventions
//! -----------
//! - Observations of one panel must be stored as one contiguous block of
//!   rows, in time order within the block. This is the usual
//!   sorted-by-(unit, time) layout; interleaved panels are rejected,
//!   because lag offsets inside a block would otherwise pair
//!   observations from different times than intended.

use crate::{cluster::ClusterIndex, errors::{CovarianceError, CovarianceResult}};
use std::hash::Hash;

/// Validated panel partition with contiguous row blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelIndex {
    /// (first row, length) of each panel's block, in panel id order.
    spans: Vec<(usize, usize)>,
    nobs: usize,
}

impl PanelIndex {
    /// Build a panel index from one grouping key per observation.
    ///
    /// # Arguments
    /// - `labels`: one key per observation; rows sharing a key form one
    ///   panel and must be adjacent.
    ///
    /// # Errors
    /// - `CovarianceError::NonContiguousPanel` when a panel's rows are
    ///   not one contiguous block.
    pub fn from_labels<K: Hash + Eq>(labels: &[K]) -> CovarianceResult<PanelIndex> {
        let clusters = ClusterIndex::from_labels(labels);
        let mut spans = Vec::with_capacity(clusters.n_clusters());
        for (panel, rows) in clusters.members().iter().enumerate() {
            let first = rows[0];
            let contiguous = rows.iter().enumerate().all(|(offset, &row)| row == first + offset);
            if !contiguous {
                return Err(CovarianceError::NonContiguousPanel { panel });
            }
            spans.push((first, rows.len()));
        }
        Ok(PanelIndex { spans, nobs: labels.len() })
    }

    /// Number of panels.
    pub fn n_panels(&self) -> usize {
        self.spans.len()
    }

    /// Number of observations covered by the index.
    pub fn nobs(&self) -> usize {
        self.nobs
    }

    /// (first row, length) of each panel's contiguous block.
    pub fn spans(&self) -> &[(usize, usize)] {
        &self.spans
    }
}
