//! Alignment outcomes.

use crate::path::AlignmentPath;
use crate::similarity::Objective;

/// A successful alignment: the optimal path and its accumulated score.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub(crate) path: AlignmentPath,
    pub(crate) score: f64,
    pub(crate) objective: Objective,
    pub(crate) region_cells: usize,
}

impl Alignment {
    /// Return the optimal path from `(0, 0)` to the terminal cell.
    #[must_use]
    pub fn path(&self) -> &AlignmentPath {
        &self.path
    }

    /// Consume the alignment and return its path.
    #[must_use]
    pub fn into_path(self) -> AlignmentPath {
        self.path
    }

    /// Return the accumulated score at the terminal cell.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Return whether `score` is a similarity (maximized) or a cost (minimized).
    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Return the number of admissible cells in the region that was searched.
    #[must_use]
    pub fn region_cells(&self) -> usize {
        self.region_cells
    }
}

/// Details of an alignment whose terminal cell could not be reached.
///
/// Besides a region or time weighting that excludes every path, this also
/// arises when accumulated scores overflow; `reachable_cells` close to
/// `region_cells` points at the latter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Infeasibility {
    /// Number of reference scans.
    pub rows: usize,
    /// Number of query scans.
    pub cols: usize,
    /// Admissible cells in the region.
    pub region_cells: usize,
    /// Cells that received a score.
    pub reachable_cells: usize,
}

/// Result of aligning one pair of sequences.
///
/// An empty admissible path set is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentOutcome {
    /// A path from `(0, 0)` to the terminal cell exists.
    Aligned(Alignment),
    /// No admissible path reaches the terminal cell.
    Infeasible(Infeasibility),
}

impl AlignmentOutcome {
    /// Return true if a path was found.
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        matches!(self, Self::Aligned(_))
    }

    /// Return the alignment, if any.
    #[must_use]
    pub fn alignment(&self) -> Option<&Alignment> {
        match self {
            Self::Aligned(a) => Some(a),
            Self::Infeasible(_) => None,
        }
    }

    /// Consume the outcome and return the alignment, if any.
    #[must_use]
    pub fn into_alignment(self) -> Option<Alignment> {
        match self {
            Self::Aligned(a) => Some(a),
            Self::Infeasible(_) => None,
        }
    }
}

/// Outcome for one pair of a batch alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseAlignment {
    /// Identifier of the reference sequence (matrix rows).
    pub reference: String,
    /// Identifier of the query sequence (matrix columns).
    pub query: String,
    /// The alignment outcome.
    pub outcome: AlignmentOutcome,
}
