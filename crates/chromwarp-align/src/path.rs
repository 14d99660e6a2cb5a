//! Alignment path types.

use crate::scan::ScanSequence;

/// Transition between two consecutive path cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    /// `(i-1, j-1) -> (i, j)`: reference scan `i` matched with query scan `j`.
    Diagonal,
    /// `(i-1, j) -> (i, j)`: the reference advances alone (expansion).
    Insertion,
    /// `(i, j-1) -> (i, j)`: the query advances alone (compression).
    Deletion,
}

/// A single path cell, mapping reference scan `reference` to query scan `query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// Scan index in the reference sequence.
    pub reference: usize,
    /// Scan index in the query sequence.
    pub query: usize,
}

/// Counts of each move kind along a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PathSummary {
    /// Diagonal moves.
    pub matches: usize,
    /// Vertical moves.
    pub insertions: usize,
    /// Horizontal moves.
    pub deletions: usize,
}

/// Ordered, monotone path from `(0, 0)` to `(rows - 1, cols - 1)`.
///
/// Consecutive steps differ by exactly one of `(1, 1)`, `(1, 0)` or `(0, 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentPath(Vec<PathStep>);

impl AlignmentPath {
    pub(crate) fn new(steps: Vec<PathStep>) -> Self {
        debug_assert!(!steps.is_empty());
        Self(steps)
    }

    /// Return the path steps as a slice.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Return the number of steps in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return true if the path contains no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the moves between consecutive steps.
    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.0.windows(2).map(|w| {
            match (
                w[1].reference - w[0].reference,
                w[1].query - w[0].query,
            ) {
                (1, 1) => Move::Diagonal,
                (1, 0) => Move::Insertion,
                _ => Move::Deletion,
            }
        })
    }

    /// Count diagonal, vertical and horizontal moves.
    #[must_use]
    pub fn summary(&self) -> PathSummary {
        let mut summary = PathSummary::default();
        for mv in self.moves() {
            match mv {
                Move::Diagonal => summary.matches += 1,
                Move::Insertion => summary.insertions += 1,
                Move::Deletion => summary.deletions += 1,
            }
        }
        summary
    }

    /// Map each path step to its `(reference, query)` retention-time pair.
    ///
    /// Steps outside either sequence are skipped, so passing sequences other
    /// than the aligned pair yields a truncated list rather than a panic.
    #[must_use]
    pub fn warp_retention_times(
        &self,
        reference: &ScanSequence,
        query: &ScanSequence,
    ) -> Vec<(f64, f64)> {
        self.0
            .iter()
            .filter_map(|s| {
                let r = reference.scan(s.reference)?;
                let q = query.scan(s.query)?;
                Some((r.retention_time(), q.retention_time()))
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a AlignmentPath {
    type Item = &'a PathStep;
    type IntoIter = std::slice::Iter<'a, PathStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
