//! Accumulated-score matrix over a constraint region.

use std::ops::Range;

use crate::path::{AlignmentPath, Move, PathStep};
use crate::region::ConstraintRegion;
use crate::similarity::Objective;

// Per-cell arrival codes.
const UNREACHED: u8 = 0;
const ORIGIN: u8 = 1;
const DIAGONAL: u8 = 2;
const ABOVE: u8 = 3;
const LEFT: u8 = 4;

/// Accumulated scores and chosen predecessors for every admissible cell.
///
/// Each row stores only the columns between its first and last admissible
/// cell. Cell `(i, j)` maps to flat index `offsets[i] + (j - bounds[i].start)`.
/// Cells outside the region, or inside it but unreachable from `(0, 0)`,
/// report `None`.
#[derive(Debug, Clone)]
pub struct AlignmentMatrix {
    rows: usize,
    cols: usize,
    objective: Objective,
    bounds: Vec<Range<usize>>,
    offsets: Vec<usize>,
    scores: Vec<f64>,
    arrivals: Vec<u8>,
}

impl AlignmentMatrix {
    /// Allocate storage covering the row envelopes of `region`.
    pub(crate) fn allocate(region: &ConstraintRegion, objective: Objective) -> Self {
        let rows = region.rows();
        let mut bounds = Vec::with_capacity(rows);
        let mut offsets = Vec::with_capacity(rows);
        let mut total = 0;
        for row in 0..rows {
            let b = region.row_bounds(row).unwrap_or(0..0);
            offsets.push(total);
            total += b.end - b.start;
            bounds.push(b);
        }
        Self {
            rows,
            cols: region.cols(),
            objective,
            bounds,
            offsets,
            scores: vec![objective.unreachable(); total],
            arrivals: vec![UNREACHED; total],
        }
    }

    fn index(&self, i: usize, j: usize) -> Option<usize> {
        let b = self.bounds.get(i)?;
        b.contains(&j).then(|| self.offsets[i] + (j - b.start))
    }

    pub(crate) fn set_origin(&mut self, score: f64) {
        if let Some(idx) = self.index(0, 0) {
            self.scores[idx] = score;
            self.arrivals[idx] = ORIGIN;
        }
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, score: f64, mv: Move) {
        if let Some(idx) = self.index(i, j) {
            self.scores[idx] = score;
            self.arrivals[idx] = match mv {
                Move::Diagonal => DIAGONAL,
                Move::Insertion => ABOVE,
                Move::Deletion => LEFT,
            };
        }
    }

    /// Return the number of rows (reference scans).
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Return the number of columns (query scans).
    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Return the objective the scores were accumulated under.
    #[must_use]
    pub fn objective(&self) -> Objective {
        self.objective
    }

    /// Return the accumulated score of `(i, j)`, or `None` if the cell is
    /// inadmissible or unreachable.
    #[must_use]
    pub fn score(&self, i: usize, j: usize) -> Option<f64> {
        let idx = self.index(i, j)?;
        (self.arrivals[idx] != UNREACHED).then(|| self.scores[idx])
    }

    /// Return the move that entered `(i, j)` on its best partial path.
    ///
    /// `None` for `(0, 0)` and for cells without a score.
    #[must_use]
    pub fn arrival(&self, i: usize, j: usize) -> Option<Move> {
        let idx = self.index(i, j)?;
        match self.arrivals[idx] {
            DIAGONAL => Some(Move::Diagonal),
            ABOVE => Some(Move::Insertion),
            LEFT => Some(Move::Deletion),
            _ => None,
        }
    }

    /// Return the score of the terminal cell `(rows - 1, cols - 1)`.
    #[must_use]
    pub fn terminal_score(&self) -> Option<f64> {
        self.score(self.rows - 1, self.cols - 1)
    }

    /// Return the number of cells that received a score.
    #[must_use]
    pub fn reachable_cells(&self) -> usize {
        self.arrivals.iter().filter(|&&a| a != UNREACHED).count()
    }

    /// Reconstruct the optimal path by following predecessors back from the
    /// terminal cell.
    ///
    /// Returns `None` if the terminal cell is unreachable.
    #[must_use]
    pub fn traceback(&self) -> Option<AlignmentPath> {
        let (mut i, mut j) = (self.rows - 1, self.cols - 1);
        let mut steps = Vec::with_capacity(self.rows + self.cols - 1);
        loop {
            let idx = self.index(i, j)?;
            steps.push(PathStep {
                reference: i,
                query: j,
            });
            match self.arrivals[idx] {
                ORIGIN => break,
                DIAGONAL => {
                    i -= 1;
                    j -= 1;
                }
                ABOVE => i -= 1,
                LEFT => j -= 1,
                _ => return None,
            }
        }
        steps.reverse();
        Some(AlignmentPath::new(steps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionBuilder;

    fn gapped_region() -> ConstraintRegion {
        let mut b = RegionBuilder::new(3, 6).unwrap();
        b.add_span(0, 0..2).add_span(1, 1..2).add_span(1, 4..6).add_span(2, 5..6);
        b.build()
    }

    #[test]
    fn unset_cells_report_none() {
        let m = AlignmentMatrix::allocate(&gapped_region(), Objective::Maximize);
        assert_eq!(m.score(0, 0), None);
        assert_eq!(m.terminal_score(), None);
        assert_eq!(m.reachable_cells(), 0);
        assert!(m.traceback().is_none());
    }

    #[test]
    fn cells_outside_envelope_report_none() {
        let mut m = AlignmentMatrix::allocate(&gapped_region(), Objective::Minimize);
        m.set(0, 5, 1.0, Move::Deletion);
        assert_eq!(m.score(0, 5), None);
        assert_eq!(m.score(7, 0), None);
    }

    #[test]
    fn gap_inside_envelope_is_addressable() {
        let mut m = AlignmentMatrix::allocate(&gapped_region(), Objective::Maximize);
        assert_eq!(m.score(1, 3), None);
        m.set(1, 3, 2.5, Move::Insertion);
        assert_eq!(m.score(1, 3), Some(2.5));
        assert_eq!(m.arrival(1, 3), Some(Move::Insertion));
    }

    #[test]
    fn traceback_follows_arrivals() {
        let region = ConstraintRegion::full(3, 3).unwrap();
        let mut m = AlignmentMatrix::allocate(&region, Objective::Maximize);
        m.set_origin(0.0);
        m.set(1, 0, 1.0, Move::Insertion);
        m.set(2, 1, 2.0, Move::Diagonal);
        m.set(2, 2, 3.0, Move::Deletion);
        let path = m.traceback().unwrap();
        let cells: Vec<_> = path.steps().iter().map(|s| (s.reference, s.query)).collect();
        assert_eq!(cells, vec![(0, 0), (1, 0), (2, 1), (2, 2)]);
        assert_eq!(m.arrival(0, 0), None);
        assert_eq!(m.terminal_score(), Some(3.0));
        assert_eq!(m.reachable_cells(), 4);
    }

    #[test]
    fn traceback_through_unreached_cell_fails() {
        let region = ConstraintRegion::full(2, 2).unwrap();
        let mut m = AlignmentMatrix::allocate(&region, Objective::Maximize);
        m.set(1, 1, 1.0, Move::Diagonal);
        assert!(m.traceback().is_none());
    }
}
