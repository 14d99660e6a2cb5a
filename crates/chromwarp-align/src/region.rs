//! Feasible region of the alignment grid, stored as per-row column intervals.

use std::ops::Range;

use crate::anchor::AnchorPair;
use crate::error::AlignError;

/// Set of admissible cells over the `rows x cols` alignment grid.
///
/// Each row holds a sorted list of disjoint, non-adjacent column ranges.
/// Immutable once built; the engine only asks whether a cell is admissible
/// and which columns a row spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRegion {
    rows: usize,
    cols: usize,
    spans: Vec<Vec<Range<usize>>>,
}

impl ConstraintRegion {
    /// Every cell of the grid.
    ///
    /// # Errors
    ///
    /// [`AlignError::EmptyGrid`] when `rows` or `cols` is zero.
    pub fn full(rows: usize, cols: usize) -> Result<Self, AlignError> {
        let mut builder = RegionBuilder::new(rows, cols)?;
        builder.add_rect(0..rows, 0..cols);
        Ok(builder.build())
    }

    /// Sakoe-Chiba corridor: cell `(i, j)` is admissible only if `|i - j| <= radius`.
    ///
    /// Unlike anchor-derived regions this does not follow the grid's aspect
    /// ratio, so for unequal lengths it can exclude the terminal cell.
    ///
    /// # Errors
    ///
    /// [`AlignError::EmptyGrid`] when `rows` or `cols` is zero.
    pub fn sakoe_chiba(rows: usize, cols: usize, radius: usize) -> Result<Self, AlignError> {
        let mut builder = RegionBuilder::new(rows, cols)?;
        for row in 0..rows {
            let start = row.saturating_sub(radius);
            let end = row.saturating_add(radius).saturating_add(1).min(cols);
            builder.add_span(row, start..end);
        }
        Ok(builder.build())
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

    /// Return true if cell `(row, col)` is admissible.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        let Some(spans) = self.spans.get(row) else {
            return false;
        };
        let idx = spans.partition_point(|s| s.end <= col);
        spans.get(idx).is_some_and(|s| s.start <= col)
    }

    /// Return the admissible column ranges of `row`, sorted and disjoint.
    ///
    /// # Panics
    ///
    /// Panics if `row >= rows`.
    #[must_use]
    pub fn row_spans(&self, row: usize) -> &[Range<usize>] {
        &self.spans[row]
    }

    /// Return the smallest column range covering every admissible cell of `row`,
    /// or `None` if the row has no admissible cells.
    #[must_use]
    pub fn row_bounds(&self, row: usize) -> Option<Range<usize>> {
        let spans = self.spans.get(row)?;
        let first = spans.first()?;
        let last = spans.last()?;
        Some(first.start..last.end)
    }

    /// Return the number of admissible cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.spans
            .iter()
            .flat_map(|row| row.iter().map(|s| s.end - s.start))
            .sum()
    }

    /// Iterate over all admissible cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.spans.iter().enumerate().flat_map(|(row, spans)| {
            spans.iter().flat_map(move |s| s.clone().map(move |col| (row, col)))
        })
    }
}

/// Accumulates a union of spans, rectangles and squares into a [`ConstraintRegion`].
///
/// Everything added is clipped to the grid.
#[derive(Debug, Clone)]
pub struct RegionBuilder {
    rows: usize,
    cols: usize,
    spans: Vec<Vec<Range<usize>>>,
}

impl RegionBuilder {
    /// Start an empty region over a `rows x cols` grid.
    ///
    /// # Errors
    ///
    /// [`AlignError::EmptyGrid`] when `rows` or `cols` is zero.
    pub fn new(rows: usize, cols: usize) -> Result<Self, AlignError> {
        if rows == 0 || cols == 0 {
            return Err(AlignError::EmptyGrid { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            spans: vec![Vec::new(); rows],
        })
    }

    /// Add the columns `cols` of a single row.
    pub fn add_span(&mut self, row: usize, cols: Range<usize>) -> &mut Self {
        if row < self.rows {
            let end = cols.end.min(self.cols);
            if cols.start < end {
                self.spans[row].push(cols.start..end);
            }
        }
        self
    }

    /// Add the rectangle `rows x cols`.
    pub fn add_rect(&mut self, rows: Range<usize>, cols: Range<usize>) -> &mut Self {
        for row in rows.start..rows.end.min(self.rows) {
            self.add_span(row, cols.clone());
        }
        self
    }

    /// Add the square of side `2 * radius + 1` centred on `center`.
    pub fn add_square(&mut self, center: AnchorPair, radius: usize) -> &mut Self {
        let reach = radius.saturating_add(1);
        let rows = center.reference.saturating_sub(radius)..center.reference.saturating_add(reach);
        let cols = center.query.saturating_sub(radius)..center.query.saturating_add(reach);
        self.add_rect(rows, cols)
    }

    /// Sort and merge the accumulated spans.
    #[must_use]
    pub fn build(self) -> ConstraintRegion {
        let spans = self.spans.into_iter().map(merge_spans).collect();
        ConstraintRegion {
            rows: self.rows,
            cols: self.cols,
            spans,
        }
    }
}

/// Merge overlapping or touching ranges into a sorted disjoint list.
fn merge_spans(mut spans: Vec<Range<usize>>) -> Vec<Range<usize>> {
    spans.sort_unstable_by_key(|s| (s.start, s.end));
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}
