//! Anchor-driven construction of the feasible alignment region.

use std::ops::Range;

use tracing::{debug, instrument};

use crate::anchor::{AnchorPair, AnchorPairSet};
use crate::error::AlignError;
use crate::region::{ConstraintRegion, RegionBuilder};

/// Relative width of the diagonal corridor around each anchor-to-anchor segment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Band {
    /// No corridor; every partition rectangle is admissible in full.
    #[default]
    Disabled,

    /// Corridor whose half-width is this fraction of the partition's longer side.
    /// Always inside the open interval `(0, 1)`.
    Fraction(f64),
}

impl Band {
    /// Sentinel raw value that disables banding.
    pub const DISABLED_SENTINEL: f64 = -1.0;

    /// Interpret a raw band value.
    ///
    /// | Raw value | Result |
    /// |---|---|
    /// | in `(0, 1)` | [`Band::Fraction`] |
    /// | `0`, `>= 1`, or `-1` | [`Band::Disabled`] |
    ///
    /// # Errors
    ///
    /// [`AlignError::InvalidBand`] for NaN, infinities and negative values other than `-1`.
    pub fn from_fraction(value: f64) -> Result<Self, AlignError> {
        if !value.is_finite() || (value < 0.0 && value != Self::DISABLED_SENTINEL) {
            return Err(AlignError::InvalidBand { value });
        }
        if value > 0.0 && value < 1.0 {
            Ok(Self::Fraction(value))
        } else {
            Ok(Self::Disabled)
        }
    }

    /// Return the fraction, or `None` when disabled.
    #[must_use]
    pub fn fraction(&self) -> Option<f64> {
        match self {
            Self::Disabled => None,
            Self::Fraction(f) => Some(*f),
        }
    }
}

/// Stateless builder turning anchors into a [`ConstraintRegion`].
///
/// The region is the union of one partition per pair of consecutive anchors
/// (optionally clipped to a diagonal band) plus a square neighbourhood around
/// every interior anchor.
///
/// # Defaults
///
/// | Parameter | Default |
/// |---|---|
/// | `band` | [`Band::Disabled`] |
/// | `neighborhood` | 2 |
/// | `row_overlap` | 0 |
/// | `col_overlap` | 0 |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintBuilder {
    band: Band,
    neighborhood: usize,
    row_overlap: usize,
    col_overlap: usize,
}

impl Default for ConstraintBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstraintBuilder {
    /// Create a builder with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            band: Band::Disabled,
            neighborhood: 2,
            row_overlap: 0,
            col_overlap: 0,
        }
    }

    /// Set the diagonal band.
    #[must_use]
    pub fn with_band(mut self, band: Band) -> Self {
        self.band = band;
        self
    }

    /// Set the radius of the square forced open around each interior anchor.
    #[must_use]
    pub fn with_neighborhood(mut self, neighborhood: usize) -> Self {
        self.neighborhood = neighborhood;
        self
    }

    /// Set how far each partition extends past its closing anchor.
    #[must_use]
    pub fn with_overlap(mut self, row_overlap: usize, col_overlap: usize) -> Self {
        self.row_overlap = row_overlap;
        self.col_overlap = col_overlap;
        self
    }

    /// Return the band setting.
    #[must_use]
    pub fn band(&self) -> Band {
        self.band
    }

    /// Return the anchor neighbourhood radius.
    #[must_use]
    pub fn neighborhood(&self) -> usize {
        self.neighborhood
    }

    /// Return `(row_overlap, col_overlap)`.
    #[must_use]
    pub fn overlap(&self) -> (usize, usize) {
        (self.row_overlap, self.col_overlap)
    }

    /// Build the feasible region for a `rows x cols` grid.
    ///
    /// The terminal anchor `(rows - 1, cols - 1)` is appended when `anchors`
    /// does not already end with it. The result always contains `(0, 0)` and
    /// the terminal cell.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::EmptyGrid`] | `rows` or `cols` is zero |
    /// | [`AlignError::AnchorOutOfBounds`] | An anchor lies outside the grid |
    #[instrument(skip(self, anchors), fields(n_anchors = anchors.len()))]
    pub fn build(
        &self,
        rows: usize,
        cols: usize,
        anchors: &AnchorPairSet,
    ) -> Result<ConstraintRegion, AlignError> {
        let mut builder = RegionBuilder::new(rows, cols)?;
        anchors.check_bounds(rows, cols)?;

        let terminal = AnchorPair::new(rows - 1, cols - 1);
        let mut points = anchors.pairs().to_vec();
        if points.last() != Some(&terminal) {
            points.push(terminal);
        }

        if points.len() == 1 {
            builder.add_span(0, 0..1);
        }
        for w in points.windows(2) {
            self.add_partition(&mut builder, w[0], w[1], terminal);
        }
        if points.len() > 2 {
            for anchor in &points[1..points.len() - 1] {
                builder.add_square(*anchor, self.neighborhood);
            }
        }

        let region = builder.build();
        debug!(
            rows,
            cols,
            partitions = points.len() - 1,
            cells = region.cell_count(),
            "constraint region built"
        );
        Ok(region)
    }

    /// Add the partition from anchor `from` to anchor `to`, widened by the
    /// overlaps and clipped to the band when one is set.
    fn add_partition(
        &self,
        builder: &mut RegionBuilder,
        from: AnchorPair,
        to: AnchorPair,
        terminal: AnchorPair,
    ) {
        let row_end = to.reference.saturating_add(self.row_overlap).min(terminal.reference);
        let col_end = to.query.saturating_add(self.col_overlap).min(terminal.query);

        let Some(fraction) = self.band.fraction() else {
            builder.add_rect(from.reference..row_end + 1, from.query..col_end + 1);
            return;
        };

        let height = row_end - from.reference;
        let width = col_end - from.query;
        let deviation = ((height.max(width) as f64) * fraction).ceil().max(1.0) as usize;
        let segment = Segment {
            rows: to.reference - from.reference,
            cols: to.query - from.query,
            deviation,
            width,
        };

        for t in 0..=height {
            if let Some(span) = segment.row_span(t) {
                builder.add_span(
                    from.reference + t,
                    from.query + span.start..from.query + span.end,
                );
            }
        }
    }
}

/// One anchor-to-anchor segment in partition-local coordinates.
///
/// The segment runs from `(0, 0)` to `(rows, cols)`. A cell `(t, u)` lies in the
/// band when it is within `deviation` of the segment horizontally or
/// vertically, which keeps the band connected for steep and shallow segments.
#[derive(Debug, Clone, Copy)]
struct Segment {
    rows: usize,
    cols: usize,
    deviation: usize,
    width: usize,
}

impl Segment {
    /// Local column range of row offset `t`, clipped to `0..=width`.
    fn row_span(&self, t: usize) -> Option<Range<usize>> {
        let t = t as i64;
        let d = self.deviation as i64;
        let h = self.rows as i64;
        let w = self.cols as i64;

        let (lo, hi) = if h == 0 {
            // Flat segment: every column is within `d` rows of it.
            if t > d {
                return None;
            }
            (0, self.width as i64)
        } else if w == 0 {
            (-d, d)
        } else {
            let h_lo = ceil_div(t * w - d * h, h);
            let h_hi = floor_div(t * w + d * h, h);
            let v_lo = ceil_div((t - d) * w, h);
            let v_hi = floor_div((t + d) * w, h);
            (h_lo.min(v_lo), h_hi.max(v_hi))
        };

        let lo = lo.max(0);
        let hi = hi.min(self.width as i64);
        (lo <= hi).then(|| lo as usize..hi as usize + 1)
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    a.div_euclid(b)
}

fn ceil_div(a: i64, b: i64) -> i64 {
    -(-a).div_euclid(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchors(raw: &[(usize, usize)], rows: usize, cols: usize) -> AnchorPairSet {
        let interior: Vec<AnchorPair> = raw.iter().copied().map(AnchorPair::from).collect();
        AnchorPairSet::with_endpoints(&interior, rows, cols).unwrap()
    }

    #[test]
    fn band_from_fraction_mapping() {
        assert_eq!(Band::from_fraction(0.25).unwrap(), Band::Fraction(0.25));
        assert_eq!(Band::from_fraction(0.0).unwrap(), Band::Disabled);
        assert_eq!(Band::from_fraction(1.0).unwrap(), Band::Disabled);
        assert_eq!(Band::from_fraction(3.5).unwrap(), Band::Disabled);
        assert_eq!(Band::from_fraction(-1.0).unwrap(), Band::Disabled);
    }

    #[test]
    fn band_from_fraction_rejects_invalid() {
        assert!(matches!(
            Band::from_fraction(-0.3),
            Err(AlignError::InvalidBand { .. })
        ));
        assert!(Band::from_fraction(f64::NAN).is_err());
        assert!(Band::from_fraction(f64::INFINITY).is_err());
    }

    #[test]
    fn disabled_band_single_partition_is_full_grid() {
        let region = ConstraintBuilder::new()
            .build(7, 5, &anchors(&[], 7, 5))
            .unwrap();
        assert_eq!(region, ConstraintRegion::full(7, 5).unwrap());
    }

    #[test]
    fn region_contains_endpoints() {
        let cases = [
            (10, 10, vec![]),
            (30, 12, vec![(5, 2), (20, 9)]),
            (12, 30, vec![(2, 5), (9, 20)]),
            (2, 50, vec![]),
            (50, 2, vec![(25, 1)]),
        ];
        for band in [0.05, 0.2, 0.5] {
            for (rows, cols, interior) in &cases {
                let region = ConstraintBuilder::new()
                    .with_band(Band::Fraction(band))
                    .with_neighborhood(0)
                    .build(*rows, *cols, &anchors(interior, *rows, *cols))
                    .unwrap();
                assert!(region.contains(0, 0), "{rows}x{cols} band {band}");
                assert!(region.contains(rows - 1, cols - 1), "{rows}x{cols} band {band}");
                for anchor in interior {
                    assert!(region.contains(anchor.0, anchor.1));
                }
            }
        }
    }

    #[test]
    fn band_is_narrower_than_full_grid() {
        let region = ConstraintBuilder::new()
            .with_band(Band::Fraction(0.1))
            .build(100, 100, &anchors(&[], 100, 100))
            .unwrap();
        // deviation = ceil(99 * 0.1) = 10 on a square diagonal
        assert_eq!(region.row_spans(50), &[40..61]);
        assert_eq!(region.row_spans(0), &[0..11]);
        assert!(region.cell_count() < 100 * 100 / 3);
    }

    #[test]
    fn band_has_a_monotone_path_for_shallow_segments() {
        // 3 rows by 60 columns: the horizontal strip alone would leave gaps.
        let region = ConstraintBuilder::new()
            .with_band(Band::Fraction(0.01))
            .build(3, 60, &anchors(&[], 3, 60))
            .unwrap();
        for row in 0..2 {
            let this = region.row_bounds(row).unwrap();
            let next = region.row_bounds(row + 1).unwrap();
            assert!(next.start <= this.end, "row {row} {this:?} -> {next:?}");
        }
        assert!(region.contains(2, 59));
    }

    #[test]
    fn neighborhood_opens_cells_outside_band() {
        let set = anchors(&[(5, 5)], 20, 20);
        let narrow = ConstraintBuilder::new()
            .with_band(Band::Fraction(0.1))
            .with_neighborhood(0);
        let widened = narrow.with_neighborhood(2);

        let without = narrow.build(20, 20, &set).unwrap();
        let with = widened.build(20, 20, &set).unwrap();
        assert!(!without.contains(3, 7));
        assert!(with.contains(3, 7));
        assert!(with.contains(7, 3));
        assert!(with.cell_count() > without.cell_count());
    }

    #[test]
    fn neighborhood_not_applied_to_endpoints() {
        let set = anchors(&[], 20, 20);
        let region = ConstraintBuilder::new()
            .with_band(Band::Fraction(0.05))
            .with_neighborhood(5)
            .build(20, 20, &set)
            .unwrap();
        // deviation = max(1, ceil(19 * 0.05)) = 1
        assert!(!region.contains(0, 4));
        assert!(!region.contains(19, 15));
    }

    #[test]
    fn anchors_split_partitions() {
        // Without banding the region is two rectangles meeting at the anchor.
        let region = ConstraintBuilder::new()
            .with_neighborhood(0)
            .build(10, 10, &anchors(&[(2, 7)], 10, 10))
            .unwrap();
        assert_eq!(region.row_spans(0), &[0..8]);
        assert_eq!(region.row_spans(2), &[0..10]);
        assert_eq!(region.row_spans(3), &[7..10]);
        assert!(!region.contains(5, 3));
    }

    #[test]
    fn overlap_extends_partitions() {
        let set = anchors(&[(2, 7)], 10, 10);
        let region = ConstraintBuilder::new()
            .with_neighborhood(0)
            .with_overlap(1, 1)
            .build(10, 10, &set)
            .unwrap();
        assert_eq!(region.row_spans(3), &[0..10]);
        assert!(region.contains(3, 0));
        assert!(!region.contains(4, 0));
    }

    #[test]
    fn oversized_neighborhood_and_overlap_clip_to_grid() {
        let set = anchors(&[(4, 3)], 10, 8);
        for builder in [
            ConstraintBuilder::new().with_neighborhood(usize::MAX),
            ConstraintBuilder::new().with_neighborhood(0).with_overlap(usize::MAX, 0),
            ConstraintBuilder::new()
                .with_band(Band::Fraction(0.2))
                .with_overlap(0, usize::MAX),
        ] {
            let region = builder.build(10, 8, &set).unwrap();
            assert!(region.contains(0, 0));
            assert!(region.contains(9, 7));
            assert!(region.contains(4, 3));
        }
        let widest = ConstraintBuilder::new()
            .with_neighborhood(usize::MAX)
            .build(10, 8, &set)
            .unwrap();
        assert_eq!(widest.cell_count(), 80);
    }

    #[test]
    fn banded_overlap_extends_past_anchor() {
        // The steep first segment is extrapolated three rows past (5, 2); the
        // second segment bends away, so (7, 2) is only reached through the overlap.
        let set = anchors(&[(5, 2)], 11, 11);
        let plain = ConstraintBuilder::new()
            .with_band(Band::Fraction(0.1))
            .with_neighborhood(0);
        let overlapped = plain.with_overlap(3, 0);

        let without = plain.build(11, 11, &set).unwrap();
        let with = overlapped.build(11, 11, &set).unwrap();
        assert!(!without.contains(7, 2));
        assert!(with.contains(7, 2));
        assert!(!with.contains(8, 2));
        assert!(with.contains(0, 0) && with.contains(10, 10));
        for (row, col) in without.cells() {
            assert!(with.contains(row, col));
        }
    }

    #[test]
    fn flat_segment_keeps_full_row() {
        let set = AnchorPairSet::new(vec![
            AnchorPair::new(0, 0),
            AnchorPair::new(0, 9),
            AnchorPair::new(4, 9),
        ])
        .unwrap();
        let region = ConstraintBuilder::new()
            .with_band(Band::Fraction(0.1))
            .with_neighborhood(0)
            .build(5, 10, &set)
            .unwrap();
        assert_eq!(region.row_spans(0), &[0..10]);
        assert!(region.contains(4, 9));
        for row in 1..5 {
            assert!(region.contains(row, 9));
        }
    }

    #[test]
    fn single_cell_grid() {
        let region = ConstraintBuilder::new()
            .with_band(Band::Fraction(0.5))
            .build(1, 1, &anchors(&[], 1, 1))
            .unwrap();
        assert_eq!(region.cell_count(), 1);
        assert!(region.contains(0, 0));
    }

    #[test]
    fn out_of_bounds_anchor_rejected() {
        let set = AnchorPairSet::new(vec![AnchorPair::new(0, 0), AnchorPair::new(3, 12)]).unwrap();
        let result = ConstraintBuilder::new().build(10, 10, &set);
        assert!(matches!(result, Err(AlignError::AnchorOutOfBounds { .. })));
    }

    #[test]
    fn segment_row_span_matches_diagonal() {
        let seg = Segment {
            rows: 10,
            cols: 20,
            deviation: 1,
            width: 20,
        };
        // centre of row 5 is column 10; vertical strip reaches (5 +- 1) * 2
        assert_eq!(seg.row_span(5), Some(8..13));
        assert_eq!(seg.row_span(0), Some(0..3));
        assert_eq!(seg.row_span(10), Some(18..21));
    }
}
