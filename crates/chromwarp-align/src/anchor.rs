//! Anchor correspondences between reference and query scans.

use crate::error::AlignError;

/// A trusted correspondence between a reference scan index and a query scan index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnchorPair {
    /// Scan index in the reference sequence (matrix row).
    pub reference: usize,
    /// Scan index in the query sequence (matrix column).
    pub query: usize,
}

impl AnchorPair {
    /// Create a new anchor pair.
    #[must_use]
    pub const fn new(reference: usize, query: usize) -> Self {
        Self { reference, query }
    }

    /// The `(0, 0)` anchor every set starts with.
    pub const ORIGIN: Self = Self::new(0, 0);
}

impl From<(usize, usize)> for AnchorPair {
    fn from((reference, query): (usize, usize)) -> Self {
        Self::new(reference, query)
    }
}

/// Ordered, validated set of anchors.
///
/// The first anchor is always `(0, 0)` and indices are weakly increasing in
/// both coordinates. The terminal anchor `(rows - 1, cols - 1)` may be present
/// or is appended implicitly by the constraint builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorPairSet(Vec<AnchorPair>);

impl AnchorPairSet {
    /// Validate an explicit anchor list.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::EmptyAnchorSet`] | `pairs` is empty |
    /// | [`AlignError::FirstAnchorNotOrigin`] | `pairs[0]` is not `(0, 0)` |
    /// | [`AlignError::NonMonotonicAnchors`] | An anchor decreases in either coordinate |
    pub fn new(pairs: Vec<AnchorPair>) -> Result<Self, AlignError> {
        let Some(first) = pairs.first() else {
            return Err(AlignError::EmptyAnchorSet);
        };
        if *first != AnchorPair::ORIGIN {
            return Err(AlignError::FirstAnchorNotOrigin {
                reference: first.reference,
                query: first.query,
            });
        }
        for (index, w) in pairs.windows(2).enumerate() {
            let (prev, cur) = (w[0], w[1]);
            if cur.reference < prev.reference || cur.query < prev.query {
                return Err(AlignError::NonMonotonicAnchors {
                    index: index + 1,
                    reference: cur.reference,
                    query: cur.query,
                    prev_reference: prev.reference,
                    prev_query: prev.query,
                });
            }
        }
        Ok(Self(pairs))
    }

    /// Build a set from interior anchors, adding `(0, 0)` and `(rows - 1, cols - 1)`
    /// unless they are already the first and last entries.
    ///
    /// # Errors
    ///
    /// [`AlignError::EmptyGrid`] for a zero-sized grid,
    /// [`AlignError::AnchorOutOfBounds`] for anchors outside it, and any
    /// [`AnchorPairSet::new`] error.
    pub fn with_endpoints(
        interior: &[AnchorPair],
        rows: usize,
        cols: usize,
    ) -> Result<Self, AlignError> {
        if rows == 0 || cols == 0 {
            return Err(AlignError::EmptyGrid { rows, cols });
        }
        let terminal = AnchorPair::new(rows - 1, cols - 1);
        let mut pairs = Vec::with_capacity(interior.len() + 2);
        if interior.first() != Some(&AnchorPair::ORIGIN) {
            pairs.push(AnchorPair::ORIGIN);
        }
        pairs.extend_from_slice(interior);
        if pairs.last() != Some(&terminal) {
            pairs.push(terminal);
        }
        let set = Self::new(pairs)?;
        set.check_bounds(rows, cols)?;
        Ok(set)
    }

    /// The endpoint-only set for a `rows x cols` grid.
    ///
    /// # Errors
    ///
    /// [`AlignError::EmptyGrid`] when `rows` or `cols` is zero.
    pub fn endpoints(rows: usize, cols: usize) -> Result<Self, AlignError> {
        Self::with_endpoints(&[], rows, cols)
    }

    /// Check that every anchor lies inside a `rows x cols` grid.
    ///
    /// # Errors
    ///
    /// [`AlignError::AnchorOutOfBounds`] for the first anchor outside the grid.
    pub fn check_bounds(&self, rows: usize, cols: usize) -> Result<(), AlignError> {
        match self.0.iter().find(|a| a.reference >= rows || a.query >= cols) {
            Some(a) => Err(AlignError::AnchorOutOfBounds {
                reference: a.reference,
                query: a.query,
                rows,
                cols,
            }),
            None => Ok(()),
        }
    }

    /// Return the anchors in order.
    #[must_use]
    pub fn pairs(&self) -> &[AnchorPair] {
        &self.0
    }

    /// Return the number of anchors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a validated set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a AnchorPairSet {
    type Item = &'a AnchorPair;
    type IntoIter = std::slice::Iter<'a, AnchorPair>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
