//! Error types for scan validation, constraint construction and alignment.

/// Errors from input validation and configuration checks.
///
/// Infeasibility (no admissible path to the terminal cell) is not an error;
/// it is reported through [`AlignmentOutcome::Infeasible`](crate::AlignmentOutcome).
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    /// Returned when a scan sequence contains no scans.
    #[error("scan sequence must be non-empty")]
    EmptySequence,

    /// Returned when a feature vector has no channels.
    #[error("feature vector must have at least one channel")]
    EmptyFeatureVector,

    /// Returned when a feature vector holds NaN or an infinite intensity.
    #[error("feature vector contains non-finite value at channel {channel}")]
    NonFiniteValue {
        /// Position of the first non-finite channel.
        channel: usize,
    },

    /// Returned when a retention time is NaN or infinite.
    #[error("non-finite retention time {value}")]
    NonFiniteRetentionTime {
        /// The offending retention time.
        value: f64,
    },

    /// Returned when two vectors or sequences disagree on the channel count.
    #[error("channel count mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Channel count of the first vector or sequence.
        expected: usize,
        /// Channel count of the offending vector or sequence.
        got: usize,
    },

    /// Returned when an anchor pair set is empty.
    #[error("anchor pair set must contain at least the (0, 0) anchor")]
    EmptyAnchorSet,

    /// Returned when the first anchor is not `(0, 0)`.
    #[error("first anchor must be (0, 0), got ({reference}, {query})")]
    FirstAnchorNotOrigin {
        /// Reference index of the first anchor.
        reference: usize,
        /// Query index of the first anchor.
        query: usize,
    },

    /// Returned when an anchor decreases in either coordinate.
    #[error("anchors must be weakly increasing: anchor {index} ({reference}, {query}) follows ({prev_reference}, {prev_query})")]
    NonMonotonicAnchors {
        /// Position of the offending anchor in the set.
        index: usize,
        /// Reference index of the offending anchor.
        reference: usize,
        /// Query index of the offending anchor.
        query: usize,
        /// Reference index of the preceding anchor.
        prev_reference: usize,
        /// Query index of the preceding anchor.
        prev_query: usize,
    },

    /// Returned when an anchor lies outside the `rows x cols` grid.
    #[error("anchor ({reference}, {query}) outside {rows}x{cols} grid")]
    AnchorOutOfBounds {
        /// Reference index of the anchor.
        reference: usize,
        /// Query index of the anchor.
        query: usize,
        /// Number of reference scans.
        rows: usize,
        /// Number of query scans.
        cols: usize,
    },

    /// Returned when the grid has zero rows or zero columns.
    #[error("alignment grid must be non-empty, got {rows}x{cols}")]
    EmptyGrid {
        /// Number of reference scans.
        rows: usize,
        /// Number of query scans.
        cols: usize,
    },

    /// Returned when a constraint region does not match the sequences being aligned.
    #[error("constraint region is {region_rows}x{region_cols}, sequences are {rows}x{cols}")]
    RegionShapeMismatch {
        /// Rows covered by the region.
        region_rows: usize,
        /// Columns covered by the region.
        region_cols: usize,
        /// Number of reference scans.
        rows: usize,
        /// Number of query scans.
        cols: usize,
    },

    /// Returned when the raw band value is negative (other than the `-1` sentinel) or not finite.
    #[error("invalid band {value}: expected a fraction in (0, 1), 0, >= 1 or -1 to disable")]
    InvalidBand {
        /// The rejected band value.
        value: f64,
    },

    /// Returned when a weight or penalty is negative or not finite.
    #[error("invalid {name} {value}: must be finite and non-negative")]
    InvalidWeight {
        /// Name of the configuration parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when the Gaussian time tolerance is not a positive finite number.
    #[error("invalid time tolerance {value}: must be finite and positive")]
    InvalidTolerance {
        /// The rejected tolerance.
        value: f64,
    },

    /// Returned when the Gaussian weight threshold lies outside `[0, 1]`.
    #[error("invalid time threshold {value}: must lie in [0, 1]")]
    InvalidThreshold {
        /// The rejected threshold.
        value: f64,
    },

    /// Returned when the Lp exponent is below 1 or not finite.
    #[error("invalid Lp exponent {p}: must be finite and >= 1")]
    InvalidExponent {
        /// The rejected exponent.
        p: f64,
    },

    /// Returned by a [`SequenceProvider`](crate::SequenceProvider) that has no sequence for an id.
    #[error("unknown sequence id \"{id}\"")]
    UnknownSequence {
        /// The requested identifier.
        id: String,
    },

    /// Wraps a failure reported by an external provider or supplier.
    #[error("provider failure for \"{id}\": {message}")]
    Provider {
        /// Identifier being fetched.
        id: String,
        /// Description of the failure.
        message: String,
    },
}
