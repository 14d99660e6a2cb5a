//! Alignment configuration.

use crate::constraint::{Band, ConstraintBuilder};
use crate::error::AlignError;
use crate::similarity::ScanSimilarity;

/// How vertical (insertion) and horizontal (deletion) transitions are scored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapModel {
    /// Gap transitions add the local match score of the cell they enter,
    /// scaled by the expansion or compression weight. A forbidden local score
    /// closes the cell to every transition.
    Weighted,

    /// Gap transitions apply fixed non-negative penalties in the objective's
    /// direction. A forbidden local score only closes the diagonal transition.
    Constant {
        /// Penalty for a vertical step (reference advances alone).
        insert: f64,
        /// Penalty for a horizontal step (query advances alone).
        delete: f64,
    },

    /// Gap transitions add the weighted similarity of the advancing scan
    /// against an all-zero placeholder vector.
    AgainstZero,
}

/// Immutable alignment configuration.
///
/// Construct via [`AlignConfig::new`], then chain `with_*` methods to override
/// defaults. Validation happens in [`AlignConfig::validate`], which
/// [`Aligner::new`](crate::Aligner::new) calls before any alignment runs.
///
/// # Defaults
///
/// | Parameter            | Default                |
/// |----------------------|------------------------|
/// | `band`               | [`Band::Disabled`]     |
/// | `neighborhood`       | 2                      |
/// | `row_overlap`        | 0                      |
/// | `col_overlap`        | 0                      |
/// | `gap_model`          | [`GapModel::Weighted`] |
/// | `diagonal_weight`    | 2.0                    |
/// | `expansion_weight`   | 1.0                    |
/// | `compression_weight` | 1.0                    |
///
/// With the default weights every path from `(0, 0)` to the terminal cell
/// carries the same total weight `rows + cols - 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignConfig {
    pub(crate) similarity: ScanSimilarity,
    pub(crate) constraint: ConstraintBuilder,
    pub(crate) gap_model: GapModel,
    pub(crate) diagonal_weight: f64,
    pub(crate) expansion_weight: f64,
    pub(crate) compression_weight: f64,
}

impl AlignConfig {
    /// Create a configuration scoring scans with `similarity`.
    #[must_use]
    pub fn new(similarity: ScanSimilarity) -> Self {
        Self {
            similarity,
            constraint: ConstraintBuilder::new(),
            gap_model: GapModel::Weighted,
            diagonal_weight: 2.0,
            expansion_weight: 1.0,
            compression_weight: 1.0,
        }
    }

    /// Set the diagonal band used when building regions from anchors.
    #[must_use]
    pub fn with_band(mut self, band: Band) -> Self {
        self.constraint = self.constraint.with_band(band);
        self
    }

    /// Set the anchor neighbourhood radius.
    #[must_use]
    pub fn with_neighborhood(mut self, neighborhood: usize) -> Self {
        self.constraint = self.constraint.with_neighborhood(neighborhood);
        self
    }

    /// Set the partition overlaps.
    #[must_use]
    pub fn with_overlap(mut self, row_overlap: usize, col_overlap: usize) -> Self {
        self.constraint = self.constraint.with_overlap(row_overlap, col_overlap);
        self
    }

    /// Replace the whole constraint builder.
    #[must_use]
    pub fn with_constraint(mut self, constraint: ConstraintBuilder) -> Self {
        self.constraint = constraint;
        self
    }

    /// Set the gap model.
    #[must_use]
    pub fn with_gap_model(mut self, gap_model: GapModel) -> Self {
        self.gap_model = gap_model;
        self
    }

    /// Set the weight applied to the local score of a diagonal (match) step.
    #[must_use]
    pub fn with_diagonal_weight(mut self, weight: f64) -> Self {
        self.diagonal_weight = weight;
        self
    }

    /// Set the weight of vertical steps, where one query scan spans several reference scans.
    #[must_use]
    pub fn with_expansion_weight(mut self, weight: f64) -> Self {
        self.expansion_weight = weight;
        self
    }

    /// Set the weight of horizontal steps, where several query scans collapse onto one reference scan.
    #[must_use]
    pub fn with_compression_weight(mut self, weight: f64) -> Self {
        self.compression_weight = weight;
        self
    }

    /// Return the scan similarity.
    #[must_use]
    pub fn similarity(&self) -> &ScanSimilarity {
        &self.similarity
    }

    /// Return the constraint builder.
    #[must_use]
    pub fn constraint(&self) -> &ConstraintBuilder {
        &self.constraint
    }

    /// Return the gap model.
    #[must_use]
    pub fn gap_model(&self) -> GapModel {
        self.gap_model
    }

    /// Return `(diagonal, expansion, compression)` weights.
    #[must_use]
    pub fn weights(&self) -> (f64, f64, f64) {
        (
            self.diagonal_weight,
            self.expansion_weight,
            self.compression_weight,
        )
    }

    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidBand`] | A banded fraction outside `(0, 1)` |
    /// | [`AlignError::InvalidWeight`] | A weight or gap penalty is negative or not finite |
    /// | [`AlignError::InvalidExponent`] | An Lp exponent below 1 |
    pub fn validate(&self) -> Result<(), AlignError> {
        self.similarity.validate()?;
        if let Band::Fraction(value) = self.constraint.band()
            && !(value > 0.0 && value < 1.0)
        {
            return Err(AlignError::InvalidBand { value });
        }
        check_weight("diagonal weight", self.diagonal_weight)?;
        check_weight("expansion weight", self.expansion_weight)?;
        check_weight("compression weight", self.compression_weight)?;
        if let GapModel::Constant { insert, delete } = self.gap_model {
            check_weight("insert penalty", insert)?;
            check_weight("delete penalty", delete)?;
        }
        Ok(())
    }
}

fn check_weight(name: &'static str, value: f64) -> Result<(), AlignError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AlignError::InvalidWeight { name, value });
    }
    Ok(())
}
