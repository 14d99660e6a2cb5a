//! Sources of scan sequences and anchors for batch alignment.

use std::collections::HashMap;

use crate::anchor::AnchorPair;
use crate::error::AlignError;
use crate::scan::ScanSequence;

/// Supplies scan sequences by identifier.
pub trait SequenceProvider {
    /// Load the sequence named `id`.
    ///
    /// # Errors
    ///
    /// [`AlignError::UnknownSequence`] when no sequence has that id, or
    /// [`AlignError::Provider`] when the backing store fails.
    fn sequence(&self, id: &str) -> Result<ScanSequence, AlignError>;
}

impl SequenceProvider for HashMap<String, ScanSequence> {
    fn sequence(&self, id: &str) -> Result<ScanSequence, AlignError> {
        self.get(id).cloned().ok_or_else(|| AlignError::UnknownSequence {
            id: id.to_string(),
        })
    }
}

/// Supplies interior anchors for a reference/query pair.
///
/// `(0, 0)` and the terminal cell are added by the aligner, so implementors
/// return only the anchors in between.
pub trait AnchorSupplier {
    /// Interior anchors for aligning `query` against `reference`.
    ///
    /// # Errors
    ///
    /// [`AlignError::Provider`] when the anchors cannot be produced.
    fn anchors(&self, reference: &str, query: &str) -> Result<Vec<AnchorPair>, AlignError>;
}

/// Anchor supplier that never adds interior anchors.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndpointAnchors;

impl AnchorSupplier for EndpointAnchors {
    fn anchors(&self, _reference: &str, _query: &str) -> Result<Vec<AnchorPair>, AlignError> {
        Ok(Vec::new())
    }
}

impl AnchorSupplier for HashMap<(String, String), Vec<AnchorPair>> {
    fn anchors(&self, reference: &str, query: &str) -> Result<Vec<AnchorPair>, AlignError> {
        Ok(self
            .get(&(reference.to_string(), query.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
