//! Anchor-constrained pairwise alignment of GC-MS scan sequences.
//!
//! Pure math library, zero I/O. Builds a feasible region of the alignment
//! grid from anchor correspondences and an optional diagonal band, fills a
//! dynamic-programming matrix over that region with a pluggable scan
//! similarity, and extracts the optimal monotone path.

mod aligner;
mod anchor;
mod config;
mod constraint;
mod error;
mod matrix;
mod path;
mod preprocess;
mod provider;
mod region;
mod result;
mod scan;
mod similarity;

pub use aligner::Aligner;
pub use anchor::{AnchorPair, AnchorPairSet};
pub use config::{AlignConfig, GapModel};
pub use constraint::{Band, ConstraintBuilder};
pub use error::AlignError;
pub use matrix::AlignmentMatrix;
pub use path::{AlignmentPath, Move, PathStep, PathSummary};
pub use preprocess::{ScanNormalization, normalize_scans};
pub use provider::{AnchorSupplier, EndpointAnchors, SequenceProvider};
pub use region::{ConstraintRegion, RegionBuilder};
pub use result::{Alignment, AlignmentOutcome, Infeasibility, PairwiseAlignment};
pub use scan::{FeatureVector, ScanSequence};
pub use similarity::{
    ArraySimilarity, FORBIDDEN, GaussianTimeWeight, Objective, ScanSimilarity, sanitize,
};
