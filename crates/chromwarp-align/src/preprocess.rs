//! Scan preprocessing: per-scan intensity normalization.

use crate::scan::{FeatureVector, ScanSequence};

/// Per-scan rescaling applied before alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanNormalization {
    /// Divide each scan by its Euclidean norm.
    UnitNorm,
    /// Divide each scan by the sum of its absolute intensities.
    TotalIntensity,
}

/// Rescale every scan of `sequence`.
///
/// All-zero scans are left unchanged. Retention times and channel names are
/// carried over.
#[must_use = "returns a new normalized sequence; the original is unchanged"]
pub fn normalize_scans(sequence: &ScanSequence, method: ScanNormalization) -> ScanSequence {
    let scans = sequence
        .scans()
        .iter()
        .map(|scan| {
            let values = scan.values();
            let scale = match method {
                ScanNormalization::UnitNorm => values.iter().map(|v| v * v).sum::<f64>().sqrt(),
                ScanNormalization::TotalIntensity => values.iter().map(|v| v.abs()).sum(),
            };
            let normalized = if scale > 0.0 && scale.is_finite() {
                values.iter().map(|v| v / scale).collect()
            } else {
                values.to_vec()
            };
            FeatureVector::new_unchecked(normalized, scan.retention_time())
        })
        .collect();
    ScanSequence::from_parts_unchecked(scans, sequence.channels().map(<[String]>::to_vec))
}
