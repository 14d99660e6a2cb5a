//! Scan feature vectors and ordered scan sequences with validation guarantees.

use std::ops::Index;

use crate::error::AlignError;

/// One scan: a fixed-length vector of channel intensities plus its retention time.
///
/// Guaranteed non-empty with all values and the retention time finite.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f64>,
    retention_time: f64,
}

impl FeatureVector {
    /// Create a new feature vector, validating channel values and retention time.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::EmptyFeatureVector`] | `values` is empty |
    /// | [`AlignError::NonFiniteValue`] | Any intensity is NaN or infinite |
    /// | [`AlignError::NonFiniteRetentionTime`] | `retention_time` is NaN or infinite |
    pub fn new(values: Vec<f64>, retention_time: f64) -> Result<Self, AlignError> {
        if values.is_empty() {
            return Err(AlignError::EmptyFeatureVector);
        }
        if let Some(channel) = values.iter().position(|v| !v.is_finite()) {
            return Err(AlignError::NonFiniteValue { channel });
        }
        if !retention_time.is_finite() {
            return Err(AlignError::NonFiniteRetentionTime {
                value: retention_time,
            });
        }
        Ok(Self {
            values,
            retention_time,
        })
    }

    /// Create a vector from already validated parts.
    pub(crate) fn new_unchecked(values: Vec<f64>, retention_time: f64) -> Self {
        Self {
            values,
            retention_time,
        }
    }

    /// Return the channel intensities.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Return the retention time of the scan.
    #[must_use]
    pub fn retention_time(&self) -> f64 {
        self.retention_time
    }

    /// Return the number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false` for a validated vector; provided for `len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl AsRef<[f64]> for FeatureVector {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

/// Ordered, validated sequence of scans from one chromatogram.
///
/// All scans share the same channel count. Channel names are optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSequence {
    scans: Vec<FeatureVector>,
    channels: Option<Vec<String>>,
}

impl ScanSequence {
    /// Create a new sequence, validating that it is non-empty and every scan
    /// has the channel count of the first scan.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::EmptySequence`] | `scans` is empty |
    /// | [`AlignError::DimensionMismatch`] | A scan's channel count differs from the first scan |
    pub fn new(scans: Vec<FeatureVector>) -> Result<Self, AlignError> {
        let Some(first) = scans.first() else {
            return Err(AlignError::EmptySequence);
        };
        let expected = first.len();
        if let Some(bad) = scans.iter().find(|s| s.len() != expected) {
            return Err(AlignError::DimensionMismatch {
                expected,
                got: bad.len(),
            });
        }
        Ok(Self {
            scans,
            channels: None,
        })
    }

    /// Build a sequence from raw rows and one retention time per row.
    ///
    /// # Errors
    ///
    /// Any [`FeatureVector::new`] or [`ScanSequence::new`] error, plus
    /// [`AlignError::DimensionMismatch`] when `rows` and `times` differ in length.
    pub fn from_rows(rows: Vec<Vec<f64>>, times: &[f64]) -> Result<Self, AlignError> {
        if rows.len() != times.len() {
            return Err(AlignError::DimensionMismatch {
                expected: rows.len(),
                got: times.len(),
            });
        }
        let scans = rows
            .into_iter()
            .zip(times)
            .map(|(values, &rt)| FeatureVector::new(values, rt))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(scans)
    }

    /// Attach channel names (for example binned m/z labels).
    ///
    /// # Errors
    ///
    /// [`AlignError::DimensionMismatch`] when the name count differs from the channel count.
    pub fn with_channels(mut self, channels: Vec<String>) -> Result<Self, AlignError> {
        if channels.len() != self.n_channels() {
            return Err(AlignError::DimensionMismatch {
                expected: self.n_channels(),
                got: channels.len(),
            });
        }
        self.channels = Some(channels);
        Ok(self)
    }

    /// Return the scans in order.
    #[must_use]
    pub fn scans(&self) -> &[FeatureVector] {
        &self.scans
    }

    /// Return the scan at `index`, or `None` if out of range.
    #[must_use]
    pub fn scan(&self, index: usize) -> Option<&FeatureVector> {
        self.scans.get(index)
    }

    /// Return the channel names, if any were attached.
    #[must_use]
    pub fn channels(&self) -> Option<&[String]> {
        self.channels.as_deref()
    }

    /// Return the number of channels per scan.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.scans[0].len()
    }

    /// Return the retention times of all scans in order.
    #[must_use]
    pub fn retention_times(&self) -> Vec<f64> {
        self.scans.iter().map(FeatureVector::retention_time).collect()
    }

    /// Return the number of scans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    /// Always `false` for a validated sequence; provided for `len_without_is_empty`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }

    pub(crate) fn from_parts_unchecked(
        scans: Vec<FeatureVector>,
        channels: Option<Vec<String>>,
    ) -> Self {
        Self { scans, channels }
    }
}

impl Index<usize> for ScanSequence {
    type Output = FeatureVector;

    fn index(&self, index: usize) -> &Self::Output {
        &self.scans[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_vector() {
        let result = FeatureVector::new(vec![], 1.0);
        assert!(matches!(result, Err(AlignError::EmptyFeatureVector)));
    }

    #[test]
    fn rejects_nan_channel() {
        let result = FeatureVector::new(vec![1.0, f64::NAN], 1.0);
        assert!(matches!(result, Err(AlignError::NonFiniteValue { channel: 1 })));
    }

    #[test]
    fn rejects_infinite_retention_time() {
        let result = FeatureVector::new(vec![1.0], f64::INFINITY);
        assert!(matches!(
            result,
            Err(AlignError::NonFiniteRetentionTime { .. })
        ));
    }

    #[test]
    fn rejects_empty_sequence() {
        assert!(matches!(
            ScanSequence::new(vec![]),
            Err(AlignError::EmptySequence)
        ));
    }

    #[test]
    fn rejects_mixed_channel_counts() {
        let scans = vec![
            FeatureVector::new(vec![1.0, 0.0], 0.0).unwrap(),
            FeatureVector::new(vec![1.0], 1.0).unwrap(),
        ];
        assert!(matches!(
            ScanSequence::new(scans),
            Err(AlignError::DimensionMismatch {
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn from_rows_pairs_times() {
        let seq = ScanSequence::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]], &[0.5, 1.5]).unwrap();
        assert_eq!(seq.len(), 2);
        assert_eq!(seq.n_channels(), 2);
        assert_eq!(seq.retention_times(), vec![0.5, 1.5]);
        assert_eq!(seq[1].values(), &[3.0, 4.0]);
    }

    #[test]
    fn from_rows_rejects_time_count_mismatch() {
        let result = ScanSequence::from_rows(vec![vec![1.0]], &[0.0, 1.0]);
        assert!(matches!(result, Err(AlignError::DimensionMismatch { .. })));
    }

    #[test]
    fn channel_names_must_match_width() {
        let seq = ScanSequence::from_rows(vec![vec![1.0, 2.0]], &[0.0]).unwrap();
        assert!(seq.clone().with_channels(vec!["73".into()]).is_err());
        let named = seq.with_channels(vec!["73".into(), "147".into()]).unwrap();
        assert_eq!(named.channels().unwrap()[1], "147");
    }
}
