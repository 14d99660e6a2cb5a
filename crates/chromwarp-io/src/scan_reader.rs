//! CSV scan sequence reader with full input validation.

use std::path::{Path, PathBuf};

use chromwarp_align::{FeatureVector, ScanSequence};
use tracing::{debug, info, instrument};

use crate::IoError;

/// Reads one chromatogram from a CSV file.
///
/// Expected CSV format:
/// - Header row required: `rt,<channel>,<channel>,...`
/// - One row per scan: retention time followed by one intensity per channel
/// - All rows must have the same number of columns as the header
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InvalidHeader`] | First column is not `rt`, or no channel columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
pub struct ScanReader {
    path: PathBuf,
}

impl ScanReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`ScanSequence`] with
    /// channel names taken from the header.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<ScanSequence, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that our InconsistentRowLength check fires instead
        // of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let first = header.get(0).unwrap_or("");
        if header.len() < 2 || !first.eq_ignore_ascii_case("rt") {
            return Err(IoError::InvalidHeader {
                path: self.path.clone(),
                expected: "rt,<channel>...",
                got: header.iter().collect::<Vec<_>>().join(","),
            });
        }
        let expected_cols = header.len();
        let channels: Vec<String> = header.iter().skip(1).map(str::to_string).collect();
        debug!(n_channels = channels.len(), "read CSV header");

        let mut scans = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let retention_time = self.parse_finite(row_index, 0, &record[0])?;
            let values = record
                .iter()
                .enumerate()
                .skip(1)
                .map(|(col_index, raw)| self.parse_finite(row_index, col_index, raw))
                .collect::<Result<Vec<f64>, _>>()?;
            scans.push(FeatureVector::new(values, retention_time).map_err(|e| {
                IoError::InvalidScans {
                    path: self.path.clone(),
                    source: e,
                }
            })?);
        }

        if scans.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let sequence = ScanSequence::new(scans)
            .and_then(|s| s.with_channels(channels))
            .map_err(|e| IoError::InvalidScans {
                path: self.path.clone(),
                source: e,
            })?;

        info!(
            n_scans = sequence.len(),
            n_channels = sequence.n_channels(),
            "scan sequence loaded"
        );
        Ok(sequence)
    }

    fn parse_finite(&self, row_index: usize, col_index: usize, raw: &str) -> Result<f64, IoError> {
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                col_index,
                raw: raw.to_string(),
            }),
        }
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
