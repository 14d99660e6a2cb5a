//! CSV anchor list reader.

use std::path::{Path, PathBuf};

use chromwarp_align::AnchorPair;
use tracing::{info, instrument};

use crate::IoError;

/// Reads anchor correspondences from a CSV file with header `reference,query`.
///
/// Each row holds two non-negative scan indices. Rows are returned in file
/// order; ordering and bounds are checked later by
/// [`AnchorPairSet`](chromwarp_align::AnchorPairSet). A file with a header
/// and no rows yields an empty list.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::InvalidHeader`] | Header is not `reference,query` |
/// | [`IoError::InconsistentRowLength`] | Row does not have two columns |
/// | [`IoError::InvalidAnchorIndex`] | Cell is not a non-negative integer |
pub struct AnchorReader {
    path: PathBuf,
}

impl AnchorReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the anchor file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Vec<AnchorPair>, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let names: Vec<&str> = header.iter().collect();
        if names.len() != 2
            || !names[0].eq_ignore_ascii_case("reference")
            || !names[1].eq_ignore_ascii_case("query")
        {
            return Err(IoError::InvalidHeader {
                path: self.path.clone(),
                expected: "reference,query",
                got: names.join(","),
            });
        }

        let mut anchors = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            if record.len() != 2 {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: 2,
                    got: record.len(),
                });
            }
            let reference = self.parse_index(row_index, 0, &record[0])?;
            let query = self.parse_index(row_index, 1, &record[1])?;
            anchors.push(AnchorPair::new(reference, query));
        }

        info!(n_anchors = anchors.len(), "anchors loaded");
        Ok(anchors)
    }

    fn parse_index(&self, row_index: usize, col_index: usize, raw: &str) -> Result<usize, IoError> {
        raw.parse().map_err(|_| IoError::InvalidAnchorIndex {
            path: self.path.clone(),
            row_index,
            col_index,
            raw: raw.to_string(),
        })
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
