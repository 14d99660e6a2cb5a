//! Directory-backed sequence and anchor sources for batch alignment.

use std::fs;
use std::path::{Path, PathBuf};

use chromwarp_align::{
    AlignError, AnchorPair, AnchorSupplier, ScanNormalization, ScanSequence, SequenceProvider,
    normalize_scans,
};
use tracing::{debug, instrument};

use crate::IoError;
use crate::anchor_reader::AnchorReader;
use crate::domain::SequenceId;
use crate::scan_reader::ScanReader;

/// Serves scan sequences stored as `<dir>/<id>.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirectory {
    dir: PathBuf,
    normalization: Option<ScanNormalization>,
}

impl CsvDirectory {
    /// Serve sequences from `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
            normalization: None,
        }
    }

    /// Normalize every scan after loading.
    #[must_use]
    pub fn with_normalization(mut self, normalization: Option<ScanNormalization>) -> Self {
        self.normalization = normalization;
        self
    }

    /// Return the file path for `id`.
    pub fn path_for(&self, id: &SequenceId) -> PathBuf {
        self.dir.join(format!("{id}.csv"))
    }

    /// List the ids of every `.csv` file in the directory, sorted.
    ///
    /// # Errors
    ///
    /// [`IoError::ReadDir`] if the directory cannot be listed. Files whose stem
    /// is not a valid [`SequenceId`] are skipped.
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    pub fn list_ids(&self) -> Result<Vec<SequenceId>, IoError> {
        let read_dir_error = |e| IoError::ReadDir {
            path: self.dir.clone(),
            source: e,
        };
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(read_dir_error)? {
            let path = entry.map_err(read_dir_error)?.path();
            if path.extension().is_some_and(|ext| ext == "csv")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
                && let Ok(id) = SequenceId::new(stem.to_string())
            {
                ids.push(id);
            }
        }
        ids.sort();
        debug!(n = ids.len(), "sequence ids listed");
        Ok(ids)
    }

    /// Load and optionally normalize the sequence `id`.
    ///
    /// # Errors
    ///
    /// Any [`ScanReader::read`] error.
    pub fn load(&self, id: &SequenceId) -> Result<ScanSequence, IoError> {
        let sequence = ScanReader::new(&self.path_for(id)).read()?;
        Ok(match self.normalization {
            Some(method) => normalize_scans(&sequence, method),
            None => sequence,
        })
    }
}

impl SequenceProvider for CsvDirectory {
    fn sequence(&self, id: &str) -> Result<ScanSequence, AlignError> {
        let sequence_id = SequenceId::new(id.to_string()).map_err(|e| provider_error(id, &e))?;
        match self.load(&sequence_id) {
            Err(IoError::FileNotFound { .. }) => Err(AlignError::UnknownSequence {
                id: id.to_string(),
            }),
            other => other.map_err(|e| provider_error(id, &e)),
        }
    }
}

/// Supplies interior anchors from `<dir>/<reference>__<query>.csv`.
///
/// Pairs without a file get no interior anchors.
#[derive(Debug, Clone)]
pub struct AnchorDirectory {
    dir: PathBuf,
}

impl AnchorDirectory {
    /// Read anchor files from `dir`.
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Return the anchor file path for a pair.
    pub fn path_for(&self, reference: &str, query: &str) -> PathBuf {
        self.dir.join(format!("{reference}__{query}.csv"))
    }
}

impl AnchorSupplier for AnchorDirectory {
    fn anchors(&self, reference: &str, query: &str) -> Result<Vec<AnchorPair>, AlignError> {
        let path = self.path_for(reference, query);
        if !path.is_file() {
            return Ok(Vec::new());
        }
        AnchorReader::new(&path)
            .read()
            .map_err(|e| provider_error(&format!("{reference}__{query}"), &e))
    }
}

fn provider_error(id: &str, error: &IoError) -> AlignError {
    AlignError::Provider {
        id: id.to_string(),
        message: error_chain(error),
    }
}

/// Render an error and its sources as `outer: inner: ...`.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(e) = source {
        message.push_str(": ");
        message.push_str(&e.to_string());
        source = e.source();
    }
    message
}
