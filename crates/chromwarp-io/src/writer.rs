//! JSON result writer for single and pairwise alignments.

use std::fs;
use std::path::{Path, PathBuf};

use chromwarp_align::{
    AlignmentOutcome, Objective, PairwiseAlignment, PathSummary, ScanSequence,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes alignment results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_alignment.json` and
/// `{experiment}_pairwise.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write one alignment to `{experiment}_alignment.json` and return the path.
    ///
    /// The artifact holds the status, score, move counts, the path as
    /// `[reference, query]` index pairs and the matching retention-time pairs.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`] on failure.
    #[instrument(skip_all, fields(reference = reference_id, query = query_id))]
    pub fn write_alignment(
        &self,
        reference_id: &str,
        query_id: &str,
        reference: &ScanSequence,
        query: &ScanSequence,
        outcome: &AlignmentOutcome,
    ) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_alignment.json", self.experiment.as_str()));

        let (path_cells, retention_times) = match outcome.alignment() {
            Some(a) => (
                a.path()
                    .steps()
                    .iter()
                    .map(|s| [s.reference, s.query])
                    .collect(),
                a.path()
                    .warp_retention_times(reference, query)
                    .into_iter()
                    .map(|(r, q)| [r, q])
                    .collect(),
            ),
            None => (Vec::new(), Vec::new()),
        };

        let artifact = AlignmentArtifact {
            experiment: self.experiment.as_str(),
            reference: reference_id,
            query: query_id,
            rows: reference.len(),
            cols: query.len(),
            result: OutcomeEntry::from(outcome),
            path: path_cells,
            retention_times,
        };
        self.write_json(&path, &artifact)?;

        info!(path = %path.display(), "alignment result written");
        Ok(path)
    }

    /// Write batch results to `{experiment}_pairwise.json` and return the path.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`] on failure.
    #[instrument(skip_all, fields(n_pairs = results.len()))]
    pub fn write_pairwise(&self, results: &[PairwiseAlignment]) -> Result<PathBuf, IoError> {
        let path = self
            .output_dir
            .join(format!("{}_pairwise.json", self.experiment.as_str()));

        let pairs: Vec<PairEntry> = results
            .iter()
            .map(|r| PairEntry {
                reference: r.reference.as_str(),
                query: r.query.as_str(),
                result: OutcomeEntry::from(&r.outcome),
            })
            .collect();
        let artifact = PairwiseArtifact {
            experiment: self.experiment.as_str(),
            n_pairs: pairs.len(),
            n_infeasible: pairs.iter().filter(|p| p.result.status == "infeasible").count(),
            pairs,
        };
        self.write_json(&path, &artifact)?;

        info!(path = %path.display(), "pairwise results written");
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, path: &Path, artifact: &T) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::Serialize {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct AlignmentArtifact<'a> {
    experiment: &'a str,
    reference: &'a str,
    query: &'a str,
    rows: usize,
    cols: usize,
    #[serde(flatten)]
    result: OutcomeEntry,
    path: Vec<[usize; 2]>,
    retention_times: Vec<[f64; 2]>,
}

#[derive(Serialize)]
struct PairwiseArtifact<'a> {
    experiment: &'a str,
    n_pairs: usize,
    n_infeasible: usize,
    pairs: Vec<PairEntry<'a>>,
}

#[derive(Serialize)]
struct PairEntry<'a> {
    reference: &'a str,
    query: &'a str,
    #[serde(flatten)]
    result: OutcomeEntry,
}

/// Status and score fields shared by both artifacts.
#[derive(Serialize)]
struct OutcomeEntry {
    status: &'static str,
    objective: Option<&'static str>,
    score: Option<f64>,
    path_len: usize,
    region_cells: usize,
    reachable_cells: Option<usize>,
    summary: Option<SummaryEntry>,
}

#[derive(Serialize)]
struct SummaryEntry {
    matches: usize,
    insertions: usize,
    deletions: usize,
}

impl From<PathSummary> for SummaryEntry {
    fn from(s: PathSummary) -> Self {
        Self {
            matches: s.matches,
            insertions: s.insertions,
            deletions: s.deletions,
        }
    }
}

impl From<&AlignmentOutcome> for OutcomeEntry {
    fn from(outcome: &AlignmentOutcome) -> Self {
        match outcome {
            AlignmentOutcome::Aligned(a) => Self {
                status: "aligned",
                objective: Some(match a.objective() {
                    Objective::Maximize => "maximize",
                    Objective::Minimize => "minimize",
                }),
                score: Some(a.score()),
                path_len: a.path().len(),
                region_cells: a.region_cells(),
                reachable_cells: None,
                summary: Some(a.path().summary().into()),
            },
            AlignmentOutcome::Infeasible(info) => Self {
                status: "infeasible",
                objective: None,
                score: None,
                path_len: 0,
                region_cells: info.region_cells,
                reachable_cells: Some(info.reachable_cells),
                summary: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chromwarp_align::{
        AlignConfig, Aligner, AnchorPairSet, ArraySimilarity, ConstraintRegion, ScanSimilarity,
    };
    use tempfile::TempDir;

    fn sequence(n: usize) -> ScanSequence {
        let times: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
        ScanSequence::from_rows((0..n).map(|i| vec![1.0, i as f64]).collect(), &times).unwrap()
    }

    fn aligner() -> Aligner {
        Aligner::new(AlignConfig::new(ScanSimilarity::new(ArraySimilarity::EUCLIDEAN))).unwrap()
    }

    fn read_json(path: &Path) -> serde_json::Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn creates_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        ResultWriter::new(&nested, ExperimentName::new("x".into()).unwrap()).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn alignment_artifact_fields() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path(), ExperimentName::new("exp".into()).unwrap())
            .unwrap();
        let (a, b) = (sequence(4), sequence(4));
        let outcome = aligner()
            .align(&a, &b, &AnchorPairSet::endpoints(4, 4).unwrap())
            .unwrap();
        let path = writer.write_alignment("ref", "qry", &a, &b, &outcome).unwrap();
        assert_eq!(path, dir.path().join("exp_alignment.json"));

        let json = read_json(&path);
        assert_eq!(json["experiment"], "exp");
        assert_eq!(json["reference"], "ref");
        assert_eq!(json["status"], "aligned");
        assert_eq!(json["objective"], "maximize");
        assert_eq!(json["score"].as_f64().unwrap(), 0.0);
        assert_eq!(json["path_len"], 4);
        assert_eq!(json["summary"]["matches"], 3);
        assert_eq!(json["path"][3], serde_json::json!([3, 3]));
        assert_eq!(json["retention_times"][1], serde_json::json!([11.0, 11.0]));
        assert!(json["reachable_cells"].is_null());
    }

    #[test]
    fn infeasible_artifact_has_no_path() {
        let dir = TempDir::new().unwrap();
        let writer = ResultWriter::new(dir.path(), ExperimentName::new("inf".into()).unwrap())
            .unwrap();
        let (a, b) = (sequence(10), sequence(3));
        let region = ConstraintRegion::sakoe_chiba(10, 3, 2).unwrap();
        let outcome = aligner().align_within(&a, &b, &region).unwrap();
        let json = read_json(&writer.write_alignment("a", "b", &a, &b, &outcome).unwrap());
        assert_eq!(json["status"], "infeasible");
        assert!(json["score"].is_null());
        assert_eq!(json["path"].as_array().unwrap().len(), 0);
        assert_eq!(json["region_cells"], region.cell_count());
    }
}
