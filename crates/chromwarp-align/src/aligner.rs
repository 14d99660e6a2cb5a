//! Dynamic-programming alignment over a constraint region.

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::anchor::AnchorPairSet;
use crate::config::{AlignConfig, GapModel};
use crate::error::AlignError;
use crate::matrix::AlignmentMatrix;
use crate::path::Move;
use crate::provider::{AnchorSupplier, SequenceProvider};
use crate::region::ConstraintRegion;
use crate::result::{Alignment, AlignmentOutcome, Infeasibility, PairwiseAlignment};
use crate::scan::ScanSequence;
use crate::similarity::{Objective, sanitize};

/// Pairwise aligner. Immutable, thread-safe and copyable.
///
/// Every call allocates its own matrix, so one aligner can serve many
/// alignments concurrently.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aligner {
    config: AlignConfig,
}

impl Aligner {
    /// Create an aligner from a validated configuration.
    ///
    /// # Errors
    ///
    /// Any [`AlignConfig::validate`] error.
    pub fn new(config: AlignConfig) -> Result<Self, AlignError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &AlignConfig {
        &self.config
    }

    /// Build the constraint region for `reference` x `query` from `anchors`.
    ///
    /// # Errors
    ///
    /// Any [`ConstraintBuilder::build`](crate::ConstraintBuilder::build) error.
    pub fn region(
        &self,
        reference: &ScanSequence,
        query: &ScanSequence,
        anchors: &AnchorPairSet,
    ) -> Result<ConstraintRegion, AlignError> {
        self.config
            .constraint
            .build(reference.len(), query.len(), anchors)
    }

    /// Align `query` against `reference` inside the region derived from `anchors`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::DimensionMismatch`] | The sequences differ in channel count |
    /// | [`AlignError::AnchorOutOfBounds`] | An anchor lies outside the grid |
    #[instrument(skip_all, fields(rows = reference.len(), cols = query.len(), n_anchors = anchors.len()))]
    pub fn align(
        &self,
        reference: &ScanSequence,
        query: &ScanSequence,
        anchors: &AnchorPairSet,
    ) -> Result<AlignmentOutcome, AlignError> {
        check_channels(reference, query)?;
        let region = self.region(reference, query, anchors)?;
        self.align_within(reference, query, &region)
    }

    /// Align `query` against `reference` inside an explicit region.
    ///
    /// # Errors
    ///
    /// See [`Aligner::fill`].
    pub fn align_within(
        &self,
        reference: &ScanSequence,
        query: &ScanSequence,
        region: &ConstraintRegion,
    ) -> Result<AlignmentOutcome, AlignError> {
        let matrix = self.fill(reference, query, region)?;
        let region_cells = region.cell_count();
        let outcome = match (matrix.terminal_score(), matrix.traceback()) {
            (Some(score), Some(path)) => {
                debug!(score, path_len = path.len(), "alignment found");
                AlignmentOutcome::Aligned(Alignment {
                    path,
                    score,
                    objective: matrix.objective(),
                    region_cells,
                })
            }
            _ => {
                let reachable_cells = matrix.reachable_cells();
                debug!(region_cells, reachable_cells, "terminal cell unreachable");
                AlignmentOutcome::Infeasible(Infeasibility {
                    rows: matrix.rows(),
                    cols: matrix.cols(),
                    region_cells,
                    reachable_cells,
                })
            }
        };
        Ok(outcome)
    }

    /// Fill the accumulated-score matrix over `region` and return it.
    ///
    /// Cells are visited in row-major order, so every predecessor is final
    /// before it is read. `(0, 0)` scores zero. A cell keeps the best candidate
    /// among its admissible, reached predecessors; on ties the diagonal wins
    /// over the vertical move, which wins over the horizontal move. A cell
    /// without candidates stays unreachable.
    ///
    /// Candidates whose accumulated score overflows to infinity are dropped
    /// like forbidden ones, so an unbounded measure such as
    /// [`ArraySimilarity::DotProduct`](crate::ArraySimilarity::DotProduct) on
    /// very large intensities can leave the terminal unreachable. Normalize
    /// the scans first (see [`normalize_scans`](crate::normalize_scans)) rather
    /// than widening the region.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::DimensionMismatch`] | The sequences differ in channel count |
    /// | [`AlignError::RegionShapeMismatch`] | The region is not `reference.len() x query.len()` |
    #[instrument(skip_all, fields(rows = reference.len(), cols = query.len()))]
    pub fn fill(
        &self,
        reference: &ScanSequence,
        query: &ScanSequence,
        region: &ConstraintRegion,
    ) -> Result<AlignmentMatrix, AlignError> {
        check_channels(reference, query)?;
        if region.rows() != reference.len() || region.cols() != query.len() {
            return Err(AlignError::RegionShapeMismatch {
                region_rows: region.rows(),
                region_cols: region.cols(),
                rows: reference.len(),
                cols: query.len(),
            });
        }

        let similarity = &self.config.similarity;
        let objective = similarity.objective();
        let gaps = GapScorer::new(&self.config, reference, query);
        let diagonal_weight = self.config.diagonal_weight;
        let mut matrix = AlignmentMatrix::allocate(region, objective);

        for i in 0..region.rows() {
            for span in region.row_spans(i) {
                for j in span.clone() {
                    if i == 0 && j == 0 {
                        matrix.set_origin(0.0);
                        continue;
                    }
                    let local = similarity.compare_unchecked(&reference[i], &query[j]);
                    let open = local.is_finite();
                    let mut best: Option<(f64, Move)> = None;

                    if open
                        && i > 0
                        && j > 0
                        && let Some(prev) = matrix.score(i - 1, j - 1)
                    {
                        consider(&mut best, objective, prev + diagonal_weight * local, Move::Diagonal);
                    }
                    if i > 0
                        && let Some(prev) = matrix.score(i - 1, j)
                        && let Some(gap) = gaps.insertion(i, local)
                    {
                        consider(&mut best, objective, prev + gap, Move::Insertion);
                    }
                    if j > 0
                        && let Some(prev) = matrix.score(i, j - 1)
                        && let Some(gap) = gaps.deletion(j, local)
                    {
                        consider(&mut best, objective, prev + gap, Move::Deletion);
                    }

                    if let Some((score, mv)) = best {
                        matrix.set(i, j, score, mv);
                    }
                }
            }
        }

        debug!(
            reachable = matrix.reachable_cells(),
            terminal = ?matrix.terminal_score(),
            "matrix filled"
        );
        Ok(matrix)
    }

    /// Align every unordered pair of `ids`, in parallel.
    ///
    /// Pair `(i, j)` with `i < j` aligns `ids[j]` (query) against `ids[i]`
    /// (reference). Sequences and interior anchors are fetched up front; each
    /// pair then builds its own region and matrix. Results are returned in
    /// `(i, j)` lexicographic order regardless of scheduling.
    ///
    /// # Errors
    ///
    /// The first provider, supplier or alignment error encountered.
    #[instrument(skip_all, fields(n = ids.len()))]
    pub fn pairwise<P, A>(
        &self,
        provider: &P,
        ids: &[String],
        anchors: &A,
    ) -> Result<Vec<PairwiseAlignment>, AlignError>
    where
        P: SequenceProvider + ?Sized,
        A: AnchorSupplier + ?Sized,
    {
        let sequences = ids
            .iter()
            .map(|id| provider.sequence(id))
            .collect::<Result<Vec<_>, _>>()?;
        let n = ids.len();
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
        let interiors = pairs
            .iter()
            .map(|&(i, j)| anchors.anchors(&ids[i], &ids[j]))
            .collect::<Result<Vec<_>, _>>()?;

        info!(pairs = pairs.len(), "aligning pairs");

        pairs
            .par_iter()
            .zip(interiors.par_iter())
            .map(|(&(i, j), interior)| {
                let (reference, query) = (&sequences[i], &sequences[j]);
                let set = AnchorPairSet::with_endpoints(interior, reference.len(), query.len())?;
                let outcome = self.align(reference, query, &set)?;
                Ok::<_, AlignError>(PairwiseAlignment {
                    reference: ids[i].clone(),
                    query: ids[j].clone(),
                    outcome,
                })
            })
            .collect()
    }
}

fn check_channels(reference: &ScanSequence, query: &ScanSequence) -> Result<(), AlignError> {
    if reference.n_channels() != query.n_channels() {
        return Err(AlignError::DimensionMismatch {
            expected: reference.n_channels(),
            got: query.n_channels(),
        });
    }
    Ok(())
}

/// Keep `candidate` only if it is finite and strictly better than the incumbent.
fn consider(best: &mut Option<(f64, Move)>, objective: Objective, candidate: f64, mv: Move) {
    if !candidate.is_finite() {
        return;
    }
    if best.is_none_or(|(score, _)| objective.improves(candidate, score)) {
        *best = Some((candidate, mv));
    }
}

/// Scores the gap terms of vertical and horizontal moves under a [`GapModel`].
struct GapScorer {
    model: GapModel,
    objective: Objective,
    expansion_weight: f64,
    compression_weight: f64,
    /// Per-scan scores against the zero vector, filled only for [`GapModel::AgainstZero`].
    reference_zero: Vec<f64>,
    query_zero: Vec<f64>,
}

impl GapScorer {
    fn new(config: &AlignConfig, reference: &ScanSequence, query: &ScanSequence) -> Self {
        let (reference_zero, query_zero) = match config.gap_model {
            GapModel::AgainstZero => {
                let against = |s: &ScanSequence| {
                    s.scans()
                        .iter()
                        .map(|scan| sanitize(config.similarity.against_zero(scan)))
                        .collect()
                };
                (against(reference), against(query))
            }
            _ => (Vec::new(), Vec::new()),
        };
        Self {
            model: config.gap_model,
            objective: config.similarity.objective(),
            expansion_weight: config.expansion_weight,
            compression_weight: config.compression_weight,
            reference_zero,
            query_zero,
        }
    }

    /// Gap term for entering `(i, j)` from `(i - 1, j)`.
    fn insertion(&self, i: usize, local: f64) -> Option<f64> {
        match self.model {
            GapModel::Weighted => local
                .is_finite()
                .then(|| self.expansion_weight * local),
            GapModel::Constant { insert, .. } => Some(self.objective.penalize(0.0, insert)),
            GapModel::AgainstZero => {
                let z = self.reference_zero[i];
                z.is_finite().then(|| self.expansion_weight * z)
            }
        }
    }

    /// Gap term for entering `(i, j)` from `(i, j - 1)`.
    fn deletion(&self, j: usize, local: f64) -> Option<f64> {
        match self.model {
            GapModel::Weighted => local
                .is_finite()
                .then(|| self.compression_weight * local),
            GapModel::Constant { delete, .. } => Some(self.objective.penalize(0.0, delete)),
            GapModel::AgainstZero => {
                let z = self.query_zero[j];
                z.is_finite().then(|| self.compression_weight * z)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::AnchorPair;
    use crate::constraint::Band;
    use crate::region::RegionBuilder;
    use crate::similarity::{ArraySimilarity, GaussianTimeWeight, ScanSimilarity};
    use std::collections::HashMap;

    fn seq(rows: &[&[f64]]) -> ScanSequence {
        let times: Vec<f64> = (0..rows.len()).map(|i| i as f64).collect();
        ScanSequence::from_rows(rows.iter().map(|r| r.to_vec()).collect(), &times).unwrap()
    }

    fn constant(n: usize, row: &[f64]) -> ScanSequence {
        let times: Vec<f64> = (0..n).map(|i| i as f64).collect();
        ScanSequence::from_rows(vec![row.to_vec(); n], &times).unwrap()
    }

    fn cosine_aligner() -> Aligner {
        Aligner::new(AlignConfig::new(ScanSimilarity::new(ArraySimilarity::Cosine))).unwrap()
    }

    fn cells(outcome: &AlignmentOutcome) -> Vec<(usize, usize)> {
        outcome
            .alignment()
            .unwrap()
            .path()
            .steps()
            .iter()
            .map(|s| (s.reference, s.query))
            .collect()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let config = AlignConfig::new(ScanSimilarity::default()).with_diagonal_weight(f64::NAN);
        assert!(Aligner::new(config).is_err());
    }

    #[test]
    fn single_cell_grid() {
        let a = seq(&[&[1.0, 0.0]]);
        let outcome = cosine_aligner()
            .align(&a, &a, &AnchorPairSet::endpoints(1, 1).unwrap())
            .unwrap();
        assert_eq!(cells(&outcome), vec![(0, 0)]);
        assert_eq!(outcome.alignment().unwrap().score(), 0.0);
    }

    #[test]
    fn dimension_mismatch_rejected_before_work() {
        let a = seq(&[&[1.0, 0.0]]);
        let b = seq(&[&[1.0, 0.0, 0.0]]);
        let region = ConstraintRegion::full(1, 1).unwrap();
        assert!(matches!(
            cosine_aligner().fill(&a, &b, &region),
            Err(AlignError::DimensionMismatch {
                expected: 2,
                got: 3
            })
        ));
    }

    #[test]
    fn region_shape_mismatch_rejected() {
        let a = seq(&[&[1.0], &[2.0]]);
        let region = ConstraintRegion::full(3, 2).unwrap();
        assert!(matches!(
            cosine_aligner().fill(&a, &a, &region),
            Err(AlignError::RegionShapeMismatch { .. })
        ));
    }

    #[test]
    fn tie_between_diagonal_and_gaps() {
        // Diagonal: 0 + 2*1; above: 1 + 1; left: 1 + 1.
        let a = seq(&[&[1.0], &[1.0]]);
        let m = cosine_aligner()
            .fill(&a, &a, &ConstraintRegion::full(2, 2).unwrap())
            .unwrap();
        assert_eq!(m.score(1, 1), Some(2.0));
        assert_eq!(m.arrival(1, 1), Some(Move::Diagonal));
    }

    #[test]
    fn vertical_preferred_over_horizontal_on_tie() {
        let a = seq(&[&[1.0], &[1.0]]);
        let region = ConstraintRegion::full(2, 2).unwrap();
        let aligner = Aligner::new(
            AlignConfig::new(ScanSimilarity::new(ArraySimilarity::Cosine))
                .with_diagonal_weight(0.0),
        )
        .unwrap();
        let m = aligner.fill(&a, &a, &region).unwrap();
        // Diagonal 0 + 0; above 1 + 1; left 1 + 1.
        assert_eq!(m.score(1, 1), Some(2.0));
        assert_eq!(m.arrival(1, 1), Some(Move::Insertion));
    }

    #[test]
    fn inadmissible_predecessor_is_ignored() {
        // (1, 0) excluded: (1, 1) can only come from (0, 0) or (0, 1).
        let a = seq(&[&[1.0], &[1.0]]);
        let mut b = RegionBuilder::new(2, 2).unwrap();
        b.add_span(0, 0..2).add_span(1, 1..2);
        let m = cosine_aligner().fill(&a, &a, &b.build()).unwrap();
        assert_eq!(m.score(1, 0), None);
        assert_eq!(m.arrival(1, 1), Some(Move::Diagonal));
    }

    #[test]
    fn cell_without_predecessors_is_unreachable() {
        let a = seq(&[&[1.0], &[1.0], &[1.0]]);
        let mut b = RegionBuilder::new(3, 3).unwrap();
        b.add_span(0, 0..1).add_span(2, 0..3);
        let region = b.build();
        let outcome = cosine_aligner().align_within(&a, &a, &region).unwrap();
        match outcome {
            AlignmentOutcome::Infeasible(info) => {
                assert_eq!(info.region_cells, 4);
                assert_eq!(info.reachable_cells, 1);
            }
            AlignmentOutcome::Aligned(_) => panic!("expected infeasible"),
        }
    }

    #[test]
    fn sakoe_chiba_excluding_terminal_is_infeasible() {
        let a = constant(10, &[1.0]);
        let b = constant(3, &[1.0]);
        let region = ConstraintRegion::sakoe_chiba(10, 3, 2).unwrap();
        let outcome = cosine_aligner().align_within(&a, &b, &region).unwrap();
        assert!(!outcome.is_aligned());
    }

    #[test]
    fn forbidden_time_weight_blocks_weighted_cells() {
        // Scans far apart in retention time cannot be matched or gapped into.
        let a = ScanSequence::from_rows(vec![vec![1.0]; 2], &[0.0, 100.0]).unwrap();
        let b = ScanSequence::from_rows(vec![vec![1.0]; 2], &[0.0, 1.0]).unwrap();
        let sim = ScanSimilarity::new(ArraySimilarity::Cosine)
            .with_time_weight(GaussianTimeWeight::new(1.0, 0.5).unwrap());
        let aligner = Aligner::new(AlignConfig::new(sim)).unwrap();
        let outcome = aligner
            .align(&a, &b, &AnchorPairSet::endpoints(2, 2).unwrap())
            .unwrap();
        assert!(!outcome.is_aligned());
    }

    #[test]
    fn constant_gap_model_passes_forbidden_cells_by_gapping() {
        // (1, 1) is forbidden as a match but can still be entered by a gap.
        let a = ScanSequence::from_rows(vec![vec![1.0]; 2], &[0.0, 100.0]).unwrap();
        let b = ScanSequence::from_rows(vec![vec![1.0]; 2], &[0.0, 1.0]).unwrap();
        let sim = ScanSimilarity::new(ArraySimilarity::Cosine)
            .with_time_weight(GaussianTimeWeight::new(1.0, 0.5).unwrap());
        let config = AlignConfig::new(sim).with_gap_model(GapModel::Constant {
            insert: 0.5,
            delete: 0.25,
        });
        let outcome = Aligner::new(config)
            .unwrap()
            .align(&a, &b, &AnchorPairSet::endpoints(2, 2).unwrap())
            .unwrap();
        // (0,0) -> (0,1) -> (1,1): -0.25 - 0.5
        assert_eq!(cells(&outcome), vec![(0, 0), (0, 1), (1, 1)]);
        assert_eq!(outcome.alignment().unwrap().score(), -0.75);
    }

    #[test]
    fn against_zero_gap_model_scores_advancing_scan() {
        // Squared Euclidean against zero is the squared norm of the advancing scan.
        let a = seq(&[&[0.0], &[3.0]]);
        let b = seq(&[&[0.0], &[3.0]]);
        let config = AlignConfig::new(ScanSimilarity::new(ArraySimilarity::SquaredEuclidean))
            .with_gap_model(GapModel::AgainstZero);
        let m = Aligner::new(config)
            .unwrap()
            .fill(&a, &b, &ConstraintRegion::full(2, 2).unwrap())
            .unwrap();
        assert_eq!(m.score(1, 0), Some(9.0));
        assert_eq!(m.score(0, 1), Some(9.0));
        assert_eq!(m.score(1, 1), Some(0.0));
        assert_eq!(m.arrival(1, 1), Some(Move::Diagonal));
    }

    #[test]
    fn against_zero_gap_model_under_maximized_measure() {
        // Manhattan similarity: gaps score the advancing scan against zero,
        // not the local comparison (which would give -2 for (1, 0)).
        let a = seq(&[&[0.0], &[3.0]]);
        let b = seq(&[&[1.0], &[3.0]]);
        let config = AlignConfig::new(ScanSimilarity::new(ArraySimilarity::Lp { p: 1.0 }))
            .with_gap_model(GapModel::AgainstZero);
        let m = Aligner::new(config)
            .unwrap()
            .fill(&a, &b, &ConstraintRegion::full(2, 2).unwrap())
            .unwrap();
        assert_eq!(m.objective(), Objective::Maximize);
        assert_eq!(m.score(1, 0), Some(-3.0));
        assert_eq!(m.score(0, 1), Some(-3.0));
        // Diagonal 0 + 2 * 0 beats either gap route at -6.
        assert_eq!(m.score(1, 1), Some(0.0));
        assert_eq!(m.arrival(1, 1), Some(Move::Diagonal));
    }

    #[test]
    fn overflowing_scores_leave_terminal_unreachable() {
        // Each local score is finite (about 0.81 * f64::MAX) but any sum of two overflows.
        let big = f64::MAX.sqrt() * 0.9;
        let a = seq(&[&[big], &[big]]);
        let config = AlignConfig::new(ScanSimilarity::new(ArraySimilarity::DotProduct));
        let outcome = Aligner::new(config)
            .unwrap()
            .align_within(&a, &a, &ConstraintRegion::full(2, 2).unwrap())
            .unwrap();
        match outcome {
            AlignmentOutcome::Infeasible(info) => {
                assert_eq!(info.region_cells, 4);
                assert_eq!(info.reachable_cells, 3);
            }
            AlignmentOutcome::Aligned(_) => panic!("expected infeasible"),
        }
    }

    #[test]
    fn minimize_picks_lowest_cost() {
        let a = seq(&[&[0.0], &[1.0], &[2.0]]);
        let b = seq(&[&[0.0], &[2.0]]);
        let config = AlignConfig::new(ScanSimilarity::new(ArraySimilarity::SquaredEuclidean))
            .with_diagonal_weight(1.0);
        let outcome = Aligner::new(config)
            .unwrap()
            .align(&a, &b, &AnchorPairSet::endpoints(3, 2).unwrap())
            .unwrap();
        let alignment = outcome.alignment().unwrap();
        assert_eq!(alignment.objective(), Objective::Minimize);
        // (0,0) -> (1,0) costs 1, then (2,1) costs 0; the alternatives cost 1 or more extra.
        assert_eq!(alignment.score(), 1.0);
        assert_eq!(cells(&outcome), vec![(0, 0), (1, 0), (2, 1)]);
    }

    #[test]
    fn banded_alignment_follows_anchor() {
        let a = constant(20, &[1.0, 0.0]);
        let b = constant(10, &[1.0, 0.0]);
        let aligner = Aligner::new(
            AlignConfig::new(ScanSimilarity::new(ArraySimilarity::Cosine))
                .with_band(Band::Fraction(0.1))
                .with_neighborhood(0),
        )
        .unwrap();
        let anchors = AnchorPairSet::with_endpoints(&[AnchorPair::new(10, 2)], 20, 10).unwrap();
        let outcome = aligner.align(&a, &b, &anchors).unwrap();
        let alignment = outcome.alignment().unwrap();
        let region = aligner.region(&a, &b, &anchors).unwrap();
        assert!(alignment.region_cells() < 200);
        assert_eq!(alignment.region_cells(), region.cell_count());
        for step in alignment.path() {
            assert!(region.contains(step.reference, step.query));
        }
    }

    #[test]
    fn pairwise_order_is_deterministic() {
        let mut provider = HashMap::new();
        provider.insert("a".to_string(), seq(&[&[1.0], &[2.0], &[3.0]]));
        provider.insert("b".to_string(), seq(&[&[1.0], &[3.0]]));
        provider.insert("c".to_string(), seq(&[&[2.0], &[2.0], &[2.0], &[2.0]]));
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let results = cosine_aligner()
            .pairwise(&provider, &ids, &crate::provider::EndpointAnchors)
            .unwrap();
        let order: Vec<(&str, &str)> = results
            .iter()
            .map(|r| (r.reference.as_str(), r.query.as_str()))
            .collect();
        assert_eq!(order, vec![("a", "b"), ("a", "c"), ("b", "c")]);
        assert!(results.iter().all(|r| r.outcome.is_aligned()));
    }

    #[test]
    fn pairwise_unknown_id_errors() {
        let provider: HashMap<String, ScanSequence> = HashMap::new();
        let ids = vec!["x".to_string()];
        assert!(matches!(
            cosine_aligner().pairwise(&provider, &ids, &crate::provider::EndpointAnchors),
            Err(AlignError::UnknownSequence { .. })
        ));
    }
}
