use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use chromwarp_align::{
    AlignConfig, Aligner, AlignmentOutcome, AnchorPairSet, ArraySimilarity, Band, EndpointAnchors,
    GapModel, GaussianTimeWeight, ScanNormalization, ScanSimilarity, normalize_scans,
};
use chromwarp_io::{
    AnchorDirectory, AnchorReader, CsvDirectory, ExperimentName, ResultWriter, ScanReader,
    SequenceId,
};

#[derive(Parser)]
#[command(name = "chromwarp")]
#[command(about = "Anchor-constrained retention-time alignment of GC-MS chromatograms")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Shared alignment parameters.
#[derive(Args, Debug, Clone)]
struct TuningArgs {
    /// Diagonal band as a fraction of the partition size; 0, -1 or >= 1 disables banding
    #[arg(long, default_value_t = Band::DISABLED_SENTINEL, allow_negative_numbers = true)]
    band: f64,

    /// Radius of the square opened around each interior anchor
    #[arg(long, default_value_t = 2)]
    neighborhood: usize,

    /// Rows each anchor partition extends past its end anchor
    #[arg(long, default_value_t = 0)]
    row_overlap: usize,

    /// Columns each anchor partition extends past its end anchor
    #[arg(long, default_value_t = 0)]
    col_overlap: usize,

    /// Weight of the local score on diagonal (match) steps
    #[arg(long, default_value_t = 2.0)]
    diagonal_weight: f64,

    /// Weight of vertical steps (reference advances alone)
    #[arg(long, default_value_t = 1.0)]
    expansion_weight: f64,

    /// Weight of horizontal steps (query advances alone)
    #[arg(long, default_value_t = 1.0)]
    compression_weight: f64,

    /// Gap scoring: "weighted", "constant" or "zero"
    #[arg(long, default_value = "weighted")]
    gap_model: String,

    /// Penalty per gap step when --gap-model is "constant"
    #[arg(long, default_value_t = 1.0)]
    gap_penalty: f64,

    /// Scan similarity: "cosine", "correlation", "dot", "lp" or "squared-euclidean"
    #[arg(long, default_value = "cosine")]
    similarity: String,

    /// Exponent for --similarity lp
    #[arg(long, default_value_t = 2.0)]
    p: f64,

    /// Gaussian retention-time tolerance; enables time weighting when set
    #[arg(long)]
    time_tolerance: Option<f64>,

    /// Time weights below this value forbid the comparison
    #[arg(long, default_value_t = 0.0)]
    time_threshold: f64,

    /// Per-scan normalization: "none", "unit" or "total"
    #[arg(long, default_value = "none")]
    normalize: String,
}

#[derive(Subcommand)]
enum Command {
    /// Align a query chromatogram against a reference chromatogram
    Align {
        /// Path to the reference scan CSV (`rt,<channel>...`)
        #[arg(long)]
        reference: PathBuf,

        /// Path to the query scan CSV (`rt,<channel>...`)
        #[arg(long)]
        query: PathBuf,

        /// Optional anchor CSV (`reference,query`)
        #[arg(long)]
        anchors: Option<PathBuf>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },

    /// Align every pair of chromatograms stored as `<dir>/<id>.csv`
    Pairwise {
        /// Directory of scan CSV files
        #[arg(long)]
        data: PathBuf,

        /// Sequence ids to align (defaults to every CSV in --data)
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        /// Directory of `<reference>__<query>.csv` anchor files
        #[arg(long)]
        anchors: Option<PathBuf>,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        tuning: TuningArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct AlignOutput {
    experiment: String,
    status: &'static str,
    score: Option<f64>,
    rows: usize,
    cols: usize,
    n_anchors: usize,
    region_cells: usize,
    path_len: usize,
    output: PathBuf,
}

#[derive(Serialize)]
struct PairwiseOutput {
    experiment: String,
    n_sequences: usize,
    n_pairs: usize,
    n_infeasible: usize,
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Align {
            reference,
            query,
            anchors,
            experiment,
            output_dir,
            tuning,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let aligner = Aligner::new(build_config(&tuning)?)
                .context("invalid alignment configuration")?;
            let normalization = parse_normalization(&tuning.normalize)?;

            // 1. Read and preprocess both chromatograms
            let mut reference_seq = ScanReader::new(&reference)
                .read()
                .context("failed to read reference CSV")?;
            let mut query_seq = ScanReader::new(&query)
                .read()
                .context("failed to read query CSV")?;
            if let Some(method) = normalization {
                reference_seq = normalize_scans(&reference_seq, method);
                query_seq = normalize_scans(&query_seq, method);
                info!(?method, "scans normalized");
            }

            // 2. Anchors
            let interior = match &anchors {
                Some(path) => AnchorReader::new(path)
                    .read()
                    .context("failed to read anchor CSV")?,
                None => Vec::new(),
            };
            let anchor_set =
                AnchorPairSet::with_endpoints(&interior, reference_seq.len(), query_seq.len())
                    .context("invalid anchors")?;

            // 3. Align
            let outcome = aligner
                .align(&reference_seq, &query_seq, &anchor_set)
                .context("alignment failed")?;

            // 4. Write JSON artifact
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let output_path = writer.write_alignment(
                &file_label(&reference),
                &file_label(&query),
                &reference_seq,
                &query_seq,
                &outcome,
            )?;

            // 5. Print summary
            let (status, score, path_len, region_cells) = match &outcome {
                AlignmentOutcome::Aligned(a) => {
                    ("aligned", Some(a.score()), a.path().len(), a.region_cells())
                }
                AlignmentOutcome::Infeasible(info) => ("infeasible", None, 0, info.region_cells),
            };
            let output = AlignOutput {
                experiment,
                status,
                score,
                rows: reference_seq.len(),
                cols: query_seq.len(),
                n_anchors: anchor_set.len(),
                region_cells,
                path_len,
                output: output_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Pairwise {
            data,
            ids,
            anchors,
            experiment,
            output_dir,
            tuning,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let aligner = Aligner::new(build_config(&tuning)?)
                .context("invalid alignment configuration")?;
            let provider = CsvDirectory::new(&data)
                .with_normalization(parse_normalization(&tuning.normalize)?);

            // 1. Resolve ids
            let ids: Vec<String> = if ids.is_empty() {
                provider
                    .list_ids()
                    .context("failed to list input directory")?
                    .into_iter()
                    .map(|id| id.as_str().to_string())
                    .collect()
            } else {
                for id in &ids {
                    SequenceId::new(id.clone())?;
                }
                ids
            };
            if ids.len() < 2 {
                anyhow::bail!(
                    "pairwise alignment needs at least two sequences, found {}",
                    ids.len()
                );
            }
            info!(n_sequences = ids.len(), "sequences selected");

            // 2. Align all pairs
            let results = match &anchors {
                Some(dir) => aligner.pairwise(&provider, &ids, &AnchorDirectory::new(dir)),
                None => aligner.pairwise(&provider, &ids, &EndpointAnchors),
            }
            .context("pairwise alignment failed")?;

            // 3. Write JSON artifact
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let output_path = writer.write_pairwise(&results)?;

            // 4. Print summary
            let output = PairwiseOutput {
                experiment,
                n_sequences: ids.len(),
                n_pairs: results.len(),
                n_infeasible: results.iter().filter(|r| !r.outcome.is_aligned()).count(),
                output: output_path,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn build_config(tuning: &TuningArgs) -> Result<AlignConfig> {
    let mut similarity = ScanSimilarity::new(parse_similarity(&tuning.similarity, tuning.p)?);
    if let Some(tolerance) = tuning.time_tolerance {
        let weight = GaussianTimeWeight::new(tolerance, tuning.time_threshold)
            .context("invalid time weighting")?;
        similarity = similarity.with_time_weight(weight);
    }
    let band = Band::from_fraction(tuning.band).context("invalid --band")?;
    Ok(AlignConfig::new(similarity)
        .with_band(band)
        .with_neighborhood(tuning.neighborhood)
        .with_overlap(tuning.row_overlap, tuning.col_overlap)
        .with_diagonal_weight(tuning.diagonal_weight)
        .with_expansion_weight(tuning.expansion_weight)
        .with_compression_weight(tuning.compression_weight)
        .with_gap_model(parse_gap_model(&tuning.gap_model, tuning.gap_penalty)?))
}

fn parse_similarity(s: &str, p: f64) -> Result<ArraySimilarity> {
    match s {
        "cosine" => Ok(ArraySimilarity::Cosine),
        "correlation" => Ok(ArraySimilarity::Correlation),
        "dot" => Ok(ArraySimilarity::DotProduct),
        "lp" => Ok(ArraySimilarity::Lp { p }),
        "squared-euclidean" => Ok(ArraySimilarity::SquaredEuclidean),
        other => anyhow::bail!(
            "unknown similarity: {other} (expected cosine, correlation, dot, lp, or squared-euclidean)"
        ),
    }
}

fn parse_gap_model(s: &str, penalty: f64) -> Result<GapModel> {
    match s {
        "weighted" => Ok(GapModel::Weighted),
        "constant" => Ok(GapModel::Constant {
            insert: penalty,
            delete: penalty,
        }),
        "zero" => Ok(GapModel::AgainstZero),
        other => anyhow::bail!("unknown gap model: {other} (expected weighted, constant, or zero)"),
    }
}

fn parse_normalization(s: &str) -> Result<Option<ScanNormalization>> {
    match s {
        "none" => Ok(None),
        "unit" => Ok(Some(ScanNormalization::UnitNorm)),
        "total" => Ok(Some(ScanNormalization::TotalIntensity)),
        other => anyhow::bail!("unknown normalization: {other} (expected none, unit, or total)"),
    }
}

/// File stem used to label a sequence in the output artifact.
fn file_label(path: &std::path::Path) -> String {
    path.file_stem()
        .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned())
}
