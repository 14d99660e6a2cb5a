//! Scan similarity functions.
//!
//! Every function returns a score whose polarity is given by its [`Objective`].
//! A result of [`FORBIDDEN`] marks a comparison that must not be used as a
//! match; any NaN or infinite intermediate result is converted to it.

use std::cmp::Ordering;

use crate::error::AlignError;
use crate::scan::FeatureVector;

/// Sentinel score marking a forbidden comparison.
pub const FORBIDDEN: f64 = f64::NEG_INFINITY;

/// Norms below this are treated as zero when normalizing.
const NORM_EPSILON: f64 = 1e-12;

/// Convert a non-finite score to [`FORBIDDEN`].
#[must_use]
pub fn sanitize(score: f64) -> f64 {
    if score.is_finite() { score } else { FORBIDDEN }
}

/// Whether the alignment maximizes a similarity or minimizes a distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Higher scores are better.
    Maximize,
    /// Lower scores are better.
    Minimize,
}

impl Objective {
    /// Return true if `candidate` is strictly better than `incumbent`.
    #[must_use]
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Maximize => candidate.total_cmp(&incumbent) == Ordering::Greater,
            Self::Minimize => candidate.total_cmp(&incumbent) == Ordering::Less,
        }
    }

    /// Apply a non-negative penalty in the objective's direction.
    #[must_use]
    pub fn penalize(self, score: f64, penalty: f64) -> f64 {
        match self {
            Self::Maximize => score - penalty,
            Self::Minimize => score + penalty,
        }
    }

    /// The "unreachable" value stored in matrix cells that hold no score.
    #[must_use]
    pub fn unreachable(self) -> f64 {
        match self {
            Self::Maximize => f64::NEG_INFINITY,
            Self::Minimize => f64::INFINITY,
        }
    }
}

/// Comparison between two intensity vectors of equal length.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ArraySimilarity {
    /// Normalized dot product; 0 when either vector has zero norm.
    #[default]
    Cosine,
    /// Pearson correlation; 0 when either vector has zero variance.
    Correlation,
    /// Plain dot product.
    DotProduct,
    /// Negated Lp distance `-(sum |a_i - b_i|^p)^(1/p)`.
    Lp {
        /// Exponent, `>= 1`.
        p: f64,
    },
    /// Squared Euclidean distance, minimized.
    SquaredEuclidean,
}

impl ArraySimilarity {
    /// Euclidean distance as a maximized similarity (`Lp` with `p = 2`).
    pub const EUCLIDEAN: Self = Self::Lp { p: 2.0 };

    /// Return the polarity of this measure.
    #[must_use]
    pub fn objective(&self) -> Objective {
        match self {
            Self::SquaredEuclidean => Objective::Minimize,
            _ => Objective::Maximize,
        }
    }

    /// Check parameters.
    ///
    /// # Errors
    ///
    /// [`AlignError::InvalidExponent`] when an Lp exponent is below 1 or not finite.
    pub fn validate(&self) -> Result<(), AlignError> {
        match *self {
            Self::Lp { p } if !p.is_finite() || p < 1.0 => Err(AlignError::InvalidExponent { p }),
            _ => Ok(()),
        }
    }

    /// Compare two vectors.
    ///
    /// # Errors
    ///
    /// [`AlignError::DimensionMismatch`] when the slices differ in length.
    pub fn compare(&self, a: &[f64], b: &[f64]) -> Result<f64, AlignError> {
        if a.len() != b.len() {
            return Err(AlignError::DimensionMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        Ok(self.compare_unchecked(a, b))
    }

    /// Compare two vectors already known to have equal length.
    pub(crate) fn compare_unchecked(&self, a: &[f64], b: &[f64]) -> f64 {
        let raw = match *self {
            Self::Cosine => cosine(a, b),
            Self::Correlation => correlation(a, b),
            Self::DotProduct => dot(a, b),
            Self::Lp { p } => -lp_distance(a, b, p),
            Self::SquaredEuclidean => a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum(),
        };
        sanitize(raw)
    }

    /// Compare a vector against an all-zero placeholder of the same length.
    pub(crate) fn against_zero(&self, a: &[f64]) -> f64 {
        let raw = match *self {
            Self::Cosine | Self::Correlation | Self::DotProduct => 0.0,
            Self::Lp { p } => -a.iter().map(|x| x.abs().powf(p)).sum::<f64>().powf(p.recip()),
            Self::SquaredEuclidean => a.iter().map(|x| x * x).sum(),
        };
        sanitize(raw)
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let norm_a = dot(a, a).sqrt();
    let norm_b = dot(b, b).sqrt();
    if norm_a < NORM_EPSILON || norm_b < NORM_EPSILON {
        return 0.0;
    }
    (dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    let mean_a = a.iter().sum::<f64>() / n;
    let mean_b = b.iter().sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

fn lp_distance(a: &[f64], b: &[f64], p: f64) -> f64 {
    if p == 2.0 {
        return a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt();
    }
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs().powf(p))
        .sum::<f64>()
        .powf(p.recip())
}

/// Gaussian retention-time weight `exp(-(t1 - t2)^2 / (2 * tolerance^2))`.
///
/// Weights below `threshold` are reported as [`FORBIDDEN`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianTimeWeight {
    tolerance: f64,
    threshold: f64,
}

impl GaussianTimeWeight {
    /// Create a new time weight.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`AlignError::InvalidTolerance`] | `tolerance` is not finite and positive |
    /// | [`AlignError::InvalidThreshold`] | `threshold` is outside `[0, 1]` |
    pub fn new(tolerance: f64, threshold: f64) -> Result<Self, AlignError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(AlignError::InvalidTolerance { value: tolerance });
        }
        if !(0.0..=1.0).contains(&threshold) {
            return Err(AlignError::InvalidThreshold { value: threshold });
        }
        Ok(Self {
            tolerance,
            threshold,
        })
    }

    /// Return the tolerance.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Return the threshold below which comparisons are forbidden.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Weight for two retention times, or [`FORBIDDEN`] below the threshold.
    #[must_use]
    pub fn weight(&self, t1: f64, t2: f64) -> f64 {
        let delta = t1 - t2;
        let w = (-(delta * delta) / (2.0 * self.tolerance * self.tolerance)).exp();
        if !w.is_finite() || w < self.threshold {
            return FORBIDDEN;
        }
        w
    }
}

/// The similarity used to score a reference scan against a query scan:
/// an array similarity, optionally penalized by retention-time difference.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScanSimilarity {
    array: ArraySimilarity,
    time: Option<GaussianTimeWeight>,
}

impl ScanSimilarity {
    /// Score scans with `array` alone.
    #[must_use]
    pub fn new(array: ArraySimilarity) -> Self {
        Self { array, time: None }
    }

    /// Penalize scores by retention-time difference.
    #[must_use]
    pub fn with_time_weight(mut self, time: GaussianTimeWeight) -> Self {
        self.time = Some(time);
        self
    }

    /// Return the array similarity.
    #[must_use]
    pub fn array(&self) -> ArraySimilarity {
        self.array
    }

    /// Return the time weight, if any.
    #[must_use]
    pub fn time_weight(&self) -> Option<GaussianTimeWeight> {
        self.time
    }

    /// Return the polarity, taken from the array similarity.
    #[must_use]
    pub fn objective(&self) -> Objective {
        self.array.objective()
    }

    /// Check parameters.
    ///
    /// # Errors
    ///
    /// See [`ArraySimilarity::validate`].
    pub fn validate(&self) -> Result<(), AlignError> {
        self.array.validate()
    }

    /// Score two scans.
    ///
    /// # Errors
    ///
    /// [`AlignError::DimensionMismatch`] when the scans differ in channel count.
    pub fn compare(&self, a: &FeatureVector, b: &FeatureVector) -> Result<f64, AlignError> {
        if a.len() != b.len() {
            return Err(AlignError::DimensionMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }
        Ok(self.compare_unchecked(a, b))
    }

    /// Score two scans of equal channel count.
    ///
    /// A forbidden time weight short-circuits before the array comparison.
    pub(crate) fn compare_unchecked(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        let Some(time) = self.time else {
            return self.array.compare_unchecked(a.values(), b.values());
        };
        let w = time.weight(a.retention_time(), b.retention_time());
        if w == FORBIDDEN {
            return FORBIDDEN;
        }
        let s = self.array.compare_unchecked(a.values(), b.values());
        if s == FORBIDDEN {
            return FORBIDDEN;
        }
        match self.objective() {
            Objective::Maximize => sanitize(s * w),
            Objective::Minimize => sanitize(s / w),
        }
    }

    /// Score a scan against an all-zero placeholder vector (no time penalty).
    pub(crate) fn against_zero(&self, a: &FeatureVector) -> f64 {
        self.array.against_zero(a.values())
    }
}
