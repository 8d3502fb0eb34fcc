//! The interaction dataset: binned samples, targets, prior scores, and
//! the residual gradients derived from them.
//!
//! This is the engine's only view of the training data. Construction
//! copies the caller's row-major binned matrix into per-feature columns,
//! validates every index, and computes residual gradients once; after
//! that the dataset is immutable and can be shared read-only across
//! scoring workers.

use ndarray::ArrayView2;

use crate::data::columns::{BinColumn, BinColumnView};
use crate::features::Feature;
use crate::targets::TargetShape;

/// Dataset construction/validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DatasetError {
    #[error("binned matrix has {got} rows, expected {expected} (one per sample)")]
    SampleCountMismatch { expected: usize, got: usize },

    #[error("binned matrix has {got} columns, expected {expected} (one per feature)")]
    FeatureCountMismatch { expected: usize, got: usize },

    #[error("prior scores have length {got}, expected {expected} (samples x vector length)")]
    ScoreLenMismatch { expected: usize, got: usize },

    #[error("sample {sample}, feature {feature}: bin index {bin} outside [0, {bin_count})")]
    BinOutOfRange {
        sample: usize,
        feature: usize,
        bin: i64,
        bin_count: usize,
    },

    #[error("sample {sample}: class label {label} outside [0, {n_classes})")]
    LabelOutOfRange {
        sample: usize,
        label: i64,
        n_classes: usize,
    },
}

/// Target values in the representation the task uses.
#[derive(Clone, Debug)]
pub enum Targets {
    /// Continuous regression targets.
    Real(Vec<f64>),
    /// Class indices.
    Class(Vec<i64>),
}

impl Targets {
    fn len(&self) -> usize {
        match self {
            Targets::Real(v) => v.len(),
            Targets::Class(v) => v.len(),
        }
    }
}

/// Column-major view of binned sample data with pre-computed residual
/// gradients.
///
/// Residuals are sample-major: the statistics vector of sample `i`
/// occupies `residuals[i * V .. (i + 1) * V]` where `V` is
/// [`TargetShape::vector_len`].
#[derive(Clone, Debug)]
pub struct InteractionDataset {
    features: Vec<Feature>,
    columns: Vec<BinColumn>,
    shape: TargetShape,
    n_samples: usize,
    targets: Targets,
    prior_scores: Vec<f64>,
    residuals: Vec<f64>,
}

impl InteractionDataset {
    /// Builds a regression dataset.
    ///
    /// `binned` is row-major `[sample][feature]`; `prior_scores` has one
    /// value per sample.
    pub fn regression(
        features: Vec<Feature>,
        binned: ArrayView2<'_, i64>,
        targets: Vec<f64>,
        prior_scores: Vec<f64>,
    ) -> Result<Self, DatasetError> {
        Self::build(
            features,
            binned,
            Targets::Real(targets),
            prior_scores,
            TargetShape::Regression,
        )
    }

    /// Builds a classification dataset with `n_classes` classes.
    ///
    /// `prior_scores` is sample-major with `vector_len` entries per
    /// sample: one logit for `n_classes <= 2`, otherwise one per class.
    pub fn classification(
        n_classes: usize,
        features: Vec<Feature>,
        binned: ArrayView2<'_, i64>,
        targets: Vec<i64>,
        prior_scores: Vec<f64>,
    ) -> Result<Self, DatasetError> {
        Self::build(
            features,
            binned,
            Targets::Class(targets),
            prior_scores,
            TargetShape::Classification { n_classes },
        )
    }

    fn build(
        features: Vec<Feature>,
        binned: ArrayView2<'_, i64>,
        targets: Targets,
        prior_scores: Vec<f64>,
        shape: TargetShape,
    ) -> Result<Self, DatasetError> {
        let n_samples = targets.len();
        let vector_len = shape.vector_len();

        if binned.nrows() != n_samples {
            return Err(DatasetError::SampleCountMismatch {
                expected: n_samples,
                got: binned.nrows(),
            });
        }
        if binned.ncols() != features.len() {
            return Err(DatasetError::FeatureCountMismatch {
                expected: features.len(),
                got: binned.ncols(),
            });
        }
        // A product past the address space can never match a real
        // allocation, so saturating keeps the mismatch arm honest.
        let expected_scores = n_samples.checked_mul(vector_len).unwrap_or(usize::MAX);
        if prior_scores.len() != expected_scores {
            return Err(DatasetError::ScoreLenMismatch {
                expected: expected_scores,
                got: prior_scores.len(),
            });
        }
        if let (Targets::Class(labels), TargetShape::Classification { n_classes }) =
            (&targets, shape)
        {
            for (sample, &label) in labels.iter().enumerate() {
                if label < 0 || label as usize >= n_classes.max(1) {
                    return Err(DatasetError::LabelOutOfRange {
                        sample,
                        label,
                        n_classes,
                    });
                }
            }
        }

        // Transpose into validated per-feature columns at the narrowest
        // storage width.
        let mut columns = Vec::with_capacity(features.len());
        let mut scratch: Vec<u32> = Vec::with_capacity(n_samples);
        for (f, feature) in features.iter().enumerate() {
            scratch.clear();
            for sample in 0..n_samples {
                let bin = binned[(sample, f)];
                let in_range = bin >= 0
                    && (bin as u64) < feature.bin_count() as u64
                    && bin as u64 <= u32::MAX as u64;
                if !in_range {
                    return Err(DatasetError::BinOutOfRange {
                        sample,
                        feature: f,
                        bin,
                        bin_count: feature.bin_count(),
                    });
                }
                scratch.push(bin as u32);
            }
            columns.push(BinColumn::from_indices(&scratch, feature.bin_count()));
        }

        let residuals = compute_residuals(shape, &targets, &prior_scores, n_samples);

        Ok(Self {
            features,
            columns,
            shape,
            n_samples,
            targets,
            prior_scores,
            residuals,
        })
    }

    #[inline]
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    #[inline]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[inline]
    pub fn shape(&self) -> TargetShape {
        self.shape
    }

    #[inline]
    pub fn vector_len(&self) -> usize {
        self.shape.vector_len()
    }

    #[inline]
    pub fn targets(&self) -> &Targets {
        &self.targets
    }

    #[inline]
    pub fn prior_scores(&self) -> &[f64] {
        &self.prior_scores
    }

    /// Sample-major residual gradients, `vector_len` entries per sample.
    #[inline]
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Bin-index column of feature `index`.
    #[inline]
    pub fn column(&self, index: usize) -> BinColumnView<'_> {
        self.columns[index].view()
    }
}

// =============================================================================
// Residual gradients
// =============================================================================

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Residual gradient of the loss at the prior scores, per sample and
/// channel.
///
/// - regression: `target - score`
/// - binary (single logit): `sigmoid(score) - target`
/// - multiclass: `softmax(scores) - onehot(target)`, max-shifted for
///   stability
fn compute_residuals(
    shape: TargetShape,
    targets: &Targets,
    prior_scores: &[f64],
    n_samples: usize,
) -> Vec<f64> {
    let vector_len = shape.vector_len();
    let mut residuals = vec![0.0; n_samples * vector_len];

    match (shape, targets) {
        (TargetShape::Regression, Targets::Real(values)) => {
            for i in 0..n_samples {
                residuals[i] = values[i] - prior_scores[i];
            }
        }
        (TargetShape::Classification { n_classes }, Targets::Class(labels)) => {
            if n_classes <= 1 {
                // Degenerate target: the outcome is certain, leave zeros.
            } else if n_classes == 2 {
                for i in 0..n_samples {
                    residuals[i] = sigmoid(prior_scores[i]) - labels[i] as f64;
                }
            } else {
                for i in 0..n_samples {
                    let scores = &prior_scores[i * vector_len..(i + 1) * vector_len];
                    let out = &mut residuals[i * vector_len..(i + 1) * vector_len];

                    let mut max_logit = f64::NEG_INFINITY;
                    for &s in scores {
                        max_logit = max_logit.max(s);
                    }
                    let mut exp_sum = 0.0;
                    for &s in scores {
                        exp_sum += (s - max_logit).exp();
                    }
                    let label = labels[i] as usize;
                    for (c, slot) in out.iter_mut().enumerate() {
                        let p = (scores[c] - max_logit).exp() / exp_sum;
                        let indicator = if c == label { 1.0 } else { 0.0 };
                        *slot = p - indicator;
                    }
                }
            }
        }
        // Constructors pair the variants; this cannot be reached through
        // the public API.
        _ => unreachable!("target representation does not match target shape"),
    }

    residuals
}

// =============================================================================
// Tests
// =============================================================================
