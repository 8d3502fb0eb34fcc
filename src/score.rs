//! Interaction scoring orchestration.
//!
//! [`InteractionScorer`] drives one pair score end to end: size the
//! tensor with overflow-checked arithmetic, zero the scratch region,
//! accumulate histograms, rewrite them into prefix totals, sweep every
//! orthogonal cut pair, and post-filter the result. The scorer owns a
//! [`ScratchArena`] that is reused across calls; everything else about a
//! call is pure in its inputs.

use log::warn;

use crate::data::InteractionDataset;
use crate::features::{FeatureGroup, FeatureGroupEntry};
use crate::histograms::{build_histograms, build_totals, BinLayout, ScratchArena};
use crate::sweep::best_pair_gain;
use crate::utils::Parallelism;

/// Quadrant scratch appended after the main tensor.
const AUX_BINS: usize = 4;

/// Hard scoring failures.
///
/// Everything else - unsupported dimension counts, degenerate features or
/// targets, empty datasets, numeric breakdown - recovers as "score 0,
/// success" so that callers sweeping many pairs don't have to special-case
/// individual groups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoreError {
    #[error("tensor sizing overflowed computing the {0}")]
    AllocationImpossible(&'static str),

    #[error("scratch allocation of {bytes} bytes failed")]
    OutOfMemory { bytes: usize },

    #[error("feature index {index} out of range for {count} features")]
    FeatureIndexOutOfRange { index: usize, count: usize },
}

/// A scoring worker: one reusable arena plus the scoring pipeline.
///
/// Workers are independent; score concurrent pairs by giving each thread
/// its own scorer (see [`rank_interactions`]).
#[derive(Debug, Default)]
pub struct InteractionScorer {
    arena: ScratchArena,
}

impl InteractionScorer {
    pub fn new() -> Self {
        Self {
            arena: ScratchArena::new(),
        }
    }

    /// Interaction strength of the feature group named by
    /// `feature_indices`.
    ///
    /// Returns the best orthogonal-cut splitting score of the joint bin
    /// grid, or 0 for the policy paths (non-pair groups, degenerate
    /// features or targets, empty data, inadmissible cuts, numeric
    /// breakdown). `min_samples_leaf` is clamped to at least 1.
    pub fn score_pair(
        &mut self,
        dataset: &InteractionDataset,
        feature_indices: &[usize],
        min_samples_leaf: u64,
    ) -> Result<f64, ScoreError> {
        let features = dataset.features();
        for &index in feature_indices {
            if index >= features.len() {
                return Err(ScoreError::FeatureIndexOutOfRange {
                    index,
                    count: features.len(),
                });
            }
        }

        // Policy zeros: groups that cannot carry an interaction score.
        if feature_indices
            .iter()
            .any(|&i| features[i].is_degenerate())
        {
            return Ok(0.0);
        }
        if dataset.shape().is_degenerate() || dataset.n_samples() == 0 {
            return Ok(0.0);
        }
        if feature_indices.len() != 2 {
            // Only pair sweeps are implemented; other widths are skipped,
            // not failed, so caller loops stay simple.
            return Ok(0.0);
        }

        let group = FeatureGroup::new(
            feature_indices
                .iter()
                .map(|&index| FeatureGroupEntry {
                    index,
                    feature: &features[index],
                })
                .collect(),
        );

        let layout = BinLayout::for_shape(dataset.shape())
            .ok_or(ScoreError::AllocationImpossible("bin width"))?;

        let tensor_bins = group.checked_tensor_len().ok_or_else(|| {
            warn!("tensor bin count overflowed for group {feature_indices:?}");
            ScoreError::AllocationImpossible("tensor bin count")
        })?;
        let total_bins = tensor_bins
            .checked_add(AUX_BINS)
            .ok_or(ScoreError::AllocationImpossible("auxiliary bin count"))?;
        let bytes_per_bin = layout
            .checked_bytes_per_bin()
            .ok_or(ScoreError::AllocationImpossible("bin byte size"))?;
        total_bins
            .checked_mul(bytes_per_bin)
            .ok_or(ScoreError::AllocationImpossible("buffer byte size"))?;
        let total_words = total_bins * layout.words_per_bin();

        let buffer = self.arena.request(total_words)?;
        let (tensor, aux) = buffer.split_at_mut(tensor_bins * layout.words_per_bin());
        // The aux region is written before it is read; only the tensor
        // needs zeroing.
        tensor.fill(0);

        build_histograms(tensor, layout, dataset, &group);

        #[cfg(debug_assertions)]
        let snapshot = debug_channel_sums(tensor, layout);

        let bin_counts = [group.bin_count(0), group.bin_count(1)];
        build_totals(tensor, layout, &bin_counts);

        #[cfg(debug_assertions)]
        debug_verify_grand_total(&snapshot, tensor, layout, &bin_counts);

        let best = best_pair_gain(
            tensor,
            aux,
            layout,
            bin_counts,
            min_samples_leaf.max(1),
        );

        // NaN or saturated scores mean the arithmetic broke down; such
        // groups must not outrank anything.
        if best.is_nan() || best >= f64::MAX {
            return Ok(0.0);
        }
        debug_assert!(best >= 0.0);
        Ok(best)
    }
}

// =============================================================================
// Pair ranking
// =============================================================================

/// One scored feature pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairScore {
    pub features: [usize; 2],
    pub score: f64,
}

/// Scores every feature pair of `dataset`, best first.
///
/// In parallel mode each rayon worker gets its own [`InteractionScorer`]
/// (and thus its own arena); the dataset is shared read-only. Ties break
/// on the pair indices so the ordering is deterministic.
pub fn rank_interactions(
    dataset: &InteractionDataset,
    min_samples_leaf: u64,
    parallelism: Parallelism,
) -> Result<Vec<PairScore>, ScoreError> {
    let n = dataset.n_features();
    let pairs: Vec<[usize; 2]> = (0..n)
        .flat_map(|a| (a + 1..n).map(move |b| [a, b]))
        .collect();

    let results = parallelism.maybe_par_map_init(pairs, InteractionScorer::new, |scorer, pair| {
        scorer
            .score_pair(dataset, &pair, min_samples_leaf)
            .map(|score| PairScore {
                features: pair,
                score,
            })
    });

    let mut scored: Vec<PairScore> = results.into_iter().collect::<Result<_, _>>()?;
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.features.cmp(&b.features))
    });
    Ok(scored)
}

// =============================================================================
// Debug validation
// =============================================================================

/// Componentwise sums of every bin, taken before the prefix build.
#[cfg(debug_assertions)]
fn debug_channel_sums(tensor: &[u64], layout: BinLayout) -> (u64, Vec<f64>) {
    let wpb = layout.words_per_bin();
    let mut count = 0u64;
    let mut channels = vec![0.0f64; wpb - 1];
    for bin in tensor.chunks_exact(wpb) {
        count += bin[0];
        for (c, &word) in channels.iter_mut().zip(&bin[1..]) {
            *c += f64::from_bits(word);
        }
    }
    (count, channels)
}

/// After the prefix build, the maximal cell must equal the whole-tensor
/// sum componentwise (up to re-association of the float additions).
#[cfg(debug_assertions)]
fn debug_verify_grand_total(
    snapshot: &(u64, Vec<f64>),
    tensor: &[u64],
    layout: BinLayout,
    bin_counts: &[usize],
) {
    let total = crate::histograms::grand_total(tensor, layout, bin_counts);
    debug_assert_eq!(total.sample_count(), snapshot.0);
    let wpb = layout.words_per_bin();
    let total_bins: usize = bin_counts.iter().product();
    let span = &tensor[(total_bins - 1) * wpb..total_bins * wpb];
    for (&expected, &word) in snapshot.1.iter().zip(&span[1..]) {
        let got = f64::from_bits(word);
        if expected.is_finite() && got.is_finite() {
            let scale = expected.abs().max(got.abs()).max(1.0);
            debug_assert!(
                (expected - got).abs() <= 1e-9 * scale,
                "grand total drifted: {expected} vs {got}"
            );
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
