//! Synthetic datasets and a brute-force scoring oracle for tests.
//!
//! The oracle recomputes quadrant statistics by scanning samples
//! directly, with no histogram tensor and no prefix sums, so engine
//! results can be checked against an independent code path.

use ndarray::Array2;
use rand::prelude::*;

use crate::data::InteractionDataset;
use crate::features::Feature;
use crate::targets::TargetShape;

/// Random binned matrix, row-major `[sample][feature]`, entry `j` uniform
/// in `[0, bin_counts[j])`.
pub fn random_binned_matrix(rows: usize, bin_counts: &[usize], seed: u64) -> Array2<i64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((rows, bin_counts.len()), |(_, j)| {
        rng.gen_range(0..bin_counts[j] as i64)
    })
}

/// Regression dataset with uniform targets in `[-1, 1]` and zero prior
/// scores.
pub fn synthetic_regression(rows: usize, bin_counts: &[usize], seed: u64) -> InteractionDataset {
    let binned = random_binned_matrix(rows, bin_counts, seed);
    let mut rng = StdRng::seed_from_u64(seed ^ 0x7A65);
    let targets: Vec<f64> = (0..rows).map(|_| rng.r#gen::<f64>() * 2.0 - 1.0).collect();
    let features = bin_counts.iter().map(|&b| Feature::ordinal(b)).collect();
    InteractionDataset::regression(features, binned.view(), targets, vec![0.0; rows]).unwrap()
}

/// Classification dataset with uniform labels and uniform prior logits
/// in `[-1, 1]`.
pub fn synthetic_classification(
    n_classes: usize,
    rows: usize,
    bin_counts: &[usize],
    seed: u64,
) -> InteractionDataset {
    let binned = random_binned_matrix(rows, bin_counts, seed);
    let mut rng = StdRng::seed_from_u64(seed ^ 0xC1A5);
    let targets: Vec<i64> = (0..rows).map(|_| rng.gen_range(0..n_classes as i64)).collect();
    let vector_len = TargetShape::Classification { n_classes }.vector_len();
    let scores: Vec<f64> = (0..rows * vector_len)
        .map(|_| rng.r#gen::<f64>() * 2.0 - 1.0)
        .collect();
    let features = bin_counts.iter().map(|&b| Feature::ordinal(b)).collect();
    InteractionDataset::classification(n_classes, features, binned.view(), targets, scores)
        .unwrap()
}

/// Reference pair score computed by direct re-accumulation.
///
/// For every cut pair, scans all samples into four quadrant accumulators
/// and applies the same admissibility rule and gain formula as the
/// engine. Mirrors the engine's zero policies for degenerate inputs.
pub fn brute_force_pair_score(
    dataset: &InteractionDataset,
    pair: [usize; 2],
    min_samples_leaf: u64,
) -> f64 {
    let features = dataset.features();
    let bins = [
        features[pair[0]].bin_count(),
        features[pair[1]].bin_count(),
    ];
    if bins[0] <= 1 || bins[1] <= 1 || dataset.n_samples() == 0 || dataset.shape().is_degenerate()
    {
        return 0.0;
    }

    let v = dataset.vector_len();
    let col_a = dataset.column(pair[0]);
    let col_b = dataset.column(pair[1]);
    let residuals = dataset.residuals();
    let min_child = min_samples_leaf.max(1);

    let mut best = 0.0f64;
    for c0 in 0..bins[0] - 1 {
        for c1 in 0..bins[1] - 1 {
            let mut counts = [0u64; 4];
            let mut grads = vec![0.0f64; 4 * v];
            for i in 0..dataset.n_samples() {
                let high_a = (col_a.get(i) > c0) as usize;
                let high_b = (col_b.get(i) > c1) as usize;
                let q = high_a + 2 * high_b;
                counts[q] += 1;
                for (c, &r) in residuals[i * v..(i + 1) * v].iter().enumerate() {
                    grads[q * v + c] += r;
                }
            }
            if counts.iter().any(|&c| c < min_child) {
                continue;
            }
            let mut score = 0.0f64;
            for q in 0..4 {
                for c in 0..v {
                    score += grads[q * v + c] * grads[q * v + c] / counts[q] as f64;
                }
            }
            if !(score <= best) {
                best = score;
            }
        }
    }

    if best.is_nan() || best >= f64::MAX {
        return 0.0;
    }
    best
}
