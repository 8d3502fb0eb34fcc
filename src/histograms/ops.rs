//! Histogram building kernels.
//!
//! One pass over the samples folds each sample's residual vector into its
//! tensor bin. The inner loop multiplies by the statistics vector length,
//! so small class counts dispatch into const-generic monomorphized
//! kernels that the compiler can unroll; larger counts use a dynamic
//! kernel that reads the width at runtime.
//!
//! Bin coordinates are read per axis column and combined with the tensor
//! strides (axis 0 fastest). Out-of-range coordinates are a programming
//! error here - the dataset layer validated them at construction.

use crate::data::columns::BinColumnView;
use crate::data::InteractionDataset;
use crate::features::FeatureGroup;
use crate::histograms::bin::{BinLayout, BinMut};

/// Accumulates every sample of `dataset` into the zeroed `tensor` laid
/// out over `group`'s axes.
///
/// `tensor` must hold exactly `group` tensor-bins of `layout` width.
pub fn build_histograms(
    tensor: &mut [u64],
    layout: BinLayout,
    dataset: &InteractionDataset,
    group: &FeatureGroup<'_>,
) {
    let cols: Vec<BinColumnView<'_>> = group
        .entries()
        .iter()
        .map(|e| dataset.column(e.index))
        .collect();

    let mut strides = Vec::with_capacity(group.dimension_count());
    let mut stride = 1usize;
    for entry in group.entries() {
        strides.push(stride);
        stride *= entry.feature.bin_count();
    }
    debug_assert_eq!(tensor.len(), stride * layout.words_per_bin());

    let n_samples = dataset.n_samples();
    let residuals = dataset.residuals();

    // Statically exhaustive specialization on the runtime target shape:
    // regression and binary collapse to a single channel, multiclass
    // widths up to [`MAX_SPECIALIZED_CLASSES`](crate::targets) get one
    // monomorph each, anything wider reads the width at runtime.
    match (layout.has_denominator(), layout.vector_len()) {
        (false, _) => accumulate::<1, false>(tensor, layout, &cols, &strides, residuals, n_samples),
        (true, 1) => accumulate::<1, true>(tensor, layout, &cols, &strides, residuals, n_samples),
        (true, 2) => accumulate::<2, true>(tensor, layout, &cols, &strides, residuals, n_samples),
        (true, 3) => accumulate::<3, true>(tensor, layout, &cols, &strides, residuals, n_samples),
        (true, 4) => accumulate::<4, true>(tensor, layout, &cols, &strides, residuals, n_samples),
        (true, 5) => accumulate::<5, true>(tensor, layout, &cols, &strides, residuals, n_samples),
        (true, 6) => accumulate::<6, true>(tensor, layout, &cols, &strides, residuals, n_samples),
        (true, 7) => accumulate::<7, true>(tensor, layout, &cols, &strides, residuals, n_samples),
        (true, 8) => accumulate::<8, true>(tensor, layout, &cols, &strides, residuals, n_samples),
        (true, _) => accumulate_dyn(tensor, layout, &cols, &strides, residuals, n_samples),
    }
}

/// Linear bin index of `sample` under the group's axis columns.
#[inline(always)]
fn bin_index(cols: &[BinColumnView<'_>], strides: &[usize], sample: usize) -> usize {
    match cols {
        [a] => a.get(sample),
        [a, b] => a.get(sample) + b.get(sample) * strides[1],
        _ => cols
            .iter()
            .zip(strides)
            .map(|(col, &s)| col.get(sample) * s)
            .sum(),
    }
}

fn accumulate<const V: usize, const DENOM: bool>(
    tensor: &mut [u64],
    layout: BinLayout,
    cols: &[BinColumnView<'_>],
    strides: &[usize],
    residuals: &[f64],
    n_samples: usize,
) {
    debug_assert_eq!(residuals.len(), n_samples * V);

    for i in 0..n_samples {
        let idx = bin_index(cols, strides, i);
        let mut bin = BinMut::at(tensor, layout, idx);
        bin.add_sample::<V, DENOM>(&residuals[i * V..(i + 1) * V]);
    }
}

fn accumulate_dyn(
    tensor: &mut [u64],
    layout: BinLayout,
    cols: &[BinColumnView<'_>],
    strides: &[usize],
    residuals: &[f64],
    n_samples: usize,
) {
    let v = layout.vector_len();
    debug_assert_eq!(residuals.len(), n_samples * v);

    for i in 0..n_samples {
        let idx = bin_index(cols, strides, i);
        let mut bin = BinMut::at(tensor, layout, idx);
        bin.add_sample_dyn(&residuals[i * v..(i + 1) * v]);
    }
}

// =============================================================================
// Tests
// =============================================================================
