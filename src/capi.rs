//! C ABI for host-language bindings.
//!
//! A context bundles one immutable [`InteractionDataset`] with one
//! scoring worker; hosts create it once, call
//! [`score_interaction`] per candidate pair, and destroy it when done.
//! Hard failures come back as nonzero status codes; the policy paths
//! (degenerate groups, unsupported widths, numeric breakdown) report
//! success with a zero score so binding loops stay simple.

use std::os::raw::c_void;

use log::{error, warn};
use ndarray::ArrayView2;

use crate::data::InteractionDataset;
use crate::features::{Feature, FeatureKind};
use crate::score::{InteractionScorer, ScoreError};
use crate::targets::TargetShape;

/// Wire descriptor of one binned feature.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct FeatureDesc {
    pub bin_count: i64,
    /// 0 = ordinal, 1 = nominal.
    pub kind: i32,
    /// 0 or 1.
    pub has_missing: i32,
}

/// Opaque scoring context handle.
pub struct InteractionContext {
    dataset: InteractionDataset,
    scorer: InteractionScorer,
}

/// Status codes returned by [`score_interaction`].
const STATUS_OK: i64 = 0;
const STATUS_INVALID_ARGUMENT: i64 = 1;
const STATUS_ALLOCATION_IMPOSSIBLE: i64 = 2;
const STATUS_OUT_OF_MEMORY: i64 = 3;

/// Creates a scoring context over an already-binned dataset.
///
/// `class_count` is `-1` for regression, `>= 2` for classification; `0`
/// and `1` are accepted as degenerate targets that always score zero.
/// `binned_matrix` is row-major `[sample][feature]` with each entry in
/// `[0, bin_count)` of its feature. `targets` points to `i64` class
/// indices for classification or `f64` values for regression.
/// `prior_scores` holds `sample_count * V` values, sample-major, where
/// `V` is 1 for regression and `class_count <= 2`, else `class_count`.
///
/// Returns null on invalid arguments.
///
/// # Safety
///
/// All pointers must be valid for the lengths implied above for the
/// duration of the call; the data is copied out before it returns.
#[no_mangle]
pub unsafe extern "C" fn create_interaction_context(
    class_count: i64,
    feature_count: u64,
    features: *const FeatureDesc,
    sample_count: u64,
    binned_matrix: *const i64,
    targets: *const c_void,
    prior_scores: *const f64,
) -> *mut InteractionContext {
    let Some(shape) = TargetShape::from_class_count(class_count) else {
        error!("create_interaction_context: class_count {class_count} is not valid");
        return std::ptr::null_mut();
    };
    if class_count == 0 && sample_count != 0 {
        error!("create_interaction_context: class_count cannot be zero with samples present");
        return std::ptr::null_mut();
    }
    if feature_count != 0 && features.is_null() {
        error!("create_interaction_context: features cannot be null");
        return std::ptr::null_mut();
    }
    if sample_count != 0 && targets.is_null() {
        error!("create_interaction_context: targets cannot be null");
        return std::ptr::null_mut();
    }
    if sample_count != 0 && feature_count != 0 && binned_matrix.is_null() {
        error!("create_interaction_context: binned_matrix cannot be null");
        return std::ptr::null_mut();
    }
    if sample_count != 0 && prior_scores.is_null() {
        error!("create_interaction_context: prior_scores cannot be null");
        return std::ptr::null_mut();
    }
    let (Ok(n_features), Ok(n_samples)) = (
        usize::try_from(feature_count),
        usize::try_from(sample_count),
    ) else {
        error!("create_interaction_context: counts exceed the address space");
        return std::ptr::null_mut();
    };

    let mut feature_list = Vec::with_capacity(n_features);
    let descs = if n_features == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(features, n_features)
    };
    for desc in descs {
        let kind = match desc.kind {
            0 => FeatureKind::Ordinal,
            1 => FeatureKind::Nominal,
            other => {
                error!("create_interaction_context: feature kind {other} is not valid");
                return std::ptr::null_mut();
            }
        };
        if desc.has_missing != 0 && desc.has_missing != 1 {
            error!("create_interaction_context: has_missing must be 0 or 1");
            return std::ptr::null_mut();
        }
        if desc.bin_count < 0 || (desc.bin_count == 0 && n_samples != 0) {
            error!(
                "create_interaction_context: bin_count {} is not valid",
                desc.bin_count
            );
            return std::ptr::null_mut();
        }
        let Ok(bin_count) = usize::try_from(desc.bin_count) else {
            error!("create_interaction_context: bin_count too large to index");
            return std::ptr::null_mut();
        };
        feature_list.push(Feature::new(bin_count, kind, desc.has_missing == 1));
    }

    let Some(matrix_len) = n_samples.checked_mul(n_features) else {
        error!("create_interaction_context: binned matrix size overflows");
        return std::ptr::null_mut();
    };
    let matrix = if matrix_len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(binned_matrix, matrix_len)
    };
    let Ok(binned) = ArrayView2::from_shape((n_samples, n_features), matrix) else {
        error!("create_interaction_context: binned matrix shape is inconsistent");
        return std::ptr::null_mut();
    };

    let Some(score_len) = n_samples.checked_mul(shape.vector_len()) else {
        error!("create_interaction_context: prior score length overflows");
        return std::ptr::null_mut();
    };
    let scores = if score_len == 0 {
        Vec::new()
    } else {
        std::slice::from_raw_parts(prior_scores, score_len).to_vec()
    };

    let dataset = match shape {
        TargetShape::Regression => {
            let values = if n_samples == 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts(targets as *const f64, n_samples).to_vec()
            };
            InteractionDataset::regression(feature_list, binned, values, scores)
        }
        TargetShape::Classification { n_classes } => {
            let labels = if n_samples == 0 {
                Vec::new()
            } else {
                std::slice::from_raw_parts(targets as *const i64, n_samples).to_vec()
            };
            InteractionDataset::classification(n_classes, feature_list, binned, labels, scores)
        }
    };

    match dataset {
        Ok(dataset) => Box::into_raw(Box::new(InteractionContext {
            dataset,
            scorer: InteractionScorer::new(),
        })),
        Err(err) => {
            error!("create_interaction_context: {err}");
            std::ptr::null_mut()
        }
    }
}

/// Scores one feature group of the context's dataset.
///
/// Writes the interaction strength to `score_out` (when non-null) and
/// returns 0, including for all score-0 policy paths. Nonzero return
/// values are hard failures: 1 invalid argument, 2 sizing overflow,
/// 3 allocation failure. `min_samples_per_leaf` below 1 is clamped to 1.
///
/// # Safety
///
/// `ctx` must come from [`create_interaction_context`] and not yet be
/// destroyed; `group_feature_indices` must point to `group_len` values;
/// `score_out` must be null or valid for one `f64` write. Contexts are
/// not synchronized - drive each from one thread at a time.
#[no_mangle]
pub unsafe extern "C" fn score_interaction(
    ctx: *mut InteractionContext,
    group_feature_indices: *const i64,
    group_len: u64,
    min_samples_per_leaf: i64,
    score_out: *mut f64,
) -> i64 {
    if !score_out.is_null() {
        *score_out = 0.0;
    }
    if ctx.is_null() {
        error!("score_interaction: ctx cannot be null");
        return STATUS_INVALID_ARGUMENT;
    }
    if group_len != 0 && group_feature_indices.is_null() {
        error!("score_interaction: group_feature_indices cannot be null");
        return STATUS_INVALID_ARGUMENT;
    }
    let Ok(group_len) = usize::try_from(group_len) else {
        error!("score_interaction: group_len too large to index");
        return STATUS_INVALID_ARGUMENT;
    };

    let raw_indices = if group_len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(group_feature_indices, group_len)
    };
    let mut indices = Vec::with_capacity(group_len);
    for &raw in raw_indices {
        let Ok(index) = usize::try_from(raw) else {
            error!("score_interaction: feature index {raw} is not valid");
            return STATUS_INVALID_ARGUMENT;
        };
        indices.push(index);
    }

    let min_samples = if min_samples_per_leaf >= 1 {
        min_samples_per_leaf as u64
    } else {
        warn!("score_interaction: min_samples_per_leaf clamped up to 1");
        1
    };

    let context = &mut *ctx;
    match context
        .scorer
        .score_pair(&context.dataset, &indices, min_samples)
    {
        Ok(score) => {
            if !score_out.is_null() {
                *score_out = score;
            }
            STATUS_OK
        }
        Err(err) => {
            warn!("score_interaction: {err}");
            match err {
                ScoreError::FeatureIndexOutOfRange { .. } => STATUS_INVALID_ARGUMENT,
                ScoreError::AllocationImpossible(_) => STATUS_ALLOCATION_IMPOSSIBLE,
                ScoreError::OutOfMemory { .. } => STATUS_OUT_OF_MEMORY,
            }
        }
    }
}

/// Destroys a context created by [`create_interaction_context`].
///
/// Null is tolerated.
///
/// # Safety
///
/// `ctx` must be null or a live pointer from
/// [`create_interaction_context`]; it must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn destroy_interaction_context(ctx: *mut InteractionContext) {
    if !ctx.is_null() {
        drop(Box::from_raw(ctx));
    }
}
