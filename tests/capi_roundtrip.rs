//! Drives the C ABI surface the way a host binding would: create a
//! context, score groups, destroy it - including the error and policy
//! paths.

use std::ptr;

use pairgain::capi::{
    create_interaction_context, destroy_interaction_context, score_interaction, FeatureDesc,
};

fn desc(bin_count: i64) -> FeatureDesc {
    FeatureDesc {
        bin_count,
        kind: 0,
        has_missing: 0,
    }
}

#[test]
fn regression_xor_round_trip() {
    let features = [desc(2), desc(2)];
    let binned: [i64; 8] = [0, 0, 0, 1, 1, 0, 1, 1];
    let targets: [f64; 4] = [1.0, -1.0, -1.0, 1.0];
    let scores = [0.0f64; 4];

    unsafe {
        let ctx = create_interaction_context(
            -1,
            2,
            features.as_ptr(),
            4,
            binned.as_ptr(),
            targets.as_ptr() as *const _,
            scores.as_ptr(),
        );
        assert!(!ctx.is_null());

        let group: [i64; 2] = [0, 1];
        let mut score = f64::NAN;
        let status = score_interaction(ctx, group.as_ptr(), 2, 1, &mut score);
        assert_eq!(status, 0);
        assert_eq!(score, 4.0);

        // a repeat call reuses the context's arena and must agree
        let mut again = 0.0f64;
        assert_eq!(score_interaction(ctx, group.as_ptr(), 2, 1, &mut again), 0);
        assert_eq!(score.to_bits(), again.to_bits());

        destroy_interaction_context(ctx);
    }
}

#[test]
fn multiclass_matches_rust_api() {
    let features = [desc(2), desc(2)];
    let binned: [i64; 10] = [0, 0, 0, 1, 1, 0, 1, 1, 1, 1];
    let labels: [i64; 5] = [0, 1, 2, 0, 1];
    let scores = [0.25f64; 15];

    let expected = {
        use ndarray::ArrayView2;
        let view = ArrayView2::from_shape((5, 2), &binned[..]).unwrap();
        let ds = pairgain::InteractionDataset::classification(
            3,
            vec![
                pairgain::Feature::ordinal(2),
                pairgain::Feature::ordinal(2),
            ],
            view,
            labels.to_vec(),
            scores.to_vec(),
        )
        .unwrap();
        pairgain::InteractionScorer::new()
            .score_pair(&ds, &[0, 1], 1)
            .unwrap()
    };

    unsafe {
        let ctx = create_interaction_context(
            3,
            2,
            features.as_ptr(),
            5,
            binned.as_ptr(),
            labels.as_ptr() as *const _,
            scores.as_ptr(),
        );
        assert!(!ctx.is_null());

        let group: [i64; 2] = [0, 1];
        let mut score = 0.0f64;
        assert_eq!(score_interaction(ctx, group.as_ptr(), 2, 1, &mut score), 0);
        assert_eq!(score.to_bits(), expected.to_bits());

        destroy_interaction_context(ctx);
    }
}

#[test]
fn policy_zero_paths_report_success() {
    // feature 1 is degenerate (single bin)
    let features = [desc(2), desc(1)];
    let binned: [i64; 4] = [0, 0, 1, 0];
    let targets: [f64; 2] = [1.0, -1.0];
    let scores = [0.0f64; 2];

    unsafe {
        let ctx = create_interaction_context(
            -1,
            2,
            features.as_ptr(),
            2,
            binned.as_ptr(),
            targets.as_ptr() as *const _,
            scores.as_ptr(),
        );
        assert!(!ctx.is_null());

        let mut score = f64::NAN;

        // degenerate axis
        let group: [i64; 2] = [0, 1];
        assert_eq!(score_interaction(ctx, group.as_ptr(), 2, 1, &mut score), 0);
        assert_eq!(score, 0.0);

        // unsupported group width
        let single: [i64; 1] = [0];
        score = f64::NAN;
        assert_eq!(score_interaction(ctx, single.as_ptr(), 1, 1, &mut score), 0);
        assert_eq!(score, 0.0);

        // empty group
        score = f64::NAN;
        assert_eq!(score_interaction(ctx, ptr::null(), 0, 1, &mut score), 0);
        assert_eq!(score, 0.0);

        // min_samples_per_leaf below 1 is clamped, not an error
        let both: [i64; 2] = [0, 0];
        score = f64::NAN;
        assert_eq!(score_interaction(ctx, both.as_ptr(), 2, 0, &mut score), 0);

        destroy_interaction_context(ctx);
    }
}

#[test]
fn invalid_arguments_are_rejected() {
    unsafe {
        // class_count below -1
        let ctx = create_interaction_context(
            -2,
            0,
            ptr::null(),
            0,
            ptr::null(),
            ptr::null(),
            ptr::null(),
        );
        assert!(ctx.is_null());

        // invalid feature kind
        let bad_kind = [FeatureDesc {
            bin_count: 2,
            kind: 7,
            has_missing: 0,
        }];
        let ctx = create_interaction_context(
            -1,
            1,
            bad_kind.as_ptr(),
            0,
            ptr::null(),
            ptr::null(),
            ptr::null(),
        );
        assert!(ctx.is_null());

        // null targets with samples present
        let features = [desc(2)];
        let binned: [i64; 1] = [0];
        let scores = [0.0f64; 1];
        let ctx = create_interaction_context(
            -1,
            1,
            features.as_ptr(),
            1,
            binned.as_ptr(),
            ptr::null(),
            scores.as_ptr(),
        );
        assert!(ctx.is_null());

        // null context on the scoring path
        let group: [i64; 2] = [0, 1];
        let mut score = f64::NAN;
        let status = score_interaction(ptr::null_mut(), group.as_ptr(), 2, 1, &mut score);
        assert_eq!(status, 1);
        assert_eq!(score, 0.0);
    }
}

#[test]
fn bad_feature_index_is_invalid_argument() {
    let features = [desc(2), desc(2)];
    let binned: [i64; 4] = [0, 0, 1, 1];
    let targets: [f64; 2] = [1.0, -1.0];
    let scores = [0.0f64; 2];

    unsafe {
        let ctx = create_interaction_context(
            -1,
            2,
            features.as_ptr(),
            2,
            binned.as_ptr(),
            targets.as_ptr() as *const _,
            scores.as_ptr(),
        );
        assert!(!ctx.is_null());

        let mut score = f64::NAN;

        let negative: [i64; 2] = [0, -1];
        assert_eq!(
            score_interaction(ctx, negative.as_ptr(), 2, 1, &mut score),
            1
        );
        assert_eq!(score, 0.0);

        let out_of_range: [i64; 2] = [0, 9];
        score = f64::NAN;
        assert_eq!(
            score_interaction(ctx, out_of_range.as_ptr(), 2, 1, &mut score),
            1
        );
        assert_eq!(score, 0.0);

        destroy_interaction_context(ctx);
    }
}

#[test]
fn sizing_overflow_reports_allocation_impossible() {
    let huge = (usize::MAX / 2) as i64;
    let features = [desc(huge), desc(huge)];
    let binned: [i64; 2] = [0, 0];
    let targets: [f64; 1] = [1.0];
    let scores = [0.0f64; 1];

    unsafe {
        let ctx = create_interaction_context(
            -1,
            2,
            features.as_ptr(),
            1,
            binned.as_ptr(),
            targets.as_ptr() as *const _,
            scores.as_ptr(),
        );
        assert!(!ctx.is_null());

        let group: [i64; 2] = [0, 1];
        let mut score = f64::NAN;
        let status = score_interaction(ctx, group.as_ptr(), 2, 1, &mut score);
        assert_eq!(status, 2);
        assert_eq!(score, 0.0);

        destroy_interaction_context(ctx);
    }
}

#[test]
fn destroy_tolerates_null() {
    unsafe {
        destroy_interaction_context(ptr::null_mut());
    }
}
