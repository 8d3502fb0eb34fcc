//! Prefix-sum tensor totals.
//!
//! [`build_totals`] rewrites a per-bin histogram tensor in place so that
//! every cell holds the inclusive sum over all coordinates at or below
//! its own on every axis. After the build, any axis-aligned box can be
//! recovered with [`query_box`] in `2^D` lookups regardless of bin
//! counts.
//!
//! The build runs one pass per axis. Within a pass, each cell absorbs its
//! predecessor along that axis; the predecessor was finalized earlier in
//! the same pass, and no other cell is touched, which is what makes the
//! in-place rewrite sound.

use crate::histograms::bin::{span_add, span_add_signed, BinLayout, BinRef};

/// Rewrites `tensor` into inclusive prefix sums along every axis.
///
/// `bin_counts` are the axis lengths, axis 0 fastest. Pass order does not
/// affect the result: additive prefixes on orthogonal axes commute.
pub fn build_totals(tensor: &mut [u64], layout: BinLayout, bin_counts: &[usize]) {
    let wpb = layout.words_per_bin();
    let total: usize = bin_counts.iter().product();
    debug_assert_eq!(tensor.len(), total * wpb);

    let mut stride = 1usize;
    for &bins in bin_counts {
        for idx in 0..total {
            let coord = (idx / stride) % bins;
            if coord == 0 {
                continue;
            }
            let dst = idx * wpb;
            let src = (idx - stride) * wpb;
            let (lo, hi) = tensor.split_at_mut(dst);
            span_add(&mut hi[..wpb], &lo[src..src + wpb]);
        }
        stride *= bins;
    }
}

/// The cell at maximal coordinates: after [`build_totals`] it holds the
/// sum of every pre-build cell.
pub fn grand_total<'a>(tensor: &'a [u64], layout: BinLayout, bin_counts: &[usize]) -> BinRef<'a> {
    let total: usize = bin_counts.iter().product();
    BinRef::at(tensor, layout, total - 1)
}

/// Sums the axis-aligned box described by `low` and `high_mask` into
/// `out` (one bin span, overwritten).
///
/// Axis `k` covers `[0, low[k]]` when bit `k` of `high_mask` is clear and
/// `[low[k] + 1, bins_k - 1]` when it is set. The sum is the standard
/// `2^D` inclusion-exclusion over the corners of the box: each subset of
/// the set bits picks the low corner on those axes, signed by the parity
/// of the number of lowered axes.
pub fn query_box(
    tensor: &[u64],
    layout: BinLayout,
    bin_counts: &[usize],
    low: &[usize],
    high_mask: usize,
    out: &mut [u64],
) {
    let dims = bin_counts.len();
    let wpb = layout.words_per_bin();
    debug_assert!(dims <= crate::features::MAX_DIMENSIONS);
    debug_assert_eq!(low.len(), dims);
    debug_assert_eq!(out.len(), wpb);
    debug_assert!(high_mask < (1usize << dims));
    debug_assert!(low
        .iter()
        .zip(bin_counts)
        .enumerate()
        .all(|(k, (&l, &b))| l < b - ((high_mask >> k) & 1)));

    // Stack-resident strides: this runs in the sweep's inner loop.
    let mut strides = [1usize; crate::features::MAX_DIMENSIONS];
    for k in 1..dims {
        strides[k] = strides[k - 1] * bin_counts[k - 1];
    }

    out.fill(0);

    // Descending subset enumeration of the set bits: `keep` holds the
    // axes still at their high edge for this corner.
    let mut keep = high_mask;
    loop {
        let mut idx = 0usize;
        for k in 0..dims {
            let coord = if (high_mask >> k) & 1 == 0 || (keep >> k) & 1 == 0 {
                low[k]
            } else {
                bin_counts[k] - 1
            };
            idx += coord * strides[k];
        }
        let lowered = (high_mask ^ keep).count_ones();
        let corner = &tensor[idx * wpb..(idx + 1) * wpb];
        span_add_signed(out, corner, lowered & 1 == 1);

        if keep == 0 {
            break;
        }
        keep = (keep - 1) & high_mask;
    }

    debug_assert!((out[0] as i64) >= 0);
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::histograms::bin::BinMut;
    use crate::targets::TargetShape;

    fn layout() -> BinLayout {
        BinLayout::for_shape(TargetShape::Regression).unwrap()
    }

    /// Builds a tensor where bin `i` holds count `i + 1` and gradient
    /// exactly `base + i` (integer sums stay exact under any addition
    /// order).
    fn fill_tensor(bin_counts: &[usize], base: f64) -> Vec<u64> {
        let layout = layout();
        let total: usize = bin_counts.iter().product();
        let mut tensor = vec![0u64; total * layout.words_per_bin()];
        for i in 0..total {
            let mut bin = BinMut::at(&mut tensor, layout, i);
            bin.add_sample::<1, false>(&[base + i as f64]);
            for _ in 0..i {
                bin.add_sample::<1, false>(&[0.0]);
            }
        }
        tensor
    }

    fn coords(idx: usize, bin_counts: &[usize]) -> Vec<usize> {
        let mut c = Vec::with_capacity(bin_counts.len());
        let mut rest = idx;
        for &b in bin_counts {
            c.push(rest % b);
            rest /= b;
        }
        c
    }

    /// Brute-force prefix value at `at` from the pre-build tensor.
    fn brute_prefix(pre: &[u64], bin_counts: &[usize], at: &[usize]) -> (u64, f64) {
        let layout = layout();
        let total: usize = bin_counts.iter().product();
        let mut count = 0u64;
        let mut grad = 0.0f64;
        for i in 0..total {
            let c = coords(i, bin_counts);
            if c.iter().zip(at).all(|(ci, ai)| ci <= ai) {
                let bin = BinRef::at(pre, layout, i);
                count += bin.sample_count();
                grad += bin.sum_gradient(0);
            }
        }
        (count, grad)
    }

    #[test]
    fn prefix_build_matches_brute_force_2d() {
        let bins = [3usize, 4];
        let pre = fill_tensor(&bins, 10.0);
        let mut tensor = pre.clone();
        build_totals(&mut tensor, layout(), &bins);

        for i in 0..12 {
            let at = coords(i, &bins);
            let (count, grad) = brute_prefix(&pre, &bins, &at);
            let bin = BinRef::at(&tensor, layout(), i);
            assert_eq!(bin.sample_count(), count, "count at {:?}", at);
            assert!((bin.sum_gradient(0) - grad).abs() < 1e-9, "grad at {:?}", at);
        }
    }

    #[test]
    fn prefix_build_matches_brute_force_3d() {
        let bins = [2usize, 3, 2];
        let pre = fill_tensor(&bins, -4.0);
        let mut tensor = pre.clone();
        build_totals(&mut tensor, layout(), &bins);

        for i in 0..12 {
            let at = coords(i, &bins);
            let (count, grad) = brute_prefix(&pre, &bins, &at);
            let bin = BinRef::at(&tensor, layout(), i);
            assert_eq!(bin.sample_count(), count);
            assert!((bin.sum_gradient(0) - grad).abs() < 1e-9);
        }
    }

    #[test]
    fn grand_total_is_whole_tensor_sum() {
        let bins = [3usize, 4];
        let pre = fill_tensor(&bins, 2.0);
        let mut tensor = pre.clone();
        build_totals(&mut tensor, layout(), &bins);

        let (count, grad) = brute_prefix(&pre, &bins, &[2, 3]);
        let total = grand_total(&tensor, layout(), &bins);
        assert_eq!(total.sample_count(), count);
        assert!((total.sum_gradient(0) - grad).abs() < 1e-9);
    }

    #[test]
    fn query_matches_brute_force_over_all_masks() {
        let layout = layout();
        let bins = [3usize, 4];
        let pre = fill_tensor(&bins, 5.0);
        let mut tensor = pre.clone();
        build_totals(&mut tensor, layout, &bins);

        let mut out = vec![0u64; layout.words_per_bin()];
        for l0 in 0..2 {
            for l1 in 0..3 {
                for mask in 0..4usize {
                    query_box(&tensor, layout, &bins, &[l0, l1], mask, &mut out);

                    // brute-force re-accumulation over the named box
                    let r0 = if mask & 1 == 0 { 0..=l0 } else { l0 + 1..=2 };
                    let r1 = if mask & 2 == 0 { 0..=l1 } else { l1 + 1..=3 };
                    let mut count = 0u64;
                    let mut grad = 0.0f64;
                    for i0 in r0 {
                        for i1 in r1.clone() {
                            let bin = BinRef::at(&pre, layout, i0 + 3 * i1);
                            count += bin.sample_count();
                            grad += bin.sum_gradient(0);
                        }
                    }

                    let got = BinRef::new(&out, layout);
                    assert_eq!(
                        got.sample_count(),
                        count,
                        "count at low=({l0},{l1}) mask={mask:#b}"
                    );
                    assert!(
                        (got.sum_gradient(0) - grad).abs() < 1e-9,
                        "grad at low=({l0},{l1}) mask={mask:#b}"
                    );
                }
            }
        }
    }

    #[test]
    fn pass_order_is_irrelevant() {
        let layout = layout();
        let bins_fwd = [3usize, 4];
        let pre = fill_tensor(&bins_fwd, 1.0);

        let mut forward = pre.clone();
        build_totals(&mut forward, layout, &bins_fwd);

        // run the axis passes by hand in the opposite order
        let mut reversed = pre.clone();
        let wpb = layout.words_per_bin();
        for (stride, bins) in [(3usize, 4usize), (1, 3)] {
            for idx in 0..12 {
                let coord = (idx / stride) % bins;
                if coord == 0 {
                    continue;
                }
                let dst = idx * wpb;
                let src = (idx - stride) * wpb;
                let (lo, hi) = reversed.split_at_mut(dst);
                crate::histograms::bin::span_add(&mut hi[..wpb], &lo[src..src + wpb]);
            }
        }

        assert_eq!(forward, reversed);
    }
}
