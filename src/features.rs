//! Feature descriptors and feature groups.
//!
//! A [`Feature`] describes one already-binned column: how many discrete
//! bins it has, whether the bins are ordered, and whether a missing-value
//! bin is present. A [`FeatureGroup`] is an ordered tuple of features that
//! defines the axes of a histogram tensor.

/// Maximum tensor dimensionality.
///
/// One bit of a linear index word is reserved for manipulation space, so a
/// tensor can never have more dimensions than the host word has bits minus
/// one. Even minimal 2-bin axes would overflow the address space long
/// before this limit is reached.
pub const MAX_DIMENSIONS: usize = (usize::BITS - 1) as usize;

/// Whether a feature's bins carry an ordering.
///
/// Histogram accumulation is identical for both kinds; the distinction
/// matters to upstream binning and downstream model shaping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeatureKind {
    /// Bins are ordered (numeric cuts).
    Ordinal,
    /// Bins are unordered categories.
    Nominal,
}

/// Immutable descriptor of one binned feature.
///
/// Features own no sample data; they describe the shape of a column held
/// by an [`InteractionDataset`](crate::data::InteractionDataset). A
/// feature must outlive every tensor built over it.
#[derive(Clone, Debug)]
pub struct Feature {
    bin_count: usize,
    kind: FeatureKind,
    has_missing: bool,
}

impl Feature {
    pub fn new(bin_count: usize, kind: FeatureKind, has_missing: bool) -> Self {
        Self {
            bin_count,
            kind,
            has_missing,
        }
    }

    /// Shorthand for an ordinal feature without a missing bin.
    pub fn ordinal(bin_count: usize) -> Self {
        Self::new(bin_count, FeatureKind::Ordinal, false)
    }

    #[inline]
    pub fn bin_count(&self) -> usize {
        self.bin_count
    }

    #[inline]
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Whether bin 0 is reserved for missing values.
    ///
    /// Currently accepted but not acted upon; the binning layer does not
    /// emit a dedicated missing bin yet.
    #[inline]
    pub fn has_missing(&self) -> bool {
        self.has_missing
    }

    /// A feature with fewer than two bins carries no signal: every sample
    /// lands in the same bin.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.bin_count <= 1
    }
}

// =============================================================================
// Bit packing
// =============================================================================

/// Storage-width descriptor for a group's bin indices.
///
/// Records how many bits one bin index needs for the widest axis of a
/// group, and how many such items fit into a 64-bit storage word. The
/// boosting sibling uses this for coalesced per-sample packing; the
/// interaction path uses it to pick the narrowest per-column integer
/// width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitPack {
    bits_per_item: u32,
    items_per_word: u32,
}

impl BitPack {
    /// Descriptor for bin indices in `[0, bin_count)`.
    pub fn for_bin_count(bin_count: usize) -> Self {
        let bits_per_item = if bin_count <= 2 {
            1
        } else {
            usize::BITS - (bin_count - 1).leading_zeros()
        };
        Self {
            bits_per_item,
            items_per_word: u64::BITS / bits_per_item,
        }
    }

    #[inline]
    pub fn bits_per_item(&self) -> u32 {
        self.bits_per_item
    }

    #[inline]
    pub fn items_per_word(&self) -> u32 {
        self.items_per_word
    }
}

// =============================================================================
// Feature groups
// =============================================================================

/// One axis of a feature group: a feature and its column index in the
/// dataset it was taken from.
#[derive(Clone, Copy, Debug)]
pub struct FeatureGroupEntry<'a> {
    pub index: usize,
    pub feature: &'a Feature,
}

/// An ordered tuple of features defining the axes of a histogram tensor.
///
/// Axis 0 is the fastest-varying dimension: the linear index of bin
/// coordinates `(i_0, .., i_{D-1})` is `sum(i_j * prod(bins_k for k < j))`.
/// A group owns no feature memory and is cheap to build per scoring call.
#[derive(Clone, Debug)]
pub struct FeatureGroup<'a> {
    entries: Vec<FeatureGroupEntry<'a>>,
    pack: BitPack,
}

impl<'a> FeatureGroup<'a> {
    /// Builds a group over the given axes.
    ///
    /// # Panics
    ///
    /// Panics if the group is empty or exceeds [`MAX_DIMENSIONS`]. Every
    /// entry must have at least two bins; callers filter degenerate
    /// features before constructing a group.
    pub fn new(entries: Vec<FeatureGroupEntry<'a>>) -> Self {
        assert!(
            !entries.is_empty() && entries.len() <= MAX_DIMENSIONS,
            "feature group must have between 1 and {} axes",
            MAX_DIMENSIONS
        );
        debug_assert!(entries.iter().all(|e| e.feature.bin_count() >= 2));

        let widest = entries
            .iter()
            .map(|e| e.feature.bin_count())
            .max()
            .unwrap_or(0);
        let pack = BitPack::for_bin_count(widest);
        Self { entries, pack }
    }

    #[inline]
    pub fn dimension_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn entries(&self) -> &[FeatureGroupEntry<'a>] {
        &self.entries
    }

    #[inline]
    pub fn bin_count(&self, axis: usize) -> usize {
        self.entries[axis].feature.bin_count()
    }

    /// Per-axis bin counts, axis 0 first.
    pub fn bin_counts(&self) -> Vec<usize> {
        self.entries
            .iter()
            .map(|e| e.feature.bin_count())
            .collect()
    }

    /// Total number of tensor bins, or `None` if the product overflows.
    pub fn checked_tensor_len(&self) -> Option<usize> {
        self.entries
            .iter()
            .try_fold(1usize, |acc, e| acc.checked_mul(e.feature.bin_count()))
    }

    #[inline]
    pub fn pack(&self) -> BitPack {
        self.pack
    }
}

// =============================================================================
// Tests
// =============================================================================
