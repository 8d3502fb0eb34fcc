//! Target shape: what kind of prediction task the residuals came from.
//!
//! The shape decides the per-sample statistics vector length and whether
//! histogram bins carry a Newton denominator channel next to each
//! gradient channel.

/// Largest class count with a dedicated monomorphized kernel.
///
/// Class counts above this fall back to the dynamic kernels that read the
/// vector length at runtime.
pub const MAX_SPECIALIZED_CLASSES: usize = 8;

/// The prediction task the prior scores and targets describe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetShape {
    /// Continuous target, single residual channel.
    Regression,
    /// `n_classes` discrete classes. Counts of 0 and 1 are degenerate
    /// (the outcome is already certain) and score zero; 2 uses the
    /// single-logit representation.
    Classification { n_classes: usize },
}

impl TargetShape {
    /// Maps the wire-level class count: `-1` regression, `>= 0`
    /// classification. Anything below `-1` is rejected.
    pub fn from_class_count(class_count: i64) -> Option<Self> {
        match class_count {
            -1 => Some(TargetShape::Regression),
            n if n >= 0 => Some(TargetShape::Classification {
                n_classes: n as usize,
            }),
            _ => None,
        }
    }

    /// Per-sample statistics vector length.
    ///
    /// Binary classification uses a single logit, so its vector length is
    /// 1 just like regression; only 3 or more classes widen the vector.
    #[inline]
    pub fn vector_len(&self) -> usize {
        match *self {
            TargetShape::Regression => 1,
            TargetShape::Classification { n_classes } => {
                if n_classes <= 2 {
                    1
                } else {
                    n_classes
                }
            }
        }
    }

    /// Whether bins carry a denominator channel per gradient channel.
    #[inline]
    pub fn has_denominator(&self) -> bool {
        matches!(self, TargetShape::Classification { .. })
    }

    /// A 0- or 1-class target is perfectly predictable; no interaction
    /// can add signal.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        matches!(self, TargetShape::Classification { n_classes } if *n_classes <= 1)
    }
}

/// Newton-step denominator derived from a classification residual.
///
/// For a residual `r = p - onehot`, `|r| * (1 - |r|)` equals `p * (1 - p)`
/// whether or not the channel is the target class, so the denominator can
/// be recovered from the residual alone.
#[inline]
pub fn newton_denominator(residual: f64) -> f64 {
    let a = residual.abs();
    a * (1.0 - a)
}
