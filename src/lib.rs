//! pairgain: interaction-strength scoring for explainable boosting
//! machines.
//!
//! Given a dataset that has already been discretized into integer bins,
//! this crate scores two-feature groups by the best splitting gain of
//! any orthogonal cut pair over the joint bin grid - the signal in the
//! joint distribution beyond the marginals. Scores rank candidate pairs
//! for inclusion in an additive model with pair interactions.
//!
//! # Key Types
//!
//! - [`InteractionDataset`] - binned samples, targets, prior scores, and
//!   derived residual gradients
//! - [`Feature`] / [`FeatureGroup`] - binned-feature descriptors and
//!   tensor axes
//! - [`InteractionScorer`] - one scoring worker with a reusable scratch
//!   arena
//! - [`rank_interactions`] - score every pair of a dataset, best first
//!
//! # Pipeline
//!
//! One score is: accumulate per-bin gradient histograms over the pair's
//! 2-D grid, rewrite them in place into prefix-sum totals, then sweep
//! every cut pair recovering quadrant statistics in O(1) per candidate.
//! See the [`histograms`] and [`sweep`] modules.
//!
//! # C ABI
//!
//! The [`capi`] module exposes the create/score/destroy surface for host
//! languages.

pub mod capi;
pub mod data;
pub mod features;
pub mod histograms;
pub mod score;
pub mod sweep;
pub mod targets;
pub mod testing;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

pub use data::{DatasetError, InteractionDataset, Targets};
pub use features::{Feature, FeatureGroup, FeatureKind, MAX_DIMENSIONS};
pub use score::{rank_interactions, InteractionScorer, PairScore, ScoreError};
pub use targets::TargetShape;
pub use utils::Parallelism;
