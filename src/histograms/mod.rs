//! Binned histogram tensors over scratch memory.
//!
//! - [`bin`] - bin word layout and typed views
//! - [`arena`] - reusable per-worker scratch buffer
//! - [`ops`] - sample-scan accumulation kernels
//! - [`totals`] - in-place prefix-sum build and box queries

pub mod arena;
pub mod bin;
pub mod ops;
pub mod totals;

pub use arena::ScratchArena;
pub use bin::{BinLayout, BinMut, BinRef, GradientPair};
pub use ops::build_histograms;
pub use totals::{build_totals, grand_total, query_box};
