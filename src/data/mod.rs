//! Binned sample data for interaction scoring.
//!
//! - [`InteractionDataset`] - validated, immutable view of binned
//!   samples, targets, prior scores, and derived residual gradients
//! - [`BinColumn`] / [`BinColumnView`] - width-typed per-feature bin
//!   storage

pub mod columns;
pub mod dataset;

pub use columns::{BinColumn, BinColumnView};
pub use dataset::{DatasetError, InteractionDataset, Targets};
