//! Appearance network: weight matrices, texture packing, reference evaluation.
//!
//! # Invariants
//! - A packed texture is one texel wide; its padding channels are exactly `0.0`.
//! - The reference evaluator reads weights only through texel fetches, in the
//!   same order as the GPU program, so both agree on any packed layout.
//! - Evaluation is deterministic: identical inputs give bit-identical outputs.

mod error;
mod matrix;
mod network;
mod pack;

pub use error::NetworkError;
pub use matrix::WeightMatrix;
pub use network::{AppearanceNetwork, NetworkSpec, INPUT_DIM, OUTPUT_DIM};
pub use pack::{pack, padded_width, PackedWeightTexture};
