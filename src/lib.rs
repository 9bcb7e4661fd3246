//! # joint-conditional - Joint-to-Conditional normalization layer
//!
//! Turns a per-class 2x2 joint table `(q00, q01, q10, q11)` into the four
//! conditionals `p00 = q00/(q00+q10)`, `p01 = q01/(q01+q11)`,
//! `p10 = q10/(q00+q10)` and `p11 = q11/(q01+q11)`, and back-propagates
//! gradients through that normalization. Every denominator carries an
//! additive `epsilon` so empty pairs map to zero instead of dividing by zero.
//!
//! ## Quick Start
//!
//! ```rust
//! use joint_conditional::blob::Blob;
//! use joint_conditional::layers::{JointToConditionalLayer, LayerTrait};
//!
//! // One class: q00 = 0.3, q01 = 0.2, q10 = 0.1, q11 = 0.4
//! let mut bottom = vec![Blob::from_data(&[1, 1, 4, 1], vec![0.3, 0.2, 0.1, 0.4]).unwrap()];
//! let mut top = vec![Blob::default(); 4];
//!
//! let mut layer = JointToConditionalLayer::new();
//! layer.setup_blobs(&bottom, &mut top).unwrap();
//! layer.forward(&bottom, &mut top).unwrap();
//! assert!((top[0].data()[0] - 0.75).abs() < 1e-9);
//!
//! // Gradient of p00 only
//! top[0].fill_diff(1.0);
//! layer.backward(&top, &[true], &mut bottom).unwrap();
//! assert!((bottom[0].diff()[0] - 0.1 / 0.16).abs() < 1e-9);
//! ```
//!
//! ## Module Organization
//!
//! - [`blob`] - Shaped data/gradient buffers shared with the graph runtime
//! - [`builders`] - Builder patterns for convenient layer construction
//! - [`config`] - Serde layer configuration
//! - [`debug`] - Gradient checking and numerical issue detection
//! - [`error`] - Error types and result handling
//! - [`layers`] - The layer trait, the JointToConditional layer and the layer registry
//! - [`ops`] - Pure forward/backward kernels

pub mod blob;
pub mod builders;
pub mod config;
pub mod debug;
pub mod error;
pub mod layers;
pub mod ops;

#[cfg(test)]
mod tests;
