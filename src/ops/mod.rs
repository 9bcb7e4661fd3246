//! Pure numeric kernels behind the layers.

pub mod conditional;

pub use conditional::{Conditionals, JointTable, DEFAULT_EPSILON};
