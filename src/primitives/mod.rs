//! Core compute primitives.
//!
//! Vectors are plain `[f64]` slices; the dense [`Matrix`] backs covariance
//! and correlation matrices.

mod matrix;

pub use matrix::{dot, norm, Matrix};
