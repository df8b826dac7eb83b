//! Mathematical operations for colorimetry
//!
//! This module provides foundational math operations used throughout calverify:
//! - 3x3 matrix operations
//! - Transfer functions (sRGB, PQ)
//! - Chromatic adaptation
//! - Statistical reductions and display rounding

pub mod chromatic_adaptation;
pub mod gamma;
pub mod matrix;
pub mod rounding;
pub mod stats;

pub use chromatic_adaptation::{CatMatrix, adapt_xyz, adaptation_matrix};
pub use gamma::{pq_eotf, pq_oetf, srgb_gamma_decode, srgb_gamma_encode};
pub use matrix::Matrix3x3;
pub use rounding::{round_half_up, round_to, zero_pad};
pub use stats::Flatten;
