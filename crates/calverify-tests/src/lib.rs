//! # calverify-tests
//!
//! Verification harness for calverify.
//!
//! This crate provides:
//! - Cross-checks of Lab/XYZ conversion and CIEDE2000 against `palette`
//! - Seeded random samples for property tests
//! - CGATS fixtures for end-to-end report scenarios
//! - ΔE summary statistics for diagnostics

pub mod accuracy;
pub mod fixtures;
pub mod reference;
pub mod samples;

pub use accuracy::DeltaEStats;
pub use fixtures::{FixtureError, fixture_path, load_dataset};
