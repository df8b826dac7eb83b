//! # calverify-core
//!
//! Colorimetric building blocks for verifying display and print calibration.
//!
//! ## Contents
//!
//! - **Color spaces**: XYZ, xyY, L*a*b*, L*u'v', ICtCp, sRGB and CMYK
//! - **White points**: standard illuminants, daylight CCT, explicit XYZ
//! - **Chromatic adaptation**: Bradford, CAT02, CMCCAT2000 and other cone matrices
//! - **Color difference**: CIE76, CIE94, CMC(l:c), CIEDE2000, ΔICtCp
//! - **Statistics**: reductions over nested numeric data
//!
//! ## Quick Start
//!
//! ```
//! use calverify_core::{DeltaMethod, Lab, delta};
//!
//! let reference = Lab::new(50.0, 2.6772, -79.7751);
//! let sample = Lab::new(50.0, 0.0, -82.7485);
//! let d = delta(reference, sample, &DeltaMethod::CIE2000);
//! assert!((d.e - 2.0425).abs() < 1e-4);
//! ```
//!
//! ```
//! use calverify_core::{Whitepoint, resolve_whitepoint};
//!
//! let spec: Whitepoint = "D65".parse().unwrap();
//! let d65 = resolve_whitepoint(&spec, 100.0).unwrap();
//! assert!((d65.x - 95.047).abs() < 1e-2);
//! ```

pub mod color;
pub mod delta;
pub mod error;
pub mod math;

pub use color::{
    D50, D65, Ictcp, Lab, LabWhite, Luv, RgbEncoding, RgbMatrixCache, RgbPrimaries, Whitepoint,
    WhitepointResolver, XyY, Xyz, resolve_whitepoint,
};
pub use delta::{Delta, DeltaFamily, DeltaMethod, IctcpContext, delta, delta_e};
pub use error::{Error, Result};
pub use math::{CatMatrix, Matrix3x3};

/// Version of calverify-core
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
