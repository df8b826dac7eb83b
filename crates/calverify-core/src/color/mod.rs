//! Color space types and conversions
//!
//! This module provides:
//! - CIE XYZ, xyY, L*a*b*, L*u'v'
//! - ICtCp (BT.2100 PQ)
//! - sRGB and CMYK device values
//! - Standard illuminants and white point resolution
//! - Daylight/planckian loci and correlated color temperature

pub mod cct;
pub mod ictcp;
pub mod lab;
pub mod luv;
pub mod rgb;
pub mod white_point;
pub mod xyy;
pub mod xyz;

pub use cct::{
    daylight_locus_xyy, daylight_locus_xyz, planckian_locus_xyy, planckian_locus_xyz,
    robertson_cct, robertson_cct_raw,
};
pub use ictcp::Ictcp;
pub use lab::Lab;
pub use luv::Luv;
pub use rgb::{
    RgbEncoding, RgbMatrixCache, RgbPrimaries, cmyk_to_rgb, lab_to_srgb, xyz_to_rgb_matrix,
    xyz_to_srgb,
};
pub use white_point::{
    D50, D65, LabWhite, Whitepoint, WhitepointResolver, resolve_whitepoint, standard_illuminant,
};
pub use xyy::{XyY, xyy_to_xyz};
pub use xyz::Xyz;
