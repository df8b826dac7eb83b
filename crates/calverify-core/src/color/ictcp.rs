//! ICtCp (ITU-R BT.2100)
//!
//! XYZ → linear Rec.2020 → LMS → PQ → ICtCp.
//! See the Dolby ICtCp white paper.

use crate::color::rgb::{RgbPrimaries, xyz_to_rgb_matrix};
use crate::color::white_point::D65;
use crate::color::Xyz;
use crate::math::gamma::pq_oetf;
use crate::math::Matrix3x3;

/// Linear Rec.2020 RGB → LMS
pub const REC2020_TO_LMS: Matrix3x3 = Matrix3x3::new([
    [1688.0 / 4096.0, 2146.0 / 4096.0, 262.0 / 4096.0],
    [683.0 / 4096.0, 2951.0 / 4096.0, 462.0 / 4096.0],
    [99.0 / 4096.0, 309.0 / 4096.0, 3688.0 / 4096.0],
]);

/// PQ encoded L'M'S' → ICtCp
pub const LMS_TO_ICTCP: Matrix3x3 = Matrix3x3::new([
    [0.5, 0.5, 0.0],
    [6610.0 / 4096.0, -13613.0 / 4096.0, 7003.0 / 4096.0],
    [17933.0 / 4096.0, -17390.0 / 4096.0, -543.0 / 4096.0],
]);

/// ICtCp coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ictcp {
    /// Intensity
    pub i: f64,
    /// Tritan (blue-yellow)
    pub ct: f64,
    /// Protan (red-green)
    pub cp: f64,
}

impl Ictcp {
    #[inline]
    pub const fn new(i: f64, ct: f64, cp: f64) -> Self {
        Self { i, ct, cp }
    }

    #[inline]
    pub const fn to_array(&self) -> [f64; 3] {
        [self.i, self.ct, self.cp]
    }

    /// Convert from linear Rec.2020 RGB (1.0 = 10000 cd/m²)
    pub fn from_linear_rec2020(rgb: [f64; 3]) -> Self {
        let lms = REC2020_TO_LMS.multiply_vec(rgb);
        let [i, ct, cp] = LMS_TO_ICTCP.multiply_vec(lms.map(pq_oetf));
        Self { i, ct, cp }
    }

    /// Convert from D65 relative absolute XYZ (Y = 1.0 is 10000 cd/m²)
    pub fn from_xyz(xyz: Xyz) -> Self {
        let rgb = xyz_to_rgb_matrix(&RgbPrimaries::REC2020, D65, 1.0).multiply_vec(xyz.to_array());
        Self::from_linear_rec2020(rgb)
    }
}
