//! CIE L*u'v' (CIE 1976 UCS chromaticity with L*)

use crate::color::lab::{CIE_E, CIE_K};
use crate::color::white_point::scale_white;
use crate::color::Xyz;

/// L* plus u'v' chromaticity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Luv {
    /// Lightness (0 to 100)
    pub l: f64,
    /// u' chromaticity
    pub u: f64,
    /// v' chromaticity
    pub v: f64,
}

impl Luv {
    #[inline]
    pub const fn new(l: f64, u: f64, v: f64) -> Self {
        Self { l, u, v }
    }

    #[inline]
    pub const fn to_array(&self) -> [f64; 3] {
        [self.l, self.u, self.v]
    }

    /// Convert XYZ (Y nominally 0..100) to L*u'v'
    ///
    /// When X + Y + Z = 0 the result is `[0, u'w, v'w]` of the white point.
    pub fn from_xyz(xyz: Xyz, white: Xyz) -> Self {
        if xyz.sum() == 0.0 {
            let w = Self::from_xyz(white, white);
            return Self::new(0.0, w.u, w.v);
        }
        let yr = xyz.y / scale_white(white, 100.0).y;
        let l = if yr > CIE_E {
            116.0 * yr.cbrt() - 16.0
        } else {
            CIE_K * yr
        };
        let denom = xyz.x + 15.0 * xyz.y + 3.0 * xyz.z;
        Self::new(l, 4.0 * xyz.x / denom, 9.0 * xyz.y / denom)
    }
}
