//! CIE xyY chromaticity coordinates

use crate::color::Xyz;

/// Chromaticity (x, y) plus luminance Y
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XyY {
    /// x chromaticity
    pub x: f64,
    /// y chromaticity
    pub y: f64,
    /// Luminance
    pub big_y: f64,
}

impl XyY {
    #[inline]
    pub const fn new(x: f64, y: f64, big_y: f64) -> Self {
        Self { x, y, big_y }
    }

    #[inline]
    pub const fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.big_y]
    }

    /// Convert XYZ to xyY
    ///
    /// Black (X = Y = Z = 0) takes the chromaticity of `white` with Y = 0.
    pub fn from_xyz(xyz: Xyz, white: Xyz) -> Self {
        if xyz.x == 0.0 && xyz.y == 0.0 && xyz.z == 0.0 {
            let sum = white.sum();
            return Self::new(white.x / sum, white.y / sum, 0.0);
        }
        let sum = xyz.sum();
        Self::new(xyz.x / sum, xyz.y / sum, xyz.y)
    }

    /// Convert to XYZ
    #[inline]
    pub fn to_xyz(&self) -> Xyz {
        xyy_to_xyz(self.x, self.y, self.big_y)
    }
}

/// Convert xyY to XYZ
///
/// `y = 0` yields black.
#[inline]
pub fn xyy_to_xyz(x: f64, y: f64, big_y: f64) -> Xyz {
    if y == 0.0 {
        return Xyz::new(0.0, 0.0, 0.0);
    }
    Xyz::new(x * big_y / y, big_y, (1.0 - x - y) * big_y / y)
}

/// Const variant of [`xyy_to_xyz`] for Y = 1, used for white point tables
pub(crate) const fn xy_to_xyz_unit(x: f64, y: f64) -> Xyz {
    Xyz::new(x / y, 1.0, (1.0 - x - y) / y)
}
