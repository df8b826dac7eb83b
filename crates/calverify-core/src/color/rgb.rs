//! RGB and CMYK device values
//!
//! XYZ → RGB goes through a matrix derived from the primaries' chromaticities
//! and the white point (Lindbloom's RGB/XYZ matrix method).

use std::collections::HashMap;

use crate::color::white_point::{D65, LabWhite, scale_white};
use crate::color::xyy::xyy_to_xyz;
use crate::color::{Lab, Xyz};
use crate::math::chromatic_adaptation::{CatMatrix, adapt_xyz};
use crate::math::gamma::srgb_gamma_encode;
use crate::math::rounding::round_half_up;
use crate::math::Matrix3x3;

/// Chromaticities of the red, green and blue primaries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbPrimaries {
    pub red: (f64, f64),
    pub green: (f64, f64),
    pub blue: (f64, f64),
}

impl RgbPrimaries {
    /// sRGB / Rec.709
    pub const SRGB: Self = Self {
        red: (0.64, 0.33),
        green: (0.30, 0.60),
        blue: (0.15, 0.06),
    };

    /// Rec.2020
    pub const REC2020: Self = Self {
        red: (0.708, 0.292),
        green: (0.170, 0.797),
        blue: (0.131, 0.046),
    };

    fn to_array(self) -> [f64; 6] {
        [
            self.red.0,
            self.red.1,
            self.green.0,
            self.green.1,
            self.blue.0,
            self.blue.1,
        ]
    }
}

/// Build the XYZ → linear RGB matrix for a set of primaries and white point
///
/// Primaries and white are brought to `scale` before solving.
pub fn xyz_to_rgb_matrix(primaries: &RgbPrimaries, white: Xyz, scale: f64) -> Matrix3x3 {
    let white = scale_white(white, scale);
    let r = xyy_to_xyz(primaries.red.0, primaries.red.1, scale).to_array();
    let g = xyy_to_xyz(primaries.green.0, primaries.green.1, scale).to_array();
    let b = xyy_to_xyz(primaries.blue.0, primaries.blue.1, scale).to_array();
    let s = Matrix3x3::from_columns(r, g, b)
        .invert()
        .multiply_vec(white.to_array());
    Matrix3x3::from_columns(
        [s[0] * r[0], s[0] * r[1], s[0] * r[2]],
        [s[1] * g[0], s[1] * g[1], s[1] * g[2]],
        [s[2] * b[0], s[2] * b[1], s[2] * b[2]],
    )
    .invert()
}

/// Memo of XYZ → RGB matrices keyed by primaries, white point and scale
#[derive(Debug, Default)]
pub struct RgbMatrixCache {
    matrices: HashMap<[u64; 10], Matrix3x3>,
}

impl RgbMatrixCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached [`xyz_to_rgb_matrix`]
    pub fn matrix(&mut self, primaries: &RgbPrimaries, white: Xyz, scale: f64) -> Matrix3x3 {
        let p = primaries.to_array();
        let w = white.to_array();
        let key = [p[0], p[1], p[2], p[3], p[4], p[5], w[0], w[1], w[2], scale].map(f64::to_bits);
        *self
            .matrices
            .entry(key)
            .or_insert_with(|| xyz_to_rgb_matrix(primaries, white, scale))
    }

    /// [`xyz_to_srgb`] using a cached matrix
    pub fn xyz_to_srgb(&mut self, xyz: Xyz, white: Xyz, encoding: RgbEncoding) -> [f64; 3] {
        let linear = self.matrix(&RgbPrimaries::SRGB, white, 1.0).multiply_vec(xyz.to_array());
        encoding.apply(linear)
    }

    /// [`lab_to_srgb`] using a cached matrix
    pub fn lab_to_srgb(
        &mut self,
        lab: Lab,
        white: LabWhite,
        encoding: RgbEncoding,
        cat: CatMatrix,
    ) -> [f64; 3] {
        let xyz = lab_to_display_xyz(lab, white, cat);
        self.xyz_to_srgb(xyz, D65, encoding)
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

/// Output encoding for sRGB values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbEncoding {
    /// Multiplier applied after encoding (1.0, 100.0, 255.0, …)
    pub scale: f64,
    /// Round to integers after scaling
    pub round: bool,
    /// Clamp encoded values to 0..1 before scaling
    pub clamp: bool,
}

impl Default for RgbEncoding {
    fn default() -> Self {
        Self {
            scale: 1.0,
            round: false,
            clamp: true,
        }
    }
}

impl RgbEncoding {
    /// Scaled to `scale`, clamped, not rounded
    pub fn scaled(scale: f64) -> Self {
        Self {
            scale,
            ..Self::default()
        }
    }

    /// 8-bit style output: scaled to 255, clamped, rounded
    pub fn bytes() -> Self {
        Self {
            scale: 255.0,
            round: true,
            clamp: true,
        }
    }

    fn apply(&self, linear: [f64; 3]) -> [f64; 3] {
        linear.map(|v| {
            let mut v = srgb_gamma_encode(v);
            if self.clamp {
                v = v.clamp(0.0, 1.0);
            }
            v *= self.scale;
            if self.round { round_half_up(v) } else { v }
        })
    }
}

/// Convert XYZ (Y = 0..1) to gamma encoded sRGB
pub fn xyz_to_srgb(xyz: Xyz, white: Xyz, encoding: RgbEncoding) -> [f64; 3] {
    let linear = xyz_to_rgb_matrix(&RgbPrimaries::SRGB, white, 1.0).multiply_vec(xyz.to_array());
    encoding.apply(linear)
}

fn lab_to_display_xyz(lab: Lab, white: LabWhite, cat: CatMatrix) -> Xyz {
    let wp = white.xyz();
    let xyz = lab.to_xyz(wp);
    if white.adapts_to_d65() {
        adapt_xyz(xyz, wp, D65, cat)
    } else {
        xyz
    }
}

/// Convert Lab to gamma encoded sRGB
///
/// XYZ is adapted from the Lab white point to D65 unless the Lab is
/// explicitly D50 relative.
pub fn lab_to_srgb(lab: Lab, white: LabWhite, encoding: RgbEncoding, cat: CatMatrix) -> [f64; 3] {
    xyz_to_srgb(lab_to_display_xyz(lab, white, cat), D65, encoding)
}

/// Convert CMYK (0..1) to RGB
pub fn cmyk_to_rgb(cmyk: [f64; 4], scale: f64, round: bool) -> [f64; 3] {
    let [c, m, y, k] = cmyk;
    [c, m, y].map(|v| {
        let v = (1.0 - (v * (1.0 - k) + k)) * scale;
        if round { round_half_up(v) } else { v }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-4;

    #[test]
    fn test_srgb_matrix() {
        // Lindbloom's XYZ → sRGB matrix for D65
        let expected = Matrix3x3::new([
            [3.2404542, -1.5371385, -0.4985314],
            [-0.9692660, 1.8760108, 0.0415560],
            [0.0556434, -0.2040259, 1.0572252],
        ]);
        let m = xyz_to_rgb_matrix(&RgbPrimaries::SRGB, Xyz::new(0.95047, 1.0, 1.08883), 1.0);
        assert!(m.approx_eq(&expected, 1e-5), "sRGB matrix: {:?}", m);
    }

    #[test]
    fn test_white_to_rgb() {
        let rgb = xyz_to_srgb(D65, D65, RgbEncoding::bytes());
        assert_eq!(rgb, [255.0, 255.0, 255.0]);
        let rgb = xyz_to_srgb(Xyz::new(0.0, 0.0, 0.0), D65, RgbEncoding::bytes());
        assert_eq!(rgb, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_clamp() {
        let out_of_gamut = Xyz::new(0.2, 0.6, 0.1);
        let clamped = xyz_to_srgb(out_of_gamut, D65, RgbEncoding::default());
        assert!(clamped.iter().all(|v| (0.0..=1.0).contains(v)));
        let raw = xyz_to_srgb(
            out_of_gamut,
            D65,
            RgbEncoding {
                clamp: false,
                ..RgbEncoding::default()
            },
        );
        assert!(raw.iter().any(|v| *v < 0.0 || *v > 1.0), "{:?}", raw);
    }

    #[test]
    fn test_lab_white_to_srgb() {
        let white = Lab::new(100.0, 0.0, 0.0);
        let rgb = lab_to_srgb(white, LabWhite::ImplicitD50, RgbEncoding::bytes(), CatMatrix::Bradford);
        assert_eq!(rgb, [255.0, 255.0, 255.0]);
    }

    #[test]
    fn test_explicit_d50_skips_adaptation() {
        let gray = Lab::new(50.0, 0.0, 0.0);
        let adapted = lab_to_srgb(gray, LabWhite::ImplicitD50, RgbEncoding::default(), CatMatrix::Bradford);
        let raw = lab_to_srgb(gray, LabWhite::ExplicitD50, RgbEncoding::default(), CatMatrix::Bradford);
        // Adapted gray is neutral
        assert!((adapted[0] - adapted[2]).abs() < EPSILON);
        // D50 white interpreted as D65 is warm
        assert!(raw[0] > raw[2], "{:?}", raw);
    }

    #[test]
    fn test_cmyk_to_rgb() {
        assert_eq!(cmyk_to_rgb([0.0, 0.0, 0.0, 0.0], 255.0, false), [255.0, 255.0, 255.0]);
        assert_eq!(cmyk_to_rgb([0.0, 0.0, 0.0, 1.0], 255.0, false), [0.0, 0.0, 0.0]);
        assert_eq!(cmyk_to_rgb([1.0, 0.0, 0.0, 0.0], 1.0, false), [0.0, 1.0, 1.0]);
        assert_eq!(cmyk_to_rgb([0.5, 0.0, 0.0, 0.5], 100.0, true), [25.0, 50.0, 50.0]);
    }

    #[test]
    fn test_cache() {
        let mut cache = RgbMatrixCache::new();
        let a = cache.matrix(&RgbPrimaries::SRGB, D65, 1.0);
        let b = cache.matrix(&RgbPrimaries::SRGB, D65, 1.0);
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        cache.matrix(&RgbPrimaries::REC2020, D65, 1.0);
        assert_eq!(cache.len(), 2);

        let direct = lab_to_srgb(Lab::new(60.0, 20.0, -10.0), LabWhite::ImplicitD50, RgbEncoding::default(), CatMatrix::Bradford);
        let cached = cache.lab_to_srgb(Lab::new(60.0, 20.0, -10.0), LabWhite::ImplicitD50, RgbEncoding::default(), CatMatrix::Bradford);
        assert_eq!(direct, cached);
    }
}
