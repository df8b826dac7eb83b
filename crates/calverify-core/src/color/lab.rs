//! CIELAB (L*a*b*) Color Space
//!
//! - L*: Lightness (0 = black, 100 = white)
//! - a*: Green-red axis (negative = green, positive = red)
//! - b*: Blue-yellow axis (negative = blue, positive = yellow)
//!
//! Uses the ε/κ constants as intended by the CIE (216/24389 and 24389/27)
//! rather than the rounded 0.008856/903.3, which removes the discontinuity
//! at the junction of the linear and cube-root segments.
//! See http://brucelindbloom.com/LContinuity.html

use crate::color::white_point::scale_white;
use crate::color::Xyz;

/// CIE ε
pub const CIE_E: f64 = 216.0 / 24389.0;
/// CIE κ
pub const CIE_K: f64 = 24389.0 / 27.0;

/// CIELAB color coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lab {
    /// Lightness (0 to 100)
    pub l: f64,
    /// Green-red axis
    pub a: f64,
    /// Blue-yellow axis
    pub b: f64,
}

impl Lab {
    /// Create a new Lab color
    #[inline]
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }

    /// Create Lab from an array
    #[inline]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self {
            l: arr[0],
            a: arr[1],
            b: arr[2],
        }
    }

    /// Convert to array
    #[inline]
    pub const fn to_array(&self) -> [f64; 3] {
        [self.l, self.a, self.b]
    }

    /// Convert from XYZ (Y nominally 0..100)
    ///
    /// The white point is brought to Y = 100 first.
    pub fn from_xyz(xyz: Xyz, white: Xyz) -> Self {
        let white = scale_white(white, 100.0);
        let fx = lab_f(xyz.x / white.x);
        let fy = lab_f(xyz.y / white.y);
        let fz = lab_f(xyz.z / white.z);

        Self {
            l: 116.0 * fy - 16.0,
            a: 500.0 * (fx - fy),
            b: 200.0 * (fy - fz),
        }
    }

    /// Convert to XYZ
    ///
    /// The result has the scale of `white`.
    pub fn to_xyz(&self, white: Xyz) -> Xyz {
        let fy = (self.l + 16.0) / 116.0;
        let fx = self.a / 500.0 + fy;
        let fz = fy - self.b / 200.0;

        Xyz::new(
            lab_f_inv(fx) * white.x,
            lab_f_inv(fy) * white.y,
            lab_f_inv(fz) * white.z,
        )
    }

    /// Chroma
    #[inline]
    pub fn chroma(&self) -> f64 {
        (self.a * self.a + self.b * self.b).sqrt()
    }

    /// Hue angle in degrees (0-360)
    #[inline]
    pub fn hue_degrees(&self) -> f64 {
        let h = self.b.atan2(self.a).to_degrees();
        if h < 0.0 { h + 360.0 } else { h }
    }

    /// True if any coordinate is NaN
    #[inline]
    pub fn has_nan(&self) -> bool {
        self.l.is_nan() || self.a.is_nan() || self.b.is_nan()
    }

    /// Check if approximately equal to another Lab color
    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.l - other.l).abs() < epsilon
            && (self.a - other.a).abs() < epsilon
            && (self.b - other.b).abs() < epsilon
    }
}

impl From<[f64; 3]> for Lab {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

/// Lab forward function
#[inline]
fn lab_f(t: f64) -> f64 {
    if t > CIE_E {
        t.cbrt()
    } else {
        (CIE_K * t + 16.0) / 116.0
    }
}

/// Lab inverse function
#[inline]
fn lab_f_inv(f: f64) -> f64 {
    let f3 = f * f * f;
    if f3 > CIE_E {
        f3
    } else {
        (f - 16.0 / 116.0) / (CIE_K / 116.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::white_point::{D50, D65};

    const EPSILON: f64 = 1e-6;

    #[test]
    fn test_white_is_l100() {
        let lab = Lab::from_xyz(D50.scale(100.0), D50);
        assert!(lab.approx_eq(&Lab::new(100.0, 0.0, 0.0), EPSILON), "{:?}", lab);

        // White point already at Y = 100 is not scaled again
        let lab = Lab::from_xyz(D65.scale(100.0), D65.scale(100.0));
        assert!(lab.approx_eq(&Lab::new(100.0, 0.0, 0.0), EPSILON), "{:?}", lab);
    }

    #[test]
    fn test_black() {
        let lab = Lab::from_xyz(Xyz::new(0.0, 0.0, 0.0), D50);
        assert!(lab.approx_eq(&Lab::new(0.0, 0.0, 0.0), EPSILON));
        let xyz = Lab::new(0.0, 0.0, 0.0).to_xyz(D50);
        assert!(xyz.approx_eq(&Xyz::new(0.0, 0.0, 0.0), EPSILON));
    }

    #[test]
    fn test_roundtrip_both_segments() {
        // L = 5 lies on the linear segment, L = 50 on the cube-root segment
        for lab in [
            Lab::new(5.0, 3.0, -2.0),
            Lab::new(50.0, 20.0, -30.0),
            Lab::new(8.0, 0.0, 0.0),
            Lab::new(95.0, -60.0, 80.0),
        ] {
            let xyz = lab.to_xyz(D50.scale(100.0));
            let rt = Lab::from_xyz(xyz, D50);
            assert!(lab.approx_eq(&rt, EPSILON), "Roundtrip failed: {:?} vs {:?}", lab, rt);
        }
    }

    #[test]
    fn test_continuity_at_epsilon() {
        let below = Lab::from_xyz(Xyz::new(0.0, CIE_E * 100.0 - 1e-9, 0.0), D50);
        let above = Lab::from_xyz(Xyz::new(0.0, CIE_E * 100.0 + 1e-9, 0.0), D50);
        assert!((below.l - above.l).abs() < 1e-5);
        assert!((below.l - 8.0).abs() < 1e-5, "L at ε = {}", below.l);
    }

    #[test]
    fn test_known_value() {
        // sRGB red in D50 (ICC PCS)
        let xyz = Xyz::new(43.60747, 22.25045, 1.39322);
        let lab = Lab::from_xyz(xyz, D50);
        assert!((lab.l - 54.29).abs() < 0.01, "L = {}", lab.l);
        assert!((lab.a - 80.815).abs() < 0.01, "a = {}", lab.a);
        assert!((lab.b - 69.879).abs() < 0.01, "b = {}", lab.b);
    }

    #[test]
    fn test_chroma_hue() {
        let lab = Lab::new(50.0, 3.0, -4.0);
        assert!((lab.chroma() - 5.0).abs() < EPSILON);
        assert!(lab.hue_degrees() > 270.0 && lab.hue_degrees() < 360.0);
    }
}
