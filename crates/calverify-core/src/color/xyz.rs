//! CIE XYZ Color Space
//!
//! XYZ is the hub for every conversion in this crate. Measurement values
//! are nominally scaled so that Y is 0..100; white points are usually Y = 1.

use std::ops::{Add, Mul, Sub};

/// CIE 1931 XYZ color coordinates
///
/// Components may be negative mid-adaptation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Xyz {
    /// X tristimulus value
    pub x: f64,
    /// Y tristimulus value (luminance)
    pub y: f64,
    /// Z tristimulus value
    pub z: f64,
}

impl Xyz {
    /// Create a new XYZ color
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create XYZ from an array
    #[inline]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self {
            x: arr[0],
            y: arr[1],
            z: arr[2],
        }
    }

    /// Convert to array
    #[inline]
    pub const fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Scale all components by a factor
    #[inline]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    /// Normalize so Y = 100
    ///
    /// Used to bring measured white points onto the Lab reference scale.
    #[inline]
    pub fn normalize_to_100(&self) -> Self {
        if self.y != 0.0 {
            // Y must come out as exactly 100 for `scale_white`
            Self {
                x: self.x / self.y * 100.0,
                y: 100.0,
                z: self.z / self.y * 100.0,
            }
        } else {
            *self
        }
    }

    /// Sum of the three components
    #[inline]
    pub fn sum(&self) -> f64 {
        self.x + self.y + self.z
    }

    /// True when no component is NaN or infinite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Check if approximately equal to another XYZ color
    #[inline]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() < epsilon
            && (self.y - other.y).abs() < epsilon
            && (self.z - other.z).abs() < epsilon
    }
}

impl From<[f64; 3]> for Xyz {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Xyz> for [f64; 3] {
    fn from(xyz: Xyz) -> Self {
        xyz.to_array()
    }
}

impl Add for Xyz {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Xyz {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Mul<f64> for Xyz {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        self.scale(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_conversion() {
        let arr = [0.1, 0.2, 0.3];
        let xyz = Xyz::from_array(arr);
        assert_eq!(xyz.to_array(), arr);

        let xyz2: Xyz = arr.into();
        assert_eq!(xyz, xyz2);
    }

    #[test]
    fn test_normalize_to_100() {
        let xyz = Xyz::new(0.5, 0.25, 0.75);
        let normalized = xyz.normalize_to_100();
        assert!((normalized.y - 100.0).abs() < 1e-10);
        assert!((normalized.x - 200.0).abs() < 1e-10);
        assert!((normalized.z - 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_arithmetic() {
        let a = Xyz::new(1.0, 2.0, 3.0);
        let b = Xyz::new(0.1, 0.2, 0.3);

        let sum = a + b;
        assert!(sum.approx_eq(&Xyz::new(1.1, 2.2, 3.3), 1e-10));

        let diff = a - b;
        assert!(diff.approx_eq(&Xyz::new(0.9, 1.8, 2.7), 1e-10));

        let scaled = a * 2.0;
        assert!(scaled.approx_eq(&Xyz::new(2.0, 4.0, 6.0), 1e-10));
        assert!((a.sum() - 6.0).abs() < 1e-10);
    }
}
