//! Chromatic Adaptation Transforms
//!
//! Von Kries style adaptation: XYZ is taken into a cone response space with
//! a selectable matrix MA, scaled by the ratio of destination to source
//! white responses, then taken back to XYZ.
//!
//! M = MA⁻¹ × diag(ρβγ_dst / ρβγ_src) × MA
//!
//! References:
//! - Lindbloom: http://www.brucelindbloom.com/index.html?Eqn_ChromAdapt.html

use std::fmt;
use std::str::FromStr;

use crate::color::Xyz;
use crate::error::Error;
use crate::math::Matrix3x3;

/// Cone response matrix used for chromatic adaptation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CatMatrix {
    /// Bradford (ICC default)
    #[default]
    Bradford,
    /// CIECAM02
    Cat02,
    /// CIECAM02 with Brill & Süsstrunk correction
    Cat02Bs,
    /// CIECAM97s (linearized)
    Cat97s,
    /// CMCCAT2000
    Cmccat2000,
    /// Hunt-Pointer-Estevez, equal energy normalized
    HpeE,
    /// Sharp (Finlayson & Süsstrunk)
    Sharp,
    /// Hunt-Pointer-Estevez, D65 normalized (von Kries)
    HpeD65,
    /// Plain XYZ scaling
    XyzScaling,
    /// IPT LMS
    Ipt,
    /// Inverse CIE 2012 2° LMS to XYZ
    Cie2012_2,
    /// Bianco & Schettini (2010)
    Bs,
    /// Bianco & Schettini (2010) with positivity constraint
    BsPc,
    /// User supplied matrix
    Custom(Matrix3x3),
}

// ============================================================================
// Cone response matrices (XYZ → ρβγ)
// ============================================================================

const BRADFORD: Matrix3x3 = Matrix3x3::new([
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
]);

const CAT02: Matrix3x3 = Matrix3x3::new([
    [0.7328, 0.4296, -0.1624],
    [-0.7036, 1.6975, 0.0061],
    [0.0030, 0.0136, 0.9834],
]);

const CAT02_BS: Matrix3x3 = Matrix3x3::new([
    [0.7328, 0.4296, -0.1624],
    [-0.7036, 1.6975, 0.0061],
    [0.0, 0.0, 1.0],
]);

const CAT97S: Matrix3x3 = Matrix3x3::new([
    [0.8562, 0.3372, -0.1934],
    [-0.8360, 1.8327, 0.0033],
    [0.0357, -0.0469, 1.0112],
]);

const CMCCAT2000: Matrix3x3 = Matrix3x3::new([
    [0.7982, 0.3389, -0.1371],
    [-0.5918, 1.5512, 0.0406],
    [0.0008, 0.0239, 0.9753],
]);

const HPE_E: Matrix3x3 = Matrix3x3::new([
    [0.38971, 0.68898, -0.07868],
    [-0.22981, 1.18340, 0.04641],
    [0.0, 0.0, 1.0],
]);

const SHARP: Matrix3x3 = Matrix3x3::new([
    [1.2694, -0.0988, -0.1706],
    [-0.8364, 1.8006, 0.0357],
    [0.0297, -0.0315, 1.0018],
]);

const HPE_D65: Matrix3x3 = Matrix3x3::new([
    [0.40024, 0.70760, -0.08081],
    [-0.22630, 1.16532, 0.04570],
    [0.0, 0.0, 0.91822],
]);

const IPT: Matrix3x3 = Matrix3x3::new([
    [0.4002, 0.7075, -0.0807],
    [-0.2280, 1.1500, 0.0612],
    [0.0, 0.0, 0.9184],
]);

const CIE2012_2: Matrix3x3 = Matrix3x3::new([
    [0.2052445519046028, 0.8334486497310412, -0.0386932016356441],
    [-0.4972221301804286, 1.4034846060306130, 0.0937375241498157],
    [0.0, 0.0, 1.0],
]);

const BS: Matrix3x3 = Matrix3x3::new([
    [0.8752, 0.2787, -0.1539],
    [-0.8904, 1.8709, 0.0195],
    [-0.0061, 0.0162, 0.9899],
]);

const BS_PC: Matrix3x3 = Matrix3x3::new([
    [0.6489, 0.3915, -0.0404],
    [-0.3775, 1.3055, 0.0720],
    [-0.0271, 0.0888, 0.9383],
]);

impl CatMatrix {
    /// All named matrices, in display order
    pub const NAMED: [CatMatrix; 13] = [
        Self::Bradford,
        Self::Cat02,
        Self::Cat02Bs,
        Self::Cat97s,
        Self::Cmccat2000,
        Self::HpeE,
        Self::Sharp,
        Self::HpeD65,
        Self::XyzScaling,
        Self::Ipt,
        Self::Cie2012_2,
        Self::Bs,
        Self::BsPc,
    ];

    /// The XYZ → cone response matrix
    pub fn matrix(&self) -> Matrix3x3 {
        match self {
            Self::Bradford => BRADFORD,
            Self::Cat02 => CAT02,
            Self::Cat02Bs => CAT02_BS,
            Self::Cat97s => CAT97S,
            Self::Cmccat2000 => CMCCAT2000,
            Self::HpeE => HPE_E,
            Self::Sharp => SHARP,
            Self::HpeD65 => HPE_D65,
            Self::XyzScaling => Matrix3x3::identity(),
            Self::Ipt => IPT,
            Self::Cie2012_2 => CIE2012_2,
            Self::Bs => BS,
            Self::BsPc => BS_PC,
            Self::Custom(m) => *m,
        }
    }

    /// Canonical name (`"Bradford"`, `"HPE D65"`, …)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bradford => "Bradford",
            Self::Cat02 => "CAT02",
            Self::Cat02Bs => "CAT02BS",
            Self::Cat97s => "CAT97s",
            Self::Cmccat2000 => "CMCCAT2000",
            Self::HpeE => "HPE E",
            Self::Sharp => "Sharp",
            Self::HpeD65 => "HPE D65",
            Self::XyzScaling => "XYZ scaling",
            Self::Ipt => "IPT",
            Self::Cie2012_2 => "CIE2012_2",
            Self::Bs => "BS",
            Self::BsPc => "BS-PC",
            Self::Custom(_) => "Custom",
        }
    }

    /// Parse a matrix name, falling back to Bradford for unknown names
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(name, "unknown adaptation matrix, using Bradford");
            Self::Bradford
        })
    }
}

impl FromStr for CatMatrix {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::NAMED
            .into_iter()
            .find(|cat| cat.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownAdaptationMatrix(s.to_string()))
    }
}

impl fmt::Display for CatMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compute the chromatic adaptation matrix between two white points
///
/// The returned matrix M can be used as: XYZ_dest = M × XYZ_src.
/// White points may be at any scale as long as both share it.
pub fn adaptation_matrix(src_white: Xyz, dst_white: Xyz, cat: CatMatrix) -> Matrix3x3 {
    let m_a = cat.matrix();
    let src = m_a.multiply_vec(src_white.to_array());
    let dst = m_a.multiply_vec(dst_white.to_array());
    let scale = Matrix3x3::diagonal(dst[0] / src[0], dst[1] / src[1], dst[2] / src[2]);
    m_a.invert().multiply(&scale).multiply(&m_a)
}

/// Adapt an XYZ color from one white point to another
#[inline]
pub fn adapt_xyz(xyz: Xyz, src_white: Xyz, dst_white: Xyz, cat: CatMatrix) -> Xyz {
    let matrix = adaptation_matrix(src_white, dst_white, cat);
    Xyz::from_array(matrix.multiply_vec(xyz.to_array()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::white_point::{D50, D65};

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_identity_adaptation_all_matrices() {
        let white = Xyz::new(95.047, 100.0, 108.883);
        let color = Xyz::new(41.24, 21.26, 1.93);
        for cat in CatMatrix::NAMED {
            let adapted = adapt_xyz(color, white, white, cat);
            assert!(
                adapted.approx_eq(&color, 1e-9),
                "{} identity failed: {:?} vs {:?}",
                cat,
                adapted,
                color
            );
        }
    }

    #[test]
    fn test_white_maps_to_white() {
        for cat in CatMatrix::NAMED {
            let adapted = adapt_xyz(D65, D65, D50, cat);
            assert!(
                adapted.approx_eq(&D50, 1e-9),
                "{} D65 white → D50: {:?} vs {:?}",
                cat,
                adapted,
                D50
            );
        }
    }

    #[test]
    fn test_d65_to_d50_bradford() {
        // Lindbloom's Bradford D65 → D50 matrix
        let expected = Matrix3x3::new([
            [1.0478112, 0.0228866, -0.0501270],
            [0.0295424, 0.9904844, -0.0170491],
            [-0.0092345, 0.0150436, 0.7521316],
        ]);
        let computed = adaptation_matrix(
            Xyz::new(0.95047, 1.0, 1.08883),
            Xyz::new(0.96422, 1.0, 0.82521),
            CatMatrix::Bradford,
        );
        assert!(
            computed.approx_eq(&expected, 1e-6),
            "D65→D50 matrix mismatch: computed={:?} expected={:?}",
            computed,
            expected
        );
    }

    #[test]
    fn test_adaptation_roundtrip() {
        let m1 = adaptation_matrix(D65, D50, CatMatrix::Cat02);
        let m2 = adaptation_matrix(D50, D65, CatMatrix::Cat02);
        assert!(m1.multiply(&m2).is_identity(EPSILON), "Roundtrip not identity");
    }

    #[test]
    fn test_xyz_scaling_is_diagonal() {
        let matrix = adaptation_matrix(D65, D50, CatMatrix::XyzScaling);
        assert!(matrix.m[0][1].abs() < EPSILON);
        assert!(matrix.m[0][2].abs() < EPSILON);
        assert!(matrix.m[1][0].abs() < EPSILON);
        assert!(matrix.m[2][1].abs() < EPSILON);
        assert!((matrix.m[0][0] - D50.x / D65.x).abs() < EPSILON);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("Bradford".parse::<CatMatrix>().unwrap(), CatMatrix::Bradford);
        assert_eq!("cat02".parse::<CatMatrix>().unwrap(), CatMatrix::Cat02);
        assert_eq!("HPE D65".parse::<CatMatrix>().unwrap(), CatMatrix::HpeD65);
        assert_eq!("xyz scaling".parse::<CatMatrix>().unwrap(), CatMatrix::XyzScaling);
        assert_eq!("BS-PC".parse::<CatMatrix>().unwrap(), CatMatrix::BsPc);
        assert!(matches!(
            "Nonsense".parse::<CatMatrix>(),
            Err(Error::UnknownAdaptationMatrix(_))
        ));
        assert_eq!(CatMatrix::from_name_lossy("Nonsense"), CatMatrix::Bradford);
    }

    #[test]
    fn test_names_roundtrip() {
        for cat in CatMatrix::NAMED {
            assert_eq!(cat.to_string().parse::<CatMatrix>().unwrap(), cat);
        }
    }

    #[test]
    fn test_custom_matrix() {
        let custom = CatMatrix::Custom(BRADFORD);
        let a = adaptation_matrix(D65, D50, custom);
        let b = adaptation_matrix(D65, D50, CatMatrix::Bradford);
        assert!(a.approx_eq(&b, EPSILON));
    }
}
