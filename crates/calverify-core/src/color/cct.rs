//! Correlated color temperature
//!
//! - Daylight (CIE D series) and planckian locus → chromaticity
//! - XYZ → CCT by Robertson's isotemperature line method
//!
//! References:
//! - Lindbloom: http://www.brucelindbloom.com/index.html?Eqn_T_to_xy.html
//! - Lindbloom: http://www.brucelindbloom.com/index.html?Eqn_XYZ_to_T.html
//! - https://en.wikipedia.org/wiki/Planckian_locus

use crate::color::xyy::XyY;
use crate::color::Xyz;

/// Lowest temperature accepted by [`daylight_locus_xyy`]
pub const DAYLIGHT_MIN_K: f64 = 4000.0;
/// Highest temperature accepted by the locus functions
pub const LOCUS_MAX_K: f64 = 25000.0;
/// Lowest temperature accepted by [`planckian_locus_xyy`]
pub const PLANCKIAN_MIN_K: f64 = 1667.0;

/// Chromaticity of CIE daylight at temperature `t` (Kelvin)
///
/// Valid for 4000 K ≤ t ≤ 25000 K, `None` otherwise. The returned Y is
/// `scale`.
pub fn daylight_locus_xyy(t: f64, scale: f64) -> Option<XyY> {
    let x = if (DAYLIGHT_MIN_K..=7000.0).contains(&t) {
        -4.607e9 / t.powi(3) + 2.9678e6 / t.powi(2) + 0.09911e3 / t + 0.244063
    } else if t > 7000.0 && t <= LOCUS_MAX_K {
        -2.0064e9 / t.powi(3) + 1.9018e6 / t.powi(2) + 0.24748e3 / t + 0.237040
    } else {
        return None;
    };
    let y = -3.0 * x * x + 2.87 * x - 0.275;
    Some(XyY::new(x, y, scale))
}

/// XYZ of CIE daylight at temperature `t`, Y = `scale`
pub fn daylight_locus_xyz(t: f64, scale: f64) -> Option<Xyz> {
    daylight_locus_xyy(t, scale).map(|xyy| xyy.to_xyz())
}

/// Chromaticity of a planckian radiator at temperature `t` (Kelvin)
///
/// Valid for 1667 K ≤ t ≤ 25000 K, `None` otherwise. Y is 1.
pub fn planckian_locus_xyy(t: f64) -> Option<XyY> {
    if !(PLANCKIAN_MIN_K..=LOCUS_MAX_K).contains(&t) {
        return None;
    }
    let x = if t <= 4000.0 {
        -0.2661239e9 / t.powi(3) - 0.2343580e6 / t.powi(2) + 0.8776956e3 / t + 0.179910
    } else {
        -3.0258469e9 / t.powi(3) + 2.1070379e6 / t.powi(2) + 0.2226347e3 / t + 0.24039
    };
    let y = if t <= 2222.0 {
        -1.1063814 * x.powi(3) - 1.34811020 * x.powi(2) + 2.18555832 * x - 0.20219683
    } else if t <= 4000.0 {
        -0.9549476 * x.powi(3) - 1.37418593 * x.powi(2) + 2.09137015 * x - 0.16748867
    } else {
        3.0817580 * x.powi(3) - 5.87338670 * x.powi(2) + 3.75112997 * x - 0.37001483
    };
    Some(XyY::new(x, y, 1.0))
}

/// XYZ of a planckian radiator at temperature `t`, Y = 1
pub fn planckian_locus_xyz(t: f64) -> Option<Xyz> {
    planckian_locus_xyy(t).map(|xyy| xyy.to_xyz())
}

// ============================================================================
// Robertson's method
// ============================================================================

/// Reciprocal temperatures of the isotemperature lines
const RT: [f64; 31] = [
    f64::MIN_POSITIVE,
    10.0e-6,
    20.0e-6,
    30.0e-6,
    40.0e-6,
    50.0e-6,
    60.0e-6,
    70.0e-6,
    80.0e-6,
    90.0e-6,
    100.0e-6,
    125.0e-6,
    150.0e-6,
    175.0e-6,
    200.0e-6,
    225.0e-6,
    250.0e-6,
    275.0e-6,
    300.0e-6,
    325.0e-6,
    350.0e-6,
    375.0e-6,
    400.0e-6,
    425.0e-6,
    450.0e-6,
    475.0e-6,
    500.0e-6,
    525.0e-6,
    550.0e-6,
    575.0e-6,
    600.0e-6,
];

/// (u, v, slope) of each isotemperature line
const UVT: [[f64; 3]; 31] = [
    [0.18006, 0.26352, -0.24341],
    [0.18066, 0.26589, -0.25479],
    [0.18133, 0.26846, -0.26876],
    [0.18208, 0.27119, -0.28539],
    [0.18293, 0.27407, -0.30470],
    [0.18388, 0.27709, -0.32675],
    [0.18494, 0.28021, -0.35156],
    [0.18611, 0.28342, -0.37915],
    [0.18740, 0.28668, -0.40955],
    [0.18880, 0.28997, -0.44278],
    [0.19032, 0.29326, -0.47888],
    [0.19462, 0.30141, -0.58204],
    [0.19962, 0.30921, -0.70471],
    [0.20525, 0.31647, -0.84901],
    [0.21142, 0.32312, -1.0182],
    [0.21807, 0.32909, -1.2168],
    [0.22511, 0.33439, -1.4512],
    [0.23247, 0.33904, -1.7298],
    [0.24010, 0.34308, -2.0637],
    // W&S print 0.24702 here
    [0.24792, 0.34655, -2.4681],
    [0.25591, 0.34951, -2.9641],
    [0.26400, 0.35200, -3.5814],
    [0.27218, 0.35407, -4.3633],
    [0.28039, 0.35577, -5.3762],
    [0.28863, 0.35714, -6.7262],
    [0.29685, 0.35823, -8.5955],
    [0.30505, 0.35907, -11.324],
    [0.31320, 0.35968, -15.628],
    [0.32129, 0.36011, -23.325],
    [0.32931, 0.36038, -40.770],
    [0.33724, 0.36051, -116.45],
];

#[inline]
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (b - a) * t + a
}

/// Correlated color temperature, or `-1.0` when it cannot be determined
///
/// Returns `-1.0` for (near) black input and for chromaticities outside the
/// isotemperature table (below ~1667 K or too far towards blue).
pub fn robertson_cct_raw(xyz: Xyz) -> f64 {
    let Xyz { x, y, z } = xyz;
    if x < 1e-20 && y < 1e-20 && z < 1e-20 {
        return -1.0;
    }
    let denom = x + 15.0 * y + 3.0 * z;
    let us = 4.0 * x / denom;
    let vs = 6.0 * y / denom;

    let mut dm = 0.0;
    let mut di = 0.0;
    let mut found = None;
    for (i, [u, v, t]) in UVT.iter().copied().enumerate() {
        di = (vs - v) - t * (us - u);
        if i > 0 && ((di < 0.0 && dm >= 0.0) || (di >= 0.0 && dm < 0.0)) {
            found = Some(i);
            break;
        }
        dm = di;
    }
    let Some(i) = found else {
        return -1.0;
    };

    let di = di / (1.0 + UVT[i][2] * UVT[i][2]).sqrt();
    let dm = dm / (1.0 + UVT[i - 1][2] * UVT[i - 1][2]).sqrt();
    let p = dm / (dm - di);
    1.0 / lerp(RT[i - 1], RT[i], p)
}

/// Correlated color temperature by Robertson's method
pub fn robertson_cct(xyz: Xyz) -> Option<f64> {
    let t = robertson_cct_raw(xyz);
    (t >= 0.0).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::white_point::D65;

    #[test]
    fn test_black_cct() {
        assert_eq!(robertson_cct_raw(Xyz::new(0.0, 0.0, 0.0)), -1.0);
        assert_eq!(robertson_cct(Xyz::new(0.0, 0.0, 0.0)), None);
    }

    #[test]
    fn test_d65_cct() {
        let t = robertson_cct(D65).unwrap();
        assert!((t - 6504.0).abs() < 5.0, "D65 CCT = {}", t);
    }

    #[test]
    fn test_illuminant_a_cct() {
        let t = robertson_cct(Xyz::new(1.09850, 1.0, 0.35585)).unwrap();
        assert!((t - 2856.0).abs() < 5.0, "A CCT = {}", t);
    }

    #[test]
    fn test_daylight_roundtrip() {
        for t in [4000.0, 5003.0, 6504.0, 9300.0] {
            let xyz = daylight_locus_xyz(t, 1.0).unwrap();
            let cct = robertson_cct(xyz).unwrap();
            // Daylight sits slightly off the planckian locus
            assert!((cct - t).abs() / t < 0.01, "{}K -> {}K", t, cct);
        }
    }

    #[test]
    fn test_planckian_roundtrip() {
        for t in [2000.0, 2700.0, 3500.0, 5000.0, 10000.0] {
            let xyz = planckian_locus_xyz(t).unwrap();
            let cct = robertson_cct(xyz).unwrap();
            assert!((cct - t).abs() / t < 0.005, "{}K -> {}K", t, cct);
        }
    }

    #[test]
    fn test_locus_ranges() {
        assert!(daylight_locus_xyy(3999.0, 1.0).is_none());
        assert!(daylight_locus_xyy(4000.0, 1.0).is_some());
        assert!(daylight_locus_xyy(25000.0, 1.0).is_some());
        assert!(daylight_locus_xyy(25001.0, 1.0).is_none());
        assert!(planckian_locus_xyy(1666.0).is_none());
        assert!(planckian_locus_xyy(1667.0).is_some());
        assert!(planckian_locus_xyy(25001.0).is_none());
    }

    #[test]
    fn test_daylight_d65_chromaticity() {
        let xyy = daylight_locus_xyy(6504.0, 1.0).unwrap();
        assert!((xyy.x - 0.3127).abs() < 5e-4, "x = {}", xyy.x);
        assert!((xyy.y - 0.3291).abs() < 5e-4, "y = {}", xyy.y);
    }
}
