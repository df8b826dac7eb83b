//! Color difference (ΔE)
//!
//! Supported formulas:
//! - CIE76: Euclidean distance in L*a*b*
//! - CIE94: graphic arts or textiles weighting
//! - CMC(l:c)
//! - CIEDE2000, following Sharma, Wu & Dalal (2005)
//! - ΔICtCp (ITU-R BT.2124), normalized so that 1.0 is roughly one JND
//!
//! Every formula yields a [`Delta`] record carrying the total difference,
//! the raw lightness/chroma/hue differences, the a*/b* differences and the
//! weighted components that enter the total.
//!
//! References:
//! - Lindbloom: http://www.brucelindbloom.com/index.html?ColorDifferenceCalc.html
//! - Sharma: http://www.ece.rochester.edu/~gsharma/ciede2000/

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use crate::color::white_point::{D65, LabWhite};
use crate::color::{Ictcp, Lab};
use crate::math::chromatic_adaptation::{CatMatrix, adapt_xyz};

/// Color difference between a reference and a sample
///
/// `a` and `b` are reference minus sample; all other differences are sample
/// minus reference.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Delta {
    /// Total difference
    pub e: f64,
    /// Lightness difference
    pub l: f64,
    /// Chroma difference
    pub c: f64,
    /// Hue difference
    pub h: f64,
    /// a* difference (reference - sample)
    pub a: f64,
    /// b* difference (reference - sample)
    pub b: f64,
    /// Chromaticity distance √(Δa² + Δb²)
    pub ch: f64,
    /// Weighted lightness term
    pub lw: f64,
    /// Weighted chroma term
    pub cw: f64,
    /// Weighted hue term
    pub hw: f64,
}

impl Delta {
    /// Record with every field NaN
    pub const NAN: Self = Self {
        e: f64::NAN,
        l: f64::NAN,
        c: f64::NAN,
        h: f64::NAN,
        a: f64::NAN,
        b: f64::NAN,
        ch: f64::NAN,
        lw: f64::NAN,
        cw: f64::NAN,
        hw: f64::NAN,
    };

    /// True when the inputs could not be compared
    pub fn is_nan(&self) -> bool {
        self.e.is_nan()
    }
}

// ============================================================================
// Methods
// ============================================================================

/// Parameters for ΔICtCp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IctcpContext {
    /// White point the Lab values are relative to
    pub white: LabWhite,
    /// White luminance of the reference in cd/m²
    pub luminance_reference: f64,
    /// White luminance of the sample in cd/m²
    pub luminance_sample: f64,
    /// Adaptation matrix used to reach D65
    pub cat: CatMatrix,
}

impl Default for IctcpContext {
    fn default() -> Self {
        Self {
            white: LabWhite::ImplicitD50,
            luminance_reference: 100.0,
            luminance_sample: 100.0,
            cat: CatMatrix::Bradford,
        }
    }
}

/// Color difference formula with its parameters
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DeltaMethod {
    #[default]
    Cie76,
    Cie94 {
        /// Textiles weighting instead of graphic arts
        textiles: bool,
    },
    Cmc {
        /// Lightness weight
        l: f64,
        /// Chroma weight
        c: f64,
    },
    Cie2000 {
        kl: f64,
        kc: f64,
        kh: f64,
    },
    Ictcp(IctcpContext),
}

impl DeltaMethod {
    /// CIEDE2000 with unit weights
    pub const CIE2000: Self = Self::Cie2000 {
        kl: 1.0,
        kc: 1.0,
        kh: 1.0,
    };

    /// CMC(1:1), perceptibility
    pub const CMC11: Self = Self::Cmc { l: 1.0, c: 1.0 };

    /// CMC(2:1), acceptability
    pub const CMC21: Self = Self::Cmc { l: 2.0, c: 1.0 };

    /// Metric family, used to match criteria rules against a report metric
    pub fn family(&self) -> DeltaFamily {
        match self {
            Self::Cie76 => DeltaFamily::Cie76,
            Self::Cie94 { .. } => DeltaFamily::Cie94,
            Self::Cmc { l, .. } if *l == 2.0 => DeltaFamily::Cmc21,
            Self::Cmc { .. } => DeltaFamily::Cmc11,
            Self::Cie2000 { .. } => DeltaFamily::Cie2000,
            Self::Ictcp(_) => DeltaFamily::Ictcp,
        }
    }
}

impl FromStr for DeltaMethod {
    type Err = Infallible;

    /// Unknown names select CIE76
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "94" | "1994" | "cie94" | "cie1994" => Self::Cie94 { textiles: false },
            "cmc(2:1)" | "cmc21" => Self::CMC21,
            "cmc(1:1)" | "cmc11" | "cmc" => Self::CMC11,
            "00" | "2k" | "2000" | "cie00" | "cie2k" | "cie2000" => Self::CIE2000,
            "ictcp" => Self::Ictcp(IctcpContext::default()),
            _ => Self::Cie76,
        })
    }
}

impl fmt::Display for DeltaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family().name())
    }
}

/// Color difference metric family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum DeltaFamily {
    #[default]
    Cie76,
    Cie94,
    Cie2000,
    Cmc11,
    Cmc21,
    Ictcp,
}

impl DeltaFamily {
    /// Canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Cie76 => "CIE76",
            Self::Cie94 => "CIE94",
            Self::Cie2000 => "CIE00",
            Self::Cmc11 => "CMC11",
            Self::Cmc21 => "CMC21",
            Self::Ictcp => "ICtCp",
        }
    }

    /// Display label for the total difference (`ΔE*00`, `ΔICtCp`, …)
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cie76 => "ΔE*76",
            Self::Cie94 => "ΔE*94",
            Self::Cie2000 => "ΔE*00",
            Self::Cmc11 => "ΔE CMC(1:1)",
            Self::Cmc21 => "ΔE CMC(2:1)",
            Self::Ictcp => "ΔICtCp",
        }
    }

    /// Method with default parameters
    pub fn method(&self) -> DeltaMethod {
        match self {
            Self::Cie76 => DeltaMethod::Cie76,
            Self::Cie94 => DeltaMethod::Cie94 { textiles: false },
            Self::Cie2000 => DeltaMethod::CIE2000,
            Self::Cmc11 => DeltaMethod::CMC11,
            Self::Cmc21 => DeltaMethod::CMC21,
            Self::Ictcp => DeltaMethod::Ictcp(IctcpContext::default()),
        }
    }
}

impl FromStr for DeltaFamily {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let method: DeltaMethod = s.parse()?;
        Ok(method.family())
    }
}

impl From<String> for DeltaFamily {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(family) => family,
            Err(never) => match never {},
        }
    }
}

impl From<DeltaFamily> for String {
    fn from(family: DeltaFamily) -> Self {
        family.name().to_string()
    }
}

impl fmt::Display for DeltaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Formulas
// ============================================================================

/// Compute the color difference between `reference` and `sample`
///
/// Any NaN coordinate yields [`Delta::NAN`].
pub fn delta(reference: Lab, sample: Lab, method: &DeltaMethod) -> Delta {
    if reference.has_nan() || sample.has_nan() {
        return Delta::NAN;
    }
    match method {
        DeltaMethod::Cie76 => cie76(reference, sample),
        DeltaMethod::Cie94 { textiles } => cie94(reference, sample, *textiles),
        DeltaMethod::Cmc { l, c } => cmc(reference, sample, *l, *c),
        DeltaMethod::Cie2000 { kl, kc, kh } => cie2000(reference, sample, *kl, *kc, *kh),
        DeltaMethod::Ictcp(ctx) => ictcp(reference, sample, ctx),
    }
}

/// Total color difference only
#[inline]
pub fn delta_e(reference: Lab, sample: Lab, method: &DeltaMethod) -> f64 {
    delta(reference, sample, method).e
}

/// Assemble the record; `a`, `b` and `ch` come from the given coordinates
fn record(a1: f64, b1: f64, a2: f64, b2: f64, e: f64, raw: [f64; 3], weighted: [f64; 3]) -> Delta {
    let da = a1 - a2;
    let db = b1 - b2;
    Delta {
        e,
        l: raw[0],
        c: raw[1],
        h: raw[2],
        a: da,
        b: db,
        ch: (da * da + db * db).sqrt(),
        lw: weighted[0],
        cw: weighted[1],
        hw: weighted[2],
    }
}

/// ΔL, ΔC and ΔH shared by CIE76, CIE94 and CMC
///
/// ΔH is 0 when rounding makes its radicand negative.
fn lch_differences(r: Lab, s: Lab) -> (f64, f64, f64, f64) {
    let dl = s.l - r.l;
    let c1 = r.chroma();
    let dc = s.chroma() - c1;
    let dh2 = (r.a - s.a).powi(2) + (r.b - s.b).powi(2) - dc * dc;
    let dh = if dh2 > 0.0 { dh2.sqrt() } else { 0.0 };
    (dl, dc, dh, c1)
}

fn cie76(r: Lab, s: Lab) -> Delta {
    let (dl, dc, dh, _) = lch_differences(r, s);
    let e = (dl * dl + (r.a - s.a).powi(2) + (r.b - s.b).powi(2)).sqrt();
    record(r.a, r.b, s.a, s.b, e, [dl, dc, dh], [dl, dc, dh])
}

fn cie94(r: Lab, s: Lab, textiles: bool) -> Delta {
    let (dl, dc, dh, c1) = lch_differences(r, s);
    let (k1, k2, kl) = if textiles {
        (0.048, 0.014, 2.0)
    } else {
        (0.045, 0.015, 1.0)
    };
    // Symmetric chrominance
    let c_ = (c1 * s.chroma()).sqrt();
    let sc = 1.0 + k1 * c_;
    let sh = 1.0 + k2 * c_;
    let w = [dl / kl, dc / sc, dh / sh];
    let e = (w[0] * w[0] + w[1] * w[1] + w[2] * w[2]).sqrt();
    record(r.a, r.b, s.a, s.b, e, [dl, dc, dh], w)
}

fn cmc(r: Lab, s: Lab, l: f64, c: f64) -> Delta {
    let (dl, dc, dh, c1) = lch_differences(r, s);
    let sl = if r.l < 16.0 {
        0.511
    } else {
        0.040975 * r.l / (1.0 + 0.01765 * r.l)
    };
    let sc = 0.0638 * c1 / (1.0 + 0.0131 * c1) + 0.638;
    let c1_4 = c1.powi(4);
    let f = (c1_4 / (c1_4 + 1900.0)).sqrt();
    let h1 = r.b.atan2(r.a).to_degrees() + if r.b >= 0.0 { 0.0 } else { 360.0 };
    let t = if (164.0..=345.0).contains(&h1) {
        0.56 + (0.2 * (h1 + 168.0).to_radians().cos()).abs()
    } else {
        0.36 + (0.4 * (h1 + 35.0).to_radians().cos()).abs()
    };
    let sh = sc * (f * t + 1.0 - f);
    let w = [dl / (l * sl), dc / (c * sc), dh / sh];
    let e = (w[0] * w[0] + w[1] * w[1] + w[2] * w[2]).sqrt();
    record(r.a, r.b, s.a, s.b, e, [dl, dc, dh], w)
}

/// Hue angle in degrees (0..360), 0 for a neutral
fn hue_prime(a: f64, b: f64) -> f64 {
    if a == 0.0 && b == 0.0 {
        0.0
    } else {
        b.atan2(a).to_degrees() + if b >= 0.0 { 0.0 } else { 360.0 }
    }
}

fn cie2000(r: Lab, s: Lab, kl: f64, kc: f64, kh: f64) -> Delta {
    const POW25_7: f64 = 6_103_515_625.0;

    let c_avg = (r.chroma() + s.chroma()) / 2.0;
    let c_avg7 = c_avg.powi(7);
    let g = 0.5 * (1.0 - (c_avg7 / (c_avg7 + POW25_7)).sqrt());

    let a1 = (1.0 + g) * r.a;
    let a2 = (1.0 + g) * s.a;
    let c1 = (a1 * a1 + r.b * r.b).sqrt();
    let c2 = (a2 * a2 + s.b * s.b).sqrt();
    let h1 = hue_prime(a1, r.b);
    let h2 = hue_prime(a2, s.b);

    let dh_raw = h2 - h1;
    let dh = if dh_raw > 180.0 {
        dh_raw - 360.0
    } else if dh_raw < -180.0 {
        dh_raw + 360.0
    } else {
        dh_raw
    };

    let dl = s.l - r.l;
    let dc = c2 - c1;
    let dh_big = 2.0 * (c1 * c2).sqrt() * (dh / 2.0).to_radians().sin();

    let l_avg = (r.l + s.l) / 2.0;
    let c_avg_ = (c1 + c2) / 2.0;
    let h_avg = if c1 * c2 == 0.0 {
        h1 + h2
    } else if (h2 - h1).abs() <= 180.0 {
        (h1 + h2) / 2.0
    } else if h1 + h2 < 360.0 {
        (h1 + h2) / 2.0 + 180.0
    } else {
        (h1 + h2) / 2.0 - 180.0
    };

    let ab = (l_avg - 50.0).powi(2);
    let sl = 1.0 + 0.015 * ab / (20.0 + ab).sqrt();
    let sc = 1.0 + 0.045 * c_avg_;
    let t = 1.0 - 0.17 * (h_avg - 30.0).to_radians().cos()
        + 0.24 * (2.0 * h_avg).to_radians().cos()
        + 0.32 * (3.0 * h_avg + 6.0).to_radians().cos()
        - 0.2 * (4.0 * h_avg - 63.0).to_radians().cos();
    let sh = 1.0 + 0.015 * c_avg_ * t;
    let d_theta = 30.0 * (-((h_avg - 275.0) / 25.0).powi(2)).exp();
    let c_avg_7 = c_avg_.powi(7);
    let rc = 2.0 * (c_avg_7 / (c_avg_7 + POW25_7)).sqrt();
    let rt = -(2.0 * d_theta).to_radians().sin() * rc;

    let aj = dl / sl / kl;
    let ak = dc / sc / kc;
    let al = dh_big / sh / kh;
    let e = (aj * aj + ak * ak + al * al + rt * ak * al).sqrt();
    record(r.a, r.b, s.a, s.b, e, [dl, dc, dh_big], [aj, ak, al])
}

fn ictcp(r: Lab, s: Lab, ctx: &IctcpContext) -> Delta {
    let white = ctx.white.xyz();
    let to_ictcp = |lab: Lab, luminance: f64| {
        let xyz = lab.to_xyz(white);
        let xyz = if ctx.white.adapts_to_d65() {
            adapt_xyz(xyz, white, D65, ctx.cat)
        } else {
            xyz
        };
        Ictcp::from_xyz(xyz.scale(luminance / 10000.0))
    };
    let p1 = to_ictcp(r, ctx.luminance_reference);
    let p2 = to_ictcp(s, ctx.luminance_sample);

    let a1 = (0.25 * p1.ct * p1.ct).sqrt() * 240.0;
    let b1 = p1.cp * 240.0;
    let a2 = (0.25 * p2.ct * p2.ct).sqrt() * 240.0;
    let b2 = p2.cp * 240.0;

    let di = p2.i - p1.i;
    let dct = p2.ct - p1.ct;
    let dcp = p2.cp - p1.cp;

    let dl = di * 480.0;
    let c1 = (0.25 * p1.ct * p1.ct + p1.cp * p1.cp).sqrt();
    let c2 = (0.25 * p2.ct * p2.ct + p2.cp * p2.cp).sqrt();
    let dc_raw = c2 - c1;
    let dh2 = 0.25 * dct * dct + dcp * dcp - dc_raw * dc_raw;
    let dh = if dh2 > 0.0 { dh2.sqrt() * 240.0 } else { 0.0 };
    let dc = dc_raw * 240.0;
    let e = (4.0 * di * di + 0.25 * dct * dct + dcp * dcp).sqrt() * 240.0;
    record(a1, b1, a2, b2, e, [dl, dc, dh], [dl, dc, dh])
}
