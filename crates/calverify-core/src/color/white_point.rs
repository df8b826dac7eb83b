//! CIE Standard Illuminant White Points
//!
//! White points are specified as CIE XYZ coordinates where Y = 1.0 and
//! looked up across several standards in priority order. A white point can
//! also be given as a daylight color temperature or as explicit XYZ.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::color::cct::daylight_locus_xyy;
use crate::color::xyy::xy_to_xyz_unit;
use crate::color::Xyz;
use crate::error::{Error, Result};
use crate::math::chromatic_adaptation::{CatMatrix, adapt_xyz};

// ============================================================================
// Standard illuminant tables
// ============================================================================

/// One standard's illuminant table (name → XYZ with Y = 1)
#[derive(Debug, Clone, Copy)]
pub struct StandardTable {
    /// Standard name, e.g. `"ASTM E308-01"`
    pub standard: &'static str,
    /// Illuminants defined by this standard
    pub illuminants: &'static [(&'static str, Xyz)],
}

const fn xz(x: f64, z: f64) -> Xyz {
    Xyz::new(x, 1.0, z)
}

/// All known standards
pub const STANDARDS: [StandardTable; 5] = [
    StandardTable {
        standard: "None",
        illuminants: &[("E", xz(1.0, 1.0))],
    },
    StandardTable {
        standard: "ASTM E308-01",
        illuminants: &[
            ("A", xz(1.09850, 0.35585)),
            ("C", xz(0.98074, 1.18232)),
            ("D50", xz(0.96422, 0.82521)),
            ("D55", xz(0.95682, 0.92149)),
            ("D65", xz(0.95047, 1.08883)),
            ("D75", xz(0.94972, 1.22638)),
            ("F2", xz(0.99186, 0.67393)),
            ("F7", xz(0.95041, 1.08747)),
            ("F11", xz(1.00962, 0.64350)),
        ],
    },
    StandardTable {
        standard: "ICC",
        illuminants: &[("D50", xz(0.9642, 0.8249)), ("D65", xz(0.9505, 1.0890))],
    },
    StandardTable {
        standard: "ISO 11664-2:2007",
        illuminants: &[("D65", xy_to_xyz_unit(0.3127, 0.329))],
    },
    StandardTable {
        standard: "Wyszecki & Stiles",
        illuminants: &[
            ("A", xz(1.09828, 0.35547)),
            ("B", xz(0.99072, 0.85223)),
            ("C", xz(0.98041, 1.18103)),
            ("D55", xz(0.95642, 0.92085)),
            ("D65", xz(0.95017, 1.08813)),
            ("D75", xz(0.94939, 1.22558)),
        ],
    },
];

/// Lookup order used when none is given
pub const DEFAULT_PRIORITY: [&str; 5] = [
    "ISO 11664-2:2007",
    "ICC",
    "ASTM E308-01",
    "Wyszecki & Stiles",
    "None",
];

/// D50 as resolved by default (ICC)
pub const D50: Xyz = xz(0.9642, 0.8249);

/// D65 as resolved by default (ISO 11664-2:2007)
pub const D65: Xyz = xy_to_xyz_unit(0.3127, 0.329);

/// Look up a standard illuminant by name
///
/// The name is matched case-insensitively. Standards are searched in
/// `priority` order; an unknown standard name is an error even if an
/// earlier standard would have matched later.
pub fn standard_illuminant(name: &str, priority: &[&str], scale: f64) -> Result<Xyz> {
    let wanted = name.to_uppercase();
    for standard in priority {
        let table = STANDARDS
            .iter()
            .find(|t| t.standard == *standard)
            .ok_or_else(|| Error::UnrecognizedStandard(standard.to_string()))?;
        if let Some((_, xyz)) = table.illuminants.iter().find(|(n, _)| *n == wanted) {
            return Ok(xyz.scale(scale));
        }
    }
    Err(Error::UnrecognizedIlluminant(name.to_string()))
}

/// Apply a scale to a white point
///
/// A white point that already has Y = 100 is left alone when scaling up.
#[inline]
pub fn scale_white(white: Xyz, scale: f64) -> Xyz {
    if scale > 1.0 && white.y == 100.0 {
        white
    } else {
        white.scale(scale)
    }
}

// ============================================================================
// White point specification
// ============================================================================

/// A white point given by name, color temperature or explicit XYZ
#[derive(Debug, Clone, PartialEq)]
pub enum Whitepoint {
    /// Standard illuminant name (`"D50"`, `"D65"`, `"A"`, …)
    Illuminant(String),
    /// Daylight correlated color temperature in Kelvin
    Cct(f64),
    /// Explicit XYZ
    Xyz(Xyz),
}

impl Default for Whitepoint {
    fn default() -> Self {
        Self::Illuminant("D50".to_string())
    }
}

impl From<Xyz> for Whitepoint {
    fn from(xyz: Xyz) -> Self {
        Self::Xyz(xyz)
    }
}

impl FromStr for Whitepoint {
    type Err = Error;

    /// Numbers are color temperatures, anything else an illuminant name
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(t) = s.trim_end_matches(['K', 'k']).parse::<f64>() {
            return Ok(Self::Cct(t));
        }
        Ok(Self::Illuminant(s.to_string()))
    }
}

impl fmt::Display for Whitepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Illuminant(name) => f.write_str(name),
            Self::Cct(t) => write!(f, "{t}K"),
            Self::Xyz(xyz) => write!(f, "{} {} {}", xyz.x, xyz.y, xyz.z),
        }
    }
}

/// Resolve a white point specification to XYZ at the given scale
pub fn resolve_whitepoint(spec: &Whitepoint, scale: f64) -> Result<Xyz> {
    let white = match spec {
        Whitepoint::Xyz(xyz) => *xyz,
        Whitepoint::Illuminant(name) => standard_illuminant(name, &DEFAULT_PRIORITY, 1.0)?,
        Whitepoint::Cct(t) => daylight_locus_xyy(*t, 1.0)
            .map(|xyy| xyy.to_xyz())
            .ok_or(Error::CctOutOfRange(*t))?,
    };
    Ok(scale_white(white, scale))
}

/// White point of Lab values handed to conversions that end in D65 RGB or
/// ICtCp
///
/// Lab without an explicit white point is taken as D50 relative and is
/// adapted to D65. Lab explicitly declared D50 is passed through unadapted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LabWhite {
    /// No white point given, D50 assumed
    #[default]
    ImplicitD50,
    /// Explicitly D50
    ExplicitD50,
    /// Relative to this white point (any scale)
    Adapted(Xyz),
}

impl LabWhite {
    /// White point XYZ normalized to Y = 1
    pub fn xyz(&self) -> Xyz {
        match self {
            Self::ImplicitD50 | Self::ExplicitD50 => D50,
            Self::Adapted(xyz) if xyz.y != 0.0 => xyz.scale(1.0 / xyz.y),
            Self::Adapted(xyz) => *xyz,
        }
    }

    /// Whether XYZ derived from this Lab is adapted to D65
    pub fn adapts_to_d65(&self) -> bool {
        !matches!(self, Self::ExplicitD50)
    }
}

// ============================================================================
// Memoizing resolver
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Illuminant(String, u64),
    Cct(u64, u64),
    Xyz([u64; 3], u64),
}

impl CacheKey {
    fn new(spec: &Whitepoint, scale: f64) -> Self {
        let s = scale.to_bits();
        match spec {
            Whitepoint::Illuminant(name) => Self::Illuminant(name.to_uppercase(), s),
            Whitepoint::Cct(t) => Self::Cct(t.to_bits(), s),
            Whitepoint::Xyz(xyz) => Self::Xyz(xyz.to_array().map(f64::to_bits), s),
        }
    }
}

/// White point resolver with an explicit result cache
///
/// Owned by the caller; nothing is shared between resolvers.
#[derive(Debug, Default)]
pub struct WhitepointResolver {
    cache: HashMap<CacheKey, Xyz>,
}

impl WhitepointResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a white point, memoizing the result
    pub fn resolve(&mut self, spec: &Whitepoint, scale: f64) -> Result<Xyz> {
        let key = CacheKey::new(spec, scale);
        if let Some(xyz) = self.cache.get(&key) {
            return Ok(*xyz);
        }
        let xyz = resolve_whitepoint(spec, scale)?;
        tracing::trace!(%spec, scale, ?xyz, "resolved white point");
        self.cache.insert(key, xyz);
        Ok(xyz)
    }

    /// Adapt XYZ between two white point specifications
    pub fn adapt(
        &mut self,
        xyz: Xyz,
        src: &Whitepoint,
        dst: &Whitepoint,
        cat: CatMatrix,
    ) -> Result<Xyz> {
        let src = self.resolve(src, 1.0)?;
        let dst = self.resolve(dst, 1.0)?;
        Ok(adapt_xyz(xyz, src, dst, cat))
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
