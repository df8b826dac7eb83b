//! Per-patch overview and grayscale tracking tables

use calverify_core::color::cct::robertson_cct;
use calverify_core::math::{adapt_xyz, round_half_up, zero_pad};
use calverify_core::{D50, Delta, Lab, LabWhite, Luv, RgbEncoding, RgbMatrixCache, XyY, Xyz};
use serde::Serialize;

use crate::compare::{ColorMode, Comparison, Evaluation, PatchColors, PatchTolerances, RuleStatus};

fn d50_100() -> Xyz {
    D50.scale(100.0)
}

/// One overview line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewRow {
    /// 1-based
    pub number: usize,
    /// Zero padded number
    pub label: String,
    /// RGB 0..255 or CMYK 0..100
    pub device: Vec<f64>,
    /// Target in the report color mode
    pub target: [f64; 3],
    /// Actual in the report color mode
    pub actual: [f64; 3],
    pub target_gamma: Option<f64>,
    pub actual_gamma: Option<f64>,
    pub delta: Delta,
    /// 8-bit sRGB preview of the target
    pub target_srgb: [f64; 3],
    /// 8-bit sRGB preview of the actual color
    pub actual_srgb: [f64; 3],
    pub tolerances: PatchTolerances,
    /// ΔE at or above the warning threshold
    pub warn: bool,
}

impl OverviewRow {
    /// Classification of the total difference
    ///
    /// Falls back to the warning threshold when no rule annotated the patch.
    pub fn status(&self) -> RuleStatus {
        match self.tolerances.e {
            Some(t) => t.status(),
            None if self.warn => RuleStatus::Warn,
            None => RuleStatus::StatOnly,
        }
    }
}

/// Convert Lab (D50) into the report color mode
///
/// `white` is the chromaticity reference for xyY and L*u'v'.
pub fn mode_values(lab: Lab, mode: ColorMode, white: Xyz) -> [f64; 3] {
    let xyz = lab.to_xyz(d50_100());
    match mode {
        ColorMode::Lab => lab.to_array(),
        ColorMode::Xyz => xyz.to_array(),
        ColorMode::XyY => XyY::from_xyz(xyz, white).to_array(),
        ColorMode::Luv => Luv::from_xyz(xyz, white).to_array(),
    }
}

fn device_values(colors: &PatchColors) -> Vec<f64> {
    if let Some(cmyk) = colors.cmyk {
        cmyk.to_vec()
    } else if let Some(rgb) = colors.rgb {
        rgb.iter().map(|v| round_half_up(v / 100.0 * 255.0)).collect()
    } else {
        Vec::new()
    }
}

/// Build the overview rows
pub fn overview(comparison: &Comparison<'_>, evaluation: &Evaluation) -> Vec<OverviewRow> {
    let ctx = comparison.context;
    let mode = ctx.mode;
    let (target_white, actual_white) = if ctx.absolute {
        (
            comparison.profile_whitepoint.as_ref().map_or(D50, |p| p.normalized),
            comparison.whitepoint.as_ref().map_or(D50, |w| w.normalized),
        )
    } else {
        (D50, D50)
    };
    let warn_deviation = comparison.criteria.warn_deviation;
    let deltas = comparison.deltas(comparison.family);
    let width = comparison.patches.len().to_string().len();
    let mut previews = RgbMatrixCache::new();

    comparison
        .patches
        .iter()
        .zip(deltas)
        .zip(&evaluation.tolerances)
        .map(|((colors, delta), tolerances)| {
            let number = colors.index + 1;
            OverviewRow {
                number,
                label: zero_pad(number, width),
                device: device_values(colors),
                target: mode_values(colors.target, mode, target_white),
                actual: mode_values(colors.actual, mode, actual_white),
                target_gamma: colors.target_gamma,
                actual_gamma: colors.actual_gamma,
                delta: *delta,
                target_srgb: previews.lab_to_srgb(colors.target, LabWhite::ImplicitD50, RgbEncoding::bytes(), ctx.cat),
                actual_srgb: previews.lab_to_srgb(colors.actual, LabWhite::ImplicitD50, RgbEncoding::bytes(), ctx.cat),
                tolerances: *tolerances,
                warn: warn_deviation.is_some_and(|w| delta.e >= w),
            }
        })
        .collect()
}

/// One grayscale tracking line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrayscaleRow {
    pub number: usize,
    /// Gray signal in percent
    pub signal: f64,
    pub target: Lab,
    pub actual: Lab,
    pub target_cct: Option<f64>,
    pub actual_cct: Option<f64>,
    pub target_gamma: Option<f64>,
    pub actual_gamma: Option<f64>,
    pub delta: Delta,
    /// Actual minus target sRGB, 0..100
    pub rgb_balance: [f64; 3],
}

/// CCT of a D50 relative Lab, re-adapted to `white` unless absolute
fn patch_cct(lab: Lab, white: Option<Xyz>, absolute: bool, comparison: &Comparison<'_>) -> Option<f64> {
    let mut xyz = lab.to_xyz(d50_100());
    if !absolute {
        if let Some(white) = white {
            xyz = adapt_xyz(xyz, d50_100(), white, comparison.context.cat);
        }
    }
    robertson_cct(xyz).map(round_half_up)
}

/// Gray patches with gamma plus black and white, sorted by signal
pub fn grayscale(comparison: &Comparison<'_>) -> Vec<GrayscaleRow> {
    let ctx = comparison.context;
    let deltas = comparison.deltas(comparison.family);
    let profile_white = comparison.profile_whitepoint.as_ref().map(|p| p.normalized);
    let measured_white = comparison.whitepoint.as_ref().map(|w| w.normalized);
    let encoding = RgbEncoding::scaled(100.0);
    let mut cache = RgbMatrixCache::new();

    let mut rows: Vec<GrayscaleRow> = comparison
        .patches
        .iter()
        .zip(deltas)
        .filter_map(|(colors, delta)| {
            let [signal, ..] = colors.rgb?;
            let endpoint = signal == 0.0 || signal == 100.0;
            let tracked = colors.target_gamma.is_some() && colors.actual_gamma.is_some();
            if !colors.is_gray() || !(endpoint || tracked) {
                return None;
            }
            let target_rgb = cache.lab_to_srgb(colors.target, LabWhite::ImplicitD50, encoding, ctx.cat);
            let actual_rgb = cache.lab_to_srgb(colors.actual, LabWhite::ImplicitD50, encoding, ctx.cat);
            Some(GrayscaleRow {
                number: colors.index + 1,
                signal,
                target: colors.target,
                actual: colors.actual,
                target_cct: patch_cct(colors.target, profile_white, ctx.absolute, comparison),
                actual_cct: patch_cct(colors.actual, measured_white, ctx.absolute, comparison),
                target_gamma: colors.target_gamma,
                actual_gamma: colors.actual_gamma,
                delta: *delta,
                rgb_balance: [0, 1, 2].map(|i| actual_rgb[i] - target_rgb[i]),
            })
        })
        .collect();
    rows.sort_by(|a, b| a.signal.total_cmp(&b.signal).then(a.target.l.total_cmp(&b.target.l)));
    rows
}
