//! Comparison of a measurement dataset against its reference
//!
//! [`Comparison::new`] validates the datasets, derives whitepoint data and
//! per-patch target/actual Lab, and computes deltas for every family the
//! criteria needs. [`Comparison::evaluate`] then applies the rules.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use calverify_core::color::cct::{PLANCKIAN_MIN_K, daylight_locus_xyz, planckian_locus_xyz, robertson_cct};
use calverify_core::math::{adapt_xyz, round_half_up, round_to};
use calverify_core::{CatMatrix, D50, Delta, DeltaFamily, DeltaMethod, IctcpContext, Lab, LabWhite, Xyz, delta};
use serde::Serialize;

use crate::cgats::{Dataset, Device, LAB_FIELDS, Patch, XYZ_FIELDS};
use crate::criteria::{Channel, Criteria, Quantity, Reducer, Rule, Selector, Statistic};
use crate::error::{Error, Result};

/// Upper end of the range where the measured white is compared against a
/// blackbody instead of daylight
const PLANCKIAN_FORCED_BELOW_K: f64 = 4000.0;

/// D50 at Y = 100
fn d50_100() -> Xyz {
    D50.scale(100.0)
}

// ============================================================================
// Context
// ============================================================================

/// Color space of overview values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ColorMode {
    #[default]
    Lab,
    #[serde(rename = "XYZ")]
    Xyz,
    #[serde(rename = "xyY")]
    XyY,
    #[serde(rename = "Lu'v'")]
    Luv,
}

impl ColorMode {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lab => "Lab",
            Self::Xyz => "XYZ",
            Self::XyY => "xyY",
            Self::Luv => "Lu'v'",
        }
    }

    /// Display precision
    pub fn decimals(&self) -> u32 {
        match self {
            Self::Lab => 2,
            _ => 4,
        }
    }
}

impl FromStr for ColorMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lab" => Ok(Self::Lab),
            "xyz" => Ok(Self::Xyz),
            "xyy" => Ok(Self::XyY),
            "lu'v'" | "luv" => Ok(Self::Luv),
            _ => Err(Error::InvalidCriteria(format!("unknown color mode \"{s}\""))),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Distinct tone levels per calibration curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalibrationLevels {
    pub red: usize,
    pub green: usize,
    pub blue: usize,
    pub entry_count: usize,
}

impl CalibrationLevels {
    /// Levels of one channel; gray is the minimum of the three
    pub fn levels(&self, channel: Channel) -> usize {
        match channel {
            Channel::Red => self.red,
            Channel::Green => self.green,
            Channel::Blue => self.blue,
            Channel::Gray => self.red.min(self.green).min(self.blue),
        }
    }

    /// Levels as a percentage of the entry count, one decimal
    pub fn percent(&self, channel: Channel) -> f64 {
        round_to(self.levels(channel) as f64 / self.entry_count as f64 * 100.0, 1)
    }
}

/// Everything about a verification run that is not in the datasets
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    /// Measured whitepoint (absolute, cd/m²)
    pub whitepoint: Option<Xyz>,
    /// Whitepoint of the display profile
    pub profile_whitepoint: Option<Xyz>,
    /// Measured black (absolute, cd/m²)
    pub blackpoint: Option<Xyz>,
    /// Delta family for the report, ignored when the criteria locks it
    pub delta_method: Option<DeltaFamily>,
    pub cat: CatMatrix,
    /// Compare absolute instead of D50 relative colors
    pub absolute: bool,
    /// Gray patches are judged against a neutral at the measured lightness
    pub gray_balance_cal_only: bool,
    /// Assume a blackbody target white
    pub planckian: bool,
    pub calibration_levels: Option<CalibrationLevels>,
    pub mode: ColorMode,
    /// White luminance used for ΔICtCp
    pub ictcp_luminance: f64,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self {
            whitepoint: None,
            profile_whitepoint: None,
            blackpoint: None,
            delta_method: None,
            cat: CatMatrix::Bradford,
            absolute: false,
            gray_balance_cal_only: false,
            planckian: false,
            calibration_levels: None,
            mode: ColorMode::Lab,
            ictcp_luminance: 100.0,
        }
    }
}

impl EvaluationContext {
    /// Concrete method for a family
    pub fn method(&self, family: DeltaFamily) -> DeltaMethod {
        match family {
            DeltaFamily::Ictcp => DeltaMethod::Ictcp(IctcpContext {
                white: LabWhite::ImplicitD50,
                luminance_reference: self.ictcp_luminance,
                luminance_sample: self.ictcp_luminance,
                cat: self.cat,
            }),
            other => other.method(),
        }
    }
}

// ============================================================================
// Whitepoints
// ============================================================================

/// Measured whitepoint and the white assumed from its color temperature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WhitepointInfo {
    pub measured: Xyz,
    /// Y = 100
    pub normalized: Xyz,
    /// Rounded Robertson CCT
    pub cct: Option<f64>,
    /// CCT rounded to 100 K
    pub assumed_cct: Option<f64>,
    /// Assumed white is a blackbody
    pub planckian: bool,
    /// Y = 100
    pub assumed: Option<Xyz>,
}

impl WhitepointInfo {
    pub fn new(measured: Xyz, planckian: bool) -> Self {
        let normalized = measured.normalize_to_100();
        let cct = robertson_cct(normalized).map(round_half_up);
        let planckian = planckian
            || cct.is_some_and(|t| (PLANCKIAN_MIN_K..PLANCKIAN_FORCED_BELOW_K).contains(&t));
        let assumed_cct = cct.map(|t| round_half_up(t / 100.0) * 100.0);
        let assumed = assumed_cct.and_then(|t| {
            let white = if planckian {
                planckian_locus_xyz(t)
            } else {
                daylight_locus_xyz(t, 1.0)
            };
            if white.is_none() {
                tracing::warn!(cct = t, planckian, "no locus white for measured color temperature");
            }
            white.map(|w| w.scale(100.0))
        });
        Self {
            measured,
            normalized,
            cct,
            assumed_cct,
            planckian,
            assumed,
        }
    }

    pub fn luminance(&self) -> f64 {
        self.measured.y
    }
}

/// Display profile whitepoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileWhitepointInfo {
    pub xyz: Xyz,
    pub normalized: Xyz,
    pub cct: Option<f64>,
}

impl ProfileWhitepointInfo {
    pub fn new(xyz: Xyz) -> Self {
        let normalized = xyz.normalize_to_100();
        Self {
            xyz,
            normalized,
            cct: robertson_cct(normalized).map(round_half_up),
        }
    }
}

/// Measured black
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlackpointInfo {
    pub xyz: Xyz,
    pub luminance: f64,
    /// White luminance / black luminance
    pub contrast: Option<f64>,
}

impl BlackpointInfo {
    /// `None` when any component is below -1 (unmeasured)
    pub fn new(xyz: Xyz, whitepoint: Option<Xyz>) -> Option<Self> {
        if xyz.x <= -1.0 || xyz.y <= -1.0 || xyz.z <= -1.0 {
            return None;
        }
        Some(Self {
            xyz,
            luminance: xyz.y,
            contrast: whitepoint.map(|wp| wp.y / xyz.y),
        })
    }
}

// ============================================================================
// Patch colors
// ============================================================================

/// Target and actual color of one patch pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchColors {
    pub index: usize,
    /// Measurement RGB device values, 2 decimals
    pub rgb: Option<[f64; 3]>,
    /// Measurement CMYK device values, 2 decimals
    pub cmyk: Option<[f64; 4]>,
    pub target: Lab,
    pub actual: Lab,
    pub target_gamma: Option<f64>,
    pub actual_gamma: Option<f64>,
}

impl PatchColors {
    /// R = G = B
    pub fn is_gray(&self) -> bool {
        self.rgb.is_some_and(|[r, g, b]| r == g && g == b)
    }

    /// Device values compared against a rule selector entry
    fn matches(&self, entry: &[f64]) -> bool {
        let entry = entry.iter().map(|v| round_to(*v, 2));
        match entry.len() {
            3 => self.rgb.is_some_and(|rgb| rgb.iter().copied().eq(entry)),
            4 => self.cmyk.is_some_and(|cmyk| cmyk.iter().copied().eq(entry)),
            _ => false,
        }
    }
}

const NAN_LAB: Lab = Lab::new(f64::NAN, f64::NAN, f64::NAN);

fn patch_lab(patch: &Patch<'_>, whitepoint: Option<Xyz>, cat: CatMatrix) -> Option<Lab> {
    if let Some(lab) = patch.lab() {
        return Some(lab);
    }
    let xyz = patch.xyz()?;
    let xyz = match whitepoint {
        Some(wp) => adapt_xyz(xyz, wp, d50_100(), cat),
        None => xyz,
    };
    Some(Lab::from_xyz(xyz, D50))
}

fn to_absolute(lab: Lab, whitepoint: Option<Xyz>, cat: CatMatrix) -> Lab {
    let Some(wp) = whitepoint else {
        return lab;
    };
    let xyz = adapt_xyz(lab.to_xyz(d50_100()), d50_100(), wp, cat);
    Lab::from_xyz(xyz, D50)
}

/// `ln(Y / 100) / ln(signal / 100)`
fn gamma(lab: Lab, signal: f64) -> f64 {
    (lab.to_xyz(d50_100()).y / 100.0).ln() / (signal / 100.0).ln()
}

/// Fields each dataset is missing; Lab may be given as XYZ
fn missing_fields(dataset: &Dataset, required: &[String]) -> Vec<String> {
    let has_xyz = dataset.has_fields(&XYZ_FIELDS);
    required
        .iter()
        .filter(|f| !dataset.has_field(f))
        .filter(|f| !(has_xyz && LAB_FIELDS.iter().any(|l| l.eq_ignore_ascii_case(f))))
        .cloned()
        .collect()
}

// ============================================================================
// Rule results
// ============================================================================

/// Outcome of one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    /// Below the nominal tolerance
    Ok,
    /// Exactly at the nominal tolerance
    Warn,
    /// Beyond the nominal tolerance
    Fail,
    /// Informational
    StatOnly,
    /// Required data was not found
    Missing,
    /// Not applicable to this run
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleResult {
    pub index: usize,
    pub description: String,
    pub statistic: Statistic,
    pub nominal: Option<f64>,
    pub recommended: Option<f64>,
    pub metric: Option<DeltaFamily>,
    pub always_display: bool,
    /// Counts towards pass/fail under the report metric
    pub active: bool,
    pub value: Option<f64>,
    /// Indices of the patches the rule looked at
    pub matches: Vec<usize>,
    /// Patch that produced an extremal value
    pub patch: Option<usize>,
    /// Distinct levels and entry count for tone value rules
    pub tone_levels: Option<(usize, usize)>,
    pub status: RuleStatus,
    pub passed: Option<bool>,
    pub recommended_passed: Option<bool>,
}

impl RuleResult {
    fn skipped(index: usize, rule: &Rule, active: bool) -> Self {
        Self {
            index,
            description: rule.description.clone(),
            statistic: rule.statistic,
            nominal: None,
            recommended: None,
            metric: rule.metric,
            always_display: rule.always_display,
            active,
            value: None,
            matches: Vec::new(),
            patch: None,
            tone_levels: None,
            status: RuleStatus::Skipped,
            passed: None,
            recommended_passed: None,
        }
    }
}

/// Measured value and tolerance attached to a patch by a rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tolerance {
    pub actual: f64,
    pub tolerance: f64,
}

impl Tolerance {
    /// Classification of the annotated value
    pub fn status(&self) -> RuleStatus {
        classify(self.actual, self.tolerance, false)
    }
}

/// Per-patch tolerance annotations
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PatchTolerances {
    pub e: Option<Tolerance>,
    pub l: Option<Tolerance>,
    pub a: Option<Tolerance>,
    pub b: Option<Tolerance>,
    pub c: Option<Tolerance>,
    pub h: Option<Tolerance>,
}

impl PatchTolerances {
    fn slot(&mut self, quantity: Quantity) -> Option<&mut Option<Tolerance>> {
        match quantity {
            Quantity::E => Some(&mut self.e),
            Quantity::L => Some(&mut self.l),
            Quantity::A | Quantity::Ab => Some(&mut self.a),
            Quantity::B => Some(&mut self.b),
            Quantity::C => Some(&mut self.c),
            Quantity::H => Some(&mut self.h),
            Quantity::Ch => None,
        }
    }
}

/// Result of applying all rules
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub rules: Vec<RuleResult>,
    pub missing_data: bool,
    pub pass: bool,
    pub overachieve: bool,
    /// One entry per patch
    pub tolerances: Vec<PatchTolerances>,
}

/// Compare `round_to(|value|, 2)` against a tolerance
fn classify(value: f64, tolerance: f64, lower_bound: bool) -> RuleStatus {
    let v = round_to(value.abs(), 2);
    let ok = if lower_bound { v > tolerance } else { v < tolerance };
    if ok {
        RuleStatus::Ok
    } else if v == tolerance {
        RuleStatus::Warn
    } else {
        RuleStatus::Fail
    }
}

/// Unrounded tolerance check; NaN fails
fn within(value: f64, tolerance: f64, lower_bound: bool) -> bool {
    let v = value.abs();
    if lower_bound { v >= tolerance } else { v <= tolerance }
}

/// Per-patch value of a delta component
fn component(quantity: Quantity, d: &Delta) -> Option<f64> {
    match quantity {
        Quantity::E => Some(d.e),
        Quantity::L => Some(d.lw),
        Quantity::A => Some(d.a),
        Quantity::B => Some(d.b),
        Quantity::C => Some(d.cw),
        Quantity::H => Some(d.hw),
        Quantity::Ch => Some(d.ch),
        Quantity::Ab => None,
    }
}

// ============================================================================
// Comparison
// ============================================================================

/// Reference and measurement prepared for rule evaluation
#[derive(Debug, Clone)]
pub struct Comparison<'a> {
    pub criteria: &'a Criteria,
    pub context: &'a EvaluationContext,
    /// Delta family of the report
    pub family: DeltaFamily,
    pub device: Device,
    pub whitepoint: Option<WhitepointInfo>,
    pub profile_whitepoint: Option<ProfileWhitepointInfo>,
    pub blackpoint: Option<BlackpointInfo>,
    pub patches: Vec<PatchColors>,
    deltas: HashMap<DeltaFamily, Vec<Delta>>,
}

impl<'a> Comparison<'a> {
    pub fn new(
        reference: &Dataset,
        measurement: &Dataset,
        criteria: &'a Criteria,
        context: &'a EvaluationContext,
    ) -> Result<Self> {
        if reference.len() != measurement.len() {
            return Err(Error::LengthMismatch {
                reference: reference.len(),
                measurement: measurement.len(),
            });
        }
        let required = criteria.required_fields();
        let missing_measurement = missing_fields(measurement, &required);
        let missing_reference = missing_fields(reference, &required);
        if !missing_measurement.is_empty() || !missing_reference.is_empty() {
            return Err(Error::MissingFields {
                measurement: missing_measurement,
                reference: missing_reference,
                required,
            });
        }

        let family = match context.delta_method {
            Some(requested) if criteria.lock_delta_method => {
                if requested != criteria.delta_method {
                    tracing::warn!(
                        requested = %requested,
                        locked = %criteria.delta_method,
                        criteria = %criteria.id,
                        "criteria locks the delta method, ignoring request"
                    );
                }
                criteria.delta_method
            }
            Some(requested) => requested,
            None => criteria.delta_method,
        };

        let whitepoint = context
            .whitepoint
            .map(|wp| WhitepointInfo::new(wp, context.planckian));
        let profile_whitepoint = context.profile_whitepoint.map(ProfileWhitepointInfo::new);
        let blackpoint = context
            .blackpoint
            .and_then(|bp| BlackpointInfo::new(bp, context.whitepoint));

        let device = criteria.device();
        let wp_norm = whitepoint.as_ref().map(|w| w.normalized);
        let profile_norm = profile_whitepoint.as_ref().map(|p| p.normalized);
        let mut patches = Vec::with_capacity(measurement.len());
        for (target, actual) in reference.patches().zip(measurement.patches()) {
            let index = actual.index();
            let (target_lab, actual_lab) = (
                patch_lab(&target, profile_norm, context.cat),
                patch_lab(&actual, wp_norm, context.cat),
            );
            if target_lab.is_none() || actual_lab.is_none() {
                tracing::warn!(patch = index + 1, "patch without numeric color values");
            }
            // Non-numeric cells degrade to NaN, which fails every rule covering the patch
            let mut target_lab = target_lab.unwrap_or(NAN_LAB);
            let mut actual_lab = actual_lab.unwrap_or(NAN_LAB);
            let rgb = actual.rgb().map(|v| v.map(|c| round_to(c, 2)));
            let cmyk = match device {
                Device::Cmyk => actual.cmyk().map(|v| v.map(|c| round_to(c, 2))),
                Device::Rgb => None,
            };
            let mut colors = PatchColors {
                index,
                rgb,
                cmyk,
                target: target_lab,
                actual: actual_lab,
                target_gamma: None,
                actual_gamma: None,
            };
            if colors.is_gray() && context.gray_balance_cal_only {
                target_lab = Lab::new(actual_lab.l, 0.0, 0.0);
            }
            if context.absolute {
                target_lab = to_absolute(target_lab, profile_norm, context.cat);
                actual_lab = to_absolute(actual_lab, wp_norm, context.cat);
            }
            colors.target = target_lab;
            colors.actual = actual_lab;
            if let (true, Device::Rgb, Some([signal, ..])) = (colors.is_gray(), device, colors.rgb) {
                if signal > 0.0 && signal < 100.0 && target_lab.l > 0.0 && actual_lab.l > 0.0 {
                    colors.target_gamma = Some(gamma(target_lab, signal));
                    colors.actual_gamma = Some(gamma(actual_lab, signal));
                }
            }
            patches.push(colors);
        }

        let mut families = vec![family];
        for metric in criteria.rules.iter().filter_map(|r| r.metric) {
            if !families.contains(&metric) {
                families.push(metric);
            }
        }
        let deltas = families
            .into_iter()
            .map(|f| {
                let method = context.method(f);
                let values = patches
                    .iter()
                    .map(|p| delta(p.target, p.actual, &method))
                    .collect();
                (f, values)
            })
            .collect();

        tracing::debug!(
            criteria = %criteria.id,
            patches = patches.len(),
            family = %family,
            "prepared comparison"
        );

        Ok(Self {
            criteria,
            context,
            family,
            device,
            whitepoint,
            profile_whitepoint,
            blackpoint,
            patches,
            deltas,
        })
    }

    /// Per-patch deltas under a family
    pub fn deltas(&self, family: DeltaFamily) -> &[Delta] {
        self.deltas.get(&family).map_or(&[], Vec::as_slice)
    }

    /// Delta between the ideal white and the measured white relative to
    /// the compared whitepoint
    fn whitepoint_delta(&self, selector: &Selector, family: DeltaFamily) -> Option<Delta> {
        let wp = self.whitepoint.as_ref()?;
        let white = match selector {
            Selector::WhitepointMeasuredVsAssumed => wp.assumed?,
            Selector::WhitepointMeasuredVsProfile => self.profile_whitepoint.as_ref()?.normalized,
            _ => return None,
        };
        let actual = Lab::from_xyz(wp.normalized, white);
        Some(delta(Lab::new(100.0, 0.0, 0.0), actual, &self.context.method(family)))
    }

    /// Apply every rule of the criteria
    pub fn evaluate(&self) -> Evaluation {
        let mut missing_data = false;
        let mut results = Vec::with_capacity(self.criteria.rules.len());
        for (index, rule) in self.criteria.rules.iter().enumerate() {
            let result = self.evaluate_rule(index, rule);
            if result.status == RuleStatus::Missing
                || (result.value.is_none()
                    && !matches!(rule.selector, Selector::CalibrationLevels(_))
                    && result.status != RuleStatus::Skipped
                    && !matches!(rule.statistic, Statistic::Gamma(_)))
            {
                missing_data = true;
            }
            tracing::debug!(
                rule = %result.description,
                value = ?result.value,
                status = ?result.status,
                "evaluated rule"
            );
            results.push(result);
        }

        let mut pass = true;
        let mut overachieve = true;
        for result in results.iter().filter(|r| r.active) {
            if result.nominal.is_none() {
                continue;
            }
            if missing_data || result.passed != Some(true) {
                pass = false;
            }
            if result.recommended.is_some() && (missing_data || result.recommended_passed != Some(true)) {
                overachieve = false;
            }
        }

        let tolerances = self.tolerances(&results);
        Evaluation {
            rules: results,
            missing_data,
            pass,
            overachieve,
            tolerances,
        }
    }

    fn evaluate_rule(&self, index: usize, rule: &Rule) -> RuleResult {
        let active = rule.is_active(self.family);
        let family = rule.metric.unwrap_or(self.family);
        let mut matches = Vec::new();
        let mut tone_levels = None;

        let value = match &rule.selector {
            Selector::CalibrationLevels(channel) => {
                let Some(levels) = self.context.calibration_levels.filter(|l| l.entry_count > 0) else {
                    return RuleResult::skipped(index, rule, active);
                };
                tone_levels = Some((levels.levels(*channel), levels.entry_count));
                Some(levels.percent(*channel))
            }
            selector if selector.is_whitepoint() => {
                let Some(d) = self.whitepoint_delta(selector, family) else {
                    return RuleResult::skipped(index, rule, active);
                };
                Some(self.reduce(rule.statistic, &[d]))
            }
            selector => {
                let deltas = self.deltas(family);
                let mut selected = Vec::new();
                let mut gammas = Vec::new();
                for (colors, d) in self.patches.iter().zip(deltas) {
                    let matched = match selector {
                        Selector::Patches(entries) => entries.iter().any(|e| colors.matches(e)),
                        _ => true,
                    };
                    if !matched {
                        continue;
                    }
                    selected.push(*d);
                    if let Some(g) = colors.actual_gamma {
                        gammas.push(g);
                    }
                    let is_gamma = matches!(rule.statistic, Statistic::Gamma(_));
                    if (!selector.is_empty() || rule.statistic.is_extremal())
                        && (!is_gamma || colors.actual_gamma.is_some())
                    {
                        matches.push(colors.index);
                    }
                }
                if selector.is_empty() || matches.len() >= selector.len() {
                    match rule.statistic {
                        Statistic::Gamma(_) if gammas.is_empty() => None,
                        Statistic::Gamma(_) => Some(rule.statistic.reduce(&gammas)),
                        stat => Some(self.reduce(stat, &selected)),
                    }
                } else {
                    None
                }
            }
        };

        let patch = match value {
            Some(v) if rule.statistic.is_extremal() => matches.iter().copied().find(|&i| {
                match rule.statistic {
                    Statistic::Gamma(_) => self.patches[i].actual_gamma == Some(v),
                    Statistic::Delta(q, _) => {
                        self.deltas(family).get(i).and_then(|d| component(q, d)) == Some(v)
                    }
                    Statistic::ToneValues => false,
                }
            }),
            _ => None,
        };

        let lower = rule.statistic.is_lower_bound();
        let status = match (active, rule.nominal, value) {
            (true, Some(_), None) => RuleStatus::Missing,
            (true, Some(nominal), Some(v)) => classify(v, nominal, lower),
            _ => RuleStatus::StatOnly,
        };
        RuleResult {
            index,
            description: rule.description.clone(),
            statistic: rule.statistic,
            nominal: rule.nominal,
            recommended: rule.recommended,
            metric: rule.metric,
            always_display: rule.always_display,
            active,
            value,
            matches,
            patch,
            tone_levels,
            status,
            passed: rule.nominal.map(|n| value.is_some_and(|v| within(v, n, lower))),
            recommended_passed: rule.recommended.map(|r| value.is_some_and(|v| within(v, r, lower))),
        }
    }

    /// Reduce a delta statistic over a list of deltas
    fn reduce(&self, statistic: Statistic, deltas: &[Delta]) -> f64 {
        let values: Vec<f64> = match statistic.quantity() {
            Some(Quantity::Ab) => deltas.iter().map(|d| d.a).chain(deltas.iter().map(|d| d.b)).collect(),
            Some(q) => deltas.iter().filter_map(|d| component(q, d)).collect(),
            None => deltas.iter().map(|d| d.e).collect(),
        };
        statistic.reduce(&values)
    }

    /// Tolerance annotations from active per-patch rules; later rules win
    fn tolerances(&self, results: &[RuleResult]) -> Vec<PatchTolerances> {
        let mut tolerances = vec![PatchTolerances::default(); self.patches.len()];
        for (rule, result) in self.criteria.rules.iter().zip(results) {
            let (Some(metric), Some(nominal), Some(value)) = (rule.metric, rule.nominal, result.value) else {
                continue;
            };
            if metric != self.family {
                continue;
            }
            let Statistic::Delta(quantity, reducer) = rule.statistic else {
                continue;
            };
            let deltas = self.deltas(metric);
            for &i in &result.matches {
                let actual = match reducer {
                    Reducer::Max => {
                        match deltas.get(i).and_then(|d| component(quantity, d)) {
                            Some(v) => v.abs(),
                            None => value.abs(),
                        }
                    }
                    _ => value.abs(),
                };
                if let Some(slot) = tolerances[i].slot(quantity) {
                    *slot = Some(Tolerance {
                        actual,
                        tolerance: nominal,
                    });
                }
            }
        }
        tolerances
    }
}
