//! Verification criteria
//!
//! A [`Criteria`] is a named list of [`Rule`]s. Each rule selects a subset of
//! patches (or a whitepoint, or calibration tone levels), reduces one delta
//! component over them with a [`Statistic`] and optionally compares the
//! result against a nominal and a recommended tolerance.
//!
//! Built-in sets cover generic RGB and CMYK verification, the IDEAlliance
//! and Fogra control strips and ISO 14861. User sets can be loaded from JSON
//! or YAML:
//!
//! ```yaml
//! - id: MY_RGB
//!   name: My display check
//!   delta_method: CIE00
//!   rules:
//!     - description: Average ΔE*00
//!       statistic: DELTA_E_AVG
//!       nominal: 1.5
//!       metric: CIE00
//!     - description: Paper white ΔL*00
//!       selector: { patches: [[100, 100, 100]] }
//!       statistic: DELTA_L_MAX
//!       nominal: 2
//!       metric: CIE00
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use calverify_core::math::stats;
use calverify_core::D50;
use calverify_core::DeltaFamily::{self, Cie76, Cie94, Cie2000, Ictcp};
use serde::{Deserialize, Serialize};

use crate::cgats::{CMYK_FIELDS, Dataset, Device, LAB_FIELDS, RGB_FIELDS};
use crate::error::{Error, Result};

// ============================================================================
// Statistics
// ============================================================================

/// Delta component a rule aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantity {
    /// Total difference
    E,
    /// Weighted lightness difference
    L,
    /// Δa
    A,
    /// Δb
    B,
    /// Weighted chroma difference
    C,
    /// Weighted hue difference
    H,
    /// Chromaticity distance √(Δa² + Δb²)
    Ch,
    /// Δa and Δb pooled together
    Ab,
}

impl Quantity {
    fn name(&self) -> &'static str {
        match self {
            Self::E => "E",
            Self::L => "L",
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::H => "H",
            Self::Ch => "CH",
            Self::Ab => "A_B",
        }
    }
}

/// Reduction applied to the selected values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reducer {
    Max,
    Min,
    Avg,
    Med,
    Mad,
    Stddev,
    Range,
    P95,
    P99,
}

impl Reducer {
    const ALL: [Reducer; 9] = [
        Self::Max,
        Self::Min,
        Self::Avg,
        Self::Med,
        Self::Mad,
        Self::Stddev,
        Self::Range,
        Self::P95,
        Self::P99,
    ];

    fn name(&self) -> &'static str {
        match self {
            Self::Max => "MAX",
            Self::Min => "MIN",
            Self::Avg => "AVG",
            Self::Med => "MED",
            Self::Mad => "MAD",
            Self::Stddev => "STDDEV",
            Self::Range => "RANGE",
            Self::P95 => "PERCENTILE_95",
            Self::P99 => "PERCENTILE_99",
        }
    }
}

impl FromStr for Reducer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidCriteria(format!("unknown statistic reducer \"{s}\"")))
    }
}

/// What a rule computes, named like `DELTA_E_MAX` or `GAMMA_AVG`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Statistic {
    /// Reduction of a delta component
    Delta(Quantity, Reducer),
    /// Reduction of per-patch gamma
    Gamma(Reducer),
    /// Percentage of distinct calibration tone levels (lower bound)
    ToneValues,
}

impl Statistic {
    /// Tolerances are minimums rather than maximums
    pub fn is_lower_bound(&self) -> bool {
        matches!(self, Self::ToneValues)
    }

    /// Result is the value of one particular patch
    pub fn is_extremal(&self) -> bool {
        matches!(
            self,
            Self::Delta(_, Reducer::Max | Reducer::Min) | Self::Gamma(Reducer::Max | Reducer::Min)
        )
    }

    pub fn quantity(&self) -> Option<Quantity> {
        match self {
            Self::Delta(q, _) => Some(*q),
            _ => None,
        }
    }

    pub fn reducer(&self) -> Option<Reducer> {
        match self {
            Self::Delta(_, r) | Self::Gamma(r) => Some(*r),
            Self::ToneValues => None,
        }
    }

    /// Reduce a list of values
    ///
    /// The maximum of signed deltas keeps the sign of the largest magnitude
    /// and their average is taken over magnitudes.
    pub fn reduce(&self, values: &[f64]) -> f64 {
        let Some(reducer) = self.reducer() else {
            return stats::avg(values);
        };
        let signed = !matches!(self, Self::Gamma(_) | Self::Delta(Quantity::E, _));
        match reducer {
            Reducer::Max if signed => stats::absmax(values),
            Reducer::Max => stats::max(values),
            Reducer::Min => stats::min(values),
            Reducer::Avg if signed => stats::avgabs(values),
            Reducer::Avg => stats::avg(values),
            Reducer::Med => stats::median(values),
            Reducer::Mad => stats::mad(values),
            Reducer::Stddev => stats::stddev(values),
            Reducer::Range => stats::range(values),
            Reducer::P95 => stats::percentile(values, 0.95),
            Reducer::P99 => stats::percentile(values, 0.99),
        }
    }

    /// Canonical name
    pub fn name(&self) -> String {
        match self {
            Self::Delta(q, r) => format!("DELTA_{}_{}", q.name(), r.name()),
            Self::Gamma(r) => format!("GAMMA_{}", r.name()),
            Self::ToneValues => "TONE_VALUES".to_string(),
        }
    }
}

impl FromStr for Statistic {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        if upper.is_empty() || upper == "TONE_VALUES" {
            return Ok(Self::ToneValues);
        }
        if let Some(rest) = upper.strip_prefix("GAMMA_") {
            return Ok(Self::Gamma(rest.parse()?));
        }
        let Some(rest) = upper.strip_prefix("DELTA_") else {
            return Err(Error::InvalidCriteria(format!("unknown statistic \"{s}\"")));
        };
        // Longer prefixes first: CH before C, A_B before A
        const QUANTITIES: [(&str, Quantity); 8] = [
            ("A_B_", Quantity::Ab),
            ("CH_", Quantity::Ch),
            ("E_", Quantity::E),
            ("L_", Quantity::L),
            ("A_", Quantity::A),
            ("B_", Quantity::B),
            ("C_", Quantity::C),
            ("H_", Quantity::H),
        ];
        for (prefix, quantity) in QUANTITIES {
            if let Some(reducer) = rest.strip_prefix(prefix) {
                return Ok(Self::Delta(quantity, reducer.parse()?));
            }
        }
        Err(Error::InvalidCriteria(format!("unknown statistic \"{s}\"")))
    }
}

impl TryFrom<String> for Statistic {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Statistic> for String {
    fn from(stat: Statistic) -> Self {
        stat.name()
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ============================================================================
// Rules
// ============================================================================

/// Calibration channel for tone level rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Red,
    Green,
    Blue,
    Gray,
}

/// Which data a rule looks at
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selector {
    /// Every patch
    #[default]
    All,
    /// Patches whose device values match one of the entries
    /// (3 values for RGB, 4 for CMYK)
    Patches(Vec<Vec<f64>>),
    /// Measured whitepoint against the white assumed from its CCT
    WhitepointMeasuredVsAssumed,
    /// Measured whitepoint against the display profile whitepoint
    WhitepointMeasuredVsProfile,
    /// Distinct tone levels of the calibration curves
    CalibrationLevels(Channel),
}

impl Selector {
    pub fn is_whitepoint(&self) -> bool {
        matches!(
            self,
            Self::WhitepointMeasuredVsAssumed | Self::WhitepointMeasuredVsProfile
        )
    }

    /// Number of patch entries, 0 for non-patch selectors
    pub fn len(&self) -> usize {
        match self {
            Self::Patches(p) => p.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One line of a criteria set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub description: String,
    #[serde(default)]
    pub selector: Selector,
    #[serde(default = "default_statistic")]
    pub statistic: Statistic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended: Option<f64>,
    /// Delta family this rule is evaluated under; `None` follows the report
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<DeltaFamily>,
    /// Show in summaries even when inactive
    #[serde(default)]
    pub always_display: bool,
}

fn default_statistic() -> Statistic {
    Statistic::Delta(Quantity::E, Reducer::Max)
}

impl Rule {
    pub fn new(description: impl Into<String>, selector: Selector, statistic: Statistic) -> Self {
        Self {
            description: description.into(),
            selector,
            statistic,
            nominal: None,
            recommended: None,
            metric: None,
            always_display: false,
        }
    }

    pub fn tolerance(mut self, nominal: Option<f64>, recommended: Option<f64>) -> Self {
        self.nominal = nominal;
        self.recommended = recommended;
        self
    }

    pub fn metric(mut self, metric: DeltaFamily) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn always_display(mut self) -> Self {
        self.always_display = true;
        self
    }

    /// Whether the rule counts towards pass/fail under the report metric
    pub fn is_active(&self, report: DeltaFamily) -> bool {
        self.metric.is_none_or(|m| m == report)
    }
}

// ============================================================================
// Criteria
// ============================================================================

fn default_fields_match() -> Vec<String> {
    RGB_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_fields_compare() -> Vec<String> {
    LAB_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_pass_text() -> String {
    "Nominal tolerance passed".to_string()
}

fn default_fail_text() -> String {
    "Nominal tolerance exceeded".to_string()
}

fn default_pass_recommended_text() -> Option<String> {
    Some("Recommended tolerance passed".to_string())
}

fn default_delta_method() -> DeltaFamily {
    DeltaFamily::Cie2000
}

fn default_warn_deviation() -> Option<f64> {
    Some(5.0)
}

/// A named set of rules plus report settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    pub id: String,
    pub name: String,
    /// Name of the control strip this set is meant for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strip_name: Option<String>,
    /// Device fields used to match patches against rule selectors
    #[serde(default = "default_fields_match")]
    pub fields_match: Vec<String>,
    /// Measurement fields compared between reference and measurement
    #[serde(default = "default_fields_compare")]
    pub fields_compare: Vec<String>,
    #[serde(default = "default_pass_text")]
    pub pass_text: String,
    #[serde(default = "default_fail_text")]
    pub fail_text: String,
    #[serde(default = "default_pass_recommended_text")]
    pub pass_recommended_text: Option<String>,
    #[serde(default)]
    pub fail_recommended_text: Option<String>,
    /// Delta family used for the overview and for metric-less rules
    #[serde(default = "default_delta_method")]
    pub delta_method: DeltaFamily,
    /// Ignore a caller supplied delta family
    #[serde(default)]
    pub lock_delta_method: bool,
    /// Overview rows at or above this ΔE are flagged
    #[serde(default = "default_warn_deviation")]
    pub warn_deviation: Option<f64>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

impl Criteria {
    fn new(id: &str, name: &str, device: Device, rules: Vec<Rule>) -> Self {
        let fields_match = match device {
            Device::Rgb => default_fields_match(),
            Device::Cmyk => CMYK_FIELDS.iter().map(|f| f.to_string()).collect(),
        };
        Self {
            id: id.to_string(),
            name: name.to_string(),
            strip_name: None,
            fields_match,
            fields_compare: default_fields_compare(),
            pass_text: default_pass_text(),
            fail_text: default_fail_text(),
            pass_recommended_text: default_pass_recommended_text(),
            fail_recommended_text: None,
            delta_method: default_delta_method(),
            lock_delta_method: false,
            warn_deviation: default_warn_deviation(),
            rules,
        }
    }

    /// Device the match fields belong to
    pub fn device(&self) -> Device {
        if CMYK_FIELDS
            .iter()
            .all(|f| self.fields_match.iter().any(|m| m.eq_ignore_ascii_case(f)))
        {
            Device::Cmyk
        } else {
            Device::Rgb
        }
    }

    /// Fields both datasets must carry
    pub fn required_fields(&self) -> Vec<String> {
        self.fields_match
            .iter()
            .chain(&self.fields_compare)
            .cloned()
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::InvalidCriteria("criteria without id".to_string()));
        }
        let width = self.fields_match.len();
        for rule in &self.rules {
            if let Selector::Patches(patches) = &rule.selector {
                if let Some(p) = patches.iter().find(|p| p.len() != width) {
                    return Err(Error::InvalidCriteria(format!(
                        "{}: rule \"{}\" has a patch with {} values, expected {}",
                        self.id,
                        rule.description,
                        p.len(),
                        width
                    )));
                }
            }
        }
        Ok(())
    }

    fn reset_tolerances(&mut self) {
        for rule in &mut self.rules {
            rule.nominal = None;
            rule.recommended = None;
        }
    }
}

// ============================================================================
// Built-in tables
// ============================================================================

const FAMILIES: [DeltaFamily; 3] = [Cie76, Cie94, Cie2000];

const CMYK_SOLID_PRIMARIES: [[f64; 4]; 4] = [
    [100.0, 0.0, 0.0, 0.0],
    [0.0, 100.0, 0.0, 0.0],
    [0.0, 0.0, 100.0, 0.0],
    [0.0, 0.0, 0.0, 100.0],
];

const CMY_SOLID_SECONDARIES: [[f64; 4]; 3] = [
    [100.0, 100.0, 0.0, 0.0],
    [0.0, 100.0, 100.0, 0.0],
    [100.0, 0.0, 100.0, 0.0],
];

const IDEALLIANCE_2009_CMY_GRAY: [[f64; 4]; 5] = [
    [3.1, 2.2, 2.2, 0.0],
    [10.2, 7.4, 7.4, 0.0],
    [25.0, 19.0, 19.0, 0.0],
    [50.0, 40.0, 40.0, 0.0],
    [75.0, 66.0, 66.0, 0.0],
];

const ISO12647_7_CMY_GRAY: [[f64; 4]; 6] = [
    [100.0, 85.0, 85.0, 0.0],
    [80.0, 65.0, 65.0, 0.0],
    [60.0, 45.0, 45.0, 0.0],
    [40.0, 27.0, 27.0, 0.0],
    [20.0, 12.0, 12.0, 0.0],
    [10.0, 6.0, 6.0, 0.0],
];

const IDEALLIANCE_2013_TINTS: [[f64; 4]; 18] = [
    [75.0, 0.0, 0.0, 0.0],
    [50.0, 0.0, 0.0, 0.0],
    [25.0, 0.0, 0.0, 0.0],
    [10.0, 0.0, 0.0, 0.0],
    [0.0, 75.0, 0.0, 0.0],
    [0.0, 50.0, 0.0, 0.0],
    [0.0, 25.0, 0.0, 0.0],
    [0.0, 10.0, 0.0, 0.0],
    [0.0, 0.0, 75.0, 0.0],
    [0.0, 0.0, 50.0, 0.0],
    [0.0, 0.0, 25.0, 0.0],
    [0.0, 0.0, 10.0, 0.0],
    [0.0, 0.0, 0.0, 90.0],
    [0.0, 0.0, 0.0, 75.0],
    [0.0, 0.0, 0.0, 50.0],
    [0.0, 0.0, 0.0, 25.0],
    [0.0, 0.0, 0.0, 10.0],
    [0.0, 0.0, 0.0, 3.0],
];

const IDEALLIANCE_2013_CMY_GRAY: [[f64; 4]; 6] = [
    [3.0, 2.24, 2.24, 0.0],
    [10.0, 7.46, 7.46, 0.0],
    [25.0, 18.88, 18.88, 0.0],
    [50.0, 40.0, 40.0, 0.0],
    [75.0, 66.12, 66.12, 0.0],
    [90.0, 85.34, 85.34, 0.0],
];

const PAPER_WHITE: [[f64; 4]; 1] = [[0.0, 0.0, 0.0, 0.0]];

fn patches<const N: usize>(entries: &[[f64; N]]) -> Selector {
    Selector::Patches(entries.iter().map(|p| p.to_vec()).collect())
}

fn delta(q: Quantity, r: Reducer) -> Statistic {
    Statistic::Delta(q, r)
}

/// Suffix used in rule descriptions (`ΔE*76`, `ΔICtCp`)
fn e_label(family: DeltaFamily) -> &'static str {
    match family {
        Cie76 => "ΔE*76",
        Cie94 => "ΔE*94",
        Ictcp => "ΔICtCp",
        _ => "ΔE*00",
    }
}

/// Rules without tolerances; index positions are referenced by the
/// tolerance tables below
fn neutral_rules() -> Vec<Rule> {
    use Reducer::*;
    let mut rules = Vec::with_capacity(32);
    let by_family = |rules: &mut Vec<Rule>, prefix: &str, selector: Selector, stat: Statistic| {
        for family in FAMILIES {
            rules.push(
                Rule::new(format!("{prefix}{}", e_label(family)), selector.clone(), stat).metric(family),
            );
        }
    };
    by_family(
        &mut rules,
        "Measured vs. assumed target whitepoint ",
        Selector::WhitepointMeasuredVsAssumed,
        delta(Quantity::E, Max),
    );
    by_family(
        &mut rules,
        "Measured vs. display profile whitepoint ",
        Selector::WhitepointMeasuredVsProfile,
        delta(Quantity::E, Max),
    );
    let summaries = [
        ("Average ", Avg),
        ("Maximum ", Max),
        ("Median ", Med),
        ("Median absolute deviation ", Mad),
        ("Standard deviation ", Stddev),
    ];
    for (prefix, reducer) in summaries {
        by_family(&mut rules, prefix, Selector::All, delta(Quantity::E, reducer));
    }
    for (name, channel) in [
        ("red", Channel::Red),
        ("green", Channel::Green),
        ("blue", Channel::Blue),
        ("grayscale", Channel::Gray),
    ] {
        rules.push(
            Rule::new(
                format!("Calibration {name} tone values"),
                Selector::CalibrationLevels(channel),
                Statistic::ToneValues,
            )
            .tolerance(None, Some(95.0)),
        );
    }
    rules.push(
        Rule::new(
            "Measured vs. assumed target whitepoint ΔICtCp",
            Selector::WhitepointMeasuredVsAssumed,
            delta(Quantity::E, Max),
        )
        .metric(Ictcp),
    );
    rules.push(
        Rule::new(
            "Measured vs. display profile whitepoint ΔICtCp",
            Selector::WhitepointMeasuredVsProfile,
            delta(Quantity::E, Max),
        )
        .metric(Ictcp),
    );
    for (prefix, reducer) in summaries {
        rules.push(
            Rule::new(format!("{prefix}ΔICtCp"), Selector::All, delta(Quantity::E, reducer)).metric(Ictcp),
        );
    }
    rules
}

/// (rule index, nominal, recommended)
const DEFAULT_TOLERANCES: [(usize, Option<f64>, Option<f64>); 16] = [
    (0, Some(2.0), Some(1.0)),
    (1, Some(2.0), Some(1.0)),
    (2, Some(2.0), Some(1.0)),
    (3, None, Some(1.0)),
    (4, None, Some(1.0)),
    (5, None, Some(1.0)),
    (6, Some(3.0), Some(1.5)),
    (7, Some(1.5), Some(1.0)),
    (8, Some(1.5), Some(1.0)),
    (9, Some(6.0), Some(4.0)),
    (10, Some(4.0), Some(3.0)),
    (11, Some(4.0), Some(3.0)),
    (25, Some(2.0), Some(1.0)),
    (26, None, Some(1.0)),
    (27, Some(1.5), Some(1.0)),
    (28, Some(5.0), Some(3.0)),
];

const AVERAGE_E00: usize = 8;
const MAXIMUM_E00: usize = 11;

fn default_rules() -> Vec<Rule> {
    let mut rules = neutral_rules();
    for (i, nominal, recommended) in DEFAULT_TOLERANCES {
        rules[i].nominal = nominal;
        rules[i].recommended = recommended;
    }
    rules
}

fn rgb_rules() -> Vec<Rule> {
    use Reducer::*;
    let mut rules = default_rules();
    for (name, reducer) in [
        ("maximum", Max),
        ("minimum", Min),
        ("range", Range),
        ("average", Avg),
        ("median", Med),
        ("median absolute deviation", Mad),
        ("standard deviation", Stddev),
    ] {
        rules.push(Rule::new(format!("Gamma {name}"), Selector::All, Statistic::Gamma(reducer)));
    }
    rules
}

fn gray_balance_rules(grayscale: &[[f64; 3]]) -> Vec<Rule> {
    use Reducer::*;
    let selector = patches(grayscale);
    let prefix = "RGB gray balance (>= 1% luminance)";
    // (family, average chroma, a/b pair, maximum chroma)
    let labels = [
        (Cie76, "absolute ΔC*76", "Δa*76 and Δb*76", "ΔC*76"),
        (Cie94, "absolute weighted ΔC*94", "Δa*94 and Δb*94", "weighted ΔC*94"),
        (Cie2000, "absolute weighted ΔC'00", "Δa*00 and Δb*00", "weighted ΔC'00"),
        (Ictcp, "absolute ΔC CtCp", "ΔCt and ΔCp", "ΔC CtCp"),
    ];
    let mut rules = Vec::with_capacity(12);
    for (family, avg, ab, max) in labels {
        rules.push(
            Rule::new(format!("{prefix} average {avg}"), selector.clone(), delta(Quantity::C, Avg))
                .tolerance(Some(1.0), Some(0.5))
                .metric(family),
        );
        rules.push(
            Rule::new(format!("{prefix} combined {ab} range"), selector.clone(), delta(Quantity::Ab, Range))
                .tolerance(Some(2.0), Some(1.5))
                .metric(family),
        );
        rules.push(
            Rule::new(format!("{prefix} maximum {max}"), selector.clone(), delta(Quantity::C, Max)).metric(family),
        );
    }
    rules
}

fn hue_chroma_rules() -> Vec<Rule> {
    use Reducer::*;
    let families = [Cie76, Cie94, Cie2000, Ictcp];
    let label = |q: &str, family: DeltaFamily| match family {
        Cie76 => format!("Δ{q}*76"),
        Cie94 => format!("weighted Δ{q}*94"),
        Ictcp => format!("Δ{q} CtCp"),
        _ => format!("weighted Δ{q}'00"),
    };
    let mut rules = Vec::with_capacity(56);
    let whitepoints = [
        (
            "Measured vs. assumed target whitepoint",
            Selector::WhitepointMeasuredVsAssumed,
            Some(2.0),
        ),
        (
            "Measured vs. display profile whitepoint",
            Selector::WhitepointMeasuredVsProfile,
            None,
        ),
    ];
    for (prefix, selector, nominal) in whitepoints {
        for (q, quantity) in [("C", Quantity::C), ("H", Quantity::H)] {
            for family in families {
                rules.push(
                    Rule::new(format!("{prefix} {}", label(q, family)), selector.clone(), delta(quantity, Max))
                        .tolerance(nominal, Some(1.0))
                        .metric(family),
                );
            }
        }
    }
    let summaries = [
        ("Average", Avg),
        ("Maximum", Max),
        ("Median", Med),
        ("Median absolute deviation", Mad),
        ("Standard deviation", Stddev),
    ];
    for (prefix, reducer) in summaries {
        for (q, quantity) in [("C", Quantity::C), ("H", Quantity::H)] {
            for family in families {
                let (nominal, recommended) = match (reducer, family) {
                    (Avg, Cie76) => (Some(3.0), Some(1.5)),
                    (Avg, _) => (Some(1.5), Some(1.0)),
                    (Max, Cie76) => (Some(6.0), Some(4.0)),
                    (Max, Ictcp) => (Some(5.0), Some(3.0)),
                    (Max, _) => (Some(4.0), Some(3.0)),
                    _ => (None, None),
                };
                rules.push(
                    Rule::new(format!("{prefix} {}", label(q, family)), Selector::All, delta(quantity, reducer))
                        .tolerance(nominal, recommended)
                        .metric(family),
                );
            }
        }
    }
    rules
}

fn rgb() -> Criteria {
    let mut c = Criteria::new("RGB", "RGB", Device::Rgb, rgb_rules());
    c.strip_name = Some("RGB".to_string());
    c
}

fn rgb_gray(grayscale: &[[f64; 3]]) -> Criteria {
    let mut c = rgb();
    c.id = "RGB_GRAY".to_string();
    c.name = "RGB + gray balance".to_string();
    c.rules.extend(gray_balance_rules(grayscale));
    c
}

fn cmyk() -> Criteria {
    let mut c = Criteria::new("CMYK", "CMYK", Device::Cmyk, default_rules());
    c.strip_name = Some("CMYK".to_string());
    c
}

fn idealliance_2009() -> Criteria {
    use Reducer::Max;
    let mut rules = default_rules();
    rules[AVERAGE_E00].nominal = Some(2.0);
    rules[MAXIMUM_E00].nominal = Some(6.0);
    let gray = patches(&IDEALLIANCE_2009_CMY_GRAY);
    rules.extend([
        Rule::new("Paper white ΔL*00", patches(&PAPER_WHITE), delta(Quantity::L, Max))
            .tolerance(Some(2.0), Some(1.0)),
        Rule::new("Paper white Δa*00", patches(&PAPER_WHITE), delta(Quantity::A, Max))
            .tolerance(Some(1.0), Some(0.5)),
        Rule::new("Paper white Δb*00", patches(&PAPER_WHITE), delta(Quantity::B, Max))
            .tolerance(Some(2.0), Some(1.0)),
        Rule::new(
            "CMYK solids maximum ΔE*00",
            Selector::Patches(
                CMYK_SOLID_PRIMARIES
                    .iter()
                    .chain(&CMY_SOLID_SECONDARIES)
                    .map(|p| p.to_vec())
                    .collect(),
            ),
            delta(Quantity::E, Max),
        )
        .tolerance(Some(7.0), Some(3.0)),
        Rule::new("CMY 50% grey ΔE*00", patches(&[[50.0, 40.0, 40.0, 0.0]]), delta(Quantity::E, Max))
            .tolerance(Some(1.5), Some(0.75)),
        Rule::new("CMY grey maximum ΔL*00", gray.clone(), delta(Quantity::L, Max)).tolerance(Some(2.0), Some(1.0)),
        Rule::new("CMY grey maximum Δa*00", gray.clone(), delta(Quantity::A, Max)).tolerance(Some(1.0), Some(0.5)),
        Rule::new("CMY grey maximum Δb*00", gray.clone(), delta(Quantity::B, Max)).tolerance(Some(1.0), Some(0.5)),
        Rule::new("CMY grey maximum ΔE*00", gray, delta(Quantity::E, Max)).tolerance(Some(2.0), Some(1.0)),
    ]);
    for rule in rules.iter_mut().skip(32) {
        rule.metric = Some(Cie2000);
    }
    let mut c = Criteria::new(
        "IDEALLIANCE_2009",
        "IDEAlliance Control Strip 2009",
        Device::Cmyk,
        rules,
    );
    c.lock_delta_method = true;
    c.warn_deviation = Some(3.0);
    c
}

fn fogra_mw3() -> Criteria {
    use Reducer::{Avg, Max};
    let mut rules = neutral_rules();
    rules[AVERAGE_E00].nominal = Some(2.5);
    rules[MAXIMUM_E00].nominal = Some(5.0);
    let gray = patches(&ISO12647_7_CMY_GRAY);
    rules.extend([
        Rule::new("Paper white ΔE*00", patches(&PAPER_WHITE), delta(Quantity::E, Max))
            .tolerance(Some(3.0), Some(1.0))
            .metric(Cie2000),
        Rule::new(
            "CMYK solids maximum ΔE*00",
            Selector::Patches(
                CMYK_SOLID_PRIMARIES
                    .iter()
                    .chain(&CMY_SOLID_SECONDARIES)
                    .map(|p| p.to_vec())
                    .collect(),
            ),
            delta(Quantity::E, Max),
        )
        .tolerance(Some(3.0), Some(2.0))
        .metric(Cie2000),
        Rule::new("CMY maximum ΔH*ab", patches(&CMYK_SOLID_PRIMARIES[..3]), delta(Quantity::H, Max))
            .tolerance(Some(2.5), Some(2.0))
            .metric(Cie76)
            .always_display(),
        Rule::new("CMY grey average ΔCh", gray.clone(), delta(Quantity::Ch, Avg))
            .tolerance(Some(2.0), Some(1.5))
            .metric(Cie2000),
        Rule::new("CMY grey maximum ΔCh", gray, delta(Quantity::Ch, Max))
            .tolerance(Some(3.5), Some(2.5))
            .metric(Cie2000),
    ]);
    let mut c = Criteria::new(
        "FOGRA_MW3",
        "Fogra Media Wedge V3 (ISO 12647-7:2016)",
        Device::Cmyk,
        rules,
    );
    c.strip_name = Some("Ugra/Fogra Media Wedge CMYK V3.0".to_string());
    c.lock_delta_method = true;
    c
}

fn idealliance_2013() -> Criteria {
    use Reducer::Max;
    let mut rules = neutral_rules();
    rules[AVERAGE_E00].nominal = Some(4.0);
    rules[MAXIMUM_E00].nominal = Some(6.5);
    rules.extend([
        Rule::new(
            "CMYK primaries maximum ΔE*00",
            Selector::Patches(
                CMYK_SOLID_PRIMARIES
                    .iter()
                    .chain(&IDEALLIANCE_2013_TINTS)
                    .map(|p| p.to_vec())
                    .collect(),
            ),
            delta(Quantity::E, Max),
        )
        .tolerance(Some(5.0), None)
        .metric(Cie2000),
        Rule::new("CMY grey maximum ΔE*00", patches(&IDEALLIANCE_2013_CMY_GRAY), delta(Quantity::E, Max))
            .tolerance(Some(3.0), None)
            .metric(Cie2000),
    ]);
    let mut c = Criteria::new(
        "IDEALLIANCE_2013",
        "IDEAlliance ISO 12647-7 Control Wedge 2013",
        Device::Cmyk,
        rules,
    );
    c.pass_recommended_text = None;
    c.lock_delta_method = true;
    c
}

fn iso14861_outer_gamut() -> Criteria {
    let mut c = cmyk();
    c.id = "ISO14861_OUTER_GAMUT".to_string();
    c.name = "ISO 14861:2015 outer gamut".to_string();
    c.pass_recommended_text = None;
    c.lock_delta_method = true;
    c.warn_deviation = Some(2.5);
    c.reset_tolerances();
    c.rules[MAXIMUM_E00].nominal = Some(2.5);
    c
}

fn iso14861_color_accuracy() -> Criteria {
    let mut c = rgb();
    c.id = "ISO_14861_COLOR_ACCURACY_RGB318".to_string();
    c.name = "ISO 14861:2015 color accuracy".to_string();
    c.pass_recommended_text = None;
    c.lock_delta_method = true;
    c.reset_tolerances();
    c.rules[AVERAGE_E00].nominal = Some(2.5);
    c.rules.push(
        Rule::new("99% percentile ΔE*00", Selector::All, delta(Quantity::E, Reducer::P99))
            .tolerance(Some(4.5), None)
            .metric(Cie2000),
    );
    c
}

fn rgb_hue_chroma_only() -> Criteria {
    let mut c = Criteria::new(
        "RGB_HUE_CHROMA_ONLY",
        "Hue & chroma only",
        Device::Rgb,
        hue_chroma_rules(),
    );
    c.warn_deviation = None;
    c
}

/// Testchart names mapped to the criteria they are verified with
fn builtin_aliases() -> Vec<(String, &'static str)> {
    let mut aliases = vec![
        ("DEFAULT".to_string(), "RGB"),
        ("CMYK_FOGRA_MEDIAWEDGE_V3".to_string(), "FOGRA_MW3"),
        ("FOGRASTRIP3".to_string(), "FOGRA_MW3"),
        ("CMYK_IDEALLIANCE_CONTROLSTRIP_2009".to_string(), "IDEALLIANCE_2009"),
        (
            "GRACOLCOATED1_ISO12647-7_CONTROLSTRIP2009_REF".to_string(),
            "IDEALLIANCE_2009",
        ),
        (
            "SWOPCOATED3_ISO12647-7_CONTROLSTRIP2009_REF".to_string(),
            "IDEALLIANCE_2009",
        ),
        (
            "SWOPCOATED5_ISO12647-7_CONTROLSTRIP2009_REF".to_string(),
            "IDEALLIANCE_2009",
        ),
        (
            "CMYK_IDEALLIANCE_ISO_12647-7_CONTROL_WEDGE_2013".to_string(),
            "IDEALLIANCE_2013",
        ),
        ("CMYK_ISO_12647-7_OUTER_GAMUT".to_string(), "ISO14861_OUTER_GAMUT"),
    ];
    for i in 27..=47 {
        aliases.push((format!("1x_MW2_FOGRA{i}L_SB"), "FOGRA_MW3"));
        aliases.push((format!("2x_MW2_FOGRA{i}L_SB"), "FOGRA_MW3"));
        aliases.push((format!("FOGRA{i}_MW2_SUBSET"), "FOGRA_MW3"));
        aliases.push((format!("FOGRA{i}_MW3_SUBSET"), "FOGRA_MW3"));
    }
    aliases
}

/// Gray patches of an RGB reference usable for gray balance rules
///
/// Neutral patches (R = G = B) whose reference luminance is at least 1%.
pub fn gray_balance_patches(reference: &Dataset) -> Vec<[f64; 3]> {
    let white = D50.scale(100.0);
    reference
        .patches()
        .filter_map(|patch| {
            let rgb = patch.rgb()?;
            if rgb[0] != rgb[1] || rgb[1] != rgb[2] {
                return None;
            }
            let y = match (patch.lab(), patch.xyz()) {
                (Some(lab), _) => lab.to_xyz(white).y,
                (None, Some(xyz)) => xyz.y,
                (None, None) => return None,
            };
            (y >= 1.0).then_some(rgb)
        })
        .collect()
}

// ============================================================================
// Criteria set
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum CriteriaFile {
    Many(Vec<Criteria>),
    One(Box<Criteria>),
}

/// Lookup table of criteria by id and testchart alias
#[derive(Debug, Clone, Default)]
pub struct CriteriaSet {
    criteria: Vec<Criteria>,
    aliases: Vec<(String, String)>,
}

impl CriteriaSet {
    /// Built-in criteria
    ///
    /// `RGB_GRAY` is only registered when gray balance patches are given.
    pub fn builtin(grayscale: Option<&[[f64; 3]]>) -> Self {
        let mut criteria = vec![rgb()];
        if let Some(gray) = grayscale.filter(|g| !g.is_empty()) {
            criteria.push(rgb_gray(gray));
        }
        criteria.extend([
            iso14861_color_accuracy(),
            cmyk(),
            fogra_mw3(),
            idealliance_2009(),
            idealliance_2013(),
            iso14861_outer_gamut(),
            rgb_hue_chroma_only(),
        ]);
        let aliases = builtin_aliases()
            .into_iter()
            .map(|(alias, id)| (alias, id.to_string()))
            .collect();
        Self { criteria, aliases }
    }

    /// Add or replace a criteria by id
    pub fn insert(&mut self, criteria: Criteria) -> Result<()> {
        criteria.validate()?;
        match self.criteria.iter_mut().find(|c| c.id == criteria.id) {
            Some(existing) => *existing = criteria,
            None => self.criteria.push(criteria),
        }
        Ok(())
    }

    /// Map a testchart name onto a criteria id
    pub fn add_alias(&mut self, alias: impl Into<String>, id: impl Into<String>) {
        self.aliases.push((alias.into(), id.into()));
    }

    /// Load user criteria from a JSON or YAML file
    ///
    /// The file holds a single criteria or a list. Returns the number of
    /// criteria added or replaced.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let file: CriteriaFile = match extension.as_deref() {
            Some("yaml" | "yml") => serde_yaml::from_str(&content)?,
            _ => serde_json::from_str(&content)?,
        };
        let loaded = match file {
            CriteriaFile::Many(list) => list,
            CriteriaFile::One(one) => vec![*one],
        };
        let count = loaded.len();
        for criteria in loaded {
            self.insert(criteria)?;
        }
        tracing::info!(count, path = %path.display(), "Loaded criteria");
        Ok(count)
    }

    /// Criteria by id or alias, case-insensitive
    pub fn get(&self, id: &str) -> Option<&Criteria> {
        let id = self
            .aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(id))
            .map_or(id, |(_, target)| target.as_str());
        self.criteria.iter().find(|c| c.id.eq_ignore_ascii_case(id))
    }

    pub fn resolve(&self, id: &str) -> Result<&Criteria> {
        self.get(id).ok_or_else(|| Error::UnknownCriteria(id.to_string()))
    }

    /// Criteria for a testchart file name, falling back to the device default
    pub fn for_testchart(&self, testchart: &str, device: Device) -> Result<&Criteria> {
        let stem = Path::new(testchart)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(testchart)
            .to_uppercase();
        match self.get(&stem) {
            Some(criteria) => Ok(criteria),
            None => {
                tracing::debug!(testchart = %stem, %device, "no criteria for testchart, using device default");
                self.resolve(device.name())
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criteria> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }
}
