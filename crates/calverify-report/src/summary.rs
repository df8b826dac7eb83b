//! Verification report and its renderings

use std::fmt;

use calverify_core::DeltaFamily;
use serde::Serialize;

use crate::cgats::{Dataset, Device};
use crate::compare::{
    BlackpointInfo, ColorMode, Comparison, EvaluationContext, ProfileWhitepointInfo, RuleResult, RuleStatus,
    WhitepointInfo,
};
use crate::criteria::{Criteria, CriteriaSet, Statistic};
use crate::error::Result;
use crate::overview::{GrayscaleRow, OverviewRow, grayscale, overview};

/// Verdict shown when rules could not be evaluated
pub const MISSING_DATA_TEXT: &str = "MISSING DATA";

/// Complete verification result
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub criteria: String,
    pub criteria_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strip_name: Option<String>,
    pub delta_method: DeltaFamily,
    pub device: Device,
    pub mode: ColorMode,
    pub absolute: bool,
    pub whitepoint: Option<WhitepointInfo>,
    pub profile_whitepoint: Option<ProfileWhitepointInfo>,
    pub blackpoint: Option<BlackpointInfo>,
    pub rules: Vec<RuleResult>,
    pub missing_data: bool,
    pub pass: bool,
    pub overachieve: bool,
    pub verdict: String,
    pub recommended_verdict: Option<String>,
    pub overview: Vec<OverviewRow>,
    pub grayscale: Vec<GrayscaleRow>,
}

impl Report {
    /// Compare `measurement` against `reference` under `criteria`
    pub fn generate(
        reference: &Dataset,
        measurement: &Dataset,
        criteria: &Criteria,
        context: &EvaluationContext,
    ) -> Result<Self> {
        let comparison = Comparison::new(reference, measurement, criteria, context)?;
        let evaluation = comparison.evaluate();
        let overview = overview(&comparison, &evaluation);
        let grayscale = grayscale(&comparison);

        let verdict = if evaluation.pass {
            criteria.pass_text.clone()
        } else if evaluation.missing_data {
            MISSING_DATA_TEXT.to_string()
        } else {
            criteria.fail_text.clone()
        };
        let recommended_verdict = if evaluation.overachieve {
            criteria.pass_recommended_text.clone()
        } else {
            criteria.fail_recommended_text.clone()
        };

        tracing::info!(
            criteria = %criteria.id,
            patches = overview.len(),
            pass = evaluation.pass,
            overachieve = evaluation.overachieve,
            missing_data = evaluation.missing_data,
            "Verification finished"
        );

        Ok(Self {
            criteria: criteria.id.clone(),
            criteria_name: criteria.name.clone(),
            strip_name: criteria.strip_name.clone(),
            delta_method: comparison.family,
            device: comparison.device,
            mode: context.mode,
            absolute: context.absolute,
            whitepoint: comparison.whitepoint,
            profile_whitepoint: comparison.profile_whitepoint,
            blackpoint: comparison.blackpoint,
            rules: evaluation.rules,
            missing_data: evaluation.missing_data,
            pass: evaluation.pass,
            overachieve: evaluation.overachieve,
            verdict,
            recommended_verdict,
            overview,
            grayscale,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rules worth showing: active ones that were evaluated
    pub fn displayed_rules(&self) -> impl Iterator<Item = &RuleResult> {
        self.rules
            .iter()
            .filter(|r| r.always_display || (r.active && r.status != RuleStatus::Skipped))
    }

    /// Aligned plain text summary
    pub fn to_plain_text(&self) -> String {
        self.to_string()
    }

    /// Write the plain text summary
    pub fn write_text(&self, out: &mut impl fmt::Write) -> fmt::Result {
        writeln!(out, "Criteria: {} ({})", self.criteria_name, self.criteria)?;
        if let Some(strip) = &self.strip_name {
            writeln!(out, "Strip: {strip}")?;
        }
        writeln!(out, "Delta E formula: {}", self.delta_method.label())?;
        writeln!(out, "Device: {}", self.device)?;
        if self.absolute {
            writeln!(out, "Absolute colorimetric comparison")?;
        }
        if let Some(wp) = &self.whitepoint {
            let [x, y, z] = wp.normalized.to_array();
            writeln!(
                out,
                "Measured whitepoint: XYZ {x:.4} {y:.4} {z:.4}, {:.2} cd/m², {}",
                wp.luminance(),
                kelvin(wp.cct)
            )?;
            if let Some(assumed) = wp.assumed_cct {
                let locus = if wp.planckian { "blackbody" } else { "daylight" };
                writeln!(out, "Assumed target whitepoint: {assumed}K {locus}")?;
            }
        }
        if let Some(profile) = &self.profile_whitepoint {
            let [x, y, z] = profile.normalized.to_array();
            writeln!(
                out,
                "Profile whitepoint: XYZ {x:.4} {y:.4} {z:.4}, {}",
                kelvin(profile.cct)
            )?;
        }
        if let Some(bp) = &self.blackpoint {
            write!(out, "Measured black luminance: {:.4} cd/m²", bp.luminance)?;
            match bp.contrast {
                Some(c) if c.is_finite() => {
                    writeln!(out, ", contrast {c:.1}:1")?;
                }
                _ => writeln!(out)?,
            }
        }
        writeln!(out)?;

        let width = self
            .displayed_rules()
            .map(|r| r.description.chars().count())
            .max()
            .unwrap_or(0)
            .max("Criteria".len());
        writeln!(
            out,
            "{:<width$}  {:>10}  {:>11}  {:>10}  Result",
            "Criteria", "Nominal", "Recommended", "Actual"
        )?;
        for rule in self.displayed_rules() {
            writeln!(
                out,
                "{:<width$}  {:>10}  {:>11}  {:>10}  {}",
                rule.description,
                tolerance_text(rule, rule.nominal),
                tolerance_text(rule, rule.recommended),
                value_text(rule),
                status_text(rule.status),
            )?;
        }
        writeln!(out)?;
        writeln!(out, "Result: {}", self.verdict)?;
        if let Some(recommended) = &self.recommended_verdict {
            writeln!(out, "Recommended: {recommended}")?;
        }

        if !self.overview.is_empty() {
            writeln!(out)?;
            writeln!(out, "Overview ({})", self.mode)?;
            for row in &self.overview {
                let device = row
                    .device
                    .iter()
                    .map(|v| format!("{v:>6.2}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                let decimals = self.mode.decimals() as usize;
                let [t0, t1, t2] = row.target;
                let [a0, a1, a2] = row.actual;
                writeln!(
                    out,
                    "{}  {device}  {t0:>9.decimals$} {t1:>9.decimals$} {t2:>9.decimals$}  \
                     {a0:>9.decimals$} {a1:>9.decimals$} {a2:>9.decimals$}  {:>6.2}  {}",
                    row.label,
                    row.delta.e,
                    status_text(row.status()),
                )?;
            }
        }

        if !self.grayscale.is_empty() {
            writeln!(out)?;
            writeln!(out, "Grayscale")?;
            for row in &self.grayscale {
                let gamma = row
                    .actual_gamma
                    .map_or_else(|| "-".to_string(), |g| format!("{g:.2}"));
                let [r, g, b] = row.rgb_balance;
                writeln!(
                    out,
                    "{:>6.2}%  {:>8}  gamma {gamma:>5}  balance {r:+.2} {g:+.2} {b:+.2}  {:.2}",
                    row.signal,
                    kelvin(row.actual_cct),
                    row.delta.e,
                )?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_text(f)
    }
}

fn kelvin(cct: Option<f64>) -> String {
    cct.map_or_else(|| "CCT n/a".to_string(), |t| format!("{t}K"))
}

fn tolerance_text(rule: &RuleResult, tolerance: Option<f64>) -> String {
    match (tolerance, rule.statistic) {
        (None, _) => String::new(),
        (Some(t), Statistic::ToneValues) => format!(">= {t}%"),
        (Some(t), _) => format!("<= {t}"),
    }
}

fn value_text(rule: &RuleResult) -> String {
    match (rule.value, rule.statistic) {
        (None, _) => "-".to_string(),
        (Some(v), Statistic::ToneValues) => format!("{v:.1}%"),
        (Some(v), _) => format!("{v:.2}"),
    }
}

fn status_text(status: RuleStatus) -> &'static str {
    match status {
        RuleStatus::Ok => "OK",
        RuleStatus::Warn => "WARN",
        RuleStatus::Fail => "FAIL",
        RuleStatus::StatOnly => "",
        RuleStatus::Missing => "MISSING",
        RuleStatus::Skipped => "SKIPPED",
    }
}

/// Built-in criteria summary
#[derive(Debug, Clone, Serialize)]
pub struct CriteriaInfo {
    pub id: String,
    pub name: String,
    pub device: Device,
    pub delta_method: DeltaFamily,
    pub rules: usize,
}

pub fn criteria_listing(set: &CriteriaSet) -> Vec<CriteriaInfo> {
    set.iter()
        .map(|c| CriteriaInfo {
            id: c.id.clone(),
            name: c.name.clone(),
            device: c.device(),
            delta_method: c.delta_method,
            rules: c.rules.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calverify_core::Xyz;

    const REFERENCE: &str = "\
CGATS.17
ORIGINATOR \"calverify\"
BEGIN_DATA_FORMAT
SAMPLE_ID RGB_R RGB_G RGB_B LAB_L LAB_A LAB_B
END_DATA_FORMAT
BEGIN_DATA
1 100 100 100 100 0 0
2 50 50 50 53.3889 0 0
3 0 0 0 0 0 0
4 100 0 0 54.2917 80.8125 69.8851
END_DATA
";

    const MEASUREMENT: &str = "\
CGATS.17
BEGIN_DATA_FORMAT
SAMPLE_ID RGB_R RGB_G RGB_B LAB_L LAB_A LAB_B
END_DATA_FORMAT
BEGIN_DATA
1 100 100 100 100 0.2 -0.3
2 50 50 50 52.9 0.1 0.4
3 0 0 0 0.4 0 0
4 100 0 0 54.0 81.0 69.0
END_DATA
";

    fn report(ctx: &EvaluationContext) -> Report {
        let reference = Dataset::parse(REFERENCE).unwrap();
        let measurement = Dataset::parse(MEASUREMENT).unwrap();
        let set = CriteriaSet::builtin(None);
        let criteria = set.for_testchart("custom_verify.ti1", reference.device()).unwrap();
        Report::generate(&reference, &measurement, criteria, ctx).unwrap()
    }

    #[test]
    fn test_passing_report() {
        let report = report(&EvaluationContext::default());
        assert_eq!(report.criteria, "RGB");
        assert!(report.pass, "small deviations pass: {:#?}", report.rules);
        assert_eq!(report.verdict, "Nominal tolerance passed");
        assert_eq!(report.overview.len(), 4);
        assert_eq!(report.grayscale.len(), 3);
    }

    #[test]
    fn test_plain_text() {
        let ctx = EvaluationContext {
            whitepoint: Some(Xyz::new(95.047, 100.0, 108.883).scale(1.2)),
            blackpoint: Some(Xyz::new(0.1, 0.12, 0.13)),
            ..EvaluationContext::default()
        };
        let text = report(&ctx).to_plain_text();
        assert!(text.contains("Criteria: "), "{text}");
        assert!(text.contains("Average ΔE*00"), "{text}");
        assert!(!text.contains("Average ΔE*76"), "inactive rules are hidden: {text}");
        assert!(text.contains("Assumed target whitepoint: 6500K daylight"), "{text}");
        assert!(text.contains("contrast 1000.0:1"), "{text}");
        assert!(text.contains("Result: Nominal tolerance passed"), "{text}");
        assert!(text.contains("Overview (Lab)"), "{text}");
    }

    #[test]
    fn test_write_text_matches_display() {
        let report = report(&EvaluationContext::default());
        let mut text = String::new();
        report.write_text(&mut text).unwrap();
        assert_eq!(text, report.to_string());
        assert!(text.ends_with('\n'), "{text}");
    }

    #[test]
    fn test_plain_text_with_nan_patch() {
        let reference = Dataset::parse(REFERENCE).unwrap();
        let measurement = Dataset::parse(&MEASUREMENT.replace("54.0 81.0 69.0", "nan 81.0 69.0")).unwrap();
        let set = CriteriaSet::builtin(None);
        let report =
            Report::generate(&reference, &measurement, set.resolve("RGB").unwrap(), &EvaluationContext::default())
                .unwrap();
        assert!(!report.pass);
        assert!(report.overview[3].delta.e.is_nan());
        let text = report.to_plain_text();
        assert!(text.contains("NaN"), "{text}");
        assert!(text.contains("Result: Nominal tolerance exceeded"), "{text}");
    }

    #[test]
    fn test_json() {
        let json = report(&EvaluationContext::default()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["criteria"], "RGB");
        assert_eq!(value["delta_method"], "CIE00");
        assert_eq!(value["rules"][8]["statistic"], "DELTA_E_AVG");
        assert_eq!(value["pass"], true);
    }

    #[test]
    fn test_failing_report() {
        let reference = Dataset::parse(REFERENCE).unwrap();
        let measurement = Dataset::parse(&MEASUREMENT.replace("54.0 81.0 69.0", "64.0 71.0 79.0")).unwrap();
        let set = CriteriaSet::builtin(None);
        let criteria = set.resolve("RGB").unwrap();
        let report = Report::generate(&reference, &measurement, criteria, &EvaluationContext::default()).unwrap();
        assert!(!report.pass);
        assert_eq!(report.verdict, "Nominal tolerance exceeded");
        assert!(report.overview[3].warn);
    }

    #[test]
    fn test_criteria_listing() {
        let listing = criteria_listing(&CriteriaSet::builtin(None));
        let cmyk = listing.iter().find(|c| c.id == "CMYK").unwrap();
        assert_eq!(cmyk.device, Device::Cmyk);
        assert!(listing.iter().any(|c| c.id == "RGB"));
    }
}
