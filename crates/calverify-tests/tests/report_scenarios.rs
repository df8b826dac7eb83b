//! End-to-end verification runs over CGATS fixtures

use calverify_core::{D50, DeltaFamily, Xyz};
use calverify_report::compare::CalibrationLevels;
use calverify_report::summary::MISSING_DATA_TEXT;
use calverify_report::{
    ColorMode, CriteriaSet, Dataset, Device, Error, EvaluationContext, Report, Rule, RuleStatus, Selector,
    gray_balance_patches,
};
use calverify_tests::fixtures::{fixture_path, load_dataset, read_fixture};

const DISPLAY_REFERENCE: &str = "display_reference.ti1";
const DISPLAY_MEASURED: &str = "display_measured.ti3";
const PROOF_REFERENCE: &str = "FOGRA39_MW3_Subset.txt";
const PROOF_MEASURED: &str = "proof_measured.txt";

/// `LUMINANCE_XYZ_CDM2` of a measurement file
fn luminance_xyz(dataset: &Dataset) -> Option<Xyz> {
    let values: Vec<f64> = dataset
        .header_value("LUMINANCE_XYZ_CDM2")?
        .split_whitespace()
        .filter_map(|v| v.parse().ok())
        .collect();
    <[f64; 3]>::try_from(values).ok().map(Xyz::from_array)
}

fn display_report(ctx: &EvaluationContext) -> anyhow::Result<Report> {
    let reference = load_dataset(DISPLAY_REFERENCE)?;
    let measured = load_dataset(DISPLAY_MEASURED)?;
    let set = CriteriaSet::builtin(Some(&gray_balance_patches(&reference)));
    let criteria = set.for_testchart(DISPLAY_REFERENCE, reference.device())?;
    Ok(Report::generate(&reference, &measured, criteria, ctx)?)
}

#[test]
fn display_verification_passes() -> anyhow::Result<()> {
    let report = display_report(&EvaluationContext::default())?;
    eprintln!("{}", report.to_plain_text());

    assert_eq!(report.criteria, "RGB", "unknown testcharts use the device default");
    assert_eq!(report.device, Device::Rgb);
    assert_eq!(report.delta_method, DeltaFamily::Cie2000);
    assert!(report.pass, "{:#?}", report.rules);
    assert!(report.recommended_verdict.is_some());
    assert!(!report.missing_data);
    assert_eq!(report.overview.len(), 12);
    assert!(report.overview.iter().all(|row| !row.warn));

    let signals: Vec<f64> = report.grayscale.iter().map(|g| g.signal).collect();
    assert_eq!(signals, vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    for row in &report.grayscale[1..4] {
        let gamma = row.actual_gamma.unwrap();
        assert!((2.0..2.5).contains(&gamma), "signal {}: gamma {gamma}", row.signal);
    }
    Ok(())
}

#[test]
fn display_verification_with_measured_white() {
    let measured = load_dataset(DISPLAY_MEASURED).unwrap();
    let white = luminance_xyz(&measured).unwrap();
    let ctx = EvaluationContext {
        whitepoint: Some(white),
        profile_whitepoint: Some(Xyz::new(0.9505, 1.0, 1.0888)),
        blackpoint: Some(Xyz::new(0.11, 0.12, 0.14)),
        ..EvaluationContext::default()
    };
    let report = display_report(&ctx).unwrap();

    let wp = report.whitepoint.as_ref().unwrap();
    assert_eq!(wp.assumed_cct, Some(6500.0));
    assert!(!wp.planckian);
    assert!((wp.luminance() - 120.0).abs() < 1e-9);
    let contrast = report.blackpoint.as_ref().and_then(|b| b.contrast).unwrap();
    assert!((contrast - 1000.0).abs() < 1e-6, "contrast {contrast}");

    let assumed = report
        .rules
        .iter()
        .find(|r| r.description == "Measured vs. assumed target whitepoint ΔE*00")
        .unwrap();
    assert_eq!(assumed.status, RuleStatus::Ok, "{assumed:?}");
    let profile = report
        .rules
        .iter()
        .find(|r| r.description == "Measured vs. display profile whitepoint ΔE*00")
        .unwrap();
    assert!(profile.value.unwrap() < 0.1, "{profile:?}");
    assert!(report.pass);
}

#[test]
fn display_verification_fails_on_bad_red() {
    let reference = load_dataset(DISPLAY_REFERENCE).unwrap();
    let text = read_fixture(DISPLAY_MEASURED)
        .unwrap()
        .replace("54.1020 80.1500 70.4410", "60.1020 72.1500 76.4410");
    let measured = Dataset::parse(&text).unwrap();
    let set = CriteriaSet::builtin(None);
    let criteria = set.resolve("default").unwrap();
    let report = Report::generate(&reference, &measured, criteria, &EvaluationContext::default()).unwrap();

    assert!(!report.pass);
    assert_eq!(report.verdict, criteria.fail_text);
    let maximum = report
        .rules
        .iter()
        .find(|r| r.description == "Maximum ΔE*00")
        .unwrap();
    assert_eq!(maximum.status, RuleStatus::Fail);
    assert_eq!(maximum.patch, Some(5), "red is the sixth patch");
    assert!(report.overview[5].warn);
    assert_eq!(report.overview[5].status(), RuleStatus::Fail);
}

#[test]
fn xyz_measurements_match_lab_measurements() {
    let reference = load_dataset(DISPLAY_REFERENCE).unwrap();
    let lab_measured = load_dataset(DISPLAY_MEASURED).unwrap();
    let mut xyz_measured = Dataset::new(["SAMPLE_ID", "RGB_R", "RGB_G", "RGB_B", "XYZ_X", "XYZ_Y", "XYZ_Z"]);
    for patch in lab_measured.patches() {
        let xyz = patch.lab().unwrap().to_xyz(D50.scale(100.0));
        let mut row = vec![((patch.index() + 1) as f64).into()];
        row.extend(patch.rgb().unwrap().map(Into::into));
        row.extend(xyz.to_array().map(Into::into));
        xyz_measured.push_row(row).unwrap();
    }

    let set = CriteriaSet::builtin(None);
    let criteria = set.resolve("RGB").unwrap();
    let ctx = EvaluationContext::default();
    let from_lab = Report::generate(&reference, &lab_measured, criteria, &ctx).unwrap();
    let from_xyz = Report::generate(&reference, &xyz_measured, criteria, &ctx).unwrap();
    for (a, b) in from_lab.overview.iter().zip(&from_xyz.overview) {
        assert!((a.delta.e - b.delta.e).abs() < 1e-6, "patch {}: {} vs {}", a.number, a.delta.e, b.delta.e);
    }
    assert_eq!(from_lab.pass, from_xyz.pass);
}

#[test]
fn missing_lab_fields_are_reported() {
    let reference = load_dataset(DISPLAY_REFERENCE).unwrap();
    let text = read_fixture(DISPLAY_MEASURED)
        .unwrap()
        .replace("LAB_L LAB_A LAB_B", "SPEC_L SPEC_A SPEC_B");
    let measured = Dataset::parse(&text).unwrap();
    let set = CriteriaSet::builtin(None);
    let err = Report::generate(&reference, &measured, set.resolve("RGB").unwrap(), &EvaluationContext::default())
        .unwrap_err();
    let message = err.to_string();
    assert!(matches!(err, Error::MissingFields { .. }), "{message}");
    assert!(
        message.contains("Measurement data is missing the following fields: LAB_L, LAB_A, LAB_B"),
        "{message}"
    );
}

/// Display run with the measured red patch replaced
fn report_with_red(red: &str) -> anyhow::Result<Report> {
    let reference = load_dataset(DISPLAY_REFERENCE)?;
    let text = read_fixture(DISPLAY_MEASURED)?.replace("54.1020 80.1500 70.4410", red);
    let measured = Dataset::parse(&text)?;
    let set = CriteriaSet::builtin(None);
    Ok(Report::generate(&reference, &measured, set.resolve("RGB")?, &EvaluationContext::default())?)
}

#[test]
fn non_numeric_cell_degrades_only_its_patch() -> anyhow::Result<()> {
    let report = report_with_red("n/a 80.1500 70.4410")?;
    eprintln!("{report}");

    assert!(!report.pass);
    assert!(!report.missing_data);
    assert_eq!(report.verdict, "Nominal tolerance exceeded");
    assert_eq!(report.overview.len(), 12);

    let red = &report.overview[5];
    assert!(red.actual[0].is_nan(), "{:?}", red.actual);
    assert!(red.delta.e.is_nan());
    assert_eq!(red.status(), RuleStatus::Fail);
    assert!(report.overview[6].delta.e < 1.0, "green is still compared");

    let maximum = report.rules.iter().find(|r| r.description == "Maximum ΔE*00").unwrap();
    assert_eq!(maximum.status, RuleStatus::Fail);
    assert_eq!(maximum.passed, Some(false));
    assert_eq!(report.grayscale.len(), 5, "gray tracking is unaffected");
    Ok(())
}

#[test]
fn nan_cell_degrades_like_a_malformed_one() -> anyhow::Result<()> {
    let report = report_with_red("nan 80.1500 70.4410")?;
    assert!(report.overview[5].delta.e.is_nan());
    assert!(!report.pass);
    let average = report.rules.iter().find(|r| r.description == "Average ΔE*00").unwrap();
    assert!(average.value.is_some_and(f64::is_nan));
    assert_eq!(average.status, RuleStatus::Fail);

    // NaN serializes as null rather than failing the JSON rendering
    let value: serde_json::Value = serde_json::from_str(&report.to_json()?)?;
    assert!(value["overview"][5]["delta"]["e"].is_null());
    Ok(())
}

#[test]
fn rule_without_matching_patches_is_missing_data() -> anyhow::Result<()> {
    let reference = load_dataset(DISPLAY_REFERENCE)?;
    let measured = load_dataset(DISPLAY_MEASURED)?;
    let set = CriteriaSet::builtin(None);
    let mut criteria = set.resolve("RGB")?.clone();
    criteria.rules.push(
        Rule::new(
            "Orange ΔE*00",
            Selector::Patches(vec![vec![100.0, 50.0, 0.0]]),
            "DELTA_E_MAX".parse()?,
        )
        .tolerance(Some(2.0), None),
    );
    let report = Report::generate(&reference, &measured, &criteria, &EvaluationContext::default())?;

    let orange = report.rules.last().unwrap();
    assert_eq!(orange.value, None);
    assert!(orange.matches.is_empty());
    assert_eq!(orange.status, RuleStatus::Missing);
    assert!(report.missing_data);
    assert!(!report.pass);
    assert_eq!(report.verdict, MISSING_DATA_TEXT);
    assert!(report.to_plain_text().contains("MISSING"));
    Ok(())
}

#[test]
fn mismatched_patch_counts_are_fatal() {
    let reference = load_dataset(DISPLAY_REFERENCE).unwrap();
    let measured = load_dataset(PROOF_MEASURED).unwrap();
    let set = CriteriaSet::builtin(None);
    let err = Report::generate(&reference, &measured, set.resolve("RGB").unwrap(), &EvaluationContext::default())
        .unwrap_err();
    assert!(
        matches!(err, Error::LengthMismatch { reference: 12, measurement: 14 }),
        "{err}"
    );
}

#[test]
fn media_wedge_proof_passes() {
    let reference = load_dataset(PROOF_REFERENCE).unwrap();
    let measured = load_dataset(PROOF_MEASURED).unwrap();
    assert_eq!(reference.device(), Device::Cmyk);

    let set = CriteriaSet::builtin(None);
    let criteria = set.for_testchart(PROOF_REFERENCE, reference.device()).unwrap();
    assert_eq!(criteria.id, "FOGRA_MW3");

    // Locked to CIE2000 regardless of the request
    let ctx = EvaluationContext {
        delta_method: Some(DeltaFamily::Cie76),
        ..EvaluationContext::default()
    };
    let report = Report::generate(&reference, &measured, criteria, &ctx).unwrap();
    eprintln!("{}", report.to_plain_text());

    assert_eq!(report.delta_method, DeltaFamily::Cie2000);
    assert!(report.pass, "{:#?}", report.rules);
    assert!(report.grayscale.is_empty(), "CMYK has no RGB grayscale");
    assert_eq!(report.overview[1].device, vec![100.0, 0.0, 0.0, 0.0]);

    let paper = report.rules.iter().find(|r| r.description == "Paper white ΔE*00").unwrap();
    assert_eq!(paper.matches, vec![0]);
    assert_eq!(paper.status, RuleStatus::Ok);

    let hue = report.rules.iter().find(|r| r.description == "CMY maximum ΔH*ab").unwrap();
    assert!(!hue.active, "CIE76 rule under a CIE2000 report");
    assert!(report.displayed_rules().any(|r| r.description == "CMY maximum ΔH*ab"));

    let gray = report.rules.iter().find(|r| r.description == "CMY grey maximum ΔCh").unwrap();
    assert_eq!(gray.matches.len(), 6);
    assert!(gray.value.unwrap() < 1.0, "{gray:?}");
}

#[test]
fn custom_yaml_criteria() {
    let mut set = CriteriaSet::builtin(None);
    let loaded = set.load(fixture_path("custom_criteria.yaml")).unwrap();
    assert_eq!(loaded, 1);
    let criteria = set.resolve("studio").unwrap();
    assert_eq!(criteria.warn_deviation, Some(2.0));

    let reference = load_dataset(DISPLAY_REFERENCE).unwrap();
    let measured = load_dataset(DISPLAY_MEASURED).unwrap();
    let report = Report::generate(&reference, &measured, criteria, &EvaluationContext::default()).unwrap();
    assert_eq!(report.rules.len(), 4);
    let gray = &report.rules[2];
    assert_eq!(gray.matches, vec![2, 3, 4]);
    assert_eq!(gray.status, RuleStatus::Ok, "{gray:?}");
    assert_eq!(report.rules[3].status, RuleStatus::StatOnly);
    assert!(report.pass);
}

#[test]
fn tone_values_and_modes() {
    let ctx = EvaluationContext {
        calibration_levels: Some(CalibrationLevels {
            red: 256,
            green: 251,
            blue: 238,
            entry_count: 256,
        }),
        mode: ColorMode::XyY,
        ..EvaluationContext::default()
    };
    let report = display_report(&ctx).unwrap();
    let blue = report
        .rules
        .iter()
        .find(|r| r.description == "Calibration blue tone values")
        .unwrap();
    assert_eq!(blue.value, Some(93.0));
    assert_eq!(blue.recommended_passed, Some(false));
    assert_eq!(blue.tone_levels, Some((238, 256)));

    // White in xyY is the D50 chromaticity
    let white = &report.overview[0];
    assert!((white.target[0] - 0.3457).abs() < 1e-3, "{:?}", white.target);
    assert!((white.target[2] - 100.0).abs() < 1e-6);
}

#[test]
fn json_report_round_trips_through_serde_json() -> anyhow::Result<()> {
    let report = display_report(&EvaluationContext::default())?;
    let json = report.to_json()?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    assert_eq!(value["criteria"], "RGB");
    assert_eq!(value["overview"].as_array().map(Vec::len), Some(12));
    assert_eq!(value["grayscale"].as_array().map(Vec::len), Some(5));
    assert_eq!(value["rules"][11]["statistic"], "DELTA_E_MAX");
    assert_eq!(value["pass"], true);
    Ok(())
}
