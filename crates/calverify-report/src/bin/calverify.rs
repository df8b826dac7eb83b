use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use calverify_core::color::cct::robertson_cct;
use calverify_core::{CatMatrix, DeltaFamily, DeltaMethod, Lab, Xyz, delta};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calverify_report::{
    ColorMode, CriteriaSet, Dataset, EvaluationContext, Report, criteria_listing, gray_balance_patches,
};

#[derive(Parser)]
#[command(name = "calverify")]
#[command(about = "Verify display and print calibration measurements against reference data")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare a measurement CGATS file against its reference
    Compare {
        /// Reference CGATS file
        reference: PathBuf,

        /// Measurement CGATS file
        measurement: PathBuf,

        /// Criteria id or testchart alias (default: derived from the reference file name)
        #[arg(short, long)]
        criteria: Option<String>,

        /// Additional criteria definitions (JSON or YAML)
        #[arg(long)]
        criteria_file: Vec<PathBuf>,

        /// Testchart name used to pick criteria when --criteria is absent
        #[arg(long)]
        testchart: Option<String>,

        /// Delta E formula (76, 94, 00, cmc11, cmc21, ictcp)
        #[arg(short, long)]
        delta: Option<String>,

        /// Chromatic adaptation matrix
        #[arg(long, default_value = "Bradford")]
        cat: String,

        /// Color space of the overview (Lab, XYZ, xyY, Lu'v')
        #[arg(long, default_value = "Lab")]
        mode: String,

        /// Compare absolute colorimetric values
        #[arg(long)]
        absolute: bool,

        /// Judge gray patches against a neutral of the measured lightness
        #[arg(long)]
        gray_balance_cal_only: bool,

        /// Assume a blackbody target whitepoint
        #[arg(long)]
        planckian: bool,

        /// Measured whitepoint in cd/m²
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        whitepoint: Option<Vec<f64>>,

        /// Display profile whitepoint
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        profile_whitepoint: Option<Vec<f64>>,

        /// Measured black in cd/m²
        #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
        blackpoint: Option<Vec<f64>>,

        /// Luminance of the white for ΔICtCp
        #[arg(long, default_value_t = 100.0)]
        ictcp_luminance: f64,

        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },
    /// List the built-in criteria
    Criteria {
        #[arg(short, long, value_enum, default_value_t)]
        format: Format,
    },
    /// Color difference between two Lab colors
    Delta {
        #[arg(required = true, num_args = 6, value_names = ["L1", "A1", "B1", "L2", "A2", "B2"], allow_negative_numbers = true)]
        values: Vec<f64>,

        /// Delta E formula
        #[arg(short, long, default_value = "2000")]
        method: String,
    },
    /// Correlated color temperature of an XYZ color
    Cct {
        #[arg(required = true, num_args = 3, value_names = ["X", "Y", "Z"])]
        xyz: Vec<f64>,
    },
}

fn xyz_arg(values: Option<Vec<f64>>) -> Option<Xyz> {
    values.and_then(|v| <[f64; 3]>::try_from(v).ok()).map(Xyz::from_array)
}

fn read_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Dataset::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calverify=warn,calverify_report=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare {
            reference,
            measurement,
            criteria,
            criteria_file,
            testchart,
            delta,
            cat,
            mode,
            absolute,
            gray_balance_cal_only,
            planckian,
            whitepoint,
            profile_whitepoint,
            blackpoint,
            ictcp_luminance,
            format,
        } => {
            let reference_data = read_dataset(&reference)?;
            let measurement_data = read_dataset(&measurement)?;

            let grayscale = gray_balance_patches(&reference_data);
            let mut set = CriteriaSet::builtin(Some(&grayscale));
            for path in &criteria_file {
                set.load(path)
                    .with_context(|| format!("Failed to load criteria from {}", path.display()))?;
            }
            let selected = match (&criteria, &testchart) {
                (Some(id), _) => set.resolve(id)?,
                (None, Some(chart)) => set.for_testchart(chart, reference_data.device())?,
                (None, None) => set.for_testchart(&reference.to_string_lossy(), reference_data.device())?,
            };

            let context = EvaluationContext {
                whitepoint: xyz_arg(whitepoint),
                profile_whitepoint: xyz_arg(profile_whitepoint),
                blackpoint: xyz_arg(blackpoint),
                delta_method: delta.map(|d| d.parse::<DeltaFamily>()).transpose()?,
                cat: cat.parse::<CatMatrix>()?,
                absolute,
                gray_balance_cal_only,
                planckian,
                calibration_levels: None,
                mode: mode.parse::<ColorMode>()?,
                ictcp_luminance,
            };

            let report = Report::generate(&reference_data, &measurement_data, selected, &context)?;
            match format {
                Format::Text => print!("{report}"),
                Format::Json => println!("{}", report.to_json()?),
            }
            Ok(if report.pass { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Commands::Criteria { format } => {
            let listing = criteria_listing(&CriteriaSet::builtin(None));
            match format {
                Format::Text => {
                    for c in &listing {
                        println!(
                            "{:<34} {:<5} {:<6} {:>3} rules  {}",
                            c.id,
                            c.device.to_string(),
                            c.delta_method.to_string(),
                            c.rules,
                            c.name
                        );
                    }
                }
                Format::Json => println!("{}", serde_json::to_string_pretty(&listing)?),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Delta { values, method } => {
            let method: DeltaMethod = method.parse()?;
            let reference = Lab::new(values[0], values[1], values[2]);
            let sample = Lab::new(values[3], values[4], values[5]);
            let d = delta(reference, sample, &method);
            println!("{method}");
            println!("ΔE {:.4}", d.e);
            println!("ΔL {:.4}  ΔC {:.4}  ΔH {:.4}", d.l, d.c, d.h);
            println!("Δa {:.4}  Δb {:.4}", d.a, d.b);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Cct { xyz } => {
            let xyz = Xyz::new(xyz[0], xyz[1], xyz[2]);
            match robertson_cct(xyz) {
                Some(t) => println!("{t:.0}K"),
                None => anyhow::bail!("Chromaticity is outside the isotemperature range"),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
