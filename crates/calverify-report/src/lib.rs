//! # calverify-report
//!
//! Verification of display and print calibration measurements.
//!
//! A measurement dataset is compared patch by patch against its reference
//! under a criteria set. The result is a [`Report`] with per-rule statistics,
//! a pass/fail verdict and per-patch overview rows.
//!
//! ## Quick Start
//!
//! ```
//! use calverify_report::{CriteriaSet, Dataset, EvaluationContext, Report};
//!
//! let cgats = "\
//! CGATS.17
//! BEGIN_DATA_FORMAT
//! RGB_R RGB_G RGB_B LAB_L LAB_A LAB_B
//! END_DATA_FORMAT
//! BEGIN_DATA
//! 100 100 100 100 0 0
//! 0 0 0 0 0 0
//! END_DATA
//! ";
//! let reference = Dataset::parse(cgats).unwrap();
//! let criteria = CriteriaSet::builtin(None);
//! let rgb = criteria.resolve("RGB").unwrap();
//! let report = Report::generate(&reference, &reference, rgb, &EvaluationContext::default()).unwrap();
//! assert!(report.pass);
//! ```

pub mod cgats;
pub mod compare;
pub mod criteria;
pub mod error;
pub mod overview;
pub mod summary;

pub use cgats::{Dataset, Device, Patch, Value};
pub use compare::{CalibrationLevels, ColorMode, EvaluationContext, RuleStatus};
pub use criteria::{Criteria, CriteriaSet, Rule, Selector, Statistic, gray_balance_patches};
pub use error::{Error, Result};
pub use summary::{Report, criteria_listing};
