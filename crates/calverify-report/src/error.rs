//! Error types for calverify-report

use thiserror::Error;

/// Result type for report operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading data or building a report
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Malformed CGATS text
    #[error("CGATS parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Reference and measurement have a different number of patches
    #[error(
        "Different amount of sets in measurements ({measurement}) and reference data ({reference})"
    )]
    LengthMismatch { reference: usize, measurement: usize },

    /// Fields required by the criteria are absent
    #[error("{}", missing_fields_message(.measurement, .reference, .required))]
    MissingFields {
        measurement: Vec<String>,
        reference: Vec<String>,
        required: Vec<String>,
    },

    /// No criteria set with this id or alias
    #[error("Unknown criteria: {0}")]
    UnknownCriteria(String),

    /// Invalid criteria definition
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    /// Core colorimetry error
    #[error(transparent)]
    Core(#[from] calverify_core::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}

fn missing_fields_message(measurement: &[String], reference: &[String], required: &[String]) -> String {
    let mut message = String::new();
    if !measurement.is_empty() {
        message.push_str(&format!(
            "Measurement data is missing the following fields: {}. ",
            measurement.join(", ")
        ));
    }
    if !reference.is_empty() {
        message.push_str(&format!(
            "Reference data is missing the following fields: {}. ",
            reference.join(", ")
        ));
    }
    message.push_str(&format!(
        "Measurements and reference data must contain at least: {}",
        required.join(", ")
    ));
    message
}
