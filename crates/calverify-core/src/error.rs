//! Error types for calverify-core

use thiserror::Error;

/// Result type for calverify-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving colorimetric inputs
///
/// Numeric failure modes (singular matrices, out-of-range color temperatures,
/// invalid delta inputs) are reported as sentinel values rather than errors.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Illuminant name not present in any of the searched standards
    #[error("Unrecognized illuminant \"{0}\"")]
    UnrecognizedIlluminant(String),

    /// Standard name not present in the illuminant tables
    #[error("Unrecognized standard \"{0}\"")]
    UnrecognizedStandard(String),

    /// Color temperature outside the daylight locus range
    #[error("Color temperature {0}K is outside the daylight locus (4000K-25000K)")]
    CctOutOfRange(f64),

    /// Unknown chromatic adaptation matrix name
    #[error("Unknown chromatic adaptation matrix \"{0}\"")]
    UnknownAdaptationMatrix(String),
}
