//! CGATS fixtures under `testdata/`

use std::path::PathBuf;

use calverify_report::Dataset;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("fixture {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("fixture {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: calverify_report::Error,
    },
}

/// Absolute path of a fixture
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata").join(name)
}

/// Raw fixture text
pub fn read_fixture(name: &str) -> Result<String, FixtureError> {
    std::fs::read_to_string(fixture_path(name)).map_err(|source| FixtureError::Io {
        name: name.to_string(),
        source,
    })
}

/// Parse a fixture as CGATS
pub fn load_dataset(name: &str) -> Result<Dataset, FixtureError> {
    let text = read_fixture(name)?;
    Dataset::parse(&text).map_err(|source| FixtureError::Parse {
        name: name.to_string(),
        source,
    })
}
