//! CGATS measurement datasets
//!
//! A CGATS file is a list of header keywords followed by a field list
//! (`BEGIN_DATA_FORMAT … END_DATA_FORMAT`) and one or more data blocks
//! (`BEGIN_DATA … END_DATA`):
//!
//! ```text
//! CTI3
//! DESCRIPTOR "Argyll Calibration Target chart information 3"
//! NUMBER_OF_FIELDS 7
//! BEGIN_DATA_FORMAT
//! SAMPLE_ID RGB_R RGB_G RGB_B LAB_L LAB_A LAB_B
//! END_DATA_FORMAT
//! NUMBER_OF_SETS 2
//! BEGIN_DATA
//! 1 100 100 100 100 0 0
//! 2 0 0 0 0 0 0
//! END_DATA
//! ```
//!
//! Header values keep their original text (including quotes). Data cells
//! that parse as numbers become [`Value::Number`]; everything else is kept
//! as [`Value::Text`].

use std::fmt;
use std::str::FromStr;

use calverify_core::{Lab, Xyz};

use crate::error::{Error, Result};

pub const RGB_FIELDS: [&str; 3] = ["RGB_R", "RGB_G", "RGB_B"];
pub const CMYK_FIELDS: [&str; 4] = ["CMYK_C", "CMYK_M", "CMYK_Y", "CMYK_K"];
pub const LAB_FIELDS: [&str; 3] = ["LAB_L", "LAB_A", "LAB_B"];
pub const XYZ_FIELDS: [&str; 3] = ["XYZ_X", "XYZ_Y", "XYZ_Z"];

/// Device color model of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub enum Device {
    #[default]
    Rgb,
    Cmyk,
}

impl Device {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Cmyk => "CMYK",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single data cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    /// Parse a data token, normalizing decimal commas
    fn parse_token(token: &str) -> Self {
        if let Some(inner) = token.strip_prefix('"').and_then(|t| t.strip_suffix('"')) {
            return Self::Text(inner.to_string());
        }
        let normalized = decimal_comma_to_point(token);
        match normalized.parse::<f64>() {
            Ok(v) => Self::Number(v),
            Err(_) => Self::Text(token.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{v}"),
            // Quote text that would otherwise read back as something else
            Self::Text(s)
                if s.is_empty()
                    || s.contains(char::is_whitespace)
                    || decimal_comma_to_point(s).parse::<f64>().is_ok() =>
            {
                write!(f, "\"{s}\"")
            }
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// `0,5` → `0.5`, only for tokens shaped like a decimal number
fn decimal_comma_to_point(token: &str) -> String {
    let digits = token.strip_prefix('-').unwrap_or(token);
    match digits.split_once(',') {
        Some((int, frac))
            if !int.is_empty()
                && !frac.is_empty()
                && int.bytes().all(|b| b.is_ascii_digit())
                && frac.bytes().all(|b| b.is_ascii_digit()) =>
        {
            token.replacen(',', ".", 1)
        }
        _ => token.to_string(),
    }
}

/// Split a data line on whitespace, keeping quoted strings together
fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_start();
    while !rest.is_empty() {
        let end = if rest.starts_with('"') {
            rest[1..].find('"').map_or(rest.len(), |i| i + 2)
        } else {
            rest.find(char::is_whitespace).unwrap_or(rest.len())
        };
        tokens.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    tokens
}

// ============================================================================
// Dataset
// ============================================================================

/// Parsed CGATS dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    header: Vec<(String, Option<String>)>,
    data_format: Vec<String>,
    rows: Vec<Vec<Value>>,
}

enum State {
    Header,
    HeaderBlock {
        key: String,
        lines: Vec<String>,
        start: usize,
    },
    DataFormat {
        start: usize,
    },
    Data {
        start: usize,
    },
}

impl Dataset {
    /// Create an empty dataset with the given fields
    pub fn new<S: Into<String>>(data_format: impl IntoIterator<Item = S>) -> Self {
        Self {
            header: Vec::new(),
            data_format: data_format.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Parse CGATS text
    pub fn parse(src: &str) -> Result<Self> {
        let src = src.replace("\r\n", "\n").replace('\r', "\n");
        let mut dataset = Self::default();
        let mut state = State::Header;
        let mut seen_data = false;
        let mut line_no = 0;

        for (i, raw) in src.lines().enumerate() {
            line_no = i + 1;
            let line = raw.trim();
            state = match state {
                State::Header => {
                    if line.is_empty() || line.starts_with('#') {
                        State::Header
                    } else if line.eq_ignore_ascii_case("BEGIN_DATA_FORMAT") {
                        State::DataFormat { start: line_no }
                    } else if line.eq_ignore_ascii_case("BEGIN_DATA") {
                        if dataset.data_format.is_empty() {
                            return Err(Error::parse(line_no, "BEGIN_DATA before BEGIN_DATA_FORMAT"));
                        }
                        State::Data { start: line_no }
                    } else if let Some(key) = block_key(line) {
                        State::HeaderBlock {
                            key: key.to_string(),
                            lines: Vec::new(),
                            start: line_no,
                        }
                    } else {
                        if !seen_data {
                            let (key, value) = match line.split_once(char::is_whitespace) {
                                Some((k, v)) => (k, Some(v.trim().to_string())),
                                None => (line, None),
                            };
                            dataset.set_header_field(key, value);
                        }
                        State::Header
                    }
                }
                State::HeaderBlock { key, mut lines, start } => {
                    if line.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("END_"))
                        && line.get(4..).is_some_and(|k| k.eq_ignore_ascii_case(&key))
                    {
                        if !seen_data {
                            dataset.set_header_field(&key, Some(lines.join("\n")));
                        }
                        State::Header
                    } else {
                        lines.push(line.to_string());
                        State::HeaderBlock { key, lines, start }
                    }
                }
                State::DataFormat { start } => {
                    let mut done = false;
                    for token in line.split_whitespace() {
                        if token.eq_ignore_ascii_case("END_DATA_FORMAT") {
                            done = true;
                            break;
                        }
                        if seen_data {
                            continue;
                        }
                        dataset.data_format.push(token.to_string());
                    }
                    if done {
                        State::Header
                    } else {
                        State::DataFormat { start }
                    }
                }
                State::Data { start } => {
                    if line.eq_ignore_ascii_case("END_DATA") {
                        seen_data = true;
                        State::Header
                    } else if line.is_empty() {
                        State::Data { start }
                    } else {
                        let row: Vec<Value> = tokenize(line).into_iter().map(Value::parse_token).collect();
                        if row.len() != dataset.data_format.len() {
                            return Err(Error::parse(
                                line_no,
                                format!(
                                    "expected {} values, found {}",
                                    dataset.data_format.len(),
                                    row.len()
                                ),
                            ));
                        }
                        dataset.rows.push(row);
                        State::Data { start }
                    }
                }
            };
        }

        match state {
            State::Header => {}
            State::HeaderBlock { key, start, .. } => {
                return Err(Error::parse(start, format!("unterminated BEGIN_{key}")));
            }
            State::DataFormat { start } => {
                return Err(Error::parse(start, "unterminated BEGIN_DATA_FORMAT"));
            }
            State::Data { start } => return Err(Error::parse(start, "unterminated BEGIN_DATA")),
        }
        if dataset.data_format.is_empty() {
            return Err(Error::parse(line_no, "missing BEGIN_DATA_FORMAT"));
        }
        tracing::debug!(
            fields = dataset.data_format.len(),
            sets = dataset.rows.len(),
            "parsed CGATS dataset"
        );
        Ok(dataset)
    }

    /// Append a header keyword; `NUMBER_OF_FIELDS` and `NUMBER_OF_SETS` are
    /// derived on output and ignored here
    pub fn set_header_field(&mut self, key: &str, value: Option<String>) {
        if key.eq_ignore_ascii_case("NUMBER_OF_FIELDS") || key.eq_ignore_ascii_case("NUMBER_OF_SETS") {
            return;
        }
        let value = value.filter(|v| !v.is_empty());
        self.header.push((key.to_string(), value));
    }

    /// Header keywords in file order
    pub fn header(&self) -> &[(String, Option<String>)] {
        &self.header
    }

    /// First value of a header keyword, with surrounding quotes removed
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.header
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_deref())
            .map(|v| v.trim_matches('"'))
    }

    pub fn data_format(&self) -> &[String] {
        &self.data_format
    }

    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.data_format.iter().position(|f| f.eq_ignore_ascii_case(field))
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.field_index(field).is_some()
    }

    pub fn has_fields(&self, fields: &[&str]) -> bool {
        fields.iter().all(|f| self.has_field(f))
    }

    /// `Cmyk` when all four CMYK fields are present
    pub fn device(&self) -> Device {
        if self.has_fields(&CMYK_FIELDS) {
            Device::Cmyk
        } else {
            Device::Rgb
        }
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.data_format.len() {
            return Err(Error::parse(
                self.rows.len() + 1,
                format!("expected {} values, found {}", self.data_format.len(), row.len()),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Number of patches
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn patch(&self, index: usize) -> Option<Patch<'_>> {
        self.rows.get(index).map(|values| Patch {
            index,
            dataset: self,
            values,
        })
    }

    pub fn patches(&self) -> impl Iterator<Item = Patch<'_>> {
        self.rows.iter().enumerate().map(move |(index, values)| Patch {
            index,
            dataset: self,
            values,
        })
    }

    /// Serialize back to CGATS text
    pub fn to_cgats(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.header {
            match value {
                Some(v) if v.contains('\n') => {
                    out.push_str(&format!("BEGIN_{key}\n{v}\nEND_{key}\n"));
                }
                Some(v) => out.push_str(&format!("{key}\t{v}\n")),
                None => out.push_str(&format!("{key}\n")),
            }
        }
        out.push_str(&format!("NUMBER_OF_FIELDS\t{}\n", self.data_format.len()));
        out.push_str("BEGIN_DATA_FORMAT\n");
        out.push_str(&self.data_format.join("\t"));
        out.push_str("\nEND_DATA_FORMAT\n");
        out.push_str(&format!("NUMBER_OF_SETS\t{}\n", self.rows.len()));
        out.push_str("BEGIN_DATA\n");
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
        out.push_str("END_DATA\n");
        out
    }
}

/// `BEGIN_<KEY>` opening a multi-line header value
fn block_key(line: &str) -> Option<&str> {
    if !line.get(..6).is_some_and(|p| p.eq_ignore_ascii_case("BEGIN_")) {
        return None;
    }
    let key = line.get(6..).filter(|k| !k.is_empty())?;
    key.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_')
        .then_some(key)
}

impl FromStr for Dataset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cgats())
    }
}

// ============================================================================
// Patch
// ============================================================================

/// One row of a dataset
#[derive(Debug, Clone, Copy)]
pub struct Patch<'a> {
    index: usize,
    dataset: &'a Dataset,
    values: &'a [Value],
}

impl<'a> Patch<'a> {
    /// Zero-based row index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Numeric value of a field
    pub fn get(&self, field: &str) -> Option<f64> {
        self.value(field).and_then(Value::as_f64)
    }

    /// Raw cell of a field
    pub fn value(&self, field: &str) -> Option<&'a Value> {
        self.dataset.field_index(field).map(|i| &self.values[i])
    }

    /// Text value of a field
    pub fn text(&self, field: &str) -> Option<&'a str> {
        self.value(field).and_then(Value::as_str)
    }

    fn triple(&self, fields: &[&str; 3]) -> Option<[f64; 3]> {
        Some([self.get(fields[0])?, self.get(fields[1])?, self.get(fields[2])?])
    }

    pub fn lab(&self) -> Option<Lab> {
        self.triple(&LAB_FIELDS).map(Lab::from_array)
    }

    pub fn xyz(&self) -> Option<Xyz> {
        self.triple(&XYZ_FIELDS).map(Xyz::from_array)
    }

    /// RGB device values (0..100)
    pub fn rgb(&self) -> Option<[f64; 3]> {
        self.triple(&RGB_FIELDS)
    }

    /// CMYK device values (0..100)
    pub fn cmyk(&self) -> Option<[f64; 4]> {
        Some([
            self.get(CMYK_FIELDS[0])?,
            self.get(CMYK_FIELDS[1])?,
            self.get(CMYK_FIELDS[2])?,
            self.get(CMYK_FIELDS[3])?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TI3: &str = "CTI3\n\
DESCRIPTOR \"Argyll Calibration Target chart information 3\"\n\
ORIGINATOR \"Argyll dispread\"\n\
BEGIN_KEYWORDS_NOTE\n\
first line\n\
second line\n\
END_KEYWORDS_NOTE\n\
NUMBER_OF_FIELDS 7\n\
BEGIN_DATA_FORMAT\n\
SAMPLE_ID RGB_R RGB_G RGB_B LAB_L LAB_A LAB_B\n\
END_DATA_FORMAT\n\
NUMBER_OF_SETS 3\n\
BEGIN_DATA\n\
1 100 100 100 100 0 0\n\
2 50 50 50 53,39 0,5 -0,25\n\
\"A 3\" 0 0 0 0 0 0\n\
END_DATA\n";

    #[test]
    fn test_parse() {
        let ds = Dataset::parse(TI3).unwrap();
        assert_eq!(ds.data_format().len(), 7);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.device(), Device::Rgb);
        assert_eq!(ds.header()[0], ("CTI3".to_string(), None));
        assert_eq!(
            ds.header_value("descriptor"),
            Some("Argyll Calibration Target chart information 3")
        );
        assert_eq!(ds.header_value("KEYWORDS_NOTE"), Some("first line\nsecond line"));
        assert!(ds.header_value("NUMBER_OF_SETS").is_none(), "set count is derived");
    }

    #[test]
    fn test_decimal_comma() {
        let ds = Dataset::parse(TI3).unwrap();
        let lab = ds.patch(1).unwrap().lab().unwrap();
        assert_eq!(lab.to_array(), [53.39, 0.5, -0.25]);
    }

    #[test]
    fn test_text_cells() {
        let ds = Dataset::parse(TI3).unwrap();
        let patch = ds.patch(2).unwrap();
        assert_eq!(patch.text("SAMPLE_ID"), Some("A 3"));
        assert_eq!(patch.get("SAMPLE_ID"), None);
        assert_eq!(patch.rgb(), Some([0.0, 0.0, 0.0]));
        assert_eq!(patch.cmyk(), None);
        assert_eq!(patch.xyz(), None);
    }

    #[test]
    fn test_crlf_and_multiple_blocks() {
        let src = "CTI3\r\nBEGIN_DATA_FORMAT\r\nXYZ_X XYZ_Y XYZ_Z\r\nEND_DATA_FORMAT\r\nBEGIN_DATA\r\n1 2 3\r\nEND_DATA\r\nBEGIN_DATA\r\n4 5 6\r\nEND_DATA\r\n";
        let ds = Dataset::parse(src).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.patch(1).unwrap().xyz(), Some(Xyz::new(4.0, 5.0, 6.0)));
    }

    #[test]
    fn test_cmyk_device() {
        let src = "BEGIN_DATA_FORMAT\nCMYK_C CMYK_M CMYK_Y CMYK_K LAB_L LAB_A LAB_B\nEND_DATA_FORMAT\nBEGIN_DATA\n100 0 0 0 55 -37 -50\nEND_DATA\n";
        let ds = Dataset::parse(src).unwrap();
        assert_eq!(ds.device(), Device::Cmyk);
        assert_eq!(ds.patch(0).unwrap().cmyk(), Some([100.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_errors() {
        let err = Dataset::parse("CTI3\nBEGIN_DATA\n1 2 3\nEND_DATA\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }), "{err}");

        let err = Dataset::parse("BEGIN_DATA_FORMAT\nA B\nEND_DATA_FORMAT\nBEGIN_DATA\n1 2\n1 2 3\nEND_DATA\n")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { line: 6, .. }), "{err}");

        let err = Dataset::parse("BEGIN_DATA_FORMAT\nA B\nEND_DATA_FORMAT\nBEGIN_DATA\n1 2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 4, .. }), "{err}");

        let err = Dataset::parse("CTI3\nDESCRIPTOR x\n").unwrap_err();
        assert!(err.to_string().contains("missing BEGIN_DATA_FORMAT"), "{err}");
    }

    #[test]
    fn test_non_ascii_header_text() {
        let src = "ABCDEÄ x\nBEGINé\nBEGIN_NOTE\nabcé xy\nÉND_NOTE\nEND_NOTE\nBEGIN_DATA_FORMAT\nRGB_R\nEND_DATA_FORMAT\nBEGIN_DATA\n1\nEND_DATA\n";
        let ds = Dataset::parse(src).unwrap();
        assert_eq!(ds.header_value("ABCDEÄ"), Some("x"));
        assert_eq!(ds.header()[1], ("BEGINé".to_string(), None), "not a block opener");
        assert_eq!(ds.header_value("NOTE"), Some("abcé xy\nÉND_NOTE"));
        assert_eq!(ds.len(), 1);

        let err = Dataset::parse("BEGIN_NOTE\nabcé\n").unwrap_err();
        assert!(err.to_string().contains("unterminated BEGIN_NOTE"), "{err}");
    }

    #[test]
    fn test_to_cgats_reparses() {
        let ds = Dataset::parse(TI3).unwrap();
        let text = ds.to_cgats();
        assert!(text.contains("NUMBER_OF_SETS\t3\n"), "{text}");
        assert!(text.contains("BEGIN_KEYWORDS_NOTE\nfirst line\nsecond line\nEND_KEYWORDS_NOTE\n"));
        let again = Dataset::parse(&text).unwrap();
        assert_eq!(ds, again);
    }

    #[test]
    fn test_push_row() {
        let mut ds = Dataset::new(["RGB_R", "RGB_G", "RGB_B"]);
        ds.push_row(vec![1.0.into(), 2.0.into(), 3.0.into()]).unwrap();
        assert!(ds.push_row(vec![1.0.into()]).is_err());
        assert_eq!(ds.len(), 1);
        assert_eq!(Value::from("12").to_string(), "\"12\"");
        assert_eq!(Value::from("A1").to_string(), "A1");
    }
}
